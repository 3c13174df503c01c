//! Field-level symmetric encryption used for the sensitive CSV columns and the export.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};



const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("value is not valid base64")]
    Encoding,

    #[error("ciphertext too short")]
    Truncated,

    /// Wrong key or tampered ciphertext
    #[error("authentication failed")]
    Authentication,

    #[error("decrypted value is not valid UTF-8")]
    NotUtf8,

    #[error("encryption failed")]
    Encryption,
}

/// Symmetric encryption of single field values.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;

    /// Absent values stay absent.
    fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<String>, CipherError> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    fn decrypt_opt(&self, ciphertext: Option<&str>) -> Result<Option<String>, CipherError> {
        ciphertext.map(|c| self.decrypt(c)).transpose()
    }
}

impl<T: Cipher + ?Sized> Cipher for &T {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        (**self).decrypt(ciphertext)
    }
}

/// AES-256-GCM with a fresh random nonce per value.
///
/// Encoded form: `base64(nonce || ciphertext || tag)`, standard alphabet with padding.
#[derive(Clone)]
pub struct AesGcmCipher {
    inner: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        let inner = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self { inner })
    }

    /// Builds the cipher from a base64 encoded 32 byte key, the format used by `INGEST_CIPHER_KEY`.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CipherError::Encoding)?;
        Self::new(&key)
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher").finish_non_exhaustive()
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .inner
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut framed = Vec::with_capacity(NONCE_LEN + sealed.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&sealed);
        Ok(STANDARD.encode(framed))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let framed = STANDARD
            .decode(ciphertext.trim())
            .map_err(|_| CipherError::Encoding)?;
        if framed.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce, sealed) = framed.split_at(NONCE_LEN);
        let plain = self
            .inner
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(plain).map_err(|_| CipherError::NotUtf8)
    }
}
