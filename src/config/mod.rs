//! Runtime configuration taken from the command line and the environment

use std::{fmt, num::NonZeroUsize, path::PathBuf};

use crate::{
    Error,
    cipher::AesGcmCipher,
    error::config_error,
};


/// Base64 encoded AES-256 key used for all field encryption.
pub const CIPHER_KEY_VAR: &str = "INGEST_CIPHER_KEY";
/// Optional number of worker threads.
pub const PARALLELISM_VAR: &str = "INGEST_PARALLELISM";

const USAGE: &str = "Usage: account-ingest <accounts.csv> <customers.csv> [output-dir]";

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub account_file: PathBuf,
    pub customer_file: PathBuf,
    /// Where the report and export files go, the working directory by default
    pub output_dir: PathBuf,
    /// `None` uses the available parallelism of the machine
    pub parallelism: Option<NonZeroUsize>,
    pub cipher_key: String,
}

impl Settings {
    /// Reads the settings of the current process.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_sources(std::env::args().skip(1), |name| std::env::var(name).ok())
    }

    ///
    /// Builds the settings from positional arguments (program name excluded) and an environment
    /// lookup.
    ///
    pub fn from_sources(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let mut args = args.into_iter();
        let account_file = args.next().ok_or_else(|| config_error(USAGE))?;
        let customer_file = args.next().ok_or_else(|| config_error(USAGE))?;
        let output_dir = args.next().unwrap_or_else(|| ".".to_string());
        if args.next().is_some() {
            return Err(config_error(USAGE));
        }

        let cipher_key = env(CIPHER_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| config_error(format!("{CIPHER_KEY_VAR} is not set")))?;

        let parallelism = env(PARALLELISM_VAR)
            .map(|raw| {
                raw.trim().parse::<NonZeroUsize>().map_err(|_| {
                    config_error(format!(
                        "{PARALLELISM_VAR} must be a positive integer, got '{raw}'"
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            account_file: account_file.into(),
            customer_file: customer_file.into(),
            output_dir: output_dir.into(),
            parallelism,
            cipher_key,
        })
    }

    pub fn cipher(&self) -> Result<AesGcmCipher, Error> {
        Ok(AesGcmCipher::from_base64_key(&self.cipher_key)?)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("account_file", &self.account_file)
            .field("customer_file", &self.customer_file)
            .field("output_dir", &self.output_dir)
            .field("parallelism", &self.parallelism)
            .field("cipher_key", &"<redacted>")
            .finish()
    }
}
