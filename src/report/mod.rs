//! Module for the error report: one structured entry per rejected line, collected from all workers.

use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::cipher::Cipher;
use crate::domain::SourceFile;


const ERROR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Classification of a rejected line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A business rule was broken
    Validation,
    /// The record clashes with an already stored one
    IntegrityConflict,
    /// The line could not be decoded or persisted
    Processing,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::IntegrityConflict => 409,
            ErrorKind::Processing => 500,
        }
    }

    pub fn classification(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation Error",
            ErrorKind::IntegrityConflict => "Data Integrity Error",
            ErrorKind::Processing => "Processing Error",
        }
    }
}

/// One rejected or failed input line, as written to `errors.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub file_name: SourceFile,
    #[serde(serialize_with = "code_as_string")]
    pub error_code: u16,
    pub error_classification_name: &'static str,
    pub error_description: String,
    pub error_date: String,
    /// The line's fields, decrypted where possible, joined by commas
    pub error_data: String,
}

impl ErrorEntry {
    /// Builds an entry stamped with the given time.
    ///
    /// Every field is passed through the cipher; fields that do not decrypt (plain columns, broken
    /// ciphertext) are reported as they appeared in the input.
    pub fn new(
        file: SourceFile,
        kind: ErrorKind,
        description: impl Into<String>,
        fields: &[String],
        cipher: &impl Cipher,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            file_name: file,
            error_code: kind.code(),
            error_classification_name: kind.classification(),
            error_description: description.into(),
            error_date: at.format(ERROR_DATE_FORMAT).to_string(),
            error_data: readable_fields(fields, cipher),
        }
    }

    /// Builds an entry stamped with the current local time.
    pub fn now(
        file: SourceFile,
        kind: ErrorKind,
        description: impl Into<String>,
        fields: &[String],
        cipher: &impl Cipher,
    ) -> Self {
        Self::new(file, kind, description, fields, cipher, Local::now().naive_local())
    }

    pub fn kind(&self) -> ErrorKind {
        match self.error_code {
            400 => ErrorKind::Validation,
            409 => ErrorKind::IntegrityConflict,
            _ => ErrorKind::Processing,
        }
    }
}

fn readable_fields(fields: &[String], cipher: &impl Cipher) -> String {
    fields
        .iter()
        .map(|field| {
            let raw = field.trim();
            match cipher.decrypt(raw) {
                Ok(plain) if !plain.trim().is_empty() => plain,
                _ => raw.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn code_as_string<S: Serializer>(code: &u16, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(code)
}

/// Error entries of one batch, shared by all workers of that batch.
///
/// Workers append their whole local batch at once; the contents are only read after every worker
/// has been joined.
#[derive(Debug, Default)]
pub struct ErrorSink {
    entries: Mutex<Vec<ErrorEntry>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a worker's entries, keeping their order.
    pub fn append(&self, entries: Vec<ErrorEntry>) {
        if entries.is_empty() {
            return;
        }
        // entries behind a poisoned lock are still complete
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.extend(entries);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_entries(self) -> Vec<ErrorEntry> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
