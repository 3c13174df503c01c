//! Module focused on the logic of processing individual lines.

use std::ops::AddAssign;

use tracing::{debug, warn};

use crate::{
    cipher::Cipher,
    domain::{AccountRecord, CustomerRecord, SourceFile, validate_account, validate_customer},
    input::{DecodeError, decode_account, decode_customer, is_header, split_fields, split_fields_lossy},
    report::{ErrorEntry, ErrorKind},
    storage::{Repository, RepositoryError},
};

/// Line counts of one worker, or of a whole batch once summed up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub customers_saved: usize,
    pub accounts_saved: usize,
    pub rejected: usize,
    pub headers_skipped: usize,
}

impl IngestionStats {
    /// Records stored during the batch.
    pub fn persisted(&self) -> usize {
        self.customers_saved + self.accounts_saved
    }
}

impl AddAssign for IngestionStats {
    fn add_assign(&mut self, other: Self) {
        self.customers_saved += other.customers_saved;
        self.accounts_saved += other.accounts_saved;
        self.rejected += other.rejected;
        self.headers_skipped += other.headers_skipped;
    }
}

/// What a worker hands back once its chunk pair is done.
#[derive(Debug, Default)]
pub(crate) struct WorkerReport {
    pub(crate) stats: IngestionStats,
    /// One entry per rejected line, in processing order
    pub(crate) errors: Vec<ErrorEntry>,
}

/// Why a single line was not persisted.
#[derive(Debug)]
enum LineError {
    Rejected,
    Decode(DecodeError),
    Storage(RepositoryError),
}

impl From<DecodeError> for LineError {
    fn from(err: DecodeError) -> Self {
        LineError::Decode(err)
    }
}

impl From<RepositoryError> for LineError {
    fn from(err: RepositoryError) -> Self {
        LineError::Storage(err)
    }
}

impl LineError {
    fn kind(&self) -> ErrorKind {
        match self {
            LineError::Rejected => ErrorKind::Validation,
            LineError::Storage(RepositoryError::IntegrityConflict { .. }) => {
                ErrorKind::IntegrityConflict
            }
            LineError::Storage(_) | LineError::Decode(_) => ErrorKind::Processing,
        }
    }

    fn description(&self, file: SourceFile) -> String {
        match self {
            LineError::Rejected => format!("{file} validation failed"),
            LineError::Storage(RepositoryError::IntegrityConflict { .. }) => match file {
                SourceFile::Customer => "Duplicate Customer ID".to_string(),
                SourceFile::Account => "Duplicate Account Number".to_string(),
            },
            LineError::Storage(cause) => format!("Exception processing {file} line: {cause}"),
            LineError::Decode(cause) => format!("Exception processing {file} line: {cause}"),
        }
    }
}

/// Drives one chunk pair through decode, validate and persist.
///
/// Holds only shared references, so one worker value can be used from several threads at once.
pub(crate) struct Worker<'a, C, A, U> {
    cipher: &'a C,
    accounts: &'a A,
    customers: &'a U,
}

impl<'a, C, A, U> Worker<'a, C, A, U>
where
    C: Cipher,
    A: Repository<AccountRecord>,
    U: Repository<CustomerRecord>,
{
    pub(crate) fn new(cipher: &'a C, accounts: &'a A, customers: &'a U) -> Self {
        Self {
            cipher,
            accounts,
            customers,
        }
    }

    /// Processes all customer lines, then all account lines.
    ///
    /// Customers go first so that accounts can reference customers of the same chunk. Customers of
    /// other chunks may or may not be stored yet: there is no coordination between workers.
    pub(crate) fn process_chunk(&self, accounts: &[String], customers: &[String]) -> WorkerReport {
        let mut report = WorkerReport::default();

        for line in customers {
            self.process_line(line, SourceFile::Customer, &mut report);
        }
        for line in accounts {
            self.process_line(line, SourceFile::Account, &mut report);
        }

        report
    }

    fn process_line(&self, line: &str, file: SourceFile, report: &mut WorkerReport) {
        let (fields, result) = match split_fields(line) {
            Ok(fields) => {
                if is_header(&fields, file) {
                    report.stats.headers_skipped += 1;
                    return;
                }
                let result = match file {
                    SourceFile::Customer => self.handle_customer(&fields),
                    SourceFile::Account => self.handle_account(&fields),
                };
                (fields, result)
            }
            Err(err) => (
                split_fields_lossy(line),
                Err(LineError::Decode(DecodeError::Malformed(err.to_string()))),
            ),
        };

        match result {
            Ok(()) => match file {
                SourceFile::Customer => report.stats.customers_saved += 1,
                SourceFile::Account => report.stats.accounts_saved += 1,
            },
            Err(err) => {
                let kind = err.kind();
                warn!(%file, code = kind.code(), error = ?err, "{file} line rejected");
                report.stats.rejected += 1;
                report.errors.push(ErrorEntry::now(
                    file,
                    kind,
                    err.description(file),
                    &fields,
                    self.cipher,
                ));
            }
        }
    }

    fn handle_customer(&self, fields: &[String]) -> Result<(), LineError> {
        let customer = decode_customer(fields, self.cipher)?;
        if !validate_customer(&customer) {
            return Err(LineError::Rejected);
        }

        let saved = self.customers.save(customer)?;
        debug!(customer_id = %saved.customer_id, "saved customer");
        Ok(())
    }

    fn handle_account(&self, fields: &[String]) -> Result<(), LineError> {
        let account = decode_account(fields, self.cipher, self.customers)?;
        if !validate_account(&account) {
            return Err(LineError::Rejected);
        }

        let saved = self.accounts.save(account)?;
        debug!(customer_id = %saved.customer_id, "saved account");
        Ok(())
    }
}
