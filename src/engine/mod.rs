//! Module for the core logic of the engine

use std::{
    fmt,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use tracing::{error, info};

use crate::{
    Error,
    cipher::Cipher,
    domain::{AccountRecord, CustomerRecord},
    input::load_lines,
    output::{BALANCE_THRESHOLD, ExportRow, Exporter, select_export_rows},
    report::{ErrorEntry, ErrorSink},
    storage::Repository,
};

mod logic;
mod orchestration;


pub use logic::IngestionStats;

use logic::Worker;
use orchestration::{chunk_pairs, run_workers};

/// File name of the error report
pub const ERROR_REPORT_FILE: &str = "errors.json";
/// File name of the JSON export
pub const EXPORT_JSON_FILE: &str = "customers_balance_gt_1000.json";
/// File name of the XML export
pub const EXPORT_XML_FILE: &str = "customers_balance_gt_1000.xml";

/// Outcome of ingesting one pair of line sequences.
#[derive(Debug)]
pub struct Ingestion {
    pub stats: IngestionStats,
    /// Every rejected line of this batch. Entries of one worker are contiguous and in order.
    pub errors: Vec<ErrorEntry>,
}

/// Outcome of a complete batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub stats: IngestionStats,
    pub exported_rows: usize,
    pub artifacts: Vec<PathBuf>,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "customers saved: {}, accounts saved: {}, rejected lines: {}, exported rows: {}, artifacts written: {}",
            self.stats.customers_saved,
            self.stats.accounts_saved,
            self.stats.rejected,
            self.exported_rows,
            self.artifacts.len()
        )
    }
}

///
/// The ingestion pipeline: splits the input between worker threads, collects the rejected lines
/// and writes the report and export artifacts.
///
#[derive(Debug)]
pub struct Pipeline<C, A, U> {
    cipher: C,
    accounts: A,
    customers: U,
    parallelism: NonZeroUsize,
}

impl<C, A, U> Pipeline<C, A, U>
where
    C: Cipher,
    A: Repository<AccountRecord>,
    U: Repository<CustomerRecord>,
{
    /// Creates a pipeline using as many workers as the machine offers.
    pub fn new(cipher: C, accounts: A, customers: U) -> Self {
        let parallelism = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self {
            cipher,
            accounts,
            customers,
            parallelism,
        }
    }

    pub fn with_parallelism(mut self, parallelism: NonZeroUsize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn parallelism(&self) -> NonZeroUsize {
        self.parallelism
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn customers(&self) -> &U {
        &self.customers
    }

    ///
    /// Ingests the given lines and blocks until every worker is done. Each call starts with an
    /// empty error sink, so the returned errors belong to this batch only.
    ///
    /// An account line may reference a customer handled by another worker. Whether that customer
    /// is already stored when the account is decoded is not determined.
    ///
    pub fn ingest(&self, account_lines: &[String], customer_lines: &[String]) -> Ingestion {
        let pairs = chunk_pairs(account_lines, customer_lines, self.parallelism);
        info!(
            workers = pairs.len(),
            account_lines = account_lines.len(),
            customer_lines = customer_lines.len(),
            "starting ingestion"
        );

        let sink = ErrorSink::new();
        let worker = Worker::new(&self.cipher, &self.accounts, &self.customers);
        let stats = run_workers(&worker, pairs, &sink);
        let errors = sink.into_entries();

        info!(
            customers_saved = stats.customers_saved,
            accounts_saved = stats.accounts_saved,
            rejected = stats.rejected,
            headers_skipped = stats.headers_skipped,
            "ingestion finished"
        );
        Ingestion { stats, errors }
    }

    /// Customer/account pairs with a balance above the threshold, with re-encrypted account data.
    pub fn export_rows(&self) -> Result<Vec<ExportRow>, Error> {
        let customers = self.customers.find_all()?;
        let accounts = self.accounts.find_all()?;
        Ok(select_export_rows(&customers, &accounts, &self.cipher))
    }

    ///
    /// Runs a complete batch: loads both files, ingests them, then writes the error report with
    /// `json` and the export with both `json` and `xml`. Nothing is written for an empty report
    /// or an empty export.
    ///
    /// Failing to read an input aborts before any line is processed. Once ingestion is done every
    /// artifact is attempted, and the first failure is returned.
    ///
    pub fn run(
        &self,
        account_file: impl AsRef<Path>,
        customer_file: impl AsRef<Path>,
        json: &impl Exporter,
        xml: &impl Exporter,
    ) -> Result<BatchSummary, Error> {
        let account_lines = load_lines(account_file)?;
        let customer_lines = load_lines(customer_file)?;

        let Ingestion { stats, errors } = self.ingest(&account_lines, &customer_lines);

        let mut artifacts = Artifacts::default();
        if errors.is_empty() {
            info!("no errors found during processing");
        } else {
            artifacts.record(json.write(&errors, ERROR_REPORT_FILE));
        }

        let mut exported_rows = 0;
        match self.export_rows() {
            Ok(rows) if rows.is_empty() => {
                info!(threshold = %BALANCE_THRESHOLD, "no accounts above the balance threshold");
            }
            Ok(rows) => {
                exported_rows = rows.len();
                artifacts.record(json.write(&rows, EXPORT_JSON_FILE));
                artifacts.record(xml.write(&rows, EXPORT_XML_FILE));
            }
            Err(err) => artifacts.record(Err(err)),
        }

        let summary = BatchSummary {
            stats,
            exported_rows,
            artifacts: artifacts.finish()?,
        };
        info!(%summary, "batch finished");
        Ok(summary)
    }
}

/// Written artifacts, and the first failure among them.
#[derive(Default)]
struct Artifacts {
    written: Vec<PathBuf>,
    first_failure: Option<Error>,
}

impl Artifacts {
    fn record(&mut self, result: Result<PathBuf, Error>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(err) => {
                error!(error = %err, "failed to write artifact");
                self.first_failure.get_or_insert(err);
            }
        }
    }

    fn finish(self) -> Result<Vec<PathBuf>, Error> {
        match self.first_failure {
            Some(err) => Err(err),
            None => Ok(self.written),
        }
    }
}
