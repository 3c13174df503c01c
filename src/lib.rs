mod cipher;
mod config;
mod domain;
mod engine;
mod error;
mod input;
mod output;
mod report;
mod storage;
mod telemetry;

pub use cipher::{AesGcmCipher, Cipher, CipherError};
pub use config::{CIPHER_KEY_VAR, PARALLELISM_VAR, Settings};
pub use domain::{
    AccountRecord, AccountViolation, CustomerId, CustomerRecord, CustomerViolation, Money,
    SourceFile,
};
pub use engine::{
    BatchSummary, ERROR_REPORT_FILE, EXPORT_JSON_FILE, EXPORT_XML_FILE, Ingestion,
    IngestionStats, Pipeline,
};
pub use error::Error;
pub use input::load_lines;
pub use output::{BALANCE_THRESHOLD, ExportRow, Exporter, JsonExporter, XmlExporter};
pub use report::{ErrorEntry, ErrorKind, ErrorSink};
pub use storage::{Entity, InMemoryRepository, Repository, RepositoryError};
pub use telemetry::{LogFormat, setup_logging};

/// Ingests an account file and a customer file and writes the batch artifacts to `output_dir`.
///
/// Records are decrypted, validated and stored in fresh in-memory repositories by a pool of
/// worker threads. Lines that cannot be stored do not stop the batch: each of them becomes an
/// entry of `errors.json`. Customers with an account balance above [`BALANCE_THRESHOLD`] are
/// exported, with their account data re-encrypted, to `customers_balance_gt_1000.json` and
/// `customers_balance_gt_1000.xml`. Empty artifacts are not written.
///
/// Use [`Pipeline`] directly to bring your own repositories, exporters or cipher.
///
/// # Example
///
/// ```no_run
/// use account_ingest::{AesGcmCipher, Error, process_files};
///
/// let cipher = AesGcmCipher::from_base64_key("AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=")?;
/// let summary = process_files("accounts.csv", "customers.csv", "out", cipher)?;
/// println!("{summary}");
/// # Ok::<(), Error>(())
/// ```
pub fn process_files(
    account_file: impl AsRef<std::path::Path>,
    customer_file: impl AsRef<std::path::Path>,
    output_dir: impl AsRef<std::path::Path>,
    cipher: impl Cipher,
) -> Result<BatchSummary, Error> {
    let output_dir = output_dir.as_ref();
    let pipeline = Pipeline::new(
        cipher,
        InMemoryRepository::<AccountRecord>::new(),
        InMemoryRepository::<CustomerRecord>::new(),
    );
    pipeline.run(
        account_file,
        customer_file,
        &JsonExporter::new(output_dir),
        &XmlExporter::new(output_dir),
    )
}
