//! Integration tests driving the pipeline through the public API with the AES-GCM cipher.

use std::num::NonZeroUsize;

use account_ingest::{
    AccountRecord, Cipher, CustomerRecord, ERROR_REPORT_FILE, ErrorKind, InMemoryRepository,
    Ingestion, JsonExporter, Pipeline, Repository, SourceFile, XmlExporter,
};
use claims::assert_ok;
use rstest::rstest;
use rust_decimal_macros::dec;

use crate::fixtures::{
    ACCOUNT_HEADER, AccountLine, CUSTOMER_HEADER, CustomerLine, cipher, read_json, write_batch,
};

type AesPipeline = Pipeline<
    account_ingest::AesGcmCipher,
    InMemoryRepository<AccountRecord>,
    InMemoryRepository<CustomerRecord>,
>;

fn pipeline(parallelism: usize) -> AesPipeline {
    Pipeline::new(cipher(), InMemoryRepository::new(), InMemoryRepository::new())
        .with_parallelism(NonZeroUsize::new(parallelism).unwrap())
}

fn lines(header: &str, encrypted: impl IntoIterator<Item = String>) -> Vec<String> {
    std::iter::once(header.to_string()).chain(encrypted).collect()
}

#[test]
fn decrypted_records_are_stored() {
    let cipher = cipher();
    let pipeline = pipeline(2);
    let customers = lines(CUSTOMER_HEADER, [CustomerLine::valid(7).encrypt(&cipher)]);
    let accounts = lines(
        ACCOUNT_HEADER,
        [AccountLine::valid(1, "250.50", 7).encrypt(&cipher)],
    );

    let Ingestion { stats, errors } = pipeline.ingest(&accounts, &customers);

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(stats.headers_skipped, 2);

    let customer = pipeline.customers().find_all().unwrap().remove(0);
    assert_eq!(customer.name, "Jane");
    assert_eq!(customer.national_id, "1234567890");
    assert_eq!(customer.surname, "Roe");

    let account = pipeline.accounts().find_all().unwrap().remove(0);
    assert_eq!(account.account_number, "0000000000000000000001");
    assert_eq!(account.balance, dec!(250.50));
    assert_eq!(i64::from(account.customer_id), 7);
}

#[rstest]
#[case::unknown_account_type(AccountLine { account_type: 4, ..AccountLine::valid(1, "10", 1) })]
#[case::short_account_number(AccountLine { number: "1".repeat(21), ..AccountLine::valid(1, "10", 1) })]
#[case::long_account_number(AccountLine { number: "1".repeat(23), ..AccountLine::valid(1, "10", 1) })]
#[case::padded_account_number(AccountLine { number: format!("{:022} ", 7), ..AccountLine::valid(1, "10", 1) })]
#[case::balance_above_limit(AccountLine { limit: "100", balance: "100.01", ..AccountLine::valid(1, "10", 1) })]
fn invalid_accounts_are_reported_as_validation_errors(#[case] account: AccountLine) {
    let cipher = cipher();
    let pipeline = pipeline(1);
    let customers = vec![CustomerLine::valid(1).encrypt(&cipher)];

    let Ingestion { stats, errors } = pipeline.ingest(&[account.encrypt(&cipher)], &customers);

    assert_eq!(stats.accounts_saved, 0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].file_name, SourceFile::Account);
    assert_eq!(errors[0].kind(), ErrorKind::Validation);
    assert!(errors[0].error_data.starts_with(&account.number));
}

#[test]
fn padded_national_id_is_reported_as_a_validation_error() {
    let cipher = cipher();
    let pipeline = pipeline(1);
    let customers = vec![
        CustomerLine {
            national_id: "1234567890 ",
            ..CustomerLine::valid(1)
        }
        .encrypt(&cipher),
    ];

    let Ingestion { stats, errors } = pipeline.ingest(&[], &customers);

    assert_eq!(stats.customers_saved, 0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].file_name, SourceFile::Customer);
    assert_eq!(errors[0].error_code, 400);
    assert!(pipeline.customers().find_all().unwrap().is_empty());
}

#[test]
fn error_data_shows_decrypted_fields() {
    let cipher = cipher();
    let pipeline = pipeline(1);
    let customers = vec![CustomerLine::valid(3).born("1995-12-31").encrypt(&cipher)];

    let Ingestion { errors, .. } = pipeline.ingest(&[], &customers);

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].error_data,
        "3,Elm Street 3,1995-12-31,Jane,1234567890,Roe,10115"
    );
}

#[test]
fn account_of_missing_customer_is_reported_once_and_not_stored() {
    let cipher = cipher();
    let pipeline = pipeline(1);
    let accounts = vec![AccountLine::valid(1, "10", 42).encrypt(&cipher)];

    let Ingestion { stats, errors } = pipeline.ingest(&accounts, &[]);

    assert_eq!(stats.rejected, 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_code, 500);
    assert_eq!(errors[0].file_name, SourceFile::Account);
    assert!(pipeline.accounts().is_empty());
}

#[rstest]
fn line_counts_are_conserved_at_any_parallelism(#[values(1, 2, 3, 5, 8, 16)] parallelism: usize) {
    let cipher = cipher();
    let pipeline = pipeline(parallelism);
    let customers: Vec<_> = (1..=20)
        .map(|id| {
            let line = CustomerLine::valid(id);
            if id % 5 == 0 { line.born("1980-01-01") } else { line }
        })
        .map(|line| line.encrypt(&cipher))
        .collect();
    let accounts: Vec<_> = (1..=30)
        .map(|n| AccountLine::valid(n, "2000", (n as i64 % 20) + 1).encrypt(&cipher))
        .collect();

    let Ingestion { stats, errors } = pipeline.ingest(&accounts, &customers);

    assert_eq!(stats.persisted() + stats.rejected, 50);
    assert_eq!(errors.len(), stats.rejected);
    assert_eq!(stats.customers_saved, 16);
    assert_eq!(pipeline.accounts().len(), stats.accounts_saved);
}

#[test]
fn run_writes_the_error_report() {
    let dir = tempfile::tempdir().unwrap();
    let cipher = cipher();
    let (account_file, customer_file) = write_batch(
        dir.path(),
        &[
            AccountLine::valid(1, "10", 1),
            AccountLine::valid(1, "20", 1),
        ],
        &[CustomerLine::valid(1), CustomerLine::valid(2).born("1990-01-01")],
        &cipher,
    );

    let summary = assert_ok!(pipeline(1).run(
        &account_file,
        &customer_file,
        &JsonExporter::new(dir.path()),
        &XmlExporter::new(dir.path()),
    ));
    assert_eq!(summary.stats.rejected, 2);
    assert_eq!(summary.artifacts, vec![dir.path().join(ERROR_REPORT_FILE)]);

    let report = read_json(&dir.path().join(ERROR_REPORT_FILE));
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let customer_error = entries.iter().find(|e| e["file_name"] == "Customer").unwrap();
    assert_eq!(customer_error["error_code"], "400");
    assert_eq!(customer_error["error_classification_name"], "Validation Error");
    assert_eq!(customer_error["error_description"], "Customer validation failed");

    let account_error = entries.iter().find(|e| e["file_name"] == "Account").unwrap();
    assert_eq!(account_error["error_code"], "409");
    assert_eq!(account_error["error_classification_name"], "Data Integrity Error");
    assert_eq!(account_error["error_description"], "Duplicate Account Number");
    assert_eq!(
        account_error["error_data"],
        "0000000000000000000001,2,10000,20,2021-11-30,1"
    );

    let date = account_error["error_date"].as_str().unwrap();
    assert_ok!(chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S"));
}

#[test]
fn the_cipher_round_trips_field_values() {
    let cipher = cipher();
    for value in ["", "Jane", "ÄÖÜ ß", "1234567890123456789012"] {
        let encrypted = cipher.encrypt(value).unwrap();
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), value);
    }
    assert_eq!(cipher.encrypt_opt(None), Ok(None));
}
