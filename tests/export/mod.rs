//! Integration tests for the balance export written at the end of a batch.

use std::num::NonZeroUsize;

use account_ingest::{
    AccountRecord, BatchSummary, Cipher, CustomerRecord, ERROR_REPORT_FILE, EXPORT_JSON_FILE,
    EXPORT_XML_FILE, InMemoryRepository, JsonExporter, Pipeline, XmlExporter, process_files,
};
use claims::assert_ok;

use crate::fixtures::{AccountLine, CustomerLine, cipher, read_json, write_batch};

fn run_single_worker(
    dir: &std::path::Path,
    accounts: &[AccountLine],
    customers: &[CustomerLine],
) -> BatchSummary {
    let cipher = cipher();
    let (account_file, customer_file) = write_batch(dir, accounts, customers, &cipher);

    let pipeline = Pipeline::new(
        cipher,
        InMemoryRepository::<AccountRecord>::new(),
        InMemoryRepository::<CustomerRecord>::new(),
    )
    .with_parallelism(NonZeroUsize::MIN);
    pipeline
        .run(
            &account_file,
            &customer_file,
            &JsonExporter::new(dir),
            &XmlExporter::new(dir),
        )
        .unwrap()
}

#[test]
fn only_balances_above_one_thousand_are_exported() {
    let dir = tempfile::tempdir().unwrap();

    let summary = run_single_worker(
        dir.path(),
        &[
            AccountLine::valid(1, "500", 1),
            AccountLine::valid(2, "1500", 1),
        ],
        &[CustomerLine::valid(1)],
    );

    assert_eq!(summary.exported_rows, 1);
    assert_eq!(
        summary.artifacts,
        vec![
            dir.path().join(EXPORT_JSON_FILE),
            dir.path().join(EXPORT_XML_FILE)
        ]
    );

    let export = read_json(&dir.path().join(EXPORT_JSON_FILE));
    let rows = export.as_array().unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row["Customer_Id"], 1);
    assert_eq!(row["Customer_Name"], "Jane");
    assert_eq!(row["Customer_Surname"], "Roe");
    assert_eq!(row["Customer_National_Id"], "1234567890");
    assert_eq!(row["Account_OpenDate"], "2021-11-30");

    let cipher = cipher();
    let account_number = row["Encrypted_Account_Number"].as_str().unwrap();
    let balance = row["Encrypted_Balance"].as_str().unwrap();
    assert_eq!(cipher.decrypt(account_number).unwrap(), "0000000000000000000002");
    assert_eq!(cipher.decrypt(balance).unwrap(), "1500");
}

#[test]
fn xml_export_mirrors_the_json_export() {
    let dir = tempfile::tempdir().unwrap();

    run_single_worker(
        dir.path(),
        &[
            AccountLine::valid(1, "1000.01", 1),
            AccountLine::valid(2, "9000", 2),
            AccountLine::valid(3, "7000", 2),
        ],
        &[CustomerLine::valid(1), CustomerLine::valid(2)],
    );

    let xml = std::fs::read_to_string(dir.path().join(EXPORT_XML_FILE)).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert_eq!(xml.matches("<record>").count(), 3);
    assert_eq!(xml.matches("<Customer_Id>2</Customer_Id>").count(), 2);
    assert_eq!(xml.matches("<Encrypted_Balance>").count(), 3);

    let export = read_json(&dir.path().join(EXPORT_JSON_FILE));
    let ids: Vec<_> = export
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["Customer_Id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 2]);
}

#[test]
fn nothing_is_written_without_qualifying_accounts_or_errors() {
    let dir = tempfile::tempdir().unwrap();

    let summary = run_single_worker(
        dir.path(),
        &[AccountLine::valid(1, "1000", 1)],
        &[CustomerLine::valid(1)],
    );

    assert!(summary.artifacts.is_empty());
    assert!(!dir.path().join(ERROR_REPORT_FILE).exists());
    assert!(!dir.path().join(EXPORT_JSON_FILE).exists());
    assert!(!dir.path().join(EXPORT_XML_FILE).exists());
}

#[test]
fn process_files_with_only_rejected_customers_writes_just_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let cipher = cipher();
    let (account_file, customer_file) = write_batch(
        dir.path(),
        &[],
        &[
            CustomerLine::valid(1).born("1950-01-01"),
            CustomerLine {
                national_id: "123",
                ..CustomerLine::valid(2)
            },
        ],
        &cipher,
    );

    let summary = assert_ok!(process_files(
        &account_file,
        &customer_file,
        dir.path(),
        cipher
    ));

    assert_eq!(summary.stats.rejected, 2);
    assert_eq!(summary.exported_rows, 0);
    assert_eq!(summary.artifacts, vec![dir.path().join(ERROR_REPORT_FILE)]);
    assert!(!dir.path().join(EXPORT_JSON_FILE).exists());
}
