//! Integration tests running the actual crate binary on files in a temporary directory: Test the full E2E path.

use std::path::Path;
use std::process::{Command, Output};

use account_ingest::{
    CIPHER_KEY_VAR, ERROR_REPORT_FILE, EXPORT_JSON_FILE, EXPORT_XML_FILE, PARALLELISM_VAR,
};

use crate::fixtures::{AccountLine, CustomerLine, KEY, cipher, read_json, write_batch};

fn run_binary(args: &[&Path], parallelism: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_account-ingest"))
        .args(args)
        .env(CIPHER_KEY_VAR, KEY)
        .env(PARALLELISM_VAR, parallelism)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to execute binary")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "binary exited with non-zero status.\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn mixed_batch_writes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (account_file, customer_file) = write_batch(
        dir.path(),
        &[
            AccountLine::valid(1, "2500", 1),
            AccountLine::valid(2, "300", 2),
            AccountLine::valid(3, "50", 99),
        ],
        &[CustomerLine::valid(1), CustomerLine::valid(2)],
        &cipher(),
    );

    let output = run_binary(
        &[account_file.as_path(), customer_file.as_path(), dir.path()],
        "1",
    );
    assert_success(&output);

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");
    assert_eq!(
        stdout.trim(),
        "customers saved: 2, accounts saved: 2, rejected lines: 1, exported rows: 1, artifacts written: 3"
    );

    let report = read_json(&dir.path().join(ERROR_REPORT_FILE));
    assert_eq!(report.as_array().unwrap().len(), 1);
    assert_eq!(report[0]["error_code"], "500");
    assert_eq!(report[0]["file_name"], "Account");

    let export = read_json(&dir.path().join(EXPORT_JSON_FILE));
    assert_eq!(export.as_array().unwrap().len(), 1);
    assert_eq!(export[0]["Customer_Id"], 1);
    assert!(dir.path().join(EXPORT_XML_FILE).exists());
}

#[test]
fn many_workers_account_for_every_line() {
    let dir = tempfile::tempdir().unwrap();
    let customers: Vec<_> = (1..=40).map(CustomerLine::valid).collect();
    let accounts: Vec<_> = (1..=40)
        .map(|n| AccountLine::valid(n, "10", n as i64))
        .collect();
    let (account_file, customer_file) =
        write_batch(dir.path(), &accounts, &customers, &cipher());

    let output = run_binary(
        &[account_file.as_path(), customer_file.as_path(), dir.path()],
        "4",
    );
    assert_success(&output);

    // accounts and their customers land in the same chunk, so nothing can race
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        "customers saved: 40, accounts saved: 40, rejected lines: 0, exported rows: 0, artifacts written: 0"
    );
}

#[test]
fn missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.csv");

    let output = run_binary(&[missing.as_path(), missing.as_path(), dir.path()], "1");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.csv"));
}

#[test]
fn missing_key_fails_with_usage_hint() {
    let dir = tempfile::tempdir().unwrap();
    let (account_file, customer_file) = write_batch(dir.path(), &[], &[], &cipher());

    let output = Command::new(env!("CARGO_BIN_EXE_account-ingest"))
        .arg(&account_file)
        .arg(&customer_file)
        .env_remove(CIPHER_KEY_VAR)
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains(CIPHER_KEY_VAR));
}
