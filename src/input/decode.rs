//! Decoding of single data rows: column checks, decryption and type coercion.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::cipher::{Cipher, CipherError};
use crate::domain::{AccountRecord, CustomerId, CustomerRecord, Money, SourceFile};
use crate::storage::{Repository, RepositoryError};

/// Accepted date layouts, tried in order. The first one that matches wins.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%-d/%-m/%Y", "%d/%m/%Y"];

/// Why a row could not be turned into a record. Always reported as a processing error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error("malformed line: {0}")]
    Malformed(String),

    #[error("insufficient fields for {file}: expected {expected}, found {found}")]
    InsufficientFields {
        file: SourceFile,
        expected: usize,
        found: usize,
    },

    #[error("{0} is missing")]
    MissingField(&'static str),

    #[error("{field} is not a valid number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("date format not recognized for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("could not decrypt {field}: {source}")]
    Decryption {
        field: &'static str,
        #[source]
        source: CipherError,
    },

    #[error("decrypted {0} is empty")]
    EmptyDecryption(&'static str),

    #[error("customer id not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("customer lookup failed: {0}")]
    Lookup(#[from] RepositoryError),
}

/// Column layout of the account file.
mod account_columns {
    pub(super) const ACCOUNT_NUMBER: usize = 0;
    pub(super) const ACCOUNT_TYPE: usize = 1;
    pub(super) const ACCOUNT_LIMIT: usize = 2;
    pub(super) const BALANCE: usize = 3;
    pub(super) const OPEN_DATE: usize = 4;
    pub(super) const CUSTOMER_ID: usize = 5;
}

/// Column layout of the customer file.
mod customer_columns {
    pub(super) const CUSTOMER_ID: usize = 0;
    pub(super) const ADDRESS: usize = 1;
    pub(super) const BIRTH_DATE: usize = 2;
    pub(super) const NAME: usize = 3;
    pub(super) const NATIONAL_ID: usize = 4;
    pub(super) const SURNAME: usize = 5;
    pub(super) const ZIP_CODE: usize = 6;
}

/// Decodes the fields of one account row and links it to its (already persisted) customer.
pub(crate) fn decode_account(
    fields: &[String],
    cipher: &impl Cipher,
    customers: &impl Repository<CustomerRecord>,
) -> Result<AccountRecord, DecodeError> {
    use account_columns::*;

    let row = Row::new(fields, SourceFile::Account)?;

    let account_number = row.decrypted(ACCOUNT_NUMBER, "account number", cipher)?;
    let account_type = row.number::<i32>(ACCOUNT_TYPE, "account type")?;
    let account_limit = row.number::<Money>(ACCOUNT_LIMIT, "account limit")?;
    let balance = row.decrypted(BALANCE, "balance", cipher)?;
    let balance = parse_number::<Money>(&balance, "balance")?;
    let open_date = row.date(OPEN_DATE, "open date")?;
    let customer_id = CustomerId::new(row.number::<i64>(CUSTOMER_ID, "customer id")?);

    if customers.find_by_id(&customer_id)?.is_none() {
        return Err(DecodeError::CustomerNotFound(customer_id));
    }

    Ok(AccountRecord {
        account_number,
        account_type,
        account_limit,
        balance,
        open_date,
        customer_id,
    })
}

/// Decodes the fields of one customer row.
pub(crate) fn decode_customer(
    fields: &[String],
    cipher: &impl Cipher,
) -> Result<CustomerRecord, DecodeError> {
    use customer_columns::*;

    let row = Row::new(fields, SourceFile::Customer)?;

    Ok(CustomerRecord {
        customer_id: CustomerId::new(row.number::<i64>(CUSTOMER_ID, "customer id")?),
        address: row.required(ADDRESS, "address")?.to_string(),
        birth_date: row.date(BIRTH_DATE, "birth date")?,
        name: row.decrypted(NAME, "name", cipher)?,
        national_id: row.decrypted(NATIONAL_ID, "national id", cipher)?,
        surname: row.decrypted(SURNAME, "surname", cipher)?,
        zip_code: row.required(ZIP_CODE, "zip code")?.to_string(),
    })
}

/// A data row with at least the expected number of columns.
struct Row<'a> {
    fields: &'a [String],
}

impl<'a> Row<'a> {
    fn new(fields: &'a [String], file: SourceFile) -> Result<Self, DecodeError> {
        let expected = file.column_count();
        if fields.len() < expected {
            return Err(DecodeError::InsufficientFields {
                file,
                expected,
                found: fields.len(),
            });
        }
        Ok(Self { fields })
    }

    fn required(&self, index: usize, field: &'static str) -> Result<&'a str, DecodeError> {
        let value = self.fields[index].trim();
        if value.is_empty() {
            return Err(DecodeError::MissingField(field));
        }
        Ok(value)
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, DecodeError> {
        parse_number(self.required(index, field)?, field)
    }

    fn date(&self, index: usize, field: &'static str) -> Result<NaiveDate, DecodeError> {
        parse_date(self.required(index, field)?, field)
    }

    fn decrypted(
        &self,
        index: usize,
        field: &'static str,
        cipher: &impl Cipher,
    ) -> Result<String, DecodeError> {
        let encrypted = self.required(index, field)?;
        let plain = cipher
            .decrypt(encrypted)
            .map_err(|source| DecodeError::Decryption { field, source })?;
        // kept untrimmed, the length rules see the exact plaintext
        if plain.trim().is_empty() {
            return Err(DecodeError::EmptyDecryption(field));
        }
        Ok(plain)
    }
}

fn parse_number<T: FromStr>(value: &str, field: &'static str) -> Result<T, DecodeError> {
    value.trim().parse().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate, DecodeError> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| DecodeError::InvalidDate {
            field,
            value: value.to_string(),
        })
}
