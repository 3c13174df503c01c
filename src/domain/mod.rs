//! Module for the types defining the account/customer domain.

mod account;
mod customer;


use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

pub use account::{AccountRecord, AccountViolation};
pub use customer::{CustomerRecord, CustomerViolation};
pub(crate) use account::validate_account;
pub(crate) use customer::validate_customer;

pub type Money = Decimal;

/// Numeric id identifying a customer. Accounts reference their owner by this id.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct CustomerId(i64);

impl CustomerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl From<CustomerId> for i64 {
    fn from(value: CustomerId) -> Self {
        value.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The input file a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceFile {
    Account,
    Customer,
}

impl SourceFile {
    /// First column value identifying a header row of this file.
    pub(crate) fn header_token(self) -> &'static str {
        match self {
            SourceFile::Account => "ACCOUNT_NUMBER",
            SourceFile::Customer => "CUSTOMER_ID",
        }
    }

    /// Minimal number of columns of a data row.
    pub(crate) fn column_count(self) -> usize {
        match self {
            SourceFile::Account => 6,
            SourceFile::Customer => 7,
        }
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFile::Account => f.write_str("Account"),
            SourceFile::Customer => f.write_str("Customer"),
        }
    }
}
