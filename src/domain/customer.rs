//! Module defining the customer record and its business rules

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::domain::CustomerId;

pub(crate) const NATIONAL_ID_LEN: usize = 10;

/// Customers born in or before this year are rejected, only those born *after* it are accepted.
pub(crate) const BIRTH_YEAR_CUTOFF: i32 = 1995;

/// One customer, with its sensitive fields already decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub address: String,
    pub birth_date: NaiveDate,
    pub name: String,
    pub national_id: String,
    pub surname: String,
    pub zip_code: String,
}

/// A business rule broken by a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerViolation {
    BornOnOrBeforeCutoff { year: i32 },
    NationalIdLength { actual: usize },
}

impl CustomerRecord {
    /// All rules this customer breaks, empty if it is valid.
    pub fn violations(&self) -> Vec<CustomerViolation> {
        let mut violations = Vec::new();

        let year = self.birth_date.year();
        if year <= BIRTH_YEAR_CUTOFF {
            violations.push(CustomerViolation::BornOnOrBeforeCutoff { year });
        }
        let len = self.national_id.chars().count();
        if len != NATIONAL_ID_LEN {
            violations.push(CustomerViolation::NationalIdLength { actual: len });
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

/// Checks the customer rules, logging every broken one.
pub(crate) fn validate_customer(customer: &CustomerRecord) -> bool {
    let violations = customer.violations();
    for violation in &violations {
        match violation {
            CustomerViolation::BornOnOrBeforeCutoff { year } => warn!(
                customer_id = %customer.customer_id,
                year,
                "customer validation failed: birth year is on or before {BIRTH_YEAR_CUTOFF}"
            ),
            CustomerViolation::NationalIdLength { actual } => warn!(
                customer_id = %customer.customer_id,
                actual,
                "customer validation failed: national id length is not {NATIONAL_ID_LEN}"
            ),
        }
    }
    if violations.is_empty() {
        debug!(customer_id = %customer.customer_id, "customer validation passed");
    }
    violations.is_empty()
}
