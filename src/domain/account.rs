//! Module defining the account record and its business rules

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{CustomerId, Money};

pub(crate) const ACCOUNT_NUMBER_LEN: usize = 22;
pub(crate) const ACCOUNT_TYPES: std::ops::RangeInclusive<i32> = 1..=3;

/// One bank account, with its sensitive fields already decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub account_number: String,
    /// 1: savings, 2: recurring deposit, 3: fixed deposit
    pub account_type: i32,
    pub account_limit: Money,
    pub balance: Money,
    pub open_date: NaiveDate,
    pub customer_id: CustomerId,
}

/// A business rule broken by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountViolation {
    BalanceExceedsLimit,
    AccountNumberLength { actual: usize },
    UnknownAccountType { actual: i32 },
}

impl AccountRecord {
    /// All rules this account breaks, empty if it is valid.
    pub fn violations(&self) -> Vec<AccountViolation> {
        let mut violations = Vec::new();

        if self.balance > self.account_limit {
            violations.push(AccountViolation::BalanceExceedsLimit);
        }
        let len = self.account_number.chars().count();
        if len != ACCOUNT_NUMBER_LEN {
            violations.push(AccountViolation::AccountNumberLength { actual: len });
        }
        if !ACCOUNT_TYPES.contains(&self.account_type) {
            violations.push(AccountViolation::UnknownAccountType {
                actual: self.account_type,
            });
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

/// Checks the account rules, logging every broken one.
pub(crate) fn validate_account(account: &AccountRecord) -> bool {
    let violations = account.violations();
    for violation in &violations {
        match violation {
            AccountViolation::BalanceExceedsLimit => warn!(
                customer_id = %account.customer_id,
                "account validation failed: balance exceeds limit"
            ),
            AccountViolation::AccountNumberLength { actual } => warn!(
                customer_id = %account.customer_id,
                actual,
                "account validation failed: account number length is not {ACCOUNT_NUMBER_LEN}"
            ),
            AccountViolation::UnknownAccountType { actual } => warn!(
                customer_id = %account.customer_id,
                actual,
                "account validation failed: invalid account type"
            ),
        }
    }
    violations.is_empty()
}
