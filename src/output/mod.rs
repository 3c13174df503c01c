//! Module for the balance export: selects the customer/account pairs to export and writes them out

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::{
    cipher::Cipher,
    domain::{AccountRecord, CustomerId, CustomerRecord, Money},
};

mod exporters;


pub use exporters::{Exporter, JsonExporter, XmlExporter};

/// Accounts with a balance strictly above this are exported.
pub const BALANCE_THRESHOLD: Money = Decimal::ONE_THOUSAND;

///
/// One exported customer/account pair. The account number and balance are encrypted; a field
/// whose encryption failed is left out.
///
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    #[serde(rename = "Customer_Id")]
    pub customer_id: CustomerId,
    #[serde(rename = "Customer_Name")]
    pub customer_name: String,
    #[serde(rename = "Customer_Surname")]
    pub customer_surname: String,
    #[serde(rename = "Customer_National_Id")]
    pub customer_national_id: String,
    #[serde(
        rename = "Encrypted_Account_Number",
        skip_serializing_if = "Option::is_none"
    )]
    pub encrypted_account_number: Option<String>,
    #[serde(rename = "Account_OpenDate")]
    pub account_open_date: String,
    #[serde(rename = "Encrypted_Balance", skip_serializing_if = "Option::is_none")]
    pub encrypted_balance: Option<String>,
}

impl ExportRow {
    fn new(customer: &CustomerRecord, account: &AccountRecord, cipher: &impl Cipher) -> Self {
        Self {
            customer_id: customer.customer_id,
            customer_name: customer.name.clone(),
            customer_surname: customer.surname.clone(),
            customer_national_id: customer.national_id.clone(),
            encrypted_account_number: encrypt_field(
                cipher,
                "account_number",
                &account.account_number,
            ),
            account_open_date: account.open_date.format("%Y-%m-%d").to_string(),
            encrypted_balance: encrypt_field(cipher, "balance", &account.balance.to_string()),
        }
    }
}

fn encrypt_field(cipher: &impl Cipher, field: &str, value: &str) -> Option<String> {
    cipher
        .encrypt(value)
        .inspect_err(|err| warn!(field, error = %err, "failed to encrypt field for export"))
        .ok()
}

///
/// Pairs every customer with each of its accounts above [`BALANCE_THRESHOLD`]. Customers
/// without such an account are left out, and accounts without a matching customer as well.
///
/// Rows follow the order of `customers`, then the order of `accounts`.
///
pub(crate) fn select_export_rows(
    customers: &[CustomerRecord],
    accounts: &[AccountRecord],
    cipher: &impl Cipher,
) -> Vec<ExportRow> {
    let mut by_customer: HashMap<CustomerId, Vec<&AccountRecord>> = HashMap::new();
    for account in accounts.iter().filter(|a| a.balance > BALANCE_THRESHOLD) {
        by_customer.entry(account.customer_id).or_default().push(account);
    }

    customers
        .iter()
        .flat_map(|customer| {
            by_customer
                .get(&customer.customer_id)
                .into_iter()
                .flatten()
                .map(move |account| ExportRow::new(customer, account, cipher))
        })
        .collect()
}
