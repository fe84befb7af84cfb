use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CategoryId, Cents, DEFAULT_CATEGORY_NAME};

pub type TransactionId = i64;

/// Canonical on-disk and export format for transaction dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether a transaction brings money in or sends it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The exact label stored in the database and written to exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transaction kind '{0}': expected Income or Expense")]
pub struct ParseKindError(pub String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
}

/// The writable fields of a transaction, used for both inserts and updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    /// Amount in cents. Callers validate that it is positive.
    pub amount_cents: Cents,
    pub kind: TransactionKind,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn new(date: NaiveDate, amount_cents: Cents, kind: TransactionKind) -> Self {
        Self {
            date,
            amount_cents,
            kind,
            category_id: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A single dated monetary record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub amount_cents: Cents,
    pub kind: TransactionKind,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
}

/// A transaction row with its category resolved to a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub amount_cents: Cents,
    pub kind: TransactionKind,
    pub category_id: Option<CategoryId>,
    /// Current category name, or "Uncategorized" when the reference is null.
    pub category: String,
    pub description: Option<String>,
}

impl TransactionView {
    pub fn from_parts(transaction: Transaction, category_name: Option<String>) -> Self {
        Self {
            id: transaction.id,
            date: transaction.date,
            amount_cents: transaction.amount_cents,
            kind: transaction.kind,
            category_id: transaction.category_id,
            category: category_name.unwrap_or_else(|| DEFAULT_CATEGORY_NAME.to_string()),
            description: transaction.description,
        }
    }
}
