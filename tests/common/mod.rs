// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use finly::application::LedgerStore;
use finly::domain::{CategoryId, NewTransaction, TransactionId, TransactionKind, YearMonth};
use tempfile::TempDir;

/// Helper to create a test store with a temporary database
pub async fn test_store() -> Result<(LedgerStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = LedgerStore::init(&db_path).await?;
    Ok((store, temp_dir))
}

/// Helper to parse a YYYY-MM-DD string
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn month(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

pub async fn add_expense(
    store: &LedgerStore,
    date_str: &str,
    cents: i64,
    category: Option<CategoryId>,
) -> Result<TransactionId> {
    add_transaction(store, date_str, cents, TransactionKind::Expense, category).await
}

pub async fn add_income(
    store: &LedgerStore,
    date_str: &str,
    cents: i64,
    category: Option<CategoryId>,
) -> Result<TransactionId> {
    add_transaction(store, date_str, cents, TransactionKind::Income, category).await
}

async fn add_transaction(
    store: &LedgerStore,
    date_str: &str,
    cents: i64,
    kind: TransactionKind,
    category: Option<CategoryId>,
) -> Result<TransactionId> {
    let mut tx = NewTransaction::new(date(date_str), cents, kind);
    tx.category_id = category;
    Ok(store.add_transaction(tx).await?)
}

/// Test fixture: a few everyday categories
pub struct StandardCategories {
    pub food: CategoryId,
    pub rent: CategoryId,
    pub salary: CategoryId,
}

impl StandardCategories {
    pub async fn create(store: &LedgerStore) -> Result<Self> {
        Ok(Self {
            food: store.add_category("Food").await?,
            rent: store.add_category("Rent").await?,
            salary: store.add_category("Salary").await?,
        })
    }
}
