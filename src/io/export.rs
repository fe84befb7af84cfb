use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{LedgerStore, StoreError};
use crate::domain::{format_cents, Category, TransactionView, DATE_FORMAT};

/// Column order of the transactions CSV.
pub const TRANSACTION_CSV_HEADER: [&str; 6] =
    ["id", "date", "amount", "type", "category", "description"];

/// Full ledger snapshot for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub transactions: Vec<TransactionView>,
}

/// Exporter for full ledger snapshots
pub struct Exporter<'a> {
    store: &'a LedgerStore,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    /// Export categories and transactions as a pretty-printed JSON document.
    pub async fn export_snapshot_json<W: Write>(
        &self,
        mut writer: W,
    ) -> Result<LedgerSnapshot, StoreError> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            categories: self.store.list_categories().await?,
            transactions: self.store.list_transactions(None).await?,
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)
            .map_err(|e| StoreError::Io(e.into()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(snapshot)
    }
}

/// Write transactions as CSV with the standard header row.
pub fn write_transactions_csv<W: Write>(
    writer: W,
    transactions: &[TransactionView],
) -> Result<usize, StoreError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(TRANSACTION_CSV_HEADER)?;

    for tx in transactions {
        csv_writer.write_record([
            tx.id.to_string(),
            tx.date.format(DATE_FORMAT).to_string(),
            format_cents(tx.amount_cents),
            tx.kind.as_str().to_string(),
            tx.category.clone(),
            tx.description.clone().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(transactions.len())
}
