use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::domain::{
    normalize_category_name, Category, CategoryId, NewTransaction, Transaction, TransactionId,
    TransactionView, YearMonth, DEFAULT_CATEGORY_ID,
};
use crate::io::write_transactions_csv;
use crate::storage::Repository;

use super::{MonthlySummary, StoreError};

/// The ledger store: durable storage and queries for categories and
/// transactions. This is the only interface any client (CLI, UI, tests)
/// uses to reach the data.
///
/// Every mutation runs while holding `write_lock`, so check-then-act
/// sequences never interleave with another mutation on the same store.
pub struct LedgerStore {
    repo: Repository,
    write_lock: Mutex<()>,
}

impl LedgerStore {
    /// Create a new store over an already initialized repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the store described by `config`, creating the data directory,
    /// the database file and the schema as needed.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if !config.data_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&config.data_dir)?;
        }
        Self::init(config.database_path()).await
    }

    /// Open or create the database at the given path. Safe to call on every startup.
    pub async fn init(database_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = database_path.as_ref();
        let repo = Repository::init(path).await?;
        tracing::debug!(path = %path.display(), "opened ledger store");
        Ok(Self::new(repo))
    }

    /// A fresh store that lives in memory until closed.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let repo = Repository::connect_in_memory().await?;
        repo.migrate().await?;
        repo.ensure_default_category().await?;
        Ok(Self::new(repo))
    }

    /// Release the storage handle. Every later call fails with `StoreError::Closed`.
    pub async fn close(&self) {
        let _guard = self.write_lock.lock().await;
        self.repo.close().await;
        tracing::debug!("closed ledger store");
    }

    pub fn is_closed(&self) -> bool {
        self.repo.is_closed()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.repo.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    // ========================
    // Category operations
    // ========================

    /// List all categories sorted by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.ensure_open()?;
        Ok(self.repo.list_categories().await?)
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, StoreError> {
        self.ensure_open()?;
        self.repo
            .get_category(id)
            .await?
            .ok_or_else(|| StoreError::category_not_found(id))
    }

    /// Create a category. The name is trimmed and must be unique.
    pub async fn add_category(&self, name: &str) -> Result<CategoryId, StoreError> {
        let name = normalize_category_name(name).ok_or_else(|| {
            StoreError::ConstraintViolation("category name must not be empty".to_string())
        })?;

        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        if self.repo.get_category_by_name(&name).await?.is_some() {
            return Err(StoreError::DuplicateName(name));
        }

        let id = self
            .repo
            .insert_category(&name)
            .await
            .map_err(|e| StoreError::from_category_write(e, &name))?;
        tracing::info!(id, name = %name, "added category");
        Ok(id)
    }

    /// Rename a category. Unknown IDs fail with `NotFound`.
    pub async fn rename_category(&self, id: CategoryId, new_name: &str) -> Result<(), StoreError> {
        let name = normalize_category_name(new_name).ok_or_else(|| {
            StoreError::ConstraintViolation("category name must not be empty".to_string())
        })?;

        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        if self.repo.get_category(id).await?.is_none() {
            return Err(StoreError::category_not_found(id));
        }
        if let Some(existing) = self.repo.get_category_by_name(&name).await? {
            if existing.id != id {
                return Err(StoreError::DuplicateName(name));
            }
        }

        self.repo
            .rename_category(id, &name)
            .await
            .map_err(|e| StoreError::from_category_write(e, &name))?;
        tracing::info!(id, name = %name, "renamed category");
        Ok(())
    }

    /// Delete a category. Returns false, and deletes nothing, for the default
    /// category, for a category still used by a transaction, and for an
    /// unknown ID.
    pub async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        if id == DEFAULT_CATEGORY_ID {
            tracing::warn!(id, "refused to delete the default category");
            return Ok(false);
        }

        let deleted = self.repo.delete_category_if_unused(id).await?;
        if deleted {
            tracing::info!(id, "deleted category");
        } else {
            let references = self.repo.count_transactions_for_category(id).await?;
            tracing::warn!(id, references, "category not deleted");
        }
        Ok(deleted)
    }

    // ========================
    // Transaction operations
    // ========================

    async fn check_category_reference(&self, tx: &NewTransaction) -> Result<(), StoreError> {
        if let Some(category_id) = tx.category_id {
            if self.repo.get_category(category_id).await?.is_none() {
                return Err(StoreError::InvalidReference(category_id));
            }
        }
        Ok(())
    }

    /// Record a new transaction. Callers validate that the amount is positive.
    pub async fn add_transaction(&self, tx: NewTransaction) -> Result<TransactionId, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;
        self.check_category_reference(&tx).await?;

        let id = self
            .repo
            .insert_transaction(&tx)
            .await
            .map_err(|e| StoreError::from_transaction_write(e, tx.category_id))?;
        tracing::info!(
            id,
            date = %tx.date,
            amount_cents = tx.amount_cents,
            kind = %tx.kind,
            "added transaction"
        );
        Ok(id)
    }

    /// Overwrite a transaction. Unknown IDs fail with `NotFound`.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        tx: NewTransaction,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        if self.repo.get_transaction(id).await?.is_none() {
            return Err(StoreError::transaction_not_found(id));
        }
        self.check_category_reference(&tx).await?;

        self.repo
            .update_transaction(id, &tx)
            .await
            .map_err(|e| StoreError::from_transaction_write(e, tx.category_id))?;
        tracing::info!(id, "updated transaction");
        Ok(())
    }

    /// Delete a transaction. Deleting an unknown ID is a no-op.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let removed = self.repo.delete_transaction(id).await?;
        if removed == 0 {
            tracing::debug!(id, "delete of unknown transaction ignored");
        } else {
            tracing::info!(id, "deleted transaction");
        }
        Ok(())
    }

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError> {
        self.ensure_open()?;
        self.repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| StoreError::transaction_not_found(id))
    }

    /// List transactions newest first, optionally only those in one month.
    pub async fn list_transactions(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<TransactionView>, StoreError> {
        self.ensure_open()?;
        let range = month.map(|m| (m.first_day(), m.next_month_first_day()));
        let transactions = self.repo.list_transactions(range).await?;
        tracing::debug!(
            month = %month.map_or_else(|| "all".to_string(), |m| m.to_string()),
            count = transactions.len(),
            "listed transactions"
        );
        Ok(transactions)
    }

    /// Income and expense totals for one month.
    pub async fn monthly_summary(&self, month: YearMonth) -> Result<MonthlySummary, StoreError> {
        self.ensure_open()?;
        let totals = self
            .repo
            .sum_by_kind(month.first_day(), month.next_month_first_day())
            .await?;
        Ok(MonthlySummary::new(month, totals.income, totals.expense))
    }

    // ========================
    // Export
    // ========================

    /// Write every transaction to `destination` as CSV. Returns the row count.
    /// The destination is only created once every row has been read.
    pub async fn export_all(&self, destination: impl AsRef<Path>) -> Result<usize, StoreError> {
        let destination = destination.as_ref();
        let transactions = self.list_transactions(None).await?;
        let file = File::create(destination)?;
        let count = write_transactions_csv(BufWriter::new(file), &transactions)?;
        tracing::info!(path = %destination.display(), count, "exported transactions");
        Ok(count)
    }
}
