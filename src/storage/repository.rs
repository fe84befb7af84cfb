use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Category, CategoryId, Cents, NewTransaction, Transaction, TransactionId, TransactionKind,
    TransactionView, DATE_FORMAT, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME,
};

use super::{MIGRATIONS, SCHEMA_VERSION};

/// Income and expense totals over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTotals {
    pub income: Cents,
    pub expense: Cents,
}

/// Repository for persisting and querying categories and transactions.
/// This is the only place that issues SQL.
pub struct Repository {
    pool: SqlitePool,
}

/// Stored dates are four-digit `YYYY-MM-DD` text. A bound past this year
/// formats with a sign and more digits, so it can't be compared lexically.
const MAX_STORED_YEAR: i32 = 9999;

const TRANSACTION_VIEW_COLUMNS: &str = r#"
    SELECT t.id, t.date, t.amount_cents, t.type, t.category_id, t.description, c.name AS category_name
    FROM transactions t
    LEFT JOIN categories c ON t.category_id = c.id
"#;

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the SQLite file at `path`, creating it if it doesn't exist.
    ///
    /// The pool holds a single connection so every statement runs in order,
    /// and the journal is configured so each committed write survives a crash.
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Ok(Self::new(pool))
    }

    /// Connect to an in-memory database. Data is lost when the pool closes.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory database URL")?
            .foreign_keys(true);

        // The database lives only as long as its connection, so never recycle it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;
        Ok(Self::new(pool))
    }

    /// Initialize a database (connect + migrate + default category).
    pub async fn init(path: &Path) -> Result<Self> {
        let repo = Self::connect(path).await?;
        repo.migrate().await?;
        repo.ensure_default_category().await?;
        Ok(repo)
    }

    /// Current schema version stored in the database header.
    pub async fn schema_version(&self) -> Result<i64> {
        let row = sqlx::query("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read schema version")?;
        Ok(row.get(0))
    }

    /// Run pending database migrations. Each migration and its version bump
    /// commit together.
    pub async fn migrate(&self) -> Result<()> {
        let current = self.schema_version().await?;
        if current > SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is newer than supported version {}",
                current,
                SCHEMA_VERSION
            );
        }

        for (index, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
            let target = index as i64 + 1;
            let mut tx = self.pool.begin().await.context("Failed to begin migration")?;

            sqlx::raw_sql(sql)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to run migration {:03}", target))?;

            // PRAGMA values can't be bound as parameters.
            sqlx::raw_sql(&format!("PRAGMA user_version = {}", target))
                .execute(&mut *tx)
                .await
                .context("Failed to record schema version")?;

            tx.commit()
                .await
                .with_context(|| format!("Failed to commit migration {:03}", target))?;
            tracing::debug!(version = target, "applied schema migration");
        }

        Ok(())
    }

    /// Insert the protected default category if it is missing.
    pub async fn ensure_default_category(&self) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO categories (id, name) VALUES (?, ?)")
            .bind(DEFAULT_CATEGORY_ID)
            .bind(DEFAULT_CATEGORY_NAME)
            .execute(&self.pool)
            .await
            .context("Failed to create default category")?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the pool, waiting for the connection to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Category operations
    // ========================

    /// List all categories ordered by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        Ok(rows.iter().map(Self::row_to_category).collect())
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")?;

        Ok(row.as_ref().map(Self::row_to_category))
    }

    /// Get a category by its exact stored name.
    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category by name")?;

        Ok(row.as_ref().map(Self::row_to_category))
    }

    /// Insert a category and return its new ID.
    pub async fn insert_category(&self, name: &str) -> Result<CategoryId> {
        let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to save category")?;
        Ok(result.last_insert_rowid())
    }

    /// Rename a category. Returns the number of rows changed.
    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE categories SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to rename category")?;
        Ok(result.rows_affected())
    }

    /// Delete a category unless it is the default or still referenced.
    /// The reference check and the delete are a single statement.
    pub async fn delete_category_if_unused(&self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = ?
              AND id != ?
              AND NOT EXISTS (SELECT 1 FROM transactions WHERE category_id = ?)
            "#,
        )
        .bind(id)
        .bind(DEFAULT_CATEGORY_ID)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }

    /// Count transactions referencing a category.
    pub async fn count_transactions_for_category(&self, id: CategoryId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM transactions WHERE category_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions for category")?;
        Ok(row.get("count"))
    }

    // ========================
    // Transaction operations
    // ========================

    /// Insert a transaction and return its new ID.
    pub async fn insert_transaction(&self, tx: &NewTransaction) -> Result<TransactionId> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (date, amount_cents, category_id, type, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.date.format(DATE_FORMAT).to_string())
        .bind(tx.amount_cents)
        .bind(tx.category_id)
        .bind(tx.kind.as_str())
        .bind(&tx.description)
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite every writable field of a transaction. Returns the number of rows changed.
    pub async fn update_transaction(&self, id: TransactionId, tx: &NewTransaction) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET date = ?, amount_cents = ?, category_id = ?, type = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(tx.date.format(DATE_FORMAT).to_string())
        .bind(tx.amount_cents)
        .bind(tx.category_id)
        .bind(tx.kind.as_str())
        .bind(&tx.description)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update transaction")?;
        Ok(result.rows_affected())
    }

    /// Delete a transaction. Returns the number of rows removed.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(result.rows_affected())
    }

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, date, amount_cents, type, category_id, description
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// List transactions newest first, optionally limited to `[from, to)`.
    pub async fn list_transactions(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<TransactionView>> {
        let mut query = String::from(TRANSACTION_VIEW_COLUMNS);

        // Collect string bindings first so they live as long as the query
        let bounds = range.map(|(from, to)| {
            (from.format(DATE_FORMAT).to_string(), upper_bound(to))
        });

        match &bounds {
            Some((_, Some(_))) => query.push_str(" WHERE t.date >= ? AND t.date < ?"),
            Some((_, None)) => query.push_str(" WHERE t.date >= ?"),
            None => {}
        }
        query.push_str(" ORDER BY t.date DESC, t.id DESC");

        let mut sql_query = sqlx::query(&query);
        if let Some((from, to)) = &bounds {
            sql_query = sql_query.bind(from);
            if let Some(to) = to {
                sql_query = sql_query.bind(to);
            }
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction_view).collect()
    }

    /// Sum amounts by kind for transactions dated in `[from, to)`.
    pub async fn sum_by_kind(&self, from: NaiveDate, to: NaiveDate) -> Result<KindTotals> {
        let mut query = String::from(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN type = 'Income' THEN amount_cents ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN type = 'Expense' THEN amount_cents ELSE 0 END), 0) AS expense
            FROM transactions
            WHERE date >= ?
            "#,
        );

        let to = upper_bound(to);
        if to.is_some() {
            query.push_str(" AND date < ?");
        }

        let mut sql_query = sqlx::query(&query).bind(from.format(DATE_FORMAT).to_string());
        if let Some(to) = &to {
            sql_query = sql_query.bind(to);
        }

        let row = sql_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute monthly totals")?;

        Ok(KindTotals {
            income: row.get("income"),
            expense: row.get("expense"),
        })
    }

    fn row_to_category(row: &SqliteRow) -> Category {
        Category {
            id: row.get("id"),
            name: row.get("name"),
        }
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let date_str: String = row.get("date");
        let kind_str: String = row.get("type");

        Ok(Transaction {
            id: row.get("id"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid transaction date: {}", date_str))?,
            amount_cents: row.get("amount_cents"),
            kind: TransactionKind::from_str(&kind_str)
                .with_context(|| format!("Invalid transaction type: {}", kind_str))?,
            category_id: row.get("category_id"),
            description: row.get("description"),
        })
    }

    fn row_to_transaction_view(row: &SqliteRow) -> Result<TransactionView> {
        let transaction = Self::row_to_transaction(row)?;
        let category_name: Option<String> = row.get("category_name");
        Ok(TransactionView::from_parts(transaction, category_name))
    }
}

/// Exclusive upper date bound as stored text, or `None` when the bound lies
/// beyond every storable date and excludes nothing.
fn upper_bound(to: NaiveDate) -> Option<String> {
    (to.year() <= MAX_STORED_YEAR).then(|| to.format(DATE_FORMAT).to_string())
}
