use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::domain::{CategoryId, ParseCentsError, ParseKindError, YearMonthError};

/// The kind of record a `StoreError::NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Category,
    Transaction,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Category => write!(f, "Category"),
            Entity::Transaction => write!(f, "Transaction"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Category already exists: {0}")]
    DuplicateName(String),

    #[error("Category does not exist: {0}")]
    InvalidReference(CategoryId),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("The ledger store is closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(anyhow::Error),
}

impl StoreError {
    pub fn category_not_found(id: CategoryId) -> Self {
        StoreError::NotFound {
            entity: Entity::Category,
            id,
        }
    }

    pub fn transaction_not_found(id: i64) -> Self {
        StoreError::NotFound {
            entity: Entity::Transaction,
            id,
        }
    }

    /// Classify a failed category insert or rename. A unique-index violation
    /// means another writer already holds `name`.
    pub(crate) fn from_category_write(err: anyhow::Error, name: &str) -> Self {
        match database_error_kind(&err) {
            Some(ErrorKind::UniqueViolation) => StoreError::DuplicateName(name.to_string()),
            _ => err.into(),
        }
    }

    /// Classify a failed transaction insert or update. A foreign-key violation
    /// means the referenced category is gone.
    pub(crate) fn from_transaction_write(
        err: anyhow::Error,
        category_id: Option<CategoryId>,
    ) -> Self {
        match (database_error_kind(&err), category_id) {
            (Some(ErrorKind::ForeignKeyViolation), Some(id)) => StoreError::InvalidReference(id),
            _ => err.into(),
        }
    }
}

fn database_error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => Some(db.kind()),
        _ => None,
    }
}

/// Storage failures are classified so integrity violations the schema caught
/// surface as their specific variants instead of a generic database error.
impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return StoreError::Io(std::io::Error::new(io.kind(), err.to_string()));
        }

        match err.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::PoolClosed) => StoreError::Closed,
            Some(sqlx::Error::Io(io)) => {
                StoreError::Io(std::io::Error::new(io.kind(), err.to_string()))
            }
            Some(sqlx::Error::Database(db)) => match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    StoreError::ConstraintViolation(db.message().to_string())
                }
                _ => StoreError::Database(err),
            },
            _ => StoreError::Database(err),
        }
    }
}

impl From<ParseKindError> for StoreError {
    fn from(err: ParseKindError) -> Self {
        StoreError::ConstraintViolation(err.to_string())
    }
}

impl From<ParseCentsError> for StoreError {
    fn from(err: ParseCentsError) -> Self {
        StoreError::ConstraintViolation(err.to_string())
    }
}

impl From<YearMonthError> for StoreError {
    fn from(err: YearMonthError) -> Self {
        StoreError::ConstraintViolation(err.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => StoreError::Io(io),
                other => StoreError::Database(anyhow::anyhow!("CSV error: {:?}", other)),
            }
        } else {
            StoreError::Database(anyhow::Error::new(err).context("Failed to write CSV"))
        }
    }
}
