use serde::{Deserialize, Serialize};

pub type CategoryId = i64;

/// Id of the protected default category created on every startup.
pub const DEFAULT_CATEGORY_ID: CategoryId = 1;

/// Name of the default category, also shown for uncategorized transactions.
pub const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

/// A user-defined label for grouping transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_CATEGORY_ID
    }
}

/// Normalize a category name the way it is stored and compared.
/// Returns `None` when nothing is left after trimming.
pub fn normalize_category_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
