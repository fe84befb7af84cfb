use std::path::PathBuf;

/// Where the ledger keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the database file. Created on open if missing.
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`.
    pub database_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
        }
    }
}

impl StoreConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Use an explicit database path, overriding both fields.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.data_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();
        self.database_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(default_database_file);
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_file() -> String {
    "expenses.db".to_string()
}
