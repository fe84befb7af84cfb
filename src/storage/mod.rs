mod repository;

pub use repository::*;

/// SQL migration for the initial schema (categories + transactions).
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Ordered schema migrations. Entry `n` upgrades a database from
/// `user_version = n` to `n + 1`.
pub const MIGRATIONS: &[&str] = &[MIGRATION_001_INITIAL];

/// Schema version of a fully migrated database.
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;
