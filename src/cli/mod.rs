use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{Entity, LedgerStore, StoreError};
use crate::config::StoreConfig;
use crate::domain::{
    format_cents, parse_cents, parse_date, Category, CategoryId, NewTransaction, TransactionKind,
    TransactionView, YearMonth,
};
use crate::io::Exporter;

/// Finly - Personal Finance Tracker
#[derive(Parser)]
#[command(name = "finly")]
#[command(about = "An offline income and expense tracker with monthly summaries")]
#[command(version)]
pub struct Cli {
    /// Directory holding the database file
    #[arg(long, default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Database file path (overrides --data-dir)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Print listings and summaries as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Record a transaction
    Add {
        /// Amount (e.g., "50.00" or "50"), must be greater than zero
        amount: String,

        /// Transaction type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Category name or id (omit for uncategorized)
        #[arg(short, long)]
        category: Option<String>,

        /// Description
        #[arg(short = 'm', long)]
        description: Option<String>,
    },

    /// Change an existing transaction
    Edit {
        /// Transaction id
        id: i64,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New type: income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New category name or id
        #[arg(short, long, conflicts_with = "uncategorized")]
        category: Option<String>,

        /// Remove the category
        #[arg(long)]
        uncategorized: bool,

        /// New description
        #[arg(short = 'm', long)]
        description: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction id
        id: i64,
    },

    /// Show a single transaction
    Show {
        /// Transaction id
        id: i64,
    },

    /// List transactions, newest first
    List {
        /// Only show one month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Show income, expenses and balance for a month
    Summary {
        /// Month to summarize (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Summarize the month before the selected one
        #[arg(short, long)]
        previous: bool,
    },

    /// Export all transactions
    Export {
        /// Output file
        output: PathBuf,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories
    List,

    /// Create a category
    Add {
        /// Category name (must be unique)
        name: String,
    },

    /// Rename a category
    Rename {
        /// Category id
        id: CategoryId,

        /// New name
        name: String,
    },

    /// Delete an unused category
    Delete {
        /// Category id
        id: CategoryId,
    },
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::default().with_data_dir(&self.data_dir);
        match &self.database {
            Some(path) => config.with_database_path(path),
            None => config,
        }
    }

    /// Install the global tracing subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_tracing(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("finly={}", default_level)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub async fn run(self) -> Result<()> {
        let config = self.store_config();
        let store = LedgerStore::open(&config).await.with_context(|| {
            format!("Could not open ledger at {}", config.database_path().display())
        })?;

        let result = self.dispatch(&store, &config).await;
        store.close().await;
        result
    }

    async fn dispatch(self, store: &LedgerStore, config: &StoreConfig) -> Result<()> {
        let json = self.json;

        match self.command {
            Commands::Init => {
                println!("Database initialized: {}", config.database_path().display());
            }

            Commands::Category(cmd) => run_category_command(store, cmd, json).await?,

            Commands::Add {
                amount,
                kind,
                date,
                category,
                description,
            } => {
                let tx = NewTransaction {
                    date: match date {
                        Some(date) => parse_date_arg(&date)?,
                        None => Local::now().date_naive(),
                    },
                    amount_cents: parse_amount_arg(&amount)?,
                    kind: kind.parse()?,
                    category_id: match category {
                        Some(category) => Some(resolve_category(store, &category).await?),
                        None => None,
                    },
                    description,
                };

                let id = store.add_transaction(tx.clone()).await?;
                println!(
                    "Recorded {} of {} on {} ({})",
                    tx.kind,
                    format_cents(tx.amount_cents),
                    tx.date,
                    id
                );
            }

            Commands::Edit {
                id,
                amount,
                kind,
                date,
                category,
                uncategorized,
                description,
            } => {
                let current = store.get_transaction(id).await?;
                let mut tx = NewTransaction {
                    date: current.date,
                    amount_cents: current.amount_cents,
                    kind: current.kind,
                    category_id: current.category_id,
                    description: current.description,
                };

                if let Some(amount) = amount {
                    tx.amount_cents = parse_amount_arg(&amount)?;
                }
                if let Some(kind) = kind {
                    tx.kind = kind.parse()?;
                }
                if let Some(date) = date {
                    tx.date = parse_date_arg(&date)?;
                }
                if uncategorized {
                    tx.category_id = None;
                } else if let Some(category) = category {
                    tx.category_id = Some(resolve_category(store, &category).await?);
                }
                if description.is_some() {
                    tx.description = description;
                }

                store.update_transaction(id, tx).await?;
                println!("Updated transaction {}", id);
            }

            Commands::Delete { id } => {
                store.delete_transaction(id).await?;
                println!("Deleted transaction {}", id);
            }

            Commands::Show { id } => {
                let tx = store.get_transaction(id).await?;
                let category = match tx.category_id {
                    Some(category_id) => store.get_category(category_id).await?.name,
                    None => crate::domain::DEFAULT_CATEGORY_NAME.to_string(),
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&tx)?);
                } else {
                    println!("Transaction: {}", tx.id);
                    println!("  Date:        {}", tx.date);
                    println!("  Type:        {}", tx.kind);
                    println!("  Amount:      {}", format_cents(tx.amount_cents));
                    println!("  Category:    {}", category);
                    if let Some(desc) = &tx.description {
                        println!("  Description: {}", desc);
                    }
                }
            }

            Commands::List { month } => {
                let month = month.as_deref().map(parse_month_arg).transpose()?;
                let transactions = store.list_transactions(month).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&transactions)?);
                } else {
                    print_transactions(&transactions);
                }
            }

            Commands::Summary { month, previous } => {
                let month = summary_month(month.as_deref(), previous, Local::now().date_naive())?;
                let summary = store.monthly_summary(month).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    let (income, expense, balance) = summary.formatted();
                    println!("Summary for {}", summary.month);
                    println!("  Income:   {:>12}", income);
                    println!("  Expenses: {:>12}", expense);
                    println!("  {}", "-".repeat(22));
                    println!("  Balance:  {:>12}", balance);
                }
            }

            Commands::Export { output, format } => match format.as_str() {
                "csv" => {
                    let count = store.export_all(&output).await?;
                    println!("Exported {} transactions to {}", count, output.display());
                }
                "json" => {
                    let file = std::fs::File::create(&output).with_context(|| {
                        format!("Failed to create output file: {}", output.display())
                    })?;
                    let snapshot = Exporter::new(store)
                        .export_snapshot_json(std::io::BufWriter::new(file))
                        .await?;
                    println!(
                        "Exported {} categories and {} transactions to {}",
                        snapshot.categories.len(),
                        snapshot.transactions.len(),
                        output.display()
                    );
                }
                _ => anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format),
            },
        }

        Ok(())
    }
}

async fn run_category_command(
    store: &LedgerStore,
    cmd: CategoryCommands,
    json: bool,
) -> Result<()> {
    match cmd {
        CategoryCommands::List => {
            let categories = store.list_categories().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                println!("{:>4}  {}", "ID", "NAME");
                println!("{}", "-".repeat(30));
                for category in categories {
                    let marker = if category.is_default() { "  (default)" } else { "" };
                    println!("{:>4}  {}{}", category.id, category.name, marker);
                }
            }
        }

        CategoryCommands::Add { name } => {
            let id = store.add_category(&name).await?;
            println!("Created category: {} ({})", name.trim(), id);
        }

        CategoryCommands::Rename { id, name } => {
            store.rename_category(id, &name).await?;
            println!("Renamed category {} to {}", id, name.trim());
        }

        CategoryCommands::Delete { id } => {
            if store.delete_category(id).await? {
                println!("Deleted category {}", id);
            } else {
                anyhow::bail!(
                    "Cannot delete category {}: it is used by transactions, is protected, or does not exist",
                    id
                );
            }
        }
    }
    Ok(())
}

fn print_transactions(transactions: &[TransactionView]) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:>5}  {:<10}  {:>12}  {:<7}  {:<18}  {}",
        "ID", "DATE", "AMOUNT", "TYPE", "CATEGORY", "DESCRIPTION"
    );
    println!("{}", "-".repeat(80));
    for tx in transactions {
        println!(
            "{:>5}  {:<10}  {:>12}  {:<7}  {:<18}  {}",
            tx.id,
            tx.date,
            format_cents(tx.amount_cents),
            tx.kind,
            truncate(&tx.category, 18),
            tx.description.as_deref().unwrap_or("")
        );
    }
}

async fn resolve_category(store: &LedgerStore, input: &str) -> Result<CategoryId> {
    let categories = store.list_categories().await?;
    match_category(&categories, input)
}

/// An exact (trimmed) name match wins; otherwise the input must be an id.
fn match_category(categories: &[Category], input: &str) -> Result<CategoryId> {
    let name = input.trim();
    if let Some(category) = categories.iter().find(|c| c.name == name) {
        return Ok(category.id);
    }
    name.parse::<CategoryId>()
        .map_err(|_| anyhow::anyhow!("Unknown category '{}'", name))
}

fn parse_amount_arg(input: &str) -> Result<i64> {
    let cents = parse_cents(input)?;
    if cents <= 0 {
        anyhow::bail!("Amount must be greater than zero.");
    }
    Ok(cents)
}

fn parse_date_arg(input: &str) -> Result<NaiveDate> {
    parse_date(input).with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", input))
}

fn parse_month_arg(input: &str) -> Result<YearMonth> {
    Ok(input.parse::<YearMonth>()?)
}

fn summary_month(month: Option<&str>, previous: bool, today: NaiveDate) -> Result<YearMonth> {
    let month = match month {
        Some(month) => parse_month_arg(month)?,
        None => YearMonth::of(today),
    };
    Ok(if previous { month.previous() } else { month })
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// A user-facing message for a failed command.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::DuplicateName(name)) => {
            format!("A category named '{}' already exists.", name)
        }
        Some(StoreError::InvalidReference(id)) => {
            format!("Category {} does not exist. Run `finly category list`.", id)
        }
        Some(StoreError::NotFound {
            entity: Entity::Transaction,
            id,
        }) => format!("No transaction with id {}.", id),
        Some(StoreError::NotFound {
            entity: Entity::Category,
            id,
        }) => format!("No category with id {}.", id),
        Some(StoreError::ConstraintViolation(reason)) => format!("Invalid data: {}", reason),
        Some(StoreError::Io(io)) => format!("Could not write file: {}", io),
        Some(StoreError::Closed) => "The ledger is closed.".to_string(),
        Some(StoreError::Database(_)) | None => format!("{:#}", err),
    }
}
