use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

// Use library instead of local modules
use account_service::{count_accounts, init_tracing, open_database, AccountStore, SqliteAccountStore};

/// Account Service admin tool - inspect the account database
#[derive(Parser)]
#[command(name = "accounts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "ACCOUNTS_DB", default_value = "accounts.db", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and schema if missing
    Init,
    /// List all accounts
    List,
    /// Show one account as JSON
    Show {
        /// Account id
        id: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Init => run_init(&cli.db),
        Command::List => run_list(&cli.db),
        Command::Show { id } => run_show(&cli.db, &id),
    }
}

fn run_init(db_path: &Path) -> Result<()> {
    println!("🗄️  Setting up account database: {}", db_path.display());

    let conn = open_database(db_path)?;
    let count = count_accounts(&conn)?;

    println!("✓ Database initialized with WAL mode");
    println!("✓ Database contains {} accounts", count);
    Ok(())
}

fn run_list(db_path: &Path) -> Result<()> {
    let store = SqliteAccountStore::open(db_path)?;
    let accounts = store.find_all().context("Failed to load accounts")?;

    if accounts.is_empty() {
        println!("No accounts yet.");
        return Ok(());
    }

    println!(
        "{:<36}  {:>14}  {:<24}  {:>16}  {:>6}",
        "ID", "NUMBER", "HOLDER", "BALANCE", "TXS"
    );
    println!("{}", "━".repeat(104));
    for account in &accounts {
        println!(
            "{:<36}  {:>14}  {:<24}  {:>16.2}  {:>6}",
            account.id,
            account.account_number,
            account.holder_name,
            account.balance,
            account.transaction_count
        );
    }
    println!("{}", "━".repeat(104));

    let total: f64 = accounts.iter().map(|a| a.balance).sum();
    println!("✓ {} accounts, total balance {:.2}", accounts.len(), total);
    Ok(())
}

fn run_show(db_path: &Path, id: &str) -> Result<()> {
    let store = SqliteAccountStore::open(db_path)?;

    match store.find_by_id(id) {
        Ok(account) => {
            println!("{}", serde_json::to_string_pretty(&account)?);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            eprintln!("❌ Account not found: {}", id);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
