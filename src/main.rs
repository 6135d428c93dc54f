use anyhow::{Context, Result};
use log::info;
use netsuite_dashboard::config::Secrets;
use netsuite_dashboard::models::{AccountingBook, Credentials, Destination, ReportModel, ResultRow};
use netsuite_dashboard::session::CredentialStatus;
use netsuite_dashboard::shell::{DashboardShell, ShellState};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Get the platform-specific default secrets path
fn get_default_secrets_path() -> PathBuf {
    if cfg!(target_os = "linux") {
        // Linux: /home/username/.config/netsuite_dashboard/secrets.toml
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/home/user"));
        PathBuf::from(home)
            .join(".config")
            .join("netsuite_dashboard")
            .join("secrets.toml")
    } else if cfg!(target_os = "macos") {
        // macOS: ~/Library/Application Support/netsuite_dashboard/secrets.toml
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/Users/user"));
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join("netsuite_dashboard")
            .join("secrets.toml")
    } else {
        // Default to local secrets.toml for other platforms (including Windows)
        PathBuf::from("secrets.toml")
    }
}

/// Load secrets from a specific path
pub fn load_secrets_from_path(path: &Path) -> Result<Secrets> {
    info!("Loading secrets from {:?}...", path);
    let secrets = Secrets::load(path)
        .context("Failed to load secrets file. Please ensure it contains valid TOML")?;
    info!("Secrets loaded successfully from {:?}", path);
    Ok(secrets)
}

/// Load secrets from the default path chain. Absence of a secrets file is
/// fine: every key has an environment fallback.
pub fn load_secrets() -> Result<Secrets> {
    let default_path = get_default_secrets_path();
    if default_path.exists() {
        info!("Using secrets from system path: {}", default_path.display());
        return load_secrets_from_path(&default_path);
    }

    let local_path = Path::new("secrets.toml");
    if local_path.exists() {
        info!("Using secrets from local path: {}", local_path.display());
        return load_secrets_from_path(local_path);
    }

    info!("No secrets file found, relying on environment variables");
    Ok(Secrets::default())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn render_rows(rows: &[ResultRow]) {
    println!(
        "{:>6}  {:<10}  {:<12}  {:<24}  {:<32}  {:<20}  {:>14}",
        "sort", "period", "ending", "category", "account", "type", "balance"
    );
    for row in rows {
        println!(
            "{:>6}  {:<10}  {:<12}  {:<24}  {:<32}  {:<20}  {:>14}",
            row.sort_helper,
            row.period_name,
            row.period_ending.format("%Y-%m-%d").to_string(),
            row.category,
            row.account_name,
            row.account_type,
            row.balance.to_string()
        );
    }
    println!("{} rows", rows.len());
}

fn credentials_panel(shell: &mut DashboardShell) -> io::Result<()> {
    println!("-- Snowflake Credentials --");
    let username = prompt("Username")?;
    let password = prompt("Password")?;
    let role = prompt("Role")?;
    match shell.save_credentials(Credentials {
        username,
        password,
        role,
    }) {
        CredentialStatus::Saved => println!("Credentials saved."),
        CredentialStatus::Incomplete => {
            println!("Please enter your Snowflake username and password in full.")
        }
    }
    Ok(())
}

fn pick_destination(shell: &mut DashboardShell) -> io::Result<()> {
    let choice = prompt("Destination ([1] Snowflake, [2] BigQuery, [3] Dunder Mifflin Sample Data)")?;
    let destination = match choice.as_str() {
        "1" => Destination::Snowflake,
        "2" => Destination::BigQuery,
        "3" => Destination::SampleData,
        other => {
            println!("Unknown destination choice: {}", other);
            return Ok(());
        }
    };
    shell.session_mut().destination = destination;
    println!("Destination set to {}", destination);
    Ok(())
}

fn pick_accounting_book(shell: &mut DashboardShell) -> io::Result<()> {
    let choice = prompt("Accounting book ([1] IFRS, [2] alternate)")?;
    match choice.parse::<i32>() {
        Ok(book) => {
            shell.session_mut().accounting_book = AccountingBook(book);
            println!("Accounting book set to {}", book);
        }
        Err(_) => println!("Accounting book must be a number"),
    }
    Ok(())
}

async fn run_report(shell: &mut DashboardShell, model: ReportModel) {
    println!("Loading data...");
    match shell.run_report(model).await {
        Ok(rows) => {
            println!("{} - {}", shell.session().destination, model);
            render_rows(&rows);
        }
        Err(e) => println!("{}", e),
    }
}

async fn ready_loop(shell: &mut DashboardShell) -> Result<bool> {
    println!();
    println!("NetSuite Dashboard - select a report:");
    println!("  [1] Balance Sheet Report: assets, liabilities, and equity balances");
    println!("  [2] Income Statement Report: revenue and expense breakdown");
    println!("  [d] change destination   [b] accounting book   [c] resave credentials   [q] quit");

    match prompt("Choice")?.as_str() {
        "1" => run_report(shell, ReportModel::BalanceSheet).await,
        "2" => run_report(shell, ReportModel::IncomeStatement).await,
        "d" => pick_destination(shell)?,
        "b" => pick_accounting_book(shell)?,
        "c" => credentials_panel(shell)?,
        "q" => return Ok(false),
        other => println!("Unknown choice: {}", other),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting NetSuite dashboard");

    let secrets = load_secrets()?;
    let mut shell = DashboardShell::new(secrets);

    loop {
        match shell.state() {
            ShellState::LoggedOut => {
                println!("Login Required");
                println!("Please enter the password to access the NetSuite dashboard.");
                let password = prompt("Password")?;
                if shell.login(&password) {
                    println!("Login successful!");
                } else {
                    println!("Incorrect password");
                }
            }
            ShellState::AwaitingCredentials => {
                println!("NetSuite Dashboard");
                println!(
                    "Please enter your Snowflake username and password to view reports."
                );
                credentials_panel(&mut shell)?;
            }
            ShellState::Ready => {
                if !ready_loop(&mut shell).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}
