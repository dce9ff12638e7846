//! mailtrace CLI.
//!
//! `resolve` reads a file of display names (one per row), resolves each
//! against the owner's Gmail and Google Calendar, and persists outcomes to
//! the SQLite store — already-resolved rows are skipped on re-runs.
//! `show` prints whatever the store currently holds.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use mailtrace::config::Config;
use mailtrace::driver;
use mailtrace::google::{self, calendar::CalendarClient, gmail::GmailClient};
use mailtrace::ratelimit::RateLimiter;
use mailtrace::resolver::ResolverContext;
use mailtrace::store::OutcomeStore;

#[derive(Parser)]
#[command(
    name = "mailtrace",
    about = "Resolve display names to email addresses from your own mailbox and calendar",
    version
)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a file of display names (one per line).
    Resolve {
        /// Input file with one display name per row. Blank lines are kept
        /// as empty rows so row numbering stays stable.
        #[arg(long)]
        names: PathBuf,
        /// Outcome database path (default: ~/.mailtrace/outcomes.db).
        #[arg(long)]
        db: Option<PathBuf>,
        /// Config file path (default: ~/.mailtrace/config.json).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Re-resolve rows that already have a qualifying stored outcome.
        #[arg(long)]
        force: bool,
    },
    /// Print stored outcomes.
    Show {
        /// Outcome database path (default: ~/.mailtrace/outcomes.db).
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Arguments::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Arguments) -> Result<(), String> {
    match args.command {
        Command::Resolve {
            names,
            db,
            config,
            force,
        } => resolve_command(&names, db, config.as_deref(), force),
        Command::Show { db } => show_command(db),
    }
}

fn open_store(db: Option<PathBuf>) -> Result<OutcomeStore, String> {
    match db {
        Some(path) => OutcomeStore::open_at(path),
        None => OutcomeStore::open(),
    }
    .map_err(|e| e.to_string())
}

fn resolve_command(
    names: &PathBuf,
    db: Option<PathBuf>,
    config_path: Option<&std::path::Path>,
    force: bool,
) -> Result<(), String> {
    let config = Config::load(config_path).map_err(|e| e.to_string())?;

    let input = std::fs::read_to_string(names)
        .map_err(|e| format!("failed to read {}: {}", names.display(), e))?;
    let rows: Vec<String> = input.lines().map(str::to_string).collect();
    if rows.is_empty() {
        // The only fatal input condition: nothing to process at all.
        return Err(format!("{} contains no rows", names.display()));
    }

    let self_addresses = config.self_address_set();
    if self_addresses.is_empty() {
        log::warn!("no selfAddresses configured; outbound detection limited to Bcc");
    }

    let token = google::get_valid_access_token().map_err(|e| e.to_string())?;
    let gmail = GmailClient::new(token.clone());
    let calendar = CalendarClient::new(token);
    let limiter = RateLimiter::new(Duration::from_millis(config.min_query_interval_ms));

    let ctx = ResolverContext {
        mail: &gmail,
        calendar: &calendar,
        limiter: &limiter,
        self_addresses,
        noise_domains: config.noise_domains.clone(),
        window_days: config.search_window_days,
        now: chrono::Utc::now(),
        page_size: config.page_size,
    };

    let mut store = open_store(db)?;
    let summary = driver::run_rows(&ctx, &rows, &mut store, force)?;

    println!(
        "{} resolved, {} skipped, {} not found, {} errors, {} empty ({} rows)",
        summary.resolved,
        summary.skipped,
        summary.not_found,
        summary.errors,
        summary.empty,
        rows.len()
    );
    Ok(())
}

fn show_command(db: Option<PathBuf>) -> Result<(), String> {
    let store = open_store(db)?;
    let rows = store.all().map_err(|e| e.to_string())?;
    if rows.is_empty() {
        println!("No stored outcomes.");
        return Ok(());
    }
    for (row, name, outcome) in rows {
        println!(
            "{:>4}  {:<24} {:<30} {:<28} {}",
            row + 1,
            name,
            outcome.email,
            outcome.status,
            outcome.confidence
        );
    }
    Ok(())
}
