//! Journal CLI probe.
//!
//! # Responsibility
//! - Open a journal database file and run one data-access command.
//! - Keep output deterministic for quick local sanity checks.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use journal_core::{
    default_log_level, init_logging, open_db_with_config, CancellationToken, DbConfig,
    EntryId, JournalDb, JournalEntry, JournalService, SqliteEntryRepository,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "journal", version, about = "Inspect and edit a journal database")]
struct Cli {
    /// Path to the SQLite journal file.
    #[arg(long, default_value = "journal.db")]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    /// Drop and recreate the schema when an older version is found.
    #[arg(long)]
    reset_on_version_change: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core health and version.
    Ping,
    /// List entries, newest first.
    List,
    /// Add one entry.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        mood: Option<i32>,
        /// Repeat for several emojis.
        #[arg(long = "emoji")]
        emojis: Vec<String>,
        #[arg(long, default_value_t = 0.0)]
        sleep_hours: f32,
    },
    /// Delete one entry by id. Missing ids are ignored.
    Delete { id: EntryId },
    /// Delete every entry and compact the file.
    Clear,
    /// Drop and recreate the schema, losing all entries.
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::Ping = cli.command {
        println!("journal_core ping={}", journal_core::ping());
        println!("journal_core version={}", journal_core::core_version());
        return Ok(());
    }

    let config = DbConfig {
        destructive_reset_on_version_change: cli.reset_on_version_change,
        ..DbConfig::default()
    };
    let db = open_db_with_config(&cli.db, &config)?;
    let service = JournalService::new(SqliteEntryRepository::new(db.clone()));

    match cli.command {
        Command::Ping => {}
        Command::List => {
            let entries = service.get_all_once(CancellationToken::new()).await?;
            for entry in &entries {
                print_entry(entry);
            }
            println!("total={}", entries.len());
        }
        Command::Add {
            title,
            body,
            mood,
            emojis,
            sleep_hours,
        } => {
            let mut entry = JournalEntry::new(title, body);
            entry.mood_rating = mood;
            entry.mood_emojis = emojis;
            entry.sleep_hours = sleep_hours;
            let id = service.upsert(&entry)?;
            info!("event=cli_add module=cli status=ok id={id}");
            println!("added id={id}");
        }
        Command::Delete { id } => {
            service.delete_by_id(id)?;
            println!("deleted id={id}");
        }
        Command::Clear => clear(&db)?,
        Command::Reset => {
            db.reset()?;
            println!("reset ok");
        }
    }

    Ok(())
}

fn clear(db: &JournalDb) -> Result<(), Box<dyn std::error::Error>> {
    let removed = db.clear_all_tables()?;
    println!("cleared rows={removed}");
    Ok(())
}

fn print_entry(entry: &JournalEntry) {
    println!(
        "{id}\t{created}\t{title}\tmood={mood}\temojis={emojis}\tsleep_h={sleep:.1}",
        id = entry.id,
        created = format_timestamp(entry.created_at),
        title = entry.title,
        mood = entry
            .mood_rating
            .map_or_else(|| "-".to_string(), |value| value.to_string()),
        emojis = entry.mood_emojis.join(" "),
        sleep = entry.sleep_hours,
    );
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}
