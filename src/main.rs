mod cli;
mod logging;
mod reporter;

use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, ProcessArgs};
use colored::*;
use dotenv::dotenv;
use reporter::CliReporter;
use sparkify_etl::config::{load_configuration, load_configuration_from};
use sparkify_etl::storage::{MemoryStore, PgStore};
use sparkify_etl::{AppConfig, BatchResult, EtlEngine, EtlResult, Gateway};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let loaded = match &args.config {
        Some(path) => load_configuration_from(path),
        None => load_configuration(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Process(process_args)) => run_process(&config, &process_args),
        Some(Commands::Migrate) => run_migrate(&config),
        Some(Commands::ResetDb) => run_reset_db(&config),
        Some(Commands::PrintConfig) => {
            print_config(&config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

fn run_process(config: &AppConfig, args: &ProcessArgs) -> Result<()> {
    let engine = EtlEngine::new(config.clone());
    let reporter = CliReporter::new();

    if args.dry_run {
        info!("Dry run: loading into memory, the database is not touched");
        let mut store = MemoryStore::new();
        let result = run_batches(&engine, &mut store, &reporter, args)?;
        print_summary(&result);

        let tables = store.committed();
        info!(
            "In memory: {} songs, {} artists, {} time rows, {} users, {} songplays",
            format!("{}", tables.songs.len()).cyan(),
            format!("{}", tables.artists.len()).cyan(),
            format!("{}", tables.times.len()).cyan(),
            format!("{}", tables.users.len()).cyan(),
            format!("{}", tables.songplays.len()).cyan(),
        );
        return Ok(());
    }

    let mut store = PgStore::connect(&config.database.connection_url())
        .with_context(|| format!("connecting to {}", config.database.redacted_url()))?;
    let result = run_batches(&engine, &mut store, &reporter, args)?;
    print_summary(&result);

    Ok(())
}

fn run_batches(
    engine: &EtlEngine,
    gateway: &mut dyn Gateway,
    reporter: &CliReporter,
    args: &ProcessArgs,
) -> Result<EtlResult> {
    let result = if args.songs_only {
        EtlResult {
            songs: engine.process_songs(gateway, reporter)?,
            ..EtlResult::default()
        }
    } else if args.logs_only {
        EtlResult {
            logs: engine.process_logs(gateway, reporter)?,
            ..EtlResult::default()
        }
    } else {
        engine.run(gateway, reporter)?
    };
    Ok(result)
}

fn print_summary(result: &EtlResult) {
    println!();
    print_batch("Songs", &result.songs);
    print_batch("Logs", &result.logs);
    info!(
        "{} songs, {} artists, {} time rows, {} users, {} songplays ({} matched)",
        format!("{}", result.songs.rows.songs).green(),
        format!("{}", result.songs.rows.artists).green(),
        format!("{}", result.logs.rows.times).green(),
        format!("{}", result.logs.rows.users).green(),
        format!("{}", result.logs.rows.songplays).green(),
        format!("{}", result.logs.rows.matched_songplays).yellow(),
    );
}

fn print_batch(label: &str, batch: &BatchResult) {
    info!(
        "{}: {}/{} files, {} commits in {}",
        label,
        batch.files_processed,
        batch.files_found,
        batch.commits,
        format!("{:.2}s", batch.duration.as_secs_f64()).green(),
    );
}

fn run_migrate(config: &AppConfig) -> Result<()> {
    let mut store = PgStore::connect(&config.database.connection_url())
        .with_context(|| format!("connecting to {}", config.database.redacted_url()))?;
    let applied = store.run_migrations()?;
    info!("{} migrations applied", applied);
    Ok(())
}

fn run_reset_db(config: &AppConfig) -> Result<()> {
    let confirmed = prompt_confirm(
        "Are you SURE you want to DROP and recreate every Sparkify table?",
        Some(false),
    )?;
    if !confirmed {
        info!("Reset cancelled");
        return Ok(());
    }

    let mut store = PgStore::connect(&config.database.connection_url())
        .with_context(|| format!("connecting to {}", config.database.redacted_url()))?;
    store.reset()?;
    println!("All tables dropped and recreated");
    Ok(())
}

fn print_config(config: &AppConfig) {
    println!("database:       {}", config.database.redacted_url());
    println!("song_data:      {}", config.song_data);
    println!("log_data:       {}", config.log_data);
    println!("file_pattern:   {}", config.file_pattern);
    println!("commit_policy:  {:?}", config.commit_policy);
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
