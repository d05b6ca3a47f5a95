//! statedeck - lesson playback core
//!
//! CLI entry point for managing stored checkpoints.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use statedeck::config::{statedeck_home, Config};
use statedeck::error::exit_codes;
use statedeck::storage::FileCheckpointStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// statedeck - manage saved lesson checkpoints
#[derive(Parser)]
#[command(name = "statedeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved checkpoints, most recent first
    List {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Maximum number of checkpoints to show
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show one checkpoint in detail
    Show {
        /// Exploration id of the checkpoint
        exploration_id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Delete one checkpoint
    Delete {
        /// Exploration id of the checkpoint
        exploration_id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Remove old checkpoints
    Clean {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Remove checkpoints older than duration (e.g., "7d", "24h")
        #[arg(long)]
        before: Option<String>,
        /// Remove temp files left by interrupted writes
        #[arg(long)]
        orphans: bool,
        /// Show what would be cleaned without removing
        #[arg(long)]
        dry_run: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    setup_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("statedeck error: {}", e);
            ExitCode::from(exit_codes::FAILURE)
        }
    }
}

/// Install the tracing subscriber.
///
/// The filter comes from `STATEDECK_LOG` (e.g. `debug`, `statedeck=trace`)
/// and defaults to `warn`. Logs go to stderr so `--json` output stays clean.
fn setup_logging() {
    let filter = EnvFilter::try_from_env("STATEDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.statedeck/crash.log and exits with the failure code.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("statedeck panic: {}", info);

        if let Some(home) = statedeck_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(i32::from(exit_codes::FAILURE));
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Commands::List { json, quiet, limit } => run_list(&config, json, quiet, limit),
        Commands::Show {
            exploration_id,
            json,
            quiet,
        } => run_show(&config, &exploration_id, json, quiet),
        Commands::Delete {
            exploration_id,
            json,
            quiet,
        } => run_delete(&config, &exploration_id, json, quiet),
        Commands::Clean {
            json,
            quiet,
            before,
            orphans,
            dry_run,
        } => run_clean(&config, json, quiet, before, orphans, dry_run),
    }
}

/// Open the file store configured for this run.
fn open_store(config: &Config) -> statedeck::Result<FileCheckpointStore> {
    Ok(FileCheckpointStore::new()?.with_size_limit(config.checkpoint.size_limit_bytes))
}

fn print_output(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS)
    } else {
        ExitCode::from(exit_codes::FAILURE)
    }
}

fn run_list(
    config: &Config,
    json: bool,
    quiet: bool,
    limit: Option<usize>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use statedeck::cli::list::{ListCommand, ListOptions};

    let cmd = ListCommand::new(open_store(config)?);
    let options = ListOptions {
        json,
        quiet,
        limit: limit.unwrap_or(config.checkpoint.list_limit),
    };

    let output = cmd.run(&options);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_show(
    config: &Config,
    exploration_id: &str,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use statedeck::cli::show::{ShowCommand, ShowOptions};

    let cmd = ShowCommand::new(open_store(config)?);
    let options = ShowOptions { json, quiet };

    let output = cmd.run(exploration_id);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_delete(
    config: &Config,
    exploration_id: &str,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use statedeck::cli::delete::{DeleteCommand, DeleteOptions};

    let cmd = DeleteCommand::new(open_store(config)?);
    let options = DeleteOptions { json, quiet };

    let output = cmd.run(exploration_id);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_clean(
    config: &Config,
    json: bool,
    quiet: bool,
    before: Option<String>,
    orphans: bool,
    dry_run: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use statedeck::cli::clean::{CleanCommand, CleanOptions};

    let cmd = CleanCommand::new(open_store(config)?);
    let options = CleanOptions {
        json,
        quiet,
        before,
        orphans,
        dry_run,
    };

    let output = cmd.run(&options);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}
