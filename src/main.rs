use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use mast_scorer::audit::AuditLog;
use mast_scorer::config::{date_tag, AppConfig};
use mast_scorer::correction::TerminalOperator;
use mast_scorer::pipeline::{run_results, run_update, ResultsOptions, UpdateOptions};
use mast_scorer::MastError;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FATAL_LOAD: i32 = 1;
const EXIT_PARSE: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Grade a new scan file, merge it into the dataset and refresh quantiles
    Update {
        /// Raw scan file from the scanner (`none` skips ingest)
        #[arg(short, long)]
        ascii: Option<PathBuf>,

        /// YAML answer keys, one entry per test
        #[arg(short, long)]
        keys: Option<PathBuf>,

        /// JSON student registration roster
        #[arg(short = 'i', long)]
        students: Option<PathBuf>,

        /// Skip the missing-tests report (useful before every scan file is in)
        #[arg(long)]
        no_lost: bool,
    },
    /// Tally school points and award winners from the final dataset
    Results {
        /// Final dataset written by `update`
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// JSON student registration roster
        #[arg(short = 'i', long)]
        students: Option<PathBuf>,

        /// JSON school directory
        #[arg(short, long)]
        schools: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "mast")]
#[command(about = "Math & Science Tournament grader and analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ./mast.yaml, then ~/.config/mast/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter level or directive (overrides --verbose)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Exit code for a failed run.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<MastError>() {
        Some(MastError::ParseMalformed { .. }) => EXIT_PARSE,
        Some(MastError::Policy(_)) => EXIT_CONFIG,
        _ => EXIT_FATAL_LOAD,
    }
}

fn run(command: Commands, mut config: AppConfig) -> anyhow::Result<()> {
    let use_colors = mast_scorer::output::should_use_colors();
    let mut audit = AuditLog::open(&config.files.audit_log)?;
    let mut stdout = std::io::stdout();

    match command {
        Commands::Update {
            ascii,
            keys,
            students,
            no_lost,
        } => {
            let files = &mut config.files;
            if let Some(path) = ascii {
                files.raw = path;
            }
            if let Some(path) = keys {
                files.keys = path;
            }
            if let Some(path) = students {
                files.roster = path;
            }
            let options = UpdateOptions {
                files: config.files.clone(),
                show_lost_tests: !no_lost,
                use_colors,
            };
            let mut operator = TerminalOperator::stdio(use_colors);
            let report = run_update(
                &config.policy,
                &options,
                &mut operator,
                &mut audit,
                &mut stdout,
            )?;
            tracing::info!(
                ingested = report.ingested,
                total = report.total,
                first_run = report.first_run,
                "update finished"
            );
        }
        Commands::Results {
            data,
            students,
            schools,
        } => {
            let tag = date_tag(chrono::Local::now().date_naive());
            let mut options = ResultsOptions::from_files(&config.files, &tag, use_colors);
            if let Some(path) = data {
                options.data = path;
            }
            if let Some(path) = students {
                options.roster = path;
            }
            if let Some(path) = schools {
                options.schools = path;
            }
            let report = run_results(&config.policy, &options, &mut audit, &mut stdout)?;
            tracing::info!(schools = report.standings.len(), "results finished");
        }
    }

    println!("\n-- Program completed successfully. --");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    if let Err(e) =
        mast_scorer::logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json)
    {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = match mast_scorer::config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = run(cli.command, config) {
        eprintln!("\nError: {:#}", e);
        eprintln!("Exiting");
        std::process::exit(exit_code(&e));
    }

    tracing::debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
