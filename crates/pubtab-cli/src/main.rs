//! pubtab CLI - publication table transcription
//!
//! Command-line interface for batch runs over input folders and for
//! inspecting what the detectors find in a single raw file.

mod inspect;
mod report;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pubtab_core::{Granularity, Settings};
use pubtab_engine::{Assembler, Job, TracingLog};
use pubtab_xlsx::XlsxStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::report::{ExitCode, OutputFormat};

#[derive(Parser)]
#[command(name = "pubtab")]
#[command(
    author,
    version,
    about = "Transcribe raw statistical workbooks into publication layouts",
    long_about = None
)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "PUBTAB_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process input folders into internal and public artifacts
    Run {
        /// Folder with monthly raw files
        #[arg(long, value_name = "DIR")]
        month: Option<PathBuf>,

        /// Folder with quarterly raw files
        #[arg(long, value_name = "DIR")]
        quarter: Option<PathBuf>,

        /// Folder with half-year raw files
        #[arg(long, value_name = "DIR")]
        half_year: Option<PathBuf>,

        /// Folder with annual raw files
        #[arg(long, value_name = "DIR")]
        year: Option<PathBuf>,

        /// Output base directory
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// Layout template directory
        #[arg(long, value_name = "DIR")]
        layouts: Option<PathBuf>,

        /// Write a protocol file into this directory
        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,

        /// Text after the as-of label (default: today, dd.mm.yyyy)
        #[arg(long, value_name = "TEXT")]
        as_of: Option<String>,

        /// Skip files whose outputs already exist
        #[arg(long)]
        no_overwrite: bool,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the detected table kind, period and data blocks of a raw file
    Inspect {
        /// Raw input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (protocol, protocol_path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let name = chrono::Local::now()
                .format("pubtab_%Y-%m-%d_%H%M%S.log")
                .to_string();
            let path = dir.join(name);
            let file = std::fs::File::create(&path)
                .with_context(|| format!("creating protocol file {}", path.display()))?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(protocol)
        .with(filter)
        .init();
    Ok(protocol_path)
}

fn jobs(
    month: Option<PathBuf>,
    quarter: Option<PathBuf>,
    half_year: Option<PathBuf>,
    year: Option<PathBuf>,
) -> Vec<Job> {
    [
        (Granularity::Month, month),
        (Granularity::Quarter, quarter),
        (Granularity::HalfYear, half_year),
        (Granularity::Year, year),
    ]
    .into_iter()
    .filter_map(|(granularity, dir)| dir.map(|dir| Job::for_granularity(granularity, dir)))
    .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            month,
            quarter,
            half_year,
            year,
            out,
            layouts,
            log_dir,
            as_of,
            no_overwrite,
            format,
        } => {
            if let Some(layouts) = layouts {
                settings.layout_dir = layouts;
            }
            if log_dir.is_some() {
                settings.log_dir = log_dir;
            }
            if no_overwrite {
                settings.overwrite = false;
            }

            let protocol = init_logging(cli.verbose, settings.log_dir.as_deref())?;
            if let Some(path) = &protocol {
                tracing::info!(target: "pubtab", "protocol file: {}", path.display());
            }

            let jobs = jobs(month, quarter, half_year, year);
            if jobs.is_empty() {
                bail!("no input folder given; use --month, --quarter, --half-year or --year");
            }

            let separator = settings.vocabulary().group_separator;
            let store = XlsxStore::new().with_group_separator(separator);
            let mut assembler = Assembler::new(settings, &store, &TracingLog);
            if let Some(as_of) = as_of {
                assembler = assembler.with_as_of(as_of);
            }
            let report = assembler.run_batch(&jobs, &out);

            match format {
                OutputFormat::Text => print!("{}", report::batch_text(&report)),
                OutputFormat::Json => println!("{}", report::batch_json(&report)?),
            }

            std::io::stdout().flush()?;

            let code = ExitCode::from_report(&report);
            if code != ExitCode::Success {
                if let Some(path) = &protocol {
                    eprintln!("See protocol file: {}", path.display());
                }
                std::process::exit(code.code());
            }
        }
        Commands::Inspect { file, format } => {
            init_logging(cli.verbose, None)?;
            let inspection = inspect::inspect(&file, &settings)?;
            match format {
                OutputFormat::Text => print!("{}", report::inspection_text(&inspection)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspection)?),
            }
        }
    }

    Ok(())
}
