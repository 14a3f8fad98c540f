// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use nmrscrape::app_config::{self, Config, CrossRefMerge, PolicyKind};
use nmrscrape::file_utils::FileManager;
use nmrscrape::app_controller::{Controller, RunSummary};
use nmrscrape::stages::OutcomeKind;

/// CLI wrapper for CandidatePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPolicy {
    Random,
    First,
    Seeded,
}

impl From<CliPolicy> for PolicyKind {
    fn from(cli_policy: CliPolicy) -> Self {
        match cli_policy {
            CliPolicy::Random => PolicyKind::Random,
            CliPolicy::First => PolicyKind::First,
            CliPolicy::Seeded => PolicyKind::Seeded,
        }
    }
}

/// CLI wrapper for CrossRefMerge to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMerge {
    LastRow,
    Union,
}

impl From<CliMerge> for CrossRefMerge {
    fn from(cli_merge: CliMerge) -> Self {
        match cli_merge {
            CliMerge::LastRow => CrossRefMerge::LastRowWins,
            CliMerge::Union => CrossRefMerge::Union,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for nmrscrape
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// nmrscrape - BMRB chemical shift and secondary structure scraper
///
/// Collects average carbon chemical shifts for BMRB entries and annotates
/// each residue with the secondary structure of a cross-referenced PDB entry.
#[derive(Parser, Debug)]
#[command(name = "nmrscrape")]
#[command(version)]
#[command(about = "Scrape BMRB chemical shifts and annotate them with PDB secondary structure")]
#[command(long_about = "nmrscrape reads a BMRB search results page, takes the first N entries and writes
shift_data_<id>.csv (Residue, C, CA, CB) and final_data_<id>.csv (plus Secondary_Structure)
for each of them.

EXAMPLES:
    nmrscrape                                   # Default search, 2 entries
    nmrscrape -n 10 -o out/                     # First 10 entries into out/
    nmrscrape --policy seeded --seed 7          # Reproducible structure choice
    nmrscrape --merge union 'https://bmrb.io/search/...'
    nmrscrape completions bash > nmrscrape.bash

CONFIGURATION:
    Settings are read from conf.json by default. If the file does not exist a
    default one is written. Command line options override file settings.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// BMRB search results page to read entry identifiers from
    #[arg(value_name = "SEARCH_URL")]
    search_url: Option<String>,

    /// Number of entries to process
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Directory receiving the CSV files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// How the PDB structure is picked among an entry's cross-references
    #[arg(short, long, value_enum)]
    policy: Option<CliPolicy>,

    /// Seed for the seeded policy (implies --policy seeded)
    #[arg(long)]
    seed: Option<u64>,

    /// How PDB codes from several summary rows are combined
    #[arg(short, long, value_enum)]
    merge: Option<CliMerge>,

    /// Number of entries processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The logger is installed before the config is read, so defer to the global max level
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info by default; the configured level is applied once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "nmrscrape", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?
        .with_progress(!cli.no_progress);
    let summary = controller.run().await?;
    report_summary(&summary);

    Ok(())
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    if !FileManager::file_exists(&cli.config_path) {
        warn!("Config file not found at '{}', creating default config.", cli.config_path);
    }
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(search_url) = &cli.search_url {
        config.search_url = search_url.clone();
    }
    if let Some(count) = cli.count {
        config.entry_count = count;
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(merge) = &cli.merge {
        config.cross_ref_merge = merge.clone().into();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.selection = config.selection.with_overrides(cli.policy.clone().map(PolicyKind::from), cli.seed)?;

    Ok(config)
}

fn report_summary(summary: &RunSummary) {
    if summary.discovery != OutcomeKind::Data {
        warn!("No entries processed: discovery {}", summary.discovery);
        return;
    }

    for entry in &summary.entries {
        info!(
            "BMRB {}: shifts {} ({} rows), cross-references {} ({}), annotation {}{}",
            entry.entry_id,
            entry.shifts,
            entry.shift_rows,
            entry.cross_refs,
            entry.candidates.len(),
            entry.annotation,
            entry.selected.as_ref().map(|p| format!(" with {}", p)).unwrap_or_default()
        );
    }
    info!(
        "Done: {} shift files, {} annotated entries, {}",
        summary.shift_files_count(),
        summary.annotated_count(),
        Controller::format_duration(summary.elapsed)
    );
}
