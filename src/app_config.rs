use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

/// Placeholder substituted with the BMRB entry identifier in entry URLs
pub const ENTRY_PLACEHOLDER: &str = "{id}";

/// Placeholder substituted with the lowercase PDB code in the structure URL
pub const PDB_PLACEHOLDER: &str = "{pdb}";

/// Application configuration module
/// This module handles loading, validating and saving the scraper settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Search results page listing BMRB entries
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Number of entries to process from the search page
    #[serde(default = "default_entry_count")]
    pub entry_count: usize,

    /// Per-entry document endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Directory receiving the CSV files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// How one PDB candidate is picked per entry
    #[serde(default)]
    pub selection: CandidatePolicy,

    /// How identifiers from several matching summary rows are combined
    #[serde(default)]
    pub cross_ref_merge: CrossRefMerge,

    /// Number of entries processed at the same time
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// URL templates for the three per-entry documents
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Chemical shift validation report, `{id}` is the entry identifier
    #[serde(default = "default_shift_report_url")]
    pub shift_report: String,

    /// Entry summary page, `{id}` is the entry identifier
    #[serde(default = "default_summary_url")]
    pub summary: String,

    /// PDB flat file, `{pdb}` is the lowercase PDB code
    #[serde(default = "default_structure_url")]
    pub structure: String,
}

impl EndpointConfig {
    // @returns: Shift report URL for an entry
    pub fn shift_report_url(&self, entry_id: &str) -> String {
        self.shift_report.replace(ENTRY_PLACEHOLDER, entry_id)
    }

    // @returns: Summary page URL for an entry
    pub fn summary_url(&self, entry_id: &str) -> String {
        self.summary.replace(ENTRY_PLACEHOLDER, entry_id)
    }

    // @returns: Structure file URL for a PDB code
    pub fn structure_url(&self, pdb_id: &str) -> String {
        self.structure.replace(PDB_PLACEHOLDER, &pdb_id.to_lowercase())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            shift_report: default_shift_report_url(),
            summary: default_summary_url(),
            structure: default_structure_url(),
        }
    }
}

/// Strategy used to pick one cross-referenced structure per entry
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CandidatePolicy {
    /// Uniform draw from the thread RNG; results vary between runs
    #[default]
    Random,
    /// Uniform draw from an RNG seeded per entry; reproducible
    Seeded {
        /// Base seed, combined with the entry number
        seed: u64,
    },
    /// Always the first candidate in sorted order
    First,
}

impl std::fmt::Display for CandidatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Seeded { seed } => write!(f, "seeded({})", seed),
            Self::First => write!(f, "first"),
        }
    }
}

/// Policy family named on the command line, without its parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyKind {
    Random,
    First,
    Seeded,
}

impl CandidatePolicy {
    /// Apply a command line policy name and seed on top of this policy
    ///
    /// A seed alone selects the seeded policy. `Seeded` without a seed keeps
    /// the seed of an already seeded policy.
    pub fn with_overrides(self, kind: Option<PolicyKind>, seed: Option<u64>) -> Result<Self> {
        match (kind, seed) {
            (None, None) => Ok(self),
            (Some(PolicyKind::Random), None) => Ok(Self::Random),
            (Some(PolicyKind::First), None) => Ok(Self::First),
            (Some(PolicyKind::Seeded) | None, Some(seed)) => Ok(Self::Seeded { seed }),
            (Some(PolicyKind::Seeded), None) => match self {
                seeded @ Self::Seeded { .. } => Ok(seeded),
                _ => Err(anyhow!("--policy seeded needs --seed or a seeded policy in the config file")),
            },
            (Some(_), Some(_)) => Err(anyhow!("--seed can only be combined with --policy seeded")),
        }
    }
}

/// How PDB codes from several summary rows mentioning PDB are combined
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CrossRefMerge {
    /// Only the last matching row's codes are kept
    #[default]
    LastRowWins,
    /// Codes from every matching row are accumulated
    Union,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_search_url() -> String {
    "https://bmrb.io/search/query_grid/?data_types%5B%5D=carbon_shifts&polymers%5B%5D=polypeptide%28L%29&polymer_join_type=OR".to_string()
}

fn default_entry_count() -> usize {
    2
}

fn default_shift_report_url() -> String {
    "https://bmrb.io/ftp/pub/bmrb/entry_directories/bmr{id}/validation/AVS_full.txt".to_string()
}

fn default_summary_url() -> String {
    "https://bmrb.io/data_library/summary/index.php?bmrbId={id}".to_string()
}

fn default_structure_url() -> String {
    "https://www.ebi.ac.uk/pdbe/entry-files/pdb{pdb}.ent".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_workers() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("nmrscrape/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load a configuration file, or write a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.search_url)
            .map_err(|e| anyhow!("Invalid search URL '{}': {}", self.search_url, e))?;

        let templates = [
            ("shift_report", &self.endpoints.shift_report, ENTRY_PLACEHOLDER),
            ("summary", &self.endpoints.summary, ENTRY_PLACEHOLDER),
            ("structure", &self.endpoints.structure, PDB_PLACEHOLDER),
        ];
        for (name, template, placeholder) in templates {
            if !template.contains(placeholder) {
                return Err(anyhow!("Endpoint '{}' must contain the {} placeholder", name, placeholder));
            }
            Url::parse(&template.replace(placeholder, "0"))
                .map_err(|e| anyhow!("Invalid {} endpoint '{}': {}", name, template, e))?;
        }

        if self.workers == 0 {
            return Err(anyhow!("workers must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            search_url: default_search_url(),
            entry_count: default_entry_count(),
            endpoints: EndpointConfig::default(),
            output_dir: default_output_dir(),
            selection: CandidatePolicy::default(),
            cross_ref_merge: CrossRefMerge::default(),
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            log_level: LogLevel::default(),
        }
    }
}
