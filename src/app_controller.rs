use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::observer::{LogObserver, PipelineEvent, PipelineObserver, Stage};
use crate::selection::{selector_for, CandidateSelector};
use crate::sources::{Fetcher, HttpFetcher};
use crate::stages::crossref::{self, PdbId};
use crate::stages::discovery::{self, EntryId};
use crate::stages::{shifts, structure, OutcomeKind, StageOutcome};

// @module: Application controller driving the scraping pipeline

/// What happened to one entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    pub entry_id: EntryId,
    /// Shift extraction outcome
    pub shifts: OutcomeKind,
    /// Rows in the shift table
    pub shift_rows: usize,
    /// Cross-reference discovery outcome
    pub cross_refs: OutcomeKind,
    /// PDB codes found on the summary page
    pub candidates: Vec<PdbId>,
    /// Candidate used for annotation
    pub selected: Option<PdbId>,
    /// Structure annotation outcome
    pub annotation: OutcomeKind,
    /// Files written for this entry
    pub files: Vec<PathBuf>,
}

impl EntryReport {
    fn new(entry_id: EntryId) -> Self {
        Self {
            entry_id,
            shifts: OutcomeKind::Skipped,
            shift_rows: 0,
            cross_refs: OutcomeKind::Skipped,
            candidates: Vec::new(),
            selected: None,
            annotation: OutcomeKind::Skipped,
            files: Vec::new(),
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.annotation == OutcomeKind::Data
    }
}

/// Result of a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Identifier discovery outcome
    pub discovery: OutcomeKind,
    /// Failure message of the discovery stage, if any
    pub discovery_detail: Option<String>,
    /// One report per discovered entry, in identifier order
    pub entries: Vec<EntryReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn annotated_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_annotated()).count()
    }

    pub fn shift_files_count(&self) -> usize {
        self.entries.iter()
            .filter(|e| matches!(e.shifts, OutcomeKind::Data | OutcomeKind::Empty))
            .count()
    }
}

/// Main application controller for the scraping pipeline
pub struct Controller {
    // @field: App configuration
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    selector: Arc<dyn CandidateSelector>,
    observer: Arc<dyn PipelineObserver>,
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller for the live services from a validated configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let fetcher = Arc::new(HttpFetcher::from_config(&config));
        let selector: Arc<dyn CandidateSelector> = Arc::from(selector_for(config.selection));
        Ok(Self::with_parts(config, fetcher, selector, Arc::new(LogObserver)))
    }

    // @method: Create a controller from explicit collaborators
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        selector: Arc<dyn CandidateSelector>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            config,
            fetcher,
            selector,
            observer,
            show_progress: false,
        }
    }

    /// Show a progress bar over entries while running
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline for the configured search page and entry count
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_search(&self.config.search_url, self.config.entry_count).await
    }

    /// Discover up to `count` entries on `search_url` and process each of them
    ///
    /// Per-entry failures are reported in the summary; only an unusable
    /// output directory fails the run.
    pub async fn run_search(&self, search_url: &str, count: usize) -> Result<RunSummary> {
        let start_time = Instant::now();
        FileManager::ensure_dir(&self.config.output_dir)?;

        info!("Searching {} for {} entries", search_url, count);
        let discovered = discovery::discover_entry_ids(self.fetcher.as_ref(), search_url, count).await;
        let discovery_detail = discovered.failure().map(str::to_string);
        let discovery_kind = discovered.kind();
        let ids = discovered.into_data().unwrap_or_default();
        self.observer.on_event(&PipelineEvent::EntriesDiscovered {
            count: ids.len(),
            outcome: discovery_kind,
            detail: discovery_detail.clone(),
        });

        let progress_bar = self.create_progress_bar(ids.len());
        let workers = self.config.workers.max(1);

        let mut entries: Vec<EntryReport> = stream::iter(ids)
            .map(|entry_id| {
                let pb = progress_bar.clone();
                async move {
                    pb.set_message(format!("BMRB {}", entry_id));
                    let report = self.process_entry(entry_id).await;
                    pb.inc(1);
                    report
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;
        progress_bar.finish_and_clear();

        // Concurrent runs complete out of order
        entries.sort_by(|a, b| a.entry_id.cmp(&b.entry_id));

        let summary = RunSummary {
            discovery: discovery_kind,
            discovery_detail,
            entries,
            elapsed: start_time.elapsed(),
        };
        info!(
            "Processed {} entries ({} annotated) in {}",
            summary.entries.len(),
            summary.annotated_count(),
            Self::format_duration(summary.elapsed)
        );
        Ok(summary)
    }

    /// Run shift extraction, cross-reference discovery and, when both yield data, annotation
    pub async fn process_entry(&self, entry_id: EntryId) -> EntryReport {
        let mut report = EntryReport::new(entry_id.clone());
        let output_dir = self.config.output_dir.as_path();
        let endpoints = &self.config.endpoints;

        let shift_outcome = shifts::extract_shifts(self.fetcher.as_ref(), endpoints, &entry_id, output_dir).await;
        self.stage_finished(&entry_id, Stage::Shifts, &shift_outcome);
        report.shifts = shift_outcome.kind();
        report.shift_rows = shift_outcome.data().map(|t| t.len()).unwrap_or(0);
        if matches!(shift_outcome, StageOutcome::Data(_) | StageOutcome::Empty) {
            self.file_written(&mut report, FileManager::shift_data_path(output_dir, entry_id.as_str()));
        }

        let cross_outcome = crossref::discover_pdb_ids(
            self.fetcher.as_ref(),
            endpoints,
            &entry_id,
            self.config.cross_ref_merge,
        ).await;
        self.stage_finished(&entry_id, Stage::CrossRef, &cross_outcome);
        report.cross_refs = cross_outcome.kind();
        report.candidates = cross_outcome.data().cloned().unwrap_or_default();

        let (Some(table), Some(candidates)) = (shift_outcome.data(), cross_outcome.data()) else {
            let reason = match (report.shifts, report.cross_refs) {
                (OutcomeKind::Data, kind) => format!("cross-reference discovery {}", kind),
                (kind, _) => format!("shift extraction {}", kind),
            };
            self.observer.on_event(&PipelineEvent::AnnotationSkipped {
                entry_id: entry_id.to_string(),
                reason,
            });
            return report;
        };

        let Some(pdb_id) = self.selector.select(&entry_id, candidates).cloned() else {
            return report;
        };
        self.observer.on_event(&PipelineEvent::CandidateSelected {
            entry_id: entry_id.to_string(),
            pdb_id: pdb_id.to_string(),
            candidates: candidates.len(),
        });

        let annotation = structure::annotate_entry(
            self.fetcher.as_ref(),
            endpoints,
            &entry_id,
            &pdb_id,
            table,
            output_dir,
        ).await;
        self.stage_finished(&entry_id, Stage::Annotation, &annotation);
        report.annotation = annotation.kind();
        report.selected = Some(pdb_id);
        if matches!(annotation, StageOutcome::Data(_) | StageOutcome::Empty) {
            self.file_written(&mut report, FileManager::final_data_path(output_dir, entry_id.as_str()));
        }

        report
    }

    fn stage_finished<T>(&self, entry_id: &EntryId, stage: Stage, outcome: &StageOutcome<T>) {
        self.observer.on_event(&PipelineEvent::StageFinished {
            entry_id: entry_id.to_string(),
            stage,
            outcome: outcome.kind(),
            detail: outcome.failure().map(str::to_string),
        });
    }

    fn file_written(&self, report: &mut EntryReport, path: PathBuf) {
        self.observer.on_event(&PipelineEvent::FileWritten {
            entry_id: report.entry_id.to_string(),
            path: path.clone(),
        });
        report.files.push(path);
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(total as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }

    // @returns: Human readable duration
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
