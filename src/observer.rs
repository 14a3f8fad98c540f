/*!
 * Run observation.
 *
 * The controller reports what happens during a run as typed events to an
 * injected `PipelineObserver`. `LogObserver` forwards them to the `log`
 * facade; `RecordingObserver` keeps them in memory for inspection.
 */

use log::{error, info, warn};
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::stages::OutcomeKind;

/// Pipeline stage names used in events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Shifts,
    CrossRef,
    Annotation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Shifts => "shift extraction",
            Self::CrossRef => "cross-reference discovery",
            Self::Annotation => "structure annotation",
        };
        write!(f, "{}", name)
    }
}

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Identifier discovery finished
    EntriesDiscovered {
        count: usize,
        outcome: OutcomeKind,
        detail: Option<String>,
    },
    /// A stage finished for an entry
    StageFinished {
        entry_id: String,
        stage: Stage,
        outcome: OutcomeKind,
        detail: Option<String>,
    },
    /// A structure candidate was chosen for annotation
    CandidateSelected {
        entry_id: String,
        pdb_id: String,
        candidates: usize,
    },
    /// An output file was written
    FileWritten { entry_id: String, path: PathBuf },
    /// Annotation was not attempted for an entry
    AnnotationSkipped { entry_id: String, reason: String },
}

/// Receives pipeline events
pub trait PipelineObserver: Send + Sync + Debug {
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer writing events to the log facade
#[derive(Debug, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::EntriesDiscovered { count, outcome, detail } => match outcome {
                OutcomeKind::Transient | OutcomeKind::Parse => error!(
                    "Entry discovery failed ({}): {}",
                    outcome, detail.as_deref().unwrap_or("no detail")
                ),
                _ => info!("Discovered {} entries", count),
            },
            PipelineEvent::StageFinished { entry_id, stage, outcome, detail } => match outcome {
                OutcomeKind::Transient | OutcomeKind::Parse => error!(
                    "Entry {}: {} failed ({}): {}",
                    entry_id, stage, outcome, detail.as_deref().unwrap_or("no detail")
                ),
                OutcomeKind::Empty => warn!("Entry {}: {} produced no data", entry_id, stage),
                _ => info!("Entry {}: {} {}", entry_id, stage, outcome),
            },
            PipelineEvent::CandidateSelected { entry_id, pdb_id, candidates } => {
                info!("Entry {}: selected PDB ID {} out of {}", entry_id, pdb_id, candidates)
            }
            PipelineEvent::FileWritten { entry_id, path } => info!("Entry {}: wrote {:?}", entry_id, path),
            PipelineEvent::AnnotationSkipped { entry_id, reason } => {
                warn!("Entry {}: annotation skipped, {}", entry_id, reason)
            }
        }
    }
}

/// Observer storing every event, in arrival order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events concerning one entry
    pub fn events_for(&self, entry_id: &str) -> Vec<PipelineEvent> {
        self.events()
            .into_iter()
            .filter(|event| match event {
                PipelineEvent::EntriesDiscovered { .. } => false,
                PipelineEvent::StageFinished { entry_id: id, .. }
                | PipelineEvent::CandidateSelected { entry_id: id, .. }
                | PipelineEvent::FileWritten { entry_id: id, .. }
                | PipelineEvent::AnnotationSkipped { entry_id: id, .. } => id == entry_id,
            })
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

impl<T: PipelineObserver + ?Sized> PipelineObserver for std::sync::Arc<T> {
    fn on_event(&self, event: &PipelineEvent) {
        (**self).on_event(event)
    }
}
