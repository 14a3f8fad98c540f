/*!
 * Cross-reference candidate selection.
 *
 * Only one PDB structure is read per entry. Which one is decided by a
 * `CandidateSelector`; the configured `CandidatePolicy` picks the
 * implementation, and tests can inject their own.
 */

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::fmt::Debug;

use crate::app_config::CandidatePolicy;
use crate::stages::crossref::PdbId;
use crate::stages::discovery::EntryId;

/// Picks one structure candidate for an entry
pub trait CandidateSelector: Send + Sync + Debug {
    /// Choose from a non-empty, sorted candidate list; `None` only when it is empty
    fn select<'a>(&self, entry_id: &EntryId, candidates: &'a [PdbId]) -> Option<&'a PdbId>;
}

/// Uniform draw from the thread-local RNG
#[derive(Debug, Default)]
pub struct RandomSelector;

impl CandidateSelector for RandomSelector {
    fn select<'a>(&self, _entry_id: &EntryId, candidates: &'a [PdbId]) -> Option<&'a PdbId> {
        candidates.choose(&mut rand::rng())
    }
}

/// Uniform draw from an RNG seeded with the base seed and the entry number
///
/// The draw for an entry does not depend on which other entries ran or in
/// what order.
#[derive(Debug)]
pub struct SeededSelector {
    seed: u64,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn entry_seed(&self, entry_id: &EntryId) -> u64 {
        entry_id.as_str()
            .bytes()
            .fold(self.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b - b'0')))
    }
}

impl CandidateSelector for SeededSelector {
    fn select<'a>(&self, entry_id: &EntryId, candidates: &'a [PdbId]) -> Option<&'a PdbId> {
        let mut rng = StdRng::seed_from_u64(self.entry_seed(entry_id));
        candidates.choose(&mut rng)
    }
}

/// Always the first candidate
#[derive(Debug, Default)]
pub struct FirstSelector;

impl CandidateSelector for FirstSelector {
    fn select<'a>(&self, _entry_id: &EntryId, candidates: &'a [PdbId]) -> Option<&'a PdbId> {
        candidates.first()
    }
}

/// Build the selector for a configured policy
pub fn selector_for(policy: CandidatePolicy) -> Box<dyn CandidateSelector> {
    match policy {
        CandidatePolicy::Random => Box::new(RandomSelector),
        CandidatePolicy::Seeded { seed } => Box::new(SeededSelector::new(seed)),
        CandidatePolicy::First => Box::new(FirstSelector),
    }
}
