/*!
 * Integration tests running the whole pipeline against canned documents
 */

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use nmrscrape::app_config::{CandidatePolicy, Config};
use nmrscrape::app_controller::{Controller, RunSummary};
use nmrscrape::file_utils::FileManager;
use nmrscrape::flat_file::FlatTable;
use nmrscrape::observer::{PipelineEvent, RecordingObserver, Stage};
use nmrscrape::selection::{selector_for, FirstSelector};
use nmrscrape::sources::MockFetcher;
use nmrscrape::stages::OutcomeKind;
use crate::common;

fn controller(config: Config, fetcher: MockFetcher, observer: Arc<RecordingObserver>) -> Controller {
    let selector = Arc::from(selector_for(config.selection));
    Controller::with_parts(config, Arc::new(fetcher), selector, observer)
}

/// Two entries, one structure each, residues spread over helix, sheet and coil
fn two_entry_fetcher(config: &Config) -> MockFetcher {
    let report_a = common::avs_report(&[
        ("4 ALA", Some("176.5"), Some("52.0"), Some("19.2")),
        ("12 LEU", Some("177.8"), Some("57.9"), None),
        ("20 VAL", None, Some("61.1"), Some("33.0")),
    ]);
    let report_b = common::avs_report(&[("1 MET", Some("175.0"), None, None)]);

    let fetcher = MockFetcher::new()
        .with_document(common::SEARCH_URL, common::search_page(&["30010", "4020", "999999"]))
        .with_document(
            config.endpoints.structure_url("1AAA"),
            common::pdb_file(&[common::helix_record(1, 10, 15), common::sheet_record(1, 18, 22)]),
        )
        .with_document(config.endpoints.structure_url("2BBB"), common::pdb_file(&[common::helix_record(1, 1, 3)]));
    let fetcher = common::with_entry(fetcher, config, "4020", &report_a, &common::summary_page(&["1AAA"]));
    common::with_entry(fetcher, config, "30010", &report_b, &common::summary_page(&["2BBB"]))
}

fn read_table(dir: &Path, name: &str) -> Result<FlatTable> {
    FlatTable::read_from(dir.join(name))
}

fn entry<'a>(summary: &'a RunSummary, id: &str) -> &'a nmrscrape::EntryReport {
    summary.entries.iter()
        .find(|e| e.entry_id.as_str() == id)
        .expect("entry should be reported")
}

#[tokio::test]
async fn test_run_withTwoEntries_shouldWriteShiftAndFinalFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 2;
    let observer = Arc::new(RecordingObserver::new());

    let summary = controller(config.clone(), two_entry_fetcher(&config), observer.clone()).run().await?;

    assert_eq!(summary.discovery, OutcomeKind::Data);
    let ids: Vec<&str> = summary.entries.iter().map(|e| e.entry_id.as_str()).collect();
    assert_eq!(ids, vec!["4020", "30010"]);
    assert_eq!(summary.annotated_count(), 2);

    let shifts = read_table(temp_dir.path(), "shift_data_4020.csv")?;
    assert_eq!(shifts.headers, vec!["Residue", "C", "CA", "CB"]);
    assert_eq!(shifts.rows[1], vec!["12 LEU", "177.8", "57.9", "None"]);

    let final_table = read_table(temp_dir.path(), "final_data_4020.csv")?;
    assert_eq!(final_table.headers, vec!["Residue", "C", "CA", "CB", "Secondary_Structure"]);
    let structure: Vec<&str> = final_table.rows.iter().map(|r| r[4].as_str()).collect();
    assert_eq!(structure, vec!["None", "HELIX", "SHEET"]);

    let other = read_table(temp_dir.path(), "final_data_30010.csv")?;
    assert_eq!(other.rows, vec![vec!["1 MET", "175.0", "None", "None", "HELIX"]]);

    assert!(!FileManager::file_exists(temp_dir.path().join("shift_data_999999.csv")));
    assert!(observer.events().contains(&PipelineEvent::EntriesDiscovered {
        count: 2,
        outcome: OutcomeKind::Data,
        detail: None,
    }));
    Ok(())
}

/// A failing entry does not stop or alter the others
#[tokio::test]
async fn test_run_withOneBrokenEntry_shouldStillProcessOthers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 3;
    let observer = Arc::new(RecordingObserver::new());

    // 999999 has no report and no summary page registered
    let summary = controller(config.clone(), two_entry_fetcher(&config), observer.clone()).run().await?;

    let broken = entry(&summary, "999999");
    assert_eq!(broken.shifts, OutcomeKind::Transient);
    assert_eq!(broken.cross_refs, OutcomeKind::Transient);
    assert_eq!(broken.annotation, OutcomeKind::Skipped);
    assert!(broken.files.is_empty());
    assert_eq!(summary.annotated_count(), 2);

    let skipped = observer.events_for("999999").into_iter().any(|e| matches!(e, PipelineEvent::AnnotationSkipped { .. }));
    assert!(skipped);
    Ok(())
}

/// Structure file unreachable: shift file kept, no final file
#[tokio::test]
async fn test_run_withUnreachableStructure_shouldKeepShiftFileOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 1;
    let report = common::avs_report(&[("5 SER", Some("174.0"), None, None)]);
    let fetcher = MockFetcher::new()
        .with_document(common::SEARCH_URL, common::search_page(&["77"]))
        .fail_with(config.endpoints.structure_url("9XYZ"), "timed out");
    let fetcher = common::with_entry(fetcher, &config, "77", &report, &common::summary_page(&["9XYZ"]));

    let summary = controller(config, fetcher, Arc::new(RecordingObserver::new())).run().await?;

    let report = entry(&summary, "77");
    assert_eq!(report.annotation, OutcomeKind::Transient);
    assert_eq!(report.selected.as_ref().map(|p| p.as_str()), Some("9XYZ"));
    assert!(FileManager::file_exists(FileManager::shift_data_path(temp_dir.path(), "77")));
    assert!(!FileManager::file_exists(FileManager::final_data_path(temp_dir.path(), "77")));
    Ok(())
}

/// A residue label without a number aborts only that entry's annotation
#[tokio::test]
async fn test_run_withUnnumberedResidue_shouldReportParseFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 1;
    let report = common::avs_report(&[("3 ALA", Some("1.0"), None, None), ("HETATM", Some("2.0"), None, None)]);
    let fetcher = MockFetcher::new()
        .with_document(common::SEARCH_URL, common::search_page(&["88"]))
        .with_document(config.endpoints.structure_url("1AAA"), common::pdb_file(&[common::helix_record(1, 1, 5)]));
    let fetcher = common::with_entry(fetcher, &config, "88", &report, &common::summary_page(&["1AAA"]));
    let observer = Arc::new(RecordingObserver::new());

    let summary = controller(config, fetcher, observer.clone()).run().await?;

    assert_eq!(entry(&summary, "88").annotation, OutcomeKind::Parse);
    assert!(FileManager::file_exists(FileManager::shift_data_path(temp_dir.path(), "88")));
    assert!(!FileManager::file_exists(FileManager::final_data_path(temp_dir.path(), "88")));

    let failure = observer.events_for("88").into_iter().find_map(|e| match e {
        PipelineEvent::StageFinished { stage: Stage::Annotation, detail, .. } => detail,
        _ => None,
    });
    assert!(failure.unwrap_or_default().contains("HETATM"));
    Ok(())
}

/// No PDB cross-references: annotation is skipped
#[tokio::test]
async fn test_run_withoutCrossReferences_shouldSkipAnnotation() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 1;
    let report = common::avs_report(&[("3 ALA", Some("1.0"), None, None)]);
    let fetcher = MockFetcher::new().with_document(common::SEARCH_URL, common::search_page(&["66"]));
    let fetcher = common::with_entry(fetcher, &config, "66", &report, "<table><tr><td>Title</td><td>x</td></tr></table>");

    let summary = controller(config, fetcher, Arc::new(RecordingObserver::new())).run().await?;

    let report = entry(&summary, "66");
    assert_eq!(report.cross_refs, OutcomeKind::Empty);
    assert_eq!(report.annotation, OutcomeKind::Skipped);
    assert_eq!(report.files, vec![FileManager::shift_data_path(temp_dir.path(), "66")]);
    Ok(())
}

/// Search page unreachable: nothing is processed and nothing is raised
#[tokio::test]
async fn test_run_withUnreachableSearchPage_shouldReturnEmptySummary() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let fetcher = MockFetcher::new().fail_with(common::SEARCH_URL, "no route to host");
    let observer = Arc::new(RecordingObserver::new());

    let summary = controller(config, fetcher, observer.clone()).run().await?;

    let reported = observer.events().into_iter().any(|e| matches!(
        e,
        PipelineEvent::EntriesDiscovered { count: 0, outcome: OutcomeKind::Transient, detail: Some(_) }
    ));
    assert!(reported);

    assert_eq!(summary.discovery, OutcomeKind::Transient);
    assert!(summary.discovery_detail.unwrap_or_default().contains("no route to host"));
    assert!(summary.entries.is_empty());
    Ok(())
}

/// Concurrent processing gives the same per-entry results, in identifier order
#[tokio::test]
async fn test_run_withSeveralWorkers_shouldMatchSequentialResults() -> Result<()> {
    let sequential_dir = common::create_temp_dir()?;
    let concurrent_dir = common::create_temp_dir()?;

    let mut sequential = common::test_config(sequential_dir.path());
    sequential.entry_count = 3;
    let mut concurrent = common::test_config(concurrent_dir.path());
    concurrent.entry_count = 3;
    concurrent.workers = 3;

    let a = controller(sequential.clone(), two_entry_fetcher(&sequential), Arc::new(RecordingObserver::new())).run().await?;
    let b = controller(concurrent.clone(), two_entry_fetcher(&concurrent), Arc::new(RecordingObserver::new())).run().await?;

    let outline = |s: &RunSummary| s.entries.iter()
        .map(|e| (e.entry_id.to_string(), e.shifts, e.cross_refs, e.annotation, e.shift_rows))
        .collect::<Vec<_>>();
    assert_eq!(outline(&a), outline(&b));
    assert_eq!(
        read_table(sequential_dir.path(), "final_data_4020.csv")?,
        read_table(concurrent_dir.path(), "final_data_4020.csv")?
    );
    Ok(())
}

/// The seeded policy picks the same candidate on every run
#[tokio::test]
async fn test_run_withSeededPolicy_shouldSelectSameCandidateEachRun() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 1;
    config.selection = CandidatePolicy::Seeded { seed: 2024 };

    let candidates = ["1AAA", "2BBB", "3CCC", "4DDD", "5EEE"];
    let build = || {
        let mut fetcher = MockFetcher::new().with_document(common::SEARCH_URL, common::search_page(&["4020"]));
        for code in candidates {
            fetcher = fetcher.with_document(config.endpoints.structure_url(code), common::pdb_file(&[common::helix_record(1, 1, 5)]));
        }
        let report = common::avs_report(&[("2 ALA", Some("1.0"), None, None)]);
        common::with_entry(fetcher, &config, "4020", &report, &common::summary_page(&candidates))
    };

    let mut picks = Vec::new();
    for _ in 0..3 {
        let summary = controller(config.clone(), build(), Arc::new(RecordingObserver::new())).run().await?;
        picks.push(summary.entries[0].selected.clone());
    }
    assert!(picks[0].is_some());
    assert!(picks.iter().all(|p| *p == picks[0]));
    Ok(())
}

/// An injected selector overrides the configured policy
#[tokio::test]
async fn test_controller_withInjectedSelector_shouldUseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.entry_count = 1;
    config.selection = CandidatePolicy::Random;
    let report = common::avs_report(&[("2 ALA", Some("1.0"), None, None)]);
    let fetcher = MockFetcher::new()
        .with_document(common::SEARCH_URL, common::search_page(&["5"]))
        .with_document(config.endpoints.structure_url("1AAA"), common::pdb_file(&[]));
    let fetcher = common::with_entry(fetcher, &config, "5", &report, &common::summary_page(&["3CCC", "1AAA"]));
    let observer = Arc::new(RecordingObserver::new());

    let controller = Controller::with_parts(config, Arc::new(fetcher), Arc::new(FirstSelector), observer.clone());
    let summary = controller.run().await?;

    assert_eq!(summary.entries[0].annotation, OutcomeKind::Data);
    assert!(observer.events().contains(&PipelineEvent::CandidateSelected {
        entry_id: "5".to_string(),
        pdb_id: "1AAA".to_string(),
        candidates: 2,
    }));
    Ok(())
}
