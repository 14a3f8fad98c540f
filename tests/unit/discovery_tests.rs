/*!
 * Tests for entry identifier discovery
 */

use nmrscrape::sources::MockFetcher;
use nmrscrape::stages::discovery::{discover_entry_ids, extract_entry_ids, EntryId};
use nmrscrape::stages::{OutcomeKind, StageOutcome};
use crate::common;

fn as_strs(ids: &[EntryId]) -> Vec<&str> {
    ids.iter().map(|id| id.as_str()).collect()
}

/// Enough distinct identifiers: exactly N, ascending, unique
#[test]
fn test_extract_entry_ids_withMoreThanN_shouldReturnFirstNSorted() {
    let page = common::search_page(&["30010", "4020", "5000", "4020", "17", "30010", "999"]);
    let ids = extract_entry_ids(&page, 3);
    assert_eq!(as_strs(&ids), vec!["17", "999", "4020"]);
}

/// Fewer identifiers than requested: all of them, no padding
#[test]
fn test_extract_entry_ids_withFewerThanN_shouldReturnAllWithoutPadding() {
    let page = common::search_page(&["200", "100", "200"]);
    let ids = extract_entry_ids(&page, 10);
    assert_eq!(as_strs(&ids), vec!["100", "200"]);
}

/// N = 0 yields nothing
#[test]
fn test_extract_entry_ids_withZeroCount_shouldBeEmpty() {
    let page = common::search_page(&["1", "2"]);
    assert!(extract_entry_ids(&page, 0).is_empty());
}

/// Only the real href attribute is read, not one merely ending in "href"
#[test]
fn test_extract_entry_ids_withDataHrefAttribute_shouldUseRealHref() {
    let page = r#"<a data-href="/x/summary/index.php?bmrbId=1" href="/data_library/summary/index.php?bmrbId=2">2</a>"#;
    let ids = extract_entry_ids(page, 5);
    assert_eq!(ids, vec![EntryId::parse("2").expect("valid id")]);
}

/// Absolute links and extra query parameters still match
#[test]
fn test_extract_entry_ids_withAbsoluteLinks_shouldExtractId() {
    let page = r#"<a href="https://bmrb.io/data_library/summary/index.php?bmrbId=6457&amp;tab=main">x</a>"#;
    let ids = extract_entry_ids(page, 5);
    assert_eq!(as_strs(&ids), vec!["6457"]);
}

#[tokio::test]
async fn test_discover_entry_ids_withUnreachablePage_shouldReportTransient() {
    let fetcher = MockFetcher::new().fail_with(common::SEARCH_URL, "dns failure");
    let outcome = discover_entry_ids(&fetcher, common::SEARCH_URL, 2).await;
    assert_eq!(outcome.kind(), OutcomeKind::Transient);
}

#[tokio::test]
async fn test_discover_entry_ids_withNoLinks_shouldReportEmpty() {
    let fetcher = MockFetcher::new().with_document(common::SEARCH_URL, "<html><body>No results</body></html>");
    let outcome = discover_entry_ids(&fetcher, common::SEARCH_URL, 2).await;
    assert_eq!(outcome, StageOutcome::Empty);
}
