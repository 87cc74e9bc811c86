//! End-to-end tests for a harvest run against a scripted portal
//!
//! These tests verify that:
//! - Every enumerated query is submitted once, exclusions never are
//! - Each tier's dataset holds exactly the rows of its inputs, in order
//! - A failing query does not stop the run
//! - Run-wide failures are returned as errors after the browser is closed

mod common;

use common::{companies, context, page_companies, FakePortal};
use harvest::config::{ConsolidationConfig, Exclusion, QueryConfig};
use harvest::core::checkpoint::NoSignal;
use harvest::core::layout::Layout;
use harvest::core::run::{rebuild_datasets, DatasetTier, QueryOutcome, RunCoordinator};
use harvest::domain::{BusinessType, Query, StateName};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

fn state(s: &str) -> StateName {
    StateName::new(s).unwrap()
}

fn bt(s: &str) -> BusinessType {
    BusinessType::new(s).unwrap()
}

fn plan() -> QueryConfig {
    QueryConfig {
        filtered_states: vec![state("Gujarat")],
        unfiltered_states: vec![state("Goa")],
        business_types: vec![bt("Trading")],
        exclusions: Vec::new(),
    }
}

fn coordinator(
    tmp: &TempDir,
    portal: Arc<FakePortal>,
    queries: QueryConfig,
    shutdown: watch::Receiver<bool>,
) -> RunCoordinator {
    RunCoordinator::new(
        context(tmp.path(), portal),
        queries,
        ConsolidationConfig::default(),
        Box::new(NoSignal),
        shutdown,
    )
}

#[tokio::test]
async fn test_run_builds_every_tier() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(
        FakePortal::new(tmp.path())
            .with_pages("Goa", None, 3)
            .with_pages("Gujarat", Some("Trading"), 2),
    );
    let (_tx, rx) = watch::channel(false);

    let summary = coordinator(&tmp, portal.clone(), plan(), rx)
        .execute()
        .await
        .unwrap();

    assert!(summary.is_successful());
    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.total_pages(), 5);
    assert_eq!(portal.exports(), 5);
    assert_eq!(portal.shutdowns(), 1);

    let layout = Layout::new(tmp.path());

    // unfiltered: most recent page first
    let goa = layout.combined_path(&Query::unfiltered(state("Goa")));
    let expected: Vec<String> = [3, 2, 1]
        .into_iter()
        .flat_map(|p| page_companies("Goa", p))
        .collect();
    assert_eq!(companies(&goa), expected);

    // filtered: page order
    let trading = layout.combined_path(&Query::filtered(state("Gujarat"), bt("Trading")));
    let expected: Vec<String> = [1, 2]
        .into_iter()
        .flat_map(|p| page_companies("Gujarat/Trading", p))
        .collect();
    assert_eq!(companies(&trading), expected);

    // the state dataset holds exactly the filtered rows
    let consolidated = layout.consolidated_path(&state("Gujarat"));
    assert_eq!(companies(&consolidated), expected);

    // run-wide: filtered states first, then unfiltered
    let global = layout.global_path(&ConsolidationConfig::default().global_filename);
    assert_eq!(companies(&global).len(), 10);
    assert_eq!(companies(&global)[..4], expected[..]);

    assert_eq!(summary.datasets_of(DatasetTier::Combined).count(), 2);
    assert_eq!(summary.datasets_of(DatasetTier::Consolidated).count(), 1);
    assert_eq!(summary.datasets_of(DatasetTier::Global).count(), 1);
    assert!(summary.datasets.iter().all(|d| d.sha256.len() == 64));
}

#[tokio::test]
async fn test_excluded_query_is_never_submitted() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()));
    let queries = QueryConfig {
        filtered_states: vec![state("Maharashtra")],
        unfiltered_states: Vec::new(),
        business_types: vec![bt("Business Services"), bt("Trading")],
        exclusions: vec![Exclusion {
            state: state("Maharashtra"),
            business_type: bt("Business Services"),
        }],
    };
    let (_tx, rx) = watch::channel(false);

    let summary = coordinator(&tmp, portal.clone(), queries, rx)
        .execute()
        .await
        .unwrap();

    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.completed(), 1);
    assert_eq!(
        portal.submitted(),
        vec![("Maharashtra".to_string(), Some("Trading".to_string()))]
    );
    assert!(!tmp.path().join("Maharashtra_Business_Services").exists());
}

#[tokio::test]
async fn test_failed_query_does_not_stop_the_run() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).without_option("Goa"));
    let mut queries = plan();
    queries.unfiltered_states.push(state("Kerala"));
    let (_tx, rx) = watch::channel(false);

    let summary = coordinator(&tmp, portal.clone(), queries, rx)
        .execute()
        .await
        .unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.completed(), 2);
    assert!(!summary.is_successful());

    let failed = summary
        .queries
        .iter()
        .find(|r| matches!(r.outcome, QueryOutcome::Failed { .. }))
        .unwrap();
    assert_eq!(failed.query, Query::unfiltered(state("Goa")));

    let layout = Layout::new(tmp.path());
    assert!(!layout
        .combined_path(&Query::unfiltered(state("Goa")))
        .exists());
    assert!(layout
        .combined_path(&Query::unfiltered(state("Kerala")))
        .exists());
}

#[tokio::test]
async fn test_unreachable_portal_is_a_run_error() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).unreachable());
    let (_tx, rx) = watch::channel(false);

    let result = coordinator(&tmp, portal.clone(), plan(), rx).execute().await;

    assert!(result.is_err());
    assert_eq!(portal.exports(), 0);
    assert_eq!(portal.shutdowns(), 1);
}

#[tokio::test]
async fn test_rebuild_matches_the_run() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).with_pages("Gujarat", Some("Trading"), 2));
    let (_tx, rx) = watch::channel(false);

    coordinator(&tmp, portal, plan(), rx)
        .execute()
        .await
        .unwrap();

    let layout = Layout::new(tmp.path());
    let consolidated = layout.consolidated_path(&state("Gujarat"));
    let before = std::fs::read(&consolidated).unwrap();

    let summary = rebuild_datasets(&layout, &plan(), &ConsolidationConfig::default());
    assert!(summary.errors.is_empty());
    assert_eq!(summary.datasets.len(), 4);
    assert_eq!(std::fs::read(&consolidated).unwrap(), before);
}
