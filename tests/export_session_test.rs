//! Integration tests for the per-query export session
//!
//! These tests verify that:
//! - Pagination stops cleanly when the next-page control never shows up
//! - Every captured page is renamed into the query directory
//! - Setup failures never reach the results pages

mod common;

use common::{context, page_companies, FakePortal, RAW_FILENAME};
use harvest::core::session::{ExportSession, SessionState, Termination};
use harvest::domain::{BusinessType, Query, StateName};
use std::sync::Arc;
use tempfile::TempDir;

fn trading() -> Query {
    Query::filtered(
        StateName::new("Gujarat").unwrap(),
        BusinessType::new("Trading").unwrap(),
    )
}

#[tokio::test]
async fn test_single_page_exports_exactly_once() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()));
    let ctx = context(tmp.path(), portal.clone());

    let report = ExportSession::new(&ctx, trading()).run().await;

    assert_eq!(report.termination, Termination::NoNextPage);
    assert_eq!(report.exports, 1);
    assert_eq!(portal.exports(), 1);
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].page_number, 1);
    assert!(tmp
        .path()
        .join("Gujarat_Trading/Gujarat_Trading_page_1.csv")
        .exists());
    assert!(!tmp.path().join(RAW_FILENAME).exists());
}

#[tokio::test]
async fn test_filtered_pages_are_numbered_in_order() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).with_pages("Gujarat", Some("Trading"), 3));
    let ctx = context(tmp.path(), portal.clone());

    let report = ExportSession::new(&ctx, trading()).run().await;

    assert_eq!(report.termination, Termination::NoNextPage);
    assert_eq!(portal.exports(), 3);
    let numbers: Vec<u32> = report.artifacts.iter().map(|a| a.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    for page in 1..=3 {
        let path = tmp
            .path()
            .join(format!("Gujarat_Trading/Gujarat_Trading_page_{page}.csv"));
        assert_eq!(
            common::companies(&path),
            page_companies("Gujarat/Trading", page)
        );
    }
    assert_eq!(
        portal.submitted(),
        vec![("Gujarat".to_string(), Some("Trading".to_string()))]
    );
}

#[tokio::test]
async fn test_unfiltered_pages_are_timestamped() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).with_pages("Goa", None, 2));
    let ctx = context(tmp.path(), portal.clone());

    let report = ExportSession::new(&ctx, Query::unfiltered(StateName::new("Goa").unwrap()))
        .run()
        .await;

    assert_eq!(report.artifacts.len(), 2);
    assert!(report.artifacts.iter().all(|a| a.captured_at.is_some()));
    let names: Vec<String> = std::fs::read_dir(tmp.path().join("Goa"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.starts_with("Goa_2") && n.ends_with(".csv")));
    assert_eq!(portal.submitted(), vec![("Goa".to_string(), None)]);
}

#[tokio::test]
async fn test_missing_option_fails_setup() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).without_option("Trading"));
    let ctx = context(tmp.path(), portal.clone());

    let report = ExportSession::new(&ctx, trading()).run().await;

    assert!(matches!(report.termination, Termination::SetupFailed(_)));
    assert!(report.termination.is_failure());
    assert!(report.artifacts.is_empty());
    assert_eq!(portal.exports(), 0);
    assert!(portal.submitted().is_empty());
}

#[tokio::test]
async fn test_leftover_raw_export_is_moved_aside() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(RAW_FILENAME), "company\nstale\n").unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()));
    let ctx = context(tmp.path(), portal);

    let report = ExportSession::new(&ctx, trading()).run().await;

    assert_eq!(report.artifacts.len(), 1);
    let page = tmp
        .path()
        .join("Gujarat_Trading/Gujarat_Trading_page_1.csv");
    assert_eq!(
        common::companies(&page),
        page_companies("Gujarat/Trading", 1)
    );
    let orphans = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".orphan")
        })
        .count();
    assert_eq!(orphans, 1);
}

#[tokio::test]
async fn test_new_session_starts_in_setup() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()));
    let ctx = context(tmp.path(), portal);

    let session = ExportSession::new(&ctx, trading());
    assert_eq!(session.state(), &SessionState::Setup);
    assert_eq!(session.page_number(), 1);
    assert!(session.next_control().is_none());
}

#[tokio::test]
async fn test_overlay_is_dismissed_and_intercepted_clicks_are_forced() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(
        FakePortal::new(tmp.path())
            .with_pages("Gujarat", Some("Trading"), 3)
            .with_overlay()
            .intercept_next_page_clicks(),
    );
    let ctx = context(tmp.path(), portal.clone());

    let report = ExportSession::new(&ctx, trading()).run().await;

    assert_eq!(report.termination, Termination::NoNextPage);
    let numbers: Vec<u32> = report.artifacts.iter().map(|a| a.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    // one overlay and one forced click per page turn
    assert_eq!(portal.overlay_clicks(), 2);
    assert_eq!(portal.forced_clicks(), 2);
}

#[tokio::test]
async fn test_missing_overlay_does_not_block_pagination() {
    let tmp = TempDir::new().unwrap();
    let portal = Arc::new(FakePortal::new(tmp.path()).with_pages("Gujarat", Some("Trading"), 2));
    let ctx = context(tmp.path(), portal.clone());

    let report = ExportSession::new(&ctx, trading()).run().await;

    assert_eq!(report.artifacts.len(), 2);
    assert_eq!(portal.overlay_clicks(), 0);
    assert_eq!(portal.forced_clicks(), 0);
}
