//! Integration tests for the three consolidation tiers
//!
//! These tests verify that:
//! - Page-numbered exports combine in ascending page order
//! - Timestamped exports combine most recent first
//! - Empty or unreadable inputs never produce or break an output
//! - Re-running consolidation is byte-for-byte stable

mod common;

use common::data_lines;
use harvest::core::consolidate::{combine_pages, consolidate_global, consolidate_state};
use harvest::core::layout::{sanitize, Layout};
use harvest::domain::{BusinessType, Query, StateName};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use test_case::test_case;

fn state(s: &str) -> StateName {
    StateName::new(s).unwrap()
}

fn filtered(s: &str, bt: &str) -> Query {
    Query::filtered(state(s), BusinessType::new(bt).unwrap())
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test_case("Andaman & Nicobar" ; "ampersand")]
#[test_case("Manufacturing (Paper & Paper products, Publishing, printing and reproduction of recorded media)" ; "punctuation")]
#[test_case("NCT of Delhi" ; "spaces")]
#[test_case("Transport, storage and Communications" ; "comma")]
fn test_sanitize_is_idempotent(label: &str) {
    let once = sanitize(label);
    assert_eq!(sanitize(&once), once);
    assert!(once.chars().all(|c| c.is_alphanumeric() || c == '_'));
}

#[test]
fn test_pages_combine_in_page_order() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");
    let dir = tmp.path().join("Gujarat_Trading");

    for page in [3, 1, 2] {
        write(
            &dir.join(format!("Gujarat_Trading_page_{page}.csv")),
            &format!("company\np{page}\n"),
        );
    }

    let dataset = combine_pages(&layout, &query).unwrap().unwrap();
    assert_eq!(dataset.rows, 3);
    assert_eq!(data_lines(&dataset.path), vec!["p1", "p2", "p3"]);
    let numbers: Vec<u32> = dataset.sources.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_page_ten_sorts_after_page_two() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");
    let dir = tmp.path().join("Gujarat_Trading");

    for page in [10, 2, 1] {
        write(
            &dir.join(format!("Gujarat_Trading_page_{page}.csv")),
            &format!("company\np{page}\n"),
        );
    }

    let dataset = combine_pages(&layout, &query).unwrap().unwrap();
    assert_eq!(data_lines(&dataset.path), vec!["p1", "p2", "p10"]);
}

#[test]
fn test_timestamped_pages_combine_most_recent_first() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = Query::unfiltered(state("Goa"));
    let dir = tmp.path().join("Goa");

    write(&dir.join("Goa_20240309101500.csv"), "company\nfirst\n");
    write(&dir.join("Goa_20240309101700.csv"), "company\nthird\n");
    write(&dir.join("Goa_20240309101600.csv"), "company\nsecond\n");
    write(&dir.join("Goa_20240309101700_1.csv"), "company\nfourth\n");

    let dataset = combine_pages(&layout, &query).unwrap().unwrap();
    assert_eq!(
        data_lines(&dataset.path),
        vec!["fourth", "third", "second", "first"]
    );
    // capture rank: oldest is page 1
    let numbers: Vec<u32> = dataset.sources.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![4, 3, 2, 1]);
}

#[test]
fn test_combine_without_pages_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");

    assert!(combine_pages(&layout, &query).unwrap().is_none());
    assert!(!layout.combined_path(&query).exists());

    fs::create_dir_all(layout.query_dir(&query)).unwrap();
    assert!(combine_pages(&layout, &query).unwrap().is_none());
    assert!(!layout.combined_path(&query).exists());
}

#[test]
fn test_combine_header_only_pages_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");
    write(
        &tmp.path().join("Gujarat_Trading/Gujarat_Trading_page_1.csv"),
        "company,city\n",
    );

    assert!(combine_pages(&layout, &query).unwrap().is_none());
    assert!(!layout.combined_path(&query).exists());
}

#[test]
fn test_combine_ignores_its_own_output() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");
    write(
        &tmp.path().join("Gujarat_Trading/Gujarat_Trading_page_1.csv"),
        "company\na\n",
    );

    combine_pages(&layout, &query).unwrap().unwrap();
    let second = combine_pages(&layout, &query).unwrap().unwrap();
    assert_eq!(second.rows, 1);
    assert_eq!(data_lines(&second.path), vec!["a"]);
}

#[test]
fn test_combine_relocates_stray_pages() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");
    write(
        &tmp.path().join("Gujarat_Trading/Gujarat_Trading_page_1.csv"),
        "company\na\n",
    );
    write(&tmp.path().join("Gujarat_Trading_page_2.csv"), "company\nb\n");

    let dataset = combine_pages(&layout, &query).unwrap().unwrap();
    assert_eq!(data_lines(&dataset.path), vec!["a", "b"]);
    assert!(!tmp.path().join("Gujarat_Trading_page_2.csv").exists());
}

#[test]
fn test_columns_are_unioned_by_name() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let query = filtered("Gujarat", "Trading");
    let dir = tmp.path().join("Gujarat_Trading");
    write(&dir.join("Gujarat_Trading_page_1.csv"), "company,city\na,Surat\n");
    write(&dir.join("Gujarat_Trading_page_2.csv"), "city,pin\nRajkot,360001\n");

    let dataset = combine_pages(&layout, &query).unwrap().unwrap();
    assert_eq!(
        fs::read_to_string(&dataset.path).unwrap(),
        "company,city,pin\na,Surat,\n,Rajkot,360001\n"
    );
}

#[test]
fn test_raw_pages_do_not_feed_state_consolidation() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let gujarat = state("Gujarat");
    write(
        &tmp.path().join("Gujarat_Trading/Gujarat_Trading_page_1.csv"),
        "company\na\n",
    );

    assert!(consolidate_state(&layout, &gujarat).unwrap().is_none());
    assert!(!layout.consolidated_path(&gujarat).exists());
}

#[test]
fn test_state_consolidation_is_stable() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let gujarat = state("Gujarat");
    write(
        &tmp.path().join("Gujarat_Trading/Gujarat_Trading_combined.csv"),
        "company,city\na,Surat\nb,Rajkot\n",
    );
    write(
        &tmp.path().join("Gujarat_Finance/Gujarat_Finance_combined.csv"),
        "company,city\nc,Vadodara\n",
    );

    let first = consolidate_state(&layout, &gujarat).unwrap().unwrap();
    let first_bytes = fs::read(&first.path).unwrap();
    let second = consolidate_state(&layout, &gujarat).unwrap().unwrap();
    let second_bytes = fs::read(&second.path).unwrap();

    assert_eq!(first.rows, 3);
    assert_eq!(first_bytes, second_bytes);
    // directories are visited in name order
    assert_eq!(data_lines(&first.path), vec!["c,Vadodara", "a,Surat", "b,Rajkot"]);
}

#[test]
fn test_corrupt_combined_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let gujarat = state("Gujarat");

    let business_types = ["Construction", "Finance", "Insurance", "Mining", "Trading"];
    for bt in business_types {
        let path = tmp
            .path()
            .join(format!("Gujarat_{bt}/Gujarat_{bt}_combined.csv"));
        if bt == "Insurance" {
            write(&path, "");
        } else {
            write(&path, &format!("company\n{bt}-1\n{bt}-2\n"));
        }
    }

    let dataset = consolidate_state(&layout, &gujarat).unwrap().unwrap();
    assert_eq!(dataset.rows, 8);
    assert_eq!(dataset.sources.len(), 4);
    assert!(!data_lines(&dataset.path)
        .iter()
        .any(|l| l.starts_with("Insurance")));
}

#[test]
fn test_global_merge_follows_state_order() {
    let tmp = TempDir::new().unwrap();
    let layout = Layout::new(tmp.path());
    let gujarat = state("Gujarat");
    let goa = state("Goa");
    let kerala = state("Kerala");

    write(&layout.consolidated_path(&gujarat), "company\ng1\ng2\n");
    write(
        &layout.combined_path(&Query::unfiltered(goa.clone())),
        "company\ngoa1\n",
    );

    let dataset = consolidate_global(&layout, &[gujarat], &[kerala, goa], "all_states.csv")
        .unwrap()
        .unwrap();
    assert_eq!(dataset.rows, 3);
    assert_eq!(dataset.sources.len(), 2);
    assert_eq!(data_lines(&dataset.path), vec!["g1", "g2", "goa1"]);
}
