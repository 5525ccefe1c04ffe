//! MemTable Tests
//!
//! Tests verify:
//! - Row reads by selection (all, ids, range) and first-N reads
//! - Removal-then-upsert writes and empty-row deletion
//! - Row stamps
//! - Ordered key paging
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use colkv::memtable::MemTable;
use colkv::table::Selection;
use colkv::{Columns, Range};

// =============================================================================
// Helper Functions
// =============================================================================

fn blob(value: &str) -> Bytes {
    Bytes::copy_from_slice(value.as_bytes())
}

fn put(memtable: &MemTable, key: i64, ids: &[i64]) {
    let stamp = memtable.next_timestamp();
    let upsert = ids.iter().map(|id| (*id, blob(&format!("v{}", id))));
    memtable.set(key, upsert, &Selection::none(), stamp);
}

fn read(memtable: &MemTable, key: i64, selection: &Selection) -> Vec<i64> {
    let mut out = Columns::new(false);
    memtable.read(key, selection, &mut out);
    out.columns(true)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.row_count(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_set_and_read_all() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[3, 1, 2]);

    assert_eq!(memtable.row_count(), 1);
    assert_eq!(memtable.columns_count(1), 3);
    assert_eq!(memtable.column_ids(1), vec![1, 2, 3]);
    assert_eq!(read(&memtable, 1, &Selection::All), vec![1, 2, 3]);
}

#[test]
fn test_read_missing_row() {
    let memtable = MemTable::new();
    assert!(read(&memtable, 42, &Selection::All).is_empty());
    assert_eq!(memtable.columns_count(42), 0);
    assert!(memtable.column_ids(42).is_empty());
}

#[test]
fn test_read_ids_skips_missing() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 2, 3]);
    assert_eq!(
        read(&memtable, 1, &Selection::Ids(vec![3, 9, 1, 1])),
        vec![1, 3]
    );
}

#[test]
fn test_read_range() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 5, 10, 15]);
    assert_eq!(
        read(&memtable, 1, &Selection::Range(Range::new(5, 10))),
        vec![5, 10]
    );
    assert!(read(&memtable, 1, &Selection::Range(Range::new(10, 5))).is_empty());
}

#[test]
fn test_read_first_both_directions() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 2, 3, 4, 5]);

    let mut out = Columns::new(false);
    memtable.read_first(1, 2, false, &mut out);
    assert_eq!(out.columns(true), vec![1, 2]);

    let mut out = Columns::new(true);
    memtable.read_first(1, 2, true, &mut out);
    assert_eq!(out.columns(true), vec![5, 4]);
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_set_overwrites_columns() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1]);
    memtable.set(
        1,
        [(1, blob("new"))],
        &Selection::none(),
        memtable.next_timestamp(),
    );

    let mut out = Columns::new(false);
    memtable.read(1, &Selection::All, &mut out);
    assert_eq!(out.get_bytes(1).unwrap().as_ref(), b"new");
}

#[test]
fn test_set_removes_before_upserting() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 2, 3]);

    // Column 2 is both removed and upserted; the upsert wins
    memtable.set(
        1,
        [(2, blob("kept"))],
        &Selection::Range(Range::new(1, 3)),
        memtable.next_timestamp(),
    );

    assert_eq!(memtable.column_ids(1), vec![2]);
}

#[test]
fn test_remove_selection() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 2, 3]);

    assert!(memtable.remove(1, &Selection::Ids(vec![2]), memtable.next_timestamp()));
    assert_eq!(memtable.column_ids(1), vec![1, 3]);
    assert!(!memtable.remove(1, &Selection::Ids(vec![2]), memtable.next_timestamp()));
}

#[test]
fn test_removing_last_column_deletes_row() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1]);
    memtable.remove(1, &Selection::Ids(vec![1]), memtable.next_timestamp());

    assert_eq!(memtable.row_count(), 0);
    assert_eq!(memtable.row_timestamp(1), None);
}

#[test]
fn test_remove_only_set_leaves_no_row() {
    let memtable = MemTable::new();
    memtable.set(
        7,
        std::iter::empty::<(i64, Bytes)>(),
        &Selection::All,
        memtable.next_timestamp(),
    );
    assert!(memtable.is_empty());
}

#[test]
fn test_clear() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 2]);
    put(&memtable, 2, &[1]);
    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.row_count(), 0);
}

// =============================================================================
// Stamp Tests
// =============================================================================

#[test]
fn test_every_mutation_restamps_row() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1, 2]);
    let first = memtable.row_timestamp(1).unwrap();

    put(&memtable, 1, &[3]);
    let second = memtable.row_timestamp(1).unwrap();
    assert!(second > first);

    memtable.remove(1, &Selection::Ids(vec![3]), memtable.next_timestamp());
    assert!(memtable.row_timestamp(1).unwrap() > second);
}

#[test]
fn test_observed_stamps_move_the_clock() {
    let memtable = MemTable::new();
    memtable.observe_timestamp(100);
    assert_eq!(memtable.next_timestamp(), 101);

    memtable.observe_timestamp(50);
    assert_eq!(memtable.next_timestamp(), 102);
}

// =============================================================================
// Key Paging Tests
// =============================================================================

#[test]
fn test_keys_are_ordered_and_paged() {
    let memtable = MemTable::new();
    for key in [5, -1, 3, 9, 0] {
        put(&memtable, key, &[1]);
    }

    assert_eq!(memtable.keys(0, 3), vec![-1, 0, 3]);
    assert_eq!(memtable.keys(3, 3), vec![5, 9]);
    assert!(memtable.keys(10, 3).is_empty());
}

#[test]
fn test_snapshot_is_detached() {
    let memtable = MemTable::new();
    put(&memtable, 1, &[1]);
    let snapshot = memtable.snapshot();

    put(&memtable, 2, &[1]);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].0, 1);
    assert_eq!(snapshot[0].1.columns.len(), 1);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_writers() {
    let memtable = Arc::new(MemTable::new());
    let mut handles = Vec::new();

    for t in 0..4i64 {
        let memtable = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for i in 0..100i64 {
                put(&memtable, t * 1000 + i, &[1, 2]);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.row_count(), 400);

    // Stamps are unique across threads
    let mut stamps: Vec<i64> = memtable
        .snapshot()
        .into_iter()
        .map(|(_, row)| row.timestamp)
        .collect();
    stamps.sort();
    stamps.dedup();
    assert_eq!(stamps.len(), 400);
}
