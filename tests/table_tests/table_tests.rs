//! Table Tests
//!
//! Tests verify (against the memory backend):
//! - Row reads and writes, whole-row and by column ids or ranges
//! - Column ordering for normal and reverse tables
//! - Removal-before-upsert semantics of the combined writes
//! - Empty requests never change anything
//! - Compare-and-abort collision detection

use colkv::{Backend, ColKvError, Columns, Config, MemoryBackend, Range, TableProfile};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_backend() -> Backend {
    MemoryBackend::create("test", &Config::default()).unwrap()
}

fn cols(entries: &[(i64, &[u8])]) -> Columns {
    let mut columns = Columns::new(false);
    for (id, value) in entries {
        columns.put_bytes(*id, value);
    }
    columns
}

fn value_of(columns: &Columns, id: i64) -> Vec<u8> {
    columns.get_bytes(id).unwrap().to_vec()
}

// =============================================================================
// Basic Read/Write Tests
// =============================================================================

#[test]
fn test_set_then_get() {
    let mut backend = setup_backend();
    let table = backend
        .create_database("db")
        .unwrap()
        .create("t1", None)
        .unwrap();

    table.set(42, &cols(&[(1, &[0x01, 0x02])])).unwrap();

    let row = table.get(42).unwrap().unwrap();
    assert_eq!(row, cols(&[(1, &[0x01, 0x02])]));
    assert_eq!(table.columns_count(42).unwrap(), 1);
    assert!(table.exists(42).unwrap());
}

#[test]
fn test_missing_row_reads_as_none() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();

    assert!(table.get(7).unwrap().is_none());
    assert!(!table.exists(7).unwrap());
    assert_eq!(table.columns_count(7).unwrap(), 0);
    assert!(table.columns(7).unwrap().is_none());
    assert!(table.columns_iter(7).unwrap().is_none());
    assert!(table.get_limited(7, 3).unwrap().is_none());
}

#[test]
fn test_get_contains_exactly_what_was_set() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();

    let written = cols(&[(1, b"a"), (-4, b"b"), (1 << 40, b"")]);
    table.set(3, &written).unwrap();

    assert_eq!(table.get(3).unwrap().unwrap(), written);
}

#[test]
fn test_set_merges_into_existing_row() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();

    table.set(1, &cols(&[(1, b"a"), (2, b"b")])).unwrap();
    table.set(1, &cols(&[(2, b"B"), (3, b"c")])).unwrap();

    let row = table.get(1).unwrap().unwrap();
    assert_eq!(row.columns(true), vec![1, 2, 3]);
    assert_eq!(value_of(&row, 2), b"B");
}

#[test]
fn test_get_column_and_columns() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a"), (2, b"b"), (3, b"c")])).unwrap();

    let one = table.get_column(1, 2).unwrap().unwrap();
    assert_eq!(one, cols(&[(2, b"b")]));

    let some = table.get_columns(1, &[3, 1, 99]).unwrap().unwrap();
    assert_eq!(some.columns(true), vec![1, 3]);

    assert!(table.get_column(1, 99).unwrap().is_none());
    assert!(table.get_columns(1, &[]).unwrap().is_none());
}

#[test]
fn test_get_range() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table
        .set(1, &cols(&[(5, b"a"), (10, b"b"), (15, b"c"), (20, b"d")]))
        .unwrap();

    let middle = table.get_range(1, Range::new(10, 15)).unwrap().unwrap();
    assert_eq!(middle.columns(true), vec![10, 15]);

    let everything = table.get_range(1, Range::full()).unwrap().unwrap();
    assert_eq!(everything.len(), 4);

    assert!(table.get_range(1, Range::new(15, 10)).unwrap().is_none());
    assert!(table.get_range(1, Range::new(11, 14)).unwrap().is_none());
}

#[test]
fn test_get_limited_takes_first_in_order() {
    let mut backend = setup_backend();
    let db = backend.create_database("db").unwrap();

    let forward = db.create("fwd", None).unwrap();
    forward.set(1, &cols(&[(1, b"a"), (2, b"b"), (3, b"c")])).unwrap();
    let first = forward.get_limited(1, 2).unwrap().unwrap();
    assert_eq!(first.columns(true), vec![1, 2]);
    assert!(forward.get_limited(1, 0).unwrap().is_none());

    let profile = TableProfile::new().reverse_columns_order(true);
    let backward = db.create("bwd", Some(&profile)).unwrap();
    backward.set(1, &cols(&[(1, b"a"), (2, b"b"), (3, b"c")])).unwrap();
    let last = backward.get_limited(1, 2).unwrap().unwrap();
    assert_eq!(last.columns(true), vec![3, 2]);
}

#[test]
fn test_size_counts_rows() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    assert_eq!(table.size().unwrap(), 0);

    for key in 0..10 {
        table.set(key, &cols(&[(1, b"x")])).unwrap();
    }
    assert_eq!(table.size().unwrap(), 10);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_columns_ascending_by_default() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(5, &cols(&[(9, b"z"), (1, b"x"), (5, b"y")])).unwrap();

    assert!(!table.reverse());
    assert_eq!(table.columns(5).unwrap().unwrap(), vec![1, 5, 9]);
    let iterated: Vec<i64> = table.columns_iter(5).unwrap().unwrap().collect();
    assert_eq!(iterated, vec![1, 5, 9]);
}

#[test]
fn test_reverse_table_lists_descending() {
    let mut backend = setup_backend();
    let profile = TableProfile::new().reverse_columns_order(true);
    let table = backend
        .create_database("db")
        .unwrap()
        .create("rev", Some(&profile))
        .unwrap();
    table.set(5, &cols(&[(1, b"x"), (5, b"y"), (9, b"z")])).unwrap();

    assert!(table.reverse());
    assert_eq!(table.columns(5).unwrap().unwrap(), vec![9, 5, 1]);
    let iterated: Vec<i64> = table.columns_iter(5).unwrap().unwrap().collect();
    assert_eq!(iterated, vec![9, 5, 1]);

    let row = table.get(5).unwrap().unwrap();
    assert!(row.is_reverse());
    assert_eq!(row.columns(true), vec![9, 5, 1]);
}

// =============================================================================
// Removal Tests
// =============================================================================

#[test]
fn test_remove_range_of_one_column() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(10, b"A"), (20, b"B")])).unwrap();

    table.remove_range(1, Range::new(10, 10)).unwrap();

    assert_eq!(table.get(1).unwrap().unwrap(), cols(&[(20, b"B")]));
}

#[test]
fn test_remove_whole_row() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a"), (2, b"b")])).unwrap();

    table.remove(1).unwrap();
    assert!(table.get(1).unwrap().is_none());
    assert!(!table.exists(1).unwrap());

    // Removing again is harmless
    table.remove(1).unwrap();
}

#[test]
fn test_remove_columns_deletes_row_when_emptied() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a"), (2, b"b")])).unwrap();

    table.remove_columns(1, &[1, 77]).unwrap();
    assert_eq!(table.columns(1).unwrap().unwrap(), vec![2]);

    table.remove_columns(1, &[2]).unwrap();
    assert!(!table.exists(1).unwrap());
    assert_eq!(table.size().unwrap(), 0);
}

#[test]
fn test_empty_removals_do_nothing() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a")])).unwrap();

    table.remove_columns(1, &[]).unwrap();
    table.remove_range(1, Range::new(5, 1)).unwrap();
    table.set(1, &Columns::new(false)).unwrap();

    assert_eq!(table.get(1).unwrap().unwrap(), cols(&[(1, b"a")]));
}

#[test]
fn test_set_removing_applies_removal_first() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a"), (2, b"b"), (3, b"c")])).unwrap();

    table
        .set_removing(1, &cols(&[(2, b"new"), (4, b"d")]), &[1, 2])
        .unwrap();

    let row = table.get(1).unwrap().unwrap();
    assert_eq!(row.columns(true), vec![2, 3, 4]);
    assert_eq!(value_of(&row, 2), b"new");
}

#[test]
fn test_set_removing_range() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table
        .set(1, &cols(&[(1, b"a"), (2, b"b"), (3, b"c"), (9, b"z")]))
        .unwrap();

    table
        .set_removing_range(1, &cols(&[(3, b"C")]), Range::new(1, 5))
        .unwrap();

    let row = table.get(1).unwrap().unwrap();
    assert_eq!(row.columns(true), vec![3, 9]);
    assert_eq!(value_of(&row, 3), b"C");
}

#[test]
fn test_set_removing_with_empty_upsert_only_removes() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a"), (2, b"b")])).unwrap();

    table.set_removing(1, &Columns::new(false), &[1]).unwrap();
    assert_eq!(table.columns(1).unwrap().unwrap(), vec![2]);
}

// =============================================================================
// Collision Detection Tests
// =============================================================================

fn detecting_profile() -> TableProfile {
    TableProfile::new().try_detect_collisions(true)
}

#[test]
fn test_reads_carry_stamp_only_when_detecting() {
    let mut backend = setup_backend();
    let db = backend.create_database("db").unwrap();

    let plain = db.create("plain", None).unwrap();
    plain.set(1, &cols(&[(1, b"a")])).unwrap();
    assert!(!plain.detect_collisions());
    assert_eq!(plain.get(1).unwrap().unwrap().timestamp(), None);

    let guarded = db.create("guarded", Some(&detecting_profile())).unwrap();
    guarded.set(1, &cols(&[(1, b"a")])).unwrap();
    assert!(guarded.detect_collisions());
    assert!(guarded.get(1).unwrap().unwrap().timestamp().is_some());
}

#[test]
fn test_read_modify_write_succeeds_without_interference() {
    let mut backend = setup_backend();
    let table = backend
        .create_database("db")
        .unwrap()
        .create("t", Some(&detecting_profile()))
        .unwrap();
    table.set(1, &cols(&[(1, b"a")])).unwrap();

    let mut row = table.get(1).unwrap().unwrap();
    row.put_bytes(2, b"b");
    table.set(1, &row).unwrap();

    assert_eq!(table.columns(1).unwrap().unwrap(), vec![1, 2]);
}

#[test]
fn test_stale_write_is_rejected() {
    let mut backend = setup_backend();
    let table = backend
        .create_database("db")
        .unwrap()
        .create("t", Some(&detecting_profile()))
        .unwrap();
    table.set(1, &cols(&[(1, b"a")])).unwrap();

    let mut stale = table.get(1).unwrap().unwrap();
    table.set(1, &cols(&[(1, b"other writer")])).unwrap();

    stale.put_bytes(1, b"mine");
    let result = table.set(1, &stale);
    assert!(matches!(
        result,
        Err(ColKvError::Collision { key: 1, found: Some(_), .. })
    ));

    // Nothing was written
    let row = table.get(1).unwrap().unwrap();
    assert_eq!(value_of(&row, 1), b"other writer");
}

#[test]
fn test_write_after_row_vanished_is_rejected() {
    let mut backend = setup_backend();
    let table = backend
        .create_database("db")
        .unwrap()
        .create("t", Some(&detecting_profile()))
        .unwrap();
    table.set(1, &cols(&[(1, b"a")])).unwrap();

    let stale = table.get(1).unwrap().unwrap();
    table.remove(1).unwrap();

    let result = table.set(1, &stale);
    assert!(matches!(
        result,
        Err(ColKvError::Collision { found: None, .. })
    ));
    assert!(!table.exists(1).unwrap());
}

#[test]
fn test_unstamped_write_is_blind() {
    let mut backend = setup_backend();
    let table = backend
        .create_database("db")
        .unwrap()
        .create("t", Some(&detecting_profile()))
        .unwrap();
    table.set(1, &cols(&[(1, b"a")])).unwrap();
    table.set(1, &cols(&[(1, b"b")])).unwrap();

    let row = table.get(1).unwrap().unwrap();
    assert_eq!(value_of(&row, 1), b"b");
}

#[test]
fn test_stamp_is_ignored_without_detection() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.set(1, &cols(&[(1, b"a")])).unwrap();

    let mut forged = cols(&[(1, b"b")]);
    forged.set_timestamp(Some(-12345));
    table.set(1, &forged).unwrap();

    assert_eq!(value_of(&table.get(1).unwrap().unwrap(), 1), b"b");
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_table_opens_lazily_and_closes_idempotently() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    assert!(!table.is_opened());

    table.set(1, &cols(&[(1, b"a")])).unwrap();
    assert!(table.is_opened());

    table.close().unwrap();
    table.close().unwrap();
    assert!(table.is_closed());
}

#[test]
fn test_closed_table_rejects_every_operation() {
    let mut backend = setup_backend();
    let table = backend.create_database("db").unwrap().create("t", None).unwrap();
    table.close().unwrap();

    assert!(matches!(table.get(1), Err(ColKvError::Closed { .. })));
    assert!(matches!(table.set(1, &cols(&[(1, b"a")])), Err(ColKvError::Closed { .. })));
    assert!(matches!(table.remove(1), Err(ColKvError::Closed { .. })));
    assert!(matches!(table.size(), Err(ColKvError::Closed { .. })));
    assert!(matches!(table.open(), Err(ColKvError::Closed { .. })));
    assert!(table.keys().is_err());

    // Empty requests still report the closed state
    assert!(matches!(table.get_columns(1, &[]), Err(ColKvError::Closed { .. })));
}
