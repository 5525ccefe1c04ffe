//! Range Tests
//!
//! Tests verify:
//! - Inclusive bounds and containment
//! - Empty (inverted) ranges
//! - The full range default and its selection shortcut

use colkv::table::Selection;
use colkv::Range;

#[test]
fn test_bounds_are_inclusive() {
    let range = Range::new(10, 20);
    assert!(range.contains(10));
    assert!(range.contains(20));
    assert!(!range.contains(9));
    assert!(!range.contains(21));
    assert!(!range.is_empty());
}

#[test]
fn test_single_column_range() {
    let range = Range::single(5);
    assert_eq!(range.start(), 5);
    assert_eq!(range.end(), 5);
    assert!(range.contains(5));
    assert!(!range.contains(6));
}

#[test]
fn test_inverted_range_is_empty() {
    let range = Range::new(20, 10);
    assert!(range.is_empty());
    assert!(!range.contains(15));
}

#[test]
fn test_default_is_full() {
    let range = Range::default();
    assert!(range.is_full());
    assert_eq!(range, Range::full());
    assert!(range.contains(i64::MIN));
    assert!(range.contains(i64::MAX));
}

#[test]
fn test_setters_chain() {
    let mut range = Range::full();
    range.set_start(-3).set_end(3);
    assert_eq!(range, Range::new(-3, 3));
    assert!(!range.is_full());
}

#[test]
fn test_from_inclusive_range() {
    let range: Range = (1..=4).into();
    assert_eq!(range, Range::new(1, 4));
}

#[test]
fn test_full_range_selects_everything() {
    assert_eq!(Selection::from(Range::full()), Selection::All);
    assert_eq!(
        Selection::from(Range::new(0, 9)),
        Selection::Range(Range::new(0, 9))
    );
}

#[test]
fn test_empty_selections() {
    assert!(Selection::none().is_empty());
    assert!(Selection::from(Range::new(1, 0)).is_empty());
    assert!(!Selection::All.is_empty());
    assert!(Selection::Ids(vec![1, 2]).matches(2));
    assert!(!Selection::Ids(vec![1, 2]).matches(3));
}
