//! Creation-time table hints

use serde::{Deserialize, Serialize};

/// Expected mix of operations on a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessPattern {
    AppendMostly,
    #[default]
    Balanced,
    ReadMostly,
    UpdateMostly,
}

/// Advisory hints consumed once when a table is created
///
/// Engines may ignore any of these and must still create a working table.
/// Only `reverse_columns_order` and `try_detect_collisions` become fixed
/// properties of the table, and only where the engine supports them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableProfile {
    pub access_pattern: AccessPattern,
    pub expected_rows: u64,
    pub expected_columns: u64,
    /// Average blob size in bytes
    pub average_column_size: u64,
    pub reverse_columns_order: bool,
    pub try_detect_collisions: bool,
    pub optimize_for_speed: bool,
}

impl TableProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_pattern(mut self, pattern: AccessPattern) -> Self {
        self.access_pattern = pattern;
        self
    }

    pub fn expected_rows(mut self, rows: u64) -> Self {
        self.expected_rows = rows;
        self
    }

    pub fn expected_columns(mut self, columns: u64) -> Self {
        self.expected_columns = columns;
        self
    }

    pub fn average_column_size(mut self, bytes: u64) -> Self {
        self.average_column_size = bytes;
        self
    }

    pub fn reverse_columns_order(mut self, reverse: bool) -> Self {
        self.reverse_columns_order = reverse;
        self
    }

    pub fn try_detect_collisions(mut self, detect: bool) -> Self {
        self.try_detect_collisions = detect;
        self
    }

    pub fn optimize_for_speed(mut self, fast: bool) -> Self {
        self.optimize_for_speed = fast;
        self
    }
}
