//! Encoding Module
//!
//! Makes identifiers and values portable across backends.
//!
//! ## Responsibilities
//! - Fixed-width and variable-length binary encoding of primitives
//! - Base-36 names for databases and tables
//! - Mapping base-36 identifiers into the negative row-key space

pub mod base36;
pub mod binary;

pub use base36::{Base36, LimitedBase36, MAX_VALUE_INTERNAL, MIN_VALUE_INTERNAL};
