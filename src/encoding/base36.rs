//! Base-36 identifiers
//!
//! `Base36` names tables and databases. `LimitedBase36` maps a base-36
//! string of at most 12 characters onto the strictly negative half of the
//! `i64` domain:
//!
//! ```text
//! internal = -(external + 1)        external = -(internal + 1)
//!
//!   i64::MIN ... MIN_VALUE_INTERNAL ... -1 | 0 ... i64::MAX
//!               └── string-derived keys ──┘ └ numeric row keys ┘
//! ```
//!
//! String-derived keys and ordinary non-negative row keys can therefore
//! share one 64-bit key column without a type tag.

use std::fmt;
use std::str::FromStr;

use crate::error::{ColKvError, Result};

/// Maximum number of base-36 digits in an identifier
pub const MAX_LENGTH: usize = 12;

/// Largest external value: 36^12 - 1
pub const MAX_VALUE_EXTERNAL: i64 = 4_738_381_338_321_616_895;

/// Smallest internal value (external `zzzzzzzzzzzz`)
pub const MIN_VALUE_INTERNAL: i64 = -4_738_381_338_321_616_896;

/// Largest internal value (external `0`)
pub const MAX_VALUE_INTERNAL: i64 = -1;

const RADIX: u32 = 36;

// =============================================================================
// Base36
// =============================================================================

/// A validated, lower-cased base-36 identifier
///
/// Accepts 1 to 12 characters from `[0-9a-zA-Z]`; equality and ordering
/// use the lower-cased form, so `"Users"` and `"users"` are the same name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Base36(String);

impl Base36 {
    pub fn new(value: &str) -> Result<Self> {
        validate(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric identity of this name in the negative key space
    pub fn to_limited(&self) -> LimitedBase36 {
        // Already validated; digits and length are in range
        LimitedBase36::from_external(parse_digits(&self.0))
    }
}

impl fmt::Display for Base36 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Base36 {
    type Err = ColKvError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Base36 {
    type Error = ColKvError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Base36 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// LimitedBase36
// =============================================================================

/// Bijection between 12-digit base-36 strings and negative `i64` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LimitedBase36 {
    internal: i64,
}

impl LimitedBase36 {
    /// Parse a base-36 string (case-insensitive, 1 to 12 digits)
    pub fn parse(value: &str) -> Result<Self> {
        validate(value)?;
        Ok(Self::from_external(parse_digits(value)))
    }

    /// Wrap an internal (negative) value
    pub fn from_internal(internal: i64) -> Result<Self> {
        if !(MIN_VALUE_INTERNAL..=MAX_VALUE_INTERNAL).contains(&internal) {
            return Err(ColKvError::invalid_identifier(
                internal.to_string(),
                format!(
                    "internal value must lie in [{}, {}]",
                    MIN_VALUE_INTERNAL, MAX_VALUE_INTERNAL
                ),
            ));
        }
        Ok(Self { internal })
    }

    /// Wrap an external value, as produced by reading the digits
    ///
    /// # Panics
    /// In debug builds, if `external` lies outside `[0, MAX_VALUE_EXTERNAL]`.
    fn from_external(external: i64) -> Self {
        debug_assert!((0..=MAX_VALUE_EXTERNAL).contains(&external));
        Self {
            internal: -(external + 1),
        }
    }

    /// Checked counterpart of building from the numeric value of the digits
    pub fn try_from_external(external: i64) -> Result<Self> {
        if !(0..=MAX_VALUE_EXTERNAL).contains(&external) {
            return Err(ColKvError::invalid_identifier(
                external.to_string(),
                format!("external value must lie in [0, {}]", MAX_VALUE_EXTERNAL),
            ));
        }
        Ok(Self::from_external(external))
    }

    /// The negative value stored as a row key
    pub fn value(&self) -> i64 {
        self.internal
    }

    /// The numeric value of the base-36 digits
    pub fn external(&self) -> i64 {
        -(self.internal + 1)
    }

    /// All 12 digits, zero-padded on the left
    pub fn to_fixed_string(&self) -> String {
        let digits = self.to_string();
        format!("{:0>width$}", digits, width = MAX_LENGTH)
    }
}

impl fmt::Display for LimitedBase36 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.external() as u64;
        if n == 0 {
            return f.write_str("0");
        }

        let mut digits = [0u8; MAX_LENGTH];
        let mut pos = MAX_LENGTH;
        while n > 0 {
            pos -= 1;
            let d = (n % RADIX as u64) as u32;
            // d < 36 so from_digit always succeeds
            digits[pos] = std::char::from_digit(d, RADIX).unwrap_or('0') as u8;
            n /= RADIX as u64;
        }

        // Only ASCII digits were written
        f.write_str(std::str::from_utf8(&digits[pos..]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for LimitedBase36 {
    type Err = ColKvError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<LimitedBase36> for i64 {
    fn from(id: LimitedBase36) -> i64 {
        id.value()
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn validate(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ColKvError::invalid_identifier(value, "identifier is empty"));
    }
    if value.len() > MAX_LENGTH {
        return Err(ColKvError::invalid_identifier(
            value,
            format!("longer than {} characters", MAX_LENGTH),
        ));
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(ColKvError::invalid_identifier(
            value,
            format!("'{}' is not a base-36 digit", bad),
        ));
    }
    Ok(())
}

/// Numeric value of already-validated digits
fn parse_digits(value: &str) -> i64 {
    value.chars().fold(0i64, |acc, c| {
        let digit = c.to_digit(RADIX).unwrap_or(0) as i64;
        acc * RADIX as i64 + digit
    })
}
