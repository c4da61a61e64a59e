//! Position resolution for new records.

use std::fmt;
use tracing::debug;

/// A client-requested position, possibly absent.
///
/// Anything that is not an integer (empty text, `"abc"`, `"2.5"`) is
/// treated as absent: an unusable position means "append", it is never
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestedPosition(Option<i64>);

impl RequestedPosition {
    /// No position requested.
    #[must_use]
    pub const fn absent() -> Self {
        Self(None)
    }

    /// A specific position. Values below 1 resolve to "append".
    #[must_use]
    pub const fn at(position: i64) -> Self {
        Self(Some(position))
    }

    /// Parses raw client input.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().parse().ok())
    }

    /// Returns the requested value, if any.
    #[must_use]
    pub const fn value(self) -> Option<i64> {
        self.0
    }
}

impl From<Option<i64>> for RequestedPosition {
    fn from(value: Option<i64>) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, "{position}"),
            None => f.write_str("end"),
        }
    }
}

/// Where a new record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// After every existing record; nothing moves.
    Append(u32),
    /// At an occupied slot; records at or above it shift up first.
    Shift(u32),
}

impl InsertPosition {
    /// The order value the new record receives.
    #[must_use]
    pub const fn order(self) -> u32 {
        match self {
            Self::Append(order) | Self::Shift(order) => order,
        }
    }

    /// Returns true if existing records must shift to make room.
    #[must_use]
    pub const fn requires_shift(self) -> bool {
        matches!(self, Self::Shift(_))
    }
}

/// Resolves the insertion position for a new record.
///
/// Absent, non-positive or past-the-end requests append at
/// `max_order + 1`; anything in `1..=max_order` is used as given.
///
/// ```rust
/// use roster_core::{resolve_insert_position, InsertPosition};
///
/// assert_eq!(resolve_insert_position(None, 3), InsertPosition::Append(4));
/// assert_eq!(resolve_insert_position(Some(2), 3), InsertPosition::Shift(2));
/// assert_eq!(resolve_insert_position(Some(9), 3), InsertPosition::Append(4));
/// ```
#[must_use]
pub fn resolve_insert_position(requested: Option<i64>, max_order: u32) -> InsertPosition {
    let resolved = match requested {
        Some(position) if position >= 1 && position <= i64::from(max_order) => {
            // In range, so it fits in u32.
            InsertPosition::Shift(position as u32)
        }
        _ => InsertPosition::Append(max_order.saturating_add(1)),
    };
    debug!(?requested, max_order, ?resolved, "resolved insert position");
    resolved
}
