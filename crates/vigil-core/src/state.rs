#![forbid(unsafe_code)]

//! Per-field validation state.

use std::fmt;

/// Last known validity of one bound field.
///
/// `Unknown` is the state before the first event arrives and is never
/// re-entered. Afterwards a field moves between `Valid` and `Invalid` only in
/// response to delivered events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationState {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

impl ValidationState {
    /// State reached after an event with the given outcome.
    #[inline]
    #[must_use]
    pub const fn after(is_valid: bool) -> Self {
        if is_valid { Self::Valid } else { Self::Invalid }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
