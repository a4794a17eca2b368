#![forbid(unsafe_code)]

//! Input controls that feed triggers into the app.
//!
//! The core never sees an out-of-range depth: every value passes through a
//! [`RangeInput`] first.

use deeptree_core::MAX_DEPTH;
use tracing::warn;

use crate::error::{DemoError, Result};

/// Integer range control bounded to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeInput {
    min: u32,
    max: u32,
}

impl RangeInput {
    /// The tree depth slider.
    pub const DEPTH: Self = Self::new(0, MAX_DEPTH);

    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Clamp a raw control value into range.
    #[must_use]
    pub fn clamp(&self, raw: i64) -> u32 {
        let clamped = raw.clamp(i64::from(self.min), i64::from(self.max));
        let value = u32::try_from(clamped).unwrap_or(self.max);
        if i64::from(value) != raw {
            warn!(raw, value, "range input clamped");
        }
        value
    }

    /// Parse and clamp a textual control value.
    pub fn parse(&self, raw: &str) -> Result<u32> {
        let number: i64 = raw
            .trim()
            .parse()
            .map_err(|_| DemoError::invalid(format!("`{raw}` is not an integer")))?;
        Ok(self.clamp(number))
    }
}
