use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::validate::ValidationError;

/// Inclusive date range `[floweringStart, floweringEnd]` during which a crop is in bloom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloweringWindow {
    #[serde(rename = "floweringStart")]
    start: DateTime<Utc>,
    #[serde(rename = "floweringEnd")]
    end: DateTime<Utc>,
}

impl FloweringWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedWindow);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Closed-interval intersection: touching boundaries overlap.
    pub fn overlaps(&self, other: &FloweringWindow) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}
