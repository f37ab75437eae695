use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::error::ContractViolation;

/// A detected entity: half-open byte range `[start, end)` into the scanned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSpan {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl DetectedSpan {
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check `0 <= start < end <= text.len()` and that both ends sit on char
    /// boundaries.
    pub fn validate(&self, text: &str) -> Result<(), ContractViolation> {
        if self.start >= self.end || self.end > text.len() {
            return Err(ContractViolation::SpanOutOfBounds {
                start: self.start,
                end: self.end,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(self.start) || !text.is_char_boundary(self.end) {
            return Err(ContractViolation::SpanNotCharBoundary {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// The covered text. Call [`validate`](Self::validate) first.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Drop overlapping spans.
///
/// Sorts by start ascending, then length descending, and keeps a span only if
/// it starts at or after the end of the last kept one. The earlier-starting,
/// longer match wins.
pub fn resolve_overlaps(spans: &[DetectedSpan]) -> Vec<&DetectedSpan> {
    let mut sorted: Vec<&DetectedSpan> = spans.iter().collect();
    sorted.sort_by_key(|span| (span.start, Reverse(span.len())));

    let mut kept: Vec<&DetectedSpan> = Vec::with_capacity(sorted.len());
    let mut last_end = 0;
    for span in sorted {
        if span.start >= last_end {
            last_end = span.end;
            kept.push(span);
        }
    }
    kept
}
