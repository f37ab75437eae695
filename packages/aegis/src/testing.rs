//! Testing utilities including fake detectors.
//!
//! These let applications exercise the privacy filter without a real
//! named-entity recognition engine.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::DetectorFailure;
use crate::scanner::{DetectionRequest, SpanDetector};
use crate::types::DetectedSpan;

/// Detector returning predefined spans.
///
/// Records every call for assertions. Spans registered for an exact text
/// take precedence over the default list.
#[derive(Default)]
pub struct StaticDetector {
    default_spans: Vec<DetectedSpan>,

    /// Predefined spans by input text
    by_text: Arc<RwLock<HashMap<String, Vec<DetectedSpan>>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<(String, DetectionRequest)>>>,
}

impl StaticDetector {
    pub fn new(default_spans: Vec<DetectedSpan>) -> Self {
        Self {
            default_spans,
            ..Default::default()
        }
    }

    /// Return `spans` whenever exactly `text` is scanned.
    pub fn with_spans_for(self, text: impl Into<String>, spans: Vec<DetectedSpan>) -> Self {
        self.by_text
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(text.into(), spans);
        self
    }

    /// Texts and requests seen so far, in order.
    pub fn calls(&self) -> Vec<(String, DetectionRequest)> {
        self.calls
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl SpanDetector for StaticDetector {
    fn detect(
        &self,
        text: &str,
        request: &DetectionRequest,
    ) -> Result<Vec<DetectedSpan>, DetectorFailure> {
        self.calls
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((text.to_string(), request.clone()));

        let by_text = self.by_text.read().unwrap_or_else(|e| e.into_inner());
        Ok(by_text
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default_spans.clone()))
    }
}

/// Detector that reports every occurrence of registered literal terms.
///
/// A stand-in for an NER model: `TermDetector::new().with_term("John", "PERSON")`.
#[derive(Debug, Default, Clone)]
pub struct TermDetector {
    terms: Vec<(String, String)>,
    score: f64,
}

impl TermDetector {
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            score: 0.85,
        }
    }

    pub fn with_term(mut self, term: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.terms.push((term.into(), entity_type.into()));
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}

impl SpanDetector for TermDetector {
    fn detect(
        &self,
        text: &str,
        request: &DetectionRequest,
    ) -> Result<Vec<DetectedSpan>, DetectorFailure> {
        let mut spans = Vec::new();
        for (term, entity_type) in &self.terms {
            if term.is_empty() || request.allow_list.contains(term) {
                continue;
            }
            for (start, matched) in text.match_indices(term.as_str()) {
                spans.push(DetectedSpan::new(
                    entity_type.as_str(),
                    start,
                    start + matched.len(),
                    self.score,
                ));
            }
        }
        spans.sort_by_key(|s| s.start);
        Ok(spans)
    }
}

/// Detector that always fails, for fail-closed tests.
#[derive(Debug, Clone)]
pub struct FailingDetector {
    message: String,
}

impl FailingDetector {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl SpanDetector for FailingDetector {
    fn detect(
        &self,
        _text: &str,
        _request: &DetectionRequest,
    ) -> Result<Vec<DetectedSpan>, DetectorFailure> {
        Err(self.message.clone().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DetectionRequest {
        DetectionRequest {
            entity_types: vec!["PERSON".to_string()],
            threshold: 0.4,
            allow_list: vec![],
        }
    }

    #[test]
    fn test_static_detector_per_text() {
        let detector = StaticDetector::new(vec![])
            .with_spans_for("John", vec![DetectedSpan::new("PERSON", 0, 4, 0.9)]);

        assert_eq!(detector.detect("John", &request()).unwrap().len(), 1);
        assert!(detector.detect("Jane", &request()).unwrap().is_empty());
        assert_eq!(detector.call_count(), 2);
    }

    #[test]
    fn test_term_detector_finds_all_occurrences() {
        let detector = TermDetector::new().with_term("John", "PERSON");
        let spans = detector.detect("John met John.", &request()).unwrap();

        assert_eq!(spans.len(), 2);
        assert_eq!((spans[1].start, spans[1].end), (9, 13));
    }

    #[test]
    fn test_failing_detector() {
        let err = FailingDetector::new("boom")
            .detect("x", &request())
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
