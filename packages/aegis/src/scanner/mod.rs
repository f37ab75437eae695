//! Span-detector boundary.
//!
//! The core does not ship named-entity recognition. A [`SpanDetector`]
//! reports typed, scored spans; [`Scanner`] applies the policy around it and
//! fails closed when the detector errors.

mod pattern;

pub use pattern::PatternDetector;

use std::sync::{Arc, OnceLock};

use crate::auth::UserContext;
use crate::error::{AegisResult, DetectorFailure, ScanError};
use crate::types::{DetectedSpan, Policy};

/// What the detector is asked to look for.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub entity_types: Vec<String>,
    /// Minimum score to report
    pub threshold: f64,
    /// Literal texts the detector should not report
    pub allow_list: Vec<String>,
}

impl From<&Policy> for DetectionRequest {
    fn from(policy: &Policy) -> Self {
        Self {
            entity_types: policy.entity_types.clone(),
            threshold: policy.confidence_score,
            allow_list: policy.allow_list.clone(),
        }
    }
}

/// Anything that can find sensitive spans in text.
///
/// Implementations must return byte offsets into `text`.
pub trait SpanDetector: Send + Sync {
    fn detect(
        &self,
        text: &str,
        request: &DetectionRequest,
    ) -> Result<Vec<DetectedSpan>, DetectorFailure>;
}

static SHARED_DETECTOR: OnceLock<Arc<PatternDetector>> = OnceLock::new();

/// Process-wide built-in detector, constructed on first use.
pub fn shared_detector() -> Arc<dyn SpanDetector> {
    let detector = SHARED_DETECTOR.get_or_init(|| {
        tracing::info!("Initializing built-in pattern detector");
        Arc::new(PatternDetector::new())
    });
    detector.clone()
}

pub struct Scanner {
    detector: Arc<dyn SpanDetector>,
}

impl Scanner {
    pub fn new(detector: Arc<dyn SpanDetector>) -> Self {
        Self { detector }
    }

    /// Scanner over [`shared_detector`].
    pub fn shared() -> Self {
        Self::new(shared_detector())
    }

    /// Detect spans in `text` that the policy cares about.
    ///
    /// Empty text yields no spans without calling the detector. Spans of
    /// other types or below the policy threshold are dropped even if the
    /// detector returned them.
    pub fn scan(
        &self,
        text: &str,
        policy: &Policy,
        context: &UserContext,
    ) -> AegisResult<Vec<DetectedSpan>> {
        context.require()?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        policy.validate()?;

        let request = DetectionRequest::from(policy);
        let spans = self.detector.detect(text, &request).map_err(|e| {
            tracing::error!(error = %e, "Scan failed");
            ScanError::Detection(e)
        })?;

        let keep = |span: &DetectedSpan| {
            policy.wants(&span.entity_type) && span.score >= policy.confidence_score
        };
        Ok(spans.into_iter().filter(keep).collect())
    }
}
