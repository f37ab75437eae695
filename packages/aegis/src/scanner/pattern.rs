use lazy_static::lazy_static;
use regex::Regex;

use super::{DetectionRequest, SpanDetector};
use crate::error::DetectorFailure;
use crate::types::DetectedSpan;

lazy_static! {
    // Email pattern - RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b"
    ).unwrap();

    // US-style phone numbers with optional country code
    static ref PHONE_REGEX: Regex = Regex::new(
        r"(?:\+?1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b"
    ).unwrap();

    // IPv4 addresses
    static ref IPV4_REGEX: Regex = Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b"
    ).unwrap();

    // API keys in the sk-... form
    static ref SECRET_KEY_REGEX: Regex = Regex::new(r"\bsk-[a-zA-Z0-9-]{20,}\b").unwrap();

    // Medical record numbers
    static ref MRN_REGEX: Regex = Regex::new(r"\b\d{6,10}\b").unwrap();

    // Clinical protocol ids, e.g. ABC-123
    static ref PROTOCOL_REGEX: Regex = Regex::new(r"\b[A-Z]{3}-\d{3}\b").unwrap();

    static ref LOT_REGEX: Regex = Regex::new(r"\bLOT-[A-Z0-9]+\b").unwrap();

    // Raw nucleotide runs
    static ref GENE_REGEX: Regex = Regex::new(r"\b[ATCG]{10,}\b").unwrap();

    // CAS registry numbers, e.g. 50-00-0
    static ref CAS_REGEX: Regex = Regex::new(r"\b\d{2,7}-\d{2}-\d\b").unwrap();
}

struct Recognizer {
    entity_type: &'static str,
    regex: &'static Regex,
    score: f64,
}

impl Recognizer {
    fn new(entity_type: &'static str, regex: &'static Regex, score: f64) -> Self {
        Self {
            entity_type,
            regex,
            score,
        }
    }
}

/// Regex detector for structured identifiers.
///
/// Names, locations and free-form dates need an NER model and are not
/// covered here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternDetector;

impl PatternDetector {
    pub fn new() -> Self {
        Self
    }

    fn recognizers() -> [Recognizer; 9] {
        [
            Recognizer::new("EMAIL_ADDRESS", &EMAIL_REGEX, 1.0),
            Recognizer::new("PHONE_NUMBER", &PHONE_REGEX, 0.75),
            Recognizer::new("IP_ADDRESS", &IPV4_REGEX, 0.95),
            Recognizer::new("SECRET_KEY", &SECRET_KEY_REGEX, 0.95),
            Recognizer::new("MRN", &MRN_REGEX, 0.85),
            Recognizer::new("PROTOCOL_ID", &PROTOCOL_REGEX, 0.85),
            Recognizer::new("LOT_NUMBER", &LOT_REGEX, 0.85),
            Recognizer::new("GENE_SEQUENCE", &GENE_REGEX, 0.85),
            Recognizer::new("CHEMICAL_CAS", &CAS_REGEX, 0.85),
        ]
    }
}

impl SpanDetector for PatternDetector {
    fn detect(
        &self,
        text: &str,
        request: &DetectionRequest,
    ) -> Result<Vec<DetectedSpan>, DetectorFailure> {
        let mut spans = Vec::new();

        for recognizer in Self::recognizers() {
            let name = recognizer.entity_type;
            if recognizer.score < request.threshold
                || !request.entity_types.iter().any(|t| t == name)
            {
                continue;
            }

            for mat in recognizer.regex.find_iter(text) {
                let found = mat.as_str();
                if request.allow_list.iter().any(|term| term == found) {
                    continue;
                }
                // Filter out obvious non-IPs like version numbers
                if name == "IP_ADDRESS" && is_likely_version_number(found) {
                    continue;
                }
                spans.push(DetectedSpan::new(
                    name,
                    mat.start(),
                    mat.end(),
                    recognizer.score,
                ));
            }
        }

        spans.sort_by_key(|s| s.start);
        Ok(spans)
    }
}

/// Check if an IP-like string is likely a version number
fn is_likely_version_number(ip_str: &str) -> bool {
    let parts: Vec<&str> = ip_str.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    let zero_count = parts.iter().filter(|&&p| p == "0").count();
    parts[0] == "0" || zero_count >= 2
}
