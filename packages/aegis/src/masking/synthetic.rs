//! Deterministic fake values for SYNTHETIC mode.
//!
//! The generator is seeded from SHA-256 of the entity text, so the same text
//! and entity type always yield the same fake value, regardless of session or
//! call order.

use sha2::{Digest, Sha256};

use super::normalize_entity_type;

const FIRST_NAMES: &[&str] = &[
    "James",
    "Mary",
    "Robert",
    "Patricia",
    "Michael",
    "Linda",
    "David",
    "Barbara",
    "William",
    "Elizabeth",
    "Richard",
    "Susan",
    "Joseph",
    "Jessica",
    "Thomas",
    "Sarah",
    "Daniel",
    "Karen",
    "Matthew",
    "Nancy",
    "Anthony",
    "Lisa",
    "Mark",
    "Betty",
];

const LAST_NAMES: &[&str] = &[
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Garcia",
    "Miller",
    "Davis",
    "Rodriguez",
    "Martinez",
    "Hernandez",
    "Lopez",
    "Wilson",
    "Anderson",
    "Thomas",
    "Taylor",
    "Moore",
    "Jackson",
    "Martin",
    "Lee",
    "Thompson",
    "White",
    "Harris",
    "Clark",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

const CITIES: &[&str] = &[
    "Springfield",
    "Riverside",
    "Fairview",
    "Franklin",
    "Greenville",
    "Clinton",
    "Madison",
    "Georgetown",
    "Salem",
    "Bristol",
    "Oakland",
    "Ashland",
];

const WORDS: &[&str] = &[
    "alpha", "harbor", "maple", "orbit", "quartz", "signal", "timber", "velvet", "willow", "cobalt",
    "ember", "falcon", "glacier", "juniper", "lantern", "meadow",
];

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const BASES: &[u8] = b"ATCG";

/// Fake replacement for `entity_text` detected as `entity_type`.
pub fn synthesize(entity_text: &str, entity_type: &str) -> String {
    let mut rng = seeded_rng(entity_text);

    match normalize_entity_type(entity_type) {
        "PATIENT" => format!(
            "{} {}",
            pick(&mut rng, FIRST_NAMES),
            pick(&mut rng, LAST_NAMES)
        ),
        "EMAIL" => format!(
            "{}.{}@{}",
            pick(&mut rng, FIRST_NAMES).to_lowercase(),
            pick(&mut rng, LAST_NAMES).to_lowercase(),
            pick(&mut rng, DOMAINS)
        ),
        "PHONE" => format!(
            "({}) {}-{}",
            rng.u32(200..1000),
            rng.u32(200..1000),
            fixed_digits(&mut rng, 4)
        ),
        "IP" => format!(
            "{}.{}.{}.{}",
            rng.u8(1..=223),
            rng.u8(0..=255),
            rng.u8(0..=255),
            rng.u8(1..=254)
        ),
        "DATE" => format!(
            "{:04}-{:02}-{:02}",
            rng.u32(1970..2025),
            rng.u32(1..=12),
            rng.u32(1..=28)
        ),
        "LOCATION" => pick(&mut rng, CITIES).to_string(),
        "MRN" => fixed_digits(&mut rng, 8),
        "PROTOCOL_ID" => format!(
            "{}-{}",
            upper_letters(&mut rng, 3),
            fixed_digits(&mut rng, 3)
        ),
        "LOT_NUMBER" => format!(
            "LOT-{}{}",
            upper_letters(&mut rng, 2),
            fixed_digits(&mut rng, 2)
        ),
        "GENE_SEQUENCE" => {
            let length = entity_text.chars().count().max(10);
            (0..length).map(|_| pick_byte(&mut rng, BASES)).collect()
        }
        "CHEMICAL_CAS" => format!(
            "{}-{}-{}",
            fixed_digits(&mut rng, 5),
            fixed_digits(&mut rng, 2),
            rng.u8(0..10)
        ),
        "SECRET_KEY" => {
            let key: String = (0..24).map(|_| pick_byte(&mut rng, ALPHANUMERIC)).collect();
            format!("sk-{}", key)
        }
        _ => pick(&mut rng, WORDS).to_string(),
    }
}

fn seeded_rng(entity_text: &str) -> fastrand::Rng {
    let digest = Sha256::digest(entity_text.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    fastrand::Rng::with_seed(u64::from_be_bytes(seed))
}

fn pick<'a>(rng: &mut fastrand::Rng, items: &[&'a str]) -> &'a str {
    items[rng.usize(..items.len())]
}

fn pick_byte(rng: &mut fastrand::Rng, charset: &[u8]) -> char {
    char::from(charset[rng.usize(..charset.len())])
}

/// Exactly `n` digits, no leading zero.
fn fixed_digits(rng: &mut fastrand::Rng, n: usize) -> String {
    let mut digits = String::with_capacity(n);
    digits.push(char::from(b'0' + rng.u8(1..10)));
    for _ in 1..n {
        digits.push(char::from(b'0' + rng.u8(0..10)));
    }
    digits
}

fn upper_letters(rng: &mut fastrand::Rng, n: usize) -> String {
    (0..n).map(|_| char::from(b'A' + rng.u8(0..26))).collect()
}
