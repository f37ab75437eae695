//! CLI for running the privacy filter on local text
//!
//! Uses the built-in pattern detector and an in-process vault, so sessions
//! only live for one invocation. Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aegis::{
    shared_detector, token, Aegis, Config, DetectedSpan, Policy, RedactionMode, Scanner,
    UserContext,
};

#[derive(Parser)]
#[command(name = "aegis")]
#[command(about = "Redact sensitive entities before text reaches an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SanitizeArgs {
    /// Session to extend (a new one is generated when omitted)
    #[arg(long)]
    session: Option<String>,

    /// Identity to run as
    #[arg(long, default_value = "cli-user")]
    user: String,

    /// MASK, REPLACE, SYNTHETIC or HASH
    #[arg(long, default_value = "REPLACE")]
    mode: String,

    /// Literal text never to redact (repeatable)
    #[arg(long = "allow")]
    allow: Vec<String>,

    /// Text to process; read from stdin when omitted
    text: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact text and print the result with its token map
    Sanitize(SanitizeArgs),

    /// Redact, then restore as the same user
    Roundtrip(SanitizeArgs),

    /// Detect entities and print the spans without redacting
    Scan(SanitizeArgs),

    /// Print the token suffix for a 0-based counter
    Suffix { index: i64 },
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct SanitizeResponse<'a> {
    session_id: &'a str,
    text: &'a str,
    map: IndexMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct RoundtripResponse<'a> {
    session_id: &'a str,
    sanitized: &'a str,
    restored: &'a str,
}

#[derive(Serialize)]
struct ScanResponse<'a> {
    entity_count: usize,
    spans: Vec<ScannedSpan<'a>>,
}

#[derive(Serialize)]
struct ScannedSpan<'a> {
    #[serde(flatten)]
    span: &'a DetectedSpan,
    text: &'a str,
}

impl<'a> ScanResponse<'a> {
    fn new(text: &'a str, spans: &'a [DetectedSpan]) -> Self {
        Self {
            entity_count: spans.len(),
            spans: spans
                .iter()
                .map(|span| ScannedSpan {
                    span,
                    text: text.get(span.start..span.end).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aegis=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sanitize(args) => {
            let aegis = build_filter()?;
            let (user, policy, text) = prepare(&args)?;
            let out = aegis
                .sanitize(&text, &user, args.session.as_deref(), Some(&policy))
                .context("Sanitization failed")?;

            output(&SanitizeResponse {
                session_id: &out.mapping.session_id,
                text: &out.text,
                map: out.mapping.iter().collect(),
            })
        }
        Commands::Roundtrip(args) => {
            let aegis = build_filter()?;
            let (user, policy, text) = prepare(&args)?;
            let out = aegis
                .sanitize(&text, &user, args.session.as_deref(), Some(&policy))
                .context("Sanitization failed")?;
            let restored = aegis
                .desanitize(&out.text, &out.mapping.session_id, &user)
                .context("Desanitization failed")?;

            output(&RoundtripResponse {
                session_id: &out.mapping.session_id,
                sanitized: &out.text,
                restored: &restored,
            })
        }
        Commands::Scan(args) => {
            let (user, policy, text) = prepare(&args)?;
            let spans = Scanner::new(shared_detector())
                .scan(&text, &policy, &user)
                .context("Scan failed")?;

            output(&ScanResponse::new(&text, &spans))
        }
        Commands::Suffix { index } => {
            println!("{}", token::suffix(index).context("Invalid suffix index")?);
            Ok(())
        }
    }
}

fn build_filter() -> Result<Aegis> {
    let config = Config::from_env().context("Failed to load configuration")?;
    Ok(Aegis::from_config(&config, shared_detector()))
}

fn prepare(args: &SanitizeArgs) -> Result<(UserContext, Policy, String)> {
    let mode: RedactionMode = args.mode.parse().unwrap_or(RedactionMode::Unrecognized);
    if mode == RedactionMode::Unrecognized {
        tracing::warn!(mode = %args.mode, "Unknown redaction mode, falling back to MASK");
    }

    let policy = Policy::builder()
        .mode(mode)
        .allow_list(args.allow.clone())
        .entity_types(
            [
                "EMAIL_ADDRESS",
                "PHONE_NUMBER",
                "IP_ADDRESS",
                "SECRET_KEY",
                "MRN",
                "PROTOCOL_ID",
                "LOT_NUMBER",
                "GENE_SEQUENCE",
                "CHEMICAL_CAS",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
        .build();

    let text = match &args.text {
        Some(text) => text.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    Ok((UserContext::new(args.user.clone()), policy, text))
}
