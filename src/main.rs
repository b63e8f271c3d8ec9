//! gemini-keycheck - check Gemini API keys for validity and remaining quota.
//!
//! Exits 0 once every key has been checked, whatever the per-key outcome.
//! Exits 1 on input or configuration errors, before any request is sent.

use clap::Parser;
use gemini_keycheck::config::{
    duration_from_secs, CheckerConfig, DEFAULT_ENDPOINT, DEFAULT_MAX_WORKERS, DEFAULT_MODEL,
    DEFAULT_PROMPT,
};
use gemini_keycheck::{KeyChecker, KeySource, KeycheckError, Progress};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Check Gemini API keys for validity and remaining quota.
#[derive(Parser, Debug)]
#[command(name = "gemini-keycheck")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "Input can be a file of keys (one per line) or a single key string. \
                  Use --key for a single key if you prefer flags."
)]
struct Cli {
    /// Path to a key file (one per line), or a single API key string
    input: Option<String>,

    /// Single API key string to check (alternative to the positional input)
    #[arg(short, long)]
    key: Option<String>,

    /// Model ID to use
    #[arg(short, long, env = "GEMINI_KEYCHECK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Prompt text to send as a test request
    #[arg(short, long, env = "GEMINI_KEYCHECK_PROMPT", default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Maximum concurrent requests to run
    #[arg(short = 'w', long, default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Minimum seconds between starting requests
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    min_interval: f64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30.0)]
    timeout: f64,

    /// API base URL
    #[arg(long, env = "GEMINI_KEYCHECK_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Accept keys that do not look like Gemini API keys
    #[arg(long)]
    lenient: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "gemini_keycheck=debug"
    } else {
        "gemini_keycheck=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), KeycheckError> {
    let keys = KeySource::resolve(cli.input.as_deref(), cli.key.as_deref())?.load()?;

    let config = CheckerConfig {
        model: cli.model,
        prompt: cli.prompt,
        max_workers: cli.max_workers,
        min_interval: duration_from_secs(cli.min_interval, "--min-interval")?,
        request_timeout: duration_from_secs(cli.timeout, "--timeout")?,
        endpoint: cli.endpoint,
        strict_key_format: !cli.lenient,
        ..CheckerConfig::default()
    };
    let checker = KeyChecker::new(config)?;

    if cli.json {
        let report = checker.check_keys(&keys)?;
        let json = report
            .to_json()
            .map_err(|e| KeycheckError::Protocol(format!("Failed to serialize report: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    let mut progress = Progress::new(keys.len());
    let report = checker.check_keys_with_progress(&keys, |result| {
        progress.record(result);
        println!("{}", progress.render(result));
    })?;

    println!();
    print!("{}", report.render_summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["gemini-keycheck", "keys.txt"]).unwrap();
        assert_eq!(cli.input.as_deref(), Some("keys.txt"));
        assert_eq!(cli.max_workers, 4);
        assert_eq!(cli.min_interval, 1.0);
        assert!(!cli.lenient);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "gemini-keycheck",
            "-k",
            "KEY",
            "-m",
            "gemini-2.0-flash",
            "-w",
            "8",
            "--min-interval",
            "0.25",
            "--lenient",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.key.as_deref(), Some("KEY"));
        assert_eq!(cli.model, "gemini-2.0-flash");
        assert_eq!(cli.max_workers, 8);
        assert_eq!(cli.min_interval, 0.25);
        assert!(cli.lenient);
        assert!(cli.json);
    }

    #[test]
    fn test_negative_interval_rejected_before_network() {
        let cli = Cli::try_parse_from([
            "gemini-keycheck",
            "-k",
            "AIzaSyA1234567890abcdefghij",
            "--min-interval",
            "-1",
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(err, KeycheckError::ConfigError(_)));
    }

    #[test]
    fn test_huge_timeout_is_config_error() {
        let cli = Cli::try_parse_from([
            "gemini-keycheck",
            "-k",
            "AIzaSyA1234567890abcdefghij",
            "--timeout",
            "1e20",
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(err, KeycheckError::ConfigError(_)));
        assert!(err.to_string().contains("--timeout"));
    }

    #[test]
    fn test_conflicting_input_rejected() {
        let cli = Cli::try_parse_from(["gemini-keycheck", "a", "--key", "b"]).unwrap();
        assert!(matches!(run(cli), Err(KeycheckError::ConflictingInput)));
    }
}
