use clap::error::ErrorKind;
use clap::{Arg, ArgMatches, Command};
use std::env;
use std::process;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod pipeline;
mod quiz;
mod utils;

use handler::transport::StdioTransport;
use handler::QuizHandler;
use quiz::Envelope;
use utils::download::{Downloader, FetchConfig, DEFAULT_MAX_PDF_MB, DEFAULT_TIMEOUT_SECS};

const USAGE: &str = "Usage: pdf-quiz <PDF_URL>";

fn build_cli() -> Command {
    Command::new("pdf-quiz")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse multiple-choice questions out of a PDF into JSON")
        .long_about(
            "Downloads a PDF, extracts its text and parses every block of the form\n\
            \n\
            1. Question\n\
            a) ...\n\
            b) ...\n\
            c) ...\n\
            d) ...\n\
            Answer: x)\n\
            \n\
            into {\"data\": [...]} JSON on stdout. With --handler, reads one\n\
            {\"body\": \"{\\\"pdfUrl\\\": ...}\"} event per line from stdin instead.",
        )
        .arg(
            Arg::new("pdf-url")
                .value_name("PDF_URL")
                .help("URL of the PDF to parse")
                .conflicts_with("handler")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("handler")
                .long("handler")
                .help("Serve newline-delimited request events from stdin")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("HTTP timeout in seconds [env: PDF_QUIZ_TIMEOUT_SECS]")
                .value_parser(clap::value_parser!(u64))
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("max-pdf-mb")
                .long("max-pdf-mb")
                .value_name("MB")
                .help("Largest PDF accepted, in MiB [env: PDF_QUIZ_MAX_PDF_MB]")
                .value_parser(clap::value_parser!(u64))
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("user-agent")
                .long("user-agent")
                .value_name("UA")
                .help("User-Agent header for downloads [env: PDF_QUIZ_USER_AGENT]")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("compact")
                .long("compact")
                .help("Print single-line JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log errors")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Flag value first, then the looked-up environment variable, then the default.
fn u64_setting<F>(matches: &ArgMatches, arg: &str, var: &str, default: u64, lookup: &F) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = matches.get_one::<u64>(arg) {
        return *value;
    }
    match lookup(var) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: not a number, using {}", var, raw, default);
            default
        }),
        None => default,
    }
}

fn fetch_config_with<F>(matches: &ArgMatches, lookup: F) -> FetchConfig
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = FetchConfig::default();

    let timeout = u64_setting(
        matches,
        "timeout",
        "PDF_QUIZ_TIMEOUT_SECS",
        DEFAULT_TIMEOUT_SECS,
        &lookup,
    );
    let max_pdf_mb = u64_setting(
        matches,
        "max-pdf-mb",
        "PDF_QUIZ_MAX_PDF_MB",
        DEFAULT_MAX_PDF_MB,
        &lookup,
    );
    let user_agent = matches
        .get_one::<String>("user-agent")
        .cloned()
        .or_else(|| lookup("PDF_QUIZ_USER_AGENT"))
        .unwrap_or(defaults.user_agent);

    FetchConfig {
        timeout: Duration::from_secs(timeout),
        max_pdf_bytes: max_pdf_mb.saturating_mul(1024 * 1024),
        user_agent,
    }
}

fn fetch_config(matches: &ArgMatches) -> FetchConfig {
    fetch_config_with(matches, |var| env::var(var).ok())
}

fn init_tracing(quiet: bool) {
    // stdout carries the JSON result, so logs go to stderr
    let default_level = if quiet { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// What the process prints to stdout and the status it exits with.
#[derive(Debug)]
struct CliOutcome {
    stdout: String,
    exit_code: i32,
}

impl CliOutcome {
    fn usage() -> Self {
        Self {
            stdout: Envelope::error(USAGE).to_json(),
            exit_code: 1,
        }
    }

    fn envelope(envelope: &Envelope, compact: bool) -> Self {
        let stdout = if compact {
            envelope.to_json()
        } else {
            envelope.to_pretty_json()
        };
        Self {
            stdout,
            exit_code: if envelope.is_error() { 1 } else { 0 },
        }
    }
}

/// Parses the command line. Help and version requests come back as an
/// outcome with exit code 0; any other clap error is a usage error.
fn parse_args<I, T>(args: I) -> Result<ArgMatches, CliOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    build_cli().try_get_matches_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => CliOutcome {
            stdout: e.to_string(),
            exit_code: 0,
        },
        _ => CliOutcome::usage(),
    })
}

/// Command-line mode: one URL in, one envelope out.
async fn run_cli(matches: &ArgMatches, downloader: &Downloader) -> CliOutcome {
    let compact = matches.get_flag("compact");
    let Some(pdf_url) = matches.get_one::<String>("pdf-url") else {
        return CliOutcome::usage();
    };

    let envelope = pipeline::run_to_envelope(downloader, pdf_url).await;
    CliOutcome::envelope(&envelope, compact)
}

fn finish(outcome: CliOutcome) -> ! {
    println!("{}", outcome.stdout.trim_end());
    process::exit(outcome.exit_code);
}

#[tokio::main]
async fn main() {
    let matches = match parse_args(env::args_os()) {
        Ok(matches) => matches,
        Err(outcome) => finish(outcome),
    };

    init_tracing(matches.get_flag("quiet"));

    let compact = matches.get_flag("compact");
    let config = fetch_config(&matches);
    info!(
        timeout_secs = config.timeout.as_secs(),
        max_pdf_bytes = config.max_pdf_bytes,
        "Configuration loaded"
    );

    let downloader = match Downloader::new(&config) {
        Ok(downloader) => downloader,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            finish(CliOutcome::envelope(&Envelope::error(e.to_string()), compact));
        }
    };

    if matches.get_flag("handler") {
        let handler = QuizHandler::new(downloader);
        let mut transport = StdioTransport::stdio();
        if let Err(e) = handler::server::serve(&handler, &mut transport).await {
            error!("Handler stopped: {}", e);
            process::exit(1);
        }
        return;
    }

    finish(run_cli(&matches, &downloader).await);
}

#[cfg(test)]
mod tests {
    use super::{build_cli, fetch_config_with, parse_args, run_cli, CliOutcome};
    use crate::utils::download::test_server::{http_response, serve_raw};
    use crate::utils::download::{Downloader, FetchConfig};
    use clap::error::ErrorKind;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn usage_json() -> serde_json::Value {
        json!({"error": "Usage: pdf-quiz <PDF_URL>"})
    }

    fn stdout_json(outcome: &CliOutcome) -> serde_json::Value {
        serde_json::from_str(&outcome.stdout).unwrap()
    }

    fn downloader() -> Downloader {
        Downloader::new(&FetchConfig::default()).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn accepts_exactly_one_url() {
        let matches = build_cli()
            .try_get_matches_from(["pdf-quiz", "https://example.com/q.pdf"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("pdf-url").map(String::as_str),
            Some("https://example.com/q.pdf")
        );
    }

    #[test]
    fn rejects_extra_positional_arguments() {
        let err = build_cli()
            .try_get_matches_from(["pdf-quiz", "a", "b"])
            .unwrap_err();
        assert!(!matches!(
            err.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        ));
    }

    #[test]
    fn handler_mode_conflicts_with_url() {
        assert!(build_cli()
            .try_get_matches_from(["pdf-quiz", "--handler", "https://example.com/q.pdf"])
            .is_err());
    }

    #[test]
    fn two_urls_print_usage_and_exit_1() {
        let outcome = parse_args(["pdf-quiz", "https://a/1.pdf", "https://b/2.pdf"]).unwrap_err();
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(stdout_json(&outcome), usage_json());
    }

    #[test]
    fn unknown_flag_prints_usage_and_exit_1() {
        let outcome = parse_args(["pdf-quiz", "--frobnicate", "https://a/1.pdf"]).unwrap_err();
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.stdout, r#"{"error":"Usage: pdf-quiz <PDF_URL>"}"#);
    }

    #[test]
    fn help_is_not_a_usage_error() {
        let outcome = parse_args(["pdf-quiz", "--help"]).unwrap_err();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("PDF_URL"));
    }

    #[tokio::test]
    async fn missing_url_prints_usage_and_exit_1() {
        let matches = parse_args(["pdf-quiz"]).unwrap();
        let outcome = run_cli(&matches, &downloader()).await;
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(stdout_json(&outcome), usage_json());
    }

    #[tokio::test]
    async fn download_404_prints_error_and_exits_non_zero() {
        let url = serve_raw(http_response("404 Not Found", "text/html", b"")).await;
        let matches = parse_args(["pdf-quiz", url.as_str()]).unwrap();
        let outcome = run_cli(&matches, &downloader()).await;
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(
            stdout_json(&outcome),
            json!({"error": "Failed to download PDF: 404"})
        );
        assert!(outcome.stdout.contains("\n    \"error\""));
    }

    #[tokio::test]
    async fn compact_flag_prints_one_line() {
        let url = serve_raw(http_response("404 Not Found", "text/html", b"")).await;
        let matches = parse_args(["pdf-quiz", "--compact", url.as_str()]).unwrap();
        let outcome = run_cli(&matches, &downloader()).await;
        assert_eq!(outcome.stdout, r#"{"error":"Failed to download PDF: 404"}"#);
    }

    #[test]
    fn flags_override_defaults() {
        let matches = parse_args([
            "pdf-quiz",
            "--timeout",
            "5",
            "--max-pdf-mb",
            "2",
            "--user-agent",
            "quiz-bot",
            "https://example.com/q.pdf",
        ])
        .unwrap();
        let config = fetch_config_with(&matches, env_of(&[]));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_pdf_bytes, 2 * 1024 * 1024);
        assert_eq!(config.user_agent, "quiz-bot");
    }

    #[test]
    fn environment_fills_in_missing_flags() {
        let matches = parse_args(["pdf-quiz", "https://example.com/q.pdf"]).unwrap();
        let config = fetch_config_with(
            &matches,
            env_of(&[
                ("PDF_QUIZ_TIMEOUT_SECS", "7"),
                ("PDF_QUIZ_MAX_PDF_MB", " 3 "),
                ("PDF_QUIZ_USER_AGENT", "env-agent"),
            ]),
        );
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.max_pdf_bytes, 3 * 1024 * 1024);
        assert_eq!(config.user_agent, "env-agent");
    }

    #[test]
    fn flags_win_over_environment() {
        let matches = parse_args([
            "pdf-quiz",
            "--timeout",
            "9",
            "--user-agent",
            "flag-agent",
            "https://example.com/q.pdf",
        ])
        .unwrap();
        let config = fetch_config_with(
            &matches,
            env_of(&[
                ("PDF_QUIZ_TIMEOUT_SECS", "7"),
                ("PDF_QUIZ_USER_AGENT", "env-agent"),
            ]),
        );
        assert_eq!(config.timeout, Duration::from_secs(9));
        assert_eq!(config.user_agent, "flag-agent");
    }

    #[test]
    fn non_numeric_environment_falls_back_to_default() {
        let matches = parse_args(["pdf-quiz", "https://example.com/q.pdf"]).unwrap();
        let config = fetch_config_with(
            &matches,
            env_of(&[("PDF_QUIZ_TIMEOUT_SECS", "soon"), ("PDF_QUIZ_MAX_PDF_MB", "-1")]),
        );
        assert_eq!(config, FetchConfig::default());
    }
}
