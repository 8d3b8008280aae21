use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use finder_core::{
    BulkKind, BulkOptions, ConfidenceMode, FindRequest, VerifyRequest, DEFAULT_API_BASE,
    DEFAULT_MAX_RESULTS,
};

use crate::platform::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "email-finder")]
#[command(about = "Find and verify email addresses through an Email Finder backend")]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = "EMAIL_FINDER_API_URL", default_value = DEFAULT_API_BASE)]
    pub api_url: String,

    /// Where downloaded bulk results are saved.
    #[arg(long, global = true, env = "EMAIL_FINDER_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Log requests and poll ticks.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Guess and check addresses for one person at a domain.
    Find(FindArgs),
    /// Verify a single address.
    Verify(VerifyArgs),
    /// Upload a CSV as a bulk job and follow it to completion.
    Bulk(BulkArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Confidence {
    Balanced,
    Aggressive,
}

impl From<Confidence> for ConfidenceMode {
    fn from(value: Confidence) -> Self {
        match value {
            Confidence::Balanced => ConfidenceMode::Balanced,
            Confidence::Aggressive => ConfidenceMode::Aggressive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CsvKind {
    /// Rows of first_name, last_name, domain.
    Find,
    /// Rows of email addresses.
    Verify,
}

impl From<CsvKind> for BulkKind {
    fn from(kind: CsvKind) -> Self {
        match kind {
            CsvKind::Find => BulkKind::Find,
            CsvKind::Verify => BulkKind::Verify,
        }
    }
}

/// Speed and strictness switches shared by every command.
#[derive(Debug, Clone, Args)]
pub struct ModeArgs {
    /// Skip the slower checks.
    #[arg(long)]
    pub fast: bool,

    #[arg(long, value_enum, default_value_t = Confidence::Balanced)]
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Args)]
pub struct FindArgs {
    #[arg(long, value_parser = non_blank)]
    pub first_name: String,

    #[arg(long, value_parser = non_blank)]
    pub last_name: String,

    #[arg(long, value_parser = non_blank)]
    pub domain: String,

    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_results: u32,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_patterns: Option<u32>,

    /// Only try the patterns from --patterns-file.
    #[arg(long)]
    pub no_default_patterns: bool,

    /// File with one custom pattern per line, e.g. {first}.{last}.
    #[arg(long)]
    pub patterns_file: Option<PathBuf>,

    #[command(flatten)]
    pub mode: ModeArgs,
}

impl FindArgs {
    pub fn to_request(&self) -> anyhow::Result<FindRequest> {
        let mut request = FindRequest::new(&self.first_name, &self.last_name, &self.domain);
        request.max_results = self.max_results;
        request.max_patterns = self.max_patterns;
        request.include_default_patterns = !self.no_default_patterns;
        request.fast_mode = self.mode.fast;
        request.confidence_mode = self.mode.confidence.into();

        if let Some(path) = &self.patterns_file {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading patterns file {}", path.display()))?;
            request = request.with_custom_patterns_text(&raw);
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    #[arg(value_parser = non_blank)]
    pub email: String,

    #[command(flatten)]
    pub mode: ModeArgs,
}

impl VerifyArgs {
    pub fn to_request(&self) -> VerifyRequest {
        VerifyRequest {
            email: self.email.clone(),
            fast_mode: self.mode.fast,
            confidence_mode: self.mode.confidence.into(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BulkArgs {
    #[arg(long, value_enum)]
    pub kind: CsvKind,

    /// CSV file to upload.
    pub file: PathBuf,

    /// Save the results file once the job completes.
    #[arg(long)]
    pub download: bool,

    #[command(flatten)]
    pub mode: ModeArgs,
}

impl BulkArgs {
    pub fn options(&self) -> BulkOptions {
        BulkOptions {
            fast_mode: self.mode.fast,
            confidence_mode: self.mode.confidence.into(),
        }
    }
}

fn non_blank(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["email-finder"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("arguments parse")
    }

    #[test]
    fn find_defaults_match_the_form() {
        let cli = parse(&[
            "find",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--domain",
            "example.com",
        ]);
        let Command::Find(args) = cli.command else {
            panic!("expected find");
        };
        let request = args.to_request().unwrap();
        assert_eq!(request, FindRequest::new("Ada", "Lovelace", "example.com"));
        assert_eq!(request.max_results, 2);
        assert!(request.include_default_patterns);
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.log, LogTarget::Terminal);
    }

    #[test]
    fn find_reads_patterns_file_and_switches() {
        let mut patterns = tempfile::NamedTempFile::new().unwrap();
        writeln!(patterns, "{{first}}.{{last}}\n\n  {{f}}{{last}}  ").unwrap();
        let path = patterns.path().to_str().unwrap().to_string();

        let cli = parse(&[
            "find",
            "--first-name",
            " Ada ",
            "--last-name",
            "Lovelace",
            "--domain",
            "example.com",
            "--max-results",
            "5",
            "--max-patterns",
            "10",
            "--no-default-patterns",
            "--fast",
            "--confidence",
            "aggressive",
            "--patterns-file",
            &path,
        ]);
        let Command::Find(args) = cli.command else {
            panic!("expected find");
        };
        let request = args.to_request().unwrap();
        assert_eq!(request.first_name, "Ada");
        assert_eq!(request.max_results, 5);
        assert_eq!(request.max_patterns, Some(10));
        assert!(!request.include_default_patterns);
        assert!(request.fast_mode);
        assert_eq!(request.confidence_mode, ConfidenceMode::Aggressive);
        assert_eq!(
            request.custom_patterns,
            Some(vec!["{first}.{last}".to_string(), "{f}{last}".to_string()])
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = Cli::try_parse_from([
            "email-finder",
            "find",
            "--first-name",
            "  ",
            "--last-name",
            "Lovelace",
            "--domain",
            "example.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_max_results_is_rejected() {
        let result = Cli::try_parse_from([
            "email-finder",
            "find",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--domain",
            "example.com",
            "--max-results",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn verify_takes_positional_email() {
        let cli = parse(&["verify", "ada@example.com", "--fast"]);
        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        let request = args.to_request();
        assert_eq!(request.email, "ada@example.com");
        assert!(request.fast_mode);
        assert_eq!(request.confidence_mode, ConfidenceMode::Balanced);
    }

    #[test]
    fn bulk_needs_kind_and_file() {
        assert!(Cli::try_parse_from(["email-finder", "bulk", "people.csv"]).is_err());

        let cli = parse(&[
            "--api-url",
            "http://backend:9000",
            "bulk",
            "--kind",
            "verify",
            "emails.csv",
            "--download",
            "--confidence",
            "aggressive",
        ]);
        assert_eq!(cli.api_url, "http://backend:9000");
        let Command::Bulk(args) = cli.command else {
            panic!("expected bulk");
        };
        assert_eq!(BulkKind::from(args.kind), BulkKind::Verify);
        assert_eq!(args.file, PathBuf::from("emails.csv"));
        assert!(args.download);
        assert_eq!(
            args.options(),
            BulkOptions {
                fast_mode: false,
                confidence_mode: ConfidenceMode::Aggressive,
            }
        );
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["email-finder", "-v", "-q", "verify", "a@example.com"]);
        assert!(result.is_err());
    }
}
