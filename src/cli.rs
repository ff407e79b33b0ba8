//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// CatReport - data-quality reports for open-data catalogues
///
/// Run reports like datasets-without-tags or broken resource links against
/// a catalogue snapshot, and render them as Markdown, JSON or CSV.
///
/// Examples:
///   catreport --list
///   catreport tagless-datasets --snapshot catalogue.json
///   catreport broken-links --organization health --format csv -o broken.csv
///   catreport --all --output-dir reports
///   catreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Report to generate (see --list for registered names)
    ///
    /// Not required with --list, --all or --init-config.
    #[arg(value_name = "REPORT")]
    pub report: Option<String>,

    /// Catalogue snapshot file to load
    ///
    /// Defaults to catalogue.json, or the path in .catreport.toml.
    #[arg(short, long, value_name = "FILE", env = "CATREPORT_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Restrict the report to one organization (by short name)
    #[arg(long, value_name = "NAME")]
    pub organization: Option<String>,

    /// Include datasets of descendant organizations
    ///
    /// Only meaningful together with --organization.
    #[arg(long)]
    pub include_sub_organizations: bool,

    /// Output file path; prints to stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json, csv)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .catreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List registered reports and exit
    #[arg(long)]
    pub list: bool,

    /// Pre-render every option combination of every report
    ///
    /// Writes one file per report and organization under --output-dir.
    #[arg(long, conflicts_with = "report")]
    pub all: bool,

    /// Directory where --all writes rendered reports
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Fail with exit code 2 when the broken-links report finds anything
    ///
    /// Useful for CI pipelines watching a catalogue's health.
    #[arg(long)]
    pub fail_on_broken: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .catreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// CSV format (table only)
    Csv,
}

impl OutputFormat {
    /// File extension used when writing to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.report.is_none() && !self.list && !self.all {
            return Err(
                "No report given. Name one (see --list), or use --all to render everything."
                    .to_string(),
            );
        }

        if self.include_sub_organizations && self.organization.is_none() {
            return Err(
                "--include-sub-organizations is only meaningful with --organization".to_string(),
            );
        }

        if self.organization.is_some() && self.all {
            return Err("--all renders every organization; drop --organization".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            report: Some("tagless-datasets".to_string()),
            snapshot: None,
            organization: None,
            include_sub_organizations: false,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            list: false,
            all: false,
            output_dir: None,
            fail_on_broken: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_requires_a_report() {
        let mut args = make_args();
        args.report = None;
        assert!(args.validate().is_err());

        args.list = true;
        assert!(args.validate().is_ok());

        args.list = false;
        args.all = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_sub_organizations_need_an_organization() {
        let mut args = make_args();
        args.include_sub_organizations = true;
        assert!(args.validate().is_err());

        args.organization = Some("alpha".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert_eq!(OutputFormat::Csv.extension(), "csv");
    }
}
