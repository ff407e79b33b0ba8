//! CatReport - data-quality reports for open-data catalogues
//!
//! A CLI tool that loads a catalogue snapshot and runs reports such as
//! datasets-without-tags and broken resource links, rendered as Markdown,
//! JSON or CSV.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (snapshot, config, report failure, etc.)
//!   2 - Broken links found with --fail-on-broken set

mod cli;
mod config;
mod error;
mod models;
mod render;
mod reports;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use render::ReportDocument;
use reports::{Registry, ReportInfo, ReportOptions, ReportOutput};
use std::path::{Path, PathBuf};
use store::MemoryStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        match handle_init_config() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("\n❌ Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    init_logging(&args);

    info!("CatReport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .catreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".catreport.toml");

    if path.exists() {
        anyhow::bail!(".catreport.toml already exists. Remove it first or edit it manually.");
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .catreport.toml")?;

    println!("✅ Created .catreport.toml with default settings.");
    println!("   Edit it to customize the snapshot path and output directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the requested operation. Returns the process exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let registry = Registry::with_builtin_reports();
    debug!("{} reports registered", registry.len());

    // --list needs no snapshot
    if args.list {
        println!("Registered reports:\n");
        for info in registry.iter() {
            println!("  {:<20} {}", info.name, info.description);
        }
        return Ok(0);
    }

    let snapshot_path = PathBuf::from(&config.snapshot.path);
    if !args.quiet {
        println!("📥 Loading catalogue snapshot: {}", snapshot_path.display());
    }
    let store = MemoryStore::load(&snapshot_path)?;

    if args.all {
        return run_all(&args, &config, &registry, &store);
    }

    run_single(&args, &registry, &store)
}

/// Generate, render and deliver a single report.
fn run_single(args: &Args, registry: &Registry, store: &MemoryStore) -> Result<i32> {
    let name = args.report.as_deref().unwrap_or_default();
    let info = registry.get(name)?;

    let options = ReportOptions {
        organization: args.organization.clone(),
        include_sub_organizations: args.include_sub_organizations,
    };

    info!("Generating report {} with {:?}", info.name, options);
    let output = (info.generate)(store, &options)?;
    let rendered = render_output(args.format, info, &options, &output)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Report written to: {}", path.display());
            }
        }
        None => {
            // The report itself is the output; keep it unadorned.
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(exit_code_for(args, info, &output))
}

/// Pre-render every option combination of every report into the output
/// directory, one file per combination.
fn run_all(
    args: &Args,
    config: &Config,
    registry: &Registry,
    store: &MemoryStore,
) -> Result<i32> {
    let output_dir = PathBuf::from(&config.general.output_dir);

    let mut plan: Vec<(&ReportInfo, Vec<ReportOptions>)> = Vec::new();
    for info in registry.iter() {
        let combinations = (info.option_combinations)(store)?;
        plan.push((info, combinations));
    }
    let total: usize = plan.iter().map(|(_, combos)| combos.len()).sum();

    if !args.quiet {
        println!(
            "📝 Pre-rendering {} report/option combinations into {}",
            total,
            output_dir.display()
        );
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut exit_code = 0;
    for (info, combinations) in plan {
        let report_dir = output_dir.join(info.name);
        std::fs::create_dir_all(&report_dir)
            .with_context(|| format!("Failed to create {}", report_dir.display()))?;

        for options in combinations {
            let stem = options
                .organization
                .as_deref()
                .unwrap_or("all-organizations");
            bar.set_message(format!("{}: {}", info.name, stem));

            let output = (info.generate)(store, &options)?;
            let rendered = render_output(args.format, info, &options, &output)?;

            let path = report_dir.join(format!("{}.{}", stem, args.format.extension()));
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            debug!("wrote {}", path.display());

            if options.organization.is_none() {
                exit_code = exit_code.max(exit_code_for(args, info, &output));
            }
            bar.inc(1);
        }
    }
    bar.finish_and_clear();

    if !args.quiet {
        println!("✅ Wrote {} reports to: {}", total, output_dir.display());
    }

    Ok(exit_code)
}

/// Render a generated report in the requested format.
fn render_output(
    format: OutputFormat,
    info: &ReportInfo,
    options: &ReportOptions,
    output: &ReportOutput,
) -> Result<String> {
    let doc = ReportDocument {
        name: info.name,
        description: info.description,
        options,
        output,
        generated_at: Utc::now(),
    };

    match format {
        OutputFormat::Markdown => Ok(render::to_markdown(&doc)),
        OutputFormat::Json => render::to_json(&doc),
        OutputFormat::Csv => Ok(render::to_csv(&doc)),
    }
}

/// Exit code 2 when --fail-on-broken is set and the broken-links report
/// found anything; 0 otherwise.
fn exit_code_for(args: &Args, info: &ReportInfo, output: &ReportOutput) -> i32 {
    if !args.fail_on_broken || info.name != "broken-links" {
        return 0;
    }

    match output.summary_count("num_broken_resources") {
        Some(broken) if broken > 0 => {
            eprintln!("\n⛔ {} broken resources found. Failing (exit code 2).", broken);
            2
        }
        _ => 0,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .catreport.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
