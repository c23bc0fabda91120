use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use std::path::{Path, PathBuf};
use sweeper_core::config::{expand_path, load_config};
use sweeper_core::progress::ProgressDisplay;
use sweeper_core::report::{ReportFormat, gather_report_data, generate_report, save_report};
use sweeper_core::{SweepCoordinator, SweepOptions, SweepReport};
use sweeper_scanner::config::{AssetNaming, LinkResolution, ScopeMode};
use sweeper_scanner::persist::OutputTree;
use sweeper_scanner::{SweepConfig, SweepError};
use tracing::debug;

pub const EXIT_OK: i32 = 0;
pub const EXIT_BROKEN_LINKS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Defaults, then the `--config` file, then individual flags.
pub fn build_config(args: &ArgMatches) -> Result<SweepConfig> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => load_config(path).with_context(|| format!("Failed to load config {}", path))?,
        None => SweepConfig::default(),
    };

    if let Some(&max_pages) = args.get_one::<usize>("max-pages") {
        config.max_pages = (max_pages > 0).then_some(max_pages);
    }
    if let Some(&max_depth) = args.get_one::<usize>("max-depth") {
        config.max_depth = Some(max_depth);
    }
    if let Some(scope) = args.get_one::<String>("scope") {
        config.scope_mode = parse_scope_mode(scope)?;
    }
    if let Some(naming) = args.get_one::<String>("asset-naming") {
        config.asset_naming = parse_asset_naming(naming)?;
    }
    if let Some(base) = args.get_one::<String>("link-base") {
        config.link_resolution = parse_link_resolution(base)?;
    }
    if let Some(&ms) = args.get_one::<u64>("render-timeout") {
        config.render_timeout_ms = ms;
    }
    if let Some(&ms) = args.get_one::<u64>("resource-timeout") {
        config.resource_timeout_ms = ms;
    }
    if let Some(&ms) = args.get_one::<u64>("audit-timeout") {
        config.audit_timeout_ms = ms;
    }

    debug!("Effective config: {:?}", config);
    Ok(config)
}

pub fn sweep_options(args: &ArgMatches) -> Result<SweepOptions> {
    let seed = args
        .get_one::<String>("URL")
        .ok_or_else(|| anyhow!("Please enter a URL"))?;
    let output = args
        .get_one::<String>("output")
        .ok_or_else(|| anyhow!("No output directory given"))?;

    Ok(SweepOptions {
        seed: seed.clone(),
        output_dir: expand_path(output),
        config: build_config(args)?,
    })
}

pub fn parse_scope_mode(value: &str) -> Result<ScopeMode> {
    match value {
        "strict" => Ok(ScopeMode::Strict),
        "prefix" => Ok(ScopeMode::Prefix),
        other => Err(anyhow!("Unknown scope mode '{}'", other)),
    }
}

pub fn parse_asset_naming(value: &str) -> Result<AssetNaming> {
    match value {
        "hashed" => Ok(AssetNaming::Hashed),
        "segment" => Ok(AssetNaming::Segment),
        other => Err(anyhow!("Unknown asset naming '{}'", other)),
    }
}

pub fn parse_link_resolution(value: &str) -> Result<LinkResolution> {
    match value {
        "root" => Ok(LinkResolution::SiteRoot),
        "page" => Ok(LinkResolution::Page),
        other => Err(anyhow!("Unknown link base '{}'", other)),
    }
}

/// Exit status for a finished (or failed) sweep.
pub fn exit_code_for(result: &std::result::Result<SweepReport, SweepError>) -> i32 {
    match result {
        Ok(report) if report.broken_count() == 0 => EXIT_OK,
        Ok(_) => EXIT_BROKEN_LINKS,
        Err(_) => EXIT_ERROR,
    }
}

/// Path of the mirrored `index.html` under `output_dir`, if a sweep has written one.
pub fn locate_index(output_dir: &Path) -> Result<PathBuf> {
    let index = OutputTree::new(output_dir).index_path();
    if index.is_file() {
        Ok(index)
    } else {
        Err(anyhow!(
            "No mirror found at {} (run `sweeper sweep <URL>` first)",
            output_dir.display()
        ))
    }
}

fn print_error(e: impl std::fmt::Display) {
    eprintln!("{} {}", "✗".red().bold(), e);
}

pub async fn handle_sweep(args: &ArgMatches, quiet: bool) -> i32 {
    let options = match sweep_options(args) {
        Ok(options) => options,
        Err(e) => {
            print_error(format!("{:#}", e));
            return EXIT_ERROR;
        }
    };
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let report_path = args.get_one::<PathBuf>("report").cloned();

    if !quiet {
        println!("{} Sweeping {}", "→".blue(), options.seed.bright_white());
        println!("Output:     {}", options.output_dir.display());
        println!(
            "Scope:      {:?}, max pages {}, max depth {}\n",
            options.config.scope_mode,
            options
                .config
                .page_limit()
                .map_or("unlimited".to_string(), |n| n.to_string()),
            options
                .config
                .max_depth
                .map_or("unlimited".to_string(), |n| n.to_string()),
        );
    }

    let coordinator = SweepCoordinator::new();
    let mut handle = match coordinator.start(options) {
        Ok(handle) => handle,
        Err(e) => {
            print_error(e);
            return EXIT_ERROR;
        }
    };

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut display = ProgressDisplay::new(!quiet);
    while let Some(event) = handle.next_event().await {
        display.handle(&event);
    }
    display.finish();

    let result = handle.wait().await;
    let code = exit_code_for(&result);
    let report = match result {
        Ok(report) => report,
        Err(SweepError::Cancelled) => {
            print_error("Sweep cancelled");
            return code;
        }
        Err(e) => {
            print_error(format!("Sweep failed: {}", e));
            return code;
        }
    };

    if let Err(e) = emit_report(&report, format, report_path.as_deref()) {
        print_error(format!("{:#}", e));
        return EXIT_ERROR;
    }

    if !quiet {
        println!(
            "\n{} Mirror saved to {}",
            "✓".green().bold(),
            report.index_path().display()
        );
    }
    code
}

fn emit_report(report: &SweepReport, format: ReportFormat, path: Option<&Path>) -> Result<()> {
    let data = gather_report_data(report);
    let content = generate_report(&data, format).context("Failed to render report")?;

    match path {
        Some(path) => {
            save_report(&content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("{}", data.summary_line());
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn handle_open(args: &ArgMatches) -> i32 {
    let output = args
        .get_one::<String>("output")
        .map(|o| expand_path(o))
        .unwrap_or_default();

    match locate_index(&output) {
        Ok(index) => {
            println!("{}", index.display());
            EXIT_OK
        }
        Err(e) => {
            print_error(e);
            EXIT_ERROR
        }
    }
}
