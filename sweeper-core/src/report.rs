// Report generation from a finished sweep

use crate::sweep::SweepReport;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use sweeper_scanner::model::FailedPage;
use sweeper_scanner::result::CrawlResult;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub sweep_id: String,
    pub seed: String,
    pub output_dir: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_seconds: i64,
    pub pages_mirrored: usize,
    pub assets_stored: usize,
    pub failed_pages: Vec<FailedPage>,
    pub working: Vec<String>,
    pub broken: Vec<BrokenLink>,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    pub reason: String,
}

pub fn gather_report_data(report: &SweepReport) -> ReportData {
    let outcome = &report.outcome;

    let working = outcome.audit.working().map(|e| e.url.clone()).collect();
    let broken = outcome
        .audit
        .broken()
        .filter_map(|e| match &e.result {
            CrawlResult::Broken { reason } => Some(BrokenLink {
                url: e.url.clone(),
                reason: reason.clone(),
            }),
            CrawlResult::Working => None,
        })
        .collect();

    ReportData {
        sweep_id: report.id.clone(),
        seed: outcome.seed.clone(),
        output_dir: report.output_dir.display().to_string(),
        started_at: report.started_at.to_rfc3339(),
        finished_at: report.finished_at.to_rfc3339(),
        duration_seconds: (report.finished_at - report.started_at).num_seconds(),
        pages_mirrored: outcome.mirror.pages.len(),
        assets_stored: outcome.mirror.resources.len(),
        failed_pages: outcome.mirror.failed.clone(),
        working,
        broken,
    }
}

impl ReportData {
    pub fn working_count(&self) -> usize {
        self.working.len()
    }

    pub fn broken_count(&self) -> usize {
        self.broken.len()
    }

    /// One-line summary printed at the end of every sweep.
    pub fn summary_line(&self) -> String {
        format!(
            "Finished! {} working, {} broken links",
            self.working_count(),
            self.broken_count()
        )
    }
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => Ok(generate_json_report(data)?),
        ReportFormat::Csv => generate_csv_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("\n                            SITE SWEEP REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Sweep ID:     {}\n", data.sweep_id));
    report.push_str(&format!("Seed:         {}\n", data.seed));
    report.push_str(&format!("Output:       {}\n", data.output_dir));
    report.push_str(&format!("Started:      {}\n", data.started_at));
    report.push_str(&format!("Duration:     {} seconds\n", data.duration_seconds));
    report.push_str(&format!("Pages Saved:  {}\n", data.pages_mirrored));
    report.push_str(&format!("Assets:       {}\n", data.assets_stored));
    report.push('\n');

    if !data.failed_pages.is_empty() {
        report.push_str(RULE);
        report.push_str("\nPAGES NOT MIRRORED\n");
        report.push_str(RULE);
        report.push_str("\n\n");
        for page in &data.failed_pages {
            report.push_str(&format!("  ✗ {}  ({})\n", page.url, page.reason));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push_str("\nLINK AUDIT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    if data.broken.is_empty() {
        report.push_str("  No broken links.\n");
    } else {
        for link in &data.broken {
            report.push_str(&format!("  ✗ {}  ({})\n", link.url, link.reason));
        }
    }
    report.push('\n');

    report.push_str(&data.summary_line());
    report.push('\n');
    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sweeper",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "sweep": {
                "id": data.sweep_id,
                "seed": data.seed,
                "output_dir": data.output_dir,
                "start_time": data.started_at,
                "end_time": data.finished_at,
                "duration_seconds": data.duration_seconds
            },
            "summary": {
                "pages_mirrored": data.pages_mirrored,
                "assets_stored": data.assets_stored,
                "failed_pages": data.failed_pages.len(),
                "working": data.working_count(),
                "broken": data.broken_count()
            },
            "failed_pages": data.failed_pages,
            "working": data.working,
            "broken": data.broken
        }
    });

    serde_json::to_string_pretty(&json_report)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    status: &'static str,
    reason: &'a str,
}

/// One row per audited URL: `url,status,reason`.
pub fn generate_csv_report(data: &ReportData) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for url in &data.working {
        writer.serialize(CsvRow {
            url,
            status: "working",
            reason: "",
        })?;
    }
    for link in &data.broken {
        writer.serialize(CsvRow {
            url: &link.url,
            status: "broken",
            reason: &link.reason,
        })?;
    }
    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("# Site Sweep Report\n\n");
    report.push_str("| | |\n|---|---|\n");
    report.push_str(&format!("| Sweep ID | `{}` |\n", data.sweep_id));
    report.push_str(&format!("| Seed | {} |\n", data.seed));
    report.push_str(&format!("| Output | `{}` |\n", data.output_dir));
    report.push_str(&format!("| Duration | {} seconds |\n", data.duration_seconds));
    report.push_str(&format!("| Pages saved | {} |\n", data.pages_mirrored));
    report.push_str(&format!("| Assets | {} |\n\n", data.assets_stored));

    if !data.failed_pages.is_empty() {
        report.push_str("## Pages not mirrored\n\n");
        for page in &data.failed_pages {
            report.push_str(&format!("- {} ({})\n", page.url, markdown_escape(&page.reason)));
        }
        report.push('\n');
    }

    report.push_str("## Broken links\n\n");
    if data.broken.is_empty() {
        report.push_str("None.\n\n");
    } else {
        report.push_str("| URL | Reason |\n|---|---|\n");
        for link in &data.broken {
            report.push_str(&format!(
                "| {} | {} |\n",
                markdown_escape(&link.url),
                markdown_escape(&link.reason)
            ));
        }
        report.push('\n');
    }

    report.push_str(&format!("**{}**\n", data.summary_line()));
    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn markdown_escape(value: &str) -> String {
    value.replace('|', "\\|")
}
