//! JSON output of trend reports for dashboard consumers.
//!
//! # Output Structure
//!
//! Reports are grouped by the last day of their range:
//! ```text
//! output_dir/
//! └── 2025-05-31/
//!     └── trends_2025-05-01_2025-05-31.json
//! ```

use crate::trends::TrendReport;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`TrendReport`] below `output_dir` and return the file path.
///
/// Creates the dated directory when needed. An existing report for the same
/// range is overwritten.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_report(
    report: &TrendReport,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let meta = &report.analysis_metadata;
    let full_dir = output_dir.join(meta.end_date.to_string());

    info!(dir = %full_dir.display(), "Ensuring report directory exists");
    if let Err(e) = fs::create_dir_all(&full_dir).await {
        error!(dir = %full_dir.display(), error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = full_dir.join(format!("trends_{}_{}.json", meta.start_date, meta.end_date));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote trend report");

    Ok(path)
}
