//! Export derived series and scored results.
//!
//! Series go to one CSV each (`date,<name>`) for charting; the scored run goes
//! to a pretty-printed JSON document.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app::pipeline::ScoredRun;
use crate::domain::{IndicatorKind, Series};
use crate::error::AppError;
use crate::indicators::MarketSnapshot;

/// Write one series as `date,<name>` rows.
pub fn write_series_csv(path: &Path, series: &Series) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "date,{}", series.name())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for p in series.points() {
        writeln!(file, "{},{:.10}", p.date, p.value)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[derive(Serialize)]
struct ResultsDocument<'a> {
    tool: &'static str,
    percentiles: std::collections::BTreeMap<&'static str, f64>,
    #[serde(flatten)]
    run: &'a ScoredRun,
}

/// Write the scored run as JSON.
pub fn write_results_json(path: &Path, run: &ScoredRun) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &results_document(run))
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;
    Ok(())
}

/// Render the scored run as a JSON string (for `--json` output).
pub fn results_json(run: &ScoredRun) -> Result<String, AppError> {
    serde_json::to_string_pretty(&results_document(run))
        .map_err(|e| AppError::new(2, format!("Failed to serialize results: {e}")))
}

fn results_document(run: &ScoredRun) -> ResultsDocument<'_> {
    ResultsDocument {
        tool: "squeeze",
        percentiles: run.percentiles(),
        run,
    }
}

/// Write all four indicator series plus `indicators.json` into `dir`.
///
/// Returns the written paths.
pub fn export_all(dir: &Path, snapshot: &MarketSnapshot, run: &ScoredRun) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mut written = Vec::new();
    for kind in IndicatorKind::ALL {
        let series = snapshot.series(kind);
        let path = dir.join(format!("{}.csv", series.name()));
        write_series_csv(&path, series)?;
        written.push(path);
    }

    let path = dir.join("indicators.json");
    write_results_json(&path, run)?;
    written.push(path);

    Ok(written)
}
