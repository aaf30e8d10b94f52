//! CSV and JSON persistence.
//!
//! Reads raw tables from delimited files and writes generated data and
//! report exports. Output files are written to a temporary file in the
//! target directory and persisted only once complete.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::anova::AnovaReport;
use crate::error::AnovaError;
use crate::generator::SyntheticTable;
use crate::types::{Cell, RawTable};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Reads every record of a CSV source as raw text cells.
///
/// The first row is not treated specially; header handling belongs to
/// ingestion. Rows may have differing lengths.
pub fn read_raw_table_from<R: Read>(reader: R) -> Result<RawTable, AnovaError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record =
            record.map_err(|e| AnovaError::input(format!("Unable to read row {}: {e}", i + 1)))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(RawTable::new(rows))
}

/// Reads a CSV file into a [`RawTable`].
pub fn read_raw_table(path: &Path) -> Result<RawTable, AnovaError> {
    let file = File::open(path).map_err(|e| {
        AnovaError::input(format!("Unable to read CSV {}: {e}", path.display()))
    })?;
    read_raw_table_from(BufReader::new(file)).map_err(|e| match e {
        AnovaError::Input(msg) => AnovaError::input(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// `{prefix}_anova_data_{timestamp}.csv`
pub fn synthetic_file_name(prefix: &str, at: &DateTime<Local>) -> String {
    format!("{prefix}_anova_data_{}.csv", at.format(TIMESTAMP_FORMAT))
}

/// `ANOVA_{timestamp}`, the stem shared by report exports.
pub fn report_stem(at: &DateTime<Local>) -> String {
    format!("ANOVA_{}", at.format(TIMESTAMP_FORMAT))
}

/// Writes `contents` to `path` through a temporary sibling file.
fn write_atomically<F>(path: &Path, contents: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    contents(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Writes a generated table into `dir` under the standard file name.
pub fn write_synthetic_table(
    dir: &Path,
    prefix: &str,
    table: &SyntheticTable,
    at: &DateTime<Local>,
) -> Result<PathBuf> {
    let path = dir.join(synthetic_file_name(prefix, at));
    write_atomically(&path, |file| {
        table.write_csv(file).context("Failed to write CSV data")
    })?;
    Ok(path)
}

/// Writes both report tables as `{stem}_group_info.csv` and
/// `{stem}_anova_results.csv`.
pub fn export_report_csv(
    dir: &Path,
    report: &AnovaReport,
    at: &DateTime<Local>,
) -> Result<Vec<PathBuf>> {
    let stem = report_stem(at);
    let mut written = Vec::new();
    for (suffix, table) in [
        ("group_info", report.group_info_table()),
        ("anova_results", report.anova_table()),
    ] {
        let path = dir.join(format!("{stem}_{suffix}.csv"));
        write_atomically(&path, |file| {
            table
                .write_csv(file)
                .with_context(|| format!("Failed to write sheet {}", table.name))
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Writes the two-sheet JSON workbook to `path`.
pub fn export_report_json(path: &Path, report: &AnovaReport) -> Result<()> {
    write_atomically(path, |file| {
        serde_json::to_writer_pretty(file, &report.workbook_json())?;
        Ok(())
    })
}
