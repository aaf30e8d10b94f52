//! Row-major report tables for ANOVA output.
//!
//! The two tables mirror what an export layer writes as separate sheets:
//! per-group information and the ANOVA source table.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::anova::AnovaReport;

/// Sheet name for the per-group table.
pub const GROUP_INFO_SHEET: &str = "Group Info";
/// Sheet name for the ANOVA source table.
pub const ANOVA_RESULTS_SHEET: &str = "ANOVA Results";

/// A single report cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportCell {
    Text(String),
    Integer(usize),
    Float(f64),
    /// Not applicable for this row.
    Empty,
}

impl ReportCell {
    fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }

    /// Console rendering: four decimals, scientific notation for tiny values.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Empty => String::new(),
        }
    }

    /// CSV rendering keeps full precision.
    fn raw(&self) -> String {
        match self {
            Self::Float(f) => f.to_string(),
            other => other.display(),
        }
    }
}

fn format_float(value: f64) -> String {
    if value != 0.0 && value.abs() < 1e-4 {
        format!("{value:.4e}")
    } else {
        format!("{value:.4}")
    }
}

/// Named table with a header row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ReportCell>>,
}

impl ReportTable {
    /// One JSON object per row, keyed by header.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(h, cell)| (h.clone(), serde_json::to_value(cell).unwrap_or(Value::Null)))
                    .collect();
                Value::Object(record)
            })
            .collect()
    }

    /// Writes the header and rows as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(ReportCell::raw))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Column-aligned text lines; the first line is the header.
    pub fn render_lines(&self) -> Vec<String> {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ReportCell::display).collect())
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |values: &[String]| {
            values
                .iter()
                .zip(&widths)
                .map(|(v, &w)| format!("{v:^w$}"))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        std::iter::once(line(&self.headers))
            .chain(cells.iter().map(|row| line(row)))
            .collect()
    }
}

impl AnovaReport {
    /// Per-group table: `Group, Size, Sum, Mean`.
    pub fn group_info_table(&self) -> ReportTable {
        ReportTable {
            name: GROUP_INFO_SHEET.to_string(),
            headers: ["Group", "Size", "Sum", "Mean"].map(String::from).to_vec(),
            rows: self
                .groups
                .iter()
                .map(|g| {
                    vec![
                        ReportCell::Text(g.name.clone()),
                        ReportCell::Integer(g.size),
                        ReportCell::Float(g.sum),
                        ReportCell::Float(g.mean),
                    ]
                })
                .collect(),
        }
    }

    /// Source-of-variation table with `Treatments`, `Error` and `Total` rows.
    pub fn anova_table(&self) -> ReportTable {
        use ReportCell::{Empty, Float, Integer};
        let r = &self.result;
        let decision = if r.reject_null { "Yes" } else { "No" };

        ReportTable {
            name: ANOVA_RESULTS_SHEET.to_string(),
            headers: [
                "Source of Variation",
                "Degrees of Freedom",
                "Sum of Squares",
                "Mean Square",
                "F-Statistic",
                "P-value",
                "Significance (α)",
                "Reject H0?",
            ]
            .map(String::from)
            .to_vec(),
            rows: vec![
                vec![
                    ReportCell::text("Treatments"),
                    Integer(r.df.treatment),
                    Float(r.ss.treatment),
                    Float(r.ms_treatment),
                    Float(r.f_statistic),
                    Float(r.p_value),
                    Float(r.alpha),
                    ReportCell::text(decision),
                ],
                vec![
                    ReportCell::text("Error"),
                    Integer(r.df.error),
                    Float(r.ss.error),
                    Float(r.ms_error),
                    Empty,
                    Empty,
                    Empty,
                    Empty,
                ],
                vec![
                    ReportCell::text("Total"),
                    Integer(r.df.total),
                    Float(r.ss.total),
                    Empty,
                    Empty,
                    Empty,
                    Empty,
                    Empty,
                ],
            ],
        }
    }

    /// Both tables as a JSON object keyed by sheet name.
    pub fn workbook_json(&self) -> Value {
        let mut book = Map::new();
        for table in [self.group_info_table(), self.anova_table()] {
            book.insert(table.name.clone(), Value::Array(table.to_records()));
        }
        Value::Object(book)
    }
}
