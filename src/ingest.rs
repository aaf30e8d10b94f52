//! Ingestion and validation of raw tables.
//!
//! Turns a [`RawTable`] into named numeric [`Group`]s. Columns are coerced
//! independently: a cell that is not a finite number is dropped from its own
//! column only, and a column with no numeric cells is discarded.

use std::collections::HashMap;

use crate::error::{AnovaError, Result};
use crate::types::{Cell, Group, RawTable};

/// Message for a table with fewer than two numeric columns.
pub const TOO_FEW_COLUMNS: &str = "At least two columns must contain numeric data";
/// Message for fewer than two buildable groups.
pub const TOO_FEW_GROUPS: &str = "At least two groups are required for ANOVA";

/// Builds the groups for an analysis from a raw table.
///
/// With `has_index` the first column is split off before anything else.
/// With `has_header` the first remaining row names the columns and the index
/// column is discarded. Without a header, columns are named positionally as
/// `Group0, Group1, ...`; when an index column was split off it is put back
/// in front and named `Group0`, so the positional names always cover every
/// column of the file.
pub fn ingest(raw: &RawTable, has_header: bool, has_index: bool) -> Result<Vec<Group>> {
    let mut columns = to_columns(raw)?;

    let index = if has_index && !columns.is_empty() {
        Some(columns.remove(0))
    } else {
        None
    };

    let names = if has_header {
        let header: Vec<Cell> = columns
            .iter_mut()
            .map(|col| if col.is_empty() { Cell::Empty } else { col.remove(0) })
            .collect();
        header_names(&header, usize::from(index.is_some()))
    } else {
        if let Some(index) = index {
            columns.insert(0, index);
        }
        (0..columns.len()).map(|i| format!("Group{i}")).collect()
    };

    let numeric: Vec<(String, Vec<f64>)> = names
        .into_iter()
        .zip(columns)
        .map(|(name, cells)| {
            let values = cells.iter().filter_map(Cell::to_number).collect::<Vec<_>>();
            (name, values)
        })
        .filter(|(_, values)| !values.is_empty())
        .collect();

    if numeric.len() < 2 {
        return Err(AnovaError::validation(TOO_FEW_COLUMNS));
    }

    let groups = numeric
        .into_iter()
        .map(|(name, values)| Group::new(name, values))
        .collect::<Result<Vec<_>>>()?;

    if groups.len() < 2 {
        return Err(AnovaError::validation(TOO_FEW_GROUPS));
    }

    Ok(groups)
}

/// Transposes rows into columns, padding short rows with missing cells.
fn to_columns(raw: &RawTable) -> Result<Vec<Vec<Cell>>> {
    let Some(first) = raw.rows.first() else {
        return Err(AnovaError::input("The table has no rows"));
    };
    let width = first.len();

    let mut columns = vec![Vec::with_capacity(raw.rows.len()); width];
    for (i, row) in raw.rows.iter().enumerate() {
        if row.len() > width {
            return Err(AnovaError::input(format!(
                "Row {} has {} cells, expected at most {width}",
                i + 1,
                row.len()
            )));
        }
        for (j, column) in columns.iter_mut().enumerate() {
            column.push(row.get(j).cloned().unwrap_or(Cell::Empty));
        }
    }
    Ok(columns)
}

/// Names columns from a header row.
///
/// Blank labels become `Unnamed: {position}`, counting file columns from
/// `first_position`, and repeated labels get a `.1`, `.2`, ... suffix so
/// names stay unique.
fn header_names(header: &[Cell], first_position: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let label = cell.label();
            let base = if label.is_empty() {
                format!("Unnamed: {}", first_position + i)
            } else {
                label
            };
            let mut name = base.clone();
            while let Some(count) = seen.get_mut(&name) {
                *count += 1;
                name = format!("{base}.{count}");
            }
            seen.insert(name.clone(), 0);
            name
        })
        .collect()
}
