//! Common types for oneway-anova.
//!
//! Defines the raw input table and the numeric groups built from it.

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

use crate::error::{AnovaError, Result};

/// A single cell as read from external storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Already-numeric value.
    Number(f64),
    /// Raw text, coerced on demand.
    Text(String),
    /// Blank or absent cell.
    Empty,
}

impl Cell {
    /// Builds a cell from raw text, mapping blank text to [`Cell::Empty`].
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(text.to_string())
        }
    }

    /// Coerces the cell to a finite number, or `None` if it is missing.
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Empty => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Renders the cell as a column label.
    pub fn label(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
            Self::Empty => String::new(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

/// Rectangular table of raw cells, one inner vector per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub const fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Number of columns, taken from the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A named sample of finite observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    values: Vec<f64>,
}

impl Group {
    /// Creates a group, rejecting empty samples and non-finite values.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(AnovaError::validation(format!(
                "Group '{name}' has no numeric values"
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnovaError::validation(format!(
                "Group '{name}' contains non-finite values"
            )));
        }
        Ok(Self { name, values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.values.iter().map(|x| x * x).sum()
    }

    pub fn summary(&self) -> GroupSummary {
        let sum = self.sum();
        GroupSummary {
            name: self.name.clone(),
            size: self.len(),
            sum,
            mean: sum / self.len() as f64,
        }
    }
}

/// Size, sum and mean of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub size: usize,
    pub sum: f64,
    pub mean: f64,
}
