//! Synthetic ANOVA data generator.
//!
//! Produces one column of normally distributed observations per treatment,
//! with targets derived from the digits of a birthdate (day `d1 d2`, month
//! `m1 m2`, two-digit year `y1 y2`):
//!
//! - treatments: `max(4, d1 + d2)`
//! - target std: `(m2 * d2) / y2`
//! - target mean of treatment `i` (1-based): `m2 * d2 + i * y2`
//!
//! A sample whose mean or std misses its target by more than the tolerance
//! gets a single affine rescale onto the targets. The rescale is not
//! repeated; the rounded result may still sit outside the tolerance.

#![allow(clippy::cast_precision_loss)]

use std::io::Write;

use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::{AnovaError, Result};
use crate::stats::{mean, round_half_even, sample_std, SampleStats, Tolerance};

/// Minimum number of treatments regardless of the day digits.
pub const MIN_TREATMENTS: usize = 4;

/// Parameters for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub d1: u8,
    pub d2: u8,
    pub m1: u8,
    pub m2: u8,
    pub y1: u8,
    pub y2: u8,
    /// Observations per treatment.
    pub replications: usize,
    pub tolerance: Tolerance,
    /// Decimal places kept after rounding.
    pub num_decimals: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            d1: 1,
            d2: 0,
            m1: 0,
            m2: 3,
            y1: 2,
            y2: 4,
            replications: 25,
            tolerance: Tolerance::default(),
            num_decimals: 2,
        }
    }
}

impl GeneratorConfig {
    /// Splits a day (1..=31), month (1..=12) and two-digit year into digits.
    ///
    /// The remaining parameters keep their defaults.
    pub fn from_birthdate(day: u8, month: u8, year: u8) -> Result<Self> {
        if !(1..=31).contains(&day) {
            return Err(AnovaError::configuration(format!(
                "day must be between 1 and 31, got {day}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(AnovaError::configuration(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if year > 99 {
            return Err(AnovaError::configuration(format!(
                "year must be given as two digits (0-99), got {year}"
            )));
        }
        Ok(Self {
            d1: day / 10,
            d2: day % 10,
            m1: month / 10,
            m2: month % 10,
            y1: year / 10,
            y2: year % 10,
            ..Self::default()
        })
    }

    /// Rejects invalid parameters before any sampling happens.
    pub fn validate(&self) -> Result<()> {
        let digits = [
            ("d1", self.d1),
            ("d2", self.d2),
            ("m1", self.m1),
            ("m2", self.m2),
            ("y1", self.y1),
            ("y2", self.y2),
        ];
        if let Some((name, digit)) = digits.iter().find(|(_, d)| *d > 9) {
            return Err(AnovaError::configuration(format!(
                "{name} must be a single digit (0-9), got {digit}"
            )));
        }
        if self.replications < 1 {
            return Err(AnovaError::configuration(
                "replications must be at least 1",
            ));
        }
        for (name, tol) in [("mean", self.tolerance.mean), ("std", self.tolerance.std)] {
            if !tol.is_finite() || tol < 0.0 {
                return Err(AnovaError::configuration(format!(
                    "{name} tolerance must be a non-negative number, got {tol}"
                )));
            }
        }
        self.target_std().map(|_| ())
    }

    /// `max(4, d1 + d2)`.
    pub fn num_treatments(&self) -> usize {
        MIN_TREATMENTS.max(usize::from(self.d1) + usize::from(self.d2))
    }

    /// `(m2 * d2) / y2`; fails when `y2` is zero.
    pub fn target_std(&self) -> Result<f64> {
        if self.y2 == 0 {
            return Err(AnovaError::configuration(
                "the second year digit is 0, so the target standard deviation (m2 * d2) / y2 is undefined",
            ));
        }
        Ok(f64::from(self.m2) * f64::from(self.d2) / f64::from(self.y2))
    }

    /// Target mean of the 1-based treatment `index`.
    pub fn target_mean(&self, index: usize) -> f64 {
        f64::from(self.m2) * f64::from(self.d2) + index as f64 * f64::from(self.y2)
    }
}

/// Observations for one treatment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticColumn {
    pub name: String,
    pub target: SampleStats,
    /// Whether the affine correction was applied.
    pub rescaled: bool,
    pub values: Vec<f64>,
}

/// One column per treatment, in treatment order.
///
/// [`generate`] produces equal-length columns; tables assembled by hand may
/// be ragged, in which case short columns read as missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticTable {
    pub columns: Vec<SyntheticColumn>,
    pub num_decimals: u32,
}

impl SyntheticTable {
    /// Number of rows, i.e. the length of the longest column.
    pub fn replications(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of row `index` across all columns, `None` where a column is
    /// shorter than `index + 1`.
    pub fn row(&self, index: usize) -> Vec<Option<f64>> {
        self.columns
            .iter()
            .map(|c| c.values.get(index).copied())
            .collect()
    }

    /// Writes a header row and the observations, formatted to the table's
    /// decimal precision.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let decimals = self.num_decimals as usize;
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;
        for i in 0..self.replications() {
            wtr.write_record(
                self.row(i)
                    .iter()
                    .map(|v| v.map_or_else(String::new, |v| format!("{v:.decimals$}"))),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Draws a synthetic table for `config` from `rng`.
pub fn generate<R>(config: &GeneratorConfig, rng: &mut R) -> Result<SyntheticTable>
where
    R: Rng + ?Sized,
{
    config.validate()?;
    let target_std = config.target_std()?;

    let mut columns = Vec::with_capacity(config.num_treatments());
    for i in 1..=config.num_treatments() {
        let target = SampleStats {
            mean: config.target_mean(i),
            std: target_std,
        };
        let (values, rescaled) = draw_treatment(config, &target, rng)?;
        columns.push(SyntheticColumn {
            name: format!("Treatment_{i}"),
            target,
            rescaled,
            values,
        });
    }

    Ok(SyntheticTable {
        columns,
        num_decimals: config.num_decimals,
    })
}

fn draw_treatment<R>(
    config: &GeneratorConfig,
    target: &SampleStats,
    rng: &mut R,
) -> Result<(Vec<f64>, bool)>
where
    R: Rng + ?Sized,
{
    let normal = Normal::new(target.mean, target.std).map_err(|e| {
        AnovaError::configuration(format!(
            "cannot sample N({}, {}): {e}",
            target.mean, target.std
        ))
    })?;
    let mut values: Vec<f64> = (0..config.replications)
        .map(|_| rng.sample(normal))
        .collect();

    let sample_mean = mean(&values).unwrap_or(target.mean);
    let sample_std = sample_std(&values);
    let rescaled = config
        .tolerance
        .is_violated(sample_mean, sample_std, target);

    if rescaled {
        match sample_std.filter(|s| *s > 0.0) {
            Some(s) => {
                for x in &mut values {
                    *x = (*x - sample_mean) / s * target.std + target.mean;
                }
            }
            // No spread to standardize: recentre only.
            None => {
                for x in &mut values {
                    *x = *x - sample_mean + target.mean;
                }
            }
        }
    }

    for x in &mut values {
        *x = round_half_even(*x, config.num_decimals);
    }
    Ok((values, rescaled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn config(day: u8, month: u8, year: u8) -> GeneratorConfig {
        GeneratorConfig::from_birthdate(day, month, year).unwrap()
    }

    #[test]
    fn birthdate_digits() {
        let c = config(29, 7, 3);
        assert_eq!((c.d1, c.d2, c.m1, c.m2, c.y1, c.y2), (2, 9, 0, 7, 0, 3));
        assert_eq!(c.num_treatments(), 11);
        assert!((c.target_std().unwrap() - 21.0).abs() < f64::EPSILON);
        assert!((c.target_mean(1) - 66.0).abs() < f64::EPSILON);
        assert!((c.target_mean(11) - 96.0).abs() < f64::EPSILON);
    }

    #[test]
    fn at_least_four_treatments() {
        let c = config(10, 3, 24);
        assert_eq!(c.num_treatments(), 4);
        let table = generate(&c, &mut Pcg64::seed_from_u64(1)).unwrap();
        assert_eq!(table.columns.len(), 4);
        assert_eq!(
            table.headers(),
            vec!["Treatment_1", "Treatment_2", "Treatment_3", "Treatment_4"]
        );
        assert!(table.columns.iter().all(|col| col.values.len() == 25));
    }

    #[test]
    fn same_seed_same_table() {
        let c = config(15, 6, 98);
        let a = generate(&c, &mut Pcg64::seed_from_u64(42)).unwrap();
        let b = generate(&c, &mut Pcg64::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decimals_only_change_rounding() {
        let mut c = config(15, 6, 98);
        let two = generate(&c, &mut Pcg64::seed_from_u64(7)).unwrap();
        c.num_decimals = 0;
        let zero = generate(&c, &mut Pcg64::seed_from_u64(7)).unwrap();

        for (a, b) in two.columns.iter().zip(&zero.columns) {
            assert_eq!(a.target, b.target);
            assert_eq!(a.rescaled, b.rescaled);
            for (x, y) in a.values.iter().zip(&b.values) {
                assert!((x - y).abs() <= 0.505);
                assert!((y - y.round()).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn zero_tolerance_forces_rescale_onto_targets() {
        let mut c = config(12, 4, 15);
        c.tolerance = Tolerance { mean: 0.0, std: 0.0 };
        c.num_decimals = 8;
        let table = generate(&c, &mut Pcg64::seed_from_u64(3)).unwrap();
        for col in &table.columns {
            assert!(col.rescaled);
            let m = mean(&col.values).unwrap();
            let s = sample_std(&col.values).unwrap();
            assert!((m - col.target.mean).abs() < 1e-6);
            assert!((s - col.target.std).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_year_digit_fails_before_sampling() {
        let c = config(12, 4, 20);
        let err = generate(&c, &mut Pcg64::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, AnovaError::Configuration(_)));
    }

    #[test]
    fn zero_replications_rejected() {
        let mut c = config(12, 4, 15);
        c.replications = 0;
        assert!(matches!(
            c.validate().unwrap_err(),
            AnovaError::Configuration(_)
        ));
    }

    #[test]
    fn invalid_digits_and_dates_rejected() {
        let mut c = GeneratorConfig::default();
        c.m2 = 12;
        assert!(c.validate().is_err());
        assert!(GeneratorConfig::from_birthdate(32, 1, 1).is_err());
        assert!(GeneratorConfig::from_birthdate(1, 13, 1).is_err());
        assert!(GeneratorConfig::from_birthdate(1, 1, 100).is_err());
    }

    #[test]
    fn single_replication_recentres() {
        let mut c = config(12, 4, 15);
        c.replications = 1;
        c.tolerance = Tolerance { mean: 0.0, std: 0.0 };
        let table = generate(&c, &mut Pcg64::seed_from_u64(9)).unwrap();
        for col in &table.columns {
            assert_eq!(col.values.len(), 1);
            assert!((col.values[0] - col.target.mean).abs() < 1e-9);
        }
    }

    #[test]
    fn csv_uses_fixed_decimals() {
        let mut c = config(10, 3, 24);
        c.replications = 2;
        let table = generate(&c, &mut Pcg64::seed_from_u64(5)).unwrap();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Treatment_1,Treatment_2,Treatment_3,Treatment_4");
        for cell in lines[1].split(',') {
            assert_eq!(cell.split('.').nth(1).map(str::len), Some(2));
        }
    }

    #[test]
    fn ragged_columns_write_empty_cells() {
        let column = |name: &str, values: Vec<f64>| SyntheticColumn {
            name: name.to_string(),
            target: SampleStats {
                mean: 0.0,
                std: 1.0,
            },
            rescaled: false,
            values,
        };
        let table = SyntheticTable {
            columns: vec![
                column("A", vec![1.0, 2.0, 3.0]),
                column("B", vec![4.5]),
                column("C", vec![]),
            ],
            num_decimals: 1,
        };
        assert_eq!(table.replications(), 3);
        assert_eq!(table.row(1), vec![Some(2.0), None, None]);

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "A,B,C\n1.0,4.5,\n2.0,,\n3.0,,\n");
    }
}
