//! One-way fixed-effects ANOVA.
//!
//! Decomposes total variation into treatment and error components using the
//! correction-factor form:
//!
//! 1. `C = (ΣX)² / n`
//! 2. `SST = ΣX² - C`
//! 3. `SSTR = Σ(ΣXᵢ)² / nᵢ - C`
//! 4. `SSE = SST - SSTR`
//! 5. `F = [SSTR / (p - 1)] / [SSE / (n - p)]`
//!
//! Steps 2-4 are evaluated on values shifted by the grand mean, which leaves
//! every sum of squares unchanged and keeps large common offsets from
//! cancelling out the within-group variation. `C` is reported for the data as
//! given.
//!
//! The p-value is the upper tail of the F-distribution with `(p - 1, n - p)`
//! degrees of freedom.

#![allow(clippy::cast_precision_loss)]

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::error::{AnovaError, Result};
use crate::ingest::TOO_FEW_GROUPS;
use crate::types::{Group, GroupSummary};

/// Significance level used when none (or an unparsable one) is supplied.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Formula labels for the five computation steps.
pub const STEP_LABELS: [&str; 5] = [
    "Step 1: C = (ΣX)² / n  (Correction Factor)",
    "Step 2: SST = Σ(X²) - C  (Total SS)",
    "Step 3: SSTR = Σ((ΣXᵢ)² / nᵢ) - C  (Treatment SS)",
    "Step 4: SSE = SST - SSTR  (Error SS)",
    "Step 5: F = [SSTR/(p−1)] / [SSE/(n−p)]",
];

/// Parses a significance level, silently falling back to [`DEFAULT_ALPHA`].
///
/// Absent input, text that is not a float, and non-finite values all yield
/// `0.05`. This is the only place the pipeline substitutes a default instead
/// of failing.
#[must_use]
pub fn parse_alpha(input: Option<&str>) -> f64 {
    input
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|a| a.is_finite())
        .unwrap_or(DEFAULT_ALPHA)
}

/// Degrees of freedom per source of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DegreesOfFreedom {
    pub treatment: usize,
    pub error: usize,
    pub total: usize,
}

/// Sums of squares per source of variation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SumsOfSquares {
    pub treatment: f64,
    pub error: f64,
    pub total: f64,
}

/// Outcome of a one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaResult {
    pub correction_factor: f64,
    pub df: DegreesOfFreedom,
    pub ss: SumsOfSquares,
    pub ms_treatment: f64,
    pub ms_error: f64,
    pub f_statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    /// `p_value < alpha`.
    pub reject_null: bool,
}

/// One labelled intermediate value of the computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Step {
    pub label: &'static str,
    pub value: f64,
}

impl AnovaResult {
    /// The five computation steps paired with their values.
    pub fn steps(&self) -> [Step; 5] {
        let values = [
            self.correction_factor,
            self.ss.total,
            self.ss.treatment,
            self.ss.error,
            self.f_statistic,
        ];
        std::array::from_fn(|i| Step {
            label: STEP_LABELS[i],
            value: values[i],
        })
    }
}

/// Group summaries together with the ANOVA table values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaReport {
    pub groups: Vec<GroupSummary>,
    pub result: AnovaResult,
}

/// Runs a one-way ANOVA over `groups` at significance level `alpha`.
pub fn compute_anova(groups: &[Group], alpha: f64) -> Result<AnovaReport> {
    if groups.len() < 2 {
        return Err(AnovaError::validation(TOO_FEW_GROUPS));
    }
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(AnovaError::validation(format!(
            "Group '{}' has no numeric values",
            empty.name
        )));
    }

    let summaries: Vec<GroupSummary> = groups.iter().map(Group::summary).collect();

    let p = groups.len();
    let n: usize = summaries.iter().map(|s| s.size).sum();
    if n <= p {
        return Err(AnovaError::computation(format!(
            "no error degrees of freedom ({n} observations in {p} groups); \
             at least one group needs a second observation"
        )));
    }

    let total_sum: f64 = summaries.iter().map(|s| s.sum).sum();
    let correction_factor = total_sum.powi(2) / n as f64;

    // Steps 2-4 run on values centred on the grand mean. The sums of squares
    // are unchanged by the shift and ΣX² no longer cancels against C.
    let centred = CentredSums::new(groups, total_sum / n as f64);
    let ss_total = centred.squares - centred.correction_factor(n);
    let ss_treatment = centred
        .group_sums
        .iter()
        .zip(&summaries)
        .map(|(sum, s)| sum.powi(2) / s.size as f64)
        .sum::<f64>()
        - centred.correction_factor(n);
    let ss_error = ss_total - ss_treatment;

    let df = DegreesOfFreedom {
        treatment: p - 1,
        error: n - p,
        total: n - 1,
    };

    if ss_error <= n as f64 * f64::EPSILON * ss_total {
        return Err(AnovaError::computation(
            "error mean square is zero (no variation within groups); F is undefined",
        ));
    }

    let ms_treatment = ss_treatment / df.treatment as f64;
    let ms_error = ss_error / df.error as f64;
    let f_statistic = ms_treatment / ms_error;

    let p_value = f_upper_tail(f_statistic, df)?;

    Ok(AnovaReport {
        groups: summaries,
        result: AnovaResult {
            correction_factor,
            df,
            ss: SumsOfSquares {
                treatment: ss_treatment,
                error: ss_error,
                total: ss_total,
            },
            ms_treatment,
            ms_error,
            f_statistic,
            p_value,
            alpha,
            reject_null: p_value < alpha,
        },
    })
}

/// Per-group and total sums of values shifted by a common constant.
struct CentredSums {
    group_sums: Vec<f64>,
    squares: f64,
}

impl CentredSums {
    fn new(groups: &[Group], shift: f64) -> Self {
        let group_sums = groups
            .iter()
            .map(|g| g.values().iter().map(|x| x - shift).sum())
            .collect();
        let squares = groups
            .iter()
            .flat_map(|g| g.values().iter().map(|x| (x - shift).powi(2)))
            .sum();
        Self {
            group_sums,
            squares,
        }
    }

    fn correction_factor(&self, n: usize) -> f64 {
        self.group_sums.iter().sum::<f64>().powi(2) / n as f64
    }
}

/// Upper-tail probability of the F-distribution at `f`.
fn f_upper_tail(f: f64, df: DegreesOfFreedom) -> Result<f64> {
    let dist = FisherSnedecor::new(df.treatment as f64, df.error as f64)
        .map_err(|e| AnovaError::computation(format!("invalid F-distribution: {e}")))?;
    let p = dist.sf(f.max(0.0));
    if p.is_finite() {
        Ok(p.clamp(0.0, 1.0))
    } else {
        Err(AnovaError::computation(format!(
            "p-value is undefined for F = {f}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn groups(data: &[(&str, &[f64])]) -> Vec<Group> {
        data.iter()
            .map(|(name, values)| Group::new(*name, values.to_vec()).unwrap())
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn well_separated_groups() {
        let g = groups(&[
            ("A", &[1.0, 2.0, 3.0]),
            ("B", &[5.0, 6.0, 7.0]),
            ("C", &[9.0, 10.0, 11.0]),
        ]);
        let report = compute_anova(&g, 0.05).unwrap();
        let r = &report.result;

        assert!(close(r.correction_factor, 324.0));
        assert!(close(r.ss.total, 102.0));
        assert!(close(r.ss.treatment, 96.0));
        assert!(close(r.ss.error, 6.0));
        assert_eq!(
            r.df,
            DegreesOfFreedom {
                treatment: 2,
                error: 6,
                total: 8
            }
        );
        assert!(close(r.ms_treatment, 48.0));
        assert!(close(r.ms_error, 1.0));
        assert!(close(r.f_statistic, 48.0));
        // For df1 = 2 the tail is (1 + F·df1/df2)^(-df2/2) = 17^-3.
        assert!((r.p_value - 1.0 / 4913.0).abs() < 1e-10);
        assert!(r.reject_null);
    }

    #[test]
    fn large_common_offset_keeps_precision() {
        let g = groups(&[
            ("A", &[10000.01, 10000.02, 10000.03]),
            ("B", &[10000.05, 10000.06, 10000.07]),
        ]);
        let r = compute_anova(&g, 0.05).unwrap().result;
        assert!((r.f_statistic - 24.0).abs() < 1e-6);
        assert!((r.ss.treatment - 0.0024).abs() < 1e-9);
        assert!((r.ss.error - 0.0004).abs() < 1e-9);
        assert!(close(r.correction_factor, 60000.24f64.powi(2) / 6.0));
        assert!(r.reject_null);

        for offset in [1e3, 1e6, 1e9] {
            let shifted = groups(&[
                ("A", &[offset + 1.0, offset + 2.0, offset + 3.0]),
                ("B", &[offset + 5.0, offset + 6.0, offset + 7.0]),
            ]);
            let r = compute_anova(&shifted, 0.05).unwrap().result;
            assert!((r.f_statistic - 24.0).abs() < 1e-6, "offset {offset}");
        }
    }

    #[test]
    fn summaries_follow_group_order() {
        let g = groups(&[("X", &[1.0, 3.0]), ("Y", &[2.0, 4.0, 6.0])]);
        let report = compute_anova(&g, 0.05).unwrap();
        let names: Vec<&str> = report.groups.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
        assert_eq!(report.groups[1].size, 3);
        assert!(close(report.groups[1].mean, 4.0));
    }

    #[test]
    fn sums_of_squares_decompose_with_unequal_sizes() {
        let g = groups(&[
            ("A", &[3.2, 4.1, 5.7, 2.2]),
            ("B", &[6.5, 7.25, 5.0]),
            ("C", &[1.0, 9.5, 4.4, 3.3, 8.8]),
        ]);
        let r = compute_anova(&g, 0.05).unwrap().result;

        let pooled: Vec<f64> = g.iter().flat_map(|g| g.values().to_vec()).collect();
        let grand = pooled.iter().sum::<f64>() / pooled.len() as f64;
        let direct_sst: f64 = pooled.iter().map(|x| (x - grand).powi(2)).sum();

        assert!((direct_sst - (r.ss.treatment + r.ss.error)).abs() <= 1e-9 * direct_sst);
        assert_eq!(r.df.total, r.df.treatment + r.df.error);
    }

    #[test]
    fn identical_groups_fail_with_zero_error_variance() {
        let g = groups(&[("A", &[4.0, 4.0, 4.0]), ("B", &[4.0, 4.0, 4.0])]);
        let err = compute_anova(&g, 0.05).unwrap_err();
        assert!(matches!(err, AnovaError::Computation(_)));
    }

    #[test]
    fn constant_groups_with_distinct_means_fail() {
        let g = groups(&[("A", &[1.0, 1.0]), ("B", &[2.0, 2.0])]);
        let err = compute_anova(&g, 0.05).unwrap_err();
        assert!(matches!(err, AnovaError::Computation(_)));
    }

    #[test]
    fn single_observation_groups_have_no_error_df() {
        let g = groups(&[("A", &[1.0]), ("B", &[2.0])]);
        let err = compute_anova(&g, 0.05).unwrap_err();
        assert!(matches!(err, AnovaError::Computation(_)));
    }

    #[test]
    fn fewer_than_two_groups_rejected() {
        let g = groups(&[("A", &[1.0, 2.0])]);
        let err = compute_anova(&g, 0.05).unwrap_err();
        assert_eq!(err.to_string(), TOO_FEW_GROUPS);
    }

    #[test]
    fn equal_means_do_not_reject() {
        let g = groups(&[("A", &[1.0, 2.0, 3.0]), ("B", &[3.0, 2.0, 1.0])]);
        let r = compute_anova(&g, 0.05).unwrap().result;
        assert!(r.f_statistic.abs() < 1e-9);
        assert!(r.p_value > 0.99);
        assert!(!r.reject_null);
    }

    #[test]
    fn decision_uses_strict_inequality() {
        let g = groups(&[
            ("A", &[1.0, 2.0, 3.0]),
            ("B", &[5.0, 6.0, 7.0]),
            ("C", &[9.0, 10.0, 11.0]),
        ]);
        let r = compute_anova(&g, 0.05).unwrap().result;
        let at_p = compute_anova(&g, r.p_value).unwrap().result;
        assert!(!at_p.reject_null);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn alpha_parsing() {
        assert!((parse_alpha(None) - 0.05).abs() < f64::EPSILON);
        assert!((parse_alpha(Some("abc")) - 0.05).abs() < f64::EPSILON);
        assert!((parse_alpha(Some("")) - 0.05).abs() < f64::EPSILON);
        assert!((parse_alpha(Some("nan")) - 0.05).abs() < f64::EPSILON);
        assert_eq!(parse_alpha(Some("0.01")), 0.01);
        assert_eq!(parse_alpha(Some(" 0.1 ")), 0.1);
    }

    #[test]
    fn steps_follow_formula_order() {
        let g = groups(&[
            ("A", &[1.0, 2.0, 3.0]),
            ("B", &[5.0, 6.0, 7.0]),
            ("C", &[9.0, 10.0, 11.0]),
        ]);
        let r = compute_anova(&g, 0.05).unwrap().result;
        let steps = r.steps();
        assert!(steps[0].label.starts_with("Step 1"));
        assert!(close(steps[0].value, 324.0));
        assert!(close(steps[3].value, 6.0));
        assert!(close(steps[4].value, 48.0));
    }
}
