//! oneway-anova: one-way ANOVA on grouped data.
//!
//! Ingests a raw table into numeric groups, decomposes their variance into
//! treatment and error components, and tests the group means with an F-test.
//! A companion generator draws synthetic grouped data under target mean and
//! standard deviation constraints.

pub mod anova;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod report;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod types;
pub mod worker;

pub use anova::{compute_anova, parse_alpha, AnovaReport, AnovaResult};
pub use error::{AnovaError, Result};
pub use generator::{generate, GeneratorConfig, SyntheticTable};
pub use ingest::ingest;
pub use types::{Cell, Group, GroupSummary, RawTable};
