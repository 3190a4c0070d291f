//! Stress engines
//!
//! Each engine adds its columns to every record and never removes rows. They
//! run in the order listed here; no engine reads a column written by a later one.

pub mod nutrient_stress;
pub mod climate_stress;
pub mod disease_risk;
pub mod yield_stability;
pub mod composite;
pub mod priority;

// Re-export engine entry points
pub use nutrient_stress::{add_nutrient_features, nutrient_deficit};
pub use climate_stress::add_climate_features;
pub use disease_risk::{add_disease_risk, count_matching_rules, RuleBook};
pub use yield_stability::add_yield_features;
pub use composite::add_decision_support_features;
pub use priority::{add_priority_classification, PriorityCutoffs};

use crate::record::Record;
use crate::utils::Groups;
use serde::Serialize;

/// Summary of one stage, used for logging and run reports
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub rows: usize,
    pub groups: usize,
    /// Rows whose headline output is missing
    pub missing: usize,
}

impl StageReport {
    pub fn new<F>(stage: &'static str, records: &[Record], groups: &Groups, is_missing: F) -> Self
    where
        F: Fn(&Record) -> bool,
    {
        let report = Self {
            stage,
            rows: records.len(),
            groups: groups.len(),
            missing: records.iter().filter(|r| is_missing(r)).count(),
        };
        tracing::debug!(
            "{}: {} rows across {} groups ({} missing)",
            report.stage,
            report.rows,
            report.groups,
            report.missing
        );
        report
    }
}
