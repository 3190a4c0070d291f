//! PRIORITY CLASSIFICATION
//!
//! Global (dataset-wide, not per-group) quantiles rank every system against
//! the whole national dataset:
//!
//!   High Priority     index >= q80(index)
//!   Moderate Priority index >= q50(index)
//!   Low Priority      otherwise
//!
//!   fragile_system = index >= q80(index) AND resilience <= q30(resilience)
//!
//! Records with a missing index are Low Priority and not fragile.

use super::StageReport;
use crate::config::PriorityParams;
use crate::record::{Priority, Record};
use crate::utils::stats::quantile;
use crate::utils::Groups;
use serde::Serialize;

/// Cutoffs computed over the full dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriorityCutoffs {
    pub high: f64,
    pub moderate: f64,
    /// Absent when no record has a resilience score
    pub fragile_resilience: Option<f64>,
}

impl PriorityCutoffs {
    /// `None` when no record has an `agro_stress_index`
    pub fn compute(records: &[Record], params: &PriorityParams) -> Option<Self> {
        let index = || records.iter().map(|r| r.derived.agro_stress_index);
        let high = quantile(index(), params.high_quantile)?;
        let moderate = quantile(index(), params.moderate_quantile)?;
        let fragile_resilience = quantile(
            records.iter().map(|r| r.derived.resilience_score),
            params.fragile_resilience_quantile,
        );
        Some(Self {
            high,
            moderate,
            fragile_resilience,
        })
    }

    pub fn classify(&self, index: Option<f64>) -> Priority {
        match index {
            Some(i) if i >= self.high => Priority::High,
            Some(i) if i >= self.moderate => Priority::Moderate,
            _ => Priority::Low,
        }
    }

    pub fn is_fragile(&self, index: Option<f64>, resilience: Option<f64>) -> bool {
        match (index, resilience, self.fragile_resilience) {
            (Some(i), Some(r), Some(cut)) => i >= self.high && r <= cut,
            _ => false,
        }
    }
}

/// Write `intervention_priority` and `fragile_system`; returns the cutoffs used
pub fn add_priority_classification(
    records: &mut [Record],
    params: &PriorityParams,
    by_system: &Groups,
) -> (Option<PriorityCutoffs>, StageReport) {
    let cutoffs = PriorityCutoffs::compute(records, params);
    if cutoffs.is_none() {
        tracing::warn!("No agro_stress_index values; every record classified Low Priority");
    }

    for record in records.iter_mut() {
        let d = &mut record.derived;
        let (priority, fragile) = match &cutoffs {
            Some(c) => (
                c.classify(d.agro_stress_index),
                c.is_fragile(d.agro_stress_index, d.resilience_score),
            ),
            None => (Priority::Low, false),
        };
        d.intervention_priority = Some(priority);
        d.fragile_system = Some(i32::from(fragile));
    }

    let report = StageReport::new("priority", records, by_system, |r| {
        r.derived.intervention_priority.is_none()
    });
    (cutoffs, report)
}
