//! Stress Pipeline - coordinator for the enrichment chain
//!
//! Threads the record collection through the engines in a fixed order:
//!
//!   nutrient -> climate -> disease -> yield -> composite -> priority
//!
//! The pipeline takes ownership of the records for the duration of a run and
//! hands them back inside `EnrichedDataset`. Each stage finishes over the full
//! dataset before the next begins; only work inside a stage is parallel.

use crate::analysis::confidence::{attach_confidence, threshold_sweep, GroupConfidence, ThresholdRecall};
use crate::config::ScoringConfig;
use crate::error::PipelineError;
use crate::metrics::{
    add_climate_features, add_decision_support_features, add_disease_risk, add_nutrient_features,
    add_priority_classification, add_yield_features, PriorityCutoffs, RuleBook, StageReport,
};
use crate::record::{DiseaseRule, Record};
use crate::utils::Groups;
use anyhow::Result;

/// Main stress pipeline
pub struct StressPipeline {
    config: ScoringConfig,
    rules: RuleBook,
}

/// Records after the enrichment chain, with the artifacts of the run
#[derive(Debug, Clone)]
pub struct EnrichedDataset {
    pub records: Vec<Record>,
    pub cutoffs: Option<PriorityCutoffs>,
    pub reports: Vec<StageReport>,
    by_system: Groups,
}

impl EnrichedDataset {
    /// Wrap records whose derived columns are already filled (e.g. loaded from CSV)
    pub fn from_records(records: Vec<Record>) -> Self {
        let by_system = Groups::by_system(&records);
        Self {
            records,
            cutoffs: None,
            reports: Vec::new(),
            by_system,
        }
    }

    /// (state, crop) groups, each ordered by year
    pub fn systems(&self) -> &Groups {
        &self.by_system
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StressPipeline {
    /// Initialize the pipeline with a validated configuration and rule table
    pub fn new(config: ScoringConfig, rules: &[DiseaseRule]) -> Result<Self> {
        config.validate()?;
        let rules = RuleBook::new(rules);
        tracing::debug!(
            "Stress pipeline: {} disease rules over {} crops",
            rules.n_rules(),
            rules.n_crops()
        );
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Run the enrichment chain
    pub fn run(&self, mut records: Vec<Record>) -> Result<EnrichedDataset> {
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset("no records to score".into()).into());
        }

        let by_crop = Groups::by_crop(&records);
        let by_system = Groups::by_system(&records);
        tracing::info!(
            "Scoring {} records ({} crops, {} state-crop systems)",
            records.len(),
            by_crop.len(),
            by_system.len()
        );

        let mut reports = Vec::with_capacity(6);
        reports.push(add_nutrient_features(&mut records, &by_crop));
        reports.push(add_climate_features(
            &mut records,
            &by_system,
            &by_crop,
            &self.config.climate,
        ));
        reports.push(add_disease_risk(&mut records, &self.rules, &by_crop));
        reports.push(add_yield_features(&mut records, &by_system, &by_crop));
        reports.push(add_decision_support_features(
            &mut records,
            &self.config.weights,
            &by_system,
        ));
        let (cutoffs, priority_report) =
            add_priority_classification(&mut records, &self.config.priority, &by_system);
        reports.push(priority_report);

        if let Some(c) = &cutoffs {
            tracing::info!(
                "Priority cutoffs: high >= {:.4}, moderate >= {:.4}, fragile resilience <= {:?}",
                c.high,
                c.moderate,
                c.fragile_resilience
            );
        }

        Ok(EnrichedDataset {
            records,
            cutoffs,
            reports,
            by_system,
        })
    }

    /// Score predictive recall per system and attach it to every record
    pub fn evaluate_confidence(&self, dataset: &mut EnrichedDataset) -> Vec<GroupConfidence> {
        let summaries = attach_confidence(
            &mut dataset.records,
            &dataset.by_system,
            &self.config.confidence,
        );
        tracing::info!(
            "Confidence evaluated for {} systems at threshold {:.2}",
            summaries.len(),
            self.config.confidence.low_yield_threshold
        );
        summaries
    }

    /// Enrichment chain followed by the confidence columns
    pub fn run_with_confidence(&self, records: Vec<Record>) -> Result<(EnrichedDataset, Vec<GroupConfidence>)> {
        let mut dataset = self.run(records)?;
        let confidence = self.evaluate_confidence(&mut dataset);
        Ok((dataset, confidence))
    }

    /// Recall at each configured sweep threshold
    pub fn threshold_sweep(&self, dataset: &EnrichedDataset) -> Vec<ThresholdRecall> {
        threshold_sweep(
            &dataset.records,
            &dataset.by_system,
            &self.config.confidence.sweep_thresholds,
        )
    }
}
