//! Analyses over the enriched dataset
//!
//! Nothing here writes engine columns except `attach_confidence`, which adds
//! the confidence columns after the enrichment chain has finished.

pub mod confidence;
pub mod summaries;

pub use confidence::{
    attach_confidence, compute_prediction_confidence, evaluate_threshold, threshold_sweep,
    GroupConfidence, ThresholdRecall,
};
pub use summaries::{
    crop_resilience_ranking, crop_stress_variability, most_fragile_systems, state_level_summary,
    stress_heatmap_matrix, system_summary, top_high_risk_systems, CropRanking, CropVariability,
    StateSummary, StressHeatmap, SystemSummary, SystemYear,
};
