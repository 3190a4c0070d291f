//! Prediction Confidence
//!
//! Retrospective check of the stress index as a low-yield predictor.
//!
//!   predicted_low_yield = agro_stress_index > threshold
//!   actual_low_yield    = yield < mean(yield) - std(yield)     per (state, crop)
//!   confidence_score    = correct_lows / max(actual_lows, 1)    per (state, crop)
//!
//! Groups with fewer than `small_sample_min_lows` actual lows have their score
//! multiplied by `small_sample_penalty`.

use crate::config::ConfidenceParams;
use crate::record::Record;
use crate::utils::stats::{mean, sample_std};
use crate::utils::{gather, Groups};
use serde::Serialize;

/// Confidence summary for one (state, crop) group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupConfidence {
    pub state: String,
    pub crop: String,
    /// Years with a recorded yield
    pub total_years: usize,
    pub predicted_lows: usize,
    pub actual_lows: usize,
    pub correct_lows: usize,
    pub confidence_score: f64,
}

/// Recall of the predictor at one threshold across the whole dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdRecall {
    pub threshold: f64,
    pub correct: usize,
    pub actual: usize,
    /// 0 when the dataset has no actual low-yield years
    pub recall: f64,
}

/// 1 where the stress index exceeds the threshold; a missing index predicts nothing
pub fn predicted_low_yield(records: &[Record], threshold: f64) -> Vec<i32> {
    records
        .iter()
        .map(|r| i32::from(r.derived.agro_stress_index.map_or(false, |i| i > threshold)))
        .collect()
}

/// 1 where yield falls more than one standard deviation below its group mean
///
/// Single-observation groups have no standard deviation and never flag.
pub fn actual_low_yield(records: &[Record], by_system: &Groups) -> Vec<i32> {
    let yields: Vec<Option<f64>> = records.iter().map(|r| r.crop_yield).collect();
    by_system.transform(|members| {
        let values = gather(&yields, members);
        let cutoff = mean(values.iter().copied())
            .zip(sample_std(values.iter().copied()))
            .map(|(m, s)| m - s);
        values
            .iter()
            .map(|y| match (*y, cutoff) {
                (Some(y), Some(c)) => i32::from(y < c),
                _ => 0,
            })
            .collect()
    })
}

/// Recall with the zero-denominator fallback and small-sample penalty applied
pub fn confidence_score(correct_lows: usize, actual_lows: usize, params: &ConfidenceParams) -> f64 {
    let score = correct_lows as f64 / actual_lows.max(1) as f64;
    if actual_lows < params.small_sample_min_lows {
        score * params.small_sample_penalty
    } else {
        score
    }
}

/// Per-group confidence summaries, in group order of first appearance
pub fn compute_prediction_confidence(
    records: &[Record],
    by_system: &Groups,
    params: &ConfidenceParams,
) -> Vec<GroupConfidence> {
    let predicted = predicted_low_yield(records, params.low_yield_threshold);
    let actual = actual_low_yield(records, by_system);
    summarize(records, by_system, params, &predicted, &actual)
}

fn summarize(
    records: &[Record],
    by_system: &Groups,
    params: &ConfidenceParams,
    predicted: &[i32],
    actual: &[i32],
) -> Vec<GroupConfidence> {
    by_system
        .iter()
        .map(|members| {
            let first = &records[members[0]];
            let predicted_lows = members.iter().filter(|&&i| predicted[i] == 1).count();
            let actual_lows = members.iter().filter(|&&i| actual[i] == 1).count();
            let correct_lows = members
                .iter()
                .filter(|&&i| predicted[i] == 1 && actual[i] == 1)
                .count();

            GroupConfidence {
                state: first.state.clone(),
                crop: first.crop.clone(),
                total_years: members.iter().filter(|&&i| records[i].crop_yield.is_some()).count(),
                predicted_lows,
                actual_lows,
                correct_lows,
                confidence_score: confidence_score(correct_lows, actual_lows, params),
            }
        })
        .collect()
}

/// Write the per-record flags and broadcast each group's score to its records
pub fn attach_confidence(
    records: &mut [Record],
    by_system: &Groups,
    params: &ConfidenceParams,
) -> Vec<GroupConfidence> {
    let predicted = predicted_low_yield(records, params.low_yield_threshold);
    let actual = actual_low_yield(records, by_system);
    let summaries = summarize(records, by_system, params, &predicted, &actual);

    for (members, summary) in by_system.iter().zip(&summaries) {
        for &idx in members {
            let d = &mut records[idx].derived;
            d.predicted_low_yield = Some(predicted[idx]);
            d.actual_low_yield = Some(actual[idx]);
            d.confidence_score = Some(summary.confidence_score);
        }
    }

    summaries
}

fn recall_at(records: &[Record], actual: &[i32], threshold: f64) -> ThresholdRecall {
    let predicted = predicted_low_yield(records, threshold);

    let actual_total = actual.iter().filter(|&&a| a == 1).count();
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|&(&p, &a)| p == 1 && a == 1)
        .count();

    ThresholdRecall {
        threshold,
        correct,
        actual: actual_total,
        recall: if actual_total == 0 {
            0.0
        } else {
            correct as f64 / actual_total as f64
        },
    }
}

/// Dataset-wide recall at one threshold
pub fn evaluate_threshold(records: &[Record], by_system: &Groups, threshold: f64) -> ThresholdRecall {
    recall_at(records, &actual_low_yield(records, by_system), threshold)
}

/// Recall for every candidate threshold, for threshold tuning
///
/// Actual low-yield years do not depend on the threshold and are found once.
pub fn threshold_sweep(records: &[Record], by_system: &Groups, thresholds: &[f64]) -> Vec<ThresholdRecall> {
    let actual = actual_low_yield(records, by_system);
    thresholds
        .iter()
        .map(|&t| recall_at(records, &actual, t))
        .collect()
}
