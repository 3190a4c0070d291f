//! NUTRIENT STRESS
//!
//! Absolute soil nutrient deficit per record, normalized per crop:
//!
//!   nutrient_stress = |N - N_req| + |P - P_req| + |K - K_req|
//!
//! A record missing any of the six inputs has no deficit; the gap carries
//! through to `nutrient_stress_norm` and every composite built on it.

use super::StageReport;
use crate::record::Record;
use crate::utils::{group_normalize, Groups};

/// Absolute deficit across N, P and K; `None` if any input is missing
pub fn nutrient_deficit(record: &Record) -> Option<f64> {
    let n = (record.n_req? - record.n?).abs();
    let p = (record.p_req? - record.p?).abs();
    let k = (record.k_req? - record.k?).abs();
    Some(n + p + k)
}

/// Write `nutrient_stress` and `nutrient_stress_norm`
pub fn add_nutrient_features(records: &mut [Record], by_crop: &Groups) -> StageReport {
    let stress: Vec<Option<f64>> = records.iter().map(nutrient_deficit).collect();
    let norm = group_normalize(&stress, by_crop);

    for ((record, s), s_norm) in records.iter_mut().zip(stress).zip(norm) {
        record.derived.nutrient_stress = s;
        record.derived.nutrient_stress_norm = s_norm;
    }

    StageReport::new("nutrient_stress", records, by_crop, |r| r.derived.nutrient_stress_norm.is_none())
}
