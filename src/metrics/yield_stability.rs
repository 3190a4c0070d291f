//! YIELD STABILITY
//!
//! Per (state, crop): yield anomaly against the group mean and the group's
//! sample standard deviation as volatility. Single-observation groups have no
//! volatility evidence and resolve to 0. Volatility is normalized per crop and
//! `stability_score = 1 - yield_volatility_norm`.

use super::StageReport;
use crate::record::Record;
use crate::utils::stats::{mean, sample_std};
use crate::utils::{gather, group_normalize, Groups};

/// Write `yield_anomaly`, `yield_volatility_norm` and `stability_score`
pub fn add_yield_features(records: &mut [Record], by_system: &Groups, by_crop: &Groups) -> StageReport {
    let yields: Vec<Option<f64>> = records.iter().map(|r| r.crop_yield).collect();

    let per_row: Vec<(Option<f64>, Option<f64>)> = by_system.transform(|members| {
        let values = gather(&yields, members);
        let group_mean = mean(values.iter().copied());
        let volatility = sample_std(values.iter().copied()).unwrap_or(0.0);
        values
            .iter()
            .map(|y| ((*y).zip(group_mean).map(|(y, m)| y - m), Some(volatility)))
            .collect()
    });

    let volatility: Vec<Option<f64>> = per_row.iter().map(|(_, v)| *v).collect();
    let volatility_norm = group_normalize(&volatility, by_crop);

    for ((record, (anomaly, _)), vol_norm) in records.iter_mut().zip(per_row).zip(volatility_norm) {
        record.derived.yield_anomaly = anomaly;
        record.derived.yield_volatility_norm = vol_norm;
        record.derived.stability_score = vol_norm.map(|v| 1.0 - v);
    }

    StageReport::new("yield_stability", records, by_system, |r| r.derived.stability_score.is_none())
}
