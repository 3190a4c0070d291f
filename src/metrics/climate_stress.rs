//! CLIMATE STRESS (VOLATILITY-BASED, ANNUAL DATA)
//!
//! Per (state, crop) group, ordered by year:
//!   1. Baseline: group mean temperature and rainfall
//!   2. Anomaly: value - baseline, divided by the group's largest |anomaly|
//!   3. Extremes: heat_stress if temperature >= group q90,
//!      drought_stress if rainfall <= group q10
//!   4. Volatility: trailing rolling std (window 5, at least 3 observations);
//!      insufficient history resolves to 0, then normalized per crop
//!   5. Composite: |temp_anom| + |rain_anom| + heat + drought + temp_vol + rain_vol,
//!      normalized per crop
//!
//! Baselines, raw anomalies and raw volatilities are not persisted.

use super::StageReport;
use crate::config::ClimateParams;
use crate::record::Record;
use crate::utils::stats::{mean, quantile, rolling_std};
use crate::utils::{gather, group_normalize, normalize_max_abs, Groups};

/// Per-row output of the (state, crop) pass
#[derive(Debug, Clone, Default)]
struct SystemClimate {
    temp_anomaly_norm: Option<f64>,
    rain_anomaly_norm: Option<f64>,
    heat_stress: Option<i32>,
    drought_stress: Option<i32>,
    temp_volatility: f64,
    rain_volatility: f64,
}

/// Signed anomalies scaled by the group's largest absolute anomaly
fn anomaly_norm(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let baseline = mean(values.iter().copied());
    let anomalies: Vec<Option<f64>> = values
        .iter()
        .map(|v| Some(v.as_ref()? - baseline?))
        .collect();
    normalize_max_abs(&anomalies)
}

/// 0/1 flag per row from a comparison against a group threshold
fn flag_against<F>(values: &[Option<f64>], threshold: Option<f64>, hit: F) -> Vec<Option<i32>>
where
    F: Fn(f64, f64) -> bool,
{
    values
        .iter()
        .map(|v| {
            let v = (*v)?;
            let t = threshold?;
            Some(i32::from(hit(v, t)))
        })
        .collect()
}

/// Rolling volatility with insufficient history resolved to 0
fn volatility(values: &[Option<f64>], params: &ClimateParams) -> Vec<f64> {
    rolling_std(values, params.volatility_window, params.volatility_min_periods)
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect()
}

/// Everything computed within one year-ordered (state, crop) group
fn system_pass(temps: &[Option<f64>], rains: &[Option<f64>], params: &ClimateParams) -> Vec<SystemClimate> {
    let temp_anom = anomaly_norm(temps);
    let rain_anom = anomaly_norm(rains);

    let heat_threshold = quantile(temps.iter().copied(), params.heat_quantile);
    let drought_threshold = quantile(rains.iter().copied(), params.drought_quantile);
    let heat = flag_against(temps, heat_threshold, |v, t| v >= t);
    let drought = flag_against(rains, drought_threshold, |v, t| v <= t);

    let temp_vol = volatility(temps, params);
    let rain_vol = volatility(rains, params);

    (0..temps.len())
        .map(|i| SystemClimate {
            temp_anomaly_norm: temp_anom[i],
            rain_anomaly_norm: rain_anom[i],
            heat_stress: heat[i],
            drought_stress: drought[i],
            temp_volatility: temp_vol[i],
            rain_volatility: rain_vol[i],
        })
        .collect()
}

/// Write the climate columns
///
/// `by_system` must be ordered by year within each group (`Groups::by_system`).
pub fn add_climate_features(
    records: &mut [Record],
    by_system: &Groups,
    by_crop: &Groups,
    params: &ClimateParams,
) -> StageReport {
    let temps: Vec<Option<f64>> = records.iter().map(|r| r.temperature).collect();
    let rains: Vec<Option<f64>> = records.iter().map(|r| r.rainfall).collect();

    let system: Vec<SystemClimate> = by_system.transform(|members| {
        system_pass(&gather(&temps, members), &gather(&rains, members), params)
    });

    // Volatility is compared across all states growing the crop
    let temp_vol: Vec<Option<f64>> = system.iter().map(|s| Some(s.temp_volatility)).collect();
    let rain_vol: Vec<Option<f64>> = system.iter().map(|s| Some(s.rain_volatility)).collect();
    let temp_vol_norm = group_normalize(&temp_vol, by_crop);
    let rain_vol_norm = group_normalize(&rain_vol, by_crop);

    let climate_stress: Vec<Option<f64>> = system
        .iter()
        .zip(temp_vol_norm.iter().zip(&rain_vol_norm))
        .map(|(s, (tv, rv))| {
            Some(
                s.temp_anomaly_norm?.abs()
                    + s.rain_anomaly_norm?.abs()
                    + f64::from(s.heat_stress?)
                    + f64::from(s.drought_stress?)
                    + (*tv)?
                    + (*rv)?,
            )
        })
        .collect();
    let climate_stress_norm = group_normalize(&climate_stress, by_crop);

    for (idx, record) in records.iter_mut().enumerate() {
        let s = &system[idx];
        let d = &mut record.derived;
        d.temp_anomaly_norm = s.temp_anomaly_norm;
        d.rain_anomaly_norm = s.rain_anomaly_norm;
        d.heat_stress = s.heat_stress;
        d.drought_stress = s.drought_stress;
        d.temp_volatility_norm = temp_vol_norm[idx];
        d.rain_volatility_norm = rain_vol_norm[idx];
        d.climate_stress_norm = climate_stress_norm[idx];
    }

    StageReport::new("climate_stress", records, by_system, |r| r.derived.climate_stress_norm.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn climate_record(state: &str, crop: &str, year: i32, temp: f64, rain: f64) -> Record {
        let mut r = Record::new(state, crop, year);
        r.temperature = Some(temp);
        r.rainfall = Some(rain);
        r
    }

    fn run(records: &mut [Record]) {
        let by_system = Groups::by_system(records);
        let by_crop = Groups::by_crop(records);
        add_climate_features(records, &by_system, &by_crop, &ClimateParams::default());
    }

    #[test]
    fn test_anomaly_norm_is_signed_and_bounded() {
        let out = anomaly_norm(&[Some(20.0), Some(24.0), Some(28.0)]);
        assert_relative_eq!(out[0].unwrap(), -1.0);
        assert_relative_eq!(out[1].unwrap(), 0.0);
        assert_relative_eq!(out[2].unwrap(), 1.0);
    }

    #[test]
    fn test_two_year_group_has_zero_volatility() {
        let mut records = vec![
            climate_record("punjab", "rice", 2001, 20.0, 100.0),
            climate_record("punjab", "rice", 2002, 30.0, 200.0),
        ];
        run(&mut records);
        for r in &records {
            assert_eq!(r.derived.temp_volatility_norm, Some(0.0));
            assert_eq!(r.derived.rain_volatility_norm, Some(0.0));
        }
    }

    #[test]
    fn test_extreme_flags_use_group_quantiles() {
        let temps = [20.0, 22.0, 24.0, 26.0, 28.0];
        let rains = [150.0, 120.0, 130.0, 140.0, 160.0];
        let mut records: Vec<Record> = temps
            .iter()
            .zip(rains.iter())
            .enumerate()
            .map(|(i, (&t, &r))| climate_record("punjab", "rice", 2001 + i as i32, t, r))
            .collect();
        run(&mut records);

        // q90 of temps = 27.2: only 28 qualifies
        let heat: Vec<i32> = records.iter().map(|r| r.derived.heat_stress.unwrap()).collect();
        assert_eq!(heat, vec![0, 0, 0, 0, 1]);
        // q10 of rains = 124: only 120 qualifies
        let drought: Vec<i32> = records.iter().map(|r| r.derived.drought_stress.unwrap()).collect();
        assert_eq!(drought, vec![0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_volatility_follows_year_order_not_row_order() {
        // Rows arrive shuffled; the first two years must have no volatility
        let mut records = vec![
            climate_record("punjab", "rice", 2003, 26.0, 100.0),
            climate_record("punjab", "rice", 2001, 20.0, 100.0),
            climate_record("punjab", "rice", 2002, 23.0, 100.0),
        ];
        run(&mut records);
        assert_eq!(records[1].derived.temp_volatility_norm, Some(0.0));
        assert_eq!(records[2].derived.temp_volatility_norm, Some(0.0));
        // Only 2003 has three observations; it is the crop maximum
        assert_relative_eq!(records[0].derived.temp_volatility_norm.unwrap(), 1.0);
    }

    #[test]
    fn test_constant_climate_group_is_all_zero() {
        let mut records: Vec<Record> = (0..4)
            .map(|i| climate_record("kerala", "maize", 2001 + i, 25.0, 100.0))
            .collect();
        run(&mut records);
        for r in &records {
            assert_eq!(r.derived.temp_anomaly_norm, Some(0.0));
            assert_eq!(r.derived.rain_anomaly_norm, Some(0.0));
            // Every value equals both quantiles, so both flags fire
            assert_eq!(r.derived.heat_stress, Some(1));
            assert_eq!(r.derived.drought_stress, Some(1));
            assert_relative_eq!(r.derived.climate_stress_norm.unwrap(), 1.0);
        }
    }

    #[test]
    fn test_missing_temperature_propagates_to_composite() {
        let mut records = vec![
            climate_record("punjab", "rice", 2001, 20.0, 100.0),
            climate_record("punjab", "rice", 2002, 22.0, 110.0),
        ];
        records[1].temperature = None;
        run(&mut records);
        assert_eq!(records[1].derived.temp_anomaly_norm, None);
        assert_eq!(records[1].derived.heat_stress, None);
        assert_eq!(records[1].derived.climate_stress_norm, None);
        assert!(records[0].derived.climate_stress_norm.is_some());
    }
}
