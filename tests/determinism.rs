//! Determinism tests: rerun identical inputs, expect bitwise-identical output
//! via `to_bits()` equality.

mod common;

use agro_stress::analysis::{compute_prediction_confidence, stress_heatmap_matrix};
use agro_stress::{AgroData, DerivedColumns, ScoringConfig, StressPipeline};

fn float_columns(d: &DerivedColumns) -> [Option<f64>; 15] {
    [
        d.nutrient_stress,
        d.nutrient_stress_norm,
        d.temp_anomaly_norm,
        d.rain_anomaly_norm,
        d.temp_volatility_norm,
        d.rain_volatility_norm,
        d.climate_stress_norm,
        d.disease_risk_norm,
        d.yield_anomaly,
        d.yield_volatility_norm,
        d.stability_score,
        d.agro_stress_index,
        d.stress_interaction,
        d.resilience_score,
        d.confidence_score,
    ]
}

fn bits(v: Option<f64>) -> Option<u64> {
    v.map(f64::to_bits)
}

#[test]
fn pipeline_deterministic_across_runs() {
    let data = AgroData::from_frames(common::merged_frame(12), &common::rules_frame()).unwrap();
    let pipeline = StressPipeline::new(ScoringConfig::default(), &data.rules).unwrap();

    let (run1, conf1) = pipeline.run_with_confidence(data.records.clone()).unwrap();
    let (run2, conf2) = pipeline.run_with_confidence(data.records.clone()).unwrap();

    assert_eq!(run1.len(), run2.len());
    for (a, b) in run1.records.iter().zip(&run2.records) {
        for (x, y) in float_columns(&a.derived).iter().zip(float_columns(&b.derived).iter()) {
            assert_eq!(bits(*x), bits(*y));
        }
        assert_eq!(a.derived.heat_stress, b.derived.heat_stress);
        assert_eq!(a.derived.drought_stress, b.derived.drought_stress);
        assert_eq!(a.derived.disease_risk_score, b.derived.disease_risk_score);
        assert_eq!(a.derived.intervention_priority, b.derived.intervention_priority);
        assert_eq!(a.derived.fragile_system, b.derived.fragile_system);
    }

    assert_eq!(conf1.len(), conf2.len());
    for (a, b) in conf1.iter().zip(&conf2) {
        assert_eq!(a.state, b.state);
        assert_eq!(a.confidence_score.to_bits(), b.confidence_score.to_bits());
    }

    let c1 = run1.cutoffs.unwrap();
    let c2 = run2.cutoffs.unwrap();
    assert_eq!(c1.high.to_bits(), c2.high.to_bits());
    assert_eq!(c1.moderate.to_bits(), c2.moderate.to_bits());
}

#[test]
fn analyses_deterministic_across_runs() {
    let data = AgroData::from_frames(common::merged_frame(8), &common::rules_frame()).unwrap();
    let pipeline = StressPipeline::new(ScoringConfig::default(), &data.rules).unwrap();
    let dataset = pipeline.run(data.records).unwrap();

    let h1 = stress_heatmap_matrix(&dataset.records);
    let h2 = stress_heatmap_matrix(&dataset.records);
    for (state, row) in &h1 {
        for (crop, v) in row {
            assert_eq!(v.to_bits(), h2[state][crop].to_bits());
        }
    }

    let params = &pipeline.config().confidence;
    let c1 = compute_prediction_confidence(&dataset.records, dataset.systems(), params);
    let c2 = compute_prediction_confidence(&dataset.records, dataset.systems(), params);
    assert_eq!(c1, c2);
}
