//! COMPOSITE DECISION-SUPPORT FEATURES
//!
//!   agro_stress_index  = w_n * nutrient_norm + w_c * climate_norm + w_d * disease_norm
//!   stress_interaction = nutrient_norm * climate_norm
//!   resilience_score   = stability_score * (1 - agro_stress_index)

use super::StageReport;
use crate::config::CompositeWeights;
use crate::record::Record;
use crate::utils::Groups;

/// Weighted stress index from the three normalized components
pub fn agro_stress_index(
    nutrient_norm: Option<f64>,
    climate_norm: Option<f64>,
    disease_norm: Option<f64>,
    weights: &CompositeWeights,
) -> Option<f64> {
    Some(
        weights.nutrient * nutrient_norm?
            + weights.climate * climate_norm?
            + weights.disease * disease_norm?,
    )
}

/// Write `agro_stress_index`, `stress_interaction` and `resilience_score`
pub fn add_decision_support_features(
    records: &mut [Record],
    weights: &CompositeWeights,
    by_system: &Groups,
) -> StageReport {
    for record in records.iter_mut() {
        let d = &mut record.derived;
        let index = agro_stress_index(
            d.nutrient_stress_norm,
            d.climate_stress_norm,
            d.disease_risk_norm,
            weights,
        );
        d.agro_stress_index = index;
        d.stress_interaction = d
            .nutrient_stress_norm
            .zip(d.climate_stress_norm)
            .map(|(n, c)| n * c);
        d.resilience_score = d.stability_score.zip(index).map(|(s, i)| s * (1.0 - i));
    }

    StageReport::new("composite", records, by_system, |r| r.derived.agro_stress_index.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scored(n: f64, c: f64, d: f64, stability: f64) -> Record {
        let mut r = Record::new("punjab", "rice", 2001);
        r.derived.nutrient_stress_norm = Some(n);
        r.derived.climate_stress_norm = Some(c);
        r.derived.disease_risk_norm = Some(d);
        r.derived.stability_score = Some(stability);
        r
    }

    #[test]
    fn test_reference_weighting() {
        let mut records = vec![scored(0.5, 1.0, 0.25, 0.8)];
        let groups = Groups::by_system(&records);
        add_decision_support_features(&mut records, &CompositeWeights::default(), &groups);

        let d = &records[0].derived;
        // 0.4*0.5 + 0.4*1.0 + 0.2*0.25
        assert_relative_eq!(d.agro_stress_index.unwrap(), 0.65, epsilon = 1e-12);
        assert_relative_eq!(d.stress_interaction.unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(d.resilience_score.unwrap(), 0.8 * 0.35, epsilon = 1e-12);
    }

    #[test]
    fn test_index_bounded_for_unit_inputs() {
        let weights = CompositeWeights::default();
        for &n in &[0.0, 0.3, 1.0] {
            for &c in &[0.0, 0.7, 1.0] {
                for &d in &[0.0, 0.5, 1.0] {
                    let i = agro_stress_index(Some(n), Some(c), Some(d), &weights).unwrap();
                    assert!((0.0..=1.0 + 1e-12).contains(&i));
                }
            }
        }
    }

    #[test]
    fn test_missing_component_propagates() {
        let mut r = scored(0.5, 1.0, 0.25, 0.8);
        r.derived.nutrient_stress_norm = None;
        let mut records = vec![r];
        let groups = Groups::by_system(&records);
        add_decision_support_features(&mut records, &CompositeWeights::default(), &groups);
        let d = &records[0].derived;
        assert_eq!(d.agro_stress_index, None);
        assert_eq!(d.stress_interaction, None);
        assert_eq!(d.resilience_score, None);
    }
}
