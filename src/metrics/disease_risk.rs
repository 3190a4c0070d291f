//! DISEASE RISK (RULE-BASED)
//!
//! Every rule for the record's crop whose temperature window, humidity floor
//! and rainfall floor all hold adds 1 to `disease_risk_score`. The count is
//! normalized per crop. Crops without rules score 0.

use super::StageReport;
use crate::record::{DiseaseRule, Record};
use crate::utils::{group_normalize, Groups};
use rustc_hash::FxHashMap;

/// Disease rules indexed by crop
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    by_crop: FxHashMap<String, Vec<DiseaseRule>>,
}

impl RuleBook {
    pub fn new(rules: &[DiseaseRule]) -> Self {
        let mut by_crop: FxHashMap<String, Vec<DiseaseRule>> = FxHashMap::default();
        for rule in rules {
            by_crop.entry(rule.crop.clone()).or_default().push(rule.clone());
        }
        Self { by_crop }
    }

    pub fn rules_for(&self, crop: &str) -> &[DiseaseRule] {
        self.by_crop.get(crop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn n_crops(&self) -> usize {
        self.by_crop.len()
    }

    pub fn n_rules(&self) -> usize {
        self.by_crop.values().map(Vec::len).sum()
    }
}

/// Number of the crop's rules whose environmental window contains the record
pub fn count_matching_rules(record: &Record, book: &RuleBook) -> i32 {
    book.rules_for(&record.crop)
        .iter()
        .filter(|rule| rule.matches(record.temperature, record.humidity, record.rainfall))
        .count() as i32
}

/// Write `disease_risk_score` and `disease_risk_norm`
pub fn add_disease_risk(records: &mut [Record], book: &RuleBook, by_crop: &Groups) -> StageReport {
    let scores: Vec<i32> = records.iter().map(|r| count_matching_rules(r, book)).collect();
    let as_f64: Vec<Option<f64>> = scores.iter().map(|&s| Some(f64::from(s))).collect();
    let norm = group_normalize(&as_f64, by_crop);

    for ((record, score), score_norm) in records.iter_mut().zip(scores).zip(norm) {
        record.derived.disease_risk_score = Some(score);
        record.derived.disease_risk_norm = score_norm;
    }

    StageReport::new("disease_risk", records, by_crop, |r| r.derived.disease_risk_norm.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rule(crop: &str, disease: &str, t: (f64, f64), humidity_min: f64, rainfall_min: f64) -> DiseaseRule {
        DiseaseRule {
            crop: crop.to_string(),
            disease: disease.to_string(),
            temp_min: t.0,
            temp_max: t.1,
            humidity_min,
            rainfall_min,
        }
    }

    fn weather(crop: &str, year: i32, t: f64, h: f64, r: f64) -> Record {
        let mut rec = Record::new("west bengal", crop, year);
        rec.temperature = Some(t);
        rec.humidity = Some(h);
        rec.rainfall = Some(r);
        rec
    }

    #[test]
    fn test_rice_blast_matches_every_year() {
        let book = RuleBook::new(&[rule("rice", "rice blast", (20.0, 28.0), 80.0, 100.0)]);
        let mut records: Vec<Record> = [20.0, 22.0, 24.0, 26.0, 28.0]
            .iter()
            .enumerate()
            .map(|(i, &t)| weather("rice", 2001 + i as i32, t, 85.0 + i as f64, 120.0 + i as f64))
            .collect();
        let groups = Groups::by_crop(&records);
        add_disease_risk(&mut records, &book, &groups);

        for r in &records {
            assert_eq!(r.derived.disease_risk_score, Some(1));
            assert_relative_eq!(r.derived.disease_risk_norm.unwrap(), 1.0);
        }
    }

    #[test]
    fn test_score_counts_multiple_rules() {
        let book = RuleBook::new(&[
            rule("rice", "rice blast", (20.0, 28.0), 80.0, 100.0),
            rule("rice", "bacterial leaf blight", (25.0, 34.0), 75.0, 120.0),
            rule("rice", "sheath blight", (24.0, 30.0), 85.0, 110.0),
            rule("maize", "maize rust", (18.0, 25.0), 70.0, 80.0),
        ]);
        let hot_wet = weather("rice", 2001, 26.0, 90.0, 150.0);
        let dry = weather("rice", 2002, 26.0, 90.0, 50.0);
        assert_eq!(count_matching_rules(&hot_wet, &book), 3);
        assert_eq!(count_matching_rules(&dry, &book), 0);
        assert_eq!(book.n_rules(), 4);
        assert_eq!(book.n_crops(), 2);

        let mut records = vec![hot_wet, dry];
        let groups = Groups::by_crop(&records);
        add_disease_risk(&mut records, &book, &groups);
        assert_relative_eq!(records[0].derived.disease_risk_norm.unwrap(), 1.0);
        assert_relative_eq!(records[1].derived.disease_risk_norm.unwrap(), 0.0);
    }

    #[test]
    fn test_crop_without_rules_scores_zero() {
        let book = RuleBook::new(&[rule("rice", "rice blast", (20.0, 28.0), 80.0, 100.0)]);
        let mut records = vec![weather("wheat", 2001, 24.0, 90.0, 150.0)];
        let groups = Groups::by_crop(&records);
        add_disease_risk(&mut records, &book, &groups);
        assert_eq!(records[0].derived.disease_risk_score, Some(0));
        assert_eq!(records[0].derived.disease_risk_norm, Some(0.0));
    }
}
