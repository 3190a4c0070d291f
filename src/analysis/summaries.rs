//! Policy summaries over the enriched dataset
//!
//! Aggregations consumed by dashboards and the graph builder. Missing values
//! are skipped in means; rows with a missing sort key sort last.

use crate::record::{Priority, Record};
use crate::utils::stats::{mean, sample_std};
use crate::utils::Groups;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Per-state policy view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub state: String,
    pub avg_agro_stress: Option<f64>,
    pub avg_resilience: Option<f64>,
    pub high_priority_pct: f64,
    pub fragile_system_pct: f64,
}

/// Per-crop resilience ranking row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRanking {
    pub crop: String,
    pub avg_resilience: Option<f64>,
    pub avg_stress: Option<f64>,
}

/// One state × crop × year row of a top-N listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemYear {
    pub state: String,
    pub crop: String,
    pub year: i32,
    pub agro_stress_index: Option<f64>,
    pub resilience_score: Option<f64>,
    pub intervention_priority: Option<Priority>,
    pub fragile_system: Option<i32>,
}

/// Aggregated (state, crop) system, the node data of the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSummary {
    pub state: String,
    pub crop: String,
    pub avg_agro_stress: Option<f64>,
    pub avg_resilience: Option<f64>,
    pub modal_priority: Option<Priority>,
}

/// Spread of each normalized stress component within a crop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropVariability {
    pub crop: String,
    pub nutrient_stress_std: Option<f64>,
    pub climate_stress_std: Option<f64>,
    pub disease_risk_std: Option<f64>,
}

/// State × crop mean stress; absent pairs have no records
pub type StressHeatmap = BTreeMap<String, BTreeMap<String, f64>>;

/// Descending with missing values last
fn desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending with missing values last
fn asc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn system_year(r: &Record) -> SystemYear {
    SystemYear {
        state: r.state.clone(),
        crop: r.crop.clone(),
        year: r.year,
        agro_stress_index: r.derived.agro_stress_index,
        resilience_score: r.derived.resilience_score,
        intervention_priority: r.derived.intervention_priority,
        fragile_system: r.derived.fragile_system,
    }
}

/// State-level stress, resilience and share of high-priority / fragile records
pub fn state_level_summary(records: &[Record]) -> Vec<StateSummary> {
    let groups = Groups::by_state(records);
    let mut summary: Vec<StateSummary> = groups
        .iter()
        .map(|members| {
            let rows = || members.iter().map(|&i| &records[i]);
            let high = rows()
                .filter(|r| r.derived.intervention_priority == Some(Priority::High))
                .count();
            let fragile = rows().filter(|r| r.derived.fragile_system == Some(1)).count();
            StateSummary {
                state: records[members[0]].state.clone(),
                avg_agro_stress: mean(rows().map(|r| r.derived.agro_stress_index)),
                avg_resilience: mean(rows().map(|r| r.derived.resilience_score)),
                high_priority_pct: pct(high, members.len()),
                fragile_system_pct: pct(fragile, members.len()),
            }
        })
        .collect();

    summary.sort_by(|a, b| desc_missing_last(a.avg_agro_stress, b.avg_agro_stress));
    summary
}

/// Crops ranked by mean resilience, most resilient first
pub fn crop_resilience_ranking(records: &[Record]) -> Vec<CropRanking> {
    let groups = Groups::by_crop(records);
    let mut ranking: Vec<CropRanking> = groups
        .iter()
        .map(|members| {
            let rows = || members.iter().map(|&i| &records[i]);
            CropRanking {
                crop: records[members[0]].crop.clone(),
                avg_resilience: mean(rows().map(|r| r.derived.resilience_score)),
                avg_stress: mean(rows().map(|r| r.derived.agro_stress_index)),
            }
        })
        .collect();

    ranking.sort_by(|a, b| desc_missing_last(a.avg_resilience, b.avg_resilience));
    ranking
}

/// The `top_n` records with the highest stress index
pub fn top_high_risk_systems(records: &[Record], top_n: usize) -> Vec<SystemYear> {
    let mut rows: Vec<&Record> = records.iter().collect();
    rows.sort_by(|a, b| desc_missing_last(a.derived.agro_stress_index, b.derived.agro_stress_index));
    rows.into_iter().take(top_n).map(system_year).collect()
}

/// The `top_n` records with the lowest resilience
pub fn most_fragile_systems(records: &[Record], top_n: usize) -> Vec<SystemYear> {
    let mut rows: Vec<&Record> = records.iter().collect();
    rows.sort_by(|a, b| asc_missing_last(a.derived.resilience_score, b.derived.resilience_score));
    rows.into_iter().take(top_n).map(system_year).collect()
}

/// Mean stress per state × crop
pub fn stress_heatmap_matrix(records: &[Record]) -> StressHeatmap {
    let mut heatmap = StressHeatmap::new();
    for members in Groups::by_system(records).iter() {
        let first = &records[members[0]];
        if let Some(avg) = mean(members.iter().map(|&i| records[i].derived.agro_stress_index)) {
            heatmap
                .entry(first.state.clone())
                .or_default()
                .insert(first.crop.clone(), avg);
        }
    }
    heatmap
}

/// Most frequent priority; ties resolve to the more severe tier
fn modal_priority<'a, I>(priorities: I) -> Option<Priority>
where
    I: IntoIterator<Item = &'a Option<Priority>>,
{
    let mut counts: BTreeMap<Priority, usize> = BTreeMap::new();
    for p in priorities.into_iter().flatten() {
        *counts.entry(*p).or_insert(0) += 1;
    }
    // BTreeMap iterates High, Moderate, Low; keep the first maximum
    counts
        .into_iter()
        .fold(None, |best: Option<(Priority, usize)>, (p, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((p, n)),
        })
        .map(|(p, _)| p)
}

/// Per (state, crop) mean stress, mean resilience and modal priority
pub fn system_summary(records: &[Record]) -> Vec<SystemSummary> {
    Groups::by_system(records)
        .iter()
        .map(|members| {
            let rows = || members.iter().map(|&i| &records[i]);
            let first = &records[members[0]];
            SystemSummary {
                state: first.state.clone(),
                crop: first.crop.clone(),
                avg_agro_stress: mean(rows().map(|r| r.derived.agro_stress_index)),
                avg_resilience: mean(rows().map(|r| r.derived.resilience_score)),
                modal_priority: modal_priority(rows().map(|r| &r.derived.intervention_priority)),
            }
        })
        .collect()
}

/// Sample std of the three normalized components within each crop
pub fn crop_stress_variability(records: &[Record]) -> Vec<CropVariability> {
    Groups::by_crop(records)
        .iter()
        .map(|members| {
            let rows = || members.iter().map(|&i| &records[i]);
            CropVariability {
                crop: records[members[0]].crop.clone(),
                nutrient_stress_std: sample_std(rows().map(|r| r.derived.nutrient_stress_norm)),
                climate_stress_std: sample_std(rows().map(|r| r.derived.climate_stress_norm)),
                disease_risk_std: sample_std(rows().map(|r| r.derived.disease_risk_norm)),
            }
        })
        .collect()
}
