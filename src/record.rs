//! Record and rule types
//!
//! A `Record` is one state × crop × year observation. Input measurements are
//! `Option<f64>` so that missing values survive extraction from the CSV and
//! propagate through the derived columns instead of being replaced by zeros.
//! Derived columns start out `None` and are written once, each by one engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One state × crop × year observation
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub state: String,
    pub crop: String,
    pub year: i32,

    /// Yield in kg/ha (`yield` column)
    pub crop_yield: Option<f64>,

    // Actual soil nutrient levels
    pub n: Option<f64>,
    pub p: Option<f64>,
    pub k: Option<f64>,

    // Required nutrient levels (kg/ha)
    pub n_req: Option<f64>,
    pub p_req: Option<f64>,
    pub k_req: Option<f64>,

    // Annual climate aggregates
    pub temperature: Option<f64>,
    pub rainfall: Option<f64>,
    pub humidity: Option<f64>,

    pub derived: DerivedColumns,
}

impl Record {
    /// Record with identity only; every measurement missing
    pub fn new(state: &str, crop: &str, year: i32) -> Self {
        Self {
            state: normalize_label(state),
            crop: normalize_label(crop),
            year,
            crop_yield: None,
            n: None,
            p: None,
            k: None,
            n_req: None,
            p_req: None,
            k_req: None,
            temperature: None,
            rainfall: None,
            humidity: None,
            derived: DerivedColumns::default(),
        }
    }
}

/// Lowercase and trim a state or crop label
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Columns appended by the enrichment chain and the confidence evaluator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedColumns {
    // Nutrient engine
    pub nutrient_stress: Option<f64>,
    pub nutrient_stress_norm: Option<f64>,

    // Climate engine
    pub temp_anomaly_norm: Option<f64>,
    pub rain_anomaly_norm: Option<f64>,
    pub heat_stress: Option<i32>,
    pub drought_stress: Option<i32>,
    pub temp_volatility_norm: Option<f64>,
    pub rain_volatility_norm: Option<f64>,
    pub climate_stress_norm: Option<f64>,

    // Disease engine
    pub disease_risk_score: Option<i32>,
    pub disease_risk_norm: Option<f64>,

    // Yield engine
    pub yield_anomaly: Option<f64>,
    pub yield_volatility_norm: Option<f64>,
    pub stability_score: Option<f64>,

    // Composite scorer
    pub agro_stress_index: Option<f64>,
    pub stress_interaction: Option<f64>,
    pub resilience_score: Option<f64>,

    // Priority classifier
    pub intervention_priority: Option<Priority>,
    pub fragile_system: Option<i32>,

    // Confidence evaluator
    pub predicted_low_yield: Option<i32>,
    pub actual_low_yield: Option<i32>,
    pub confidence_score: Option<f64>,
}

/// Intervention tier assigned from global stress quantiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "High Priority")]
    High,
    #[serde(rename = "Moderate Priority")]
    Moderate,
    #[serde(rename = "Low Priority")]
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High Priority",
            Priority::Moderate => "Moderate Priority",
            Priority::Low => "Low Priority",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "High Priority" => Some(Priority::High),
            "Moderate Priority" => Some(Priority::Moderate),
            "Low Priority" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Crop-specific environmental window in which a disease is likely
///
/// Bounds are inclusive. `temp_min <= temp_max` is not checked; an inverted
/// window simply never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRule {
    pub crop: String,
    pub disease: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_min: f64,
    pub rainfall_min: f64,
}

impl DiseaseRule {
    /// True when all three measurements are present and inside the window
    pub fn matches(
        &self,
        temperature: Option<f64>,
        humidity: Option<f64>,
        rainfall: Option<f64>,
    ) -> bool {
        match (temperature, humidity, rainfall) {
            (Some(t), Some(h), Some(r)) => {
                t >= self.temp_min
                    && t <= self.temp_max
                    && h >= self.humidity_min
                    && r >= self.rainfall_min
            }
            _ => false,
        }
    }
}
