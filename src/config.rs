//! Scoring Configuration
//!
//! Every constant used by the stress engines lives here as a named, serde-loadable
//! parameter. `ScoringConfig::default()` reproduces the reference weighting and
//! cutoffs; a JSON file only needs to mention the values it overrides.

use crate::error::PipelineError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Full configuration for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: CompositeWeights,
    pub climate: ClimateParams,
    pub priority: PriorityParams,
    pub confidence: ConfidenceParams,
}

/// Weights of the Agro Stress Index
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub nutrient: f64,
    pub climate: f64,
    pub disease: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            nutrient: 0.4,
            climate: 0.4,
            disease: 0.2,
        }
    }
}

impl CompositeWeights {
    pub fn total(&self) -> f64 {
        self.nutrient + self.climate + self.disease
    }
}

/// Extreme-event quantiles and rolling volatility window
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClimateParams {
    /// Temperature at or above this group quantile flags heat stress
    pub heat_quantile: f64,
    /// Rainfall at or below this group quantile flags drought stress
    pub drought_quantile: f64,
    /// Trailing window length in observations (years)
    pub volatility_window: usize,
    /// Minimum observations inside the window to produce a value
    pub volatility_min_periods: usize,
}

impl Default for ClimateParams {
    fn default() -> Self {
        Self {
            heat_quantile: 0.90,
            drought_quantile: 0.10,
            volatility_window: 5,
            volatility_min_periods: 3,
        }
    }
}

/// Global quantile cutoffs for priority tiers and the fragility flag
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PriorityParams {
    pub high_quantile: f64,
    pub moderate_quantile: f64,
    pub fragile_resilience_quantile: f64,
}

impl Default for PriorityParams {
    fn default() -> Self {
        Self {
            high_quantile: 0.80,
            moderate_quantile: 0.50,
            fragile_resilience_quantile: 0.30,
        }
    }
}

/// Low-yield predictor threshold and small-sample penalty
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfidenceParams {
    /// `agro_stress_index` strictly above this predicts a low-yield year
    pub low_yield_threshold: f64,
    /// Groups with fewer actual lows than this are penalized
    pub small_sample_min_lows: usize,
    pub small_sample_penalty: f64,
    pub sweep_thresholds: Vec<f64>,
}

impl Default for ConfidenceParams {
    fn default() -> Self {
        Self {
            low_yield_threshold: 0.40,
            small_sample_min_lows: 3,
            small_sample_penalty: 0.5,
            sweep_thresholds: vec![0.40, 0.45, 0.50, 0.55, 0.60, 0.65],
        }
    }
}

impl ScoringConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config: {:?}", path))?;

        let config: ScoringConfig = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse scoring config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the engines cannot honor
    pub fn validate(&self) -> Result<()> {
        let quantiles = [
            ("climate.heat_quantile", self.climate.heat_quantile),
            ("climate.drought_quantile", self.climate.drought_quantile),
            ("priority.high_quantile", self.priority.high_quantile),
            ("priority.moderate_quantile", self.priority.moderate_quantile),
            (
                "priority.fragile_resilience_quantile",
                self.priority.fragile_resilience_quantile,
            ),
        ];
        for (name, q) in quantiles {
            if !(0.0..=1.0).contains(&q) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{} must lie in [0, 1], got {}",
                    name, q
                ))
                .into());
            }
        }

        if self.priority.moderate_quantile > self.priority.high_quantile {
            return Err(PipelineError::InvalidConfig(format!(
                "priority.moderate_quantile ({}) exceeds high_quantile ({})",
                self.priority.moderate_quantile, self.priority.high_quantile
            ))
            .into());
        }

        if self.climate.volatility_window == 0 {
            return Err(
                PipelineError::InvalidConfig("climate.volatility_window must be > 0".into()).into(),
            );
        }
        if self.climate.volatility_min_periods > self.climate.volatility_window {
            return Err(PipelineError::InvalidConfig(format!(
                "climate.volatility_min_periods ({}) exceeds volatility_window ({})",
                self.climate.volatility_min_periods, self.climate.volatility_window
            ))
            .into());
        }

        let w = &self.weights;
        if [w.nutrient, w.climate, w.disease].iter().any(|x| x.is_nan() || *x < 0.0) {
            return Err(
                PipelineError::InvalidConfig(format!("weights must be non-negative numbers: {:?}", w))
                    .into(),
            );
        }
        if (w.total() - 1.0).abs() > 1e-9 {
            // Allowed, but the index is no longer bounded by [0, 1]
            tracing::warn!("Composite weights sum to {:.4}, not 1.0", w.total());
        }

        Ok(())
    }
}
