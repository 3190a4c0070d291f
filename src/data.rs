//! Data Loading and Persistence
//!
//! Reads the merged state × crop × year table and the disease-rule table with
//! Polars, validates their columns, extracts typed records, and writes the
//! enriched table back out. The enriched frame is the input frame (all of its
//! columns, original row order) with every derived column added or replaced.

use crate::error::PipelineError;
use crate::record::{normalize_label, DerivedColumns, DiseaseRule, Priority, Record};
use crate::utils::{materialize_with_columns, require_columns};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Columns the merged input must carry
pub const RECORD_COLUMNS: [&str; 13] = [
    "state",
    "crop",
    "year",
    "yield",
    "n",
    "p",
    "k",
    "n_req_kg_per_ha",
    "p_req_kg_per_ha",
    "k_req_kg_per_ha",
    "temperature_nasa",
    "rainfall_nasa",
    "humidity_nasa",
];

/// Columns of the disease-rule table
pub const RULE_COLUMNS: [&str; 6] = [
    "crop",
    "disease",
    "temp_min",
    "temp_max",
    "humidity_min",
    "rainfall_min",
];

/// Columns downstream consumers (web lookup, graph builder) rely on
pub const CONSUMER_COLUMNS: [&str; 10] = [
    "state",
    "crop",
    "year",
    "agro_stress_index",
    "climate_stress_norm",
    "disease_risk_norm",
    "nutrient_stress_norm",
    "resilience_score",
    "intervention_priority",
    "confidence_score",
];

type FloatGet = fn(&DerivedColumns) -> Option<f64>;
type FloatSet = fn(&mut DerivedColumns, Option<f64>);
type FlagGet = fn(&DerivedColumns) -> Option<i32>;
type FlagSet = fn(&mut DerivedColumns, Option<i32>);

/// How a derived column is read from and written to `DerivedColumns`
#[derive(Clone, Copy)]
enum Accessor {
    Float(FloatGet, FloatSet),
    Flag(FlagGet, FlagSet),
    Priority,
}

/// Derived columns in output order
const DERIVED_COLUMNS: [(&str, Accessor); 22] = [
    ("nutrient_stress", Accessor::Float(|d| d.nutrient_stress, |d, v| d.nutrient_stress = v)),
    ("nutrient_stress_norm", Accessor::Float(|d| d.nutrient_stress_norm, |d, v| d.nutrient_stress_norm = v)),
    ("temp_anomaly_norm", Accessor::Float(|d| d.temp_anomaly_norm, |d, v| d.temp_anomaly_norm = v)),
    ("rain_anomaly_norm", Accessor::Float(|d| d.rain_anomaly_norm, |d, v| d.rain_anomaly_norm = v)),
    ("heat_stress", Accessor::Flag(|d| d.heat_stress, |d, v| d.heat_stress = v)),
    ("drought_stress", Accessor::Flag(|d| d.drought_stress, |d, v| d.drought_stress = v)),
    ("temp_volatility_norm", Accessor::Float(|d| d.temp_volatility_norm, |d, v| d.temp_volatility_norm = v)),
    ("rain_volatility_norm", Accessor::Float(|d| d.rain_volatility_norm, |d, v| d.rain_volatility_norm = v)),
    ("climate_stress_norm", Accessor::Float(|d| d.climate_stress_norm, |d, v| d.climate_stress_norm = v)),
    ("disease_risk_score", Accessor::Flag(|d| d.disease_risk_score, |d, v| d.disease_risk_score = v)),
    ("disease_risk_norm", Accessor::Float(|d| d.disease_risk_norm, |d, v| d.disease_risk_norm = v)),
    ("yield_anomaly", Accessor::Float(|d| d.yield_anomaly, |d, v| d.yield_anomaly = v)),
    ("yield_volatility_norm", Accessor::Float(|d| d.yield_volatility_norm, |d, v| d.yield_volatility_norm = v)),
    ("stability_score", Accessor::Float(|d| d.stability_score, |d, v| d.stability_score = v)),
    ("agro_stress_index", Accessor::Float(|d| d.agro_stress_index, |d, v| d.agro_stress_index = v)),
    ("stress_interaction", Accessor::Float(|d| d.stress_interaction, |d, v| d.stress_interaction = v)),
    ("resilience_score", Accessor::Float(|d| d.resilience_score, |d, v| d.resilience_score = v)),
    ("intervention_priority", Accessor::Priority),
    ("fragile_system", Accessor::Flag(|d| d.fragile_system, |d, v| d.fragile_system = v)),
    ("predicted_low_yield", Accessor::Flag(|d| d.predicted_low_yield, |d, v| d.predicted_low_yield = v)),
    ("actual_low_yield", Accessor::Flag(|d| d.actual_low_yield, |d, v| d.actual_low_yield = v)),
    ("confidence_score", Accessor::Float(|d| d.confidence_score, |d, v| d.confidence_score = v)),
];

/// Input tables for one pipeline run
pub struct AgroData {
    /// Merged state × crop × year table as read
    pub frame: DataFrame,

    /// Typed records, one per frame row, same order
    pub records: Vec<Record>,

    /// Disease rule table
    pub rules: Vec<DiseaseRule>,
}

impl AgroData {
    /// Load the merged records CSV and the disease-rule CSV
    pub fn load(records_path: &Path, rules_path: &Path) -> Result<Self> {
        tracing::info!("Loading records from {:?}", records_path);
        let frame = read_csv(records_path)?;
        tracing::info!("Loading disease rules from {:?}", rules_path);
        let rules_frame = read_csv(rules_path)?;
        Self::from_frames(frame, &rules_frame)
    }

    /// Validate and extract from frames already in memory
    pub fn from_frames(frame: DataFrame, rules_frame: &DataFrame) -> Result<Self> {
        let records = records_from_frame(&frame)?;
        let rules = rules_from_frame(rules_frame)?;

        tracing::info!("  Records: {}", records.len());
        tracing::info!("  Disease rules: {}", rules.len());

        Ok(AgroData {
            frame,
            records,
            rules,
        })
    }
}

/// Read a CSV with header
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

/// Write a frame as CSV with header
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV: {:?}", path))
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let cast = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    // NaN counts as missing
    let values = cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

fn i32_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    let cast = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Int32)
        .with_context(|| format!("Column '{}' is not integer", name))?;
    let values = cast.i32()?.into_iter().collect();
    Ok(values)
}

fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let cast = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' is not string type", name))?;
    let values = cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

fn required<T>(value: Option<T>, row: usize, column: &str) -> Result<T> {
    value.ok_or_else(|| {
        PipelineError::MissingIdentity {
            row,
            column: column.to_string(),
        }
        .into()
    })
}

/// Extract typed records from the merged table
///
/// Missing columns fail before any value is read. Missing identity values fail;
/// missing measurements become `None`. Derived columns already present in the
/// frame (an enriched table) are restored.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<Record>> {
    require_columns(df, &RECORD_COLUMNS, "records")?;

    let states = str_values(df, "state")?;
    let crops = str_values(df, "crop")?;
    let years = i32_values(df, "year")?;
    let yields = f64_values(df, "yield")?;
    let n = f64_values(df, "n")?;
    let p = f64_values(df, "p")?;
    let k = f64_values(df, "k")?;
    let n_req = f64_values(df, "n_req_kg_per_ha")?;
    let p_req = f64_values(df, "p_req_kg_per_ha")?;
    let k_req = f64_values(df, "k_req_kg_per_ha")?;
    let temperature = f64_values(df, "temperature_nasa")?;
    let rainfall = f64_values(df, "rainfall_nasa")?;
    let humidity = f64_values(df, "humidity_nasa")?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let state = required(states[row].as_deref(), row, "state")?;
        let crop = required(crops[row].as_deref(), row, "crop")?;
        let year = required(years[row], row, "year")?;

        let mut record = Record::new(state, crop, year);
        record.crop_yield = yields[row];
        record.n = n[row];
        record.p = p[row];
        record.k = k[row];
        record.n_req = n_req[row];
        record.p_req = p_req[row];
        record.k_req = k_req[row];
        record.temperature = temperature[row];
        record.rainfall = rainfall[row];
        record.humidity = humidity[row];
        records.push(record);
    }

    restore_derived(df, &mut records)?;
    Ok(records)
}

/// Fill `DerivedColumns` from whichever derived columns the frame carries
fn restore_derived(df: &DataFrame, records: &mut [Record]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for (name, accessor) in DERIVED_COLUMNS {
        if !present.iter().any(|c| c == name) {
            continue;
        }
        match accessor {
            Accessor::Float(_, set) => {
                for (record, v) in records.iter_mut().zip(f64_values(df, name)?) {
                    set(&mut record.derived, v);
                }
            }
            Accessor::Flag(_, set) => {
                for (record, v) in records.iter_mut().zip(i32_values(df, name)?) {
                    set(&mut record.derived, v);
                }
            }
            Accessor::Priority => {
                for (record, v) in records.iter_mut().zip(str_values(df, name)?) {
                    record.derived.intervention_priority = v.as_deref().and_then(Priority::from_label);
                }
            }
        }
    }
    Ok(())
}

/// Extract the disease-rule table; crop labels are normalized like records
pub fn rules_from_frame(df: &DataFrame) -> Result<Vec<DiseaseRule>> {
    require_columns(df, &RULE_COLUMNS, "disease rules")?;

    let crops = str_values(df, "crop")?;
    let diseases = str_values(df, "disease")?;
    let temp_min = f64_values(df, "temp_min")?;
    let temp_max = f64_values(df, "temp_max")?;
    let humidity_min = f64_values(df, "humidity_min")?;
    let rainfall_min = f64_values(df, "rainfall_min")?;

    (0..df.height())
        .map(|row| -> Result<DiseaseRule> {
            Ok(DiseaseRule {
                crop: normalize_label(required(crops[row].as_deref(), row, "crop")?),
                disease: diseases[row].clone().unwrap_or_default(),
                temp_min: required(temp_min[row], row, "temp_min")?,
                temp_max: required(temp_max[row], row, "temp_max")?,
                humidity_min: required(humidity_min[row], row, "humidity_min")?,
                rainfall_min: required(rainfall_min[row], row, "rainfall_min")?,
            })
        })
        .collect()
}

/// Input frame with normalized labels and every derived column attached
pub fn enriched_frame(base: &DataFrame, records: &[Record]) -> Result<DataFrame> {
    if base.height() != records.len() {
        anyhow::bail!(
            "Row count changed during scoring: frame has {}, records have {}",
            base.height(),
            records.len()
        );
    }

    let mut df = base.clone();

    let states: Vec<&str> = records.iter().map(|r| r.state.as_str()).collect();
    let crops: Vec<&str> = records.iter().map(|r| r.crop.as_str()).collect();
    df.with_column(Series::new("state".into(), states))?;
    df.with_column(Series::new("crop".into(), crops))?;

    for (name, accessor) in DERIVED_COLUMNS {
        let series = match accessor {
            Accessor::Float(get, _) => {
                let values: Vec<Option<f64>> = records.iter().map(|r| get(&r.derived)).collect();
                Series::new(name.into(), values)
            }
            Accessor::Flag(get, _) => {
                let values: Vec<Option<i32>> = records.iter().map(|r| get(&r.derived)).collect();
                Series::new(name.into(), values)
            }
            Accessor::Priority => {
                let values: Vec<Option<&str>> = records
                    .iter()
                    .map(|r| r.derived.intervention_priority.map(|p| p.label()))
                    .collect();
                Series::new(name.into(), values)
            }
        };
        df.with_column(series)
            .with_context(|| format!("Failed to attach column '{}'", name))?;
    }

    Ok(df)
}

/// Load an enriched CSV, enforcing the consumer column contract
pub fn load_enriched(path: &Path) -> Result<(DataFrame, Vec<Record>)> {
    let df = read_csv(path)?;
    require_columns(&df, &CONSUMER_COLUMNS, "enriched dataset")?;
    let records = records_from_frame(&df)?;
    Ok((df, records))
}

/// Only the columns downstream consumers read, in contract order
pub fn consumer_view(df: &DataFrame) -> Result<DataFrame> {
    materialize_with_columns(df, &CONSUMER_COLUMNS, "consumer view")
}
