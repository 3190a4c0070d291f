//! Agro-Stress Index Pipeline
//!
//! Enriches a state × crop × year agricultural table with stress indicators,
//! a composite stress index, resilience, and an intervention priority.
//!
//! Layout:
//! - `utils/`: grouping, statistics, group normalization, column validation
//! - `data`: CSV loading and enriched frame assembly with Polars
//! - `metrics/`: one engine per indicator family (nutrient, climate, disease,
//!   yield, composite, priority)
//! - `pipeline`: runs the engines in order over the full dataset
//! - `analysis/`: prediction confidence and policy summaries

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod utils;

// Re-export commonly used types
pub use config::ScoringConfig;
pub use data::{enriched_frame, load_enriched, write_csv, AgroData};
pub use error::PipelineError;
pub use pipeline::{EnrichedDataset, StressPipeline};
pub use record::{DerivedColumns, DiseaseRule, Priority, Record};
