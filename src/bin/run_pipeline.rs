// Enrichment entry point
//
// Loads the merged state × crop × year table and the disease rules, runs the
// stress engines followed by the confidence evaluation, and writes the
// enriched CSV. Set AGRO_RUN_REPORT to also write the stage reports, priority
// cutoffs and per-system confidence as JSON.
//
// Usage: cargo run --release --bin run_pipeline

use agro_stress::{enriched_frame, write_csv, AgroData, ScoringConfig, StressPipeline};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agro_stress=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input = env_path("AGRO_INPUT", "data/cleaned/final_merged_dataset.csv");
    let rules_path = env_path("AGRO_RULES", "data/cleaned/disease_rules.csv");
    let output = env_path("AGRO_OUTPUT", "data/cleaned/final_agro_stress_dataset.csv");

    tracing::info!("Configuration:");
    tracing::info!("  AGRO_INPUT: {:?}", input);
    tracing::info!("  AGRO_RULES: {:?}", rules_path);
    tracing::info!("  AGRO_OUTPUT: {:?}", output);

    let config = match std::env::var("AGRO_CONFIG") {
        Ok(path) => {
            tracing::info!("  AGRO_CONFIG: {}", path);
            ScoringConfig::load(path.as_ref())?
        }
        Err(_) => ScoringConfig::default(),
    };

    let start = Instant::now();
    let data = AgroData::load(&input, &rules_path)?;
    let pipeline = StressPipeline::new(config, &data.rules)?;

    let (dataset, confidence) = pipeline.run_with_confidence(data.records)?;
    let low_confidence = confidence.iter().filter(|c| c.confidence_score < 0.5).count();
    tracing::info!(
        "{} of {} systems scored below 0.5 confidence",
        low_confidence,
        confidence.len()
    );

    let mut enriched = enriched_frame(&data.frame, &dataset.records)?;
    write_csv(&mut enriched, &output)?;

    if let Ok(report_path) = std::env::var("AGRO_RUN_REPORT") {
        let report = serde_json::json!({
            "rows": dataset.len(),
            "stages": dataset.reports,
            "cutoffs": dataset.cutoffs,
            "confidence": confidence,
        });
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("Failed to write run report: {}", report_path))?;
        tracing::info!("Run report written to {}", report_path);
    }

    tracing::info!(
        "Wrote {} rows × {} columns to {:?} in {:.2?}",
        enriched.height(),
        enriched.width(),
        output,
        start.elapsed()
    );

    Ok(())
}
