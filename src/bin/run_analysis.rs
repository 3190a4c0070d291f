// Policy analysis over an enriched dataset
//
// Reads the enriched CSV written by run_pipeline, checks the columns that
// downstream consumers depend on, and prints the summary tables. Set
// AGRO_REPORT to also write them as JSON.
//
// Usage: cargo run --release --bin run_analysis

use agro_stress::analysis::{
    compute_prediction_confidence, crop_resilience_ranking, crop_stress_variability,
    most_fragile_systems, state_level_summary, stress_heatmap_matrix, system_summary,
    top_high_risk_systems, GroupConfidence, StateSummary, SystemYear, ThresholdRecall,
};
use agro_stress::data::consumer_view;
use agro_stress::{load_enriched, EnrichedDataset, ScoringConfig, StressPipeline};
use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TOP_N: usize = 10;

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{:.4}", v))
}

fn print_states(rows: &[StateSummary]) {
    println!("\nState-level summary (by mean stress)");
    println!("{:<24} {:>10} {:>10} {:>8} {:>8}", "state", "stress", "resil.", "high%", "fragile%");
    for r in rows {
        println!(
            "{:<24} {:>10} {:>10} {:>8.1} {:>8.1}",
            r.state,
            fmt_opt(r.avg_agro_stress),
            fmt_opt(r.avg_resilience),
            r.high_priority_pct,
            r.fragile_system_pct
        );
    }
}

fn print_system_years(title: &str, rows: &[SystemYear]) {
    println!("\n{}", title);
    for r in rows {
        println!(
            "  {:<20} {:<14} {}  stress={} resilience={} {}",
            r.state,
            r.crop,
            r.year,
            fmt_opt(r.agro_stress_index),
            fmt_opt(r.resilience_score),
            r.intervention_priority.map_or("NA", |p| p.label())
        );
    }
}

fn print_confidence(rows: &[GroupConfidence]) {
    println!("\nPrediction confidence per system");
    println!("{:<20} {:<14} {:>6} {:>6} {:>6} {:>6} {:>8}", "state", "crop", "years", "pred", "actual", "hit", "score");
    for r in rows {
        println!(
            "{:<20} {:<14} {:>6} {:>6} {:>6} {:>6} {:>8.3}",
            r.state, r.crop, r.total_years, r.predicted_lows, r.actual_lows, r.correct_lows, r.confidence_score
        );
    }
}

fn print_sweep(rows: &[ThresholdRecall]) {
    println!("\nThreshold sweep");
    for r in rows {
        println!(
            "  threshold={:.2}  recall={:.3}  ({}/{})",
            r.threshold, r.recall, r.correct, r.actual
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agro_stress=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input = std::env::var("AGRO_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/cleaned/final_agro_stress_dataset.csv"));
    let config = match std::env::var("AGRO_CONFIG") {
        Ok(path) => ScoringConfig::load(path.as_ref())?,
        Err(_) => ScoringConfig::default(),
    };

    tracing::info!("Loading enriched dataset from {:?}", input);
    let (frame, records) = load_enriched(&input)?;
    let dataset = EnrichedDataset::from_records(records);
    tracing::info!("  Records: {}  Systems: {}", dataset.len(), dataset.systems().len());

    let view = consumer_view(&frame)?;
    println!("Consumer columns (first rows)\n{}", view.head(Some(5)));

    let pipeline = StressPipeline::new(config, &[])?;

    let states = state_level_summary(&dataset.records);
    let crops = crop_resilience_ranking(&dataset.records);
    let top_risk = top_high_risk_systems(&dataset.records, TOP_N);
    let fragile = most_fragile_systems(&dataset.records, TOP_N);
    let heatmap = stress_heatmap_matrix(&dataset.records);
    let systems = system_summary(&dataset.records);
    let variability = crop_stress_variability(&dataset.records);
    let confidence =
        compute_prediction_confidence(&dataset.records, dataset.systems(), &pipeline.config().confidence);
    let sweep = pipeline.threshold_sweep(&dataset);

    print_states(&states);

    println!("\nCrop resilience ranking");
    for c in &crops {
        println!(
            "  {:<16} resilience={} stress={}",
            c.crop,
            fmt_opt(c.avg_resilience),
            fmt_opt(c.avg_stress)
        );
    }

    print_system_years("Top high-risk state-crop-years", &top_risk);
    print_system_years("Most fragile state-crop-years", &fragile);

    println!("\nCrop stress variability (std of normalized components)");
    for v in &variability {
        println!(
            "  {:<16} nutrient={} climate={} disease={}",
            v.crop,
            fmt_opt(v.nutrient_stress_std),
            fmt_opt(v.climate_stress_std),
            fmt_opt(v.disease_risk_std)
        );
    }

    print_confidence(&confidence);
    print_sweep(&sweep);

    if let Ok(report_path) = std::env::var("AGRO_REPORT") {
        let report = serde_json::json!({
            "state_summary": states,
            "crop_ranking": crops,
            "top_high_risk": top_risk,
            "most_fragile": fragile,
            "stress_heatmap": heatmap,
            "system_summary": systems,
            "crop_variability": variability,
            "confidence": confidence,
            "threshold_sweep": sweep,
        });
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("Failed to write report: {}", report_path))?;
        tracing::info!("Report written to {}", report_path);
    }

    Ok(())
}
