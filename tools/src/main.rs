//! risk-runner: batch entity-risk analysis over a JSON transaction file.
//!
//! Usage:
//!   risk-runner --input transactions.json
//!   risk-runner --input transactions.json --config config.json --pretty
//!   risk-runner --input transactions.json --evidence evidence.json

use anyhow::{Context, Result};
use entity_risk_core::{
    config::AnalysisConfig,
    evidence::EvidenceMap,
    normalizer::Normalizer,
    pipeline::{AnalysisPipeline, AnalysisReport},
    types::RiskLevel,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(input) = flag_value(&args, "--input") else {
        eprintln!("Usage: risk-runner --input FILE [--config FILE] [--evidence FILE] [--pretty]");
        std::process::exit(2);
    };
    let config_path = flag_value(&args, "--config");
    let evidence_path = flag_value(&args, "--evidence");
    let pretty = args.iter().any(|a| a == "--pretty");

    let config = match config_path {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    let raw = std::fs::read_to_string(input).with_context(|| format!("Cannot read {input}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{input} is not valid JSON"))?;

    let pipeline = AnalysisPipeline::new(config);
    let report = match evidence_path {
        Some(path) => {
            let raw =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            let evidence: EvidenceMap = serde_json::from_str(&raw)
                .with_context(|| format!("{path} is not a valid evidence map"))?;
            let records = Normalizer::records_from_value(&value)?;
            pipeline.run_with_evidence(&records, &evidence)
        }
        None => pipeline.run_value(&value)?,
    };

    print_summary(&report);

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    eprintln!("=== ANALYSIS SUMMARY ===");
    eprintln!("  records in:      {}", report.stats.records_in);
    eprintln!("  transactions:    {}", report.stats.transactions_out);
    eprintln!("  entities:        {}", report.stats.entities);
    eprintln!("  skipped parties: {}", report.stats.skipped_parties);
    eprintln!("  relationships:   {}", report.relationships.len());
    eprintln!("  patterns:        {}", report.suspicious_patterns.len());
    eprintln!("  warnings:        {}", report.warnings.len());

    let elevated: Vec<_> = report
        .risk_assessments
        .iter()
        .filter(|a| a.level >= RiskLevel::High)
        .collect();
    if !elevated.is_empty() {
        eprintln!();
        eprintln!("=== ELEVATED RISK ===");
        for assessment in elevated {
            eprintln!(
                "  {:<40} {:>4.1} ({})",
                assessment.entity,
                assessment.score,
                assessment.level.as_str()
            );
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
