//! End-to-end pipeline tests: the documented scenarios, determinism,
//! partial success, and the evidence path.

use entity_risk_core::config::AnalysisConfig;
use entity_risk_core::error::AnalysisError;
use entity_risk_core::evidence::{EvidenceMap, EvidenceSet, SanctionsEvidence};
use entity_risk_core::normalizer::Normalizer;
use entity_risk_core::patterns::PatternKind;
use entity_risk_core::pipeline::AnalysisPipeline;
use entity_risk_core::types::{EntityType, RiskLevel};
use serde_json::json;

fn pipeline() -> AnalysisPipeline {
    AnalysisPipeline::new(AnalysisConfig::default())
}

/// The two-party mutual-payment scenario: correct types, two banking
/// relationships of weight 5000, and no circular pattern.
#[test]
fn mutual_payment_scenario() {
    let report = pipeline()
        .run_value(&json!([
            {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": 5000, "currency": "USD", "date": "2024-01-01"},
            {"sender": "Beta Bank", "receiver": "Alpha Inc", "amount": 5000, "currency": "USD", "date": "2024-01-02"}
        ]))
        .unwrap();

    assert_eq!(report.entities.len(), 2);
    let alpha = report.entities.iter().find(|e| e.name == "Alpha Inc").unwrap();
    let beta = report.entities.iter().find(|e| e.name == "Beta Bank").unwrap();
    assert_eq!(alpha.entity_type, EntityType::Corporation);
    assert_eq!(beta.entity_type, EntityType::FinancialIntermediary);

    assert_eq!(report.relationships.len(), 2);
    for relationship in &report.relationships {
        assert_eq!(relationship.weight, 5000.0);
        assert_eq!(
            relationship.inferred_type, "banking",
            "A financial intermediary endpoint infers a banking relationship"
        );
    }

    assert!(
        report
            .suspicious_patterns
            .iter()
            .all(|p| p.kind != PatternKind::CircularTransactions),
        "A 2-cycle must not be reported as circular: {:?}",
        report.suspicious_patterns
    );
    assert_eq!(report.risk_assessments.len(), 2);
}

/// A three-party ring produces exactly one high-severity circular
/// pattern end to end.
#[test]
fn ring_scenario_flags_one_circular_pattern() {
    let report = pipeline()
        .run_value(&json!([
            {"sender": "Alpha Inc", "receiver": "Beta LLC", "amount": 1000, "date": "2024-01-01"},
            {"sender": "Beta LLC", "receiver": "Gamma Corp", "amount": 1000, "date": "2024-01-02"},
            {"sender": "Gamma Corp", "receiver": "Alpha Inc", "amount": 1000, "date": "2024-01-03"}
        ]))
        .unwrap();

    let circular: Vec<_> = report
        .suspicious_patterns
        .iter()
        .filter(|p| p.kind == PatternKind::CircularTransactions)
        .collect();
    assert_eq!(circular.len(), 1);
    assert_eq!(circular[0].entities.len(), 3);
}

/// The shell scenario end to end: classification plus a high type
/// sub-score in the assessment.
#[test]
fn shell_scenario_scores_high_type_prior() {
    let mut records = Vec::new();
    for i in 0..15 {
        let receiver = if i % 2 == 0 { "Acme Corp" } else { "Beta LLC" };
        records.push(json!({
            "sender": "Global Holdings Overseas Ltd",
            "receiver": receiver,
            "amount": 1000,
            "date": "2024-01-01"
        }));
    }
    let report = pipeline().run_value(&json!(records)).unwrap();

    let shell = report
        .entities
        .iter()
        .find(|e| e.name == "Global Holdings Overseas Ltd")
        .unwrap();
    assert_eq!(shell.entity_type, EntityType::ShellCompany);

    let assessment = report
        .risk_assessments
        .iter()
        .find(|a| a.entity == "Global Holdings Overseas Ltd")
        .unwrap();
    let type_factor = assessment
        .factors
        .iter()
        .find(|f| f.name == "entity_type")
        .unwrap();
    assert!(
        type_factor.score >= 8.0,
        "Shell entity-type sub-score should be at least 8, got {}",
        type_factor.score
    );
}

/// Identical input produces an identical report: no hidden state leaks
/// between runs.
#[test]
fn pipeline_is_idempotent() {
    let input = json!([
        {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": 5000, "date": "2024-01-01 09:00:00"},
        {"sender": "Beta Bank", "receiver": "Gamma Corp", "amount": 2500, "date": "2024-01-02 09:00:00"},
        {"sender": "Gamma Corp", "receiver": "Alpha Inc", "amount": 1250, "date": "2024-01-03 09:00:00"}
    ]);
    let pipeline = pipeline();

    let first = serde_json::to_string(&pipeline.run_value(&input).unwrap()).unwrap();
    let second = serde_json::to_string(&pipeline.run_value(&input).unwrap()).unwrap();
    assert_eq!(first, second, "Two runs over the same input must match exactly");
}

/// Malformed fields degrade to warnings; only an unusable input shape
/// is fatal.
#[test]
fn partial_success_and_fatal_shapes() {
    let report = pipeline()
        .run_value(&json!([
            {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": "garbage", "date": "2024-01-01"},
            {"sender": "Beta Bank", "receiver": "Alpha Inc", "amount": 100, "date": "2024-01-02"}
        ]))
        .unwrap();
    assert_eq!(report.stats.records_in, 2);
    assert_eq!(report.stats.transactions_out, 2, "Degraded records still flow through");
    assert_eq!(report.warnings.len(), 1);

    let err = pipeline().run_value(&json!("not records")).unwrap_err();
    assert!(matches!(err, AnalysisError::UnsupportedFormat { .. }));
}

/// The evidence path runs validation for every entity and switches the
/// scorer to the evidence-integrated variant.
#[test]
fn evidence_path_validates_and_rescores() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": 5000, "date": "2024-01-01"}
    ]))
    .unwrap();

    let mut evidence = EvidenceMap::new();
    evidence.insert(
        "Beta Bank".to_string(),
        EvidenceSet {
            sanctions: Some(SanctionsEvidence {
                is_sanctioned: true,
                matches: vec!["Beta Bank".into()],
                reliability: Some(0.9),
            }),
            ..EvidenceSet::default()
        },
    );

    let report = pipeline().run_with_evidence(&records, &evidence);
    assert_eq!(report.validations.len(), 2, "Every entity gets validated");

    let beta = report
        .risk_assessments
        .iter()
        .find(|a| a.entity == "Beta Bank")
        .unwrap();
    let sanctions_factor = beta
        .factors
        .iter()
        .find(|f| f.name == "sanctions")
        .unwrap();
    assert_eq!(sanctions_factor.score, 10.0);
    assert!(beta.level >= RiskLevel::High);
}

/// A config override file with one field set falls back to defaults for
/// the rest; malformed JSON surfaces as a serialization error rather
/// than an opaque one.
#[test]
fn config_load_partial_override_and_malformed_json() {
    let dir = std::env::temp_dir();
    let good = dir.join("entity-risk-config-override.json");
    let bad = dir.join("entity-risk-config-broken.json");
    std::fs::write(&good, r#"{"min_cycle_len": 4}"#).unwrap();
    std::fs::write(&bad, r#"{"min_cycle_len": "#).unwrap();

    let loaded = AnalysisConfig::load(good.to_str().unwrap()).unwrap();
    assert_eq!(loaded.min_cycle_len, 4, "Overridden field takes effect");
    assert_eq!(
        loaded.max_cycles,
        AnalysisConfig::default().max_cycles,
        "Unset fields keep their defaults"
    );

    let err = AnalysisConfig::load(bad.to_str().unwrap()).unwrap_err();
    assert!(
        matches!(err, AnalysisError::Serialization(_)),
        "Malformed config JSON is a serialization error, got: {err}"
    );
}
