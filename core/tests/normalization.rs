//! Normalizer integration tests: field mapping, coercion, degradation.

use entity_risk_core::config::AnalysisConfig;
use entity_risk_core::error::AnalysisError;
use entity_risk_core::normalizer::Normalizer;
use serde_json::json;

fn normalizer() -> Normalizer {
    Normalizer::new(&AnalysisConfig::default())
}

/// Currency symbols and thousands separators come off amount strings.
#[test]
fn amount_string_with_currency_symbol_is_coerced() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "Alpha Inc", "receiver": "Beta Bank", "amount": "$1,200.50"}
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);

    assert_eq!(batch.transactions.len(), 1);
    assert!(
        (batch.transactions[0].amount - 1200.50).abs() < 1e-9,
        "Expected 1200.50, got {}",
        batch.transactions[0].amount
    );
    assert!(batch.warnings.is_empty(), "Clean coercion should not warn");
}

/// Negative and unparseable amounts degrade to 0.0 with a warning,
/// never an error.
#[test]
fn bad_amounts_degrade_to_zero() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "A Corp", "receiver": "B Corp", "amount": -50},
        {"sender": "A Corp", "receiver": "B Corp", "amount": "lots"}
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);

    assert_eq!(batch.transactions.len(), 2, "Both records must survive");
    assert_eq!(batch.transactions[0].amount, 0.0);
    assert_eq!(batch.transactions[1].amount, 0.0);
    assert_eq!(batch.warnings.len(), 2, "One warning per degraded amount");
}

/// Unparseable timestamps fall back to the current time with a warning.
#[test]
fn bad_timestamp_falls_back_without_failing() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "A Corp", "receiver": "B Corp", "amount": 10, "date": "not-a-date"}
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);

    assert_eq!(batch.transactions.len(), 1);
    assert_eq!(batch.warnings.len(), 1, "Fallback timestamp must warn");
    assert_eq!(batch.warnings[0].field, "timestamp");
}

/// All documented timestamp formats parse.
#[test]
fn timestamp_formats_accepted() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "A", "receiver": "B", "amount": 1, "date": "2024-01-15 10:30:00"},
        {"sender": "A", "receiver": "B", "amount": 1, "date": "2024-01-15"},
        {"sender": "A", "receiver": "B", "amount": 1, "date": "03/15/2024"},
        {"sender": "A", "receiver": "B", "amount": 1, "date": "2024-01-15T10:30:00Z"}
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);

    assert!(
        batch.warnings.is_empty(),
        "No warnings expected, got {:?}",
        batch.warnings
    );
}

/// Missing transaction IDs get a synthesized sequence ID.
#[test]
fn missing_ids_are_synthesized_in_sequence() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "A Corp", "receiver": "B Corp", "amount": 1},
        {"sender": "A Corp", "receiver": "B Corp", "amount": 2}
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);

    assert_eq!(batch.transactions[0].id, "TX-000000");
    assert_eq!(batch.transactions[1].id, "TX-000001");
}

/// Field synonyms map onto canonical names; unknown fields survive in
/// raw_fields.
#[test]
fn synonyms_map_and_extras_are_preserved() {
    let records = Normalizer::records_from_value(&json!([
        {
            "from": "Alpha Inc",
            "to": "Beta Bank",
            "sum": 750,
            "transaction_type": "wire",
            "country": "Panama"
        }
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);
    let tx = &batch.transactions[0];

    assert_eq!(tx.sender, "Alpha Inc");
    assert_eq!(tx.receiver, "Beta Bank");
    assert_eq!(tx.amount, 750.0);
    assert_eq!(tx.tx_type, "wire");
    assert_eq!(tx.raw_text("country"), Some("Panama"));
}

/// Missing currency and type fall back to documented defaults.
#[test]
fn currency_and_type_defaults() {
    let records = Normalizer::records_from_value(&json!([
        {"sender": "A Corp", "receiver": "B Corp", "amount": 10}
    ]))
    .unwrap();
    let batch = normalizer().normalize(&records);

    assert_eq!(batch.transactions[0].currency, "USD");
    assert_eq!(batch.transactions[0].tx_type, "unknown");
}

/// Supported input shapes: record array, wrapped array, single record.
#[test]
fn accepted_input_shapes() {
    let array = json!([{"sender": "A", "receiver": "B"}]);
    let wrapped = json!({"transactions": [{"sender": "A", "receiver": "B"}]});
    let single = json!({"sender": "A", "receiver": "B"});

    assert_eq!(Normalizer::records_from_value(&array).unwrap().len(), 1);
    assert_eq!(Normalizer::records_from_value(&wrapped).unwrap().len(), 1);
    assert_eq!(Normalizer::records_from_value(&single).unwrap().len(), 1);
}

/// Non-record inputs are the one fatal case.
#[test]
fn unusable_shapes_are_rejected() {
    for value in [json!(42), json!("transactions"), json!([1, 2, 3])] {
        let err = Normalizer::records_from_value(&value).unwrap_err();
        assert!(
            matches!(err, AnalysisError::UnsupportedFormat { .. }),
            "Expected UnsupportedFormat for {value}, got {err}"
        );
    }
}
