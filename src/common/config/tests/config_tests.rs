//! Unit tests for common-config crate

use common_config::{CompilerConfig, EngineConfig, IndexOrigin, SqlConfig, TesseraConfig};

#[test]
fn test_tessera_config_default() {
    let config = TesseraConfig::default();

    assert!(config.compiler.memoize);
    assert_eq!(config.sql.identifier_quote, '`');
    assert_eq!(config.sql.index_origin, IndexOrigin::One);
    assert!(!config.engine.null_join_keys_match);
}

#[test]
fn test_index_origin_offset() {
    assert_eq!(IndexOrigin::default(), IndexOrigin::One);
    assert_eq!(IndexOrigin::One.offset(), 1);
    assert_eq!(IndexOrigin::Zero.offset(), 0);
}

#[test]
fn test_tessera_config_serialization() {
    let mut config = TesseraConfig::default();
    config.compiler.memoize = false;
    config.sql.identifier_quote = '"';
    config.sql.index_origin = IndexOrigin::Zero;
    config.engine.null_join_keys_match = true;

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: TesseraConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized, config);
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = TesseraConfig::from_json(r#"{"sql": {"identifier_quote": "\""}}"#).unwrap();

    assert_eq!(config.sql.identifier_quote, '"');
    assert_eq!(config.sql.index_origin, IndexOrigin::One);
    assert_eq!(config.compiler, CompilerConfig::default());
    assert_eq!(config.engine, EngineConfig::default());
}

#[test]
fn test_sql_config_serialization() {
    let config = SqlConfig {
        identifier_quote: '[',
        index_origin: IndexOrigin::Zero,
    };

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("Zero"));

    let deserialized: SqlConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.identifier_quote, '[');
    assert_eq!(deserialized.index_origin, IndexOrigin::Zero);
}

#[test]
fn test_invalid_json_is_rejected() {
    assert!(TesseraConfig::from_json("{\"compiler\": {\"memoize\": 3}}").is_err());
}
