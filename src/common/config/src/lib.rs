//! Configuration management for Tessera.
//!
//! Provides knobs for the translator, the SQL text target and the embedded
//! columnar engine.

use serde::{Deserialize, Serialize};

/// Global Tessera configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TesseraConfig {
    /// Translator configuration shared by every backend.
    pub compiler: CompilerConfig,
    /// SQL text target configuration.
    pub sql: SqlConfig,
    /// Embedded engine configuration.
    pub engine: EngineConfig,
}

impl TesseraConfig {
    /// Parse a configuration from JSON, filling unspecified sections with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Translator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Cache renderings of structurally equal nodes within one translation.
    pub memoize: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { memoize: true }
    }
}

/// Index origin of positional string functions on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndexOrigin {
    /// Offsets start at 0, same as the IR.
    Zero,
    /// Offsets start at 1.
    #[default]
    One,
}

impl IndexOrigin {
    /// Amount added to an IR offset before emission.
    pub fn offset(self) -> i64 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }
}

/// SQL text target configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Character used to quote identifiers.
    pub identifier_quote: char,
    /// Index origin of the target's string functions.
    pub index_origin: IndexOrigin,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            identifier_quote: '`',
            index_origin: IndexOrigin::One,
        }
    }
}

/// Embedded engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether null join keys match each other.
    pub null_join_keys_match: bool,
}
