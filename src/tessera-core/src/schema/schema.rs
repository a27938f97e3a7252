//! Ordered column-name-to-type schema of a relation.

use serde::{Deserialize, Serialize};

use crate::types::DataType;

/// Information about a column in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: DataType,
    /// Whether this column can contain nulls.
    pub nullable: bool,
}

impl ColumnInfo {
    /// Create a new nullable column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Set nullable for this column.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Schema of a relation: an ordered list of uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema with the given columns.
    pub fn with_columns(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    /// Build a schema from `(name, type)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, dtype)| ColumnInfo::new(name, dtype))
                .collect(),
        }
    }

    /// Add a column to the schema.
    pub fn add_column(&mut self, column: ColumnInfo) {
        self.columns.push(column);
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of the named column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Data type of the named column.
    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.column(name).map(|c| &c.data_type)
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of columns that appear more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) && !duplicates.contains(&column.name.as_str()) {
                duplicates.push(column.name.as_str());
            }
        }
        duplicates
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", column.name, column.data_type)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Schema {
        Schema::from_pairs([
            ("id", DataType::Int64),
            ("name", DataType::String),
            ("score", DataType::Float64),
        ])
    }

    #[test]
    fn test_lookup() {
        let schema = people();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.data_type("score"), Some(&DataType::Float64));
        assert!(!schema.contains("missing"));
        assert_eq!(schema.column_names(), vec!["id", "name", "score"]);
    }

    #[test]
    fn test_duplicates() {
        let mut schema = people();
        schema.add_column(ColumnInfo::new("id", DataType::Int32));
        assert_eq!(schema.duplicate_names(), vec!["id"]);
        assert!(people().duplicate_names().is_empty());
    }

    #[test]
    fn test_display() {
        let schema = Schema::from_pairs([("a", DataType::Int64), ("b", DataType::Bool)]);
        assert_eq!(schema.to_string(), "{a: int64, b: boolean}");
    }
}
