//! In-memory table catalog scanned by the engine.

use std::collections::HashMap;

use arrow::record_batch::RecordBatch;

use common_config::EngineConfig;
use common_error::{TesseraError, TesseraResult};

/// Named in-memory tables plus the engine configuration they are queried with.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, RecordBatch>,
    config: EngineConfig,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register `batch` under `name`, returning the table it replaced.
    pub fn register(&mut self, name: impl Into<String>, batch: RecordBatch) -> Option<RecordBatch> {
        self.tables.insert(name.into(), batch)
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> TesseraResult<&RecordBatch> {
        self.tables
            .get(name)
            .ok_or_else(|| TesseraError::execution(format!("table not found: {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};

    #[test]
    fn test_register_and_lookup() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap();

        let mut catalog = Catalog::new();
        assert!(catalog.register("b", batch.clone()).is_none());
        assert!(catalog.register("a", batch.clone()).is_none());
        assert!(catalog.register("a", batch).is_some());

        assert_eq!(catalog.table_names(), vec!["a", "b"]);
        assert_eq!(catalog.get("a").unwrap().num_rows(), 2);
        let err = catalog.get("missing").unwrap_err();
        assert_eq!(err.to_string(), "ExecutionError: table not found: missing");
    }
}
