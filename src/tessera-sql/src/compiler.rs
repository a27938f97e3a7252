use std::sync::Arc;

use common_config::TesseraConfig;
use common_error::TesseraResult;
use log::debug;
use once_cell::sync::Lazy;
use tessera_ir::Node;
use tessera_translate::{RuleTable, Translator};

use crate::backend::Sql;
use crate::{relations, strings, temporal, values};

static RULES: Lazy<Arc<RuleTable<Sql>>> = Lazy::new(|| {
    let mut rules = RuleTable::new();
    values::register(&mut rules);
    strings::register(&mut rules);
    temporal::register(&mut rules);
    relations::register(&mut rules);
    Arc::new(rules)
});

/// Compiles IR trees to SQL text.
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {
    config: TesseraConfig,
}

impl SqlCompiler {
    pub fn new(config: TesseraConfig) -> Self {
        Self { config }
    }

    /// The shared rule table of the SQL target.
    pub fn rules() -> Arc<RuleTable<Sql>> {
        Arc::clone(&RULES)
    }

    /// Render `node`: a fragment for value nodes, a statement for table nodes.
    pub fn compile(&self, node: &Node) -> TesseraResult<String> {
        let mut translator = Translator::new(
            Sql::new(self.config.sql.clone()),
            Self::rules(),
            &self.config.compiler,
        );
        let sql = translator.translate(node)?;
        debug!("compiled {} to {} bytes of SQL", node.kind(), sql.len());
        Ok(sql)
    }
}

/// Compile with the default configuration.
pub fn to_sql(node: &Node) -> TesseraResult<String> {
    SqlCompiler::default().compile(node)
}
