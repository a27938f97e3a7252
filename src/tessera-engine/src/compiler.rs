use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use common_config::TesseraConfig;
use common_error::TesseraResult;
use log::debug;
use once_cell::sync::Lazy;
use tessera_ir::Node;
use tessera_translate::{RuleTable, Translator};

use crate::backend::{Engine, Lowered};
use crate::catalog::Catalog;
use crate::frame::LazyFrame;
use crate::{arrays, relations, strings, temporal, values};

static RULES: Lazy<Arc<RuleTable<Engine>>> = Lazy::new(|| {
    let mut rules = RuleTable::new();
    values::register(&mut rules);
    arrays::register(&mut rules);
    strings::register(&mut rules);
    temporal::register(&mut rules);
    relations::register(&mut rules);
    Arc::new(rules)
});

/// Lowers IR trees to engine expressions and lazy frames.
#[derive(Debug, Clone, Default)]
pub struct EngineCompiler {
    config: TesseraConfig,
}

impl EngineCompiler {
    pub fn new(config: TesseraConfig) -> Self {
        Self { config }
    }

    /// The shared rule table of the engine target.
    pub fn rules() -> Arc<RuleTable<Engine>> {
        Arc::clone(&RULES)
    }

    /// An empty catalog carrying this compiler's engine settings.
    pub fn catalog(&self) -> Catalog {
        Catalog::new().with_config(self.config.engine.clone())
    }

    /// Lower `node`: an expression for value nodes, a frame for table nodes.
    pub fn compile(&self, node: &Node) -> TesseraResult<Lowered> {
        let mut translator = Translator::new(Engine, Self::rules(), &self.config.compiler);
        let lowered = translator.translate(node)?;
        debug!("lowered {} for the engine", node.kind());
        Ok(lowered)
    }

    /// Lower a table node to its lazy frame.
    pub fn compile_frame(&self, node: &Node) -> TesseraResult<LazyFrame> {
        self.compile(node)?.into_frame()
    }

    /// Lower and run a table node against `catalog`.
    pub fn execute(&self, node: &Node, catalog: &Catalog) -> TesseraResult<RecordBatch> {
        let frame = self.compile_frame(node)?;
        debug!("executing plan:\n{}", frame.explain());
        frame.collect(catalog)
    }
}

/// Lower and run `node` with the default configuration.
pub fn execute(node: &Node, catalog: &Catalog) -> TesseraResult<RecordBatch> {
    EngineCompiler::default().execute(node, catalog)
}
