//! Per-backend dispatch tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use common_error::{TesseraError, TesseraResult};
use log::debug;
use tessera_ir::{Node, NodeKind};

use crate::backend::Backend;
use crate::translator::Translator;

/// A rendering rule: receives the translator (to translate children) and the node.
pub type Rule<B> =
    Arc<dyn Fn(&mut Translator<B>, &Node) -> TesseraResult<<B as Backend>::Output> + Send + Sync>;

/// Kind-to-rule mapping with ancestor fallback.
pub struct RuleTable<B: Backend> {
    rules: HashMap<NodeKind, Rule<B>>,
}

impl<B: Backend> RuleTable<B> {
    /// Create a table holding only the catch-all rule on `Node`.
    pub fn new() -> Self {
        let mut table = Self {
            rules: HashMap::new(),
        };
        table.register(NodeKind::Node, |_, node| {
            Err(TesseraError::dispatch(node.kind().name(), B::NAME))
        });
        table
    }

    /// Register (or replace) the rule for `kind`.
    pub fn register<F>(&mut self, kind: NodeKind, rule: F) -> &mut Self
    where
        F: Fn(&mut Translator<B>, &Node) -> TesseraResult<B::Output> + Send + Sync + 'static,
    {
        self.rules.insert(kind, Arc::new(rule));
        self
    }

    /// Register one rule for several kinds.
    pub fn register_many<F>(&mut self, kinds: &[NodeKind], rule: F) -> &mut Self
    where
        F: Fn(&mut Translator<B>, &Node) -> TesseraResult<B::Output> + Send + Sync + 'static,
    {
        let rule: Rule<B> = Arc::new(rule);
        for kind in kinds {
            self.rules.insert(*kind, Arc::clone(&rule));
        }
        self
    }

    /// Whether `kind` has a rule of its own (not counting fallbacks).
    pub fn contains(&self, kind: NodeKind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Find the most specific rule for `kind` along its ancestor chain.
    ///
    /// Returns the kind the rule was registered under together with the rule.
    pub fn resolve(&self, kind: NodeKind) -> TesseraResult<(NodeKind, Rule<B>)> {
        for candidate in kind.mro() {
            if let Some(rule) = self.rules.get(&candidate) {
                if candidate != kind {
                    debug!(
                        "{} backend: {} falls back to the {} rule",
                        B::NAME,
                        kind,
                        candidate
                    );
                }
                return Ok((candidate, Arc::clone(rule)));
            }
        }
        // Reachable only if the catch-all was replaced by a caller.
        Err(TesseraError::dispatch(kind.name(), B::NAME))
    }

    /// Number of registered kinds, the catch-all included.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<B: Backend> Default for RuleTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for RuleTable<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.rules.keys().map(|kind| kind.name()).collect();
        kinds.sort_unstable();
        f.debug_struct("RuleTable")
            .field("backend", &B::NAME)
            .field("kinds", &kinds)
            .finish()
    }
}
