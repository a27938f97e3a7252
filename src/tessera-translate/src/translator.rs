//! The translation driver.

use std::collections::HashMap;
use std::sync::Arc;

use common_config::CompilerConfig;
use common_error::{TesseraError, TesseraResult};
use log::{debug, trace};
use tessera_core::Value;
use tessera_ir::{Arg, Node};

use crate::backend::Backend;
use crate::rules::RuleTable;

/// Translates IR trees for one backend.
///
/// Owns the backend state and, when enabled, a memo of outputs keyed by
/// node equality, so a subtree shared by several parents renders once.
pub struct Translator<B: Backend> {
    backend: B,
    rules: Arc<RuleTable<B>>,
    memo: Option<HashMap<Node, B::Output>>,
}

impl<B: Backend> Translator<B> {
    pub fn new(backend: B, rules: Arc<RuleTable<B>>, config: &CompilerConfig) -> Self {
        Self {
            backend,
            rules,
            memo: config.memoize.then(HashMap::new),
        }
    }

    /// Translate `node` with the most specific rule registered for its kind.
    pub fn translate(&mut self, node: &Node) -> TesseraResult<B::Output> {
        if let Some(hit) = self.memo.as_ref().and_then(|memo| memo.get(node)) {
            debug!("{} backend: memo hit for {}", B::NAME, node.kind());
            return Ok(hit.clone());
        }

        let (matched, rule) = self.rules.resolve(node.kind())?;
        trace!("{} backend: {} via {} rule", B::NAME, node.kind(), matched);
        let output = rule(self, node)?;

        if let Some(memo) = self.memo.as_mut() {
            memo.insert(node.clone(), output.clone());
        }
        Ok(output)
    }

    /// Translate the node bound to `field`.
    pub fn translate_field(&mut self, node: &Node, field: &str) -> TesseraResult<B::Output> {
        let child = node.child(field)?.clone();
        self.translate(&child)
    }

    /// Translate the node bound to `field`, if present.
    pub fn translate_opt(&mut self, node: &Node, field: &str) -> TesseraResult<Option<B::Output>> {
        match node.opt_child(field).cloned() {
            Some(child) => self.translate(&child).map(Some),
            None => Ok(None),
        }
    }

    /// Translate every node of a sequence field, in order.
    pub fn translate_seq(&mut self, node: &Node, field: &str) -> TesseraResult<Vec<B::Output>> {
        let children: Vec<Node> = node.children_of(field)?.into_iter().cloned().collect();
        children.iter().map(|child| self.translate(child)).collect()
    }

    /// Run `f` with an empty memo, restoring the current one afterwards.
    ///
    /// Outputs that depend on backend scope (such as table aliases) must not
    /// be shared across scopes.
    pub fn isolated<T>(&mut self, f: impl FnOnce(&mut Self) -> TesseraResult<T>) -> TesseraResult<T> {
        let outer = self.memo.as_mut().map(std::mem::take);
        let result = f(self);
        self.memo = outer;
        result
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// The literal value bound to `field`, or an unsupported-argument error
    /// naming this backend.
    pub fn literal<'a>(&self, node: &'a Node, field: &str) -> TesseraResult<&'a Value> {
        require_literal(node, field, B::NAME)
    }

    /// Like [`Translator::literal`] but `None` for an absent optional field.
    pub fn opt_literal<'a>(&self, node: &'a Node, field: &str) -> TesseraResult<Option<&'a Value>> {
        optional_literal(node, field, B::NAME)
    }
}

/// Require `field` of `node` to hold a literal.
pub fn require_literal<'a>(node: &'a Node, field: &str, backend: &str) -> TesseraResult<&'a Value> {
    optional_literal(node, field, backend)?
        .ok_or_else(|| TesseraError::unsupported_argument(node.kind().name(), field, backend))
}

/// Require `field` of `node` to hold a literal when it is present at all.
pub fn optional_literal<'a>(
    node: &'a Node,
    field: &str,
    backend: &str,
) -> TesseraResult<Option<&'a Value>> {
    match node.get(field) {
        None | Some(Arg::None) => Ok(None),
        Some(Arg::Node(child)) if child.is_literal() => Ok(child.literal_value()),
        Some(Arg::Value(value)) => Ok(Some(value)),
        Some(_) => Err(TesseraError::unsupported_argument(
            node.kind().name(),
            field,
            backend,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{DataType, Schema};
    use tessera_ir::ops::{database_table, table_column};
    use tessera_ir::{Arg, NodeKind};

    struct Counting {
        calls: usize,
    }

    impl Backend for Counting {
        const NAME: &'static str = "counting";
        type Output = String;
    }

    fn rules() -> Arc<RuleTable<Counting>> {
        let mut table = RuleTable::new();
        table.register(NodeKind::TableColumn, |t: &mut Translator<Counting>, node| {
            t.backend_mut().calls += 1;
            Ok(node.str_field("name")?.to_string())
        });
        table.register(NodeKind::Add, |t, node| {
            let left = t.translate_field(node, "left")?;
            let right = t.translate_field(node, "right")?;
            Ok(format!("({left} + {right})"))
        });
        Arc::new(table)
    }

    fn column() -> Node {
        let t = database_table("t", Schema::from_pairs([("a", DataType::Int64)])).unwrap();
        table_column(&t, "a").unwrap()
    }

    #[test]
    fn test_memo_renders_shared_subtree_once() {
        let a = column();
        let sum = Node::new(NodeKind::Add, vec![Arg::from(&a), Arg::from(&a)], vec![]).unwrap();

        let mut memoizing = Translator::new(Counting { calls: 0 }, rules(), &CompilerConfig::default());
        assert_eq!(memoizing.translate(&sum).unwrap(), "(a + a)");
        assert_eq!(memoizing.backend().calls, 1);

        let config = CompilerConfig { memoize: false };
        let mut plain = Translator::new(Counting { calls: 0 }, rules(), &config);
        assert_eq!(plain.translate(&sum).unwrap(), "(a + a)");
        assert_eq!(plain.backend().calls, 2);
    }

    #[test]
    fn test_isolated_memo_is_discarded() {
        let a = column();
        let mut translator = Translator::new(Counting { calls: 0 }, rules(), &CompilerConfig::default());
        translator.translate(&a).unwrap();
        translator.isolated(|t| t.translate(&a)).unwrap();
        assert_eq!(translator.backend().calls, 2);
        translator.translate(&a).unwrap();
        assert_eq!(translator.backend().calls, 2);
    }

    #[test]
    fn test_require_literal() {
        let a = column();
        let sum = Node::new(NodeKind::Add, vec![Arg::from(&a), Arg::from(1i64)], vec![]).unwrap();

        assert_eq!(require_literal(&sum, "right", "counting").unwrap(), &Value::Int64(1));
        let err = require_literal(&sum, "left", "counting").unwrap_err();
        assert_eq!(
            err.to_string(),
            "UnsupportedArgumentError: Add.left must be a literal for the counting backend"
        );
        assert_eq!(optional_literal(&sum, "missing", "counting").unwrap(), None);
    }
}
