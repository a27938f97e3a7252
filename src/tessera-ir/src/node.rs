//! Immutable IR nodes with memoized structural hashing.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use common_display::{DisplayTree, TreeNode};
use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, Schema, Shape, Value};

use crate::annotations::Bound;
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::registry;

/// An immutable, validated IR node.
///
/// Nodes are cheap to clone and share structure. Equality is structural:
/// two nodes of the same kind with equal arguments are equal and hash
/// alike. The hash is computed once at construction, so comparing deep
/// trees usually stops at the root.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

struct NodeInner {
    kind: NodeKind,
    args: Bound,
    attributes: Bound,
    hash: u64,
}

impl Node {
    /// Construct a node of `kind` from raw positional and keyword arguments.
    pub fn new(kind: NodeKind, args: Vec<Arg>, kwargs: Vec<(String, Arg)>) -> TesseraResult<Self> {
        let ty = registry::node_type(kind)?;
        if ty.is_abstract {
            return Err(TesseraError::validation(
                kind.name(),
                "<kind>",
                "cannot instantiate an abstract node type",
            ));
        }

        let args = ty.signature.validate(kind.name(), args, kwargs)?;

        let mut context = args.clone();
        let mut attributes = Bound::new();
        for (name, attribute) in &ty.attributes {
            let value = attribute
                .initialize(&context)
                .map_err(|e| match e {
                    TesseraError::Validation { .. } => e.with_node(kind.name()),
                    other => TesseraError::validation(kind.name(), *name, other.to_string()),
                })?;
            context.insert(*name, value.clone());
            attributes.insert(*name, value);
        }

        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        args.hash(&mut hasher);
        let hash = hasher.finish();

        Ok(Self(Arc::new(NodeInner {
            kind,
            args,
            attributes,
            hash,
        })))
    }

    /// Start building a node of `kind` field by field.
    pub fn builder(kind: NodeKind) -> NodeBuilder {
        NodeBuilder::new(kind)
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    /// Validated argument fields in signature order.
    pub fn args(&self) -> &Bound {
        &self.0.args
    }

    /// Derived attribute fields (`dtype`, `shape`, `schema`).
    pub fn attributes(&self) -> &Bound {
        &self.0.attributes
    }

    /// A field by name, arguments first, then attributes.
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.0.args.get(name).or_else(|| self.0.attributes.get(name))
    }

    /// A field that must be present.
    pub fn field(&self, name: &str) -> TesseraResult<&Arg> {
        self.get(name).ok_or_else(|| {
            TesseraError::internal(format!("{} has no field {name:?}", self.kind()))
        })
    }

    /// A field holding a node.
    pub fn child(&self, name: &str) -> TesseraResult<&Node> {
        self.field(name)?.as_node().ok_or_else(|| {
            TesseraError::internal(format!("{}.{name} is not a node", self.kind()))
        })
    }

    /// An optional field holding a node.
    pub fn opt_child(&self, name: &str) -> Option<&Node> {
        self.get(name).and_then(Arg::as_node)
    }

    /// A field holding a sequence of nodes.
    pub fn children_of(&self, name: &str) -> TesseraResult<Vec<&Node>> {
        match self.field(name)? {
            Arg::Seq(items) => items
                .iter()
                .map(|item| {
                    item.as_node().ok_or_else(|| {
                        TesseraError::internal(format!("{}.{name} holds a non-node", self.kind()))
                    })
                })
                .collect(),
            Arg::None => Ok(Vec::new()),
            other => Err(TesseraError::internal(format!(
                "{}.{name} is not a sequence but {}",
                self.kind(),
                other.describe()
            ))),
        }
    }

    /// A field holding a plain string.
    pub fn str_field(&self, name: &str) -> TesseraResult<&str> {
        self.field(name)?.as_str().ok_or_else(|| {
            TesseraError::internal(format!("{}.{name} is not a string", self.kind()))
        })
    }

    /// A field holding a plain integer.
    pub fn int_field(&self, name: &str) -> TesseraResult<i64> {
        self.field(name)?.as_int().ok_or_else(|| {
            TesseraError::internal(format!("{}.{name} is not an integer", self.kind()))
        })
    }

    /// A field holding a plain boolean.
    pub fn bool_field(&self, name: &str) -> TesseraResult<bool> {
        self.field(name)?.as_bool().ok_or_else(|| {
            TesseraError::internal(format!("{}.{name} is not a boolean", self.kind()))
        })
    }

    /// Cached output type of a value node.
    pub fn dtype(&self) -> Option<&DataType> {
        self.0.attributes.get("dtype").and_then(Arg::as_type)
    }

    /// Cached output shape of a value node.
    pub fn shape(&self) -> Option<Shape> {
        self.0.attributes.get("shape").and_then(Arg::as_shape)
    }

    /// Cached schema of a table node.
    pub fn schema(&self) -> Option<&Schema> {
        self.0.attributes.get("schema").and_then(Arg::as_schema)
    }

    /// The payload of a `Literal` node.
    pub fn literal_value(&self) -> Option<&Value> {
        if self.kind() == NodeKind::Literal {
            self.0.args.get("value").and_then(Arg::as_value)
        } else {
            None
        }
    }

    pub fn is_literal(&self) -> bool {
        self.kind() == NodeKind::Literal
    }

    /// Every node held by the argument fields, in field order.
    pub fn children(&self) -> Vec<&Node> {
        self.0.args.iter().flat_map(|(_, arg)| arg.nodes()).collect()
    }

    /// Rebuild this node with some argument fields replaced.
    ///
    /// The result goes through full signature validation again, since
    /// validators and attributes may depend on the replaced fields.
    pub fn replace<I, S>(&self, changes: I) -> TesseraResult<Node>
    where
        I: IntoIterator<Item = (S, Arg)>,
        S: AsRef<str>,
    {
        let ty = registry::node_type(self.kind())?;
        let mut fields = self.0.args.clone();
        for (name, arg) in changes {
            let name = name.as_ref();
            let param = ty.signature.get(name).ok_or_else(|| {
                TesseraError::validation(self.kind().name(), name, "unexpected keyword argument")
            })?;
            fields.insert(param.name, arg);
        }
        let (args, kwargs) = ty.signature.unbind(&fields);
        Node::new(self.kind(), args, kwargs)
    }

    /// Render this node and its descendants as an indented tree.
    pub fn explain(&self) -> String {
        DisplayTree::new(self).with_max_details(60).to_string()
    }

    /// Memoized structural hash.
    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash
                && self.0.kind == other.0.kind
                && self.0.args == other.0.args)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind())?;
        for (i, (name, arg)) in self.0.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match arg {
                Arg::Value(value) => write!(f, "{name}={value}")?,
                other => write!(f, "{name}={other:?}")?,
            }
        }
        write!(f, ")")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}

impl TreeNode for Node {
    fn name(&self) -> String {
        self.kind().name().to_string()
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        Node::children(self)
            .into_iter()
            .map(|node| node as &dyn TreeNode)
            .collect()
    }

    fn details(&self) -> Option<String> {
        let mut parts: Vec<String> = self
            .0
            .args
            .iter()
            .filter_map(|(name, arg)| match arg {
                Arg::Value(value) => Some(format!("{name}={value}")),
                Arg::Type(dtype) => Some(format!("{name}={dtype}")),
                _ => None,
            })
            .collect();
        if let Some(dtype) = self.dtype() {
            parts.push(format!(":: {dtype}"));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Accumulates arguments and performs one validated construction.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    kind: NodeKind,
    args: Vec<Arg>,
    kwargs: Vec<(String, Arg)>,
}

impl NodeBuilder {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
            kwargs: Vec::new(),
        }
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, arg: impl Into<Arg>) -> Self {
        self.kwargs.push((name.into(), arg.into()));
        self
    }

    pub fn build(self) -> TesseraResult<Node> {
        Node::new(self.kind, self.args, self.kwargs)
    }
}
