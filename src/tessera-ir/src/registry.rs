//! Per-kind type definitions: merged signatures, attributes and abstractness.

use std::collections::HashMap;

use common_error::{TesseraError, TesseraResult};
use once_cell::sync::Lazy;
use tessera_core::{DataType, Schema, Shape};

use crate::annotations::{Argument, Attribute, Bound, Parameter, Signature};
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::ops;

/// Definition of one node type.
#[derive(Debug)]
pub struct NodeType {
    pub kind: NodeKind,
    pub is_abstract: bool,
    /// Arguments, merged with every supertype's.
    pub signature: Signature,
    /// Derived fields, merged with every supertype's.
    pub attributes: Vec<(&'static str, Attribute)>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::default();
    ops::register_all(&mut registry);
    registry
});

/// Look up the definition of `kind`.
pub fn node_type(kind: NodeKind) -> TesseraResult<&'static NodeType> {
    REGISTRY
        .types
        .get(&kind)
        .ok_or_else(|| TesseraError::internal(format!("node type {kind} is not registered")))
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    types: HashMap<NodeKind, NodeType>,
}

impl Registry {
    /// Start defining `kind`; its parent must already be defined.
    pub(crate) fn define(&mut self, kind: NodeKind) -> TypeBuilder<'_> {
        TypeBuilder {
            registry: self,
            kind,
            is_abstract: false,
            params: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Define several concrete kinds that add nothing to their parent but
    /// the listed attributes.
    pub(crate) fn leaves<F>(&mut self, kinds: &[NodeKind], mut configure: F)
    where
        F: FnMut(TypeBuilder<'_>) -> TypeBuilder<'_>,
    {
        for kind in kinds {
            configure(self.define(*kind)).finish();
        }
    }
}

/// Accumulates the declaration of a node type.
pub(crate) struct TypeBuilder<'a> {
    registry: &'a mut Registry,
    kind: NodeKind,
    is_abstract: bool,
    params: Vec<Parameter>,
    attributes: Vec<(&'static str, Attribute)>,
}

type DtypeRule = fn(&Bound) -> TesseraResult<DataType>;
type ShapeRule = fn(&Bound) -> TesseraResult<Shape>;
type SchemaRule = fn(&Bound) -> TesseraResult<Schema>;

impl<'a> TypeBuilder<'a> {
    pub(crate) fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub(crate) fn arg(mut self, name: &'static str, argument: Argument) -> Self {
        self.params.push(Parameter::new(name, argument));
        self
    }

    pub(crate) fn attr(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.push((name, attribute));
        self
    }

    /// Output type rule of a value node.
    pub(crate) fn dtype(self, rule: DtypeRule) -> Self {
        self.attr("dtype", Attribute::new(move |bound| rule(bound).map(Arg::Type)))
    }

    /// Output shape rule of a value node.
    pub(crate) fn shape(self, rule: ShapeRule) -> Self {
        self.attr("shape", Attribute::new(move |bound| rule(bound).map(Arg::Shape)))
    }

    /// Output schema rule of a table node.
    pub(crate) fn schema(self, rule: SchemaRule) -> Self {
        self.attr("schema", Attribute::new(move |bound| rule(bound).map(Arg::Schema)))
    }

    pub(crate) fn finish(self) {
        let parent = self
            .kind
            .parent()
            .and_then(|parent| self.registry.types.get(&parent));
        debug_assert!(
            self.kind.parent().is_none() || parent.is_some(),
            "{} defined before its parent",
            self.kind
        );

        let declared = Signature::new(self.params);
        let signature = match parent {
            Some(parent) => Signature::merge(&[&parent.signature], declared),
            None => Signature::merge(&[], declared),
        };

        let mut attributes = parent.map(|p| p.attributes.clone()).unwrap_or_default();
        for (name, attribute) in self.attributes {
            match attributes.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = attribute,
                None => attributes.push((name, attribute)),
            }
        }

        self.registry.types.insert(
            self.kind,
            NodeType {
                kind: self.kind,
                is_abstract: self.is_abstract,
                signature,
                attributes,
            },
        );
    }
}
