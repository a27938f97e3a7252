//! Capability traits implemented by nodes.
//!
//! A node's kind decides which capabilities it has: value kinds are
//! [`Named`] and [`Typed`], table kinds are [`Relational`]. Asking a node
//! for a capability it lacks is a type error.

use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, Schema, Shape};

use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::node::Node;

/// Nodes with a display/output name.
pub trait Named {
    fn name(&self) -> TesseraResult<String>;
}

/// Value nodes with an output type and shape.
pub trait Typed {
    fn output_dtype(&self) -> TesseraResult<DataType>;
    fn output_shape(&self) -> TesseraResult<Shape>;
}

/// Table nodes with an output schema.
pub trait Relational {
    fn output_schema(&self) -> TesseraResult<&Schema>;
}

/// Handle handed to front-ends, tagged by what the node produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Scalar(Node),
    Column(Node),
    Table(Node),
}

impl Expr {
    pub fn node(&self) -> &Node {
        match self {
            Self::Scalar(node) | Self::Column(node) | Self::Table(node) => node,
        }
    }
}

/// Conversion of a node into a front-end handle.
pub trait ToExpr {
    fn to_expr(&self) -> TesseraResult<Expr>;
}

impl Named for Node {
    fn name(&self) -> TesseraResult<String> {
        match self.kind() {
            NodeKind::Alias
            | NodeKind::TableColumn
            | NodeKind::DatabaseTable
            | NodeKind::InMemoryTable => {
                Ok(self.str_field("name")?.to_string())
            }
            NodeKind::Literal => Ok(self
                .literal_value()
                .map(ToString::to_string)
                .unwrap_or_default()),
            kind if kind.is_value() => {
                let names = self
                    .args()
                    .iter()
                    .flat_map(|(_, arg)| arg.nodes())
                    .filter(|child| child.kind().is_value())
                    .map(Named::name)
                    .collect::<TesseraResult<Vec<_>>>()?;
                Ok(format!("{kind}({})", names.join(", ")))
            }
            kind => Err(TesseraError::type_error(format!("{kind} is not named"))),
        }
    }
}

impl Typed for Node {
    fn output_dtype(&self) -> TesseraResult<DataType> {
        self.dtype()
            .cloned()
            .ok_or_else(|| TesseraError::type_error(format!("{} is not a value", self.kind())))
    }

    fn output_shape(&self) -> TesseraResult<Shape> {
        self.shape()
            .ok_or_else(|| TesseraError::type_error(format!("{} is not a value", self.kind())))
    }
}

impl Relational for Node {
    fn output_schema(&self) -> TesseraResult<&Schema> {
        self.schema()
            .ok_or_else(|| TesseraError::type_error(format!("{} is not a table", self.kind())))
    }
}

impl ToExpr for Node {
    fn to_expr(&self) -> TesseraResult<Expr> {
        if self.kind().is_table() {
            return Ok(Expr::Table(self.clone()));
        }
        match self.output_shape()? {
            Shape::Scalar => Ok(Expr::Scalar(self.clone())),
            Shape::Columnar => Ok(Expr::Column(self.clone())),
        }
    }
}

/// Name of a value node held by `arg`.
pub(crate) fn arg_name(arg: &Arg) -> TesseraResult<String> {
    arg.as_node()
        .ok_or_else(|| TesseraError::type_error(format!("{} is not named", arg.describe())))?
        .name()
}
