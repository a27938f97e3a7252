//! Raw and validated field values.

use tessera_core::{DataType, Schema, Shape, Value};

use crate::node::Node;

/// A node field value.
///
/// Constructors receive raw `Arg`s; validators coerce them (for example a
/// bare [`Value`] into a `Literal` node) and the validated form is what a
/// node stores and hands back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arg {
    /// Absent optional field.
    None,
    /// A plain scalar (names, flags, counts, literal payloads).
    Value(Value),
    /// A nested IR node.
    Node(Node),
    /// An ordered sequence of fields.
    Seq(Vec<Arg>),
    /// An ordered name-to-field mapping.
    Map(Vec<(String, Arg)>),
    /// A logical data type.
    Type(DataType),
    /// An expression shape.
    Shape(Shape),
    /// A relation schema.
    Schema(Schema),
}

impl Arg {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_int64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_seq(&self) -> Option<&[Arg]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, Arg)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&DataType> {
        match self {
            Self::Type(dtype) => Some(dtype),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<Shape> {
        match self {
            Self::Shape(shape) => Some(*shape),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    /// Nodes directly held by this field, in order.
    ///
    /// Sequences and mappings are flattened one level deep per nesting.
    pub fn nodes(&self) -> Vec<&Node> {
        match self {
            Self::Node(node) => vec![node],
            Self::Seq(items) => items.iter().flat_map(Arg::nodes).collect(),
            Self::Map(entries) => entries.iter().flat_map(|(_, arg)| arg.nodes()).collect(),
            _ => Vec::new(),
        }
    }

    /// Short description used in validation messages.
    pub fn describe(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Value(value) => format!("{} {value}", value.type_name()),
            Self::Node(node) => format!("{} node", node.kind()),
            Self::Seq(items) => format!("sequence of {}", items.len()),
            Self::Map(entries) => format!("mapping of {}", entries.len()),
            Self::Type(dtype) => format!("type {dtype}"),
            Self::Shape(shape) => format!("shape {shape}"),
            Self::Schema(schema) => format!("schema {schema}"),
        }
    }
}

impl From<Node> for Arg {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<&Node> for Arg {
    fn from(node: &Node) -> Self {
        Self::Node(node.clone())
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Self::Value(Value::Int64(i))
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Self::Value(Value::Float64(f))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }
}

impl From<DataType> for Arg {
    fn from(dtype: DataType) -> Self {
        Self::Type(dtype)
    }
}

impl From<Schema> for Arg {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

impl From<Shape> for Arg {
    fn from(shape: Shape) -> Self {
        Self::Shape(shape)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(item: Option<T>) -> Self {
        item.map_or(Self::None, Into::into)
    }
}
