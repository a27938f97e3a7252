//! Field descriptors.

use std::fmt;
use std::sync::Arc;

use common_error::TesseraResult;

use super::validator::{self, Validator};
use super::Bound;
use crate::arg::Arg;

/// How a parameter binds call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Bound by position or by keyword.
    Positional,
    /// Bound by keyword only.
    KeywordOnly,
    /// Collects all remaining positional arguments into a sequence.
    Variadic,
}

type ProducerFn = dyn Fn(&Bound) -> Arg + Send + Sync;

/// Default of an argument.
#[derive(Clone)]
pub enum DefaultValue {
    /// The caller must supply a value.
    Mandatory,
    /// Computed from the fields bound before this one.
    Producer(Arc<ProducerFn>),
}

impl DefaultValue {
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::Mandatory)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mandatory => write!(f, "Mandatory"),
            Self::Producer(_) => write!(f, "Producer"),
        }
    }
}

/// Descriptor of a constructor argument.
#[derive(Debug, Clone)]
pub struct Argument {
    pub kind: ParamKind,
    pub default: DefaultValue,
    pub validator: Validator,
}

impl Argument {
    /// A mandatory positional argument.
    pub fn mandatory(validator: Validator) -> Self {
        Self {
            kind: ParamKind::Positional,
            default: DefaultValue::Mandatory,
            validator,
        }
    }

    /// An argument defaulting to a fixed value.
    pub fn default(value: impl Into<Arg>, validator: Validator) -> Self {
        let value = value.into();
        Self::default_with(move |_| value.clone(), validator)
    }

    /// An argument whose default is computed from earlier fields.
    pub fn default_with<F>(producer: F, validator: Validator) -> Self
    where
        F: Fn(&Bound) -> Arg + Send + Sync + 'static,
    {
        Self {
            kind: ParamKind::Positional,
            default: DefaultValue::Producer(Arc::new(producer)),
            validator,
        }
    }

    /// An argument that accepts `None` and defaults to it.
    pub fn optional(validator: Validator) -> Self {
        Self::default(Arg::None, validator::optional(validator))
    }

    /// A variadic argument; each element is checked with `validator`.
    pub fn variadic(validator: Validator) -> Self {
        Self {
            kind: ParamKind::Variadic,
            default: DefaultValue::Mandatory,
            validator: validator::tuple_of(validator),
        }
    }

    /// Make this argument keyword-only.
    #[must_use]
    pub fn keyword_only(mut self) -> Self {
        if self.kind == ParamKind::Positional {
            self.kind = ParamKind::KeywordOnly;
        }
        self
    }

    pub fn is_mandatory(&self) -> bool {
        self.default.is_mandatory()
    }
}

/// A named argument.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: &'static str,
    pub argument: Argument,
}

impl Parameter {
    pub fn new(name: &'static str, argument: Argument) -> Self {
        Self { name, argument }
    }

    pub fn kind(&self) -> ParamKind {
        self.argument.kind
    }
}

type InitializerFn = dyn Fn(&Bound) -> TesseraResult<Arg> + Send + Sync;

/// A derived field computed after all arguments are validated.
///
/// Attributes run in declaration order and may read any argument as well
/// as attributes declared before them.
#[derive(Clone)]
pub struct Attribute {
    initializer: Arc<InitializerFn>,
}

impl Attribute {
    pub fn new<F>(initializer: F) -> Self
    where
        F: Fn(&Bound) -> TesseraResult<Arg> + Send + Sync + 'static,
    {
        Self {
            initializer: Arc::new(initializer),
        }
    }

    pub fn initialize(&self, bound: &Bound) -> TesseraResult<Arg> {
        (self.initializer)(bound)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute")
    }
}
