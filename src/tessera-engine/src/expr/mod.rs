//! Column expressions of the embedded engine.
//!
//! `Expr` is a small eager-evaluable algebra modelled on dataframe
//! libraries: columns, literals, operators, conditionals, a catalog of
//! constant-parameterised functions and reductions. Builders mirror the
//! usual `col("a").gt(lit(1)).alias("b")` style.

pub(crate) mod evaluator;
mod functions;
mod lists;

use std::fmt;

use tessera_core::{DataType, Value};

pub use evaluator::ExprEvaluator;
pub use functions::{Function, TemporalField};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Xor,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::BitAnd => "bitand",
            Self::BitOr => "bitor",
            Self::BitXor => "bitxor",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }
}

/// Unary operators and elementwise math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
    BitNot,
    IsNull,
    IsNotNull,
    IsNan,
    IsInfinite,
    Abs,
    Ceil,
    Floor,
    /// Round half away from zero.
    Round,
    Exp,
    Ln,
    Log2,
    Log10,
    Sqrt,
    Sign,
    Acos,
    Asin,
    Atan,
    Cos,
    Sin,
    Tan,
}

/// Reduction functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Count,
    CountDistinct,
    Sum,
    Mean,
    Min,
    Max,
    Median,
    /// Standard deviation with the given delta degrees of freedom.
    Std(u8),
    /// Variance with the given delta degrees of freedom.
    Var(u8),
    /// Every non-null value, gathered into one list.
    Collect,
}

impl AggFunc {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::CountDistinct => "n_unique",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Std(_) => "std",
            Self::Var(_) => "var",
            Self::Collect => "implode",
        }
    }
}

/// An engine expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal { value: Value, dtype: DataType },
    Alias(Box<Expr>, String),
    Cast(Box<Expr>, DataType),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// `when(predicate).then(then).otherwise(otherwise)`.
    When {
        predicate: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    FillNull(Box<Expr>, Box<Expr>),
    FillNan(Box<Expr>, Box<Expr>),
    IsIn { expr: Box<Expr>, list: Vec<Expr> },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Coalesce(Vec<Expr>),
    MinHorizontal(Vec<Expr>),
    MaxHorizontal(Vec<Expr>),
    Function { function: Function, args: Vec<Expr> },
    Agg {
        func: AggFunc,
        expr: Box<Expr>,
        filter: Option<Box<Expr>>,
    },
    /// Number of rows, optionally only those where the filter holds.
    CountRows(Option<Box<Expr>>),
}

/// Reference a column by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A literal typed by its own value.
pub fn lit(value: impl Into<Value>) -> Expr {
    let value = value.into();
    let dtype = value.data_type();
    Expr::Literal { value, dtype }
}

/// A literal with an explicit type, for typed nulls.
pub fn typed_lit(value: Value, dtype: DataType) -> Expr {
    Expr::Literal { value, dtype }
}

/// Start a conditional expression.
pub fn when(predicate: Expr) -> When {
    When { predicate }
}

pub struct When {
    predicate: Expr,
}

impl When {
    pub fn then(self, then: Expr) -> Then {
        Then {
            predicate: self.predicate,
            then,
        }
    }
}

pub struct Then {
    predicate: Expr,
    then: Expr,
}

impl Then {
    pub fn otherwise(self, otherwise: Expr) -> Expr {
        Expr::When {
            predicate: Box::new(self.predicate),
            then: Box::new(self.then),
            otherwise: Box::new(otherwise),
        }
    }
}

macro_rules! binary_builders {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[must_use]
            pub fn $name(self, other: Expr) -> Expr {
                self.binary(BinaryOp::$op, other)
            }
        )*
    };
}

impl Expr {
    pub fn binary(self, op: BinaryOp, other: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    pub fn unary(self, op: UnaryOp) -> Expr {
        Expr::Unary {
            op,
            expr: Box::new(self),
        }
    }

    binary_builders! {
        add => Add,
        sub => Subtract,
        mul => Multiply,
        div => Divide,
        eq => Eq,
        neq => NotEq,
        lt => Lt,
        lt_eq => LtEq,
        gt => Gt,
        gt_eq => GtEq,
        and => And,
        or => Or,
    }

    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias(Box::new(self), name.into())
    }

    #[must_use]
    pub fn cast(self, dtype: DataType) -> Expr {
        Expr::Cast(Box::new(self), dtype)
    }

    #[must_use]
    pub fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }

    #[must_use]
    pub fn is_null(self) -> Expr {
        self.unary(UnaryOp::IsNull)
    }

    #[must_use]
    pub fn fill_null(self, value: Expr) -> Expr {
        Expr::FillNull(Box::new(self), Box::new(value))
    }

    #[must_use]
    pub fn fill_nan(self, value: Expr) -> Expr {
        Expr::FillNan(Box::new(self), Box::new(value))
    }

    #[must_use]
    pub fn is_in(self, list: Vec<Expr>) -> Expr {
        Expr::IsIn {
            expr: Box::new(self),
            list,
        }
    }

    #[must_use]
    pub fn call(self, function: Function) -> Expr {
        Expr::Function {
            function,
            args: vec![self],
        }
    }

    #[must_use]
    pub fn agg(self, func: AggFunc) -> Expr {
        Expr::Agg {
            func,
            expr: Box::new(self),
            filter: None,
        }
    }

    /// Output column name: an alias, or the first column referenced.
    pub fn output_name(&self) -> String {
        match self {
            Expr::Column(name) | Expr::Alias(_, name) => name.clone(),
            Expr::Literal { .. } => "literal".to_string(),
            Expr::CountRows(_) => "len".to_string(),
            other => other
                .children()
                .into_iter()
                .map(Expr::output_name)
                .find(|name| name != "literal")
                .unwrap_or_else(|| "literal".to_string()),
        }
    }

    /// Direct subexpressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Column(_) | Expr::Literal { .. } => vec![],
            Expr::Alias(expr, _) | Expr::Cast(expr, _) | Expr::Unary { expr, .. } => vec![expr],
            Expr::Binary { left, right, .. }
            | Expr::FillNull(left, right)
            | Expr::FillNan(left, right) => vec![left, right],
            Expr::When {
                predicate,
                then,
                otherwise,
            } => vec![predicate, then, otherwise],
            Expr::IsIn { expr, list } => {
                std::iter::once(expr.as_ref()).chain(list.iter()).collect()
            }
            Expr::Between { expr, low, high } => vec![expr, low, high],
            Expr::Coalesce(items)
            | Expr::MinHorizontal(items)
            | Expr::MaxHorizontal(items)
            | Expr::Function { args: items, .. } => items.iter().collect(),
            Expr::Agg { expr, filter, .. } => {
                std::iter::once(expr.as_ref()).chain(filter.as_deref()).collect()
            }
            Expr::CountRows(filter) => filter.as_deref().into_iter().collect(),
        }
    }

    /// Whether the expression reduces many rows to one.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Agg { .. } | Expr::CountRows(_))
            || self.children().into_iter().any(Expr::is_aggregate)
    }
}

fn list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "col({name:?})"),
            Expr::Literal { value, .. } => write!(f, "lit({value})"),
            Expr::Alias(expr, name) => write!(f, "{expr}.alias({name:?})"),
            Expr::Cast(expr, dtype) => write!(f, "{expr}.cast({dtype})"),
            Expr::Binary { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Unary { op, expr } => write!(f, "{expr}.{op:?}()"),
            Expr::When {
                predicate,
                then,
                otherwise,
            } => write!(f, "when({predicate}).then({then}).otherwise({otherwise})"),
            Expr::FillNull(expr, value) => write!(f, "{expr}.fill_null({value})"),
            Expr::FillNan(expr, value) => write!(f, "{expr}.fill_nan({value})"),
            Expr::IsIn { expr, list: items } => {
                write!(f, "{expr}.is_in([")?;
                list(f, items)?;
                write!(f, "])")
            }
            Expr::Between { expr, low, high } => write!(f, "{expr}.is_between({low}, {high})"),
            Expr::Coalesce(items) => {
                write!(f, "coalesce(")?;
                list(f, items)?;
                write!(f, ")")
            }
            Expr::MinHorizontal(items) => {
                write!(f, "min_horizontal(")?;
                list(f, items)?;
                write!(f, ")")
            }
            Expr::MaxHorizontal(items) => {
                write!(f, "max_horizontal(")?;
                list(f, items)?;
                write!(f, ")")
            }
            Expr::Function { function, args } => {
                write!(f, "{}(", function.name())?;
                list(f, args)?;
                write!(f, ")")
            }
            Expr::Agg { func, expr, filter } => match filter {
                Some(filter) => write!(f, "{expr}.filter({filter}).{}()", func.name()),
                None => write!(f, "{expr}.{}()", func.name()),
            },
            Expr::CountRows(Some(filter)) => write!(f, "len().filter({filter})"),
            Expr::CountRows(None) => write!(f, "len()"),
        }
    }
}
