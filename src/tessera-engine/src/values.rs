//! Generic, numeric, logical and reduction rules.

use std::f64::consts::PI;

use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, Value};
use tessera_ir::{Node, NodeKind, Typed};
use tessera_translate::{Backend, RuleTable, Translator};

use crate::backend::{Engine, Lowered};
use crate::expr::{col, lit, typed_lit, when, AggFunc, BinaryOp, Expr, Function, UnaryOp};

pub(crate) type EngineTranslator = Translator<Engine>;

pub(crate) fn expr(t: &mut EngineTranslator, node: &Node, field: &str) -> TesseraResult<Expr> {
    t.translate_field(node, field)?.into_expr()
}

pub(crate) fn arg(t: &mut EngineTranslator, node: &Node) -> TesseraResult<Expr> {
    expr(t, node, "arg")
}

pub(crate) fn opt_expr(
    t: &mut EngineTranslator,
    node: &Node,
    field: &str,
) -> TesseraResult<Option<Expr>> {
    t.translate_opt(node, field)?.map(Lowered::into_expr).transpose()
}

pub(crate) fn exprs(t: &mut EngineTranslator, node: &Node, field: &str) -> TesseraResult<Vec<Expr>> {
    t.translate_seq(node, field)?
        .into_iter()
        .map(Lowered::into_expr)
        .collect()
}

fn literal_type_error(node: &Node, field: &str, expected: &str, got: &Value) -> TesseraError {
    TesseraError::type_error(format!(
        "{}.{field} must be a {expected} literal, got {}",
        node.kind(),
        got.type_name()
    ))
}

/// A literal-only string field.
pub(crate) fn literal_string(
    t: &EngineTranslator,
    node: &Node,
    field: &str,
) -> TesseraResult<String> {
    match t.literal(node, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(literal_type_error(node, field, "string", other)),
    }
}

/// An optional literal-only integer field; a null literal counts as absent.
pub(crate) fn opt_literal_int(
    t: &EngineTranslator,
    node: &Node,
    field: &str,
) -> TesseraResult<Option<i64>> {
    match t.opt_literal(node, field)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int64(v)) => Ok(Some(*v)),
        Some(other) => Err(literal_type_error(node, field, "integer", other)),
    }
}

pub(crate) fn literal_int(t: &EngineTranslator, node: &Node, field: &str) -> TesseraResult<i64> {
    opt_literal_int(t, node, field)?.ok_or_else(|| {
        TesseraError::unsupported_argument(node.kind().name(), field, Engine::NAME)
    })
}

/// A literal-only count or width; negative values are rejected.
pub(crate) fn literal_usize(t: &EngineTranslator, node: &Node, field: &str) -> TesseraResult<usize> {
    let value = literal_int(t, node, field)?;
    usize::try_from(value).map_err(|_| {
        TesseraError::value_error(format!(
            "{}.{field} must not be negative, got {value}",
            node.kind()
        ))
    })
}

/// An optional literal-only field as a constant expression.
fn opt_literal_expr(t: &EngineTranslator, node: &Node, field: &str) -> TesseraResult<Option<Expr>> {
    Ok(match t.opt_literal(node, field)? {
        None | Some(Value::Null) => None,
        Some(value) => Some(lit(value.clone())),
    })
}

/// A typed null of the node's output type.
pub(crate) fn null_of(node: &Node) -> TesseraResult<Expr> {
    Ok(typed_lit(Value::Null, node.output_dtype()?))
}

/// Chain `when` branches so that the first matching pair wins.
fn fold_case(branches: Vec<(Expr, Expr)>, default: Expr) -> Expr {
    branches
        .into_iter()
        .rev()
        .fold(default, |otherwise, (case, result)| {
            when(case).then(result).otherwise(otherwise)
        })
}

const UNARY_OPS: &[(NodeKind, UnaryOp)] = &[
    (NodeKind::Negate, UnaryOp::Negate),
    (NodeKind::Not, UnaryOp::Not),
    (NodeKind::BitwiseNot, UnaryOp::BitNot),
    (NodeKind::IsNull, UnaryOp::IsNull),
    (NodeKind::NotNull, UnaryOp::IsNotNull),
    (NodeKind::IsNan, UnaryOp::IsNan),
    (NodeKind::IsInf, UnaryOp::IsInfinite),
    (NodeKind::Abs, UnaryOp::Abs),
    (NodeKind::Sign, UnaryOp::Sign),
    (NodeKind::Exp, UnaryOp::Exp),
    (NodeKind::Ln, UnaryOp::Ln),
    (NodeKind::Log2, UnaryOp::Log2),
    (NodeKind::Log10, UnaryOp::Log10),
    (NodeKind::Sqrt, UnaryOp::Sqrt),
    (NodeKind::Acos, UnaryOp::Acos),
    (NodeKind::Asin, UnaryOp::Asin),
    (NodeKind::Atan, UnaryOp::Atan),
    (NodeKind::Cos, UnaryOp::Cos),
    (NodeKind::Sin, UnaryOp::Sin),
    (NodeKind::Tan, UnaryOp::Tan),
];

const BINARY_OPS: &[(NodeKind, BinaryOp)] = &[
    (NodeKind::Add, BinaryOp::Add),
    (NodeKind::Subtract, BinaryOp::Subtract),
    (NodeKind::Multiply, BinaryOp::Multiply),
    (NodeKind::Modulus, BinaryOp::Modulo),
    (NodeKind::Equals, BinaryOp::Eq),
    (NodeKind::NotEquals, BinaryOp::NotEq),
    (NodeKind::Greater, BinaryOp::Gt),
    (NodeKind::GreaterEqual, BinaryOp::GtEq),
    (NodeKind::Less, BinaryOp::Lt),
    (NodeKind::LessEqual, BinaryOp::LtEq),
    (NodeKind::And, BinaryOp::And),
    (NodeKind::Or, BinaryOp::Or),
    (NodeKind::Xor, BinaryOp::Xor),
    (NodeKind::BitwiseAnd, BinaryOp::BitAnd),
    (NodeKind::BitwiseOr, BinaryOp::BitOr),
    (NodeKind::BitwiseXor, BinaryOp::BitXor),
    (NodeKind::BitwiseLeftShift, BinaryOp::ShiftLeft),
    (NodeKind::BitwiseRightShift, BinaryOp::ShiftRight),
];

const REDUCTIONS: &[(NodeKind, AggFunc)] = &[
    (NodeKind::Count, AggFunc::Count),
    (NodeKind::CountDistinct, AggFunc::CountDistinct),
    (NodeKind::Sum, AggFunc::Sum),
    (NodeKind::Mean, AggFunc::Mean),
    (NodeKind::Min, AggFunc::Min),
    (NodeKind::Max, AggFunc::Max),
    (NodeKind::ApproxMedian, AggFunc::Median),
    (NodeKind::ArrayCollect, AggFunc::Collect),
];

fn lookup<T: Copy>(table: &[(NodeKind, T)], node: &Node) -> TesseraResult<T> {
    table
        .iter()
        .find(|(kind, _)| *kind == node.kind())
        .map(|(_, item)| *item)
        .ok_or_else(|| TesseraError::dispatch(node.kind().name(), Engine::NAME))
}

pub(crate) fn register(rules: &mut RuleTable<Engine>) {
    register_generic(rules);
    register_operators(rules);
    register_numeric(rules);
    register_reductions(rules);
}

fn register_generic(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::Literal, |_, node| {
        let value = node
            .literal_value()
            .ok_or_else(|| TesseraError::internal("literal without a value"))?;
        let dtype = node.dtype().cloned().unwrap_or_else(|| value.data_type());
        Ok(typed_lit(value.clone(), dtype).into())
    });
    rules.register(NodeKind::TableColumn, |_, node| {
        Ok(col(node.str_field("name")?).into())
    });
    rules.register(NodeKind::Alias, |t, node| {
        Ok(arg(t, node)?.alias(node.str_field("name")?).into())
    });
    rules.register(NodeKind::Cast, |t, node| {
        let to = node
            .field("to")?
            .as_type()
            .cloned()
            .ok_or_else(|| TesseraError::internal("Cast.to is not a type"))?;
        Ok(arg(t, node)?.cast(to).into())
    });
    rules.register(NodeKind::SortKey, |t, node| Ok(expr(t, node, "expr")?.into()));
    rules.register(NodeKind::NodeList, |t, node| {
        Ok(Lowered::Exprs(exprs(t, node, "values")?))
    });

    rules.register(NodeKind::IfNull, |t, node| {
        let value = expr(t, node, "ifnull_expr")?;
        Ok(arg(t, node)?.fill_null(value).into())
    });
    rules.register(NodeKind::NullIf, |t, node| {
        let arg = arg(t, node)?;
        let other = expr(t, node, "null_if_expr")?;
        Ok(when(arg.clone().eq(other)).then(null_of(node)?).otherwise(arg).into())
    });
    rules.register(NodeKind::ZeroIfNull, |t, node| {
        Ok(arg(t, node)?.fill_null(lit(0i64)).into())
    });
    rules.register(NodeKind::NullIfZero, |t, node| {
        let arg = arg(t, node)?;
        Ok(when(arg.clone().eq(lit(0i64))).then(null_of(node)?).otherwise(arg).into())
    });
    rules.register(NodeKind::Where, |t, node| {
        let predicate = expr(t, node, "bool_expr")?;
        let then = expr(t, node, "true_expr")?;
        let otherwise = expr(t, node, "false_null_expr")?;
        Ok(when(predicate).then(then).otherwise(otherwise).into())
    });
    rules.register(NodeKind::SimpleCase, |t, node| {
        let base = expr(t, node, "base")?;
        let cases = exprs(t, node, "cases")?;
        let results = exprs(t, node, "results")?;
        let default = expr(t, node, "default")?;
        let branches = cases
            .into_iter()
            .map(|case| base.clone().eq(case))
            .zip(results)
            .collect();
        Ok(fold_case(branches, default).into())
    });
    rules.register(NodeKind::SearchedCase, |t, node| {
        let cases = exprs(t, node, "cases")?;
        let results = exprs(t, node, "results")?;
        let default = expr(t, node, "default")?;
        Ok(fold_case(cases.into_iter().zip(results).collect(), default).into())
    });
    rules.register(NodeKind::Between, |t, node| {
        Ok(Expr::Between {
            expr: Box::new(arg(t, node)?),
            low: Box::new(expr(t, node, "lower_bound")?),
            high: Box::new(expr(t, node, "upper_bound")?),
        }
        .into())
    });
    rules.register_many(&[NodeKind::Contains, NodeKind::NotContains], |t, node| {
        let value = expr(t, node, "value")?;
        let contained = value.is_in(exprs(t, node, "options")?);
        Ok(match node.kind() {
            NodeKind::NotContains => contained.not(),
            _ => contained,
        }
        .into())
    });
    rules.register(NodeKind::Coalesce, |t, node| {
        Ok(Expr::Coalesce(exprs(t, node, "arg")?).into())
    });
    rules.register(NodeKind::Greatest, |t, node| {
        Ok(Expr::MaxHorizontal(exprs(t, node, "arg")?).into())
    });
    rules.register(NodeKind::Least, |t, node| {
        Ok(Expr::MinHorizontal(exprs(t, node, "arg")?).into())
    });
}

fn register_operators(rules: &mut RuleTable<Engine>) {
    // Every plain unary kind resolves here through its ancestors.
    rules.register(NodeKind::Unary, |t, node| {
        let op = lookup(UNARY_OPS, node)?;
        Ok(arg(t, node)?.unary(op).into())
    });
    rules.register(NodeKind::Binary, |t, node| {
        let op = lookup(BINARY_OPS, node)?;
        let left = expr(t, node, "left")?;
        let right = expr(t, node, "right")?;
        Ok(left.binary(op, right).into())
    });
    rules.register_many(&[NodeKind::Divide, NodeKind::Power], |t, node| {
        let left = expr(t, node, "left")?.cast(DataType::Float64);
        let right = expr(t, node, "right")?.cast(DataType::Float64);
        let op = if node.kind() == NodeKind::Divide {
            BinaryOp::Divide
        } else {
            BinaryOp::Power
        };
        Ok(left.binary(op, right).into())
    });
    rules.register(NodeKind::FloorDivide, |t, node| {
        let left = expr(t, node, "left")?.cast(DataType::Float64);
        let right = expr(t, node, "right")?.cast(DataType::Float64);
        Ok(left
            .div(right)
            .unary(UnaryOp::Floor)
            .cast(node.output_dtype()?)
            .into())
    });
}

fn register_numeric(rules: &mut RuleTable<Engine>) {
    rules.register_many(&[NodeKind::Ceil, NodeKind::Floor], |t, node| {
        let op = if node.kind() == NodeKind::Ceil {
            UnaryOp::Ceil
        } else {
            UnaryOp::Floor
        };
        Ok(arg(t, node)?.unary(op).cast(DataType::Int64).into())
    });
    rules.register(NodeKind::Atan2, |t, node| {
        let args = vec![expr(t, node, "left")?, expr(t, node, "right")?];
        Ok(Expr::Function {
            function: Function::Atan2,
            args,
        }
        .into())
    });
    rules.register(NodeKind::Cot, |t, node| {
        let arg = arg(t, node)?;
        Ok(arg.clone().unary(UnaryOp::Cos).div(arg.unary(UnaryOp::Sin)).into())
    });
    rules.register_many(&[NodeKind::Radians, NodeKind::Degrees], |t, node| {
        let factor = if node.kind() == NodeKind::Radians {
            PI / 180.0
        } else {
            180.0 / PI
        };
        Ok(arg(t, node)?.cast(DataType::Float64).mul(lit(factor)).into())
    });

    rules.register(NodeKind::Round, |t, node| {
        let arg = arg(t, node)?;
        let rounded = match opt_literal_int(t, node, "digits")? {
            None | Some(0) => arg.unary(UnaryOp::Round),
            Some(digits) => {
                let scale = 10f64.powi(i32::try_from(digits).map_err(|_| {
                    TesseraError::value_error(format!("Round.digits out of range: {digits}"))
                })?);
                arg.cast(DataType::Float64)
                    .mul(lit(scale))
                    .unary(UnaryOp::Round)
                    .div(lit(scale))
            }
        };
        Ok(rounded.cast(node.output_dtype()?).into())
    });
    rules.register(NodeKind::Clip, |t, node| {
        let mut out = arg(t, node)?;
        let lower = opt_literal_expr(t, node, "lower")?;
        let upper = opt_literal_expr(t, node, "upper")?;
        if lower.is_none() && upper.is_none() {
            return Err(TesseraError::translation("Clip needs a lower or an upper bound"));
        }
        if let Some(upper) = upper {
            out = when(out.clone().gt(upper.clone())).then(upper).otherwise(out);
        }
        if let Some(lower) = lower {
            out = when(out.clone().lt(lower.clone())).then(lower).otherwise(out);
        }
        Ok(out.cast(node.output_dtype()?).into())
    });
    rules.register(NodeKind::Log, |t, node| {
        let ln = arg(t, node)?.unary(UnaryOp::Ln);
        let base = match t.opt_literal(node, "base")? {
            None | Some(Value::Null) => return Ok(ln.into()),
            Some(value) => value
                .as_float64()
                .ok_or_else(|| literal_type_error(node, "base", "numeric", value))?,
        };
        Ok(ln.div(lit(base.ln())).into())
    });
}

fn reduction(t: &mut EngineTranslator, node: &Node, func: AggFunc) -> TesseraResult<Lowered> {
    let expr = arg(t, node)?;
    let filter = opt_expr(t, node, "where")?;
    Ok(Expr::Agg {
        func,
        expr: Box::new(expr),
        filter: filter.map(Box::new),
    }
    .into())
}

fn register_reductions(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::Reduction, |t, node| {
        let func = lookup(REDUCTIONS, node)?;
        reduction(t, node, func)
    });
    rules.register_many(&[NodeKind::StandardDev, NodeKind::Variance], |t, node| {
        let ddof = if node.str_field("how")? == "pop" { 0 } else { 1 };
        let func = if node.kind() == NodeKind::StandardDev {
            AggFunc::Std(ddof)
        } else {
            AggFunc::Var(ddof)
        };
        reduction(t, node, func)
    });
    rules.register(NodeKind::CountStar, |t, node| {
        let filter = opt_expr(t, node, "where")?;
        Ok(Expr::CountRows(filter.map(Box::new)).into())
    });
}
