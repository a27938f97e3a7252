//! Generic, numeric, logical and reduction rules.

use common_error::{TesseraError, TesseraResult};
use tessera_ir::{Node, NodeKind};
use tessera_translate::{RuleTable, Translator};

use crate::backend::Sql;
use crate::literal::{render_literal, sql_type};

pub(crate) type SqlTranslator = Translator<Sql>;

/// `name(a, b, ...)`.
pub(crate) fn call(name: &str, args: &[String]) -> String {
    format!("{name}({})", args.join(", "))
}

pub(crate) fn arg(t: &mut SqlTranslator, node: &Node) -> TesseraResult<String> {
    t.translate_field(node, "arg")
}

const BINARY_OPERATORS: &[(NodeKind, &str)] = &[
    (NodeKind::Add, "+"),
    (NodeKind::Subtract, "-"),
    (NodeKind::Multiply, "*"),
    (NodeKind::Divide, "/"),
    (NodeKind::Modulus, "%"),
    (NodeKind::Equals, "="),
    (NodeKind::NotEquals, "!="),
    (NodeKind::Greater, ">"),
    (NodeKind::GreaterEqual, ">="),
    (NodeKind::Less, "<"),
    (NodeKind::LessEqual, "<="),
    (NodeKind::And, "AND"),
    (NodeKind::Or, "OR"),
];

const BINARY_FUNCTIONS: &[(NodeKind, &str)] = &[
    (NodeKind::Power, "pow"),
    (NodeKind::Atan2, "atan2"),
    (NodeKind::ArrayConcat, "concat"),
    (NodeKind::BitwiseAnd, "bitand"),
    (NodeKind::BitwiseOr, "bitor"),
    (NodeKind::BitwiseXor, "bitxor"),
    (NodeKind::BitwiseLeftShift, "shiftleft"),
    (NodeKind::BitwiseRightShift, "shiftright"),
];

const UNARY_FUNCTIONS: &[(NodeKind, &str)] = &[
    (NodeKind::BitwiseNot, "bitnot"),
    (NodeKind::IsNan, "is_nan"),
    (NodeKind::IsInf, "is_inf"),
    (NodeKind::ZeroIfNull, "zeroifnull"),
    (NodeKind::NullIfZero, "nullifzero"),
    (NodeKind::Abs, "abs"),
    (NodeKind::Exp, "exp"),
    (NodeKind::Ln, "ln"),
    (NodeKind::Log2, "log2"),
    (NodeKind::Log10, "log10"),
    (NodeKind::Sqrt, "sqrt"),
    (NodeKind::Sign, "sign"),
    (NodeKind::Acos, "acos"),
    (NodeKind::Asin, "asin"),
    (NodeKind::Atan, "atan"),
    (NodeKind::Cos, "cos"),
    (NodeKind::Sin, "sin"),
    (NodeKind::Tan, "tan"),
    (NodeKind::Cot, "cot"),
    (NodeKind::Radians, "radians"),
    (NodeKind::Degrees, "degrees"),
    (NodeKind::ArrayLength, "cardinality"),
];

const VARIADIC_FUNCTIONS: &[(NodeKind, &str)] = &[
    (NodeKind::Coalesce, "coalesce"),
    (NodeKind::Greatest, "greatest"),
    (NodeKind::Least, "least"),
    (NodeKind::StringConcat, "concat"),
];

const REDUCTIONS: &[(NodeKind, &str)] = &[
    (NodeKind::Count, "count"),
    (NodeKind::Sum, "sum"),
    (NodeKind::Mean, "avg"),
    (NodeKind::Min, "min"),
    (NodeKind::Max, "max"),
    (NodeKind::ApproxMedian, "appx_median"),
    (NodeKind::ArrayCollect, "collect_list"),
];

pub(crate) fn register(rules: &mut RuleTable<Sql>) {
    register_generic(rules);
    register_operators(rules);
    register_reductions(rules);
}

fn register_generic(rules: &mut RuleTable<Sql>) {
    rules.register(NodeKind::Literal, |_, node| {
        let value = node
            .literal_value()
            .ok_or_else(|| TesseraError::internal("literal without a value"))?;
        render_literal(value)
    });
    rules.register(NodeKind::TableColumn, |t, node| {
        t.backend().column(node.child("table")?, node.str_field("name")?)
    });
    // Only a select list names its items; nested aliases are transparent.
    rules.register(NodeKind::Alias, |t, node| arg(t, node));
    rules.register(NodeKind::Cast, |t, node| {
        let to = node
            .field("to")?
            .as_type()
            .ok_or_else(|| TesseraError::internal("Cast.to is not a type"))?;
        Ok(format!("CAST({} AS {})", arg(t, node)?, sql_type(to)?))
    });
    rules.register(NodeKind::IfNull, |t, node| {
        let args = [arg(t, node)?, t.translate_field(node, "ifnull_expr")?];
        Ok(call("coalesce", &args))
    });
    rules.register(NodeKind::NullIf, |t, node| {
        let args = [arg(t, node)?, t.translate_field(node, "null_if_expr")?];
        Ok(call("nullif", &args))
    });
    rules.register(NodeKind::Where, |t, node| {
        let args = [
            t.translate_field(node, "bool_expr")?,
            t.translate_field(node, "true_expr")?,
            t.translate_field(node, "false_null_expr")?,
        ];
        Ok(call("if", &args))
    });
    rules.register(NodeKind::SimpleCase, |t, node| {
        let base = t.translate_field(node, "base")?;
        render_case(t, node, Some(base))
    });
    rules.register(NodeKind::SearchedCase, |t, node| render_case(t, node, None));
    rules.register(NodeKind::Between, |t, node| {
        Ok(format!(
            "{} BETWEEN {} AND {}",
            arg(t, node)?,
            t.translate_field(node, "lower_bound")?,
            t.translate_field(node, "upper_bound")?
        ))
    });
    rules.register_many(&[NodeKind::Contains, NodeKind::NotContains], |t, node| {
        let value = t.translate_field(node, "value")?;
        let options = t.translate_seq(node, "options")?;
        let op = if node.kind() == NodeKind::Contains { "IN" } else { "NOT IN" };
        Ok(format!("{value} {op} ({})", options.join(", ")))
    });
}

fn render_case(t: &mut SqlTranslator, node: &Node, base: Option<String>) -> TesseraResult<String> {
    let cases = t.translate_seq(node, "cases")?;
    let results = t.translate_seq(node, "results")?;
    let default = t.translate_field(node, "default")?;

    let mut out = String::from("CASE");
    if let Some(base) = base {
        out.push(' ');
        out.push_str(&base);
    }
    for (case, result) in cases.iter().zip(&results) {
        out.push_str(&format!(" WHEN {case} THEN {result}"));
    }
    out.push_str(&format!(" ELSE {default} END"));
    Ok(out)
}

fn register_operators(rules: &mut RuleTable<Sql>) {
    for &(kind, op) in BINARY_OPERATORS {
        rules.register(kind, move |t, node| {
            let left = t.translate_field(node, "left")?;
            let right = t.translate_field(node, "right")?;
            Ok(format!("({left} {op} {right})"))
        });
    }
    for &(kind, name) in BINARY_FUNCTIONS {
        rules.register(kind, move |t, node| {
            let args = [t.translate_field(node, "left")?, t.translate_field(node, "right")?];
            Ok(call(name, &args))
        });
    }
    rules.register(NodeKind::FloorDivide, |t, node| {
        let left = t.translate_field(node, "left")?;
        let right = t.translate_field(node, "right")?;
        Ok(format!("floor({left} / {right})"))
    });
    rules.register(NodeKind::Xor, |t, node| {
        let left = t.translate_field(node, "left")?;
        let right = t.translate_field(node, "right")?;
        Ok(format!("(({left} OR {right}) AND NOT ({left} AND {right}))"))
    });

    for &(kind, name) in UNARY_FUNCTIONS {
        rules.register(kind, move |t, node| Ok(call(name, &[arg(t, node)?])));
    }
    rules.register(NodeKind::Negate, |t, node| Ok(format!("(-{})", arg(t, node)?)));
    rules.register(NodeKind::Not, |t, node| Ok(format!("(NOT {})", arg(t, node)?)));
    rules.register(NodeKind::IsNull, |t, node| Ok(format!("{} IS NULL", arg(t, node)?)));
    rules.register(NodeKind::NotNull, |t, node| Ok(format!("{} IS NOT NULL", arg(t, node)?)));
    rules.register_many(&[NodeKind::Ceil, NodeKind::Floor], |t, node| {
        let name = if node.kind() == NodeKind::Ceil { "ceil" } else { "floor" };
        Ok(format!("CAST({} AS bigint)", call(name, &[arg(t, node)?])))
    });
    for &(kind, name) in VARIADIC_FUNCTIONS {
        rules.register(kind, move |t, node| Ok(call(name, &t.translate_seq(node, "arg")?)));
    }
    rules.register(NodeKind::ArrayColumn, |t, node| {
        Ok(call("array", &t.translate_seq(node, "cols")?))
    });

    rules.register(NodeKind::Round, |t, node| {
        let mut args = vec![arg(t, node)?];
        args.extend(t.translate_opt(node, "digits")?);
        Ok(call("round", &args))
    });
    rules.register(NodeKind::Clip, |t, node| {
        let mut out = arg(t, node)?;
        let lower = t.translate_opt(node, "lower")?;
        let upper = t.translate_opt(node, "upper")?;
        if lower.is_none() && upper.is_none() {
            return Err(TesseraError::translation("Clip needs a lower or an upper bound"));
        }
        if let Some(upper) = upper {
            out = call("least", &[out, upper]);
        }
        if let Some(lower) = lower {
            out = call("greatest", &[out, lower]);
        }
        Ok(out)
    });
    rules.register(NodeKind::Log, |t, node| {
        let arg = arg(t, node)?;
        Ok(match t.translate_opt(node, "base")? {
            Some(base) => call("log", &[base, arg]),
            None => call("ln", &[arg]),
        })
    });
}

/// Argument of a reduction with its `where` filter folded in.
fn filtered_arg(t: &mut SqlTranslator, node: &Node) -> TesseraResult<String> {
    let arg = arg(t, node)?;
    Ok(match t.translate_opt(node, "where")? {
        Some(cond) => format!("CASE WHEN {cond} THEN {arg} ELSE NULL END"),
        None => arg,
    })
}

fn register_reductions(rules: &mut RuleTable<Sql>) {
    for &(kind, name) in REDUCTIONS {
        rules.register(kind, move |t, node| Ok(call(name, &[filtered_arg(t, node)?])));
    }
    rules.register(NodeKind::CountDistinct, |t, node| {
        Ok(format!("count(DISTINCT {})", filtered_arg(t, node)?))
    });
    rules.register(NodeKind::CountStar, |t, node| {
        Ok(match t.translate_opt(node, "where")? {
            Some(cond) => format!("sum(CASE WHEN {cond} THEN 1 ELSE 0 END)"),
            None => "count(*)".to_string(),
        })
    });
    rules.register_many(&[NodeKind::StandardDev, NodeKind::Variance], |t, node| {
        let suffix = if node.str_field("how")? == "pop" { "pop" } else { "samp" };
        let name = if node.kind() == NodeKind::StandardDev { "stddev" } else { "var" };
        Ok(call(&format!("{name}_{suffix}"), &[filtered_arg(t, node)?]))
    });
}
