//! String rules. Patterns, widths and positions must be literals here.

use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, Value};
use tessera_ir::{Arg, Node, NodeKind};
use tessera_translate::{Backend, RuleTable};

use crate::backend::Engine;
use crate::expr::{Expr, Function};
use crate::values::{
    arg, exprs, literal_int, literal_string, literal_usize, opt_literal_int, EngineTranslator,
};

const STRING_UNARY: &[(NodeKind, Function)] = &[
    (NodeKind::Lowercase, Function::Lowercase),
    (NodeKind::Uppercase, Function::Uppercase),
    (NodeKind::Strip, Function::Strip),
    (NodeKind::LStrip, Function::LStrip),
    (NodeKind::RStrip, Function::RStrip),
    (NodeKind::Capitalize, Function::Capitalize),
    (NodeKind::Reverse, Function::Reverse),
];

/// The literal strings of a tuple field such as `FindInSet.values`.
fn literal_strings(node: &Node, field: &str) -> TesseraResult<Vec<String>> {
    let unsupported =
        || TesseraError::unsupported_argument(node.kind().name(), field, Engine::NAME);
    node.field(field)?
        .as_seq()
        .ok_or_else(unsupported)?
        .iter()
        .map(|item| match item {
            Arg::Node(child) => match child.literal_value() {
                Some(Value::String(s)) => Ok(s.clone()),
                _ => Err(unsupported()),
            },
            Arg::Value(Value::String(s)) => Ok(s.clone()),
            _ => Err(unsupported()),
        })
        .collect()
}

fn apply(t: &mut EngineTranslator, node: &Node, function: Function) -> TesseraResult<Expr> {
    Ok(arg(t, node)?.call(function))
}

pub(crate) fn register(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::StringUnary, |t, node| {
        let function = STRING_UNARY
            .iter()
            .find(|(kind, _)| *kind == node.kind())
            .map(|(_, function)| function.clone())
            .ok_or_else(|| TesseraError::dispatch(node.kind().name(), Engine::NAME))?;
        Ok(apply(t, node, function)?.into())
    });
    rules.register(NodeKind::StringLength, |t, node| {
        Ok(apply(t, node, Function::Length)?.cast(DataType::Int32).into())
    });
    rules.register(NodeKind::StringConcat, |t, node| {
        Ok(Expr::Function {
            function: Function::Concat {
                separator: String::new(),
            },
            args: exprs(t, node, "arg")?,
        }
        .into())
    });
    rules.register(NodeKind::StringJoin, |t, node| {
        let separator = literal_string(t, node, "sep")?;
        Ok(Expr::Function {
            function: Function::Concat { separator },
            args: exprs(t, node, "arg")?,
        }
        .into())
    });

    rules.register(NodeKind::Substring, |t, node| {
        let start = literal_int(t, node, "start")?;
        let length = opt_literal_int(t, node, "length")?;
        Ok(apply(t, node, Function::Slice { start, length })?.into())
    });
    rules.register(NodeKind::StrRight, |t, node| {
        let n = literal_usize(t, node, "nchars")?;
        Ok(apply(t, node, Function::Tail(n))?.into())
    });
    rules.register(NodeKind::StringFind, |t, node| {
        if !node.get("end").map_or(true, Arg::is_none) {
            return Err(TesseraError::translation(
                "StringFind with an end position is not supported by the engine",
            ));
        }
        let needle = literal_string(t, node, "substr")?;
        let start = match opt_literal_int(t, node, "start")? {
            None => 0,
            Some(_) => literal_usize(t, node, "start")?,
        };
        Ok(apply(t, node, Function::Find { needle, start })?.into())
    });
    rules.register(NodeKind::FindInSet, |t, node| {
        let values = literal_strings(node, "values")?;
        let needle = crate::values::expr(t, node, "needle")?;
        Ok(needle.call(Function::FindInSet(values)).into())
    });
    rules.register(NodeKind::StringContains, |t, node| {
        let needle = literal_string(t, node, "needle")?;
        let haystack = crate::values::expr(t, node, "haystack")?;
        Ok(haystack.call(Function::Contains(needle)).into())
    });
    rules.register(NodeKind::StartsWith, |t, node| {
        let prefix = literal_string(t, node, "start")?;
        Ok(apply(t, node, Function::StartsWith(prefix))?.into())
    });
    rules.register(NodeKind::EndsWith, |t, node| {
        let suffix = literal_string(t, node, "end")?;
        Ok(apply(t, node, Function::EndsWith(suffix))?.into())
    });
    rules.register_many(
        &[NodeKind::StringReplace, NodeKind::RegexReplace],
        |t, node| {
            let pattern = literal_string(t, node, "pattern")?;
            let replacement = literal_string(t, node, "replacement")?;
            let function = if node.kind() == NodeKind::StringReplace {
                Function::Replace {
                    pattern,
                    replacement,
                }
            } else {
                Function::RegexReplace {
                    pattern,
                    replacement,
                }
            };
            Ok(apply(t, node, function)?.into())
        },
    );
    rules.register(NodeKind::StringSplit, |t, node| {
        let delimiter = literal_string(t, node, "delimiter")?;
        Ok(apply(t, node, Function::Split(delimiter))?.into())
    });
    rules.register(NodeKind::RegexSearch, |t, node| {
        let pattern = literal_string(t, node, "pattern")?;
        Ok(apply(t, node, Function::RegexMatch(pattern))?.into())
    });
    rules.register(NodeKind::RegexExtract, |t, node| {
        let pattern = literal_string(t, node, "pattern")?;
        let group = literal_usize(t, node, "index")?;
        Ok(apply(t, node, Function::RegexExtract { pattern, group })?.into())
    });
    // lpad right-justifies and rpad left-justifies.
    rules.register_many(&[NodeKind::LPad, NodeKind::RPad], |t, node| {
        let width = literal_usize(t, node, "length")?;
        let fill = literal_string(t, node, "pad")?;
        let function = if node.kind() == NodeKind::LPad {
            Function::PadStart { width, fill }
        } else {
            Function::PadEnd { width, fill }
        };
        Ok(apply(t, node, function)?.into())
    });
    rules.register(NodeKind::Repeat, |t, node| {
        let times = literal_usize(t, node, "times")?;
        Ok(apply(t, node, Function::Repeat(times))?.into())
    });
}
