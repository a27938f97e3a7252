//! String function rules.
//!
//! Offsets in the IR are 0-indexed; the target's string functions are
//! 1-indexed, so starts are shifted up and located positions shifted down.

use common_error::{TesseraError, TesseraResult};
use tessera_core::Value;
use tessera_ir::NodeKind;
use tessera_translate::RuleTable;

use crate::backend::Sql;
use crate::literal::quote_string;
use crate::values::{arg, call};

const STRING_UNARY: &[(NodeKind, &str)] = &[
    (NodeKind::Lowercase, "lower"),
    (NodeKind::Uppercase, "upper"),
    (NodeKind::Strip, "trim"),
    (NodeKind::LStrip, "ltrim"),
    (NodeKind::RStrip, "rtrim"),
    (NodeKind::Capitalize, "initcap"),
    (NodeKind::Reverse, "reverse"),
    (NodeKind::StringLength, "length"),
];

/// Functions whose fields map one to one onto call arguments.
const PLAIN_CALLS: &[(NodeKind, &str, &[&str])] = &[
    (NodeKind::StrRight, "strright", &["arg", "nchars"]),
    (NodeKind::StringReplace, "replace", &["arg", "pattern", "replacement"]),
    (NodeKind::RegexReplace, "regexp_replace", &["arg", "pattern", "replacement"]),
    (NodeKind::RegexSearch, "regexp_like", &["arg", "pattern"]),
    (NodeKind::RegexExtract, "regexp_extract", &["arg", "pattern", "index"]),
    (NodeKind::StringSplit, "split", &["arg", "delimiter"]),
    (NodeKind::LPad, "lpad", &["arg", "length", "pad"]),
    (NodeKind::RPad, "rpad", &["arg", "length", "pad"]),
    (NodeKind::Repeat, "repeat", &["arg", "times"]),
];

/// `expr + offset`, or `expr` when the target is 0-indexed.
fn shifted(expr: String, offset: i64) -> String {
    if offset == 0 {
        expr
    } else {
        format!("{expr} + {offset}")
    }
}

pub(crate) fn register(rules: &mut RuleTable<Sql>) {
    for &(kind, name) in STRING_UNARY {
        rules.register(kind, move |t, node| Ok(call(name, &[arg(t, node)?])));
    }
    for &(kind, name, fields) in PLAIN_CALLS {
        rules.register(kind, move |t, node| {
            let args = fields
                .iter()
                .map(|field| t.translate_field(node, field))
                .collect::<TesseraResult<Vec<_>>>()?;
            Ok(call(name, &args))
        });
    }

    rules.register(NodeKind::Substring, |t, node| {
        let offset = t.backend().index_offset();
        let mut args = vec![arg(t, node)?, shifted(t.translate_field(node, "start")?, offset)];
        args.extend(t.translate_opt(node, "length")?);
        Ok(call("substr", &args))
    });

    rules.register(NodeKind::StringFind, |t, node| {
        if node.opt_child("end").is_some() {
            return Err(TesseraError::translation("StringFind with an end position is not supported in SQL"));
        }
        let offset = t.backend().index_offset();
        let haystack = arg(t, node)?;
        let needle = t.translate_field(node, "substr")?;
        let mut args = vec![needle, haystack];
        match t.opt_literal(node, "start") {
            // A literal start folds into a constant; zero means no start at all.
            Ok(Some(Value::Int64(0))) | Ok(None) => {}
            Ok(Some(Value::Int64(start))) => args.push((start + offset).to_string()),
            _ => args.push(shifted(t.translate_field(node, "start")?, offset)),
        }
        let located = call("locate", &args);
        Ok(if offset == 0 { located } else { format!("{located} - {offset}") })
    });

    rules.register(NodeKind::FindInSet, |t, node| {
        let needle = t.translate_field(node, "needle")?;
        let values = node
            .children_of("values")?
            .into_iter()
            .map(|value| match value.literal_value() {
                Some(Value::String(s)) => Ok(s.clone()),
                _ => Err(TesseraError::unsupported_argument("FindInSet", "values", "sql")),
            })
            .collect::<TesseraResult<Vec<_>>>()?;
        let located = call("find_in_set", &[needle, quote_string(&values.join(","))]);
        let offset = t.backend().index_offset();
        Ok(if offset == 0 { located } else { format!("{located} - {offset}") })
    });

    rules.register(NodeKind::StringJoin, |t, node| {
        let mut args = vec![t.translate_field(node, "sep")?];
        args.extend(t.translate_seq(node, "arg")?);
        Ok(call("concat_ws", &args))
    });
    rules.register(NodeKind::StringLike, |t, node| {
        Ok(format!("{} LIKE {}", arg(t, node)?, t.translate_field(node, "pattern")?))
    });
    rules.register(NodeKind::StartsWith, |t, node| {
        let arg = arg(t, node)?;
        let start = t.translate_field(node, "start")?;
        Ok(format!("{arg} like concat({start}, '%')"))
    });
    rules.register(NodeKind::EndsWith, |t, node| {
        let arg = arg(t, node)?;
        let end = t.translate_field(node, "end")?;
        Ok(format!("{arg} like concat('%', {end})"))
    });
    rules.register(NodeKind::StringContains, |t, node| {
        let haystack = t.translate_field(node, "haystack")?;
        let needle = t.translate_field(node, "needle")?;
        Ok(format!("{} > 0", call("locate", &[needle, haystack])))
    });
    rules.register(NodeKind::ParseUrl, |t, node| {
        let mut args = vec![arg(t, node)?, quote_string(node.str_field("extract")?)];
        args.extend(t.translate_opt(node, "key")?);
        Ok(call("parse_url", &args))
    });
}
