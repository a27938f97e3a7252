//! String nodes.

use tessera_core::DataType;

use crate::annotations::validator::{integer_value, one_of, string_value, tuple_of};
use crate::annotations::Argument;
use crate::kind::NodeKind;
use crate::registry::{Registry, TypeBuilder};

/// Parts accepted by `ParseUrl.extract`.
pub const URL_PARTS: &[&str] = &[
    "PROTOCOL",
    "AUTHORITY",
    "USERINFO",
    "HOST",
    "FILE",
    "PATH",
    "QUERY",
    "REF",
];

fn returns_string(t: TypeBuilder<'_>) -> TypeBuilder<'_> {
    t.dtype(|_| Ok(DataType::String))
}

fn returns_bool(t: TypeBuilder<'_>) -> TypeBuilder<'_> {
    t.dtype(|_| Ok(DataType::Bool))
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .define(NodeKind::StringUnary)
        .abstract_()
        .arg("arg", Argument::mandatory(string_value()))
        .dtype(|_| Ok(DataType::String))
        .finish();
    registry.leaves(
        &[
            NodeKind::Lowercase,
            NodeKind::Uppercase,
            NodeKind::Strip,
            NodeKind::LStrip,
            NodeKind::RStrip,
            NodeKind::Capitalize,
            NodeKind::Reverse,
        ],
        |t| t,
    );
    registry.leaves(&[NodeKind::StringLength], |t| t.dtype(|_| Ok(DataType::Int32)));

    registry
        .define(NodeKind::StringConcat)
        .arg("arg", Argument::variadic(string_value()))
        .dtype(|_| Ok(DataType::String))
        .finish();

    returns_string(
        registry
            .define(NodeKind::Substring)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("start", Argument::mandatory(integer_value()))
            .arg("length", Argument::optional(integer_value())),
    )
    .finish();
    returns_string(
        registry
            .define(NodeKind::StrRight)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("nchars", Argument::mandatory(integer_value())),
    )
    .finish();
    registry
        .define(NodeKind::StringFind)
        .arg("arg", Argument::mandatory(string_value()))
        .arg("substr", Argument::mandatory(string_value()))
        .arg("start", Argument::optional(integer_value()))
        .arg("end", Argument::optional(integer_value()))
        .dtype(|_| Ok(DataType::Int64))
        .finish();
    registry
        .define(NodeKind::FindInSet)
        .arg("needle", Argument::mandatory(string_value()))
        .arg("values", Argument::mandatory(tuple_of(string_value())))
        .dtype(|_| Ok(DataType::Int64))
        .finish();
    returns_string(
        registry
            .define(NodeKind::StringJoin)
            .arg("sep", Argument::mandatory(string_value()))
            .arg("arg", Argument::mandatory(tuple_of(string_value()))),
    )
    .finish();
    returns_bool(
        registry
            .define(NodeKind::StringLike)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("pattern", Argument::mandatory(string_value())),
    )
    .finish();
    returns_bool(
        registry
            .define(NodeKind::StartsWith)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("start", Argument::mandatory(string_value())),
    )
    .finish();
    returns_bool(
        registry
            .define(NodeKind::EndsWith)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("end", Argument::mandatory(string_value())),
    )
    .finish();
    returns_bool(
        registry
            .define(NodeKind::StringContains)
            .arg("haystack", Argument::mandatory(string_value()))
            .arg("needle", Argument::mandatory(string_value())),
    )
    .finish();
    for kind in [NodeKind::StringReplace, NodeKind::RegexReplace] {
        returns_string(
            registry
                .define(kind)
                .arg("arg", Argument::mandatory(string_value()))
                .arg("pattern", Argument::mandatory(string_value()))
                .arg("replacement", Argument::mandatory(string_value())),
        )
        .finish();
    }
    registry
        .define(NodeKind::StringSplit)
        .arg("arg", Argument::mandatory(string_value()))
        .arg("delimiter", Argument::mandatory(string_value()))
        .dtype(|_| Ok(DataType::Array(Box::new(DataType::String))))
        .finish();
    returns_bool(
        registry
            .define(NodeKind::RegexSearch)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("pattern", Argument::mandatory(string_value())),
    )
    .finish();
    returns_string(
        registry
            .define(NodeKind::RegexExtract)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("pattern", Argument::mandatory(string_value()))
            .arg("index", Argument::mandatory(integer_value())),
    )
    .finish();
    for kind in [NodeKind::LPad, NodeKind::RPad] {
        returns_string(
            registry
                .define(kind)
                .arg("arg", Argument::mandatory(string_value()))
                .arg("length", Argument::mandatory(integer_value()))
                .arg("pad", Argument::default(" ", string_value())),
        )
        .finish();
    }
    returns_string(
        registry
            .define(NodeKind::Repeat)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("times", Argument::mandatory(integer_value())),
    )
    .finish();
    returns_string(
        registry
            .define(NodeKind::ParseUrl)
            .arg("arg", Argument::mandatory(string_value()))
            .arg("extract", Argument::mandatory(one_of(URL_PARTS)))
            .arg("key", Argument::optional(string_value())),
    )
    .finish();
}
