//! Type-directed translation of IR trees.
//!
//! A [`Backend`] names a target and its output type. A [`RuleTable`] maps
//! node kinds to rendering rules; lookups that miss the exact kind walk
//! the kind's ancestor chain, ending at a catch-all on `Node` that fails
//! with a dispatch error. A [`Translator`] drives the rules over a tree.

mod backend;
mod rules;
mod translator;

pub use backend::Backend;
pub use rules::{Rule, RuleTable};
pub use translator::{optional_literal, require_literal, Translator};
