//! Ordered parameter lists with merge, validate and unbind.

use std::collections::HashSet;

use common_error::{TesseraError, TesseraResult};

use super::argument::{Argument, DefaultValue, ParamKind, Parameter};
use super::Bound;
use crate::arg::Arg;

/// Ordered collection of named parameters attached to a node type.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Parameter>,
}

impl Signature {
    /// A signature with parameters in the given order.
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    /// Build a signature from `(name, argument)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Argument)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, argument)| Parameter::new(name, argument))
                .collect(),
        )
    }

    /// Merge parent signatures with newly declared parameters.
    ///
    /// Parents are concatenated in order and a declared parameter replaces
    /// an inherited one of the same name in place. The result is ordered as
    /// inherited mandatory, declared mandatory, declared optional, then
    /// inherited optional. Once a variadic parameter exists, every later
    /// parameter becomes keyword-only.
    pub fn merge(parents: &[&Signature], declared: Signature) -> Signature {
        let mut params: Vec<Parameter> = Vec::new();
        let mut inherited: HashSet<&'static str> = HashSet::new();

        for parent in parents {
            for param in &parent.params {
                upsert(&mut params, param.clone());
                inherited.insert(param.name);
            }
        }

        let has_variadic = params.iter().any(|p| p.kind() == ParamKind::Variadic);
        for mut param in declared.params {
            if has_variadic && param.kind() == ParamKind::Positional {
                param.argument.kind = ParamKind::KeywordOnly;
            }
            upsert(&mut params, param);
        }

        let mut inherited_args = Vec::new();
        let mut new_args = Vec::new();
        let mut new_kwargs = Vec::new();
        let mut inherited_kwargs = Vec::new();
        for param in params {
            match (inherited.contains(param.name), param.argument.is_mandatory()) {
                (true, true) => inherited_args.push(param),
                (false, true) => new_args.push(param),
                (false, false) => new_kwargs.push(param),
                (true, false) => inherited_kwargs.push(param),
            }
        }

        let mut merged: Vec<Parameter> = inherited_args
            .into_iter()
            .chain(new_args)
            .chain(new_kwargs)
            .chain(inherited_kwargs)
            .collect();

        let mut after_variadic = false;
        for param in &mut merged {
            if after_variadic && param.kind() == ParamKind::Positional {
                param.argument.kind = ParamKind::KeywordOnly;
            }
            after_variadic |= param.kind() == ParamKind::Variadic;
        }

        Signature { params: merged }
    }

    /// Bind call arguments to parameters, fill defaults and validate every
    /// field in order.
    ///
    /// `owner` names the node type in validation errors.
    pub fn validate(
        &self,
        owner: &str,
        args: Vec<Arg>,
        kwargs: Vec<(String, Arg)>,
    ) -> TesseraResult<Bound> {
        let mut provided: Vec<Option<Arg>> = vec![None; self.params.len()];
        let mut args = args.into_iter();

        for (slot, param) in provided.iter_mut().zip(&self.params) {
            match param.kind() {
                ParamKind::Positional => *slot = args.next(),
                ParamKind::Variadic => {
                    let rest: Vec<Arg> = args.by_ref().collect();
                    if !rest.is_empty() {
                        *slot = Some(Arg::Seq(rest));
                    }
                }
                ParamKind::KeywordOnly => {}
            }
        }
        let surplus = args.count();
        if surplus > 0 {
            return Err(TesseraError::validation(
                owner,
                "*args",
                format!("got {surplus} unexpected positional argument(s)"),
            ));
        }

        for (name, arg) in kwargs {
            let index = self
                .params
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| {
                    TesseraError::validation(owner, name.as_str(), "unexpected keyword argument")
                })?;
            if provided[index].is_some() {
                return Err(TesseraError::validation(
                    owner,
                    name,
                    "got multiple values for argument",
                ));
            }
            provided[index] = Some(arg);
        }

        let mut bound = Bound::new();
        for (param, raw) in self.params.iter().zip(provided) {
            let raw = match raw {
                Some(arg) => arg,
                None => match &param.argument.default {
                    DefaultValue::Producer(producer) => producer(&bound),
                    DefaultValue::Mandatory if param.kind() == ParamKind::Variadic => {
                        Arg::Seq(Vec::new())
                    }
                    DefaultValue::Mandatory => {
                        return Err(TesseraError::validation(
                            owner,
                            param.name,
                            "missing required argument",
                        ))
                    }
                },
            };
            let validated = param
                .argument
                .validator
                .validate(raw, &bound)
                .map_err(|reason| TesseraError::validation(owner, param.name, reason))?;
            bound.insert(param.name, validated);
        }
        Ok(bound)
    }

    /// Reconstruct constructor arguments from validated fields.
    ///
    /// Positional fields come back positionally, variadic elements are
    /// spread after them and keyword-only fields are returned as keywords.
    pub fn unbind(&self, bound: &Bound) -> (Vec<Arg>, Vec<(String, Arg)>) {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        for param in &self.params {
            let value = bound.get(param.name).cloned().unwrap_or(Arg::None);
            match param.kind() {
                ParamKind::Positional => args.push(value),
                ParamKind::Variadic => match value {
                    Arg::Seq(items) => args.extend(items),
                    other => args.push(other),
                },
                ParamKind::KeywordOnly => kwargs.push((param.name.to_string(), value)),
            }
        }
        (args, kwargs)
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn upsert(params: &mut Vec<Parameter>, param: Parameter) {
    match params.iter_mut().find(|p| p.name == param.name) {
        Some(slot) => *slot = param,
        None => params.push(param),
    }
}
