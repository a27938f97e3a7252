use crate::arg::Arg;
use crate::node::Node;

/// Ordered map of already-validated fields.
///
/// Serves both as the validation context handed to validators and
/// initializers, and as the storage of a constructed node's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bound {
    fields: Vec<(&'static str, Arg)>,
}

impl Bound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, arg)| arg)
    }

    /// The named field if it holds a node.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.get(name).and_then(Arg::as_node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a field, or replace it in place if already present.
    pub fn insert(&mut self, name: &'static str, arg: Arg) {
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = arg,
            None => self.fields.push((name, arg)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arg)> {
        self.fields.iter().map(|(name, arg)| (*name, arg))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
