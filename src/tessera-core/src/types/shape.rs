//! Scalar/columnar classification of value expressions.

use serde::{Deserialize, Serialize};

/// Output shape of a value expression.
///
/// The ordering is significant: `Scalar < Columnar`, so the shape of an
/// expression over several inputs is the maximum of the input shapes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Shape {
    /// A single value.
    #[default]
    Scalar,
    /// One value per row of a relation.
    Columnar,
}

impl Shape {
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Scalar)
    }

    pub const fn is_columnar(self) -> bool {
        matches!(self, Self::Columnar)
    }

    /// Widest shape among `shapes`, `Scalar` when empty.
    pub fn widest<I: IntoIterator<Item = Self>>(shapes: I) -> Self {
        shapes.into_iter().max().unwrap_or_default()
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Columnar => write!(f, "columnar"),
        }
    }
}
