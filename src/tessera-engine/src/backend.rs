use common_error::{TesseraError, TesseraResult};
use tessera_translate::Backend;

use crate::expr::Expr;
use crate::frame::LazyFrame;

/// The embedded engine target.
#[derive(Debug, Default)]
pub struct Engine;

impl Backend for Engine {
    const NAME: &'static str = "engine";
    type Output = Lowered;
}

/// A node lowered onto the engine: value nodes become expressions, table
/// nodes become lazy frames and node lists become expression lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Expr(Expr),
    Frame(LazyFrame),
    Exprs(Vec<Expr>),
}

impl Lowered {
    pub fn into_expr(self) -> TesseraResult<Expr> {
        match self {
            Lowered::Expr(expr) => Ok(expr),
            other => Err(TesseraError::internal(format!(
                "expected an expression, got {}",
                other.describe()
            ))),
        }
    }

    pub fn into_frame(self) -> TesseraResult<LazyFrame> {
        match self {
            Lowered::Frame(frame) => Ok(frame),
            other => Err(TesseraError::internal(format!(
                "expected a frame, got {}",
                other.describe()
            ))),
        }
    }

    /// Expression lists, with a lone expression treated as a list of one.
    pub fn into_exprs(self) -> TesseraResult<Vec<Expr>> {
        match self {
            Lowered::Exprs(exprs) => Ok(exprs),
            Lowered::Expr(expr) => Ok(vec![expr]),
            other => Err(TesseraError::internal(format!(
                "expected expressions, got {}",
                other.describe()
            ))),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Lowered::Expr(_) => "an expression",
            Lowered::Frame(_) => "a frame",
            Lowered::Exprs(_) => "an expression list",
        }
    }
}

impl From<Expr> for Lowered {
    fn from(expr: Expr) -> Self {
        Lowered::Expr(expr)
    }
}

impl From<LazyFrame> for Lowered {
    fn from(frame: LazyFrame) -> Self {
        Lowered::Frame(frame)
    }
}
