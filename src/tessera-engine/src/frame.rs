//! Lazy frames: deferred relational plans over catalog tables.

use std::fmt;

use arrow::record_batch::RecordBatch;
use common_display::{DisplayTree, TreeNode};
use common_error::TesseraResult;

use crate::catalog::Catalog;
use crate::executor;
use crate::expr::Expr;

/// Join strategies supported natively. Right joins are expressed as left
/// joins with the operands swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Outer,
    Semi,
    Anti,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Outer => "outer",
            Self::Semi => "semi",
            Self::Anti => "anti",
        };
        write!(f, "{name}")
    }
}

/// A relational plan node.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Scan {
        table: String,
    },
    /// Rows carried by the plan itself.
    Values {
        name: String,
        batch: RecordBatch,
    },
    Filter {
        input: Box<Plan>,
        predicate: Expr,
    },
    Select {
        input: Box<Plan>,
        exprs: Vec<Expr>,
    },
    /// Add or replace columns, keeping the rest.
    WithColumns {
        input: Box<Plan>,
        exprs: Vec<Expr>,
    },
    Sort {
        input: Box<Plan>,
        by: Vec<Expr>,
        descending: Vec<bool>,
    },
    Slice {
        input: Box<Plan>,
        offset: usize,
        len: Option<usize>,
    },
    /// Grouped reduction; no keys reduces the whole input to one row.
    Aggregate {
        input: Box<Plan>,
        keys: Vec<Expr>,
        aggs: Vec<Expr>,
    },
    Join {
        left: Box<Plan>,
        right: Box<Plan>,
        left_on: Vec<Expr>,
        right_on: Vec<Expr>,
        how: JoinType,
        suffix: String,
    },
    /// Drop rows holding a null in any of `subset` (all columns if `None`).
    DropNulls {
        input: Box<Plan>,
        subset: Option<Vec<String>>,
    },
    Unique {
        input: Box<Plan>,
    },
}

fn exprs(list: &[Expr]) -> String {
    list.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl TreeNode for Plan {
    fn name(&self) -> String {
        match self {
            Plan::Scan { .. } => "Scan",
            Plan::Values { .. } => "Values",
            Plan::Filter { .. } => "Filter",
            Plan::Select { .. } => "Select",
            Plan::WithColumns { .. } => "WithColumns",
            Plan::Sort { .. } => "Sort",
            Plan::Slice { .. } => "Slice",
            Plan::Aggregate { .. } => "Aggregate",
            Plan::Join { .. } => "Join",
            Plan::DropNulls { .. } => "DropNulls",
            Plan::Unique { .. } => "Unique",
        }
        .to_string()
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        match self {
            Plan::Scan { .. } | Plan::Values { .. } => vec![],
            Plan::Join { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Plan::Filter { input, .. }
            | Plan::Select { input, .. }
            | Plan::WithColumns { input, .. }
            | Plan::Sort { input, .. }
            | Plan::Slice { input, .. }
            | Plan::Aggregate { input, .. }
            | Plan::DropNulls { input, .. }
            | Plan::Unique { input } => vec![input.as_ref()],
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Plan::Scan { table } => Some(table.clone()),
            Plan::Values { name, batch } => Some(format!("{name}, {} rows", batch.num_rows())),
            Plan::Filter { predicate, .. } => Some(predicate.to_string()),
            Plan::Select { exprs: list, .. } | Plan::WithColumns { exprs: list, .. } => {
                Some(exprs(list))
            }
            Plan::Sort { by, descending, .. } => Some(
                by.iter()
                    .zip(descending)
                    .map(|(e, d)| format!("{e}{}", if *d { " desc" } else { "" }))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Plan::Slice { offset, len, .. } => Some(match len {
                Some(len) => format!("offset={offset}, len={len}"),
                None => format!("offset={offset}"),
            }),
            Plan::Aggregate { keys, aggs, .. } => {
                Some(format!("by=[{}], aggs=[{}]", exprs(keys), exprs(aggs)))
            }
            Plan::Join {
                left_on,
                right_on,
                how,
                ..
            } => Some(format!(
                "{how}, left_on=[{}], right_on=[{}]",
                exprs(left_on),
                exprs(right_on)
            )),
            Plan::DropNulls { subset, .. } => subset.as_ref().map(|s| s.join(", ")),
            Plan::Unique { .. } => None,
        }
    }
}

/// A deferred query; nothing runs until [`LazyFrame::collect`].
#[derive(Debug, Clone, PartialEq)]
pub struct LazyFrame {
    plan: Plan,
}

impl LazyFrame {
    /// Scan a catalog table.
    pub fn scan(table: impl Into<String>) -> Self {
        Self {
            plan: Plan::Scan {
                table: table.into(),
            },
        }
    }

    /// A frame over rows held in memory.
    pub fn values(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            plan: Plan::Values {
                name: name.into(),
                batch,
            },
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    fn wrap(self, build: impl FnOnce(Box<Plan>) -> Plan) -> Self {
        Self {
            plan: build(Box::new(self.plan)),
        }
    }

    #[must_use]
    pub fn filter(self, predicate: Expr) -> Self {
        self.wrap(|input| Plan::Filter { input, predicate })
    }

    #[must_use]
    pub fn select(self, exprs: Vec<Expr>) -> Self {
        self.wrap(|input| Plan::Select { input, exprs })
    }

    #[must_use]
    pub fn with_columns(self, exprs: Vec<Expr>) -> Self {
        self.wrap(|input| Plan::WithColumns { input, exprs })
    }

    #[must_use]
    pub fn sort(self, by: Vec<Expr>, descending: Vec<bool>) -> Self {
        self.wrap(|input| Plan::Sort {
            input,
            by,
            descending,
        })
    }

    #[must_use]
    pub fn slice(self, offset: usize, len: Option<usize>) -> Self {
        self.wrap(|input| Plan::Slice { input, offset, len })
    }

    #[must_use]
    pub fn limit(self, n: usize) -> Self {
        self.slice(0, Some(n))
    }

    pub fn group_by(self, keys: Vec<Expr>) -> GroupBy {
        GroupBy { frame: self, keys }
    }

    /// Reduce the whole frame to a single row.
    #[must_use]
    pub fn agg(self, aggs: Vec<Expr>) -> Self {
        self.group_by(vec![]).agg(aggs)
    }

    #[must_use]
    pub fn join(
        self,
        other: LazyFrame,
        left_on: Vec<Expr>,
        right_on: Vec<Expr>,
        how: JoinType,
    ) -> Self {
        self.wrap(|left| Plan::Join {
            left,
            right: Box::new(other.plan),
            left_on,
            right_on,
            how,
            suffix: tessera_ir::ops::JOIN_SUFFIX.to_string(),
        })
    }

    #[must_use]
    pub fn drop_nulls(self, subset: Option<Vec<String>>) -> Self {
        self.wrap(|input| Plan::DropNulls { input, subset })
    }

    #[must_use]
    pub fn unique(self) -> Self {
        self.wrap(|input| Plan::Unique { input })
    }

    /// Execute against `catalog`.
    pub fn collect(&self, catalog: &Catalog) -> TesseraResult<RecordBatch> {
        executor::execute(&self.plan, catalog)
    }

    /// Render the plan as an indented tree.
    pub fn explain(&self) -> String {
        DisplayTree::new(&self.plan).with_max_details(120).to_string()
    }
}

/// A frame waiting for its reductions.
#[derive(Debug, Clone)]
pub struct GroupBy {
    frame: LazyFrame,
    keys: Vec<Expr>,
}

impl GroupBy {
    pub fn agg(self, aggs: Vec<Expr>) -> LazyFrame {
        let keys = self.keys;
        self.frame.wrap(|input| Plan::Aggregate { input, keys, aggs })
    }
}
