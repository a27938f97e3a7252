//! Array rules. Operands are cast to the node's output type first, so the
//! list kernels only ever see lists of one element type.

use common_error::{TesseraError, TesseraResult};
use tessera_core::DataType;
use tessera_ir::{Node, NodeKind, Typed};
use tessera_translate::RuleTable;

use crate::backend::Engine;
use crate::expr::{Expr, Function};
use crate::values::{arg, expr, exprs, EngineTranslator};

fn element_type(node: &Node) -> TesseraResult<DataType> {
    node.output_dtype()?
        .element_type()
        .cloned()
        .ok_or_else(|| TesseraError::internal(format!("{} is not array typed", node.kind())))
}

fn list_call(function: Function, args: Vec<Expr>) -> Expr {
    Expr::Function { function, args }
}

pub(crate) fn register(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::ArrayLength, |t, node| {
        Ok(arg(t, node)?.call(Function::ListLength).into())
    });
    rules.register(NodeKind::ArrayConcat, |t, node| {
        let dtype = node.output_dtype()?;
        let args = vec![
            expr(t, node, "left")?.cast(dtype.clone()),
            expr(t, node, "right")?.cast(dtype),
        ];
        Ok(list_call(Function::ListConcat, args).into())
    });
    rules.register(NodeKind::ArrayColumn, |t, node| {
        let dtype = element_type(node)?;
        let args = exprs(t, node, "cols")?
            .into_iter()
            .map(|col| col.cast(dtype.clone()))
            .collect();
        Ok(list_call(Function::ListFromColumns, args).into())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::EngineCompiler;
    use crate::expr::col;
    use tessera_core::Schema;
    use tessera_ir::ops::{binary, call, database_table, table_column, unary};
    use tessera_ir::Arg;

    fn compile(node: &Node) -> Expr {
        EngineCompiler::default()
            .compile(node)
            .unwrap()
            .into_expr()
            .unwrap()
    }

    #[test]
    fn test_array_column_casts_to_common_element_type() {
        let t = database_table(
            "t",
            Schema::from_pairs([("a", DataType::Int32), ("x", DataType::Float64)]),
        )
        .unwrap();
        let (a, x) = (table_column(&t, "a").unwrap(), table_column(&t, "x").unwrap());
        let pair = call(NodeKind::ArrayColumn, vec![Arg::from(&a), Arg::from(&x)]).unwrap();
        assert_eq!(
            compile(&pair),
            list_call(
                Function::ListFromColumns,
                vec![
                    col("a").cast(DataType::Float64),
                    col("x").cast(DataType::Float64)
                ],
            )
        );

        let pairs = DataType::Array(Box::new(DataType::Float64));
        let length = unary(NodeKind::ArrayLength, &pair).unwrap();
        assert_eq!(compile(&length), compile(&pair).call(Function::ListLength));
        let doubled = binary(NodeKind::ArrayConcat, &pair, &pair).unwrap();
        assert_eq!(
            compile(&doubled),
            list_call(
                Function::ListConcat,
                vec![compile(&pair).cast(pairs.clone()), compile(&pair).cast(pairs)],
            )
        );
    }
}
