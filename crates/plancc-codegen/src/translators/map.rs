//! Map: binds a computed column and passes the tuple on

use plancc_ir::{NodeId, Operator, OperatorKind};

use crate::{render_expr, CodeSink, CodegenError, Translator};

pub fn produce(
    t: &Translator<'_>,
    op: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    t.produce(t.only_child(op)?, sink)
}

pub fn consume(
    t: &Translator<'_>,
    op: NodeId,
    source: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    let Operator::Map { target, expr, .. } = t.operator(op)? else {
        return Err(CodegenError::UnexpectedOperator {
            node: op,
            expected: OperatorKind::Map,
        });
    };

    let scope = t.output_attributes(source)?;
    sink.emit(&format!("let {} = {};", target, render_expr(expr, &scope, op)?));
    t.consume_parent(op, sink)
}
