use plancc_ir::{NodeId, Operator, OperatorKind};

use crate::{render_expr, CodeSink, CodegenError, Translator};

pub fn produce(
    t: &Translator<'_>,
    op: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    t.produce(t.only_child(op)?, sink)
}

/// Everything above the filter runs inside its condition
pub fn consume(
    t: &Translator<'_>,
    op: NodeId,
    source: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    let Operator::Filter { predicate, .. } = t.operator(op)? else {
        return Err(CodegenError::UnexpectedOperator {
            node: op,
            expected: OperatorKind::Filter,
        });
    };

    let scope = t.output_attributes(source)?;
    let condition = render_expr(predicate, &scope, op)?;
    sink.open_block(&format!("if {}", condition));
    t.consume_parent(op, sink)?;
    sink.close_block();
    Ok(())
}
