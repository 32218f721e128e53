//! Scan: a leaf that opens the loop every pipeline above it runs in

use plancc_ir::{NodeId, Operator, OperatorKind};

use super::{column_var, tid_var};
use crate::{CodeSink, CodegenError, Translator};

pub fn produce(
    t: &Translator<'_>,
    op: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    let Operator::Scan { relation } = t.operator(op)? else {
        return Err(CodegenError::UnexpectedOperator {
            node: op,
            expected: OperatorKind::Scan,
        });
    };
    let relation = t.schema().relation(relation)?;
    let db = &t.config().db_handle;

    for attr in relation.attributes() {
        sink.emit(&format!(
            "let {} = {}.relation({:?}).column::<{}>({:?});",
            column_var(op, &attr.name),
            db,
            relation.name(),
            attr.ty.code_type(),
            attr.name
        ));
    }

    let tid = tid_var(op);
    sink.open_block(&format!("for {} in 0..{}", tid, relation.tuple_count()));
    for attr in relation.attributes() {
        sink.emit(&format!("let {} = {}[{}];", attr.name, column_var(op, &attr.name), tid));
    }
    t.consume_parent(op, sink)?;
    sink.close_block();

    Ok(())
}
