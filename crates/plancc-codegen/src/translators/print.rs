//! Print: the pipeline sink, writes the listed attributes of each tuple

use plancc_ir::{NodeId, Operator, OperatorKind};

use crate::{CodeSink, CodegenError, Translator};

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
    let Operator::Print { attributes, .. } = t.operator(op)? else {
        return Err(CodegenError::UnexpectedOperator {
            node: op,
            expected: OperatorKind::Print,
        });
    };

    let scope = t.output_attributes(source)?;
    if let Some(missing) = attributes.iter().find(|a| !scope.contains(*a)) {
        return Err(CodegenError::UnknownAttribute {
            node: op,
            attribute: missing.clone(),
        });
    }

    if attributes.is_empty() {
        sink.emit("println!();");
        return Ok(());
    }

    let separator = t.config().print_separator.replace('{', "{{").replace('}', "}}");
    let format = vec!["{}"; attributes.len()].join(separator.as_str());
    sink.emit(&format!("println!({:?}, {});", format, attributes.join(", ")));
    Ok(())
}
