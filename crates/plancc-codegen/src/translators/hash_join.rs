//! Hash join: a pipeline breaker.
//!
//! Produce declares the hash table and drives the build child to completion
//! before the probe child, so the whole build loop is emitted ahead of any
//! probe code. Consume branches on which child delivered the tuple.

use plancc_ir::{Children, NodeId, Operator, OperatorKind, Plan};

use super::{hash_table_var, matches_var, tuple};
use crate::{CodeSink, CodegenError, Translator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Build,
    Probe,
}

impl JoinSide {
    /// Which side of binary operator `join` the tuple from `source` arrives on
    pub fn of(plan: &Plan, join: NodeId, source: NodeId) -> Result<JoinSide, CodegenError> {
        match plan.children(join)? {
            Children::Binary { left, .. } if left == source => Ok(JoinSide::Build),
            Children::Binary { right, .. } if right == source => Ok(JoinSide::Probe),
            _ => Err(CodegenError::NotAChild { node: join, from: source }),
        }
    }
}

struct JoinParts<'a> {
    build: NodeId,
    probe: NodeId,
    build_key: &'a str,
    probe_key: &'a str,
}

fn parts<'a>(t: &Translator<'a>, op: NodeId) -> Result<JoinParts<'a>, CodegenError> {
    match t.operator(op)? {
        Operator::HashJoin {
            build,
            probe,
            build_key,
            probe_key,
        } => Ok(JoinParts {
            build: *build,
            probe: *probe,
            build_key,
            probe_key,
        }),
        _ => Err(CodegenError::UnexpectedOperator {
            node: op,
            expected: OperatorKind::HashJoin,
        }),
    }
}

fn require_attribute(scope: &[String], attribute: &str, node: NodeId) -> Result<(), CodegenError> {
    if scope.iter().any(|s| s == attribute) {
        Ok(())
    } else {
        Err(CodegenError::UnknownAttribute {
            node,
            attribute: attribute.to_string(),
        })
    }
}

pub fn produce(
    t: &Translator<'_>,
    op: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    let join = parts(t, op)?;
    // Overlapping build and probe names fail here, before any loop is opened
    t.output_attributes(op)?;

    sink.emit(&format!("let mut {} = HashMap::new();", hash_table_var(op)));
    t.produce(join.build, sink)?;
    t.produce(join.probe, sink)
}

pub fn consume(
    t: &Translator<'_>,
    op: NodeId,
    source: NodeId,
    sink: &mut dyn CodeSink,
) -> Result<(), CodegenError> {
    let join = parts(t, op)?;
    let build_attributes = t.output_attributes(join.build)?;
    let ht = hash_table_var(op);

    match JoinSide::of(t.plan(), op, source)? {
        JoinSide::Build => {
            require_attribute(&build_attributes, join.build_key, op)?;
            sink.emit(&format!(
                "{}.entry({}).or_insert_with(Vec::new).push({});",
                ht,
                join.build_key,
                tuple(&build_attributes)
            ));
            Ok(())
        }
        JoinSide::Probe => {
            let probe_attributes = t.output_attributes(join.probe)?;
            require_attribute(&probe_attributes, join.probe_key, op)?;

            let matches = matches_var(op);
            sink.open_block(&format!("if let Some({}) = {}.get(&{})", matches, ht, join.probe_key));
            sink.open_block(&format!(
                "for {} in {}.iter().cloned()",
                tuple(&build_attributes),
                matches
            ));
            t.consume_parent(op, sink)?;
            sink.close_block();
            sink.close_block();
            Ok(())
        }
    }
}
