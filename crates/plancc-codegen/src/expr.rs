//! Expression rendering
//!
//! Column references must be in scope at the operator being translated;
//! literals are cast through their type descriptor, so a malformed literal
//! aborts translation instead of becoming a runtime check.

use plancc_ir::{Expr, NodeId};

use crate::CodegenError;

/// Render `expr` for operator `node`, given the attributes in scope there
pub fn render_expr(expr: &Expr, scope: &[String], node: NodeId) -> Result<String, CodegenError> {
    match expr {
        Expr::Column { name } => {
            if !scope.iter().any(|s| s == name) {
                return Err(CodegenError::UnknownAttribute {
                    node,
                    attribute: name.clone(),
                });
            }
            Ok(name.clone())
        }
        Expr::Literal { value, ty } => Ok(ty.cast_literal(value)?),
        Expr::Binary { op, left, right } => Ok(format!(
            "{} {} {}",
            render_operand(left, scope, node)?,
            op.symbol(),
            render_operand(right, scope, node)?
        )),
        Expr::Not { expr } => Ok(format!("!{}", render_operand(expr, scope, node)?)),
    }
}

fn render_operand(expr: &Expr, scope: &[String], node: NodeId) -> Result<String, CodegenError> {
    let rendered = render_expr(expr, scope, node)?;
    Ok(match expr {
        Expr::Binary { .. } => format!("({})", rendered),
        _ => rendered,
    })
}
