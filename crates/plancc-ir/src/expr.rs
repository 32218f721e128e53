//! Row-level expressions used by map and filter operators

use serde::{Deserialize, Serialize};

use crate::types::TypeDescriptor;

/// Expression types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Column { name: String },
    Literal { value: String, ty: TypeDescriptor },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Not { expr: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add, Sub, Mul, Div,
    // Comparison
    Eq, Ne, Lt, Le, Gt, Ge,
    // Logical
    And, Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column { name: name.into() }
    }

    pub fn literal(value: impl Into<String>, ty: TypeDescriptor) -> Self {
        Expr::Literal { value: value.into(), ty }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not { expr: Box::new(expr) }
    }

    /// Column names referenced by this expression, in first-use order
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column { name } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Literal { .. } => {}
            Expr::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Not { expr } => expr.collect_columns(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_deduplicated() {
        let ten = Expr::literal("10", TypeDescriptor::Integer);
        let expr = Expr::binary(
            BinOp::And,
            Expr::binary(BinOp::Gt, Expr::column("price"), ten),
            Expr::binary(BinOp::Lt, Expr::column("price"), Expr::column("limit")),
        );
        assert_eq!(expr.columns(), vec!["price", "limit"]);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"type":"Binary","op":"Mul","left":{"type":"Column","name":"a"},
                       "right":{"type":"Literal","value":"2","ty":{"type":"Integer"}}}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(
            expr,
            Expr::binary(BinOp::Mul, Expr::column("a"), Expr::literal("2", TypeDescriptor::Integer))
        );
    }
}
