//! Push-based code generation for plancc operator trees
//!
//! `Translator::produce(root, sink)` walks the plan with the produce/consume
//! protocol: produce recurses toward the leaves, consume is called by a
//! descendant once a tuple is available and forwards it to the parent.
//! Fragments land in the sink in call order, so the nesting of the generated
//! loops mirrors the nesting of the protocol calls.

mod config;
mod expr;
mod sink;
mod translator;
pub mod translators;

use plancc_ir::{NodeId, OperatorKind, SchemaError, TreeError, ValueFormatError};
use plancc_registry::RegistryError;
use thiserror::Error;

pub use config::CodegenConfig;
pub use expr::render_expr;
pub use sink::{CodeBuffer, CodeSink, Line};
pub use translator::{
    ConsumeFn, ProduceFn, Translator, TranslatorRegistry, TranslatorRegistryBuilder,
};
pub use translators::builtin_registry;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    ValueFormat(#[from] ValueFormatError),

    #[error("Operator {node} produces tuples but has no parent to consume them")]
    NoConsumer { node: NodeId },

    #[error("Node {from} is not a child of {node}")]
    NotAChild { node: NodeId, from: NodeId },

    #[error("Attribute '{attribute}' is not available at {node}")]
    UnknownAttribute { node: NodeId, attribute: String },

    #[error("Attribute '{attribute}' is bound on both sides of {node}")]
    AmbiguousAttribute { node: NodeId, attribute: String },

    #[error("Operator {node} is not a {expected} operator")]
    UnexpectedOperator { node: NodeId, expected: OperatorKind },
}

impl CodegenError {
    /// True for missing produce/consume registrations
    pub fn is_unknown_kind(&self) -> bool {
        matches!(self, CodegenError::Registry(RegistryError::UnknownOperatorKind { .. }))
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        builtin_registry, CodeBuffer, CodeSink, CodegenConfig, CodegenError, Translator,
    };
    pub use plancc_ir::{
        Attribute, BinOp, Catalog, Expr, NodeId, Operator, OperatorKind, Plan, PlanBuilder,
        Relation, SchemaProvider, TypeDescriptor,
    };
}
