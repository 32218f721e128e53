//! Built-in per-kind translators
//!
//! Each operator kind contributes a produce function and, unless it is a
//! leaf, a consume function. They only ever reach other operators through
//! `Translator::produce` / `Translator::consume`.

pub mod filter;
pub mod hash_join;
pub mod map;
pub mod print;
pub mod scan;

use plancc_ir::{NodeId, OperatorKind};

use crate::TranslatorRegistryBuilder;

pub use hash_join::JoinSide;

/// Registration phase preloaded with scan, map, filter, print and hashjoin
pub fn builtin_registry() -> TranslatorRegistryBuilder {
    let mut builder = TranslatorRegistryBuilder::new();
    register_builtins(&mut builder);
    builder
}

pub fn register_builtins(builder: &mut TranslatorRegistryBuilder) {
    builder
        .register_produce(OperatorKind::Scan, scan::produce)
        .register_produce(OperatorKind::Map, map::produce)
        .register_consume(OperatorKind::Map, map::consume)
        .register_produce(OperatorKind::Filter, filter::produce)
        .register_consume(OperatorKind::Filter, filter::consume)
        .register_produce(OperatorKind::Print, print::produce)
        .register_consume(OperatorKind::Print, print::consume)
        .register_produce(OperatorKind::HashJoin, hash_join::produce)
        .register_consume(OperatorKind::HashJoin, hash_join::consume);
}

fn column_var(scan: NodeId, attribute: &str) -> String {
    format!("col{}_{}", scan.index(), attribute)
}

fn tid_var(scan: NodeId) -> String {
    format!("tid{}", scan.index())
}

fn hash_table_var(join: NodeId) -> String {
    format!("ht{}", join.index())
}

fn matches_var(join: NodeId) -> String {
    format!("matches{}", join.index())
}

/// Tuple expression or pattern over `names`: `()`, `(a,)`, `(a, b)`
fn tuple(names: &[String]) -> String {
    match names {
        [] => "()".to_string(),
        [single] => format!("({},)", single),
        _ => format!("({})", names.join(", ")),
    }
}
