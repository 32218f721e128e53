//! The produce/consume dispatcher

use plancc_ir::{Children, NodeId, Operator, Plan, SchemaProvider};
use plancc_registry::{KindRegistry, RegistryBuilder};
use tracing::{debug, info};

use crate::{CodeBuffer, CodeSink, CodegenConfig, CodegenError};

/// Emits the code that makes tuples of `op` available
pub type ProduceFn = fn(&Translator<'_>, NodeId, &mut dyn CodeSink) -> Result<(), CodegenError>;

/// Reacts to a tuple made available by child `source` of `op`
pub type ConsumeFn =
    fn(&Translator<'_>, NodeId, NodeId, &mut dyn CodeSink) -> Result<(), CodegenError>;

pub type TranslatorRegistry = KindRegistry<ProduceFn, ConsumeFn>;
pub type TranslatorRegistryBuilder = RegistryBuilder<ProduceFn, ConsumeFn>;

/// Translator for one plan.
///
/// Holds only shared references: all state mutated during translation lives
/// in the sink.
pub struct Translator<'a> {
    plan: &'a Plan,
    registry: &'a TranslatorRegistry,
    schema: &'a dyn SchemaProvider,
    config: CodegenConfig,
}

impl<'a> Translator<'a> {
    pub fn new(
        plan: &'a Plan,
        registry: &'a TranslatorRegistry,
        schema: &'a dyn SchemaProvider,
    ) -> Self {
        Self {
            plan,
            registry,
            schema,
            config: CodegenConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodegenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn plan(&self) -> &'a Plan {
        self.plan
    }

    pub fn schema(&self) -> &'a dyn SchemaProvider {
        self.schema
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    pub fn operator(&self, op: NodeId) -> Result<&'a Operator, CodegenError> {
        Ok(self.plan.node(op)?.operator())
    }

    /// Translate the whole plan into a fresh buffer.
    ///
    /// The buffer is only returned when every fragment was emitted.
    pub fn translate(&self) -> Result<CodeBuffer, CodegenError> {
        let mut buffer = CodeBuffer::with_indent(self.config.indent_width);
        self.produce(self.plan.root(), &mut buffer)?;
        info!(
            operators = self.plan.len(),
            lines = buffer.lines().len(),
            fingerprint = %self.plan.fingerprint(),
            "plan translated"
        );
        Ok(buffer)
    }

    /// Dispatch the produce function registered for `op`'s kind.
    ///
    /// Fragments are appended to `sink` as they are generated. On `Err` the
    /// sink may hold an unbalanced partial fragment from operators that ran
    /// before the failure; discard it, or use [`Translator::translate`].
    pub fn produce(&self, op: NodeId, sink: &mut dyn CodeSink) -> Result<(), CodegenError> {
        let kind = self.plan.kind(op)?;
        let produce = self.registry.lookup_produce(kind)?;
        debug!(node = %op, kind = %kind, "produce");
        produce(self, op, sink)
    }

    /// Dispatch the consume function registered for `op`'s kind with the
    /// tuple delivered by child `source`.
    ///
    /// Nothing is emitted when the lookup fails, but a failure further up the
    /// tree leaves a partial fragment in `sink`, as with [`Translator::produce`].
    pub fn consume(
        &self,
        op: NodeId,
        source: NodeId,
        sink: &mut dyn CodeSink,
    ) -> Result<(), CodegenError> {
        let node = self.plan.node(op)?;
        if !node.children().contains(source) {
            return Err(CodegenError::NotAChild { node: op, from: source });
        }
        let consume = self.registry.lookup_consume(node.kind())?;
        debug!(node = %op, source = %source, kind = %node.kind(), "consume");
        consume(self, op, source, sink)
    }

    /// Hand the current tuple of `op` to its parent
    pub fn consume_parent(&self, op: NodeId, sink: &mut dyn CodeSink) -> Result<(), CodegenError> {
        let parent = self
            .plan
            .parent(op)?
            .ok_or(CodegenError::NoConsumer { node: op })?;
        self.consume(parent, op, sink)
    }

    /// Attribute names bound in generated code when `op` passes a tuple up.
    ///
    /// Both inputs of a hash join are rebound side by side, so a name bound
    /// on both sides is an `AmbiguousAttribute` error.
    pub fn output_attributes(&self, op: NodeId) -> Result<Vec<String>, CodegenError> {
        let attributes: Vec<String> = match self.operator(op)? {
            Operator::Scan { relation } => self
                .schema
                .relation(relation)?
                .attributes()
                .iter()
                .map(|a| a.name.clone())
                .collect(),
            Operator::Map { input, target, .. } => {
                let mut attributes = self.output_attributes(*input)?;
                attributes.retain(|a| a != target);
                attributes.push(target.clone());
                attributes
            }
            Operator::Filter { input, .. } => self.output_attributes(*input)?,
            Operator::Print { .. } => Vec::new(),
            Operator::HashJoin { build, probe, .. } => {
                let mut attributes = self.output_attributes(*probe)?;
                for attribute in self.output_attributes(*build)? {
                    if attributes.contains(&attribute) {
                        return Err(CodegenError::AmbiguousAttribute { node: op, attribute });
                    }
                    attributes.push(attribute);
                }
                attributes
            }
            Operator::Extension { .. } => {
                let mut attributes: Vec<String> = Vec::new();
                for child in self.plan.children(op)?.to_vec() {
                    for attribute in self.output_attributes(child)? {
                        if !attributes.contains(&attribute) {
                            attributes.push(attribute);
                        }
                    }
                }
                attributes
            }
        };
        Ok(attributes)
    }

    /// The single child of a unary operator
    pub fn only_child(&self, op: NodeId) -> Result<NodeId, CodegenError> {
        match self.plan.children(op)? {
            Children::Unary(child) => Ok(child),
            _ => Err(CodegenError::UnexpectedOperator {
                node: op,
                expected: self.plan.kind(op)?.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin_registry;
    use plancc_ir::{Attribute, BinOp, Catalog, Expr, PlanBuilder, Relation, TypeDescriptor};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .add_relation(
                Relation::new(
                    "orders",
                    100,
                    vec![
                        Attribute::new("o_id", TypeDescriptor::Integer),
                        Attribute::new(
                            "o_total",
                            TypeDescriptor::Numeric { precision: 12, scale: 2 },
                        ),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        catalog
            .add_relation(
                Relation::new(
                    "items",
                    400,
                    vec![
                        Attribute::new("i_order", TypeDescriptor::Integer),
                        Attribute::new("i_qty", TypeDescriptor::Integer),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_output_attributes() {
        let mut b = PlanBuilder::new();
        let orders = b.scan("orders");
        let items = b.scan("items");
        let join = b.hash_join(orders, items, "o_id", "i_order").unwrap();
        let bump = Expr::binary(
            BinOp::Add,
            Expr::column("i_qty"),
            Expr::literal("1", TypeDescriptor::Integer),
        );
        let map = b.map(join, "i_qty", bump).unwrap();
        let print = b.print(map, ["o_id"]).unwrap();
        let plan = b.finish(print).unwrap();

        let catalog = catalog();
        let registry = builtin_registry().freeze();
        let translator = Translator::new(&plan, &registry, &catalog);

        assert_eq!(
            translator.output_attributes(join).unwrap(),
            vec!["i_order", "i_qty", "o_id", "o_total"]
        );
        assert_eq!(
            translator.output_attributes(map).unwrap(),
            vec!["i_order", "o_id", "o_total", "i_qty"]
        );
        assert!(translator.output_attributes(print).unwrap().is_empty());
    }

    #[test]
    fn test_consume_from_non_child_rejected() {
        let mut b = PlanBuilder::new();
        let scan = b.scan("orders");
        let print = b.print(scan, ["o_id"]).unwrap();
        let plan = b.finish(print).unwrap();

        let catalog = catalog();
        let registry = builtin_registry().freeze();
        let translator = Translator::new(&plan, &registry, &catalog);

        let mut buffer = CodeBuffer::new();
        let err = translator.consume(scan, print, &mut buffer).unwrap_err();
        assert!(matches!(err, CodegenError::NotAChild { .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_missing_consumer() {
        let mut b = PlanBuilder::new();
        let scan = b.scan("orders");
        let plan = b.finish(scan).unwrap();

        let catalog = catalog();
        let registry = builtin_registry().freeze();
        let err = Translator::new(&plan, &registry, &catalog).translate().unwrap_err();
        assert!(matches!(err, CodegenError::NoConsumer { node } if node == scan));
    }
}
