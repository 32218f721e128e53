//! plancc Intermediate Representation (IR)
//!
//! The operator tree handed to the code generator. Nodes live in an arena
//! addressed by `NodeId`; each node records the id of the node that owns it,
//! so the parent back-reference can never outlive its target. Plans are
//! serializable to JSON and fingerprinted for caching.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

mod expr;
mod schema;
mod types;

pub use expr::*;
pub use schema::*;
pub use types::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {child} is already owned by {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("Root {0} is owned by another node")]
    RootHasParent(NodeId),

    #[error("Node {0} is not reachable from the root")]
    Detached(NodeId),

    #[error("Extension kind '{0}' collides with a built-in operator")]
    ReservedKind(String),

    #[error("Extension '{kind}' has {count} inputs, at most 2 are supported")]
    TooManyInputs { kind: String, count: usize },

    #[error("'{0}' is not a valid identifier for a computed attribute")]
    InvalidIdentifier(String),
}

/// Index of a node inside its plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dispatch tag of an operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperatorKind {
    Scan,
    Map,
    Filter,
    Print,
    HashJoin,
    /// Kinds contributed by registrations outside this workspace
    Extension(String),
}

impl OperatorKind {
    pub fn label(&self) -> &str {
        match self {
            OperatorKind::Scan => "scan",
            OperatorKind::Map => "map",
            OperatorKind::Filter => "filter",
            OperatorKind::Print => "print",
            OperatorKind::HashJoin => "hashjoin",
            OperatorKind::Extension(label) => label,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, OperatorKind::Extension(_))
    }
}

impl From<&str> for OperatorKind {
    fn from(label: &str) -> Self {
        match label {
            "scan" => OperatorKind::Scan,
            "map" => OperatorKind::Map,
            "filter" => OperatorKind::Filter,
            "print" => OperatorKind::Print,
            "hashjoin" => OperatorKind::HashJoin,
            other => OperatorKind::Extension(other.to_string()),
        }
    }
}

impl From<String> for OperatorKind {
    fn from(label: String) -> Self {
        OperatorKind::from(label.as_str())
    }
}

impl From<OperatorKind> for String {
    fn from(kind: OperatorKind) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator payloads. Child slots hold ids of previously built nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operator {
    Scan {
        relation: String,
    },
    Map {
        input: NodeId,
        target: String,
        expr: Expr,
    },
    Filter {
        input: NodeId,
        predicate: Expr,
    },
    Print {
        input: NodeId,
        attributes: Vec<String>,
    },
    /// Equi-join; `build` is materialized into a hash table, `probe` streams
    HashJoin {
        build: NodeId,
        probe: NodeId,
        build_key: String,
        probe_key: String,
    },
    Extension {
        kind: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        inputs: Vec<NodeId>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<String, String>,
    },
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Scan { .. } => OperatorKind::Scan,
            Operator::Map { .. } => OperatorKind::Map,
            Operator::Filter { .. } => OperatorKind::Filter,
            Operator::Print { .. } => OperatorKind::Print,
            Operator::HashJoin { .. } => OperatorKind::HashJoin,
            Operator::Extension { kind, .. } => OperatorKind::Extension(kind.clone()),
        }
    }

    pub fn children(&self) -> Children {
        match self {
            Operator::Scan { .. } => Children::Leaf,
            Operator::Map { input, .. }
            | Operator::Filter { input, .. }
            | Operator::Print { input, .. } => Children::Unary(*input),
            Operator::HashJoin { build, probe, .. } => Children::Binary {
                left: *build,
                right: *probe,
            },
            Operator::Extension { inputs, .. } => match inputs.as_slice() {
                [] => Children::Leaf,
                [input] => Children::Unary(*input),
                [left, right, ..] => Children::Binary {
                    left: *left,
                    right: *right,
                },
            },
        }
    }
}

/// Child structure of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Children {
    Leaf,
    Unary(NodeId),
    Binary { left: NodeId, right: NodeId },
}

impl Children {
    pub fn to_vec(self) -> Vec<NodeId> {
        match self {
            Children::Leaf => vec![],
            Children::Unary(child) => vec![child],
            Children::Binary { left, right } => vec![left, right],
        }
    }

    pub fn contains(self, id: NodeId) -> bool {
        self.to_vec().contains(&id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: OperatorKind,
    parent: Option<NodeId>,
    op: Operator,
}

impl Node {
    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    pub fn children(&self) -> Children {
        self.op.children()
    }
}

/// Bottom-up tree construction.
///
/// Adopting a child installs its parent back-reference. A node can be adopted
/// once; children always precede their parent in the arena, so the result is
/// acyclic by construction.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    nodes: Vec<Node>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&mut self, relation: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: OperatorKind::Scan,
            parent: None,
            op: Operator::Scan {
                relation: relation.into(),
            },
        });
        id
    }

    pub fn map(
        &mut self,
        input: NodeId,
        target: impl Into<String>,
        expr: Expr,
    ) -> Result<NodeId, TreeError> {
        self.add(Operator::Map {
            input,
            target: target.into(),
            expr,
        })
    }

    pub fn filter(&mut self, input: NodeId, predicate: Expr) -> Result<NodeId, TreeError> {
        self.add(Operator::Filter { input, predicate })
    }

    pub fn print<I, S>(&mut self, input: NodeId, attributes: I) -> Result<NodeId, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(Operator::Print {
            input,
            attributes: attributes.into_iter().map(Into::into).collect(),
        })
    }

    pub fn hash_join(
        &mut self,
        build: NodeId,
        probe: NodeId,
        build_key: impl Into<String>,
        probe_key: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.add(Operator::HashJoin {
            build,
            probe,
            build_key: build_key.into(),
            probe_key: probe_key.into(),
        })
    }

    pub fn extension(
        &mut self,
        kind: impl Into<String>,
        inputs: Vec<NodeId>,
        properties: BTreeMap<String, String>,
    ) -> Result<NodeId, TreeError> {
        self.add(Operator::Extension {
            kind: kind.into(),
            inputs,
            properties,
        })
    }

    /// Add any operator, adopting the children it names
    pub fn add(&mut self, op: Operator) -> Result<NodeId, TreeError> {
        if let Operator::Map { target, .. } = &op {
            if !is_valid_identifier(target) {
                return Err(TreeError::InvalidIdentifier(target.clone()));
            }
        }
        if let Operator::Extension { kind, inputs, .. } = &op {
            if OperatorKind::from(kind.as_str()).is_builtin() {
                return Err(TreeError::ReservedKind(kind.clone()));
            }
            if inputs.len() > 2 {
                return Err(TreeError::TooManyInputs {
                    kind: kind.clone(),
                    count: inputs.len(),
                });
            }
        }

        let id = NodeId(self.nodes.len());
        let children = op.children().to_vec();
        for (i, child) in children.iter().enumerate() {
            let node = self.nodes.get(child.0).ok_or(TreeError::UnknownNode(*child))?;
            if let Some(parent) = node.parent {
                return Err(TreeError::AlreadyParented { child: *child, parent });
            }
            // Same node in both slots of a binary operator
            if children[..i].contains(child) {
                return Err(TreeError::AlreadyParented { child: *child, parent: id });
            }
        }

        for child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(Node {
            kind: op.kind(),
            parent: None,
            op,
        });
        Ok(id)
    }

    /// Seal the tree under `root`
    pub fn finish(self, root: NodeId) -> Result<Plan, TreeError> {
        let node = self.nodes.get(root.0).ok_or(TreeError::UnknownNode(root))?;
        if node.parent.is_some() {
            return Err(TreeError::RootHasParent(root));
        }
        if let Some(detached) = (0..self.nodes.len())
            .map(NodeId)
            .find(|id| *id != root && self.nodes[id.0].parent.is_none())
        {
            return Err(TreeError::Detached(detached));
        }

        Ok(Plan {
            nodes: self.nodes,
            root,
        })
    }
}

/// A complete operator tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan", into = "RawPlan")]
pub struct Plan {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Serialized form; parents are rebuilt on load
#[derive(Serialize, Deserialize)]
struct RawPlan {
    operators: Vec<Operator>,
    root: NodeId,
}

impl From<Plan> for RawPlan {
    fn from(plan: Plan) -> Self {
        RawPlan {
            operators: plan.nodes.into_iter().map(|n| n.op).collect(),
            root: plan.root,
        }
    }
}

impl TryFrom<RawPlan> for Plan {
    type Error = TreeError;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let mut builder = PlanBuilder::new();
        for op in raw.operators {
            builder.add(op)?;
        }
        builder.finish(raw.root)
    }
}

impl Plan {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<&OperatorKind, TreeError> {
        Ok(self.node(id)?.kind())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(id)?.parent())
    }

    pub fn children(&self, id: NodeId) -> Result<Children, TreeError> {
        Ok(self.node(id)?.children())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Ids from `id`'s parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            plan: self,
            next: self.nodes.get(id.0).and_then(|n| n.parent),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Calculate fingerprint (SHA-256) for deterministic caching
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("plan should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

pub struct Ancestors<'a> {
    plan: &'a Plan,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.plan.nodes.get(current.0).and_then(|n| n.parent);
        Some(current)
    }
}
