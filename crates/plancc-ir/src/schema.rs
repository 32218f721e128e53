//! Relation schemas and the provider trait used by scan code generation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::{TypeDescriptor, TypeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Relation '{0}' not found")]
    RelationNotFound(String),

    #[error("Duplicate attribute '{attribute}' in relation '{relation}'")]
    DuplicateAttribute { relation: String, attribute: String },

    #[error("Duplicate relation '{0}'")]
    DuplicateRelation(String),

    #[error("Attribute name '{attribute}' in relation '{relation}' is not a valid identifier")]
    InvalidAttributeName { relation: String, attribute: String },

    #[error("Invalid type for {relation}.{attribute}: {source}")]
    InvalidType {
        relation: String,
        attribute: String,
        #[source]
        source: TypeError,
    },
}

const RESERVED_WORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// True if `name` can be bound with `let` in generated code
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = match chars.next() {
        Some(c) => c.is_ascii_alphabetic() || c == '_',
        None => false,
    };
    starts_ok
        && name != "_"
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

/// Attribute metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self { name: name.into(), ty }
    }
}

/// A stored relation: name, cardinality and ordered attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRelation")]
pub struct Relation {
    name: String,
    tuple_count: u64,
    attributes: Vec<Attribute>,
}

#[derive(Deserialize)]
struct RawRelation {
    name: String,
    #[serde(default)]
    tuple_count: u64,
    attributes: Vec<Attribute>,
}

impl TryFrom<RawRelation> for Relation {
    type Error = SchemaError;

    fn try_from(raw: RawRelation) -> Result<Self, Self::Error> {
        Relation::new(raw.name, raw.tuple_count, raw.attributes)
    }
}

impl Relation {
    /// Build a relation, rejecting duplicate or non-identifier attribute names
    /// and invalid types
    pub fn new(
        name: impl Into<String>,
        tuple_count: u64,
        attributes: Vec<Attribute>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        for (i, attr) in attributes.iter().enumerate() {
            if !is_valid_identifier(&attr.name) {
                return Err(SchemaError::InvalidAttributeName {
                    relation: name,
                    attribute: attr.name.clone(),
                });
            }
            if attributes[..i].iter().any(|a| a.name == attr.name) {
                return Err(SchemaError::DuplicateAttribute {
                    relation: name,
                    attribute: attr.name.clone(),
                });
            }
            attr.ty.validate().map_err(|source| SchemaError::InvalidType {
                relation: name.clone(),
                attribute: attr.name.clone(),
                source,
            })?;
        }

        Ok(Self {
            name,
            tuple_count,
            attributes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tuple_count(&self) -> u64 {
        self.tuple_count
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Resolves relation names at translation time
pub trait SchemaProvider {
    fn relation(&self, name: &str) -> Result<&Relation, SchemaError>;
}

/// In-memory set of relations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    relations: BTreeMap<String, Relation>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relation(&mut self, relation: Relation) -> Result<(), SchemaError> {
        if self.relations.contains_key(relation.name()) {
            return Err(SchemaError::DuplicateRelation(relation.name().to_string()));
        }
        self.relations.insert(relation.name().to_string(), relation);
        Ok(())
    }

    /// Load a catalog from its JSON form: `{"relations": {"name": {...}}}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }
}

impl SchemaProvider for Catalog {
    fn relation(&self, name: &str) -> Result<&Relation, SchemaError> {
        self.relations
            .get(name)
            .ok_or_else(|| SchemaError::RelationNotFound(name.to_string()))
    }
}
