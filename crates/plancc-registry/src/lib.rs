//! Operator kind registry
//!
//! Maps an `OperatorKind` to a produce function and, separately, a consume
//! function. Registration happens on a `RegistryBuilder`; `freeze` turns it
//! into an immutable `KindRegistry` that translation runs share read-only.
//! Re-registering a kind replaces the previous entry.

use plancc_ir::OperatorKind;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Protocol phase a lookup was made for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Produce,
    Consume,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Produce => f.write_str("produce"),
            Phase::Consume => f.write_str("consume"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown operator kind '{kind}': no {phase} function registered")]
    UnknownOperatorKind { kind: OperatorKind, phase: Phase },
}

/// Registration phase
pub struct RegistryBuilder<P, C> {
    produce: HashMap<OperatorKind, P>,
    consume: HashMap<OperatorKind, C>,
}

impl<P, C> RegistryBuilder<P, C> {
    pub fn new() -> Self {
        Self {
            produce: HashMap::new(),
            consume: HashMap::new(),
        }
    }

    pub fn register_produce(&mut self, kind: impl Into<OperatorKind>, func: P) -> &mut Self {
        let kind = kind.into();
        debug!(kind = %kind, "registering produce function");
        if self.produce.insert(kind.clone(), func).is_some() {
            debug!(kind = %kind, "produce function replaced");
        }
        self
    }

    pub fn register_consume(&mut self, kind: impl Into<OperatorKind>, func: C) -> &mut Self {
        let kind = kind.into();
        debug!(kind = %kind, "registering consume function");
        if self.consume.insert(kind.clone(), func).is_some() {
            debug!(kind = %kind, "consume function replaced");
        }
        self
    }

    /// End the registration phase
    pub fn freeze(self) -> KindRegistry<P, C> {
        KindRegistry {
            produce: self.produce,
            consume: self.consume,
        }
    }
}

impl<P, C> Default for RegistryBuilder<P, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen, read-only registry
pub struct KindRegistry<P, C> {
    produce: HashMap<OperatorKind, P>,
    consume: HashMap<OperatorKind, C>,
}

impl<P, C> KindRegistry<P, C> {
    pub fn lookup_produce(&self, kind: &OperatorKind) -> Result<&P, RegistryError> {
        self.produce.get(kind).ok_or_else(|| RegistryError::UnknownOperatorKind {
            kind: kind.clone(),
            phase: Phase::Produce,
        })
    }

    pub fn lookup_consume(&self, kind: &OperatorKind) -> Result<&C, RegistryError> {
        self.consume.get(kind).ok_or_else(|| RegistryError::UnknownOperatorKind {
            kind: kind.clone(),
            phase: Phase::Consume,
        })
    }

    /// Registered kinds, sorted by label
    pub fn kinds(&self) -> Vec<&OperatorKind> {
        let mut kinds: Vec<_> = self.produce.keys().chain(self.consume.keys()).collect();
        kinds.sort_by(|a, b| a.label().cmp(b.label()));
        kinds.dedup();
        kinds
    }

    /// Reopen for registration, e.g. to add extensions on top of built-ins
    pub fn thaw(self) -> RegistryBuilder<P, C> {
        RegistryBuilder {
            produce: self.produce,
            consume: self.consume,
        }
    }
}
