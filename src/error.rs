//! Errors raised while authoring descriptors, composing nodes, and building
//! a stack. Every variant is fatal for the configuration run.

use crate::spec::{Capability, VersionRange};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("dependency {index} of {node}: expected capability `{expected}`, got `{actual}`")]
    TagMismatch {
        node: String,
        index: usize,
        expected: Capability,
        actual: Capability,
    },

    #[error("{node}: expected {expected} arguments, got {observed}")]
    ArityMismatch {
        node: String,
        expected: usize,
        observed: usize,
    },

    #[error("package `{package}` has no version satisfying both {first} and {second}")]
    UnsatisfiableConstraint {
        package: String,
        first: VersionRange,
        second: VersionRange,
    },

    #[error("dependency {index} of {node}: `{dep}` belongs to another configuration run")]
    ForeignNode {
        node: String,
        index: usize,
        dep: String,
    },

    #[error("malformed device descriptor `{descriptor}`: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    #[error("{node}: no optional parameter named `{name}`")]
    UnknownParameter { node: String, name: String },

    #[error("{node}: optional parameter `{name}` supplied more than once")]
    DuplicateParameter { node: String, name: String },

    #[error("invalid version `{0}`")]
    InvalidVersion(String),
}

impl ConfigError {
    pub(crate) fn malformed(descriptor: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}
