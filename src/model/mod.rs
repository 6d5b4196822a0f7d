//! Package aggregation: merge the version constraints of every node in a graph.
//!
//! The merged table is a pure fold (max of lower bounds, min of upper bounds,
//! union of sub-libraries and requirers), so it does not depend on traversal
//! order. Emptiness is only checked after the whole graph was folded.

use crate::error::ConfigError;
use crate::graph::{Graph, Node};
use crate::spec::{Version, VersionRange};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRequirement {
    pub range: VersionRange,
    pub sublibs: BTreeSet<String>,
    /// Descriptor names that declared this package.
    pub required_by: BTreeSet<String>,
}

pub type PackageTable = BTreeMap<String, PackageRequirement>;

/// Per-package fold state. Remembers which declared range supplied the
/// current bounds so a conflict can name both sides.
#[derive(Debug)]
struct Acc {
    requirement: PackageRequirement,
    lower_from: Option<VersionRange>,
    upper_from: Option<VersionRange>,
}

impl Acc {
    fn new() -> Self {
        Self {
            requirement: PackageRequirement {
                range: VersionRange::default(),
                sublibs: BTreeSet::new(),
                required_by: BTreeSet::new(),
            },
            lower_from: None,
            upper_from: None,
        }
    }

    fn merge(&mut self, declared: &VersionRange) {
        if tighter_lower(&declared.min, &self.requirement.range.min) {
            self.lower_from = Some(declared.clone());
        }
        if tighter_upper(&declared.max, &self.requirement.range.max) {
            self.upper_from = Some(declared.clone());
        }
        self.requirement.range = self.requirement.range.intersect(declared);
    }
}

fn tighter_lower(new: &Option<Version>, current: &Option<Version>) -> bool {
    match (new, current) {
        (Some(n), Some(c)) => n > c,
        (Some(_), None) => true,
        _ => false,
    }
}

fn tighter_upper(new: &Option<Version>, current: &Option<Version>) -> bool {
    match (new, current) {
        (Some(n), Some(c)) => n < c,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Fold the constraints of `nodes`. Each node should appear once; repeats are
/// harmless since the fold is idempotent.
pub fn aggregate<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Result<PackageTable, ConfigError> {
    let mut acc: BTreeMap<String, Acc> = BTreeMap::new();
    for node in nodes {
        let descriptor = node.descriptor();
        for constraint in descriptor.packages() {
            let entry = acc
                .entry(constraint.package.clone())
                .or_insert_with(Acc::new);
            entry.merge(&constraint.range);
            entry
                .requirement
                .sublibs
                .extend(constraint.sublibs.iter().cloned());
            entry
                .requirement
                .required_by
                .insert(descriptor.name().to_string());
        }
    }

    let mut table = PackageTable::new();
    for (package, entry) in acc {
        if entry.requirement.range.is_empty() {
            return Err(ConfigError::UnsatisfiableConstraint {
                package,
                first: entry.lower_from.unwrap_or_default(),
                second: entry.upper_from.unwrap_or_default(),
            });
        }
        table.insert(package, entry.requirement);
    }
    Ok(table)
}

/// Merged package table of every node reachable from the graph root.
pub fn aggregate_packages(graph: &Graph) -> Result<PackageTable, ConfigError> {
    let nodes = graph.topological();
    let table = aggregate(nodes)?;
    tracing::debug!(packages = table.len(), nodes = nodes.len(), "aggregated package constraints");
    Ok(table)
}
