//! Graph -> validated package table -> emitted statements.

use crate::error::ConfigError;
use crate::graph::Graph;
use crate::model::{self, PackageTable};
use crate::render::emit::{self, Statement};
use serde::Serialize;

/// What the build tooling receives from one configuration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
    pub packages: PackageTable,
    pub statements: Vec<Statement>,
    pub entry: String,
}

/// Aggregate first, over the whole graph, and emit only once every package
/// range is known to be satisfiable. Any error leaves no output behind.
pub fn build(graph: &Graph) -> Result<BuildOutput, ConfigError> {
    let packages = model::aggregate_packages(graph)?;
    let emitted = emit::emit(graph)?;
    tracing::info!(
        entry = %emitted.entry,
        statements = emitted.statements.len(),
        packages = packages.len(),
        "stack built"
    );
    Ok(BuildOutput {
        packages,
        statements: emitted.statements,
        entry: emitted.entry,
    })
}
