//! Ordered code emission.
//!
//! Follows the graph's topological order: a node is emitted only after all of
//! its dependencies, so no statement references an identifier that is not
//! bound yet. Each node produces exactly one binding statement.

use crate::error::ConfigError;
use crate::graph::{Graph, Node, ParamValue};
use serde::Serialize;

/// One flattened argument of an initialization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    /// Identifier of an already emitted dependency.
    Dep(&'a str),
    Labeled {
        label: &'a str,
        value: &'a ParamValue,
    },
}

/// Everything an emission function receives for one node.
#[derive(Debug)]
pub struct Call<'a> {
    /// Descriptor name, for error reporting.
    pub node: &'a str,
    pub ident: &'a str,
    pub module: &'a str,
    /// Required inputs plus the optional values supplied at application.
    pub expected: usize,
    pub args: Vec<Arg<'a>>,
}

impl Call<'_> {
    /// Total arity check. The threader guarantees order; this guarantees count.
    pub fn check_arity(&self) -> Result<(), ConfigError> {
        if self.args.len() != self.expected {
            return Err(ConfigError::ArityMismatch {
                node: self.node.to_string(),
                expected: self.expected,
                observed: self.args.len(),
            });
        }
        Ok(())
    }
}

/// Default emission: `let id = module::connect(&dep, ..).label(value)...await?;`
pub fn connect_call(call: &Call<'_>) -> Result<String, ConfigError> {
    call.check_arity()?;

    let mut deps = Vec::new();
    let mut options = String::new();
    for arg in &call.args {
        match arg {
            Arg::Dep(ident) => deps.push(format!("&{}", ident)),
            Arg::Labeled { label, value } => {
                options.push_str(&format!(".{}({})", label, value));
            }
        }
    }

    Ok(format!(
        "let {} = {}::connect({}){}.await?;",
        call.ident,
        call.module,
        deps.join(", "),
        options
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub ident: String,
    /// Descriptor the statement was emitted for.
    pub device: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emitted {
    pub statements: Vec<Statement>,
    /// Identifier of the root node: the stack's handle.
    pub entry: String,
}

/// Flatten one node's dependency identifiers and present optional values.
fn flatten(node: &Node) -> Call<'_> {
    let descriptor = node.descriptor();
    let mut args: Vec<Arg<'_>> = node.deps().iter().map(|d| Arg::Dep(d.ident())).collect();
    args.extend(
        node.params()
            .thread(descriptor.slots())
            .map(|(label, value)| Arg::Labeled { label, value }),
    );
    Call {
        node: descriptor.name(),
        ident: node.ident(),
        module: descriptor.module(),
        expected: descriptor.emission().arity() + node.params().supplied(),
        args,
    }
}

pub fn emit_node(node: &Node) -> Result<Statement, ConfigError> {
    let call = flatten(node);
    let text = node.descriptor().emission().render(&call)?;
    Ok(Statement {
        ident: node.ident().to_string(),
        device: node.descriptor().name().to_string(),
        text,
    })
}

/// Emit every node reachable from the root, dependencies first.
pub fn emit(graph: &Graph) -> Result<Emitted, ConfigError> {
    let statements = graph
        .topological()
        .iter()
        .map(emit_node)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(statements = statements.len(), entry = graph.root().ident(), "emitted stack");

    Ok(Emitted {
        statements,
        entry: graph.root().ident().to_string(),
    })
}
