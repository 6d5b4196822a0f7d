//! Composition file (stack.json): extra devices, node applications, root.
//!
//! JSON shape:
//! {
//!   "devices": [                      // optional, added to the standard catalog
//!     {
//!       "name": "ipv4_custom",
//!       "prefix": "ipv4",             // optional, defaults to name
//!       "module": "my_ip::Ipv4",      // optional, defaults to name
//!       "output": "ipv4",
//!       "inputs": ["ethernet", "arp"],
//!       "packages": [{ "name": "my-ip", "min": "0.3", "max": "0.4", "sublibs": [] }],
//!       "optional": ["gateway"]
//!     }
//!   ],
//!   "nodes": [
//!     { "id": "net", "device": "tap", "params": { "device": "\"tap0\"" } },
//!     { "id": "eth", "device": "ethernet", "deps": ["net"] },
//!     ...
//!   ],
//!   "root": "stack"                   // optional, defaults to the last node
//! }
//!
//! Nodes are applied in file order and may only depend on nodes declared
//! before them, so a composition file cannot describe a cycle.

use crate::Result;
use crate::devices::Catalog;
use crate::diagnostics;
use crate::graph::{ConfigRun, Graph, Node, ParamValue, Params};
use crate::spec::{Capability, Descriptor, Package};

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositionSpec {
    #[serde(default)]
    pub devices: Vec<RawDevice>,

    pub nodes: Vec<RawNode>,

    #[serde(default)]
    pub root: Option<String>,
}

/// Descriptor declared inline in a composition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDevice {
    pub name: String,

    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub module: Option<String>,

    pub output: Capability,

    #[serde(default)]
    pub inputs: Vec<Capability>,

    #[serde(default)]
    pub packages: Vec<Package>,

    #[serde(default)]
    pub optional: Vec<String>,
}

/// One application, as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawNode {
    pub id: String,

    pub device: String,

    #[serde(default)]
    pub deps: Vec<String>,

    /// Slot name -> value. Ordering comes from the descriptor, not the file.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

/// A composition applied through the operator.
#[derive(Debug, Clone)]
pub struct Composed {
    pub graph: Graph,
    /// Every node of the file by id, including ones the root does not reach.
    pub nodes: BTreeMap<String, Node>,
}

impl RawDevice {
    fn to_descriptor(&self) -> std::result::Result<Descriptor, crate::ConfigError> {
        let mut builder = Descriptor::builder(self.name.clone(), self.output.clone())
            .inputs(self.inputs.iter().cloned());
        if let Some(prefix) = &self.prefix {
            builder = builder.prefix(prefix.clone());
        }
        if let Some(module) = &self.module {
            builder = builder.module(module.clone());
        }
        for package in &self.packages {
            builder = builder.package(package.clone());
        }
        for slot in &self.optional {
            builder = builder.optional(slot.clone());
        }
        builder.build()
    }
}

impl CompositionSpec {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse composition file")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read composition file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Register inline devices, apply every node in order, and pick the root.
    ///
    /// Phases:
    /// 1) Extend the catalog (descriptor validation happens here).
    /// 2) Apply nodes: unique ids, known devices, backward-only deps.
    /// 3) Resolve the root; warn about nodes and devices it never reaches.
    pub fn validate_and_build(&self, mut catalog: Catalog) -> Result<Composed> {
        // Phase 1: inline devices.
        let mut custom: BTreeSet<&str> = BTreeSet::new();
        for raw in &self.devices {
            let descriptor = raw
                .to_descriptor()
                .with_context(|| format!("device `{}`", raw.name))?;
            catalog
                .register(descriptor)
                .with_context(|| format!("device `{}`", raw.name))?;
            custom.insert(raw.name.as_str());
        }

        // Phase 2: nodes, in file order.
        if self.nodes.is_empty() {
            bail!(
                "{}",
                diagnostics::error_message("composition file contained no nodes")
            );
        }
        let mut run = ConfigRun::new();
        let mut nodes: BTreeMap<String, Node> = BTreeMap::new();
        for raw in &self.nodes {
            if nodes.contains_key(&raw.id) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "duplicate node id in composition file: {}",
                        raw.id
                    ))
                );
            }
            let Some(descriptor) = catalog.get(&raw.device) else {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "node `{}` uses unknown device `{}`",
                        raw.id, raw.device
                    ))
                );
            };

            let mut deps = Vec::with_capacity(raw.deps.len());
            for dep in &raw.deps {
                match nodes.get(dep) {
                    Some(node) => deps.push(node.clone()),
                    None => bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "node `{}` depends on `{}`, which is not declared before it",
                            raw.id, dep
                        ))
                    ),
                }
            }

            let params: Params = raw
                .params
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();

            let node = run
                .apply(descriptor, deps, params)
                .with_context(|| format!("node `{}`", raw.id))?;
            nodes.insert(raw.id.clone(), node);
        }

        // Phase 3: root and reachability.
        let root_id = match &self.root {
            Some(id) => id.as_str(),
            None => self
                .nodes
                .last()
                .map(|n| n.id.as_str())
                .context("composition file contained no nodes")?,
        };
        let Some(root) = nodes.get(root_id) else {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "root references unknown node: {}",
                    root_id
                ))
            );
        };
        let graph = Graph::new(root.clone());

        let reachable = graph.topological();
        for (id, node) in &nodes {
            if !reachable.contains(node) {
                diagnostics::warn(format!(
                    "node `{}` is not reachable from root `{}` and will not be emitted",
                    id, root_id
                ));
            }
        }
        for name in custom {
            if !reachable.iter().any(|n| n.descriptor().name() == name) {
                diagnostics::warn(format!("device `{}` is declared but never used", name));
            }
        }

        Ok(Composed { graph, nodes })
    }
}
