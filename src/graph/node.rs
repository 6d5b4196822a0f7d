//! Materialized nodes and the application operator that builds them.

use crate::error::ConfigError;
use crate::graph::params::{Params, Selection};
use crate::spec::{Capability, Descriptor, Tag};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RUN: AtomicU64 = AtomicU64::new(0);

/// Process-unique run number. Only used to keep runs apart; it never
/// reaches emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

/// Run-local node number; also the numeric suffix of the generated identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug)]
struct NodeData {
    run: RunId,
    id: NodeId,
    ident: String,
    descriptor: Descriptor,
    deps: Vec<Node>,
    params: Selection,
}

/// A fully applied descriptor. Cloning shares the node, so the same node can
/// feed several dependents.
#[derive(Debug, Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Run the node was applied in.
    pub fn run(&self) -> RunId {
        self.0.run
    }

    /// Identity of the shared node, stable for its lifetime.
    pub(crate) fn key(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }

    /// Generated identifier bound in emitted code.
    pub fn ident(&self) -> &str {
        &self.0.ident
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.0.descriptor
    }

    pub fn output(&self) -> &Capability {
        self.0.descriptor.output()
    }

    pub fn deps(&self) -> &[Node] {
        &self.0.deps
    }

    pub fn params(&self) -> &Selection {
        &self.0.params
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ident(), self.descriptor().name())
    }
}

/// One configuration run. Owns the identifier counter; a new run starts at 0
/// so the same composition always yields the same identifiers. Nodes from
/// another run are rejected as dependencies since their identifiers can clash.
#[derive(Debug)]
pub struct ConfigRun {
    run: RunId,
    next: u32,
}

impl Default for ConfigRun {
    fn default() -> Self {
        Self {
            run: RunId(NEXT_RUN.fetch_add(1, Ordering::Relaxed)),
            next: 0,
        }
    }
}

impl ConfigRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes applied so far.
    pub fn applied(&self) -> u32 {
        self.next
    }

    /// Apply `descriptor` to `deps` (one per required input, in order) and an
    /// optional-parameter request.
    ///
    /// This is the only constructor of `Node`: every graph reachable from a
    /// node has matching arity and capabilities at each edge, and is acyclic
    /// since `deps` must already exist.
    pub fn apply(
        &mut self,
        descriptor: &Descriptor,
        deps: Vec<Node>,
        params: Params,
    ) -> Result<Node, ConfigError> {
        let expected = descriptor.inputs();
        if deps.len() != expected.len() {
            return Err(ConfigError::ArityMismatch {
                node: descriptor.name().to_string(),
                expected: expected.len(),
                observed: deps.len(),
            });
        }
        for (index, (dep, want)) in deps.iter().zip(expected).enumerate() {
            if dep.output() != want {
                return Err(ConfigError::TagMismatch {
                    node: descriptor.name().to_string(),
                    index,
                    expected: want.clone(),
                    actual: dep.output().clone(),
                });
            }
        }
        for (index, dep) in deps.iter().enumerate() {
            if dep.run() != self.run {
                return Err(ConfigError::ForeignNode {
                    node: descriptor.name().to_string(),
                    index,
                    dep: dep.ident().to_string(),
                });
            }
        }
        let params = Selection::resolve(descriptor.name(), descriptor.slots(), params)?;

        let id = NodeId(self.next);
        self.next += 1;
        let ident = format!("{}_{}", descriptor.prefix(), id.0);
        tracing::trace!(%ident, descriptor = descriptor.name(), deps = deps.len(), "applied");

        Ok(Node(Arc::new(NodeData {
            run: self.run,
            id,
            ident,
            descriptor: descriptor.clone(),
            deps,
            params,
        })))
    }

    /// `apply` for Rust composition code: capabilities of the result are
    /// tracked in the type.
    pub fn apply_typed<T: Tag>(
        &mut self,
        descriptor: &Descriptor,
        deps: Vec<Node>,
        params: Params,
    ) -> Result<Typed<T>, ConfigError> {
        if *descriptor.output() != T::CAPABILITY {
            return Err(ConfigError::TagMismatch {
                node: descriptor.name().to_string(),
                index: 0,
                expected: T::CAPABILITY,
                actual: descriptor.output().clone(),
            });
        }
        self.apply(descriptor, deps, params).map(Typed::unchecked)
    }
}

/// A node whose capability is known statically.
#[derive(Debug)]
pub struct Typed<T: Tag> {
    node: Node,
    _tag: PhantomData<fn() -> T>,
}

impl<T: Tag> Typed<T> {
    fn unchecked(node: Node) -> Self {
        Self {
            node,
            _tag: PhantomData,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }
}

impl<T: Tag> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self::unchecked(self.node.clone())
    }
}

impl<T: Tag> TryFrom<Node> for Typed<T> {
    type Error = ConfigError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        if *node.output() != T::CAPABILITY {
            return Err(ConfigError::TagMismatch {
                node: node.descriptor().name().to_string(),
                index: 0,
                expected: T::CAPABILITY,
                actual: node.output().clone(),
            });
        }
        Ok(Self::unchecked(node))
    }
}
