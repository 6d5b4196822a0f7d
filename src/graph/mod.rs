//! Composition layer: nodes, the application operator and the graph they form.

pub mod dag;
pub mod node;
pub mod params;

pub use dag::Graph;
pub use node::{ConfigRun, Node, NodeId, RunId, Typed};
pub use params::{ParamValue, Params, Selection};
