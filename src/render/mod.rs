//! Output side: per-node emission and whole-stack renderers.

pub mod emit;
pub mod source;

pub use emit::{Arg, Call, Emitted, Statement, emit, emit_node};
pub use source::{render_json, render_manifest, render_rust_module};
