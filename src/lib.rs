//! Configuration-time composition of modular network stacks.
//!
//! Device descriptors declare what each layer implementation needs; the
//! application operator assembles them into a typed node graph; the build
//! pipeline merges package constraints over the whole graph and then emits
//! the initialization code in dependency order.

pub mod compose;
pub mod devices;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod spec;

pub use error::ConfigError;
pub use pipeline::{BuildOutput, build};

pub type Result<T> = anyhow::Result<T>;
