//! graph-relay-core: a vertex-centric graph processing engine.
//!
//! A directed multigraph whose nodes and edges carry attribute labels, a
//! synchronous superstep primitive ([`Graph::send_collect`]) for expressing
//! message-passing algorithms, and algorithms built on it: out-degree,
//! connected components and PageRank. Also provides a small motif query
//! language, binary persistence and DOT export.

mod algorithms;
mod config;
mod engine;
mod error;
mod export;
mod graph;
mod label;
mod motif;
mod persist;

pub use algorithms::{
    components, connected_components, out_degree, page_rank, Convergence, PageRankConfig,
    DEFAULT_MAX_SUPERSTEPS,
};
pub use config::EngineConfig;
pub use engine::{Outbox, SuperstepStats};
pub use error::{GraphError, Result};
pub use export::DotStyle;
pub use graph::{EdgeView, Graph, NodeKey, NodeMut, NodeView};
pub use label::{keys, ComponentTag, Label, Value};
pub use motif::{parse_motif, MotifMatch, Pattern};
pub use persist::GraphSnapshot;
