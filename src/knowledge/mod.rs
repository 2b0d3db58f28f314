mod document;
mod graph;
mod graphml;
mod load;

#[cfg(test)]
pub(crate) mod fixtures;

pub use graph::{Connection, EgoNetwork, KnowledgeGraph, NodeKind};
pub use load::load_graph;
