use serde_json::{Value, json};

use super::KnowledgeGraph;
use super::document::GraphDocument;

pub(crate) fn graph_from(value: Value) -> KnowledgeGraph {
    let document: GraphDocument = serde_json::from_value(value).unwrap();
    KnowledgeGraph::from_document(document)
}

/// `A:Paper -> B:Entity -> C:Result`.
pub(crate) fn chain_graph() -> KnowledgeGraph {
    graph_from(json!({
        "nodes": [
            {"id": "A", "type": "Paper", "name": "Caloric restriction"},
            {"id": "B", "type": "Entity", "canonicalName": "SIRT1 pathway", "entityType": "Gene"},
            {"id": "C", "type": "Result", "statement": "Lifespan extended"}
        ],
        "edges": [
            {"source": "A", "target": "B", "type": "MENTIONS"},
            {"source": "B", "target": "C"}
        ]
    }))
}

/// A hub with `spokes` outgoing neighbors plus one isolated node with id `lonely`.
pub(crate) fn hub_graph(spokes: usize) -> KnowledgeGraph {
    let mut nodes = vec![json!({"id": "hub", "type": "Paper"}), json!({"id": "lonely"})];
    let mut edges = Vec::new();
    for index in 0..spokes {
        let id = format!("spoke{index}");
        nodes.push(json!({"id": id, "type": "Entity"}));
        edges.push(json!({"source": "hub", "target": id, "type": "MENTIONS"}));
    }
    graph_from(json!({"nodes": nodes, "edges": edges}))
}
