use std::collections::HashMap;

use anyhow::{Context, Result};
use quick_xml::de;
use serde::Deserialize;
use serde_json::Value;

use super::document::{GraphDocument, RawEdge, RawNode};

#[derive(Debug, Deserialize)]
struct GraphMlFile {
    #[serde(rename = "key", default)]
    keys: Vec<GraphMlKey>,
    #[serde(rename = "graph", default)]
    graphs: Vec<GraphMlGraph>,
}

#[derive(Debug, Deserialize)]
struct GraphMlKey {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@attr.name", default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphMlGraph {
    #[serde(rename = "node", default)]
    nodes: Vec<GraphMlNode>,
    #[serde(rename = "edge", default)]
    edges: Vec<GraphMlEdge>,
}

#[derive(Debug, Deserialize)]
struct GraphMlNode {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "data", default)]
    data: Vec<GraphMlData>,
}

#[derive(Debug, Deserialize)]
struct GraphMlEdge {
    #[serde(rename = "@source")]
    source: String,
    #[serde(rename = "@target")]
    target: String,
    #[serde(rename = "data", default)]
    data: Vec<GraphMlData>,
}

#[derive(Debug, Deserialize)]
struct GraphMlData {
    #[serde(rename = "@key")]
    key: String,
    #[serde(rename = "$text", default)]
    value: String,
}

/// Maps `<data key="d3">` to the attribute name declared by the matching `<key>`.
struct AttributeNames<'a>(HashMap<&'a str, &'a str>);

impl<'a> AttributeNames<'a> {
    fn new(keys: &'a [GraphMlKey]) -> Self {
        Self(
            keys.iter()
                .map(|key| (key.id.as_str(), key.name.as_deref().unwrap_or(key.id.as_str())))
                .collect(),
        )
    }

    /// Named, non-empty values of one element's `<data>` children.
    fn resolve(&self, data: &[GraphMlData]) -> Vec<(&'a str, String)> {
        data.iter()
            .filter_map(|entry| {
                let name = self.0.get(entry.key.as_str()).copied()?;
                let value = entry.value.trim();
                (!value.is_empty()).then(|| (name, value.to_owned()))
            })
            .collect()
    }
}

impl GraphDocument {
    /// Reads the GraphML written by the extraction pipeline. Only the first
    /// `<graph>` element is used; unknown attributes are ignored.
    pub fn from_graphml(raw: &str) -> Result<Self> {
        let file: GraphMlFile = de::from_str(raw).context("invalid GraphML document")?;
        let names = AttributeNames::new(&file.keys);
        let graph = file.graphs.into_iter().next().unwrap_or_default();

        let nodes = graph
            .nodes
            .iter()
            .map(|node| node_from_graphml(node, &names))
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|edge| edge_from_graphml(edge, &names))
            .collect();

        Ok(Self { nodes, edges })
    }
}

fn node_from_graphml(node: &GraphMlNode, names: &AttributeNames<'_>) -> RawNode {
    let mut raw = RawNode {
        id: node.id.clone(),
        kind: None,
        name: None,
        canonical_name: None,
        statement: None,
        content: None,
        paper_id: None,
        year: None,
        entity_type: None,
    };
    for (name, value) in names.resolve(&node.data) {
        match name {
            "type" => raw.kind = Some(value),
            "name" => raw.name = Some(value),
            "canonicalName" | "canonical_name" => raw.canonical_name = Some(value),
            "statement" => raw.statement = Some(value),
            "content" => raw.content = Some(value),
            "paperId" | "paper_id" => raw.paper_id = Some(value),
            "year" => raw.year = Some(Value::String(value)),
            "entityType" | "entity_type" => raw.entity_type = Some(value),
            _ => {}
        }
    }
    raw
}

fn edge_from_graphml(edge: &GraphMlEdge, names: &AttributeNames<'_>) -> RawEdge {
    let mut raw = RawEdge {
        source: edge.source.clone(),
        target: edge.target.clone(),
        kind: None,
        context: None,
    };
    for (name, value) in names.resolve(&edge.data) {
        match name {
            "type" => raw.kind = Some(value),
            "context" => raw.context = Some(value),
            _ => {}
        }
    }
    raw
}
