use std::collections::{BTreeMap, HashMap};

use super::document::{GraphDocument, RawEdge, RawNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Paper,
    Hypothesis,
    Method,
    Result,
    Conclusion,
    Entity,
    Unknown,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "paper" => Self::Paper,
            "hypothesis" => Self::Hypothesis,
            "method" => Self::Method,
            "result" => Self::Result,
            "conclusion" => Self::Conclusion,
            "entity" => Self::Entity,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Hypothesis => "Hypothesis",
            Self::Method => "Method",
            Self::Result => "Result",
            Self::Conclusion => "Conclusion",
            Self::Entity => "Entity",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: Option<String>,
    pub canonical_name: Option<String>,
    pub statement: Option<String>,
    pub content: Option<String>,
    pub paper_id: Option<String>,
    pub year: Option<String>,
    pub entity_type: Option<String>,
}

impl GraphNode {
    fn from_raw(raw: RawNode) -> Self {
        let year = raw.year_text();
        Self {
            kind: raw
                .kind
                .as_deref()
                .map(NodeKind::from_tag)
                .unwrap_or(NodeKind::Unknown),
            id: raw.id,
            name: raw.name,
            canonical_name: raw.canonical_name,
            statement: raw.statement,
            content: raw.content,
            paper_id: raw.paper_id,
            year,
            entity_type: raw.entity_type,
        }
    }

    /// Short human label: name, then canonical name, then the statement, then the id.
    pub fn label(&self) -> &str {
        [&self.name, &self.canonical_name, &self.statement]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or(self.id.as_str())
    }

    /// Lower-cased concatenation of every descriptive field that is present.
    pub fn search_text(&self) -> String {
        let mut parts = vec![self.id.as_str()];
        parts.extend(self.name.as_deref());
        parts.extend(self.canonical_name.as_deref());
        parts.extend(self.statement.as_deref());
        parts.push(self.kind.label());
        parts.extend(self.entity_type.as_deref());
        parts.extend(self.content.as_deref());
        parts.join(" ").to_lowercase()
    }
}

#[derive(Clone, Debug)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub kind: Option<String>,
    pub context: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub node: usize,
    pub edge: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EgoNetwork {
    pub incoming: Vec<Connection>,
    pub outgoing: Vec<Connection>,
}

impl EgoNetwork {
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }

    /// Distinct neighbor indices, incoming first, in edge order.
    pub fn neighbors(&self) -> Vec<usize> {
        let mut neighbors = Vec::with_capacity(self.incoming.len() + self.outgoing.len());
        for connection in self.incoming.iter().chain(self.outgoing.iter()) {
            if !neighbors.contains(&connection.node) {
                neighbors.push(connection.node);
            }
        }
        neighbors
    }

    pub fn contains(&self, node: usize) -> bool {
        self.incoming
            .iter()
            .chain(self.outgoing.iter())
            .any(|connection| connection.node == node)
    }

    pub fn contains_edge(&self, edge: usize) -> bool {
        self.incoming
            .iter()
            .chain(self.outgoing.iter())
            .any(|connection| connection.edge == edge)
    }
}

#[derive(Clone, Debug, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
    kind_counts: BTreeMap<NodeKind, usize>,
    degrees: Vec<usize>,
    dropped_edges: usize,
}

impl KnowledgeGraph {
    pub fn from_document(document: GraphDocument) -> Self {
        let mut nodes = Vec::with_capacity(document.nodes.len());
        let mut index_by_id = HashMap::with_capacity(document.nodes.len());

        for raw in document.nodes {
            if index_by_id.contains_key(&raw.id) {
                tracing::warn!(id = %raw.id, "duplicate node id ignored");
                continue;
            }
            index_by_id.insert(raw.id.clone(), nodes.len());
            nodes.push(GraphNode::from_raw(raw));
        }

        let mut edges = Vec::with_capacity(document.edges.len());
        let mut dropped_edges = 0usize;
        for RawEdge {
            source,
            target,
            kind,
            context,
        } in document.edges
        {
            let (Some(&source_index), Some(&target_index)) =
                (index_by_id.get(&source), index_by_id.get(&target))
            else {
                tracing::warn!(%source, %target, "edge references an unknown node, dropping it");
                dropped_edges += 1;
                continue;
            };

            edges.push(GraphEdge {
                source: source_index,
                target: target_index,
                kind,
                context,
            });
        }

        let mut kind_counts = BTreeMap::new();
        for node in &nodes {
            *kind_counts.entry(node.kind).or_insert(0) += 1;
        }

        let mut degrees = vec![0usize; nodes.len()];
        for edge in &edges {
            degrees[edge.source] += 1;
            if edge.target != edge.source {
                degrees[edge.target] += 1;
            }
        }

        Self {
            nodes,
            edges,
            index_by_id,
            kind_counts,
            degrees,
            dropped_edges,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn edge(&self, index: usize) -> Option<&GraphEdge> {
        self.edges.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn degree(&self, index: usize) -> usize {
        self.degrees.get(index).copied().unwrap_or(0)
    }

    pub fn kind_counts(&self) -> &BTreeMap<NodeKind, usize> {
        &self.kind_counts
    }

    pub fn dropped_edge_count(&self) -> usize {
        self.dropped_edges
    }

    /// Full scan of the edge list; selection changes are user paced.
    pub fn ego_network(&self, index: usize) -> EgoNetwork {
        let mut network = EgoNetwork::default();
        if index >= self.nodes.len() {
            return network;
        }

        for (edge_index, edge) in self.edges.iter().enumerate() {
            if edge.target == index {
                network.incoming.push(Connection {
                    node: edge.source,
                    edge: edge_index,
                });
            }
            if edge.source == index {
                network.outgoing.push(Connection {
                    node: edge.target,
                    edge: edge_index,
                });
            }
        }

        network
    }
}
