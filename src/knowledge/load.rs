use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::document::GraphDocument;
use super::graph::KnowledgeGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    GraphMl,
}

impl DocumentFormat {
    /// `.graphml` and `.xml` files are GraphML; everything else is read as JSON.
    fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("graphml" | "xml") => Self::GraphMl,
            _ => Self::Json,
        }
    }
}

pub fn load_graph(path: &Path) -> Result<KnowledgeGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph document {}", path.display()))?;
    let format = DocumentFormat::from_path(path);
    let document = match format {
        DocumentFormat::Json => GraphDocument::from_json(&raw),
        DocumentFormat::GraphMl => GraphDocument::from_graphml(&raw),
    }
    .with_context(|| format!("failed to parse graph document {}", path.display()))?;

    let graph = KnowledgeGraph::from_document(document);
    tracing::info!(
        path = %path.display(),
        ?format,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        dropped_edges = graph.dropped_edge_count(),
        "graph document loaded"
    );
    Ok(graph)
}
