use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default, alias = "links")]
    pub edges: Vec<RawEdge>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "canonicalName", alias = "canonical_name")]
    pub canonical_name: Option<String>,
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "paperId", alias = "paper_id")]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default, rename = "entityType", alias = "entity_type")]
    pub entity_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl GraphDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid graph document JSON")
    }
}

impl RawNode {
    /// Years arrive as numbers from some exporters and as strings from others.
    pub(super) fn year_text(&self) -> Option<String> {
        match self.year.as_ref()? {
            Value::Number(number) => Some(number.to_string()),
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_links_alias_and_snake_case_fields() {
        let document = GraphDocument::from_json(
            r#"{
                "nodes": [
                    {"id": "Gene_SIRT1", "type": "Entity", "canonical_name": "SIRT1", "entity_type": "Gene"},
                    {"id": "p1", "type": "Paper", "year": 2021}
                ],
                "links": [{"source": "p1", "target": "Gene_SIRT1", "type": "MENTIONS"}]
            }"#,
        )
        .unwrap();

        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.edges.len(), 1);
        assert_eq!(document.nodes[0].canonical_name.as_deref(), Some("SIRT1"));
        assert_eq!(document.nodes[0].entity_type.as_deref(), Some("Gene"));
        assert_eq!(document.nodes[1].year_text().as_deref(), Some("2021"));
        assert_eq!(document.edges[0].kind.as_deref(), Some("MENTIONS"));
    }

    #[test]
    fn year_may_be_a_string() {
        let document = GraphDocument::from_json(
            r#"{"nodes": [{"id": "p1", "paperId": "p1", "year": " 2019 "}]}"#,
        )
        .unwrap();

        assert_eq!(document.nodes[0].year_text().as_deref(), Some("2019"));
        assert_eq!(document.nodes[0].paper_id.as_deref(), Some("p1"));
        assert!(document.edges.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(GraphDocument::from_json("{\"nodes\": [").is_err());
    }
}
