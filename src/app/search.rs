use std::collections::BTreeSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::knowledge::{KnowledgeGraph, NodeKind};

pub(in crate::app) const RESULT_LIST_LIMIT: usize = 50;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Query plus kind toggles over a loaded graph, with the filtered node list
/// kept up to date on every change.
///
/// Membership is the conjunction of the kind filter and a lower-cased
/// substring test over every descriptive field. Fuzzy scores only order the
/// rows shown in the result list.
pub(in crate::app) struct SearchFilterIndex {
    haystacks: Vec<String>,
    labels: Vec<String>,
    kinds: Vec<NodeKind>,
    available_kinds: Vec<(NodeKind, usize)>,
    query: String,
    active_kinds: BTreeSet<NodeKind>,
    filtered: Vec<usize>,
    matches: Vec<bool>,
    ranked: Vec<usize>,
    matcher: SkimMatcherV2,
    panel_open: bool,
}

impl SearchFilterIndex {
    pub(in crate::app) fn new(graph: &KnowledgeGraph) -> Self {
        let mut index = Self {
            haystacks: graph.nodes().iter().map(|node| node.search_text()).collect(),
            labels: graph.nodes().iter().map(|node| node.label().to_owned()).collect(),
            kinds: graph.nodes().iter().map(|node| node.kind).collect(),
            available_kinds: graph
                .kind_counts()
                .iter()
                .map(|(&kind, &count)| (kind, count))
                .collect(),
            query: String::new(),
            active_kinds: BTreeSet::new(),
            filtered: Vec::new(),
            matches: Vec::new(),
            ranked: Vec::new(),
            matcher: SkimMatcherV2::default(),
            panel_open: false,
        };
        index.recompute();
        index
    }

    pub(in crate::app) fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the query; returns whether the filtered set was recomputed.
    pub(in crate::app) fn set_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_owned();
        self.recompute();
        true
    }

    pub(in crate::app) fn toggle_kind(&mut self, kind: NodeKind) {
        if !self.active_kinds.remove(&kind) {
            self.active_kinds.insert(kind);
        }
        self.recompute();
    }

    pub(in crate::app) fn is_kind_active(&self, kind: NodeKind) -> bool {
        self.active_kinds.contains(&kind)
    }

    pub(in crate::app) fn clear(&mut self) {
        self.query.clear();
        self.active_kinds.clear();
        self.recompute();
    }

    /// Distinct kinds with their full-graph counts; fixed for the lifetime of the index.
    pub(in crate::app) fn available_kinds(&self) -> &[(NodeKind, usize)] {
        &self.available_kinds
    }

    /// Every node passing both filters, in graph order.
    #[cfg(test)]
    pub(in crate::app) fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub(in crate::app) fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub(in crate::app) fn total_count(&self) -> usize {
        self.kinds.len()
    }

    /// Rows for the result list: best matches first, capped at [`RESULT_LIST_LIMIT`].
    pub(in crate::app) fn visible_results(&self) -> &[usize] {
        &self.ranked[..self.ranked.len().min(RESULT_LIST_LIMIT)]
    }

    pub(in crate::app) fn matches(&self, index: usize) -> bool {
        self.matches.get(index).copied().unwrap_or(false)
    }

    pub(in crate::app) fn is_filtering(&self) -> bool {
        !self.query.is_empty() || !self.active_kinds.is_empty()
    }

    pub(in crate::app) fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub(in crate::app) fn open_panel(&mut self) {
        self.panel_open = true;
    }

    pub(in crate::app) fn close_panel(&mut self) {
        self.panel_open = false;
    }

    pub(in crate::app) fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    fn recompute(&mut self) {
        let needle = self.query.to_lowercase();

        self.filtered.clear();
        self.matches.clear();
        self.matches.resize(self.kinds.len(), false);
        for (index, (kind, haystack)) in self.kinds.iter().zip(&self.haystacks).enumerate() {
            let kind_passes = self.active_kinds.is_empty() || self.active_kinds.contains(kind);
            if kind_passes && haystack.contains(&needle) {
                self.filtered.push(index);
                self.matches[index] = true;
            }
        }

        self.ranked.clear();
        self.ranked.extend_from_slice(&self.filtered);
        let pattern = needle.trim();
        if !pattern.is_empty() {
            let scores = self
                .filtered
                .iter()
                .map(|&index| {
                    fuzzy_match_score(&self.matcher, &self.labels[index], pattern)
                        .unwrap_or(i64::MIN)
                })
                .collect::<Vec<_>>();
            let mut order = (0..self.ranked.len()).collect::<Vec<_>>();
            order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));
            self.ranked = order.into_iter().map(|slot| self.filtered[slot]).collect();
        }
    }
}
