use crate::knowledge::{EgoNetwork, KnowledgeGraph};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum SelectionChange {
    /// A different node became selected; derived state was recomputed.
    Replaced,
    /// The node was already selected; only the focus is re-triggered.
    Reselected,
    /// The index does not exist in the loaded graph.
    Ignored,
}

/// Zero-or-one selected node plus the state derived from it.
#[derive(Debug, Default)]
pub(in crate::app) struct SelectionController {
    selected: Option<usize>,
    ego: EgoNetwork,
    show_full_content: bool,
    show_local_graph: bool,
    ego_computations: u64,
}

impl SelectionController {
    pub(in crate::app) fn select(&mut self, graph: &KnowledgeGraph, index: usize) -> SelectionChange {
        if graph.node(index).is_none() {
            return SelectionChange::Ignored;
        }
        if self.selected == Some(index) {
            return SelectionChange::Reselected;
        }

        self.selected = Some(index);
        self.ego = graph.ego_network(index);
        self.ego_computations += 1;
        self.show_full_content = false;
        self.show_local_graph = false;
        tracing::debug!(
            node = %graph.nodes()[index].id,
            incoming = self.ego.incoming.len(),
            outgoing = self.ego.outgoing.len(),
            isolated = self.ego.is_empty(),
            computations = self.ego_computations,
            "selection changed"
        );
        SelectionChange::Replaced
    }

    pub(in crate::app) fn clear(&mut self) {
        self.selected = None;
        self.ego = EgoNetwork::default();
        self.show_full_content = false;
        self.show_local_graph = false;
    }

    pub(in crate::app) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(in crate::app) fn ego_network(&self) -> Option<&EgoNetwork> {
        self.selected.map(|_| &self.ego)
    }

    pub(in crate::app) fn show_full_content(&self) -> bool {
        self.show_full_content
    }

    pub(in crate::app) fn set_show_full_content(&mut self, show: bool) {
        self.show_full_content = show && self.selected.is_some();
    }

    pub(in crate::app) fn show_local_graph(&self) -> bool {
        self.show_local_graph
    }

    pub(in crate::app) fn set_show_local_graph(&mut self, show: bool) {
        self.show_local_graph = show && self.selected.is_some();
    }

    #[cfg(test)]
    pub(in crate::app) fn ego_computations(&self) -> u64 {
        self.ego_computations
    }
}
