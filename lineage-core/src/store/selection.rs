use indexmap::IndexSet;

/// What the user currently has selected. Process-local; never persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    nodes: IndexSet<String>,
    edges: IndexSet<String>,
    focused: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both sets. Focus is left alone: it follows clicks, not box selection.
    pub fn set<N, E>(&mut self, node_ids: N, edge_ids: E)
    where
        N: IntoIterator,
        N::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        self.nodes = node_ids.into_iter().map(Into::into).collect();
        self.edges = edge_ids.into_iter().map(Into::into).collect();
    }

    pub fn node_ids(&self) -> &IndexSet<String> {
        &self.nodes
    }

    pub fn edge_ids(&self) -> &IndexSet<String> {
        &self.edges
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_node_selected(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn is_edge_selected(&self, id: &str) -> bool {
        self.edges.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub(crate) fn focus(&mut self, id: impl Into<String>) {
        self.focused = Some(id.into());
    }

    pub(crate) fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Drop selection and focus.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.focused = None;
    }
}
