use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::error::{GraphError, Result};
use crate::label::Label;

/// Anything that can identify a node: hashable, ordered, printable.
pub trait NodeKey: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display {}

impl<T: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display> NodeKey for T {}

/// Node storage slot. `uid` is the slot position, assigned once at
/// insertion and never reused (the store has no deletion).
#[derive(Debug, Clone)]
pub(crate) struct NodeSlot<N> {
    pub(crate) id: N,
    pub(crate) label: Label,
}

/// Edge storage slot. Endpoints are slot positions into `Graph::nodes`.
#[derive(Debug, Clone)]
pub(crate) struct EdgeSlot {
    pub(crate) src: usize,
    pub(crate) dst: usize,
    pub(crate) label: Label,
}

/// Read-only view of a node handed to emitters, predicates and maps.
#[derive(Debug)]
pub struct NodeView<'a, N> {
    pub id: &'a N,
    pub uid: u64,
    pub label: &'a Label,
}

/// Mutable view of a node handed to collectors and `update_nodes`.
#[derive(Debug)]
pub struct NodeMut<'a, N> {
    pub id: &'a N,
    pub uid: u64,
    pub label: &'a mut Label,
}

/// Read-only view of an edge triple.
#[derive(Debug)]
pub struct EdgeView<'a, N> {
    pub src: &'a N,
    pub dst: &'a N,
    pub label: &'a Label,
}

// Manual impls: views hold references only, so they are Copy for any `N`.
impl<N> Clone for NodeView<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for NodeView<'_, N> {}

impl<N> Clone for EdgeView<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for EdgeView<'_, N> {}

/// In-memory directed multigraph: a node set plus an edge list.
///
/// Every node and edge owns a [`Label`]. Parallel edges are kept; adding an
/// edge adds its endpoints. There is no deletion: filtering and relabeling
/// produce new graphs via [`Graph::new_subgraph`] and [`Graph::new_projection`].
#[derive(Debug, Clone)]
pub struct Graph<N> {
    pub(crate) nodes: Vec<NodeSlot<N>>,
    pub(crate) index: HashMap<N, usize>,
    pub(crate) edges: Vec<EdgeSlot>,
}

impl<N: NodeKey> Graph<N> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(node_count),
            index: HashMap::with_capacity(node_count),
            edges: Vec::with_capacity(edge_count),
        }
    }

    /// Build from an edge collection plus extra (possibly isolated) nodes.
    pub fn from_parts<E, I>(edges: E, nodes: I) -> Self
    where
        E: IntoIterator<Item = (N, N, Label)>,
        I: IntoIterator<Item = N>,
    {
        let mut graph = Self::new();
        graph.add_edges(edges);
        graph.add_nodes(nodes);
        graph
    }

    /// Slot position for `id`, inserting a fresh node if needed.
    fn intern(&mut self, id: N, label: impl FnOnce(&N) -> Label) -> usize {
        if let Some(&slot) = self.index.get(&id) {
            return slot;
        }
        let slot = self.nodes.len();
        let label = label(&id);
        self.index.insert(id.clone(), slot);
        self.nodes.push(NodeSlot { id, label });
        slot
    }

    /// Union `ids` into the node set. Existing nodes are left untouched.
    /// New nodes get a label named after their `Display` rendering.
    pub fn add_nodes<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = N>,
    {
        for id in ids {
            self.intern(id, |id| Label::new(id.to_string()));
        }
    }

    /// Add a node with a specific label. If the node exists its current
    /// label is kept.
    pub fn add_node_with_label(&mut self, id: N, label: Label) {
        self.intern(id, move |_| label);
    }

    /// Append edges. Endpoints join the node set; nothing is deduplicated.
    pub fn add_edges<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = (N, N, Label)>,
    {
        for (src, dst, label) in edges {
            let src = self.intern(src, |id| Label::new(id.to_string()));
            let dst = self.intern(dst, |id| Label::new(id.to_string()));
            self.edges.push(EdgeSlot { src, dst, label });
        }
    }

    /// Independent copy of the node set.
    pub fn nodes(&self) -> HashSet<N> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = NodeView<'_, N>> {
        self.nodes.iter().enumerate().map(|(slot, n)| NodeView {
            id: &n.id,
            uid: slot as u64,
            label: &n.label,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_, N>> {
        self.edges.iter().map(move |e| self.edge_view(e))
    }

    pub(crate) fn edge_view<'a>(&'a self, e: &'a EdgeSlot) -> EdgeView<'a, N> {
        EdgeView {
            src: &self.nodes[e.src].id,
            dst: &self.nodes[e.dst].id,
            label: &e.label,
        }
    }

    pub(crate) fn view(&self, slot: usize) -> NodeView<'_, N> {
        let n = &self.nodes[slot];
        NodeView {
            id: &n.id,
            uid: slot as u64,
            label: &n.label,
        }
    }

    pub(crate) fn slot(&self, id: &N) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// View of a node that must exist.
    pub fn node(&self, id: &N) -> Result<NodeView<'_, N>> {
        match self.slot(id) {
            Some(slot) => Ok(self.view(slot)),
            None => Err(GraphError::UnknownNode(id.to_string())),
        }
    }

    pub fn contains_node(&self, id: &N) -> bool {
        self.index.contains_key(id)
    }

    pub fn label(&self, id: &N) -> Option<&Label> {
        self.slot(id).map(|s| &self.nodes[s].label)
    }

    pub fn label_mut(&mut self, id: &N) -> Option<&mut Label> {
        match self.slot(id) {
            Some(s) => Some(&mut self.nodes[s].label),
            None => None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Run `f` on every node label in place. For attribute mutation only;
    /// topology cannot change through this.
    pub fn update_nodes<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(NodeMut<'_, N>) -> Result<()>,
    {
        for (slot, n) in self.nodes.iter_mut().enumerate() {
            f(NodeMut {
                id: &n.id,
                uid: slot as u64,
                label: &mut n.label,
            })?;
        }
        Ok(())
    }

    /// Run `f` on every edge triple; endpoints are read-only, the edge
    /// label is mutable.
    pub fn update_edges<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(NodeView<'_, N>, NodeView<'_, N>, &mut Label) -> Result<()>,
    {
        let nodes = &self.nodes;
        let view = |slot: usize| NodeView {
            id: &nodes[slot].id,
            uid: slot as u64,
            label: &nodes[slot].label,
        };
        for e in self.edges.iter_mut() {
            f(view(e.src), view(e.dst), &mut e.label)?;
        }
        Ok(())
    }

    /// Maximal subgraph whose nodes satisfy `node_pred` and whose edges
    /// satisfy `edge_pred` with both endpoints satisfying `node_pred`.
    ///
    /// Pure filter: labels are cloned into the new graph, the source is not
    /// touched. Isolated nodes passing `node_pred` are kept.
    pub fn new_subgraph<NP, EP>(&self, mut node_pred: NP, mut edge_pred: EP) -> Result<Graph<N>>
    where
        NP: FnMut(NodeView<'_, N>) -> Result<bool>,
        EP: FnMut(NodeView<'_, N>, NodeView<'_, N>, &Label) -> Result<bool>,
    {
        let mut keep = Vec::with_capacity(self.nodes.len());
        for slot in 0..self.nodes.len() {
            keep.push(node_pred(self.view(slot))?);
        }

        let mut graph = Graph::new();
        for (slot, n) in self.nodes.iter().enumerate() {
            if keep[slot] {
                graph.add_node_with_label(n.id.clone(), n.label.clone());
            }
        }

        for e in &self.edges {
            if !(keep[e.src] && keep[e.dst]) {
                continue;
            }
            if edge_pred(self.view(e.src), self.view(e.dst), &e.label)? {
                let src = self.nodes[e.src].id.clone();
                let dst = self.nodes[e.dst].id.clone();
                graph.add_edges(std::iter::once((src, dst, e.label.clone())));
            }
        }

        Ok(graph)
    }

    /// [`Graph::new_subgraph`] with every edge accepted.
    pub fn filter_nodes<NP>(&self, node_pred: NP) -> Result<Graph<N>>
    where
        NP: FnMut(NodeView<'_, N>) -> Result<bool>,
    {
        self.new_subgraph(node_pred, |_, _, _| Ok(true))
    }

    /// Relabeled copy: every node is re-identified through `node_map` and
    /// every edge label through `edge_map`.
    ///
    /// `node_map` must be a function of the node alone. If it sends two
    /// nodes to the same identity they merge: the first node's label is
    /// kept and all their edges point at the merged node. This is not
    /// rejected; the caller owns that outcome. The first error from either
    /// map aborts the projection.
    pub fn new_projection<M, NM, EM>(
        &self,
        mut node_map: NM,
        mut edge_map: EM,
    ) -> Result<Graph<M>>
    where
        M: NodeKey,
        NM: FnMut(NodeView<'_, N>) -> Result<(M, Label)>,
        EM: FnMut(NodeView<'_, N>, NodeView<'_, N>, &Label) -> Result<Label>,
    {
        let mut graph = Graph::with_capacity(self.nodes.len(), self.edges.len());
        let mut mapped: Vec<M> = Vec::with_capacity(self.nodes.len());

        for slot in 0..self.nodes.len() {
            let (id, label) = node_map(self.view(slot))?;
            graph.add_node_with_label(id.clone(), label);
            mapped.push(id);
        }

        for e in &self.edges {
            let label = edge_map(self.view(e.src), self.view(e.dst), &e.label)?;
            graph.add_edges(std::iter::once((
                mapped[e.src].clone(),
                mapped[e.dst].clone(),
                label,
            )));
        }

        Ok(graph)
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let label_mem = |l: &Label| l.name().len() + l.attrs().count() * 48;
        let nodes_mem: usize = self
            .nodes
            .iter()
            .map(|n| size_of::<NodeSlot<N>>() + size_of::<N>() + 16 + label_mem(&n.label))
            .sum();
        let edges_mem: usize = self
            .edges
            .iter()
            .map(|e| size_of::<EdgeSlot>() + label_mem(&e.label))
            .sum();

        nodes_mem + edges_mem
    }
}

impl<N: NodeKey> Default for Graph<N> {
    fn default() -> Self {
        Self::new()
    }
}
