//! Root graph: elements as vertices, successor and branch edges to parents.
//!
//! The [`RootGraph`] is the single authoritative store of the simulation. It
//! owns every [`RootElement`], the parent edge of each non-root vertex, and
//! an ordered child list per vertex. Vertices are only added through
//! [`RootGraph::add_root`] and [`RootGraph::add_child`], so following parent
//! edges always reaches the root in at most `len()` steps.
//!
//! Elements are never removed; dead elements stay addressable.

use std::collections::BTreeMap;

use rhizoflux_types::{EdgeType, OrganKind, VertexId};
use tracing::debug;

use crate::element::RootElement;
use crate::error::GraphError;
use crate::fields::{Field, FieldOwner, field_spec};

/// Tree of root elements.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RootGraph {
    /// All elements indexed by vertex.
    elements: BTreeMap<VertexId, RootElement>,
    /// Parent vertex and edge type of every non-root vertex.
    parents: BTreeMap<VertexId, (VertexId, EdgeType)>,
    /// Children of each vertex in insertion order.
    children: BTreeMap<VertexId, Vec<VertexId>>,
    /// The base of the root system.
    root: Option<VertexId>,
    /// Identifier handed to the next inserted element.
    next_id: VertexId,
}

impl RootGraph {
    /// Create an empty graph.
    pub const fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            root: None,
            next_id: VertexId(0),
        }
    }

    fn allocate_id(&mut self) -> Result<VertexId, GraphError> {
        let id = self.next_id;
        self.next_id = id.next().ok_or(GraphError::IdOverflow)?;
        Ok(id)
    }

    // -------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------

    /// Insert the base element of the root system.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::RootAlreadySet`] if the graph already has a root.
    pub fn add_root(&mut self, element: RootElement) -> Result<VertexId, GraphError> {
        if let Some(existing) = self.root {
            return Err(GraphError::RootAlreadySet(existing));
        }
        let id = self.allocate_id()?;
        self.elements.insert(id, element);
        self.children.insert(id, Vec::new());
        self.root = Some(id);
        debug!(vertex = %id, "root element added");
        Ok(id)
    }

    /// Attach a new element to `parent` through an edge of type `edge`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexNotFound`] if the parent is unknown, or
    /// [`GraphError::DuplicateSuccessor`] if a second successor edge would
    /// leave the parent.
    pub fn add_child(
        &mut self,
        parent: VertexId,
        edge: EdgeType,
        element: RootElement,
    ) -> Result<VertexId, GraphError> {
        if !self.elements.contains_key(&parent) {
            return Err(GraphError::VertexNotFound(parent));
        }
        if edge == EdgeType::Successor
            && let Some(existing) = self.successor(parent)
        {
            return Err(GraphError::DuplicateSuccessor { parent, existing });
        }
        let id = self.allocate_id()?;
        self.elements.insert(id, element);
        self.children.insert(id, Vec::new());
        self.parents.insert(id, (parent, edge));
        self.children.entry(parent).or_default().push(id);
        debug!(vertex = %id, parent = %parent, edge = %edge.symbol(), "element added");
        Ok(id)
    }

    // -------------------------------------------------------------------
    // Element access
    // -------------------------------------------------------------------

    /// Get an immutable reference to an element.
    pub fn get(&self, id: VertexId) -> Option<&RootElement> {
        self.elements.get(&id)
    }

    /// Get a mutable reference to an element.
    pub fn get_mut(&mut self, id: VertexId) -> Option<&mut RootElement> {
        self.elements.get_mut(&id)
    }

    /// Get an element or fail with [`GraphError::VertexNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexNotFound`] if the vertex is unknown.
    pub fn element(&self, id: VertexId) -> Result<&RootElement, GraphError> {
        self.elements.get(&id).ok_or(GraphError::VertexNotFound(id))
    }

    /// Mutable variant of [`RootGraph::element`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexNotFound`] if the vertex is unknown.
    pub fn element_mut(&mut self, id: VertexId) -> Result<&mut RootElement, GraphError> {
        self.elements
            .get_mut(&id)
            .ok_or(GraphError::VertexNotFound(id))
    }

    /// Whether the vertex exists.
    pub fn contains(&self, id: VertexId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the graph has no element.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The base vertex, if any.
    pub const fn root(&self) -> Option<VertexId> {
        self.root
    }

    /// All vertex identifiers in ascending order.
    pub fn vertices(&self) -> Vec<VertexId> {
        self.elements.keys().copied().collect()
    }

    /// Iterate over all elements immutably.
    pub fn elements(&self) -> impl Iterator<Item = (&VertexId, &RootElement)> {
        self.elements.iter()
    }

    /// Iterate over all elements mutably.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = (&VertexId, &mut RootElement)> {
        self.elements.iter_mut()
    }

    // -------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------

    /// Parent and edge type of a vertex; `None` for the root.
    pub fn parent_edge(&self, id: VertexId) -> Option<(VertexId, EdgeType)> {
        self.parents.get(&id).copied()
    }

    /// Parent of `id` if it is attached through an edge of type `edge`.
    pub fn parent(&self, id: VertexId, edge: EdgeType) -> Option<VertexId> {
        self.parents
            .get(&id)
            .and_then(|&(parent, kind)| (kind == edge).then_some(parent))
    }

    /// Children of a vertex in insertion order.
    pub fn children(&self, id: VertexId) -> Vec<VertexId> {
        self.children.get(&id).cloned().unwrap_or_default()
    }

    /// Children attached to `id` through an edge of type `edge`.
    pub fn children_by_edge(&self, id: VertexId, edge: EdgeType) -> Vec<VertexId> {
        self.children
            .get(&id)
            .map(|kids| {
                kids.iter()
                    .copied()
                    .filter(|kid| self.parent(*kid, edge).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Same-axis continuation of a vertex.
    pub fn successor(&self, id: VertexId) -> Option<VertexId> {
        self.children.get(&id).and_then(|kids| {
            kids.iter()
                .copied()
                .find(|kid| self.parent(*kid, EdgeType::Successor).is_some())
        })
    }

    /// Whether the vertex is the growing tip of its axis.
    ///
    /// Nodules carry no axis and are never apices.
    pub fn is_apex(&self, id: VertexId) -> bool {
        self.elements
            .get(&id)
            .is_some_and(|e| e.kind == OrganKind::Segment && self.successor(id).is_none())
    }

    /// Most distal vertex of the axis `id` belongs to.
    pub fn axis_apex(&self, id: VertexId) -> VertexId {
        let mut current = id;
        while let Some(next) = self.successor(current) {
            current = next;
        }
        current
    }

    /// Post-order traversal of the whole tree from the base: every vertex
    /// appears after all of its descendants.
    pub fn post_order(&self) -> Vec<VertexId> {
        self.root
            .map(|root| self.post_order_from(root))
            .unwrap_or_default()
    }

    /// Post-order traversal of the subtree rooted at `start`.
    pub fn post_order_from(&self, start: VertexId) -> Vec<VertexId> {
        let mut order = Vec::with_capacity(self.elements.len());
        if !self.elements.contains_key(&start) {
            return order;
        }
        let mut stack = vec![(start, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().rev().map(|kid| (*kid, false)));
            }
        }
        order
    }

    // -------------------------------------------------------------------
    // Named fields
    // -------------------------------------------------------------------

    /// Whether a field of this name is readable.
    pub fn has_field(&self, name: &str) -> bool {
        field_spec(name).is_some() || self.elements.values().any(|e| e.extra.contains_key(name))
    }

    /// Snapshot of a named field over every vertex carrying it.
    ///
    /// Typed fields cover every vertex; extra fields only the vertices that
    /// were given a value.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownField`] if no vertex carries the name.
    pub fn field(&self, name: &str) -> Result<Field, GraphError> {
        if let Some(spec) = field_spec(name) {
            return Ok(self
                .elements
                .iter()
                .map(|(id, e)| (*id, (spec.get)(e)))
                .collect());
        }
        let values: Field = self
            .elements
            .iter()
            .filter_map(|(id, e)| e.extra.get(name).map(|v| (*id, *v)))
            .collect();
        if values.is_empty() {
            return Err(GraphError::UnknownField(name.to_owned()));
        }
        Ok(values)
    }

    /// Write one value of a named field on behalf of `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexNotFound`] for an unknown vertex and
    /// [`GraphError::NotOwner`] if `writer` does not own the field.
    pub fn set_field(
        &mut self,
        name: &str,
        id: VertexId,
        value: f64,
        writer: FieldOwner,
    ) -> Result<(), GraphError> {
        self.element_mut(id)?.set_field_value(name, value, writer)
    }

    /// Write a whole field mapping on behalf of `writer`.
    ///
    /// # Errors
    ///
    /// Fails on the first vertex [`RootGraph::set_field`] rejects.
    pub fn set_field_values(
        &mut self,
        name: &str,
        values: &Field,
        writer: FieldOwner,
    ) -> Result<(), GraphError> {
        for (id, value) in values {
            self.set_field(name, *id, *value, writer)?;
        }
        Ok(())
    }
}

impl Default for RootGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rhizoflux_types::SegmentType;

    use super::*;

    fn segment(length: f64) -> RootElement {
        RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 1e-4, length, 1e5)
    }

    fn nodule() -> RootElement {
        RootElement::new(OrganKind::Nodule, SegmentType::AfterEmergence, 2e-4, 0.0, 1e5)
    }

    /// base -< a -< b, a -+ l, b -+ n (nodule).
    fn make_branched_graph() -> (RootGraph, [VertexId; 5]) {
        let mut graph = RootGraph::new();
        let base = graph.add_root(segment(0.0)).unwrap();
        let a = graph.add_child(base, EdgeType::Successor, segment(0.01)).unwrap();
        let b = graph.add_child(a, EdgeType::Successor, segment(0.01)).unwrap();
        let l = graph.add_child(a, EdgeType::Branch, segment(0.005)).unwrap();
        let n = graph.add_child(b, EdgeType::Branch, nodule()).unwrap();
        (graph, [base, a, b, l, n])
    }

    #[test]
    fn add_root_and_children() {
        let (graph, [base, a, _, l, _]) = make_branched_graph();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.root(), Some(base));
        assert_eq!(graph.parent(a, EdgeType::Successor), Some(base));
        assert_eq!(graph.parent(l, EdgeType::Branch), Some(a));
        assert_eq!(graph.parent(l, EdgeType::Successor), None);
        assert_eq!(graph.parent(base, EdgeType::Successor), None);
    }

    #[test]
    fn second_root_rejected() {
        let mut graph = RootGraph::new();
        assert!(graph.add_root(segment(0.0)).is_ok());
        assert!(matches!(graph.add_root(segment(0.0)), Err(GraphError::RootAlreadySet(_))));
    }

    #[test]
    fn unknown_parent_rejected() {
        let mut graph = RootGraph::new();
        let result = graph.add_child(VertexId(7), EdgeType::Branch, segment(0.01));
        assert!(matches!(result, Err(GraphError::VertexNotFound(VertexId(7)))));
        assert!(graph.is_empty());
    }

    #[test]
    fn second_successor_rejected() {
        let (mut graph, [base, a, ..]) = make_branched_graph();
        let result = graph.add_child(base, EdgeType::Successor, segment(0.01));
        assert!(matches!(
            result,
            Err(GraphError::DuplicateSuccessor { parent, existing }) if parent == base && existing == a
        ));
        // Branches are unlimited.
        assert!(graph.add_child(base, EdgeType::Branch, segment(0.01)).is_ok());
    }

    #[test]
    fn apices_and_axes() {
        let (graph, [base, a, b, l, n]) = make_branched_graph();
        assert!(graph.is_apex(b));
        assert!(graph.is_apex(l));
        assert!(!graph.is_apex(a));
        assert!(!graph.is_apex(n));
        assert_eq!(graph.axis_apex(base), b);
        assert_eq!(graph.axis_apex(l), l);
        assert_eq!(graph.successor(a), Some(b));
        assert_eq!(graph.children_by_edge(a, EdgeType::Branch), vec![l]);
    }

    #[test]
    fn post_order_visits_descendants_first() {
        let (graph, [base, a, b, l, n]) = make_branched_graph();
        let order = graph.post_order();
        assert_eq!(order, vec![n, b, l, a, base]);

        let position = |v: VertexId| order.iter().position(|x| *x == v);
        for v in graph.vertices() {
            if let Some((parent, _)) = graph.parent_edge(v) {
                assert!(position(v) < position(parent));
            }
        }
    }

    #[test]
    fn typed_field_covers_every_vertex() {
        let (graph, [_, a, ..]) = make_branched_graph();
        let lengths = graph.field("length").unwrap();
        assert_eq!(lengths.len(), 5);
        assert_eq!(lengths.get(&a).map(|v| v.to_bits()), Some(0.01_f64.to_bits()));
    }

    #[test]
    fn extra_field_is_partial() {
        let (mut graph, [base, a, ..]) = make_branched_graph();
        assert!(matches!(graph.field("pool_A"), Err(GraphError::UnknownField(_))));
        assert!(!graph.has_field("pool_A"));

        assert!(graph.set_field("pool_A", a, 3.0, FieldOwner::External).is_ok());
        let pool = graph.field("pool_A").unwrap();
        assert_eq!(pool.len(), 1);
        assert!(!pool.contains_key(&base));
    }

    #[test]
    fn set_field_checks_owner() {
        let (mut graph, [_, a, ..]) = make_branched_graph();
        assert!(graph.set_field("radius", a, 2e-4, FieldOwner::PoolBalance).is_err());
        assert!(graph.set_field("radius", a, 2e-4, FieldOwner::Allocator).is_ok());
        assert!(graph.set_field("radius", VertexId(99), 2e-4, FieldOwner::Allocator).is_err());
    }

    #[test]
    fn serde_roundtrip_preserves_topology() {
        let (graph, [_, a, b, ..]) = make_branched_graph();
        let json = serde_json::to_string(&graph).unwrap();
        let back: Option<RootGraph> = serde_json::from_str(&json).ok();
        assert!(back.is_some_and(|g| g.successor(a) == Some(b) && g.len() == 5));
    }
}
