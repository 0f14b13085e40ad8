//! Arena-allocated hypergraph.
//!
//! A `Graph` owns fixed-capacity pools of `Vertex` and `Edge` records that are
//! addressed by dense integer handles. Capacities are declared once, then the
//! pools are filled append-only; nothing is ever removed.
//!
//! Vertices are expected in bottom-up topological order: every child of an
//! edge has a smaller index than the edge's head. `read_graph` rejects input
//! that breaks this, and the Viterbi search re-checks it.

mod reader;

pub use reader::read_graph;

use std::io;

use crate::features::SparseVector;
use crate::vocab::WordId;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("{kind} pool exhausted (capacity {capacity})")]
    Capacity { kind: &'static str, capacity: usize },
}

/// Handle of a vertex within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Handle of an edge within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One position of an edge's target side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Literal(WordId),
    /// Placeholder for the derivation of `edge.children()[ordinal]`.
    Gap(usize),
}

/// A production: target-side slots, child vertices, and features.
#[derive(Debug, Clone, Default)]
pub struct Edge {
    slots: Vec<Slot>,
    children: Vec<VertexId>,
    features: SparseVector,
}

impl Edge {
    pub fn push_word(&mut self, word: WordId) {
        self.slots.push(Slot::Literal(word));
    }

    /// Append a gap bound to `child`; gaps and children stay aligned in order.
    pub fn push_gap(&mut self, child: VertexId) {
        self.slots.push(Slot::Gap(self.children.len()));
        self.children.push(child);
    }

    pub fn set_feature(&mut self, name: &str, value: f64) {
        self.features.set(name, value);
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn children(&self) -> &[VertexId] {
        &self.children
    }

    pub fn features(&self) -> &SparseVector {
        &self.features
    }

    /// Number of literal words on this edge (children excluded).
    pub fn literal_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Literal(_)))
            .count()
    }

    /// Linear model score of this edge alone.
    pub fn score(&self, weights: &SparseVector) -> f64 {
        self.features.dot(weights)
    }
}

/// An OR-node: alternative incoming productions.
#[derive(Debug, Clone, Default)]
pub struct Vertex {
    incoming: Vec<EdgeId>,
    source_covered: usize,
}

impl Vertex {
    pub fn add_edge(&mut self, edge: EdgeId) {
        self.incoming.push(edge);
    }

    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    /// A vertex without incoming edges is a leaf with implicit zero score.
    pub fn is_leaf(&self) -> bool {
        self.incoming.is_empty()
    }

    /// Number of source words covered by this vertex's derivations.
    pub fn source_covered(&self) -> usize {
        self.source_covered
    }

    pub fn set_source_covered(&mut self, words: usize) {
        self.source_covered = words;
    }
}

/// Fixed-capacity append-only pool. `capacity` is a limit only; storage
/// grows as records are allocated.
#[derive(Debug, Clone)]
struct FixedArena<T> {
    items: Vec<T>,
    capacity: usize,
    kind: &'static str,
}

impl<T: Default> FixedArena<T> {
    fn new(kind: &'static str, capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            kind,
        }
    }

    fn alloc(&mut self) -> Result<usize, GraphError> {
        if self.items.len() >= self.capacity {
            return Err(GraphError::Capacity {
                kind: self.kind,
                capacity: self.capacity,
            });
        }
        self.items.push(T::default());
        Ok(self.items.len() - 1)
    }
}

/// The hypergraph arena.
#[derive(Debug, Clone)]
pub struct Graph {
    vertices: FixedArena<Vertex>,
    edges: FixedArena<Edge>,
}

impl Graph {
    /// Create an empty graph able to hold exactly `vertices` and `edges` records.
    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            vertices: FixedArena::new("vertex", vertices),
            edges: FixedArena::new("edge", edges),
        }
    }

    pub fn new_edge(&mut self) -> Result<EdgeId, GraphError> {
        self.edges.alloc().map(|i| EdgeId(i as u32))
    }

    pub fn new_vertex(&mut self) -> Result<VertexId, GraphError> {
        self.vertices.alloc().map(|i| VertexId(i as u32))
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.items.get(id.index())
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.items.get_mut(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.items.get(id.index())
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.items.get_mut(id.index())
    }

    /// Number of allocated vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.items.len()
    }

    /// Number of allocated edges.
    pub fn edge_count(&self) -> usize {
        self.edges.items.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .items
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId(i as u32), v))
    }

    /// The goal vertex: the highest-indexed one.
    pub fn root(&self) -> Option<VertexId> {
        self.vertex_count()
            .checked_sub(1)
            .map(|i| VertexId(i as u32))
    }

    /// Source length of the whole sentence, as covered by the root.
    pub fn total_source_covered(&self) -> usize {
        self.root()
            .and_then(|r| self.vertex(r))
            .map_or(0, Vertex::source_covered)
    }
}
