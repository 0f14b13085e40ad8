//! Graph builders shared by the rescoring tests.

use crate::features::SparseVector;
use crate::graph::{Graph, VertexId};
use crate::vocab::{Vocab, WordId};

/// One slot of a test edge: a literal token or a gap to a vertex.
pub enum T<'a> {
    W(&'a str),
    G(u32),
}

/// Test edge: slots plus `(name, value)` features.
pub struct TestEdge<'a> {
    pub slots: Vec<T<'a>>,
    pub features: Vec<(&'a str, f64)>,
}

pub fn edge<'a>(slots: Vec<T<'a>>, features: Vec<(&'a str, f64)>) -> TestEdge<'a> {
    TestEdge { slots, features }
}

pub fn test_vocab() -> Vocab {
    Vocab::with_sentinels("<s>", "</s>")
}

/// Build a graph from per-vertex edge lists, in the given (bottom-up) order.
/// `coverage[i]`, when given, is the source coverage of vertex `i`.
pub fn build_graph(vocab: &mut Vocab, vertices: Vec<Vec<TestEdge>>, coverage: &[usize]) -> Graph {
    let edge_total = vertices.iter().map(Vec::len).sum();
    let mut graph = Graph::with_capacity(vertices.len(), edge_total);
    for (i, edges) in vertices.into_iter().enumerate() {
        let mut ids = Vec::new();
        for e in edges {
            let id = graph.new_edge().unwrap();
            let target = graph.edge_mut(id).unwrap();
            for slot in e.slots {
                match slot {
                    T::W(w) => target.push_word(vocab.find_or_add(w)),
                    T::G(v) => target.push_gap(VertexId(v)),
                }
            }
            for (name, value) in e.features {
                target.set_feature(name, value);
            }
            ids.push(id);
        }
        let v = graph.new_vertex().unwrap();
        let vertex = graph.vertex_mut(v).unwrap();
        for id in ids {
            vertex.add_edge(id);
        }
        if let Some(&c) = coverage.get(i) {
            vertex.set_source_covered(c);
        }
    }
    graph
}

/// The five-vertex chain `<s> a b c d e f g </s>`.
pub fn chain_graph(vocab: &mut Vocab) -> Graph {
    use T::*;
    build_graph(
        vocab,
        vec![
            vec![edge(vec![W("<s>")], vec![])],
            vec![edge(vec![G(0), W("a"), W("b")], vec![])],
            vec![edge(vec![G(1), W("c"), W("d")], vec![])],
            vec![edge(vec![G(2), W("e"), W("f"), W("g")], vec![])],
            vec![edge(vec![G(3), W("</s>")], vec![])],
        ],
        &[],
    )
}

pub fn words(vocab: &Vocab, text: &[WordId]) -> String {
    vocab.render(text)
}

pub fn weights(pairs: &[(&str, f64)]) -> SparseVector {
    pairs.iter().copied().collect()
}
