
use super::testutil::*;
use super::HgBleuScorer;
use crate::graph::{Graph, Slot, VertexId};
use crate::vocab::{Vocab, WordId};

/// Finalize every vertex the way the search does when each vertex's last
/// incoming edge wins.
fn finalize_last_edges(scorer: &mut HgBleuScorer<'_>, graph: &Graph) {
    for (id, vertex) in graph.vertices() {
        match vertex.incoming().last() {
            None => scorer.finalize_leaf(id).unwrap(),
            Some(&edge_id) => {
                let edge = graph.edge(edge_id).unwrap();
                let (_, stats) = scorer.score(edge, vertex).unwrap();
                scorer.update_state(id, edge, stats).unwrap();
            }
        }
    }
}

/// Full text of `vertex` when every vertex uses its last incoming edge.
fn last_edge_text(graph: &Graph, vertex: VertexId) -> Vec<WordId> {
    let mut text = Vec::new();
    let Some(&edge_id) = graph.vertex(vertex).unwrap().incoming().last() else {
        return text;
    };
    let edge = graph.edge(edge_id).unwrap();
    for slot in edge.slots() {
        match *slot {
            Slot::Literal(w) => text.push(w),
            Slot::Gap(i) => text.extend(last_edge_text(graph, edge.children()[i])),
        }
    }
    text
}

/// `<s> {the house | a home} </s>` where the model slightly prefers "a home".
fn house_graph(vocab: &mut Vocab) -> Graph {
    build_graph(
        vocab,
        vec![
            vec![edge(vec![T::W("<s>")], vec![])],
            vec![
                edge(vec![T::G(0), T::W("the"), T::W("house")], vec![("lm", -1.0)]),
                edge(vec![T::G(0), T::W("a"), T::W("home")], vec![("lm", -0.9)]),
            ],
            vec![edge(vec![T::G(1), T::W("</s>")], vec![])],
        ],
        &[],
    )
}
