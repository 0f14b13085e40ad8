use tracing::{debug, debug_span};

use super::bleu::HgBleuScorer;
use super::{Hypothesis, RescoreError};
use crate::features::SparseVector;
use crate::graph::{EdgeId, Graph, Slot, VertexId};
use crate::ngram::BleuStats;
use crate::reference::ReferenceSet;
use crate::vocab::WordId;

/// Best incoming edge of a vertex and the score of the derivation it roots.
/// Leaves have no edge and score 0.
#[derive(Debug, Clone, Copy)]
struct BackPointer {
    edge: Option<EdgeId>,
    score: f64,
}

/// Find the derivation maximizing `model score + bleu_weight * BLEU`.
///
/// Vertices must be in bottom-up order; a child that has not been visited
/// when its parent is scored is reported as `NotTopological`. Among equally
/// scored edges the later one wins. With `bleu_weight == 0` the references
/// are not consulted during the search.
pub fn viterbi(
    graph: &Graph,
    weights: &SparseVector,
    bleu_weight: f64,
    references: &ReferenceSet,
    sentence_id: usize,
) -> Result<Hypothesis, RescoreError> {
    let _span = debug_span!(
        "viterbi",
        sentence_id,
        bleu_weight,
        vertices = graph.vertex_count()
    )
    .entered();
    let root = graph.root().ok_or(RescoreError::EmptyGraph)?;

    let mut back_pointers: Vec<Option<BackPointer>> = vec![None; graph.vertex_count()];
    let mut scorer =
        (bleu_weight != 0.0).then(|| HgBleuScorer::new(references, graph, sentence_id));

    for (vertex_id, vertex) in graph.vertices() {
        if vertex.is_leaf() {
            back_pointers[vertex_id.index()] = Some(BackPointer {
                edge: None,
                score: 0.0,
            });
            if let Some(scorer) = scorer.as_mut() {
                scorer.finalize_leaf(vertex_id)?;
            }
            continue;
        }

        let mut winner: Option<(EdgeId, f64, BleuStats)> = None;
        for &edge_id in vertex.incoming() {
            let edge = graph
                .edge(edge_id)
                .ok_or(RescoreError::UnknownEdge { edge: edge_id.0 })?;
            let mut score = edge.score(weights);
            for &child in edge.children() {
                let child_best = back_pointers
                    .get(child.index())
                    .copied()
                    .flatten()
                    .ok_or(RescoreError::NotTopological {
                        vertex: vertex_id.0,
                        child: child.0,
                    })?;
                score += child_best.score;
            }
            let mut stats = BleuStats::new();
            if let Some(scorer) = scorer.as_ref() {
                let (bleu, edge_stats) = scorer.score(edge, vertex)?;
                score += bleu_weight * bleu;
                stats = edge_stats;
            }
            if winner.map_or(true, |(_, best, _)| score >= best) {
                winner = Some((edge_id, score, stats));
            }
        }

        if let Some((edge_id, score, stats)) = winner {
            if let Some(scorer) = scorer.as_mut() {
                let edge = graph
                    .edge(edge_id)
                    .ok_or(RescoreError::UnknownEdge { edge: edge_id.0 })?;
                scorer.update_state(vertex_id, edge, stats)?;
            }
            back_pointers[vertex_id.index()] = Some(BackPointer {
                edge: Some(edge_id),
                score,
            });
        }
    }

    let score = back_pointers[root.index()].map_or(0.0, |bp| bp.score);
    let (text, features) = expand(graph, &back_pointers, root)?;
    let bleu_stats = references.sentence_stats(sentence_id, &text);
    debug!(score, words = text.len());
    Ok(Hypothesis {
        text,
        score,
        features,
        bleu_stats,
    })
}

enum Expansion {
    Word(WordId),
    Vertex(VertexId),
}

/// Follow back-pointers from `root`, emitting words left to right and summing
/// the features of every edge on the way.
fn expand(
    graph: &Graph,
    back_pointers: &[Option<BackPointer>],
    root: VertexId,
) -> Result<(Vec<WordId>, SparseVector), RescoreError> {
    let mut text = Vec::new();
    let mut features = SparseVector::new();
    let mut stack = vec![Expansion::Vertex(root)];
    while let Some(item) = stack.pop() {
        let vertex = match item {
            Expansion::Word(word) => {
                text.push(word);
                continue;
            }
            Expansion::Vertex(vertex) => vertex,
        };
        let Some(edge_id) = back_pointers
            .get(vertex.index())
            .copied()
            .flatten()
            .and_then(|bp| bp.edge)
        else {
            continue;
        };
        let edge = graph
            .edge(edge_id)
            .ok_or(RescoreError::UnknownEdge { edge: edge_id.0 })?;
        features.add_assign(edge.features());
        for slot in edge.slots().iter().rev() {
            stack.push(match *slot {
                Slot::Literal(word) => Expansion::Word(word),
                Slot::Gap(ordinal) => Expansion::Vertex(edge.children()[ordinal]),
            });
        }
    }
    Ok((text, features))
}
