//! BLEU scoring of hyperedges with propagated boundary context.
//!
//! Each vertex keeps, for its current best derivation, the first and last
//! `CONTEXT_SIZE` words plus the aggregate BLEU statistics of that derivation.
//! Scoring an edge only has to count the n-grams that its own words create,
//! including those spanning into a child's boundary words; everything inside
//! a child was counted when the child was finalized.

use tracing::trace;

use super::RescoreError;
use crate::graph::{Edge, Graph, Slot, Vertex, VertexId};
use crate::ngram::{BleuStats, NgramCounts, NgramWindow, CONTEXT_SIZE};
use crate::reference::ReferenceSet;
use crate::settings::settings;
use crate::vocab::WordId;

/// Boundary state of a vertex's best derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexState {
    /// Leading words, at most `CONTEXT_SIZE`.
    pub left_context: Vec<WordId>,
    /// Trailing words in forward order, at most `CONTEXT_SIZE`.
    pub right_context: Vec<WordId>,
    pub bleu_stats: BleuStats,
    /// Target words in the derivation.
    pub target_length: usize,
}

/// Per-sentence scorer. Vertex states are written once, bottom-up.
pub struct HgBleuScorer<'a> {
    references: &'a ReferenceSet,
    sentence_id: usize,
    total_source_length: usize,
    smoothing: f64,
    states: Vec<Option<VertexState>>,
}

impl<'a> HgBleuScorer<'a> {
    pub fn new(references: &'a ReferenceSet, graph: &'a Graph, sentence_id: usize) -> Self {
        Self {
            references,
            sentence_id,
            total_source_length: graph.total_source_covered(),
            smoothing: settings().bleu.smoothing,
            states: vec![None; graph.vertex_count()],
        }
    }

    /// Finalized state of `vertex`.
    pub fn state(&self, vertex: VertexId) -> Result<&VertexState, RescoreError> {
        self.states
            .get(vertex.index())
            .and_then(Option::as_ref)
            .ok_or(RescoreError::StateNotFinalized { vertex: vertex.0 })
    }

    /// Smoothed, length-penalized BLEU of `edge` as a derivation of `head`,
    /// together with the derivation's aggregate statistics.
    pub fn score(&self, edge: &Edge, head: &Vertex) -> Result<(f64, BleuStats), RescoreError> {
        let counts = self.edge_ngrams(edge)?;
        let mut stats = self.match_counts(&counts);
        for &child in edge.children() {
            stats += self.state(child)?.bleu_stats;
        }

        let mut log_bleu = stats.log_precision(self.smoothing);

        let target_length = self.target_length(edge)?;
        let effective_ref = self.effective_reference_length(head);
        if effective_ref > 0.0 {
            if target_length == 0 {
                return Ok((0.0, stats));
            }
            let ratio = effective_ref / target_length as f64;
            if ratio > 1.0 {
                log_bleu += 1.0 - ratio;
            }
        }
        trace!(target_length, effective_ref, log_bleu);
        Ok((log_bleu.exp(), stats))
    }

    /// Fix the state of `vertex` from its winning edge.
    pub fn update_state(
        &mut self,
        vertex: VertexId,
        winner: &Edge,
        bleu_stats: BleuStats,
    ) -> Result<(), RescoreError> {
        let state = VertexState {
            left_context: self.left_context(winner)?,
            right_context: self.right_context(winner)?,
            bleu_stats,
            target_length: self.target_length(winner)?,
        };
        self.finalize(vertex, state)
    }

    /// Fix the state of a leaf vertex: empty context, no statistics.
    pub fn finalize_leaf(&mut self, vertex: VertexId) -> Result<(), RescoreError> {
        self.finalize(vertex, VertexState::default())
    }

    fn finalize(&mut self, vertex: VertexId, state: VertexState) -> Result<(), RescoreError> {
        let slot = self
            .states
            .get_mut(vertex.index())
            .ok_or(RescoreError::StateNotFinalized { vertex: vertex.0 })?;
        if slot.is_some() {
            return Err(RescoreError::StateAlreadyFinalized { vertex: vertex.0 });
        }
        *slot = Some(state);
        Ok(())
    }

    /// Reference length scaled by the share of the source this vertex covers.
    fn effective_reference_length(&self, head: &Vertex) -> f64 {
        if self.total_source_length == 0 {
            return 0.0;
        }
        let coverage = head.source_covered() as f64 / self.total_source_length as f64;
        coverage * self.references.length(self.sentence_id) as f64
    }

    /// N-grams introduced by `edge`: those ending on one of its own words and
    /// those crossing into a child's left context. Right-context words only
    /// seed the window; their n-grams belong to the child.
    fn edge_ngrams(&self, edge: &Edge) -> Result<NgramCounts, RescoreError> {
        let mut counts = NgramCounts::new();
        let mut window = NgramWindow::new();
        let mut count = |word: WordId, window: &mut NgramWindow, crosses: &dyn Fn(usize) -> bool| {
            if word.is_boundary() {
                return;
            }
            window.push(word, |ngram| {
                if crosses(ngram.len()) {
                    *counts.entry(ngram.clone()).or_insert(0) += 1;
                }
            });
        };

        for slot in edge.slots() {
            match *slot {
                Slot::Literal(word) => count(word, &mut window, &|_: usize| true),
                Slot::Gap(ordinal) => {
                    let state = self.state(edge.children()[ordinal])?;
                    for (position, &word) in state.left_context.iter().enumerate() {
                        count(word, &mut window, &|len: usize| len > position + 1);
                    }
                    if state.left_context.len() == CONTEXT_SIZE {
                        window.clear();
                        for &word in &state.right_context {
                            count(word, &mut window, &|_: usize| false);
                        }
                    }
                }
            }
        }
        Ok(counts)
    }

    fn match_counts(&self, counts: &NgramCounts) -> BleuStats {
        let mut stats = BleuStats::new();
        for (ngram, &count) in counts {
            let reference = self.references.ngram_matches(self.sentence_id, ngram, false);
            stats.record(ngram.len(), count.min(reference), count);
        }
        stats
    }

    fn target_length(&self, edge: &Edge) -> Result<usize, RescoreError> {
        let mut length = edge.literal_count();
        for &child in edge.children() {
            length += self.state(child)?.target_length;
        }
        Ok(length)
    }

    fn left_context(&self, edge: &Edge) -> Result<Vec<WordId>, RescoreError> {
        let mut context = Vec::with_capacity(CONTEXT_SIZE);
        for slot in edge.slots() {
            if context.len() >= CONTEXT_SIZE {
                break;
            }
            match *slot {
                Slot::Literal(word) => context.push(word),
                Slot::Gap(ordinal) => {
                    let child = self.state(edge.children()[ordinal])?;
                    let room = CONTEXT_SIZE - context.len();
                    context.extend(child.left_context.iter().take(room));
                }
            }
        }
        Ok(context)
    }

    fn right_context(&self, edge: &Edge) -> Result<Vec<WordId>, RescoreError> {
        let mut context = Vec::with_capacity(CONTEXT_SIZE);
        for slot in edge.slots().iter().rev() {
            if context.len() >= CONTEXT_SIZE {
                break;
            }
            match *slot {
                Slot::Literal(word) => context.push(word),
                Slot::Gap(ordinal) => {
                    let child = self.state(edge.children()[ordinal])?;
                    let room = CONTEXT_SIZE - context.len();
                    context.extend(child.right_context.iter().rev().take(room));
                }
            }
        }
        context.reverse();
        Ok(context)
    }
}
