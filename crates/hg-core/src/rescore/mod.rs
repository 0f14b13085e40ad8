//! Forest rescoring: Viterbi search over a hypergraph with an optional
//! BLEU term.
//!
//! `viterbi` visits vertices bottom-up, keeps one back-pointer per vertex and
//! expands the best derivation from the root. With a non-zero bleu weight, an
//! `HgBleuScorer` adds a sentence-BLEU approximation to every edge score so the
//! search can be steered toward (hope) or away from (fear) the reference.

mod bleu;
mod decoder;
#[cfg(test)]
pub(crate) mod testutil;
mod viterbi;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::features::SparseVector;
use crate::ngram::BleuStats;
use crate::vocab::{Vocab, WordId};

pub use bleu::{HgBleuScorer, VertexState};
pub use decoder::{DecoderError, HopeFear, HopeFearDecoder, HypergraphDecoder};
pub use viterbi::viterbi;

#[derive(Debug, thiserror::Error)]
pub enum RescoreError {
    #[error("graph has no vertices")]
    EmptyGraph,

    #[error("graph was not topologically sorted: vertex {vertex} uses unvisited vertex {child}")]
    NotTopological { vertex: u32, child: u32 },

    #[error("vertex refers to unknown edge {edge}")]
    UnknownEdge { edge: u32 },

    #[error("state of vertex {vertex} was already finalized")]
    StateAlreadyFinalized { vertex: u32 },

    #[error("state of vertex {vertex} read before it was finalized")]
    StateNotFinalized { vertex: u32 },
}

/// Best derivation found by a Viterbi run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hypothesis {
    /// Target words, sentence sentinels included.
    pub text: Vec<WordId>,
    /// Model score plus the weighted BLEU term of the search.
    pub score: f64,
    /// Sum of the feature vectors of the edges used.
    pub features: SparseVector,
    /// Clipped BLEU statistics of `text` against the references.
    pub bleu_stats: BleuStats,
}

impl Hypothesis {
    pub fn render(&self, vocab: &Vocab) -> String {
        vocab.render(&self.text)
    }
}
