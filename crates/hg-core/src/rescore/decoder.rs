use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, debug_span};

use super::{viterbi, Hypothesis, RescoreError};
use crate::features::SparseVector;
use crate::graph::{read_graph, Graph, GraphError};
use crate::reference::{ReferenceError, ReferenceSet};
use crate::settings::settings;
use crate::vocab::Vocab;

#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("failed to open graph {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid graph {path}: {source}")]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphError,
    },

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Rescore(#[from] RescoreError),

    #[error("no graph for sentence {sentence} ({count} loaded)")]
    UnknownSentence { sentence: usize, count: usize },
}

/// The three derivations a margin-based tuner compares for one sentence.
#[derive(Debug, Clone, Serialize)]
pub struct HopeFear {
    /// High model score and high BLEU.
    pub hope: Hypothesis,
    /// High model score and low BLEU.
    pub fear: Hypothesis,
    /// Model score alone.
    pub model: Hypothesis,
}

/// Source of scored derivations for each sentence of a tuning set.
pub trait HopeFearDecoder {
    fn sentence_count(&self) -> usize;

    /// Best derivation of `sentence_id` under `model + bleu_weight * BLEU`.
    fn decode(
        &self,
        sentence_id: usize,
        weights: &SparseVector,
        bleu_weight: f64,
    ) -> Result<Hypothesis, DecoderError>;

    /// Hope, fear and model-best derivations using the configured bleu weights.
    fn hope_fear(&self, sentence_id: usize, weights: &SparseVector) -> Result<HopeFear, DecoderError> {
        let s = &settings().decoder;
        Ok(HopeFear {
            hope: self.decode(sentence_id, weights, s.hope_bleu_weight)?,
            fear: self.decode(sentence_id, weights, s.fear_bleu_weight)?,
            model: self.decode(sentence_id, weights, s.model_bleu_weight)?,
        })
    }
}

/// Decoder over one hypergraph per sentence.
pub struct HypergraphDecoder {
    vocab: Vocab,
    graphs: Vec<Graph>,
    references: ReferenceSet,
}

impl HypergraphDecoder {
    pub fn new(vocab: Vocab, graphs: Vec<Graph>, references: ReferenceSet) -> Self {
        Self {
            vocab,
            graphs,
            references,
        }
    }

    /// Load the references, then the graph of every referenced sentence from
    /// `graph_dir/<sentence id>`. All tokens share one vocabulary.
    pub fn load<P: AsRef<Path>>(graph_dir: &Path, reference_files: &[P]) -> Result<Self, DecoderError> {
        let _span = debug_span!("load_decoder").entered();
        let mut vocab = Vocab::new();
        let references = ReferenceSet::load(reference_files, &mut vocab)?;

        let mut graphs = Vec::with_capacity(references.len());
        for sentence_id in 0..references.len() {
            let path = graph_dir.join(sentence_id.to_string());
            let file = File::open(&path).map_err(|source| DecoderError::Io {
                path: path.clone(),
                source,
            })?;
            let graph = read_graph(BufReader::new(file), &mut vocab)
                .map_err(|source| DecoderError::Graph { path, source })?;
            graphs.push(graph);
        }
        debug!(sentences = graphs.len(), vocab = vocab.len());
        Ok(Self::new(vocab, graphs, references))
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    pub fn graph(&self, sentence_id: usize) -> Option<&Graph> {
        self.graphs.get(sentence_id)
    }
}

impl HopeFearDecoder for HypergraphDecoder {
    fn sentence_count(&self) -> usize {
        self.graphs.len()
    }

    fn decode(
        &self,
        sentence_id: usize,
        weights: &SparseVector,
        bleu_weight: f64,
    ) -> Result<Hypothesis, DecoderError> {
        let graph = self
            .graphs
            .get(sentence_id)
            .ok_or(DecoderError::UnknownSentence {
                sentence: sentence_id,
                count: self.graphs.len(),
            })?;
        Ok(viterbi(
            graph,
            weights,
            bleu_weight,
            &self.references,
            sentence_id,
        )?)
    }
}
