use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use hg_core::features::WeightsError;
use hg_core::graph::GraphError;
use hg_core::ngram::BleuStats;
use hg_core::reference::ReferenceError;
use hg_core::rescore::{DecoderError, RescoreError};
use hg_core::{Hypothesis, SparseVector, Vocab};

pub mod config_ops;
pub mod reference_ops;
pub mod rescore_ops;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}
pub(crate) use die;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error("invalid weights: {0}")]
    Weights(#[from] WeightsError),
    #[error(transparent)]
    Rescore(#[from] RescoreError),
    #[error(transparent)]
    Decoder(#[from] DecoderError),
}

/// A derivation with its words rendered for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisReport {
    pub text: String,
    pub score: f64,
    pub features: SparseVector,
    pub bleu_stats: BleuStats,
}

impl HypothesisReport {
    pub fn new(hypothesis: Hypothesis, vocab: &Vocab) -> Self {
        Self {
            text: hypothesis.render(vocab),
            score: hypothesis.score,
            features: hypothesis.features,
            bleu_stats: hypothesis.bleu_stats,
        }
    }
}

/// Weights from `path`, or an empty vector when no file is given.
pub(crate) fn load_weights(path: Option<&str>) -> Result<SparseVector, CliError> {
    match path {
        Some(path) => Ok(SparseVector::load(Path::new(path))?),
        None => Ok(SparseVector::new()),
    }
}

pub(crate) fn format_features(features: &SparseVector) -> String {
    features
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn format_stats(stats: &BleuStats) -> String {
    (1..=hg_core::ngram::NGRAM_ORDER)
        .map(|n| format!("{}/{}", stats.matched(n), stats.total(n)))
        .collect::<Vec<_>>()
        .join(" ")
}
