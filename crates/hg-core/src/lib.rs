//! Hypergraph rescoring for MT tuning.
//!
//! Reads packed forests of translation derivations, indexes reference
//! translations by n-gram, and finds the derivation that maximizes model score
//! plus a weighted, decomposable BLEU approximation in one bottom-up pass.

pub mod features;
pub mod graph;
pub mod ngram;
pub mod reference;
pub mod rescore;
pub mod settings;
pub mod vocab;

pub use features::SparseVector;
pub use graph::{read_graph, Graph};
pub use reference::ReferenceSet;
pub use rescore::{viterbi, Hypothesis};
pub use vocab::{Vocab, WordId};
