//! N-gram enumeration and BLEU sufficient statistics.

use std::collections::{HashMap, VecDeque};
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::vocab::WordId;

/// Highest n-gram order considered by the references and the scorer.
pub const NGRAM_ORDER: usize = 4;

/// Words kept on each side of a vertex's best derivation.
pub const CONTEXT_SIZE: usize = NGRAM_ORDER - 1;

pub type Ngram = Vec<WordId>;

/// Occurrence counts of n-grams (orders mixed).
pub type NgramCounts = HashMap<Ngram, usize>;

/// Sliding window of the n-grams still open for extension.
///
/// Pushing a word starts a new unigram and extends every open n-gram by that
/// word. Once `NGRAM_ORDER` n-grams are open the longest one is complete and
/// is evicted, so at most `NGRAM_ORDER` prefixes are alive at once.
#[derive(Debug, Default)]
pub(crate) struct NgramWindow {
    open: VecDeque<Ngram>,
}

impl NgramWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the window with `word`, calling `visit` once per n-gram that now
    /// ends at `word`, shortest first.
    pub fn push(&mut self, word: WordId, mut visit: impl FnMut(&Ngram)) {
        self.open.push_front(Vec::with_capacity(NGRAM_ORDER));
        for ngram in self.open.iter_mut() {
            ngram.push(word);
            visit(ngram);
        }
        if self.open.len() >= NGRAM_ORDER {
            self.open.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.open.clear();
    }
}

/// Count every n-gram of order 1..=NGRAM_ORDER in `words`.
pub fn count_ngrams(words: &[WordId]) -> NgramCounts {
    let mut counts = NgramCounts::new();
    let mut window = NgramWindow::new();
    for &word in words {
        window.push(word, |ngram| *counts.entry(ngram.clone()).or_insert(0) += 1);
    }
    counts
}

/// Matched and total n-gram counts for orders 1..=NGRAM_ORDER.
///
/// Stored interleaved as `[matched_1, total_1, matched_2, total_2, ...]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BleuStats {
    counts: [usize; NGRAM_ORDER * 2],
}

impl BleuStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matched n-grams of `order` (1-based).
    pub fn matched(&self, order: usize) -> usize {
        self.counts[(order - 1) * 2]
    }

    /// Candidate n-grams of `order` (1-based).
    pub fn total(&self, order: usize) -> usize {
        self.counts[(order - 1) * 2 + 1]
    }

    /// Record `count` candidate n-grams of `order`, of which `matched` match.
    pub fn record(&mut self, order: usize, matched: usize, count: usize) {
        self.counts[(order - 1) * 2] += matched;
        self.counts[(order - 1) * 2 + 1] += count;
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }

    /// Smoothed log geometric mean of the n-gram precisions, uniform weights.
    pub fn log_precision(&self, smoothing: f64) -> f64 {
        let sum: f64 = (1..=NGRAM_ORDER)
            .map(|n| {
                (self.matched(n) as f64 + smoothing).ln() - (self.total(n) as f64 + smoothing).ln()
            })
            .sum();
        sum / NGRAM_ORDER as f64
    }
}

impl AddAssign for BleuStats {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.counts.iter_mut().zip(rhs.counts) {
            *a += b;
        }
    }
}

impl Add for BleuStats {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}
