//! Reference n-gram index.
//!
//! For every reference sentence, maps each n-gram of order 1..=4 to a pair of
//! counts: the clipped count (largest count in any single reference file) and
//! the total count (sum over all reference files). Sentences are aligned by
//! line number across files. The index is built once and read-only afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, debug_span};

use crate::ngram::{count_ngrams, BleuStats, Ngram};
use crate::vocab::{Vocab, WordId};

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read reference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NgramCount {
    clipped: usize,
    total: usize,
}

#[derive(Debug, Clone, Default)]
struct SentenceRefs {
    ngrams: HashMap<Ngram, NgramCount>,
    /// Shortest reference length seen so far; `None` until the first one.
    length: Option<usize>,
}

/// N-gram counts of all references, indexed by sentence id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    sentences: Vec<SentenceRefs>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one or more reference files, interning tokens through `vocab`.
    pub fn load<P: AsRef<Path>>(files: &[P], vocab: &mut Vocab) -> Result<Self, ReferenceError> {
        let mut refs = Self::new();
        for path in files {
            let path = path.as_ref();
            let file = File::open(path).map_err(|source| ReferenceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            refs.add_reader(BufReader::new(file), vocab)
                .map_err(|source| ReferenceError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        Ok(refs)
    }

    /// Build from in-memory reference texts, one string per reference file.
    pub fn from_texts(texts: &[&str], vocab: &mut Vocab) -> Self {
        let mut refs = Self::new();
        for text in texts {
            for (sentence_id, line) in text.lines().enumerate() {
                refs.add_sentence(sentence_id, line, vocab);
            }
        }
        refs
    }

    /// Add every line of one reference file; line `i` is sentence `i`.
    pub fn add_reader<R: BufRead>(&mut self, reader: R, vocab: &mut Vocab) -> io::Result<()> {
        let _span = debug_span!("add_reader").entered();
        let mut lines = 0;
        for (sentence_id, line) in reader.lines().enumerate() {
            self.add_sentence(sentence_id, &line?, vocab);
            lines += 1;
        }
        debug!(lines, sentences = self.sentences.len());
        Ok(())
    }

    fn add_sentence(&mut self, sentence_id: usize, line: &str, vocab: &mut Vocab) {
        let words: Vec<WordId> = line.split_whitespace().map(|t| vocab.find_or_add(t)).collect();
        let counts = count_ngrams(&words);

        if self.sentences.len() <= sentence_id {
            self.sentences.resize_with(sentence_id + 1, SentenceRefs::default);
        }
        let sentence = &mut self.sentences[sentence_id];
        for (ngram, count) in counts {
            let entry = sentence.ngrams.entry(ngram).or_default();
            entry.clipped = entry.clipped.max(count);
            entry.total += count;
        }
        sentence.length = Some(match sentence.length {
            Some(len) => len.min(words.len()),
            None => words.len(),
        });
    }

    /// Number of sentences with at least one reference.
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Reference count of `ngram` in `sentence_id`: the clipped (max over
    /// references) count if `clip`, otherwise the total over all references.
    /// Unknown sentences and absent n-grams give 0.
    pub fn ngram_matches(&self, sentence_id: usize, ngram: &[WordId], clip: bool) -> usize {
        self.sentences
            .get(sentence_id)
            .and_then(|s| s.ngrams.get(ngram))
            .map_or(0, |c| if clip { c.clipped } else { c.total })
    }

    /// Length of the shortest reference for `sentence_id`, 0 if unknown.
    pub fn length(&self, sentence_id: usize) -> usize {
        self.sentences
            .get(sentence_id)
            .and_then(|s| s.length)
            .unwrap_or(0)
    }

    /// Clipped BLEU statistics of a complete word sequence against the
    /// references of `sentence_id`. Sentence sentinels are not counted.
    pub fn sentence_stats(&self, sentence_id: usize, words: &[WordId]) -> BleuStats {
        let words: Vec<WordId> = words.iter().copied().filter(|w| !w.is_boundary()).collect();
        let mut stats = BleuStats::new();
        for (ngram, count) in count_ngrams(&words) {
            let matched = count.min(self.ngram_matches(sentence_id, &ngram, true));
            stats.record(ngram.len(), matched, count);
        }
        stats
    }
}
