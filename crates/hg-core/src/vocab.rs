//! Token interning.
//!
//! Every token seen in a hypergraph or a reference file is mapped to a dense
//! `WordId`. Ids are never reused or removed, so a `WordId` stays valid for the
//! lifetime of the `Vocab` that issued it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::settings::settings;

/// Dense, zero-based index of an interned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WordId(pub u32);

impl WordId {
    /// Sentence-start sentinel, interned first by every `Vocab`.
    pub const SENTENCE_START: WordId = WordId(0);
    /// Sentence-end sentinel, interned second by every `Vocab`.
    pub const SENTENCE_END: WordId = WordId(1);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the sentence-start and sentence-end sentinels.
    #[inline]
    pub fn is_boundary(self) -> bool {
        self == Self::SENTENCE_START || self == Self::SENTENCE_END
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Token interner shared by graphs and references of one corpus.
#[derive(Debug, Clone)]
pub struct Vocab {
    ids: HashMap<Box<str>, WordId>,
    words: Vec<Box<str>>,
}

impl Default for Vocab {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocab {
    /// Create a vocabulary holding only the configured sentence sentinels.
    pub fn new() -> Self {
        let s = settings();
        Self::with_sentinels(&s.vocab.sentence_start, &s.vocab.sentence_end)
    }

    /// Create a vocabulary with explicit sentinel tokens at ids 0 and 1.
    pub fn with_sentinels(sentence_start: &str, sentence_end: &str) -> Self {
        let mut vocab = Self {
            ids: HashMap::new(),
            words: Vec::new(),
        };
        vocab.find_or_add(sentence_start);
        vocab.find_or_add(sentence_end);
        vocab
    }

    /// Intern `token`, returning the existing id if it was seen before.
    pub fn find_or_add(&mut self, token: &str) -> WordId {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = WordId(self.words.len() as u32);
        let owned: Box<str> = token.into();
        self.words.push(owned.clone());
        self.ids.insert(owned, id);
        id
    }

    pub fn find(&self, token: &str) -> Option<WordId> {
        self.ids.get(token).copied()
    }

    /// Token text for `id`, or `None` if the id came from another vocabulary.
    pub fn word(&self, id: WordId) -> Option<&str> {
        self.words.get(id.index()).map(|w| &**w)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Join `words` with single spaces. Unknown ids render as `#<index>`.
    pub fn render(&self, words: &[WordId]) -> String {
        let mut out = String::new();
        for (i, &id) in words.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match self.word(id) {
                Some(w) => out.push_str(w),
                None => out.push_str(&id.to_string()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_preinterned() {
        let vocab = Vocab::with_sentinels("<s>", "</s>");
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.find("<s>"), Some(WordId::SENTENCE_START));
        assert_eq!(vocab.find("</s>"), Some(WordId::SENTENCE_END));
        assert!(WordId::SENTENCE_START.is_boundary());
        assert!(WordId::SENTENCE_END.is_boundary());
    }

    #[test]
    fn find_or_add_is_stable() {
        let mut vocab = Vocab::with_sentinels("<s>", "</s>");
        let a = vocab.find_or_add("a");
        let b = vocab.find_or_add("b");
        assert_eq!(a, WordId(2));
        assert_eq!(b, WordId(3));
        assert_eq!(vocab.find_or_add("a"), a);
        assert_eq!(vocab.len(), 4);
        assert!(!a.is_boundary());
    }

    #[test]
    fn find_does_not_insert() {
        let vocab = Vocab::with_sentinels("<s>", "</s>");
        assert_eq!(vocab.find("missing"), None);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn word_round_trips() {
        let mut vocab = Vocab::with_sentinels("<s>", "</s>");
        let id = vocab.find_or_add("1990s");
        assert_eq!(vocab.word(id), Some("1990s"));
        assert_eq!(vocab.word(WordId(99)), None);
    }

    #[test]
    fn render_joins_with_spaces() {
        let mut vocab = Vocab::with_sentinels("<s>", "</s>");
        let a = vocab.find_or_add("a");
        let b = vocab.find_or_add("b");
        let text = [WordId::SENTENCE_START, a, b, WordId::SENTENCE_END];
        assert_eq!(vocab.render(&text), "<s> a b </s>");
        assert_eq!(vocab.render(&[a, WordId(42)]), "a #42");
        assert_eq!(vocab.render(&[]), "");
    }

    #[test]
    fn case_and_bytes_distinguish_tokens() {
        let mut vocab = Vocab::with_sentinels("<s>", "</s>");
        let lower = vocab.find_or_add("the");
        let upper = vocab.find_or_add("The");
        assert_ne!(lower, upper);
    }
}
