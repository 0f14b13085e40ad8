use serde::Serialize;

use hg_core::{ReferenceSet, Vocab, WordId};

use super::{die, CliError};

/// Reference counts of one n-gram in one sentence.
#[derive(Debug, PartialEq, Serialize)]
pub struct NgramProbe {
    pub ngram: String,
    pub clipped: usize,
    pub total: usize,
    pub reference_length: usize,
}

pub fn probe(references: &[String], sentence: usize, ngram: &str) -> Result<NgramProbe, CliError> {
    let mut vocab = Vocab::new();
    let refs = ReferenceSet::load(references, &mut vocab)?;
    let words: Vec<WordId> = ngram
        .split_whitespace()
        .map(|token| vocab.find_or_add(token))
        .collect();
    Ok(NgramProbe {
        ngram: vocab.render(&words),
        clipped: refs.ngram_matches(sentence, &words, true),
        total: refs.ngram_matches(sentence, &words, false),
        reference_length: refs.length(sentence),
    })
}

pub fn ngram_cmd(references: &[String], sentence: usize, ngram: &str, json: bool) {
    let result = die!(probe(references, sentence, ngram), "Error: {}");
    if json {
        println!("{}", die!(serde_json::to_string(&result), "Error: {}"));
    } else {
        println!(
            "\"{}\" in sentence {sentence}: clipped={} total={} (shortest reference {} words)",
            result.ngram, result.clipped, result.total, result.reference_length
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn probe_counts_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("ref.0");
        let b = dir.path().join("ref.1");
        fs::write(&a, "in the 1990s the market grew\nsecond line\n").unwrap();
        fs::write(&b, "the 1990s saw growth\nanother\n").unwrap();
        let files = [
            a.to_string_lossy().into_owned(),
            b.to_string_lossy().into_owned(),
        ];

        let the = probe(&files, 0, "the").unwrap();
        assert_eq!(the.clipped, 2);
        assert_eq!(the.total, 3);
        assert_eq!(the.reference_length, 4);

        let longer = probe(&files, 0, "the 1990s").unwrap();
        assert_eq!(longer.clipped, 1);
        assert_eq!(longer.total, 2);
        assert!(longer.clipped <= the.clipped);

        let absent = probe(&files, 1, "the").unwrap();
        assert_eq!(absent.total, 0);
        assert_eq!(absent.reference_length, 1);
    }

    #[test]
    fn probe_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = [dir.path().join("nope").to_string_lossy().into_owned()];
        assert!(matches!(
            probe(&files, 0, "x"),
            Err(CliError::Reference(_))
        ));
    }
}
