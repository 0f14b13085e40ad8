use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, debug_span};

use hg_core::rescore::{HopeFearDecoder, HypergraphDecoder};
use hg_core::{read_graph, viterbi, ReferenceSet, Vocab};

use super::{die, format_features, format_stats, load_weights, CliError, HypothesisReport};

/// Inputs shared by the search commands.
pub struct SearchOptions<'a> {
    pub references: &'a [String],
    pub weights: Option<&'a str>,
}

/// Best derivation of one graph file under `model + bleu_weight * BLEU`.
pub fn search(
    graph_file: &Path,
    opts: &SearchOptions<'_>,
    bleu_weight: f64,
    sentence: usize,
) -> Result<HypothesisReport, CliError> {
    let _span = debug_span!("search", graph = %graph_file.display()).entered();
    let mut vocab = Vocab::new();
    let references = ReferenceSet::load(opts.references, &mut vocab)?;
    let file = File::open(graph_file).map_err(|source| CliError::Io {
        path: graph_file.to_path_buf(),
        source,
    })?;
    let graph = read_graph(BufReader::new(file), &mut vocab)?;
    let weights = load_weights(opts.weights)?;
    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        features = weights.len()
    );
    let best = viterbi(&graph, &weights, bleu_weight, &references, sentence)?;
    Ok(HypothesisReport::new(best, &vocab))
}

pub fn viterbi_cmd(
    graph_file: &str,
    opts: &SearchOptions<'_>,
    bleu_weight: f64,
    sentence: usize,
    json: bool,
) {
    let report = die!(
        search(Path::new(graph_file), opts, bleu_weight, sentence),
        "Error: {}"
    );
    if json {
        println!("{}", die!(serde_json::to_string(&report), "Error: {}"));
        return;
    }
    println!("{}", report.text);
    println!("score:    {}", report.score);
    println!("features: {}", format_features(&report.features));
    println!("bleu:     {}", format_stats(&report.bleu_stats));
}

/// Hope, fear and model-best derivations of one sentence.
#[derive(Debug, Serialize)]
pub struct HopeFearReport {
    pub sentence: usize,
    pub hope: HypothesisReport,
    pub fear: HypothesisReport,
    pub model: HypothesisReport,
}

/// Decode every sentence of a graph directory, or only `sentence` if given.
pub fn hope_fear(
    graph_dir: &Path,
    opts: &SearchOptions<'_>,
    sentence: Option<usize>,
) -> Result<Vec<HopeFearReport>, CliError> {
    let decoder = HypergraphDecoder::load(graph_dir, opts.references)?;
    let weights = load_weights(opts.weights)?;
    let sentences = match sentence {
        Some(id) => id..id + 1,
        None => 0..decoder.sentence_count(),
    };
    let mut reports = Vec::with_capacity(sentences.len());
    for id in sentences {
        let result = decoder.hope_fear(id, &weights)?;
        let vocab = decoder.vocab();
        reports.push(HopeFearReport {
            sentence: id,
            hope: HypothesisReport::new(result.hope, vocab),
            fear: HypothesisReport::new(result.fear, vocab),
            model: HypothesisReport::new(result.model, vocab),
        });
    }
    Ok(reports)
}

pub fn hope_fear_cmd(graph_dir: &str, opts: &SearchOptions<'_>, sentence: Option<usize>, json: bool) {
    let reports = die!(
        hope_fear(Path::new(graph_dir), opts, sentence),
        "Error: {}"
    );
    for report in &reports {
        if json {
            println!("{}", die!(serde_json::to_string(report), "Error: {}"));
            continue;
        }
        for (label, hyp) in [
            ("hope", &report.hope),
            ("fear", &report.fear),
            ("model", &report.model),
        ] {
            println!(
                "{}\t{label}\t{:.4}\t{}\t{}",
                report.sentence,
                hyp.score,
                format_stats(&hyp.bleu_stats),
                hyp.text
            );
        }
    }
}
