use clap::{Parser, Subcommand};

use hg_cli::commands::rescore_ops::SearchOptions;
use hg_cli::commands::{config_ops, reference_ops, rescore_ops};
use hg_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "hgrescore", about = "Hypergraph rescoring with a BLEU term")]
struct Cli {
    /// Custom settings TOML (replaces the embedded defaults)
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Best derivation of one hypergraph file
    Viterbi {
        /// Path to the hypergraph text file
        graph_file: String,
        /// Reference file (repeat for multiple references)
        #[arg(short, long = "reference")]
        references: Vec<String>,
        /// Path to a `name value` weights file
        #[arg(short, long)]
        weights: Option<String>,
        /// Weight of the BLEU term (negative for fear)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        bleu_weight: f64,
        /// Sentence id of this graph in the reference files
        #[arg(long, default_value_t = 0)]
        sentence: usize,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Hope, fear and model-best derivations for a directory of graphs
    HopeFear {
        /// Directory holding one graph file per sentence, named by sentence id
        graph_dir: String,
        /// Reference files, one sentence per line
        #[arg(required = true)]
        references: Vec<String>,
        /// Path to a `name value` weights file
        #[arg(short, long)]
        weights: Option<String>,
        /// Decode only this sentence
        #[arg(long)]
        sentence: Option<usize>,
        /// Output as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Reference counts of an n-gram in one sentence
    Ngram {
        /// N-gram to look up, space separated
        ngram: String,
        /// Reference file (repeat for multiple references)
        #[arg(short, long = "reference", required = true)]
        references: Vec<String>,
        /// Sentence id
        #[arg(long, default_value_t = 0)]
        sentence: usize,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the embedded default settings TOML
    SettingsExport,

    /// Validate a settings TOML file
    SettingsValidate {
        /// Path to the settings TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    if let Some(file) = &cli.config {
        config_ops::load_config(file);
    }

    match cli.command {
        Command::Viterbi {
            graph_file,
            references,
            weights,
            bleu_weight,
            sentence,
            json,
        } => {
            let opts = SearchOptions {
                references: &references,
                weights: weights.as_deref(),
            };
            rescore_ops::viterbi_cmd(&graph_file, &opts, bleu_weight, sentence, json);
        }
        Command::HopeFear {
            graph_dir,
            references,
            weights,
            sentence,
            json,
        } => {
            let opts = SearchOptions {
                references: &references,
                weights: weights.as_deref(),
            };
            rescore_ops::hope_fear_cmd(&graph_dir, &opts, sentence, json);
        }
        Command::Ngram {
            ngram,
            references,
            sentence,
            json,
        } => reference_ops::ngram_cmd(&references, sentence, &ngram, json),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
