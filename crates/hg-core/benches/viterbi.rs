use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hg_core::graph::{Graph, VertexId};
use hg_core::{viterbi, ReferenceSet, SparseVector, Vocab};

static WORDS: &[&str] = &[
    "the", "a", "house", "home", "is", "was", "small", "little", "old", "very",
];

/// Left-branching lattice: vertex `i` extends vertex `i - 1` by one of
/// `fanout` words, so the forest holds `fanout^length` derivations.
fn bench_graph(vocab: &mut Vocab, length: usize, fanout: usize) -> Graph {
    let mut graph = Graph::with_capacity(length + 2, length * fanout + 2);
    let start = graph.new_edge().unwrap();
    graph
        .edge_mut(start)
        .unwrap()
        .push_word(vocab.find_or_add("<s>"));
    let mut previous = graph.new_vertex().unwrap();
    graph.vertex_mut(previous).unwrap().add_edge(start);

    for position in 0..length {
        let mut edges = Vec::with_capacity(fanout);
        for alt in 0..fanout {
            let id = graph.new_edge().unwrap();
            let edge = graph.edge_mut(id).unwrap();
            edge.push_gap(previous);
            edge.push_word(vocab.find_or_add(WORDS[(position + alt) % WORDS.len()]));
            edge.set_feature("lm", -(((position * 7 + alt * 3) % 11) as f64));
            edge.set_feature("tm", -(((alt * 5 + position) % 4) as f64));
            edges.push(id);
        }
        let vertex = graph.new_vertex().unwrap();
        let v = graph.vertex_mut(vertex).unwrap();
        for id in edges {
            v.add_edge(id);
        }
        v.set_source_covered(position + 1);
        previous = vertex;
    }

    let end = graph.new_edge().unwrap();
    let edge = graph.edge_mut(end).unwrap();
    edge.push_gap(previous);
    edge.push_word(vocab.find_or_add("</s>"));
    let root = graph.new_vertex().unwrap();
    let v = graph.vertex_mut(root).unwrap();
    v.add_edge(end);
    v.set_source_covered(length);
    debug_assert_eq!(root, VertexId(length as u32 + 1));
    graph
}

static SIZES: &[(&str, usize, usize)] = &[("short", 10, 3), ("medium", 30, 5), ("long", 80, 8)];

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("viterbi");
    let weights: SparseVector = [("lm", 1.0), ("tm", 0.5)].into_iter().collect();
    for &(label, length, fanout) in SIZES {
        let mut vocab = Vocab::new();
        let references = ReferenceSet::from_texts(
            &["the house is very small and the old home was little"],
            &mut vocab,
        );
        let graph = bench_graph(&mut vocab, length, fanout);
        for bleu_weight in [0.0, 1.0] {
            let id = BenchmarkId::new(format!("{label}/bleu={bleu_weight}"), length * fanout);
            group.bench_with_input(id, &graph, |b, graph| {
                b.iter(|| viterbi(graph, &weights, bleu_weight, &references, 0).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
