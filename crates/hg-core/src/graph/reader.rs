use std::io::BufRead;

use tracing::{debug, debug_span};

use super::{Edge, Graph, GraphError, VertexId};
use crate::features::parse_finite;
use crate::vocab::Vocab;

const HEADER: &str = "# target ||| features";
const HEADER_WITH_COVERAGE: &str = "# target ||| features ||| source-covered";
const FIELD_SEPARATOR: &str = "|||";

/// Line source that tracks 1-based line numbers and skips `#` comments.
struct Lines<R> {
    inner: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: String::new(),
            line_no: 0,
        }
    }

    /// Next raw line without its terminator, or `None` at end of input.
    fn raw(&mut self) -> Result<Option<&str>, GraphError> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r'])))
    }

    /// Next line that is not a comment. End of input is a format error.
    fn content(&mut self) -> Result<&str, GraphError> {
        loop {
            self.buf.clear();
            if self.inner.read_line(&mut self.buf)? == 0 {
                return Err(self.error("unexpected end of input".to_string()));
            }
            self.line_no += 1;
            if !self.buf.starts_with('#') {
                return Ok(self.buf.trim_end_matches(['\n', '\r']));
            }
        }
    }

    fn error(&self, message: String) -> GraphError {
        GraphError::Format {
            line: self.line_no,
            message,
        }
    }
}

/// Read a hypergraph in the cdec target-graph text format.
///
/// ```text
/// # target ||| features
/// <vertices> <edges>
/// <edge count of vertex 0>
/// <slot> <slot> ... ||| name=value name=value ... [||| source-covered]
/// ...
/// ```
///
/// A slot `[k]` is a gap bound to vertex `k`, which must already be defined;
/// any other slot is a literal interned through `vocab`.
pub fn read_graph<R: BufRead>(input: R, vocab: &mut Vocab) -> Result<Graph, GraphError> {
    let _span = debug_span!("read_graph").entered();
    let mut lines = Lines::new(input);

    let header = lines
        .raw()?
        .map(str::trim_end)
        .ok_or_else(|| GraphError::Format {
            line: 1,
            message: "empty input".to_string(),
        })?;
    if header != HEADER && header != HEADER_WITH_COVERAGE {
        let message = format!("incorrect header on first line: '{header}'");
        return Err(lines.error(message));
    }

    let (vertex_total, edge_total) = {
        let line = lines.content()?;
        let mut fields = line.split_whitespace();
        let parsed = match (fields.next(), fields.next(), fields.next()) {
            (Some(v), Some(e), None) => v.parse::<usize>().ok().zip(e.parse::<usize>().ok()),
            _ => None,
        };
        let message = format!("expected '<vertices> <edges>', got '{line}'");
        parsed.ok_or_else(|| lines.error(message))?
    };
    debug!(vertices = vertex_total, edges = edge_total);

    let mut graph = Graph::with_capacity(vertex_total, edge_total);
    for _ in 0..vertex_total {
        let edge_count = {
            let line = lines.content()?;
            let message = format!("expected an edge count, got '{line}'");
            line.trim()
                .parse::<usize>()
                .map_err(|_| lines.error(message))?
        };
        let head = VertexId(graph.vertex_count() as u32);
        let mut incoming = Vec::new();
        let mut covered = 0;
        for _ in 0..edge_count {
            let line = lines.content()?;
            let (edge, source_covered) =
                parse_edge(line, head, vocab).map_err(|message| lines.error(message))?;
            let id = graph.new_edge()?;
            if let Some(slot) = graph.edge_mut(id) {
                *slot = edge;
            }
            covered = covered.max(source_covered);
            incoming.push(id);
        }
        let id = graph.new_vertex()?;
        if let Some(vertex) = graph.vertex_mut(id) {
            for edge in incoming {
                vertex.add_edge(edge);
            }
            vertex.set_source_covered(covered);
        }
    }

    if graph.edge_count() != edge_total {
        let message = format!(
            "header declares {edge_total} edges but {} were read",
            graph.edge_count()
        );
        return Err(lines.error(message));
    }
    Ok(graph)
}

/// Parse one edge line for the vertex about to be created at `head`.
fn parse_edge(line: &str, head: VertexId, vocab: &mut Vocab) -> Result<(Edge, usize), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut fields = tokens.split(|&token| token == FIELD_SEPARATOR);
    let target = fields.next().unwrap_or(&[]);
    let features = fields.next().unwrap_or(&[]);
    let coverage = fields.next().unwrap_or(&[]);
    if fields.next().is_some() {
        return Err(format!("too many fields in edge '{line}'"));
    }

    let mut edge = Edge::default();
    for &token in target {
        if token.len() >= 2 && token.starts_with('[') && token.ends_with(']') {
            let inner = &token[1..token.len() - 1];
            if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("bad non-terminal {token}"));
            }
            let child: usize = inner
                .parse()
                .map_err(|_| format!("bad non-terminal {token}"))?;
            if child >= head.index() {
                return Err(format!(
                    "reference to vertex {child} but only {} vertices are defined; \
                     is the file in bottom-up order?",
                    head.index()
                ));
            }
            edge.push_gap(VertexId(child as u32));
        } else {
            edge.push_word(vocab.find_or_add(token));
        }
    }

    for &feature in features {
        let (name, value) = feature
            .rsplit_once('=')
            .ok_or_else(|| format!("failed to parse feature '{feature}'"))?;
        let value = parse_finite(value).ok_or_else(|| format!("failed to parse weight '{value}'"))?;
        edge.set_feature(name, value);
    }

    let source_covered = match coverage {
        [] => 0,
        [count] => count
            .parse::<usize>()
            .map_err(|_| format!("failed to parse source coverage '{count}'"))?,
        _ => return Err(format!("expected a single source coverage count in '{line}'")),
    };
    Ok((edge, source_covered))
}
