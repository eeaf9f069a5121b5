//! Line-oriented readers for graphs, opinions, measures and edge lists.
//!
//! Fields are separated by whitespace or commas so both the space-separated
//! dataset dumps and comma-separated exports load unchanged.

use std::{
    collections::{HashMap, HashSet},
    io::BufRead,
    str::FromStr,
};

use tracing::{debug, warn};
use whakaaro_core::{GraphBuilder, GroundTruth, Measure, WeightedEdge, WeightedGraph};

use crate::errors::TextProviderError;

type Result<T> = std::result::Result<T, TextProviderError>;

/// Unweighted edge list, each distinct `(u, v)` pair kept once in the order
/// it first appeared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeList {
    /// Vertex count from the header line.
    pub num_vertices: usize,
    /// Distinct edges in first-seen order.
    pub edges: Vec<(usize, usize)>,
}

struct Lines<R> {
    inner: std::io::Lines<R>,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            number: 0,
        }
    }

    /// Next line as `(1-based number, text)`.
    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        let Some(line) = self.inner.next() else {
            return Ok(None);
        };
        self.number += 1;
        let text = line.map_err(|source| TextProviderError::Read {
            line: self.number,
            source,
        })?;
        Ok(Some((self.number, text)))
    }

    fn header(&mut self) -> Result<usize> {
        let Some((_, text)) = self.next_line()? else {
            return Err(TextProviderError::EmptyInput);
        };
        let trimmed = text.trim();
        trimmed
            .parse::<usize>()
            .map_err(|_| TextProviderError::MissingHeader {
                found: trimmed.to_owned(),
            })
    }
}

fn fields(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|field| !field.is_empty())
}

fn parse_field<T: FromStr>(field: Option<&str>, line: usize, what: &str) -> Result<T> {
    let raw = field.ok_or_else(|| TextProviderError::Parse {
        line,
        reason: format!("missing {what}"),
    })?;
    raw.parse().map_err(|_| TextProviderError::Parse {
        line,
        reason: format!("invalid {what} `{raw}`"),
    })
}

fn parse_endpoints<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
    num_vertices: usize,
) -> Result<(usize, usize)> {
    let left: usize = parse_field(parts.next(), line, "source vertex")?;
    let right: usize = parse_field(parts.next(), line, "target vertex")?;
    if let Some(vertex) = [left, right].into_iter().find(|&v| v >= num_vertices) {
        return Err(TextProviderError::Parse {
            line,
            reason: format!("vertex {vertex} outside a graph of {num_vertices} vertices"),
        });
    }
    Ok((left, right))
}

/// Reads a weighted graph: a vertex-count header followed by `u v [w]` lines.
///
/// Repeated and reversed pairs are merged by summing their weights, a missing
/// weight counts as `1`, and self-loops are dropped. Edges enter the graph by
/// ascending lower endpoint; each vertex lists its higher neighbours in the
/// order they first appeared in the input.
///
/// # Errors
/// Returns [`TextProviderError::EmptyInput`] or
/// [`TextProviderError::MissingHeader`] for a missing vertex count,
/// [`TextProviderError::Parse`] for malformed edge lines and
/// [`TextProviderError::Graph`] when a merged weight is negative or not
/// finite.
///
/// # Examples
/// ```
/// use whakaaro_providers_text::read_graph;
///
/// let graph = read_graph("3\n0 1 2.0\n1 0\n1 2\n".as_bytes())?;
/// assert_eq!(graph.num_edges(), 2);
/// assert_eq!(graph.total_edge_weight(), 4.0);
/// # Ok::<(), whakaaro_providers_text::TextProviderError>(())
/// ```
pub fn read_graph<R: BufRead>(reader: R) -> Result<WeightedGraph> {
    let mut lines = Lines::new(reader);
    let num_vertices = lines.header()?;
    let mut merged: HashMap<(usize, usize), f64> = HashMap::new();
    let mut first_seen: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];
    let mut self_loops = 0_usize;
    while let Some((line, text)) = lines.next_line()? {
        if text.trim().is_empty() {
            continue;
        }
        let mut parts = fields(&text);
        let (left, right) = parse_endpoints(&mut parts, line, num_vertices)?;
        let weight = match parts.next() {
            Some(raw) => parse_field(Some(raw), line, "edge weight")?,
            None => 1.0,
        };
        if left == right {
            self_loops += 1;
            continue;
        }
        *merged
            .entry((left.min(right), left.max(right)))
            .or_insert_with(|| {
                for (from, to) in [(left, right), (right, left)] {
                    if let Some(adjacent) = first_seen.get_mut(from) {
                        adjacent.push(to);
                    }
                }
                0.0
            }) += weight;
    }
    if self_loops > 0 {
        debug!(self_loops, "dropped self-loops while reading graph");
    }

    // Lower endpoints insert in ascending order, each walking its upper
    // neighbours in first-seen order.
    let mut builder = GraphBuilder::new(num_vertices);
    for (vertex, adjacent) in first_seen.iter().enumerate() {
        for &neighbor in adjacent.iter().filter(|&&neighbor| vertex < neighbor) {
            let weight = merged.get(&(vertex, neighbor)).copied().unwrap_or(0.0);
            builder.add_edge(WeightedEdge::new(vertex, neighbor, weight))?;
        }
    }
    Ok(builder.build())
}

/// Reads one opinion per line, ignoring blank lines.
///
/// # Errors
/// Returns [`TextProviderError::Parse`] for a line that is not a number.
pub fn read_opinions<R: BufRead>(reader: R) -> Result<Vec<f64>> {
    let mut lines = Lines::new(reader);
    let mut opinions = Vec::new();
    while let Some((line, text)) = lines.next_line()? {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        opinions.push(parse_field(Some(trimmed), line, "opinion")?);
    }
    Ok(opinions)
}

/// Reads `name value` measure lines up to the first blank line.
///
/// Names are measure keys such as `ac` or `ad`; unknown names are skipped
/// with a warning.
///
/// # Errors
/// Returns [`TextProviderError::Parse`] when a known measure lacks a numeric
/// value.
///
/// # Examples
/// ```
/// use whakaaro_core::Measure;
/// use whakaaro_providers_text::read_measures;
///
/// let truth = read_measures("ac 2.5\nad 0.75\n\nac 99\n".as_bytes())?;
/// assert_eq!(truth.get(Measure::Controversy), Some(2.5));
/// assert_eq!(truth.len(), 2);
/// # Ok::<(), whakaaro_providers_text::TextProviderError>(())
/// ```
pub fn read_measures<R: BufRead>(reader: R) -> Result<GroundTruth> {
    let mut lines = Lines::new(reader);
    let mut truth = GroundTruth::default();
    while let Some((line, text)) = lines.next_line()? {
        let mut parts = fields(&text);
        let Some(name) = parts.next() else {
            break;
        };
        let measure = match name.parse::<Measure>() {
            Ok(measure) => measure,
            Err(err) => {
                warn!(line, %err, "skipping unknown measure");
                continue;
            }
        };
        let value = parse_field(parts.next(), line, "measure value")?;
        truth.insert(measure, value);
    }
    Ok(truth)
}

/// Reads a graph file as an unweighted edge list, ignoring weights.
///
/// Pairs are kept as written: `(u, v)` and `(v, u)` are distinct entries,
/// while exact repeats are dropped.
///
/// # Errors
/// Returns the header errors of [`read_graph`] and
/// [`TextProviderError::Parse`] for malformed edge lines.
pub fn read_edge_list<R: BufRead>(reader: R) -> Result<EdgeList> {
    let mut lines = Lines::new(reader);
    let num_vertices = lines.header()?;
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    while let Some((line, text)) = lines.next_line()? {
        if text.trim().is_empty() {
            continue;
        }
        let pair = parse_endpoints(&mut fields(&text), line, num_vertices)?;
        if seen.insert(pair) {
            edges.push(pair);
        }
    }
    Ok(EdgeList {
        num_vertices,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "EmptyInput")]
    #[case("three\n0 1\n", "MissingHeader")]
    #[case("2\n0\n", "Parse")]
    #[case("2\n0 2\n", "Parse")]
    #[case("2\n0 1 heavy\n", "Parse")]
    fn malformed_graphs_are_rejected(#[case] raw: &str, #[case] expected: &str) {
        let err = read_graph(raw.as_bytes()).expect_err("input is malformed");
        let variant = match err {
            TextProviderError::EmptyInput => "EmptyInput",
            TextProviderError::MissingHeader { .. } => "MissingHeader",
            TextProviderError::Parse { .. } => "Parse",
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(variant, expected);
    }

    #[test]
    fn negative_merged_weights_surface_as_graph_errors() {
        let err = read_graph("2\n0 1 -3\n".as_bytes()).expect_err("negative weight");
        assert!(matches!(err, TextProviderError::Graph(_)));
    }

    #[rstest]
    #[case("4\n0 3\n0 1\n2 0\n", 0, &[3, 1, 2])]
    #[case("4\n2 3\n0 3\n", 3, &[0, 2])]
    #[case("4\n1 3 0.5\n3 1 0.5\n0 3\n", 3, &[0, 1])]
    fn neighbours_follow_first_seen_order(
        #[case] raw: &str,
        #[case] vertex: usize,
        #[case] expected: &[usize],
    ) {
        let graph = read_graph(raw.as_bytes()).expect("graph parses");
        assert_eq!(graph.neighbors(vertex).expect("vertex exists"), expected);
    }

    #[test]
    fn commas_and_spaces_both_separate_fields() {
        let graph = read_graph("3\n0,1,0.5\n1 2\n".as_bytes()).expect("graph parses");
        assert_eq!(graph.num_edges(), 2);
        assert!((graph.total_edge_weight() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn parse_errors_report_the_line_number() {
        let err = read_opinions("0.1\n\nnope\n".as_bytes()).expect_err("bad opinion");
        assert!(matches!(err, TextProviderError::Parse { line: 3, .. }));
    }

    #[test]
    fn known_measures_need_values() {
        let err = read_measures("ad\n".as_bytes()).expect_err("missing value");
        assert!(matches!(err, TextProviderError::Parse { line: 1, .. }));
    }
}
