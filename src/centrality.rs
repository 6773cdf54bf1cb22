//! A module for node centrality measures.
//!
//! Each measure is a factory returning a column computer that can be handed straight to
//! [`ActiveView::mutate`](crate::view::ActiveView::mutate) on the nodes table. Columns follow
//! node order.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
};

use nalgebra::DVector;
use tracing::warn;

use crate::{
    error::Result,
    graph::{sorted_eigenvalue_vector_pairs, Graph},
    value::{ColumnValues, Value},
};

/// Which incident edges count towards a node in a directed graph. Undirected graphs always count
/// every incident edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Edges leaving the node.
    Out,
    /// Edges entering the node.
    In,
    /// Both, a self-loop counts twice.
    #[default]
    All,
}

/// Counts the edges incident to each node.
///
/// # Examples
///
/// ```
/// use tablegraph::centrality::{degree, Mode};
/// use tablegraph::edge::EdgeTable;
/// use tablegraph::graph::Graph;
/// use tablegraph::node::NodeTable;
/// use tablegraph::value::Value;
///
/// let graph = Graph::construct(NodeTable::with_len(3), EdgeTable::from_pairs([(1, 2), (1, 3)]), true).unwrap();
///
/// assert_eq!(degree(Mode::Out)(&graph).unwrap(), vec![Value::Int(2), Value::Int(0), Value::Int(0)]);
/// assert_eq!(degree(Mode::In)(&graph).unwrap(), vec![Value::Int(0), Value::Int(1), Value::Int(1)]);
/// ```
pub fn degree(mode: Mode) -> impl Fn(&Graph) -> Result<ColumnValues> {
    move |graph: &Graph| -> Result<ColumnValues> {
        Ok(incident_sums(graph, None, mode)
            .into_iter()
            .map(|count| Value::Int(count as i64))
            .collect())
    }
}

/// Sums a numeric edge column over the edges incident to each node.
pub fn strength(weight: &str, mode: Mode) -> impl Fn(&Graph) -> Result<ColumnValues> {
    let weight = weight.to_owned();

    move |graph: &Graph| -> Result<ColumnValues> {
        let weights = graph.edge_weights(&weight)?;

        Ok(incident_sums(graph, Some(weights.as_slice()), mode)
            .into_iter()
            .map(Value::Float)
            .collect())
    }
}

/// Shortest-path betweenness of each node, optionally using an edge column as path length.
///
/// Undirected graphs count each pair of endpoints once. When normalised, the scores are divided
/// by the number of pairs not involving the node.
pub fn betweenness(
    weight: Option<&str>,
    normalized: bool,
) -> impl Fn(&Graph) -> Result<ColumnValues> {
    let weight = weight.map(str::to_owned);

    move |graph: &Graph| -> Result<ColumnValues> {
        let weights = match &weight {
            Some(column) => Some(graph.non_negative_edge_weights(column)?),
            None => None,
        };

        Ok(compute_betweenness(graph, weights.as_deref(), normalized)
            .into_iter()
            .map(Value::Float)
            .collect())
    }
}

/// Closeness of each node: the inverse of the summed hop distance to every node it can reach.
/// Nodes reaching nothing score 0. Directed graphs follow outgoing edges.
///
/// When normalised, the score is multiplied by the number of reachable nodes.
pub fn closeness(normalized: bool) -> impl Fn(&Graph) -> Result<ColumnValues> {
    move |graph: &Graph| -> Result<ColumnValues> {
        let adjacency = graph.adjacency_lists(None, false);

        Ok((0..graph.node_count())
            .map(|index| {
                let (total, reached) = closeness_for_node(index, &adjacency);

                if total == 0 {
                    return Value::Float(0.0);
                }

                let score = 1.0 / total as f64;
                Value::Float(if normalized {
                    score * reached as f64
                } else {
                    score
                })
            })
            .collect())
    }
}

/// Eigenvector centrality of the undirected view, scaled so the most central node scores 1.
///
/// Each connected component is solved on its own. Its scores are scaled by its own largest
/// component and then by the ratio of its principal eigenvalue to the largest one in the graph,
/// so identical components score identically and isolated nodes score 0. A graph without edges
/// scores every node 1.
///
/// # Examples
///
/// ```
/// use tablegraph::centrality::eigenvector;
/// use tablegraph::edge::EdgeTable;
/// use tablegraph::graph::Graph;
/// use tablegraph::node::NodeTable;
///
/// let graph = Graph::construct(NodeTable::with_len(3), EdgeTable::from_pairs([(1, 2), (1, 3)]), false).unwrap();
/// let scores: Vec<f64> = eigenvector()(&graph).unwrap().iter().filter_map(|v| v.as_f64()).collect();
///
/// assert!((scores[0] - 1.0).abs() < 1e-9);
/// assert!((scores[1] - 0.5f64.sqrt()).abs() < 1e-9);
/// ```
pub fn eigenvector() -> impl Fn(&Graph) -> Result<ColumnValues> {
    |graph: &Graph| -> Result<ColumnValues> {
        let n = graph.node_count();

        // Every node is equally central without edges.
        if graph.edge_positions().iter().all(|(from, to)| from == to) {
            return Ok(vec![Value::Float(1.0); n]);
        }

        let adjacency = graph.undirected_adjacency_matrix();
        let ascending = false;
        let principal: Vec<(Vec<usize>, f64, DVector<f64>)> = graph
            .connected_components()
            .into_iter()
            .filter_map(|members| {
                let block = adjacency.select_rows(&members).select_columns(&members);
                let (value, vector) = sorted_eigenvalue_vector_pairs(block, ascending)
                    .into_iter()
                    .next()?;
                Some((members, value, vector))
            })
            .collect();

        let highest = principal
            .iter()
            .map(|(_, value, _)| *value)
            .fold(0.0, f64::max);
        let mut scores = vec![0.0; n];

        for (members, value, vector) in principal {
            // The principal eigenvector of a connected block has components of a single sign,
            // scale by the largest magnitude to bring them into [0, 1].
            let max = vector.amax();
            let sign = if vector.sum() < 0.0 { -1.0 } else { 1.0 };
            let weight = value.max(0.0) / highest;

            for (member, component) in members.into_iter().zip(vector.iter()) {
                scores[member] = (sign * component / max).max(0.0) * weight;
            }
        }

        Ok(scores.into_iter().map(Value::Float).collect())
    }
}

//
// Helpers
//

fn incident_sums(graph: &Graph, weights: Option<&[f64]>, mode: Mode) -> Vec<f64> {
    let mut sums = vec![0.0; graph.node_count()];
    let mode = if graph.is_directed() { mode } else { Mode::All };

    for (edge, (from, to)) in graph.edge_positions().into_iter().enumerate() {
        let weight = weights.map_or(1.0, |w| w[edge]);

        if matches!(mode, Mode::Out | Mode::All) {
            sums[from] += weight;
        }
        if matches!(mode, Mode::In | Mode::All) {
            sums[to] += weight;
        }
    }

    sums
}

fn compute_betweenness(graph: &Graph, weights: Option<&[f64]>, normalized: bool) -> Vec<f64> {
    let num_nodes = graph.node_count();
    let adjacency = graph.adjacency_lists(weights, false);
    let mut betweenness_count: Vec<f64> = vec![0.0; num_nodes];

    for index in 0..num_nodes {
        match weights {
            Some(_) => weighted_betweenness_for_node(index, &adjacency, &mut betweenness_count),
            None => betweenness_for_node(index, &adjacency, &mut betweenness_count),
        }
    }

    let mut divisor = if graph.is_directed() { 1.0 } else { 2.0 };
    if normalized {
        if num_nodes < 3 {
            warn!(num_nodes, "too few nodes to normalise betweenness");
        } else {
            // The undirected halving and the pair count cancel out to (n - 1)(n - 2).
            divisor = ((num_nodes - 1) * (num_nodes - 2)) as f64;
        }
    }

    betweenness_count
        .into_iter()
        .map(|count| count / divisor)
        .collect()
}

/// Brandes' accumulation for a single source in an unweighted graph, see "A Faster Algorithm
/// for Betweenness Centrality", Algorithm 1.
fn betweenness_for_node(
    index: usize,
    adjacency: &[Vec<(usize, f64)>],
    betweenness_count: &mut [f64],
) {
    let num_nodes = adjacency.len();

    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    let mut distance: Vec<Option<usize>> = vec![None; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut stack: Vec<usize> = Vec::with_capacity(num_nodes);

    sigma[index] = 1.0;
    distance[index] = Some(0);
    queue.push_back(index);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        // SAFETY: every queued node has its distance set before being queued.
        let next = distance[v].unwrap() + 1;

        for &(w, _) in &adjacency[v] {
            if distance[w].is_none() {
                distance[w] = Some(next);
                queue.push_back(w);
            }
            if distance[w] == Some(next) {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    accumulate(index, stack, &predecessors, &sigma, betweenness_count);
}

/// The weighted variant of [`betweenness_for_node`], the search is Dijkstra's instead of a
/// breadth-first one.
fn weighted_betweenness_for_node(
    index: usize,
    adjacency: &[Vec<(usize, f64)>],
    betweenness_count: &mut [f64],
) {
    let num_nodes = adjacency.len();

    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    let mut distance: Vec<f64> = vec![f64::INFINITY; num_nodes];
    let mut settled: Vec<bool> = vec![false; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut heap = BinaryHeap::new();
    let mut stack: Vec<usize> = Vec::with_capacity(num_nodes);

    sigma[index] = 1.0;
    distance[index] = 0.0;
    heap.push(Candidate {
        distance: 0.0,
        node: index,
    });

    while let Some(Candidate { distance: d, node: v }) = heap.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        stack.push(v);

        for &(w, length) in &adjacency[v] {
            let candidate = d + length;

            if same_length(candidate, distance[w]) {
                if !settled[w] {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            } else if candidate < distance[w] {
                distance[w] = candidate;
                sigma[w] = sigma[v];
                predecessors[w] = vec![v];
                heap.push(Candidate {
                    distance: candidate,
                    node: w,
                });
            }
        }
    }

    accumulate(index, stack, &predecessors, &sigma, betweenness_count);
}

/// Back-propagates dependencies in order of non-increasing distance from the source.
fn accumulate(
    index: usize,
    mut stack: Vec<usize>,
    predecessors: &[Vec<usize>],
    sigma: &[f64],
    betweenness_count: &mut [f64],
) {
    let mut delta: Vec<f64> = vec![0.0; sigma.len()];

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != index {
            betweenness_count[w] += delta[w];
        }
    }
}

/// Path lengths are sums of floats, so ties are compared with a relative tolerance.
fn same_length(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-10 * a.abs().max(1.0)
}

/// A heap entry ordered so the closest node pops first.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    distance: f64,
    node: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Breadth-first search from `index`, returning the summed distance to and the number of the
/// other nodes reached.
fn closeness_for_node(index: usize, adjacency: &[Vec<(usize, f64)>]) -> (usize, usize) {
    let num_nodes = adjacency.len();

    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut deltas: Vec<Option<usize>> = vec![None; num_nodes];
    let (mut total, mut reached) = (0, 0);

    deltas[index] = Some(0);
    queue.push_back(index);

    while let Some(current) = queue.pop_front() {
        // SAFETY: every queued node has its delta set before being queued.
        let next = deltas[current].unwrap() + 1;

        for &(neighbour, _) in &adjacency[current] {
            if deltas[neighbour].is_none() {
                deltas[neighbour] = Some(next);
                queue.push_back(neighbour);
                total += next;
                reached += 1;
            }
        }
    }

    (total, reached)
}
