//! A module for grouping nodes into communities.
//!
//! Groupings are node columns of 1-based integer labels. Labels are ordered by community size,
//! so the largest community is always `1`; ties go to the community holding the earliest node.

use std::collections::HashMap;

use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::trace;

use crate::{
    config::LouvainConfig,
    error::{GraphError, Result},
    graph::Graph,
    table::Table,
    value::{ColumnValues, Value},
};

/// Louvain modularity optimisation on the undirected view of the graph, optionally weighted by
/// an edge column.
///
/// The node visiting order is shuffled with the configured seed, so a given seed always yields
/// the same partition.
///
/// # Examples
///
/// ```
/// use tablegraph::community::louvain;
/// use tablegraph::config::LouvainConfig;
/// use tablegraph::edge::EdgeTable;
/// use tablegraph::graph::Graph;
/// use tablegraph::node::NodeTable;
///
/// // Two triangles sharing a single bridge.
/// let edges = EdgeTable::from_pairs([(1, 2), (2, 3), (3, 1), (3, 4), (4, 5), (5, 6), (6, 4)]);
/// let graph = Graph::construct(NodeTable::with_len(6), edges, false).unwrap();
/// let labels = louvain(LouvainConfig::default(), None)(&graph).unwrap();
///
/// assert_eq!(labels[0], labels[2]);
/// assert_ne!(labels[2], labels[3]);
/// ```
pub fn louvain(
    config: LouvainConfig,
    weight: Option<&str>,
) -> impl Fn(&Graph) -> Result<ColumnValues> {
    let weight = weight.map(str::to_owned);

    move |graph: &Graph| -> Result<ColumnValues> {
        let weights = weight
            .as_deref()
            .map(|column| graph.non_negative_edge_weights(column))
            .transpose()?;
        let membership = Louvain::new(graph, weights.as_deref()).run(&config);

        Ok(relabel_by_size(&membership))
    }
}

/// Labels the connected components of the undirected view.
pub fn components() -> impl Fn(&Graph) -> Result<ColumnValues> {
    |graph: &Graph| -> Result<ColumnValues> {
        let mut membership = vec![0; graph.node_count()];
        for members in graph.connected_components() {
            for &member in &members {
                membership[member] = members[0];
            }
        }

        Ok(relabel_by_size(&membership))
    }
}

/// Scores the partition held in the node column `membership`:
///
/// ```text
/// Q = sum over communities c of [ in_c / 2m - γ (tot_c / 2m)² ]
/// ```
///
/// where `in_c` is the weight of edges inside `c` counted from both ends, `tot_c` the summed
/// degree of its nodes and `m` the total edge weight. Edges are read undirected.
pub fn modularity(
    graph: &Graph,
    membership: &str,
    weight: Option<&str>,
    resolution: f64,
) -> Result<f64> {
    let labels = graph
        .nodes()
        .column(membership)
        .ok_or_else(|| GraphError::unknown_column(Table::Nodes, membership))?
        .values();

    // Labels are compared by their text so integer and string groupings both work.
    let mut communities: HashMap<String, usize> = HashMap::new();
    let membership: Vec<usize> = labels
        .iter()
        .map(|label| {
            let next = communities.len();
            *communities.entry(label.to_string()).or_insert(next)
        })
        .collect();

    let weights = weight
        .map(|column| graph.edge_weights(column))
        .transpose()?;

    let mut inside = vec![0.0; communities.len()];
    let mut total = vec![0.0; communities.len()];
    let mut two_m = 0.0;

    for (edge, (from, to)) in graph.edge_positions().into_iter().enumerate() {
        let w = weights.as_ref().map_or(1.0, |weights| weights[edge]);

        total[membership[from]] += w;
        total[membership[to]] += w;
        two_m += 2.0 * w;

        if membership[from] == membership[to] {
            inside[membership[from]] += 2.0 * w;
        }
    }

    if two_m == 0.0 {
        return Ok(0.0);
    }

    Ok(inside
        .iter()
        .zip(&total)
        .map(|(inside, total)| inside / two_m - resolution * (total / two_m).powi(2))
        .sum())
}

//
// Helpers
//

/// Turns arbitrary community ids into 1-based labels, largest community first.
fn relabel_by_size(membership: &[usize]) -> ColumnValues {
    let sizes = membership.iter().copied().counts();
    let first_seen: HashMap<usize, usize> = membership
        .iter()
        .enumerate()
        .rev()
        .map(|(position, community)| (*community, position))
        .collect();

    let labels: HashMap<usize, i64> = sizes
        .keys()
        .sorted_by_key(|community| (std::cmp::Reverse(sizes[*community]), first_seen[*community]))
        .enumerate()
        .map(|(i, community)| (*community, i as i64 + 1))
        .collect();

    membership
        .iter()
        .map(|community| Value::Int(labels[community]))
        .collect()
}

/// The working state of one aggregation level: a weighted undirected graph whose nodes are the
/// communities of the level below.
struct Level {
    /// Weighted neighbours, self-loops excluded.
    neighbours: Vec<Vec<(usize, f64)>>,
    /// Weight of each node's self-loop, counted from both ends.
    loops: Vec<f64>,
    /// Weighted degree, self-loops counted twice.
    degree: Vec<f64>,
}

impl Level {
    fn len(&self) -> usize {
        self.degree.len()
    }
}

struct Louvain {
    level: Level,
    /// Community of every original node.
    membership: Vec<usize>,
    two_m: f64,
}

impl Louvain {
    fn new(graph: &Graph, weights: Option<&[f64]>) -> Self {
        let n = graph.node_count();
        let mut neighbours: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        let mut loops = vec![0.0; n];
        let mut degree = vec![0.0; n];

        for (edge, (from, to)) in graph.edge_positions().into_iter().enumerate() {
            let w = weights.map_or(1.0, |weights| weights[edge]);

            degree[from] += w;
            degree[to] += w;
            if from == to {
                loops[from] += 2.0 * w;
            } else {
                *neighbours[from].entry(to).or_default() += w;
                *neighbours[to].entry(from).or_default() += w;
            }
        }

        let two_m = degree.iter().sum();

        Self {
            level: Level {
                neighbours: neighbours.into_iter().map(sorted_neighbours).collect(),
                loops,
                degree,
            },
            membership: (0..n).collect(),
            two_m,
        }
    }

    fn run(mut self, config: &LouvainConfig) -> Vec<usize> {
        if self.two_m == 0.0 {
            return self.membership;
        }

        let mut rng = StdRng::seed_from_u64(config.seed);

        for depth in 0..config.max_levels {
            let (community, moved) = self.local_moving(config, &mut rng);
            if !moved {
                break;
            }

            let count = self.aggregate(&community);
            trace!(depth, communities = count, "louvain level");

            if count == 1 {
                break;
            }
        }

        self.membership
    }

    /// Greedily moves nodes to the neighbouring community with the best modularity gain until a
    /// sweep moves nothing. Returns the community of every node and whether any node moved.
    fn local_moving(&self, config: &LouvainConfig, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let level = &self.level;
        let n = level.len();

        let mut community: Vec<usize> = (0..n).collect();
        let mut total: Vec<f64> = level.degree.clone();
        let mut links: Vec<f64> = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut order: Vec<usize> = (0..n).collect();
        let mut moved_any = false;

        for _ in 0..config.max_sweeps {
            order.shuffle(rng);
            let mut moved = false;

            for &node in &order {
                let current = community[node];
                let k = level.degree[node];

                // Weight from `node` into each neighbouring community.
                for &(neighbour, w) in &level.neighbours[node] {
                    let c = community[neighbour];
                    if links[c] == 0.0 {
                        touched.push(c);
                    }
                    links[c] += w;
                }

                total[current] -= k;

                let gain = |c: usize, links: &[f64]| {
                    links[c] - config.resolution * total[c] * k / self.two_m
                };

                let mut best = current;
                let mut best_gain = gain(current, &links);
                for &c in &touched {
                    let g = gain(c, &links);
                    if g > best_gain + 1e-12 {
                        best = c;
                        best_gain = g;
                    }
                }

                total[best] += k;
                if best != current {
                    community[node] = best;
                    moved = true;
                }

                for c in touched.drain(..) {
                    links[c] = 0.0;
                }
            }

            if !moved {
                break;
            }
            moved_any = true;
        }

        (community, moved_any)
    }

    /// Collapses each community into a single node of the next level. Returns the number of
    /// communities.
    fn aggregate(&mut self, community: &[usize]) -> usize {
        // Compact ids in order of first appearance.
        let mut compact: HashMap<usize, usize> = HashMap::new();
        let ids: Vec<usize> = community
            .iter()
            .map(|c| {
                let next = compact.len();
                *compact.entry(*c).or_insert(next)
            })
            .collect();
        let count = compact.len();

        let mut neighbours: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
        let mut loops = vec![0.0; count];
        let mut degree = vec![0.0; count];

        for node in 0..self.level.len() {
            let c = ids[node];
            degree[c] += self.level.degree[node];
            loops[c] += self.level.loops[node];

            for &(neighbour, w) in &self.level.neighbours[node] {
                let d = ids[neighbour];
                if c == d {
                    // Seen from both ends, so the internal edge weighs twice in total.
                    loops[c] += w;
                } else {
                    *neighbours[c].entry(d).or_default() += w;
                }
            }
        }

        for member in &mut self.membership {
            *member = ids[*member];
        }

        self.level = Level {
            neighbours: neighbours.into_iter().map(sorted_neighbours).collect(),
            loops,
            degree,
        };

        count
    }
}

/// Neighbour lists are sorted so iteration order, and with it the result, only depends on the
/// seed.
fn sorted_neighbours(map: HashMap<usize, f64>) -> Vec<(usize, f64)> {
    map.into_iter().sorted_by_key(|(node, _)| *node).collect()
}
