//! Shared fixtures for the unit tests.

use itertools::Itertools;

use crate::{edge::EdgeTable, graph::Graph, node::NodeTable};

/// Builds an undirected keyed graph from paths of node keys, each consecutive pair becomes an
/// edge. Nodes are ordered by first appearance.
macro_rules! graph {
    ($($path:expr),*) => {
        $crate::test_utils::from_paths(&[$(&$path[..]),*], false)
    };
}

pub(crate) use graph;

pub(crate) fn from_paths(paths: &[&[&str]], directed: bool) -> Graph {
    let pairs: Vec<(&str, &str)> = paths
        .iter()
        .flat_map(|path| path.windows(2).map(|pair| (pair[0], pair[1])))
        .collect();
    let keys: Vec<&str> = paths.iter().flat_map(|path| path.iter().copied()).unique().collect();

    Graph::construct(NodeTable::keyed(keys), EdgeTable::from_pairs(pairs), directed).unwrap()
}

/// Six nodes `A`-`F` in two triangles joined by the `C`-`D` bridge, identified by position and
/// weighted.
pub(crate) fn running_example() -> Graph {
    let nodes = NodeTable::with_len(6)
        .with_column("labels", ["A", "B", "C", "D", "E", "F"])
        .unwrap();
    let edges = EdgeTable::from_pairs([(1, 2), (1, 3), (2, 3), (3, 4), (4, 5), (4, 6), (5, 6)])
        .with_column("weight", [1.0, 0.5, 1.0, 2.0, 1.0, 0.5, 1.0])
        .unwrap();

    Graph::construct(nodes, edges, false).unwrap()
}

/// A star: one center (position 1) and `leaves` leaves.
pub(crate) fn star(leaves: usize, weight: f64) -> Graph {
    let edges = EdgeTable::from_pairs((2..=leaves + 1).map(|leaf| (1usize, leaf)))
        .with_column("weight", vec![weight; leaves])
        .unwrap();

    Graph::construct(NodeTable::with_len(leaves + 1), edges, false).unwrap()
}

/// Checks every edge endpoint resolves to a live node.
pub(crate) fn assert_referential_integrity(graph: &Graph) {
    let edges = graph.edges();
    for (from, to) in edges.from().iter().zip(edges.to()) {
        assert!(graph.position(from).is_some(), "dangling endpoint {from}");
        assert!(graph.position(to).is_some(), "dangling endpoint {to}");
    }
}
