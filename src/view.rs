//! A module for the table-scoped pipeline operators.
//!
//! A graph is activated on one of its tables, and the next operator (filter, select or mutate)
//! applies to that table only:
//!
//! ```rust
//! use tablegraph::edge::EdgeTable;
//! use tablegraph::graph::Graph;
//! use tablegraph::node::NodeTable;
//! use tablegraph::table::Table;
//! use tablegraph::value::Value;
//!
//! let nodes = NodeTable::keyed(["a", "b", "c"])
//!     .with_column("labels", ["A", "B", "C"])
//!     .unwrap();
//! let edges = EdgeTable::from_pairs([("a", "b"), ("b", "c")]);
//! let graph = Graph::construct(nodes, edges, false).unwrap();
//!
//! // Dropping node `c` also drops the edge that touches it.
//! let graph = graph
//!     .activate(Table::Nodes)
//!     .try_filter(|row| Ok(row.try_get("labels")? != Value::from("C")))
//!     .unwrap();
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::{
    error::Result,
    graph::Graph,
    node::NodeId,
    table::{Row, Table},
    value::ColumnValues,
};

/// A graph paired with the table the next operator targets.
///
/// The view borrows the graph, so every operator leaves it untouched and returns a new graph.
#[derive(Clone, Copy, Debug)]
pub struct ActiveView<'a> {
    graph: &'a Graph,
    table: Table,
}

impl<'a> ActiveView<'a> {
    pub(crate) fn new(graph: &'a Graph, table: Table) -> Self {
        Self { graph, table }
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    /// The active table.
    pub fn table(&self) -> Table {
        self.table
    }

    /// Switches the active table. Views don't stack, the previous selection is dropped.
    pub fn activate(self, table: Table) -> Self {
        Self { table, ..self }
    }

    /// Keeps the rows of the active table for which `predicate` holds.
    ///
    /// Removing nodes removes every edge incident to them. Surviving nodes keep their identity.
    ///
    /// [`Row::get`] returns `None` for a column the table doesn't have, so a misspelt column name
    /// in `predicate` goes unnoticed. Use [`ActiveView::try_filter`] with [`Row::try_get`] to have
    /// unknown columns reported as errors.
    pub fn filter<F>(&self, predicate: F) -> Graph
    where
        F: Fn(&Row<'_>) -> bool,
    {
        let keep: Vec<bool> = match self.table {
            Table::Nodes => self.graph.nodes().rows().map(|row| predicate(&row)).collect(),
            Table::Edges => self.graph.edges().rows().map(|row| predicate(&row)).collect(),
        };

        self.retain(keep)
    }

    /// Like [`ActiveView::filter`], with a fallible predicate. The first error aborts the
    /// filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::NodeTable;
    /// use tablegraph::table::Table;
    ///
    /// let graph = Graph::construct(NodeTable::with_len(2), EdgeTable::from_pairs([(1, 2)]), false).unwrap();
    ///
    /// // The edges have no `weight` column.
    /// let result = graph
    ///     .activate(Table::Edges)
    ///     .try_filter(|row| Ok(row.try_get("weight")?.as_f64() > Some(1.0)));
    /// assert!(result.is_err());
    /// ```
    pub fn try_filter<F>(&self, predicate: F) -> Result<Graph>
    where
        F: Fn(&Row<'_>) -> Result<bool>,
    {
        let keep = match self.table {
            Table::Nodes => self
                .graph
                .nodes()
                .rows()
                .map(|row| predicate(&row))
                .collect::<Result<Vec<bool>>>()?,
            Table::Edges => self
                .graph
                .edges()
                .rows()
                .map(|row| predicate(&row))
                .collect::<Result<Vec<bool>>>()?,
        };

        Ok(self.retain(keep))
    }

    /// Projects the active table down to its identity columns and `columns`, in the given order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Graph> {
        let mut graph = self.graph.clone();

        match self.table {
            Table::Nodes => *graph.nodes_mut() = self.graph.nodes().project(columns)?,
            Table::Edges => *graph.edges_mut() = self.graph.edges().project(columns)?,
        }

        Ok(graph)
    }

    /// Adds or overwrites the column `name` on the active table with the values computed from
    /// the whole graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::centrality::{degree, Mode};
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::NodeTable;
    /// use tablegraph::table::Table;
    /// use tablegraph::value::Value;
    ///
    /// let graph = Graph::construct(NodeTable::with_len(3), EdgeTable::from_pairs([(1, 2), (1, 3)]), false).unwrap();
    /// let graph = graph.activate(Table::Nodes).mutate("degree", degree(Mode::All)).unwrap();
    ///
    /// assert_eq!(graph.nodes().column("degree").unwrap().values()[0], Value::Int(2));
    /// ```
    pub fn mutate<F>(&self, name: &str, compute: F) -> Result<Graph>
    where
        F: FnOnce(&Graph) -> Result<ColumnValues>,
    {
        let values = compute(self.graph)?;
        let mut graph = self.graph.clone();

        match self.table {
            Table::Nodes => graph.nodes_mut().set_column(name, values)?,
            Table::Edges => graph.edges_mut().set_column(name, values)?,
        }

        Ok(graph)
    }

    //
    // Private
    //

    fn retain(&self, keep: Vec<bool>) -> Graph {
        let mut graph = self.graph.clone();

        match self.table {
            Table::Nodes => {
                let removed: HashSet<&NodeId> = self
                    .graph
                    .nodes()
                    .ids()
                    .iter()
                    .zip(&keep)
                    .filter(|(_, keep)| !**keep)
                    .map(|(id, _)| id)
                    .collect();

                // Cascade: edges touching a removed node go with it.
                let edges = self.graph.edges();
                let keep_edges: Vec<bool> = (0..edges.len())
                    .map(|row| match edges.endpoints(row) {
                        Some((from, to)) => !removed.contains(from) && !removed.contains(to),
                        None => false,
                    })
                    .collect();

                debug!(
                    removed_nodes = removed.len(),
                    removed_edges = keep_edges.iter().filter(|keep| !**keep).count(),
                    "filtered nodes"
                );

                graph.nodes_mut().retain(&keep);
                graph.edges_mut().retain(&keep_edges);
                graph.reindex();
            }
            Table::Edges => {
                debug!(
                    removed_edges = keep.iter().filter(|keep| !**keep).count(),
                    "filtered edges"
                );

                graph.edges_mut().retain(&keep);
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        centrality::{degree, Mode},
        edge::EdgeTable,
        error::GraphError,
        node::NodeTable,
        test_utils::{assert_referential_integrity, graph, running_example},
        value::Value,
    };

    fn labels(graph: &Graph) -> Vec<String> {
        graph
            .nodes()
            .column("labels")
            .unwrap()
            .values()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn reactivation_replaces() {
        let graph = running_example();
        let view = graph.activate(Table::Nodes).activate(Table::Edges);

        assert_eq!(view.table(), Table::Edges);
    }

    #[test]
    fn filter_nodes_cascades() {
        let graph = running_example();
        // Node C (3) touches three edges: A-C, B-C and C-D.
        let filtered = graph
            .activate(Table::Nodes)
            .filter(|row| row.get("labels") != Some(Value::from("C")));

        assert_eq!(filtered.node_count(), 5);
        assert_eq!(filtered.edge_count(), 7 - 3);
        assert_eq!(labels(&filtered), vec!["A", "B", "D", "E", "F"]);
        assert!(!filtered.edges().from().contains(&NodeId::Ordinal(3)));
        assert!(!filtered.edges().to().contains(&NodeId::Ordinal(3)));
        assert_referential_integrity(&filtered);

        // No renumbering of the survivors.
        assert_eq!(filtered.nodes().ids()[2], NodeId::Ordinal(4));
        assert_eq!(filtered.position(&NodeId::Ordinal(4)), Some(2));

        // The source graph is untouched.
        assert_eq!(graph, running_example());
    }

    #[test]
    fn filter_nodes_keeps_unrelated_edge_order() {
        let (a, b, c, d) = ("a", "b", "c", "d");
        let graph = graph!([a, b, c, d], [d, a]);

        let filtered = graph
            .activate(Table::Nodes)
            .filter(|row| row.node_id() != Some(&NodeId::from("b")));

        assert_eq!(
            filtered.edges().from(),
            &[NodeId::from("c"), NodeId::from("d")]
        );
        assert_eq!(filtered.edges().to(), &[NodeId::from("d"), NodeId::from("a")]);
    }

    #[test]
    fn filter_edges_leaves_nodes() {
        let graph = running_example();
        let filtered = graph
            .activate(Table::Edges)
            .filter(|row| row.number("weight") >= Some(1.0));

        assert_eq!(filtered.node_count(), 6);
        assert_eq!(filtered.edge_count(), 5);
        assert_eq!(filtered.nodes(), graph.nodes());
    }

    #[test]
    fn try_filter_unknown_column() {
        let graph = running_example();
        let err = graph
            .activate(Table::Nodes)
            .try_filter(|row| Ok(row.try_get("colour")? == Value::from("red")))
            .unwrap_err();

        assert!(matches!(
            err,
            GraphError::UnknownColumn { table: Table::Nodes, column } if column == "colour"
        ));
    }

    #[test]
    fn misspelt_column() {
        let graph = running_example();

        // `label` instead of `labels`: every row reads as absent and is kept.
        let unchecked = graph
            .activate(Table::Nodes)
            .filter(|row| row.get("label") != Some(Value::from("C")));
        assert_eq!(unchecked, graph);

        let err = graph
            .activate(Table::Nodes)
            .try_filter(|row| Ok(row.try_get("label")? != Value::from("C")))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownColumn { table: Table::Nodes, column } if column == "label"
        ));

        let checked = graph
            .activate(Table::Nodes)
            .try_filter(|row| Ok(row.try_get("labels")? != Value::from("C")))
            .unwrap();
        assert_eq!(checked.node_count(), 5);
    }

    #[test]
    fn select_keeps_identity() {
        let graph = running_example()
            .activate(Table::Nodes)
            .mutate("degree", degree(Mode::All))
            .unwrap();

        let selected = graph.activate(Table::Nodes).select(&["degree"]).unwrap();
        assert_eq!(
            selected.nodes().columns().names().collect::<Vec<_>>(),
            vec!["degree"]
        );
        assert_eq!(selected.nodes().ids(), graph.nodes().ids());
        assert_eq!(selected.edges(), graph.edges());

        // Edges still resolve, so the graph keeps working downstream.
        let rebound = selected
            .bind_edges(EdgeTable::from_pairs([(6, 1)]))
            .unwrap();
        assert_referential_integrity(&rebound);
    }

    #[test]
    fn select_keeps_keys() {
        let nodes = NodeTable::keyed(["a", "b", "c"])
            .with_column("x", [1, 2, 3])
            .unwrap()
            .with_column("y", ["p", "q", "r"])
            .unwrap();
        let graph =
            Graph::construct(nodes, EdgeTable::from_pairs([("a", "b")]), false).unwrap();

        let selected = graph.activate(Table::Nodes).select(&["x"]).unwrap();
        assert!(selected.nodes().is_keyed());
        assert_eq!(
            selected.nodes().ids(),
            &[NodeId::from("a"), NodeId::from("b"), NodeId::from("c")]
        );
        assert_eq!(
            selected.nodes().columns().names().collect::<Vec<_>>(),
            vec!["x"]
        );

        // Keys still resolve edges after the projection.
        let rebound = selected
            .bind_edges(EdgeTable::from_pairs([("b", "c"), ("c", "a")]))
            .unwrap();
        assert_eq!(rebound.edge_count(), 3);
        assert_eq!(rebound.edge_positions()[2], (2, 0));
        assert_referential_integrity(&rebound);
    }

    #[test]
    fn select_edges() {
        let graph = running_example();
        let selected = graph
            .activate(Table::Edges)
            .select(&["from", "to"])
            .unwrap();

        assert!(selected.edges().columns().is_empty());
        assert_eq!(selected.edges().from(), graph.edges().from());

        let err = graph.activate(Table::Edges).select(&["labels"]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownColumn { table: Table::Edges, .. }));
    }

    #[test]
    fn mutate_overwrites_in_place() {
        let graph = running_example();
        let mutated = graph
            .activate(Table::Nodes)
            .mutate("labels", |g| {
                Ok((0..g.node_count()).map(|i| Value::from(i as i64)).collect())
            })
            .unwrap();

        assert_eq!(
            mutated.nodes().columns().names().collect::<Vec<_>>(),
            vec!["labels"]
        );
        assert_eq!(mutated.nodes().column("labels").unwrap().values()[5], Value::Int(5));
    }

    #[test]
    fn mutate_length_mismatch_leaves_graph() {
        let graph = running_example();

        for len in [5, 7] {
            let err = graph
                .activate(Table::Nodes)
                .mutate("score", |_| Ok(vec![Value::Int(1); len]))
                .unwrap_err();

            assert!(matches!(
                err,
                GraphError::ColumnLengthMismatch { expected: 6, actual, .. } if actual == len
            ));
        }

        assert!(graph.nodes().column("score").is_none());
        assert_eq!(graph, running_example());
    }

    #[test]
    fn mutate_identity_column() {
        let graph = running_example();
        let err = graph
            .activate(Table::Edges)
            .mutate("to", |g| Ok(vec![Value::Int(1); g.edge_count()]))
            .unwrap_err();

        assert!(matches!(err, GraphError::ReservedColumn { .. }));
    }

    #[test]
    fn mutate_sees_whole_graph() {
        let graph = running_example();
        // Edge-scoped column computed from node-level topology.
        let mutated = graph
            .activate(Table::Edges)
            .mutate("span", |g| {
                Ok(g.edge_positions()
                    .into_iter()
                    .map(|(from, to)| Value::from(to.abs_diff(from)))
                    .collect())
            })
            .unwrap();

        assert_eq!(mutated.edges().column("span").unwrap().values()[0], Value::Int(1));
    }

    #[test]
    fn round_trip() {
        let graph = running_example();

        let grown = graph
            .bind_nodes(NodeTable::with_len(1).with_column("labels", ["G"]).unwrap())
            .unwrap()
            .bind_edges(
                EdgeTable::from_pairs([(1, 7), (3, 7)])
                    .with_column("weight", [0.5, 1.0])
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(grown.node_count(), 7);
        assert_eq!(grown.edge_count(), 9);

        let g = NodeId::Ordinal(7);
        let shrunk = grown
            .activate(Table::Edges)
            .filter(|row| !row.touches(&g))
            .activate(Table::Nodes)
            .filter(|row| row.get("labels") != Some(Value::from("G")));

        assert_eq!(shrunk, graph);
    }

    #[test]
    fn round_trip_by_cascade() {
        let graph = running_example();
        let grown = graph
            .bind_nodes(NodeTable::with_len(1).with_column("labels", ["G"]).unwrap())
            .unwrap()
            .bind_edges(
                EdgeTable::from_pairs([(1, 7), (3, 7)])
                    .with_column("weight", [0.5, 1.0])
                    .unwrap(),
            )
            .unwrap();

        // Removing the node alone takes its edges with it.
        let shrunk = grown
            .activate(Table::Nodes)
            .filter(|row| row.node_id() != Some(&NodeId::Ordinal(7)));

        assert_eq!(shrunk, graph);
    }

    //
    // Properties
    //

    use proptest::{collection::vec, prelude::*};

    #[derive(Clone, Debug)]
    enum Op {
        FilterNodes(Vec<bool>),
        FilterEdges(Vec<bool>),
        SelectNodes,
        BindNodes(usize),
        /// Rebinds a live node, only keyed graphs can collide.
        BindExisting(usize),
        /// Endpoints index into the live nodes, modulo their count.
        BindEdges(Vec<(usize, usize)>),
    }

    fn arb_graph() -> impl Strategy<Value = Graph> {
        (1usize..10, any::<bool>())
            .prop_flat_map(|(n, keyed)| (Just(n), Just(keyed), vec((1..=n, 1..=n), 0..20)))
            .prop_map(|(n, keyed, pairs)| {
                let (nodes, edges) = if keyed {
                    let key = |i: usize| format!("n{i}");
                    (
                        NodeTable::keyed((1..=n).map(key)),
                        EdgeTable::from_pairs(pairs.into_iter().map(|(a, b)| (key(a), key(b)))),
                    )
                } else {
                    (NodeTable::with_len(n), EdgeTable::from_pairs(pairs))
                };
                let nodes = nodes.with_column("x", 0..n).unwrap();

                Graph::construct(nodes, edges, false).unwrap()
            })
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            vec(any::<bool>(), 0..12).prop_map(Op::FilterNodes),
            vec(any::<bool>(), 0..24).prop_map(Op::FilterEdges),
            Just(Op::SelectNodes),
            (0usize..4).prop_map(Op::BindNodes),
            (0usize..16).prop_map(Op::BindExisting),
            vec((0usize..32, 0usize..32), 0..6).prop_map(Op::BindEdges),
        ]
    }

    fn mask(keep: &[bool], position: usize) -> bool {
        keep.get(position).copied().unwrap_or(true)
    }

    /// Applies `op` as the `step`-th operator, `step` keeps freshly bound keys unique.
    fn apply(graph: &Graph, op: &Op, step: usize) -> Graph {
        match op {
            Op::FilterNodes(keep) => graph
                .activate(Table::Nodes)
                .filter(|row| mask(keep, row.position())),
            Op::FilterEdges(keep) => graph
                .activate(Table::Edges)
                .filter(|row| mask(keep, row.position())),
            Op::SelectNodes => graph
                .activate(Table::Nodes)
                .select(&[] as &[&str])
                .unwrap(),
            Op::BindNodes(count) => {
                let nodes = if graph.nodes().is_keyed() {
                    NodeTable::keyed((0..*count).map(|i| format!("s{step}-{i}")))
                } else {
                    NodeTable::with_len(*count)
                };
                graph.bind_nodes(nodes).unwrap()
            }
            Op::BindExisting(i) => {
                let ids = graph.nodes().ids();
                if ids.is_empty() || !graph.nodes().is_keyed() {
                    return graph.clone();
                }
                let id = ids[i % ids.len()].clone();
                let err = graph.bind_nodes(NodeTable::keyed([id.to_string()])).unwrap_err();
                assert!(matches!(
                    err,
                    GraphError::DuplicateKey { key } if NodeId::from(key.as_str()) == id
                ));
                graph.clone()
            }
            Op::BindEdges(pairs) => {
                let ids = graph.nodes().ids();
                if ids.is_empty() {
                    return graph.clone();
                }
                let pairs = pairs
                    .iter()
                    .map(|(a, b)| (ids[a % ids.len()].clone(), ids[b % ids.len()].clone()));
                graph.bind_edges(EdgeTable::from_pairs(pairs)).unwrap()
            }
        }
    }

    proptest! {
        #[test]
        fn operators_keep_referential_integrity(
            graph in arb_graph(),
            ops in vec(arb_op(), 0..12),
        ) {
            let mut graph = graph;
            let keyed = graph.nodes().is_keyed();
            for (step, op) in ops.iter().enumerate() {
                let before = graph.clone();
                let next = apply(&graph, op, step);

                assert_referential_integrity(&next);
                // The identity scheme survives every operator.
                prop_assert_eq!(next.nodes().is_keyed(), keyed);
                // The input is never touched.
                prop_assert_eq!(&graph, &before);
                graph = next;
            }
        }

        #[test]
        fn node_filter_removes_exactly_incident_edges(
            graph in arb_graph(),
            keep in vec(any::<bool>(), 0..10),
        ) {
            let removed: HashSet<&NodeId> = graph
                .nodes()
                .ids()
                .iter()
                .enumerate()
                .filter(|(position, _)| !mask(&keep, *position))
                .map(|(_, id)| id)
                .collect();
            let incident = graph
                .edges()
                .from()
                .iter()
                .zip(graph.edges().to())
                .filter(|(from, to)| removed.contains(from) || removed.contains(to))
                .count();

            let filtered = apply(&graph, &Op::FilterNodes(keep.clone()), 0);

            prop_assert_eq!(filtered.node_count(), graph.node_count() - removed.len());
            prop_assert_eq!(filtered.edge_count(), graph.edge_count() - incident);
        }
    }
}
