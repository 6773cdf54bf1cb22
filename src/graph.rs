//! A module for working with graphs.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use tracing::debug;

use crate::{
    edge::EdgeTable,
    error::{GraphError, Result},
    node::{IdentityScheme, NodeId, NodeTable},
    table::{Table, FROM, TO},
    view::ActiveView,
};

/// A graph held as a node table and an edge table.
///
/// Every edge endpoint resolves to a live node identity at all times. Operations never modify a
/// graph in place: they borrow it and return a new, independent graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Graph {
    /// The node records.
    nodes: NodeTable,
    /// The edge records, endpoints are stored in their resolved form.
    edges: EdgeTable,
    /// Whether `(from, to)` is ordered.
    directed: bool,
    /// A mapping of node identities to their row position, used to resolve edge endpoints.
    index: HashMap<NodeId, usize>,
    /// Set for a graph made by [`Graph::empty`] until nodes are first bound. Any other graph has
    /// its identity scheme fixed, even once filtered down to no nodes.
    unbound: bool,
}

impl Graph {
    /// Builds a graph from a node table and an edge table.
    ///
    /// If the nodes carry keys, every edge endpoint is looked up by key. Otherwise endpoints are
    /// 1-based positions into the node table.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::NodeTable;
    ///
    /// let nodes = NodeTable::with_len(3);
    /// let edges = EdgeTable::from_pairs([(1, 2), (2, 3)]);
    /// let graph = Graph::construct(nodes, edges, false).unwrap();
    /// assert_eq!(graph.edge_count(), 2);
    ///
    /// // Position 4 doesn't exist.
    /// let nodes = NodeTable::with_len(3);
    /// let edges = EdgeTable::from_pairs([(1, 4)]);
    /// assert!(Graph::construct(nodes, edges, false).is_err());
    /// ```
    pub fn construct(nodes: NodeTable, mut edges: EdgeTable, directed: bool) -> Result<Self> {
        let index = build_index(&nodes)?;
        resolve_endpoints(&mut edges, nodes.scheme(), &index, 0)?;

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            directed,
            "constructed graph"
        );

        Ok(Self {
            nodes,
            edges,
            directed,
            index,
            unbound: false,
        })
    }

    /// Creates an empty graph. The first non-empty node table bound to it sets the identity
    /// scheme.
    pub fn empty(directed: bool) -> Self {
        Self {
            nodes: NodeTable::default(),
            edges: EdgeTable::default(),
            directed,
            index: HashMap::new(),
            unbound: true,
        }
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Returns the node count of the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the edge count of the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of rows in one of the tables.
    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Nodes => self.node_count(),
            Table::Edges => self.edge_count(),
        }
    }

    /// Returns the row position of a node.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns the `(from, to)` node positions of every edge, in edge order.
    pub fn edge_positions(&self) -> Vec<(usize, usize)> {
        // The index holds every endpoint, this is checked whenever edges are added.
        self.edges
            .from()
            .iter()
            .zip(self.edges.to())
            .map(|(from, to)| (self.index[from], self.index[to]))
            .collect()
    }

    /// Computes the density of the graph, the ratio of edges with respect to the maximum possible
    /// edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::NodeTable;
    ///
    /// let graph = Graph::construct(NodeTable::with_len(3), EdgeTable::from_pairs([(1, 2)]), false).unwrap();
    /// assert_eq!(graph.density(), 1.0 / 3.0);
    /// ```
    pub fn density(&self) -> f64 {
        let vc = self.node_count() as f64;
        let ec = self.edge_count() as f64;

        // Calculate the total number of possible edges given a vertex count.
        let pec = if self.directed {
            vc * (vc - 1.0)
        } else {
            vc * (vc - 1.0) / 2.0
        };

        if pec == 0.0 {
            return 0.0;
        }
        ec / pec
    }

    /// Selects the table the next operator applies to.
    pub fn activate(&self, table: Table) -> ActiveView<'_> {
        ActiveView::new(self, table)
    }

    /// Like [`Graph::activate`], with the table given by name (`"nodes"` or `"edges"`).
    pub fn activate_named(&self, name: &str) -> Result<ActiveView<'_>> {
        Ok(self.activate(name.parse()?))
    }

    /// Appends nodes to the graph.
    ///
    /// New nodes must use the graph's identity scheme, which stays fixed once a graph has been
    /// constructed, even after every node is filtered away. Keys can't collide with existing
    /// ones, positional nodes are numbered after the highest live position.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::{NodeId, NodeTable};
    ///
    /// let graph = Graph::construct(NodeTable::with_len(2), EdgeTable::new(), false).unwrap();
    /// let graph = graph.bind_nodes(NodeTable::with_len(1)).unwrap();
    /// assert_eq!(graph.nodes().ids()[2], NodeId::Ordinal(3));
    /// ```
    pub fn bind_nodes(&self, mut nodes: NodeTable) -> Result<Self> {
        let mut graph = self.clone();

        if self.unbound {
            if !nodes.is_empty() {
                nodes.renumber_from(1);
                graph.nodes = nodes;
                graph.unbound = false;
            }
        } else {
            if nodes.scheme() != self.nodes.scheme() && !nodes.is_empty() {
                return Err(GraphError::IncompleteKeyColumn {
                    record: match self.nodes.scheme() {
                        // The first new record lacks the key the graph requires.
                        IdentityScheme::Keyed => self.node_count(),
                        // The graph's own records lack the key the new ones carry.
                        IdentityScheme::Ordinal => 0,
                    },
                });
            }

            let next = self
                .nodes
                .ids()
                .iter()
                .filter_map(NodeId::as_ordinal)
                .max()
                .unwrap_or(0)
                + 1;
            nodes.renumber_from(next);
            graph.nodes.append(nodes);
        }

        graph.index = build_index(&graph.nodes)?;

        debug!(
            added = graph.node_count() - self.node_count(),
            nodes = graph.node_count(),
            "bound nodes"
        );

        Ok(graph)
    }

    /// Appends edges to the graph, their endpoints must resolve against the current nodes.
    pub fn bind_edges(&self, mut edges: EdgeTable) -> Result<Self> {
        resolve_endpoints(
            &mut edges,
            self.nodes.scheme(),
            &self.index,
            self.edge_count(),
        )?;

        let mut graph = self.clone();
        graph.edges.append(edges);

        debug!(
            added = graph.edge_count() - self.edge_count(),
            edges = graph.edge_count(),
            "bound edges"
        );

        Ok(graph)
    }

    /// Constructs the adjacency matrix for this graph, rows and columns follow node order.
    ///
    /// Directed graphs count `from -> to` in row `from`, undirected graphs are symmetric.
    /// Self-loops are left out.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::dmatrix;
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::NodeTable;
    ///
    /// let graph = Graph::construct(NodeTable::with_len(3), EdgeTable::from_pairs([(1, 2), (1, 3)]), false).unwrap();
    ///
    /// assert_eq!(
    ///     graph.adjacency_matrix(),
    ///     dmatrix![0.0, 1.0, 1.0;
    ///              1.0, 0.0, 0.0;
    ///              1.0, 0.0, 0.0]
    /// );
    /// ```
    pub fn adjacency_matrix(&self) -> DMatrix<f64> {
        self.matrix(self.directed)
    }

    /// Constructs the degree matrix of the undirected view of this graph.
    pub fn degree_matrix(&self) -> DMatrix<f64> {
        let adjacency = self.matrix(false);
        let degrees = adjacency.column_sum();

        DMatrix::from_diagonal(&degrees)
    }

    /// Constructs the laplacian matrix of the undirected view of this graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::dmatrix;
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::node::NodeTable;
    ///
    /// let graph = Graph::construct(NodeTable::with_len(3), EdgeTable::from_pairs([(1, 2), (1, 3)]), false).unwrap();
    ///
    /// assert_eq!(
    ///     graph.laplacian_matrix(),
    ///     dmatrix![2.0, -1.0, -1.0;
    ///              -1.0, 1.0, 0.0;
    ///              -1.0, 0.0, 1.0]
    /// );
    /// ```
    pub fn laplacian_matrix(&self) -> DMatrix<f64> {
        self.degree_matrix() - self.matrix(false)
    }

    //
    // Crate-internal
    //

    pub(crate) fn nodes_mut(&mut self) -> &mut NodeTable {
        &mut self.nodes
    }

    pub(crate) fn edges_mut(&mut self) -> &mut EdgeTable {
        &mut self.edges
    }

    /// The symmetric adjacency matrix, whatever the graph's direction.
    pub(crate) fn undirected_adjacency_matrix(&self) -> DMatrix<f64> {
        self.matrix(false)
    }

    /// Rebuilds the identity index after nodes were removed. Removal can't introduce duplicates.
    pub(crate) fn reindex(&mut self) {
        self.index = self
            .nodes
            .ids()
            .iter()
            .enumerate()
            .map(|(position, id)| (id.clone(), position))
            .collect();
    }

    /// Reads a numeric edge column, one value per edge.
    pub(crate) fn edge_weights(&self, column: &str) -> Result<Vec<f64>> {
        let values = self
            .edges
            .column(column)
            .ok_or_else(|| GraphError::unknown_column(Table::Edges, column))?
            .values();

        values
            .iter()
            .enumerate()
            .map(|(row, value)| {
                value.as_f64().ok_or_else(|| GraphError::NonNumeric {
                    column: column.to_owned(),
                    row,
                    found: value.kind().to_owned(),
                })
            })
            .collect()
    }

    /// Like [`Graph::edge_weights`], for metrics reading the column as path lengths.
    pub(crate) fn non_negative_edge_weights(&self, column: &str) -> Result<Vec<f64>> {
        let weights = self.edge_weights(column)?;

        match weights.iter().position(|w| *w < 0.0) {
            Some(row) => Err(GraphError::NegativeWeight {
                column: column.to_owned(),
                row,
                value: weights[row],
            }),
            None => Ok(weights),
        }
    }

    /// Builds weighted adjacency lists, `(neighbour, weight)` per node. The undirected view lists
    /// every edge from both ends.
    pub(crate) fn adjacency_lists(
        &self,
        weights: Option<&[f64]>,
        undirected: bool,
    ) -> Vec<Vec<(usize, f64)>> {
        let mut lists = vec![Vec::new(); self.node_count()];

        for (edge, (from, to)) in self.edge_positions().into_iter().enumerate() {
            let weight = weights.map_or(1.0, |w| w[edge]);
            lists[from].push((to, weight));
            if (undirected || !self.directed) && from != to {
                lists[to].push((from, weight));
            }
        }

        lists
    }

    /// Groups node positions by connected component of the undirected view. Components are
    /// ordered by their first node, members by position.
    pub(crate) fn connected_components(&self) -> Vec<Vec<usize>> {
        let adjacency = self.adjacency_lists(None, true);
        let mut seen = vec![false; self.node_count()];
        let mut components = Vec::new();

        for start in 0..self.node_count() {
            if seen[start] {
                continue;
            }

            seen[start] = true;
            let mut members = vec![start];
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                for &(neighbour, _) in &adjacency[current] {
                    if !seen[neighbour] {
                        seen[neighbour] = true;
                        members.push(neighbour);
                        stack.push(neighbour);
                    }
                }
            }

            members.sort_unstable();
            components.push(members);
        }

        components
    }

    //
    // Private
    //

    fn matrix(&self, directed: bool) -> DMatrix<f64> {
        let n = self.node_count();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        for (from, to) in self.edge_positions() {
            if from == to {
                continue;
            }

            matrix[(from, to)] += 1.0;
            if !directed {
                matrix[(to, from)] += 1.0;
            }
        }

        matrix
    }
}

//
// Helpers
//

/// Maps every node identity to its position, rejecting repeated keys.
fn build_index(nodes: &NodeTable) -> Result<HashMap<NodeId, usize>> {
    let mut index = HashMap::with_capacity(nodes.len());

    for (position, id) in nodes.ids().iter().enumerate() {
        if index.insert(id.clone(), position).is_some() {
            return Err(GraphError::DuplicateKey {
                key: id.to_string(),
            });
        }
    }

    Ok(index)
}

/// Rewrites every endpoint into the scheme's form and checks it resolves. `offset` is the row
/// number of the first edge, used in error reports when binding.
fn resolve_endpoints(
    edges: &mut EdgeTable,
    scheme: IdentityScheme,
    index: &HashMap<NodeId, usize>,
    offset: usize,
) -> Result<()> {
    for (row, (from, to)) in edges.endpoints_mut().enumerate() {
        for (endpoint, id) in [(FROM, from), (TO, to)] {
            match id.resolve(scheme) {
                Some(resolved) if index.contains_key(&resolved) => *id = resolved,
                _ => {
                    return Err(GraphError::ReferentialIntegrity {
                        edge: offset + row,
                        endpoint,
                        node: id.to_string(),
                    })
                }
            }
        }
    }

    Ok(())
}

/// Computes the eigenvalues and corresponding eigenvectors from the supplied symmetric matrix.
pub(crate) fn sorted_eigenvalue_vector_pairs(
    matrix: DMatrix<f64>,
    ascending: bool,
) -> Vec<(f64, DVector<f64>)> {
    // Early return if the matrix is empty, the rest of the computation requires a matrix with
    // at least a dim of 1x1.
    if matrix.is_empty() {
        return vec![];
    }

    // Compute eigenvalues and eigenvectors.
    let eigen = SymmetricEigen::new(matrix);

    // Map eigenvalues to their eigenvectors.
    let mut pairs: Vec<(f64, DVector<f64>)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(value, vector)| (*value, vector.clone_owned()))
        .collect();

    pairs.sort_unstable_by(|(a, _), (b, _)| {
        if ascending {
            a.total_cmp(b)
        } else {
            b.total_cmp(a)
        }
    });

    pairs
}
