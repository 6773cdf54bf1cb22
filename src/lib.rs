//! Tablegraph is a small toolkit for treating a graph as a pair of related tables, one of nodes
//! and one of edges, and transforming it with relational-style operators.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure which is constructed
//! from a [`NodeTable`](node::NodeTable) and an [`EdgeTable`](edge::EdgeTable). A graph is
//! activated on one of its tables and the next operator (filter, select or mutate) applies to
//! that table only. Every operator returns a new graph, edges never point at missing nodes.
//!
//! ```rust
//! use tablegraph::centrality::{betweenness, degree, Mode};
//! use tablegraph::community::louvain;
//! use tablegraph::config::LouvainConfig;
//! use tablegraph::edge::EdgeTable;
//! use tablegraph::graph::Graph;
//! use tablegraph::node::NodeTable;
//! use tablegraph::table::Table;
//! use tablegraph::value::Value;
//!
//! // Nodes are identified by position unless the table carries keys.
//! let nodes = NodeTable::with_len(6)
//!     .with_column("labels", ["A", "B", "C", "D", "E", "F"])
//!     .unwrap();
//! let edges = EdgeTable::from_pairs([(1, 2), (1, 3), (2, 3), (3, 4), (4, 5), (4, 6), (5, 6)])
//!     .with_column("weight", [1.0, 0.5, 1.0, 2.0, 1.0, 0.5, 1.0])
//!     .unwrap();
//! let graph = Graph::construct(nodes, edges, false).unwrap();
//!
//! // Metrics are attached as new columns computed from the whole graph.
//! let graph = graph
//!     .activate(Table::Nodes)
//!     .mutate("degree", degree(Mode::All))
//!     .unwrap()
//!     .activate(Table::Nodes)
//!     .mutate("betweenness", betweenness(Some("weight"), false))
//!     .unwrap()
//!     .activate(Table::Nodes)
//!     .mutate("community", louvain(LouvainConfig::default(), None))
//!     .unwrap();
//!
//! // Dropping a node drops the edges touching it. `try_get` reports a misspelt column
//! // instead of reading it as absent.
//! let graph = graph
//!     .activate(Table::Nodes)
//!     .try_filter(|row| Ok(row.try_get("labels")? != Value::from("C")))
//!     .unwrap();
//!
//! assert_eq!(graph.node_count(), 5);
//! assert_eq!(graph.edge_count(), 4);
//!
//! // Matrices can be pretty printed...
//! println!("{}", graph.laplacian_matrix());
//! ```

pub mod centrality;
pub mod community;
pub mod config;
pub mod edge;
pub mod error;
pub mod graph;
pub mod io;
pub mod layout;
pub mod node;
pub mod pipeline;
pub mod render;
pub mod table;
pub mod value;
pub mod view;

#[cfg(test)]
mod test_utils;
