//! A module for recording a chain of operators and running it later.
//!
//! A [`Pipeline`] is the deferred form of chaining [`ActiveView`](crate::view::ActiveView)
//! calls: steps are recorded up front and resolved against a graph in one [`Pipeline::run`].
//! An activation is consumed by the table step that follows it, so every filter, select and
//! mutate must be preceded by its own activate.
//!
//! ```rust
//! use tablegraph::centrality::{degree, Mode};
//! use tablegraph::edge::EdgeTable;
//! use tablegraph::graph::Graph;
//! use tablegraph::node::NodeTable;
//! use tablegraph::pipeline::Pipeline;
//! use tablegraph::table::Table;
//!
//! let graph = Graph::construct(NodeTable::with_len(4), EdgeTable::from_pairs([(1, 2), (2, 3)]), false).unwrap();
//!
//! let pipeline = Pipeline::new()
//!     .activate(Table::Nodes)
//!     .mutate("degree", degree(Mode::All))
//!     .activate(Table::Nodes)
//!     .filter(|row| row.number("degree") > Some(0.0));
//!
//! let result = pipeline.run(&graph).unwrap();
//! assert_eq!(result.node_count(), 3);
//! ```

use std::fmt;

use tracing::trace;

use crate::{
    edge::EdgeTable,
    error::{GraphError, Result},
    graph::Graph,
    node::NodeTable,
    table::{Row, Table},
    value::ColumnValues,
};

type Predicate = Box<dyn Fn(&Row<'_>) -> Result<bool>>;
type Compute = Box<dyn Fn(&Graph) -> Result<ColumnValues>>;

enum Step {
    Activate(Table),
    ActivateNamed(String),
    Filter(Predicate),
    Select(Vec<String>),
    Mutate(String, Compute),
    BindNodes(NodeTable),
    BindEdges(EdgeTable),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Activate(_) | Step::ActivateNamed(_) => "activate",
            Step::Filter(_) => "filter",
            Step::Select(_) => "select",
            Step::Mutate(..) => "mutate",
            Step::BindNodes(_) => "bind_nodes",
            Step::BindEdges(_) => "bind_edges",
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Activate(table) => write!(f, "activate({table})"),
            Step::ActivateNamed(name) => write!(f, "activate({name:?})"),
            Step::Select(columns) => write!(f, "select({columns:?})"),
            Step::Mutate(name, _) => write!(f, "mutate({name:?})"),
            Step::BindNodes(nodes) => write!(f, "bind_nodes({} rows)", nodes.len()),
            Step::BindEdges(edges) => write!(f, "bind_edges({} rows)", edges.len()),
            Step::Filter(_) => f.write_str("filter"),
        }
    }
}

/// A recorded sequence of graph operators.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn activate(self, table: Table) -> Self {
        self.push(Step::Activate(table))
    }

    /// Activates a table by name, checked when the pipeline runs.
    pub fn activate_named(self, name: &str) -> Self {
        self.push(Step::ActivateNamed(name.to_owned()))
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Row<'_>) -> bool + 'static,
    {
        self.push(Step::Filter(Box::new(
            move |row: &Row<'_>| -> Result<bool> { Ok(predicate(row)) },
        )))
    }

    pub fn try_filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Row<'_>) -> Result<bool> + 'static,
    {
        self.push(Step::Filter(Box::new(predicate)))
    }

    pub fn select<S: AsRef<str>>(self, columns: &[S]) -> Self {
        let columns = columns.iter().map(|c| c.as_ref().to_owned()).collect();
        self.push(Step::Select(columns))
    }

    pub fn mutate<F>(self, name: &str, compute: F) -> Self
    where
        F: Fn(&Graph) -> Result<ColumnValues> + 'static,
    {
        self.push(Step::Mutate(name.to_owned(), Box::new(compute)))
    }

    pub fn bind_nodes(self, nodes: NodeTable) -> Self {
        self.push(Step::BindNodes(nodes))
    }

    pub fn bind_edges(self, edges: EdgeTable) -> Self {
        self.push(Step::BindEdges(edges))
    }

    /// Applies every step in order. The input graph is left untouched and the first failing
    /// step aborts the run.
    pub fn run(&self, graph: &Graph) -> Result<Graph> {
        let mut current = graph.clone();
        let mut active: Option<Table> = None;

        for (i, step) in self.steps.iter().enumerate() {
            trace!(step = i, op = step.name(), ?active, "running pipeline step");

            current = match step {
                Step::Activate(table) => {
                    active = Some(*table);
                    continue;
                }
                Step::ActivateNamed(name) => {
                    active = Some(name.parse()?);
                    continue;
                }
                Step::BindNodes(nodes) => current.bind_nodes(nodes.clone())?,
                Step::BindEdges(edges) => current.bind_edges(edges.clone())?,
                Step::Filter(predicate) => {
                    let table = take_active(&mut active, step)?;
                    current.activate(table).try_filter(predicate.as_ref())?
                }
                Step::Select(columns) => {
                    let table = take_active(&mut active, step)?;
                    current.activate(table).select(columns.as_slice())?
                }
                Step::Mutate(name, compute) => {
                    let table = take_active(&mut active, step)?;
                    current.activate(table).mutate(name, compute.as_ref())?
                }
            };
        }

        Ok(current)
    }

    //
    // Private
    //

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

fn take_active(active: &mut Option<Table>, step: &Step) -> Result<Table> {
    active.take().ok_or_else(|| {
        GraphError::InvalidActivation(format!("`{}` needs an active table", step.name()))
    })
}
