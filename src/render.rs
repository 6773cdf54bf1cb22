//! A module for handing a graph to a plotting front-end.
//!
//! A [`Plot`] pairs a graph with a [`Layout`] and per-table [`Aesthetics`]. Resolving it checks
//! every mapped column and computes node positions, producing a [`Scene`] that a [`Renderer`]
//! turns into whatever the front-end consumes.
//!
//! ```rust
//! use tablegraph::edge::EdgeTable;
//! use tablegraph::graph::Graph;
//! use tablegraph::layout::Layout;
//! use tablegraph::node::NodeTable;
//! use tablegraph::render::{Aesthetics, JsonRenderer, Mapping, Plot};
//!
//! let nodes = NodeTable::keyed(["a", "b"]).with_column("labels", ["A", "B"]).unwrap();
//! let graph = Graph::construct(nodes, EdgeTable::from_pairs([("a", "b")]), false).unwrap();
//!
//! let json = Plot::new(&graph)
//!     .layout(Layout::Circle)
//!     .nodes(Aesthetics::new().label(Mapping::column("labels")).nudge(0.0, 0.1))
//!     .edges(Aesthetics::new().width(Mapping::constant(2.0)))
//!     .render(&JsonRenderer::default())
//!     .unwrap();
//!
//! assert!(json.contains("\"label\":\"A\""));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::LayoutConfig,
    error::{GraphError, Result},
    graph::Graph,
    layout::{Layout, Position},
    table::Table,
    value::{ColumnValues, Value},
};

/// Where a visual channel takes its values from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mapping {
    /// One value per row, read from a column of the table.
    Column(String),
    /// The same value for every row.
    Constant(Value),
}

impl Mapping {
    pub fn column(name: &str) -> Self {
        Mapping::Column(name.to_owned())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Mapping::Constant(value.into())
    }
}

/// The visual channels of one table. Unset channels are left to the front-end's defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aesthetics {
    pub size: Option<Mapping>,
    pub color: Option<Mapping>,
    pub width: Option<Mapping>,
    pub label: Option<Mapping>,
    /// Label offset from the element's anchor.
    pub nudge: Position,
}

impl Aesthetics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, mapping: Mapping) -> Self {
        self.size = Some(mapping);
        self
    }

    pub fn color(mut self, mapping: Mapping) -> Self {
        self.color = Some(mapping);
        self
    }

    pub fn width(mut self, mapping: Mapping) -> Self {
        self.width = Some(mapping);
        self
    }

    pub fn label(mut self, mapping: Mapping) -> Self {
        self.label = Some(mapping);
        self
    }

    pub fn nudge(mut self, x: f64, y: f64) -> Self {
        self.nudge = Position::new(x, y);
        self
    }

    fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        [&self.size, &self.color, &self.width, &self.label]
            .into_iter()
            .flatten()
    }
}

/// A node as drawn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeGlyph {
    pub id: Value,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// Where the label goes, the position plus the nudge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_position: Option<Position>,
}

/// An edge as drawn, a segment between its endpoints' positions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeSegment {
    pub from: Position,
    pub to: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// Labels sit at the segment's midpoint plus the nudge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_position: Option<Position>,
}

/// Everything a front-end needs to draw the graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    pub layout: Layout,
    pub directed: bool,
    pub nodes: Vec<NodeGlyph>,
    pub edges: Vec<EdgeSegment>,
}

/// Turns a resolved scene into a front-end's input.
pub trait Renderer {
    type Output;

    fn render(&self, scene: &Scene) -> Result<Self::Output>;
}

/// Serialises scenes to JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl Renderer for JsonRenderer {
    type Output = String;

    fn render(&self, scene: &Scene) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(scene)?
        } else {
            serde_json::to_string(scene)?
        };

        Ok(json)
    }
}

/// A graph with its layout and styling.
#[derive(Clone, Debug)]
pub struct Plot<'a> {
    graph: &'a Graph,
    layout: Layout,
    config: LayoutConfig,
    nodes: Aesthetics,
    edges: Aesthetics,
}

impl<'a> Plot<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            layout: Layout::default(),
            config: LayoutConfig::default(),
            nodes: Aesthetics::default(),
            edges: Aesthetics::default(),
        }
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn nodes(mut self, aesthetics: Aesthetics) -> Self {
        self.nodes = aesthetics;
        self
    }

    pub fn edges(mut self, aesthetics: Aesthetics) -> Self {
        self.edges = aesthetics;
        self
    }

    /// Checks the mapped columns exist and lays the graph out.
    pub fn resolve(&self) -> Result<Scene> {
        // Validate before paying for the layout.
        for (table, aesthetics) in [(Table::Nodes, &self.nodes), (Table::Edges, &self.edges)] {
            for mapping in aesthetics.mappings() {
                if let Mapping::Column(name) = mapping {
                    if !self.has_column(table, name) {
                        return Err(GraphError::unknown_column(table, name.as_str()));
                    }
                }
            }
        }

        let positions = self.layout.positions(self.graph, &self.config);

        let channels = Channels::resolve(self.graph, Table::Nodes, &self.nodes)?;
        let nodes = self
            .graph
            .nodes()
            .ids()
            .iter()
            .enumerate()
            .map(|(row, id)| {
                let label = channels.get(&channels.label, row);
                NodeGlyph {
                    id: id.to_value(),
                    position: positions[row],
                    size: channels.get(&channels.size, row),
                    color: channels.get(&channels.color, row),
                    width: channels.get(&channels.width, row),
                    label_position: label.as_ref().map(|_| offset(positions[row], self.nodes.nudge)),
                    label,
                }
            })
            .collect();

        let channels = Channels::resolve(self.graph, Table::Edges, &self.edges)?;
        let edges = self
            .graph
            .edge_positions()
            .into_iter()
            .enumerate()
            .map(|(row, (from, to))| {
                let (from, to) = (positions[from], positions[to]);
                let midpoint = Position::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
                let label = channels.get(&channels.label, row);
                EdgeSegment {
                    from,
                    to,
                    size: channels.get(&channels.size, row),
                    color: channels.get(&channels.color, row),
                    width: channels.get(&channels.width, row),
                    label_position: label.as_ref().map(|_| offset(midpoint, self.edges.nudge)),
                    label,
                }
            })
            .collect();

        debug!(
            layout = %self.layout,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "resolved scene"
        );

        Ok(Scene {
            layout: self.layout,
            directed: self.graph.is_directed(),
            nodes,
            edges,
        })
    }

    /// Resolves the plot and hands the scene to `renderer`.
    pub fn render<R: Renderer>(&self, renderer: &R) -> Result<R::Output> {
        renderer.render(&self.resolve()?)
    }

    //
    // Private
    //

    fn has_column(&self, table: Table, name: &str) -> bool {
        table.is_identity_column(name)
            || match table {
                Table::Nodes => self.graph.nodes().columns().contains(name),
                Table::Edges => self.graph.edges().columns().contains(name),
            }
    }
}

//
// Helpers
//

fn offset(anchor: Position, nudge: Position) -> Position {
    Position::new(anchor.x + nudge.x, anchor.y + nudge.y)
}

/// The per-row values of every set channel of one table.
struct Channels {
    size: Option<ColumnValues>,
    color: Option<ColumnValues>,
    width: Option<ColumnValues>,
    label: Option<ColumnValues>,
}

impl Channels {
    fn resolve(graph: &Graph, table: Table, aesthetics: &Aesthetics) -> Result<Self> {
        let channel = |mapping: &Option<Mapping>| -> Result<Option<ColumnValues>> {
            mapping
                .as_ref()
                .map(|mapping| channel_values(graph, table, mapping))
                .transpose()
        };

        Ok(Self {
            size: channel(&aesthetics.size)?,
            color: channel(&aesthetics.color)?,
            width: channel(&aesthetics.width)?,
            label: channel(&aesthetics.label)?,
        })
    }

    fn get(&self, channel: &Option<ColumnValues>, row: usize) -> Option<Value> {
        channel.as_ref().map(|values| values[row].clone())
    }
}

fn channel_values(graph: &Graph, table: Table, mapping: &Mapping) -> Result<ColumnValues> {
    let rows = graph.row_count(table);

    match mapping {
        Mapping::Constant(value) => Ok(vec![value.clone(); rows]),
        Mapping::Column(name) => match table {
            Table::Nodes => graph.nodes().rows().map(|row| row.try_get(name)).collect(),
            Table::Edges => graph.edges().rows().map(|row| row.try_get(name)).collect(),
        },
    }
}
