//! A module for placing nodes in the plane.
//!
//! Layouts only produce coordinates, they never change the graph. Positions follow node order
//! and fit in the square `[-scale, scale]²` of the [`LayoutConfig`].

use std::{f64::consts::TAU, fmt, str::FromStr};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::LayoutConfig,
    error::GraphError,
    graph::{sorted_eigenvalue_vector_pairs, Graph},
};

/// A 2D node position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The supported layout algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Picks an algorithm for the graph, currently always force-directed.
    #[default]
    Auto,
    /// Evenly spaced on a circle, in node order.
    Circle,
    /// Fruchterman-Reingold spring embedding.
    ForceDirected,
    /// Coordinates from the second and third smallest Laplacian eigenvectors.
    Spectral,
}

impl Layout {
    pub fn name(self) -> &'static str {
        match self {
            Layout::Auto => "auto",
            Layout::Circle => "circle",
            Layout::ForceDirected => "fr",
            Layout::Spectral => "spectral",
        }
    }

    /// Computes one position per node.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::config::LayoutConfig;
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::graph::Graph;
    /// use tablegraph::layout::Layout;
    /// use tablegraph::node::NodeTable;
    ///
    /// let graph = Graph::construct(NodeTable::with_len(4), EdgeTable::from_pairs([(1, 2), (3, 4)]), false).unwrap();
    /// let positions = Layout::Circle.positions(&graph, &LayoutConfig::default());
    ///
    /// assert_eq!(positions.len(), 4);
    /// assert!((positions[0].x - 1.0).abs() < 1e-12);
    /// ```
    pub fn positions(self, graph: &Graph, config: &LayoutConfig) -> Vec<Position> {
        let n = graph.node_count();
        debug!(layout = self.name(), nodes = n, "computing layout");

        match n {
            0 => return vec![],
            1 => return vec![Position::default()],
            _ => {}
        }

        let positions = match self {
            Layout::Circle => circle(n),
            Layout::Auto | Layout::ForceDirected => force_directed(graph, config),
            Layout::Spectral => spectral(graph).unwrap_or_else(|| {
                warn!("spectral layout needs at least three nodes, falling back to a circle");
                circle(n)
            }),
        };

        fit(positions, config.scale)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Layout::Auto),
            "circle" => Ok(Layout::Circle),
            "fr" | "force" | "force_directed" => Ok(Layout::ForceDirected),
            "spectral" => Ok(Layout::Spectral),
            other => Err(GraphError::UnknownLayout(other.to_owned())),
        }
    }
}

//
// Helpers
//

fn circle(n: usize) -> Vec<Position> {
    (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Position::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Fruchterman-Reingold: nodes repel with `k² / d`, edges attract with `d² / k`, and the step
/// length is capped by a temperature that cools linearly to zero.
fn force_directed(graph: &Graph, config: &LayoutConfig) -> Vec<Position> {
    let n = graph.node_count();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut positions: Vec<Position> = (0..n)
        .map(|_| Position::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();

    let edges: Vec<(usize, usize)> = graph
        .edge_positions()
        .into_iter()
        .filter(|(from, to)| from != to)
        .collect();

    // Side length 2, so the area is 4.
    let k = (4.0 / n as f64).sqrt();
    let initial_temperature = 0.1;

    for iteration in 0..config.iterations {
        let mut displacement = vec![(0.0, 0.0); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy, d) = delta(positions[i], positions[j]);
                let force = k * k / d;
                displacement[i].0 += dx / d * force;
                displacement[i].1 += dy / d * force;
                displacement[j].0 -= dx / d * force;
                displacement[j].1 -= dy / d * force;
            }
        }

        for &(from, to) in &edges {
            let (dx, dy, d) = delta(positions[from], positions[to]);
            let force = d * d / k;
            displacement[from].0 -= dx / d * force;
            displacement[from].1 -= dy / d * force;
            displacement[to].0 += dx / d * force;
            displacement[to].1 += dy / d * force;
        }

        let temperature =
            initial_temperature * (1.0 - iteration as f64 / config.iterations as f64);

        for (position, (dx, dy)) in positions.iter_mut().zip(displacement) {
            let length = dx.hypot(dy);
            if length > 0.0 {
                let step = length.min(temperature);
                position.x += dx / length * step;
                position.y += dy / length * step;
            }
        }
    }

    positions
}

/// Offset from `b` to `a` and its length, kept away from zero so coincident nodes still push
/// each other apart.
fn delta(a: Position, b: Position) -> (f64, f64, f64) {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    let d = a.distance(b);

    if d < 1e-9 {
        (1e-9, 0.0, 1e-9)
    } else {
        (dx, dy, d)
    }
}

fn spectral(graph: &Graph) -> Option<Vec<Position>> {
    if graph.node_count() < 3 {
        return None;
    }

    let pairs = sorted_eigenvalue_vector_pairs(graph.laplacian_matrix(), true);
    let (x, y) = (&pairs[1].1, &pairs[2].1);

    Some(
        x.iter()
            .zip(y.iter())
            .map(|(x, y)| Position::new(*x, *y))
            .collect(),
    )
}

/// Centers the positions and scales them so the widest axis spans `[-scale, scale]`.
fn fit(mut positions: Vec<Position>, scale: f64) -> Vec<Position> {
    let bounds = |axis: fn(&Position) -> f64| {
        positions
            .iter()
            .map(axis)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    };
    let (min_x, max_x) = bounds(|p| p.x);
    let (min_y, max_y) = bounds(|p| p.y);

    let half_span = (max_x - min_x).max(max_y - min_y) / 2.0;
    let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let factor = if half_span > 0.0 { scale / half_span } else { 0.0 };

    for position in &mut positions {
        position.x = (position.x - cx) * factor;
        position.y = (position.y - cy) * factor;
    }

    positions
}
