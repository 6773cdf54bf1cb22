use tablegraph::{
    centrality::{betweenness, degree, strength, Mode},
    community::{louvain, modularity},
    config::AnalysisConfig,
    edge::EdgeTable,
    error::Result,
    graph::Graph,
    io,
    layout::Layout,
    node::{NodeId, NodeTable},
    render::{Aesthetics, JsonRenderer, Mapping, Plot},
    table::Table,
    value::Value,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AnalysisConfig::load("testdata/analysis.toml")?;

    // Six people in two triangles joined by the C-D bridge.
    let nodes = io::read_nodes_path("testdata/nodes.csv", None)?;
    let edges = io::read_edges_path("testdata/edges.csv", "from", "to")?;
    let graph = Graph::construct(nodes, edges, false)?;

    println!(
        "Read {} nodes and {} edges, density {:.3}",
        graph.node_count(),
        graph.edge_count(),
        graph.density()
    );

    // Grow the graph by one node and two edges, then take them away again.
    let grown = graph
        .bind_nodes(NodeTable::with_len(1).with_column("labels", ["G"])?)?
        .bind_edges(EdgeTable::from_pairs([(1, 7), (3, 7)]).with_column("weight", [0.5, 1.0])?)?;
    println!("After binding G: {} nodes, {} edges", grown.node_count(), grown.edge_count());

    let g = NodeId::Ordinal(7);
    let shrunk = grown
        .activate(Table::Edges)
        .filter(|row| !row.touches(&g))
        .activate(Table::Nodes)
        .try_filter(|row| Ok(row.try_get("labels")? != Value::from("G")))?;
    println!("Round trip restores the original graph: {}", shrunk == graph);

    // Attach the network measures as node columns.
    let graph = graph
        .activate(Table::Nodes)
        .mutate("degree", degree(Mode::All))?
        .activate(Table::Nodes)
        .mutate("strength", strength("weight", Mode::All))?
        .activate(Table::Nodes)
        .mutate(
            "betweenness",
            betweenness(Some("weight"), config.betweenness.normalized),
        )?
        .activate(Table::Nodes)
        .mutate("community", louvain(config.louvain.clone(), Some("weight")))?;

    for row in graph.nodes().rows() {
        println!(
            "{:>2} {} degree={} strength={} betweenness={} community={}",
            row.position() + 1,
            row.get("labels").unwrap_or_default(),
            row.get("degree").unwrap_or_default(),
            row.get("strength").unwrap_or_default(),
            row.get("betweenness").unwrap_or_default(),
            row.get("community").unwrap_or_default(),
        );
    }

    let q = modularity(
        &graph,
        "community",
        Some("weight"),
        config.louvain.resolution,
    )?;
    println!("Modularity of the partition: {q:.3}");

    // Hand the styled graph to a front-end.
    let json = Plot::new(&graph)
        .layout(Layout::ForceDirected)
        .config(config.layout.clone())
        .nodes(
            Aesthetics::new()
                .size(Mapping::column("degree"))
                .color(Mapping::column("community"))
                .label(Mapping::column("labels"))
                .nudge(0.0, 0.05),
        )
        .edges(Aesthetics::new().width(Mapping::column("weight")))
        .render(&JsonRenderer { pretty: true })?;
    println!("{json}");

    Ok(())
}
