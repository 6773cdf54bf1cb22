//! A module for reading node and edge tables from CSV and writing them back.
//!
//! Cells are parsed with [`Value::parse`]: integers, floats and booleans are recognised and
//! everything else stays a string. Empty cells are null.

use std::{fs::File, io, path::Path};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::debug;

use crate::{
    edge::{EdgeRecord, EdgeTable},
    error::{GraphError, Result},
    node::{NodeId, NodeRecord, NodeTable},
    table::{Columns, Table, NODE_KEY},
    value::Value,
};

/// Reads a node table.
///
/// `key_column` names the column holding node keys. Without one, a `node_key` header is used
/// if present, otherwise nodes are identified by position.
///
/// # Examples
///
/// ```
/// use tablegraph::io::read_nodes;
/// use tablegraph::value::Value;
///
/// let csv = "name,labels\na,Alpha\nb,Beta\n";
/// let nodes = read_nodes(csv.as_bytes(), Some("name")).unwrap();
///
/// assert!(nodes.is_keyed());
/// assert_eq!(nodes.column("labels").unwrap().values()[1], Value::from("Beta"));
/// ```
pub fn read_nodes<R: io::Read>(reader: R, key_column: Option<&str>) -> Result<NodeTable> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let key = match key_column {
        Some(name) => Some(
            column_index(&headers, name).ok_or_else(|| GraphError::unknown_column(Table::Nodes, name))?,
        ),
        None => column_index(&headers, NODE_KEY),
    };

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;

        let node_key = match key {
            Some(i) => match record.get(i).filter(|cell| !cell.is_empty()) {
                Some(cell) => Some(cell),
                None => return Err(GraphError::IncompleteKeyColumn { record: row }),
            },
            None => None,
        };

        records.push(NodeRecord {
            key: node_key.map(str::to_owned),
            attributes: attributes(&headers, &record, &[key]),
        });
    }

    debug!(nodes = records.len(), keyed = key.is_some(), "read node table");

    NodeTable::from_records(records)
}

/// Reads an edge table whose endpoints sit in the `from` and `to` columns.
///
/// Endpoints that look like positive integers are read as positions, anything else as keys.
/// Either form resolves against keyed node tables.
pub fn read_edges<R: io::Read>(reader: R, from: &str, to: &str) -> Result<EdgeTable> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let from_index =
        column_index(&headers, from).ok_or_else(|| GraphError::unknown_column(Table::Edges, from))?;
    let to_index =
        column_index(&headers, to).ok_or_else(|| GraphError::unknown_column(Table::Edges, to))?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;

        records.push(EdgeRecord {
            from: endpoint(record.get(from_index).unwrap_or_default()),
            to: endpoint(record.get(to_index).unwrap_or_default()),
            attributes: attributes(&headers, &record, &[Some(from_index), Some(to_index)]),
        });
    }

    debug!(edges = records.len(), "read edge table");

    EdgeTable::from_records(records)
}

pub fn read_nodes_path(path: impl AsRef<Path>, key_column: Option<&str>) -> Result<NodeTable> {
    read_nodes(File::open(path)?, key_column)
}

pub fn read_edges_path(path: impl AsRef<Path>, from: &str, to: &str) -> Result<EdgeTable> {
    read_edges(File::open(path)?, from, to)
}

/// Writes a node table, identity first.
///
/// Positional identities are written as keys too, so edges still resolve when the tables are
/// read back after nodes were filtered out.
pub fn write_nodes<W: io::Write>(nodes: &NodeTable, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    write_header(&mut writer, &[NODE_KEY], nodes.columns())?;
    for (row, id) in nodes.ids().iter().enumerate() {
        write_row(&mut writer, &[id], nodes.columns(), row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes an edge table with `from` and `to` first.
pub fn write_edges<W: io::Write>(edges: &EdgeTable, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    write_header(&mut writer, Table::Edges.identity_columns(), edges.columns())?;
    for (row, (from, to)) in edges.from().iter().zip(edges.to()).enumerate() {
        write_row(&mut writer, &[from, to], edges.columns(), row)?;
    }
    writer.flush()?;

    Ok(())
}

//
// Helpers
//

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

/// Every cell outside the `skip` columns, named by its header.
fn attributes(headers: &StringRecord, record: &StringRecord, skip: &[Option<usize>]) -> Vec<(String, Value)> {
    headers
        .iter()
        .zip(record.iter())
        .enumerate()
        .filter(|(i, _)| !skip.contains(&Some(*i)))
        .map(|(_, (header, cell))| (header.to_owned(), Value::parse(cell)))
        .collect()
}

fn endpoint(cell: &str) -> NodeId {
    match cell.parse::<usize>() {
        Ok(ordinal) if ordinal > 0 => NodeId::Ordinal(ordinal),
        _ => NodeId::Key(cell.to_owned()),
    }
}

fn write_header<W: io::Write>(
    writer: &mut csv::Writer<W>,
    identity: &[&str],
    columns: &Columns,
) -> Result<()> {
    let header: Vec<&str> = identity.iter().copied().chain(columns.names()).collect();
    writer.write_record(&header)?;

    Ok(())
}

fn write_row<W: io::Write>(
    writer: &mut csv::Writer<W>,
    identity: &[&NodeId],
    columns: &Columns,
    row: usize,
) -> Result<()> {
    let record: Vec<String> = identity
        .iter()
        .map(|id| id.to_string())
        .chain(columns.iter().map(|column| cell(&column.values()[row])))
        .collect();
    writer.write_record(&record)?;

    Ok(())
}

/// Floats keep their decimal point so they read back as floats.
fn cell(value: &Value) -> String {
    match value {
        Value::Float(x) => format!("{x:?}"),
        other => other.to_string(),
    }
}
