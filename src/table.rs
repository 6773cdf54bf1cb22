//! A module for the attribute columns shared by node and edge tables, and the row views handed
//! to filter predicates.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{GraphError, Result},
    node::NodeId,
    value::{ColumnValues, Value},
};

/// The reserved identity column of keyed node tables.
pub const NODE_KEY: &str = "node_key";
/// The reserved source endpoint column of edge tables.
pub const FROM: &str = "from";
/// The reserved target endpoint column of edge tables.
pub const TO: &str = "to";

/// Selects one of the two tables making up a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Nodes,
    Edges,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Nodes => "nodes",
            Table::Edges => "edges",
        }
    }

    /// The columns carrying identity, these survive every projection and can't be mutated.
    pub fn identity_columns(self) -> &'static [&'static str] {
        match self {
            Table::Nodes => &[NODE_KEY],
            Table::Edges => &[FROM, TO],
        }
    }

    pub fn is_identity_column(self, name: &str) -> bool {
        self.identity_columns().contains(&name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = GraphError;

    /// # Examples
    ///
    /// ```
    /// use tablegraph::table::Table;
    ///
    /// assert_eq!("nodes".parse::<Table>().unwrap(), Table::Nodes);
    /// assert!("vertices".parse::<Table>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nodes" => Ok(Table::Nodes),
            "edges" => Ok(Table::Edges),
            other => Err(GraphError::InvalidActivation(format!(
                "unknown target `{other}`, expected `nodes` or `edges`"
            ))),
        }
    }
}

/// A named column of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// The ordered user columns of a table.
///
/// The row count lives with the owning table since a table may have rows and no columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Columns {
    columns: Vec<Column>,
}

impl Columns {
    /// Builds columns from per-record attribute lists. Columns appear in first-seen order and
    /// records lacking an attribute get a null cell.
    pub(crate) fn from_attributes(table: Table, records: Vec<Vec<(String, Value)>>) -> Result<Self> {
        let rows = records.len();
        let mut columns: Vec<Column> = Vec::new();

        for (row, attributes) in records.into_iter().enumerate() {
            for (name, value) in attributes {
                let i = match columns.iter().position(|column| column.name == name) {
                    Some(i) => i,
                    None => {
                        if table.is_identity_column(&name) {
                            return Err(GraphError::ReservedColumn { table, column: name });
                        }
                        columns.push(Column {
                            name,
                            values: vec![Value::Null; rows],
                        });
                        columns.len() - 1
                    }
                };
                columns[i].values[row] = value;
            }
        }

        Ok(Self { columns })
    }

    /// Returns the column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn cell(&self, name: &str, row: usize) -> Option<&Value> {
        self.get(name).and_then(|column| column.values.get(row))
    }

    /// Adds a column or overwrites the existing one in place.
    pub(crate) fn set(
        &mut self,
        table: Table,
        rows: usize,
        name: &str,
        values: ColumnValues,
    ) -> Result<()> {
        if table.is_identity_column(name) {
            return Err(GraphError::ReservedColumn {
                table,
                column: name.to_owned(),
            });
        }

        if values.len() != rows {
            return Err(GraphError::ColumnLengthMismatch {
                table,
                column: name.to_owned(),
                expected: rows,
                actual: values.len(),
            });
        }

        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column {
                name: name.to_owned(),
                values,
            }),
        }

        Ok(())
    }

    /// Drops the rows whose flag is `false`.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }
    }

    /// Projects down to the named columns in the requested order, identity names are skipped
    /// since the owning table keeps those regardless.
    pub(crate) fn project<S: AsRef<str>>(&self, table: Table, names: &[S]) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());

        for name in names.iter().map(AsRef::as_ref).unique() {
            if table.is_identity_column(name) {
                continue;
            }

            let column = self
                .get(name)
                .ok_or_else(|| GraphError::unknown_column(table, name))?;
            columns.push(column.clone());
        }

        Ok(Self { columns })
    }

    /// Appends `other`'s rows, aligning columns by name. Cells missing on either side are
    /// filled with nulls, columns new to `self` are added after the existing ones.
    pub(crate) fn append(&mut self, other: Columns, rows: usize, other_rows: usize) {
        let mut other = other.columns;

        for column in &mut self.columns {
            match other.iter().position(|c| c.name == column.name) {
                Some(i) => column.values.extend(other.remove(i).values),
                None => column
                    .values
                    .extend(std::iter::repeat(Value::Null).take(other_rows)),
            }
        }

        for column in other {
            let mut values = vec![Value::Null; rows];
            values.extend(column.values);
            self.columns.push(Column {
                name: column.name,
                values,
            });
        }
    }
}

/// The identity part of a row.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RowIdentity<'a> {
    Node(&'a NodeId),
    Edge(&'a NodeId, &'a NodeId),
}

/// A read-only view of one record, handed to filter predicates.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: Table,
    position: usize,
    identity: RowIdentity<'a>,
    columns: &'a Columns,
}

impl<'a> Row<'a> {
    pub(crate) fn new(
        table: Table,
        position: usize,
        identity: RowIdentity<'a>,
        columns: &'a Columns,
    ) -> Self {
        Self {
            table,
            position,
            identity,
            columns,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// The 0-based position of the row in the table being filtered.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The identity of a node row.
    pub fn node_id(&self) -> Option<&'a NodeId> {
        match self.identity {
            RowIdentity::Node(id) => Some(id),
            RowIdentity::Edge(..) => None,
        }
    }

    /// The source endpoint of an edge row.
    pub fn from(&self) -> Option<&'a NodeId> {
        match self.identity {
            RowIdentity::Edge(from, _) => Some(from),
            RowIdentity::Node(_) => None,
        }
    }

    /// The target endpoint of an edge row.
    pub fn to(&self) -> Option<&'a NodeId> {
        match self.identity {
            RowIdentity::Edge(_, to) => Some(to),
            RowIdentity::Node(_) => None,
        }
    }

    /// Returns whether the row is an edge touching `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        match self.identity {
            RowIdentity::Edge(from, to) => from == node || to == node,
            RowIdentity::Node(_) => false,
        }
    }

    /// Returns the cell in column `name`, identity columns included.
    pub fn get(&self, name: &str) -> Option<Value> {
        match (self.identity, name) {
            (RowIdentity::Node(id), NODE_KEY) => Some(id.to_value()),
            (RowIdentity::Edge(from, _), FROM) => Some(from.to_value()),
            (RowIdentity::Edge(_, to), TO) => Some(to.to_value()),
            _ => self.columns.cell(name, self.position).cloned(),
        }
    }

    /// Like [`Row::get`], but a missing column is an error.
    pub fn try_get(&self, name: &str) -> Result<Value> {
        self.get(name)
            .ok_or_else(|| GraphError::unknown_column(self.table, name))
    }

    /// Returns the numeric view of the cell in column `name`.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.columns
            .cell(name, self.position)
            .and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(rows: usize, data: &[(&str, Vec<Value>)]) -> Columns {
        let mut columns = Columns::default();
        for (name, values) in data {
            columns
                .set(Table::Nodes, rows, name, values.clone())
                .unwrap();
        }
        columns
    }

    #[test]
    fn set_appends_then_overwrites_in_place() {
        let mut cols = columns(2, &[("a", vec![1.into(), 2.into()]), ("b", vec![3.into(), 4.into()])]);

        cols.set(Table::Nodes, 2, "a", vec![5.into(), 6.into()])
            .unwrap();

        assert_eq!(cols.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(cols.cell("a", 1), Some(&Value::Int(6)));
    }

    #[test]
    fn set_rejects_wrong_length() {
        let mut cols = Columns::default();
        let err = cols
            .set(Table::Edges, 3, "weight", vec![1.into()])
            .unwrap_err();

        assert!(matches!(
            err,
            GraphError::ColumnLengthMismatch {
                table: Table::Edges,
                expected: 3,
                actual: 1,
                ..
            }
        ));
        assert!(cols.is_empty());
    }

    #[test]
    fn set_rejects_identity_columns() {
        let mut cols = Columns::default();

        assert!(matches!(
            cols.set(Table::Edges, 0, FROM, vec![]),
            Err(GraphError::ReservedColumn { .. })
        ));
        assert!(matches!(
            cols.set(Table::Nodes, 0, NODE_KEY, vec![]),
            Err(GraphError::ReservedColumn { .. })
        ));
        // Endpoint names are plain columns on the node table.
        assert!(cols.set(Table::Nodes, 0, FROM, vec![]).is_ok());
    }

    #[test]
    fn retain_rows() {
        let mut cols = columns(3, &[("a", vec![1.into(), 2.into(), 3.into()])]);
        cols.retain_rows(&[true, false, true]);

        assert_eq!(cols.get("a").unwrap().values(), &[Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn project() {
        let cols = columns(1, &[("a", vec![1.into()]), ("b", vec![2.into()]), ("c", vec![3.into()])]);

        let projected = cols.project(Table::Nodes, &["c", NODE_KEY, "a", "c"]).unwrap();
        assert_eq!(projected.names().collect::<Vec<_>>(), vec!["c", "a"]);

        let err = cols.project(Table::Nodes, &["d"]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownColumn { column, .. } if column == "d"));
    }

    #[test]
    fn append_aligns_by_name() {
        let mut cols = columns(2, &[("a", vec![1.into(), 2.into()]), ("b", vec![3.into(), 4.into()])]);
        let other = columns(1, &[("c", vec![9.into()]), ("a", vec![5.into()])]);

        cols.append(other, 2, 1);

        assert_eq!(cols.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(
            cols.get("a").unwrap().values(),
            &[Value::Int(1), Value::Int(2), Value::Int(5)]
        );
        assert_eq!(
            cols.get("b").unwrap().values(),
            &[Value::Int(3), Value::Int(4), Value::Null]
        );
        assert_eq!(
            cols.get("c").unwrap().values(),
            &[Value::Null, Value::Null, Value::Int(9)]
        );
    }

    #[test]
    fn row_identity_columns() {
        let cols = columns(1, &[("weight", vec![0.5.into()])]);
        let (a, b) = (NodeId::from("a"), NodeId::from("b"));
        let row = Row::new(Table::Edges, 0, RowIdentity::Edge(&a, &b), &cols);

        assert_eq!(row.get(FROM), Some(Value::from("a")));
        assert_eq!(row.get(TO), Some(Value::from("b")));
        assert_eq!(row.number("weight"), Some(0.5));
        assert!(row.touches(&b));
        assert!(row.node_id().is_none());
        assert!(matches!(
            row.try_get("label"),
            Err(GraphError::UnknownColumn { table: Table::Edges, .. })
        ));
    }

    #[test]
    fn table_from_str() {
        assert_eq!("edges".parse::<Table>().unwrap(), Table::Edges);
        assert!(matches!(
            "Nodes".parse::<Table>(),
            Err(GraphError::InvalidActivation(_))
        ));
    }
}
