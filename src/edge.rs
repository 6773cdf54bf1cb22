//! A module for working with edge tables.

use crate::{
    error::Result,
    node::NodeId,
    table::{Column, Columns, Row, RowIdentity, Table},
    value::Value,
};

/// An edge record used to build a table row by row.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    pub attributes: Vec<(String, Value)>,
}

impl EdgeRecord {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.push((name.to_owned(), value.into()));
        self
    }
}

/// An ordered table of edges. Each row references two nodes by identity; whether the pair is
/// ordered is decided by the owning graph, not the table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeTable {
    from: Vec<NodeId>,
    to: Vec<NodeId>,
    columns: Columns,
}

impl EdgeTable {
    /// Creates an empty edge table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from endpoint pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::node::NodeId;
    ///
    /// let edges = EdgeTable::from_pairs([("a", "b"), ("b", "c")]);
    /// assert_eq!(edges.len(), 2);
    /// assert_eq!(edges.from(), &[NodeId::from("a"), NodeId::from("b")]);
    /// ```
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<NodeId>,
        B: Into<NodeId>,
    {
        let (from, to) = pairs
            .into_iter()
            .map(|(a, b)| (a.into(), b.into()))
            .unzip();

        Self {
            from,
            to,
            columns: Columns::default(),
        }
    }

    /// Builds a table from records, aligning attributes by name.
    pub fn from_records(records: Vec<EdgeRecord>) -> Result<Self> {
        let mut from = Vec::with_capacity(records.len());
        let mut to = Vec::with_capacity(records.len());
        let mut attributes = Vec::with_capacity(records.len());

        for record in records {
            from.push(record.from);
            to.push(record.to);
            attributes.push(record.attributes);
        }

        Ok(Self {
            from,
            to,
            columns: Columns::from_attributes(Table::Edges, attributes)?,
        })
    }

    /// Adds an attribute column, one value per edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    ///
    /// let edges = EdgeTable::from_pairs([(1, 2)])
    ///     .with_column("weight", [0.5])
    ///     .unwrap();
    /// assert!(edges.column("weight").is_some());
    /// ```
    pub fn with_column<I, V>(mut self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.columns.set(Table::Edges, self.len(), name, values)?;

        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty()
    }

    /// Returns the source endpoints.
    pub fn from(&self) -> &[NodeId] {
        &self.from
    }

    /// Returns the target endpoints.
    pub fn to(&self) -> &[NodeId] {
        &self.to
    }

    /// Returns the endpoints of the edge at `row`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::edge::EdgeTable;
    /// use tablegraph::node::NodeId;
    ///
    /// let edges = EdgeTable::from_pairs([("a", "b")]);
    ///
    /// assert_eq!(edges.endpoints(0), Some((&NodeId::from("a"), &NodeId::from("b"))));
    /// assert_eq!(edges.endpoints(1), None);
    /// ```
    pub fn endpoints(&self, row: usize) -> Option<(&NodeId, &NodeId)> {
        Some((self.from.get(row)?, self.to.get(row)?))
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Iterates over the rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.from
            .iter()
            .zip(self.to.iter())
            .enumerate()
            .map(move |(position, (from, to))| {
                Row::new(
                    Table::Edges,
                    position,
                    RowIdentity::Edge(from, to),
                    &self.columns,
                )
            })
    }

    //
    // Crate-internal transformations, the graph keeps these consistent with its nodes.
    //

    pub(crate) fn endpoints_mut(&mut self) -> impl Iterator<Item = (&mut NodeId, &mut NodeId)> {
        self.from.iter_mut().zip(self.to.iter_mut())
    }

    pub(crate) fn retain(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.from.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.to.retain(|_| *flags.next().unwrap_or(&false));
        self.columns.retain_rows(keep);
    }

    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        let rows = self.len();
        self.columns.set(Table::Edges, rows, name, values)
    }

    pub(crate) fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        Ok(Self {
            from: self.from.clone(),
            to: self.to.clone(),
            columns: self.columns.project(Table::Edges, names)?,
        })
    }

    pub(crate) fn append(&mut self, other: EdgeTable) {
        let (rows, other_rows) = (self.len(), other.len());
        self.from.extend(other.from);
        self.to.extend(other.to);
        self.columns.append(other.columns, rows, other_rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[test]
    fn from_pairs() {
        let edges = EdgeTable::from_pairs([(1, 2), (2, 3)]);

        assert_eq!(edges.from(), &[NodeId::Ordinal(1), NodeId::Ordinal(2)]);
        assert_eq!(edges.to(), &[NodeId::Ordinal(2), NodeId::Ordinal(3)]);
    }

    #[test]
    fn endpoints() {
        let edges = EdgeTable::from_pairs([("a", "b")]);

        assert_eq!(
            edges.endpoints(0),
            Some((&NodeId::from("a"), &NodeId::from("b")))
        );
        assert_eq!(edges.endpoints(1), None);
    }

    #[test]
    fn from_records() {
        let edges = EdgeTable::from_records(vec![
            EdgeRecord::new("a", "b").with("weight", 1.0),
            EdgeRecord::new("b", "c").with("kind", "x"),
        ])
        .unwrap();

        assert_eq!(edges.columns().names().collect::<Vec<_>>(), vec!["weight", "kind"]);
        assert_eq!(edges.column("weight").unwrap().values()[1], Value::Null);

        let err = EdgeTable::from_records(vec![EdgeRecord::new("a", "b").with("to", "c")])
            .unwrap_err();
        assert!(matches!(err, GraphError::ReservedColumn { table: Table::Edges, .. }));
    }

    #[test]
    fn retain() {
        let mut edges = EdgeTable::from_pairs([(1, 2), (2, 3), (3, 1)])
            .with_column("weight", [1, 2, 3])
            .unwrap();
        edges.retain(&[false, true, true]);

        assert_eq!(edges.from(), &[NodeId::Ordinal(2), NodeId::Ordinal(3)]);
        assert_eq!(edges.to(), &[NodeId::Ordinal(3), NodeId::Ordinal(1)]);
        assert_eq!(
            edges.column("weight").unwrap().values(),
            &[Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn rows() {
        let edges = EdgeTable::from_pairs([("a", "b")])
            .with_column("weight", [2.5])
            .unwrap();
        let row = edges.rows().next().unwrap();

        assert_eq!(row.from(), Some(&NodeId::from("a")));
        assert_eq!(row.get("to"), Some(Value::from("b")));
        assert_eq!(row.number("weight"), Some(2.5));
    }
}
