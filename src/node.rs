//! A module for working with node tables.

use std::fmt;

use crate::{
    error::{GraphError, Result},
    table::{Column, Columns, Row, RowIdentity, Table},
    value::Value,
};

/// The identity of a node: an explicit key or, for tables without a key column, the node's
/// 1-based position at the time the graph was built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Key(String),
    Ordinal(usize),
}

impl NodeId {
    /// Returns the identity as a table cell.
    pub fn to_value(&self) -> Value {
        match self {
            NodeId::Key(key) => Value::Str(key.clone()),
            NodeId::Ordinal(ordinal) => Value::from(*ordinal),
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            NodeId::Key(key) => Some(key),
            NodeId::Ordinal(_) => None,
        }
    }

    pub fn as_ordinal(&self) -> Option<usize> {
        match self {
            NodeId::Ordinal(ordinal) => Some(*ordinal),
            NodeId::Key(_) => None,
        }
    }

    /// Interprets an edge endpoint under the given identity scheme.
    ///
    /// Keyed tables look every endpoint up by key, so an ordinal endpoint becomes the key
    /// spelling the same number. Ordinal tables need an integer, so a key endpoint is parsed;
    /// `None` means it can't resolve.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::node::{IdentityScheme, NodeId};
    ///
    /// assert_eq!(NodeId::Ordinal(3).resolve(IdentityScheme::Keyed), Some(NodeId::from("3")));
    /// assert_eq!(NodeId::from("3").resolve(IdentityScheme::Ordinal), Some(NodeId::Ordinal(3)));
    /// assert_eq!(NodeId::from("c").resolve(IdentityScheme::Ordinal), None);
    /// ```
    pub fn resolve(&self, scheme: IdentityScheme) -> Option<NodeId> {
        match (scheme, self) {
            (IdentityScheme::Keyed, NodeId::Key(_)) => Some(self.clone()),
            (IdentityScheme::Keyed, NodeId::Ordinal(ordinal)) => {
                Some(NodeId::Key(ordinal.to_string()))
            }
            (IdentityScheme::Ordinal, NodeId::Ordinal(_)) => Some(self.clone()),
            (IdentityScheme::Ordinal, NodeId::Key(key)) => {
                key.trim().parse().ok().map(NodeId::Ordinal)
            }
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Key(key) => f.write_str(key),
            NodeId::Ordinal(ordinal) => write!(f, "{ordinal}"),
        }
    }
}

impl From<&str> for NodeId {
    fn from(key: &str) -> Self {
        NodeId::Key(key.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(key: String) -> Self {
        NodeId::Key(key)
    }
}

impl From<usize> for NodeId {
    fn from(ordinal: usize) -> Self {
        NodeId::Ordinal(ordinal)
    }
}

// Negative numbers can't be positions, they're kept as keys and fail to resolve on ordinal
// tables.
impl From<i64> for NodeId {
    fn from(n: i64) -> Self {
        usize::try_from(n).map_or_else(|_| NodeId::Key(n.to_string()), NodeId::Ordinal)
    }
}

impl From<i32> for NodeId {
    fn from(n: i32) -> Self {
        i64::from(n).into()
    }
}

/// How a node table identifies its records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityScheme {
    /// Every record carries a `node_key`.
    Keyed,
    /// Records are identified by position.
    Ordinal,
}

/// A node record used to build a table row by row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeRecord {
    pub key: Option<String>,
    pub attributes: Vec<(String, Value)>,
}

impl NodeRecord {
    pub fn new(key: Option<&str>) -> Self {
        Self {
            key: key.map(str::to_owned),
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.push((name.to_owned(), value.into()));
        self
    }
}

/// An ordered table of nodes, their identities and attribute columns.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeTable {
    scheme: IdentityScheme,
    ids: Vec<NodeId>,
    columns: Columns,
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::with_len(0)
    }
}

impl NodeTable {
    /// Creates a table of `len` nodes identified by position.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::node::{NodeId, NodeTable};
    ///
    /// let nodes = NodeTable::with_len(2);
    /// assert_eq!(nodes.ids(), &[NodeId::Ordinal(1), NodeId::Ordinal(2)]);
    /// ```
    pub fn with_len(len: usize) -> Self {
        Self {
            scheme: IdentityScheme::Ordinal,
            ids: (1..=len).map(NodeId::Ordinal).collect(),
            columns: Columns::default(),
        }
    }

    /// Creates a table with an explicit key column. Key uniqueness is checked when the table is
    /// turned into a graph.
    pub fn keyed<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            scheme: IdentityScheme::Keyed,
            ids: keys.into_iter().map(|key| NodeId::Key(key.into())).collect(),
            columns: Columns::default(),
        }
    }

    /// Builds a table from records. Either every record has a key or none does.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablegraph::node::{NodeRecord, NodeTable};
    ///
    /// let nodes = NodeTable::from_records(vec![
    ///     NodeRecord::new(Some("a")).with("labels", "A"),
    ///     NodeRecord::new(None),
    /// ]);
    /// assert!(nodes.is_err());
    /// ```
    pub fn from_records(records: Vec<NodeRecord>) -> Result<Self> {
        let keyed = records.first().map_or(false, |record| record.key.is_some());
        let mut ids = Vec::with_capacity(records.len());
        let mut attributes = Vec::with_capacity(records.len());

        for (i, record) in records.into_iter().enumerate() {
            match (keyed, record.key) {
                (true, Some(key)) => ids.push(NodeId::Key(key)),
                (false, None) => ids.push(NodeId::Ordinal(i + 1)),
                (true, None) => return Err(GraphError::IncompleteKeyColumn { record: i }),
                (false, Some(_)) => return Err(GraphError::IncompleteKeyColumn { record: 0 }),
            }
            attributes.push(record.attributes);
        }

        Ok(Self {
            scheme: if keyed {
                IdentityScheme::Keyed
            } else {
                IdentityScheme::Ordinal
            },
            ids,
            columns: Columns::from_attributes(Table::Nodes, attributes)?,
        })
    }

    /// Adds an attribute column, one value per node.
    pub fn with_column<I, V>(mut self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.columns.set(Table::Nodes, self.len(), name, values)?;

        Ok(self)
    }

    pub fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    pub fn is_keyed(&self) -> bool {
        self.scheme == IdentityScheme::Keyed
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Iterates over the rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.ids.iter().enumerate().map(move |(position, id)| {
            Row::new(Table::Nodes, position, RowIdentity::Node(id), &self.columns)
        })
    }

    //
    // Crate-internal transformations, the graph keeps these consistent with its edges.
    //

    pub(crate) fn retain(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.ids.retain(|_| *flags.next().unwrap_or(&false));
        self.columns.retain_rows(keep);
    }

    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        let rows = self.len();
        self.columns.set(Table::Nodes, rows, name, values)
    }

    pub(crate) fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        Ok(Self {
            scheme: self.scheme,
            ids: self.ids.clone(),
            columns: self.columns.project(Table::Nodes, names)?,
        })
    }

    /// Gives positional nodes fresh ordinals starting at `first`.
    pub(crate) fn renumber_from(&mut self, first: usize) {
        if self.scheme == IdentityScheme::Ordinal {
            for (i, id) in self.ids.iter_mut().enumerate() {
                *id = NodeId::Ordinal(first + i);
            }
        }
    }

    pub(crate) fn append(&mut self, other: NodeTable) {
        let (rows, other_rows) = (self.len(), other.len());
        self.ids.extend(other.ids);
        self.columns.append(other.columns, rows, other_rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len() {
        let nodes = NodeTable::with_len(3);

        assert_eq!(nodes.scheme(), IdentityScheme::Ordinal);
        assert_eq!(
            nodes.ids(),
            &[NodeId::Ordinal(1), NodeId::Ordinal(2), NodeId::Ordinal(3)]
        );
        assert!(nodes.columns().is_empty());
    }

    #[test]
    fn keyed_with_column() {
        let nodes = NodeTable::keyed(["a", "b"])
            .with_column("labels", ["A", "B"])
            .unwrap();

        assert!(nodes.is_keyed());
        assert_eq!(nodes.column("labels").unwrap().values()[1], Value::from("B"));
    }

    #[test]
    fn with_column_length_mismatch() {
        let err = NodeTable::with_len(2)
            .with_column("labels", ["A"])
            .unwrap_err();

        assert!(matches!(
            err,
            GraphError::ColumnLengthMismatch {
                table: Table::Nodes,
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn from_records_all_or_nothing() {
        let nodes = NodeTable::from_records(vec![
            NodeRecord::new(Some("a")).with("labels", "A"),
            NodeRecord::new(Some("b")).with("size", 2),
        ])
        .unwrap();

        assert!(nodes.is_keyed());
        assert_eq!(nodes.columns().names().collect::<Vec<_>>(), vec!["labels", "size"]);
        assert_eq!(nodes.column("labels").unwrap().values()[1], Value::Null);

        let err = NodeTable::from_records(vec![NodeRecord::new(Some("a")), NodeRecord::new(None)])
            .unwrap_err();
        assert!(matches!(err, GraphError::IncompleteKeyColumn { record: 1 }));

        let err = NodeTable::from_records(vec![NodeRecord::new(None), NodeRecord::new(Some("b"))])
            .unwrap_err();
        assert!(matches!(err, GraphError::IncompleteKeyColumn { .. }));
    }

    #[test]
    fn from_records_reserved_attribute() {
        let err = NodeTable::from_records(vec![NodeRecord::new(None).with("node_key", "x")])
            .unwrap_err();

        assert!(matches!(err, GraphError::ReservedColumn { .. }));
    }

    #[test]
    fn resolve() {
        assert_eq!(
            NodeId::from("a").resolve(IdentityScheme::Keyed),
            Some(NodeId::from("a"))
        );
        assert_eq!(
            NodeId::Ordinal(2).resolve(IdentityScheme::Ordinal),
            Some(NodeId::Ordinal(2))
        );
        assert_eq!(NodeId::from("-1").resolve(IdentityScheme::Ordinal), None);
    }

    #[test]
    fn retain_and_renumber() {
        let mut nodes = NodeTable::with_len(3).with_column("x", [1, 2, 3]).unwrap();
        nodes.retain(&[true, false, true]);

        assert_eq!(nodes.ids(), &[NodeId::Ordinal(1), NodeId::Ordinal(3)]);
        assert_eq!(nodes.column("x").unwrap().values(), &[Value::Int(1), Value::Int(3)]);

        nodes.renumber_from(10);
        assert_eq!(nodes.ids(), &[NodeId::Ordinal(10), NodeId::Ordinal(11)]);
    }

    #[test]
    fn rows() {
        let nodes = NodeTable::keyed(["a", "b"])
            .with_column("labels", ["A", "B"])
            .unwrap();
        let labels: Vec<Value> = nodes.rows().filter_map(|row| row.get("labels")).collect();

        assert_eq!(labels, vec![Value::from("A"), Value::from("B")]);
        assert_eq!(
            nodes.rows().next().unwrap().get("node_key"),
            Some(Value::from("a"))
        );
    }
}
