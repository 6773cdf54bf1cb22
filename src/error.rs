//! The error type shared by every graph operation.

use thiserror::Error;

use crate::table::Table;

/// Result type alias using [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building, transforming or measuring a graph.
///
/// Graphs are immutable once produced, so an error never leaves a previously constructed graph
/// in a partial state: the failing operation simply produces no new graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// An edge endpoint does not resolve to a live node identity.
    #[error("edge {edge} references unknown node `{node}` in its `{endpoint}` column")]
    ReferentialIntegrity {
        edge: usize,
        endpoint: &'static str,
        node: String,
    },

    /// Two node records share a key.
    #[error("duplicate node key `{key}`")]
    DuplicateKey { key: String },

    /// Some node records carry a key and others don't.
    #[error("node {record} has no key but the key column is set on other records")]
    IncompleteKeyColumn { record: usize },

    /// A column was referenced that the table doesn't have.
    #[error("unknown column `{column}` on the {table} table")]
    UnknownColumn { table: Table, column: String },

    /// A computed or supplied column doesn't match the table's row count.
    #[error("column `{column}` has {actual} values but the {table} table has {expected} rows")]
    ColumnLengthMismatch {
        table: Table,
        column: String,
        expected: usize,
        actual: usize,
    },

    /// An identity column (`node_key`, `from`, `to`) can't be overwritten.
    #[error("`{column}` is an identity column of the {table} table")]
    ReservedColumn { table: Table, column: String },

    /// A table-scoped operator ran without an active table, or the target name is unknown.
    #[error("invalid activation: {0}")]
    InvalidActivation(String),

    #[error("unknown layout `{0}`, expected `auto`, `circle`, `fr` or `spectral`")]
    UnknownLayout(String),

    /// A weight or other numeric input holds a non-numeric cell.
    #[error("column `{column}` row {row}: expected a number, found {found}")]
    NonNumeric {
        column: String,
        row: usize,
        found: String,
    },

    /// Shortest-path metrics can't use negative edge lengths.
    #[error("column `{column}` row {row}: negative weight {value}")]
    NegativeWeight {
        column: String,
        row: usize,
        value: f64,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn unknown_column(table: Table, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table,
            column: column.into(),
        }
    }
}
