
use thiserror::Error;

/// All failures surfaced by this crate.
///
/// Variants fall into two classes: composition-time errors (an invalid
/// schema or query shape, detected before any SQL reaches the engine) and
/// runtime errors reported by SQLite while preparing, binding or stepping.
#[derive(Error, Debug)]
pub enum RelatableError {
    // ----- composition-time -----
    #[error("duplicate column `{column}` in table `{table}`")]
    DuplicateColumn { table: &'static str, column: &'static str },
    #[error("table `{0}` declares more than one primary key")]
    MultiplePrimaryKeys(&'static str),
    #[error("duplicate table `{0}` in schema")]
    DuplicateTable(&'static str),
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error("unknown column `{column}` on table `{table}`")]
    UnknownColumn { table: String, column: String },
    #[error("foreign key on `{table}`.`{column}` references unknown {target}({target_column})")]
    UnknownForeignKeyTarget {
        table: &'static str,
        column: &'static str,
        target: &'static str,
        target_column: &'static str,
    },
    #[error("no relation found between {target} and already-joined tables")]
    NoRelation { target: &'static str },
    #[error("ambiguous relation; use an explicit field-pair join")]
    AmbiguousRelation { target: &'static str },
    #[error("join on {left} and {right} does not connect to the tables already in the query")]
    UnreachableJoin { left: String, right: String },
    #[error("table `{0}` is already part of the query")]
    AlreadyJoined(&'static str),
    #[error("FROM must be set before any join clause")]
    LateFrom,
    #[error("selected table `{0}` is not part of the query")]
    SelectionNotReachable(&'static str),
    #[error("joins are not valid in a delete query")]
    DeleteWithJoin,
    #[error("select list is empty")]
    EmptySelect,
    #[error("table `{0}` has no primary key")]
    NoPrimaryKey(&'static str),

    // ----- runtime -----
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: &'static str },
    #[error("statement did not run to completion")]
    Incomplete,
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, RelatableError>;
