//! Foreign-key graph and join resolution.
//!
//! Every FOREIGN KEY constraint in the schema becomes a directed edge
//! `source table.column -> target table.column`. Joins may travel an edge
//! in either direction, so resolution treats the graph as undirected. The
//! graph is built once when the [`crate::schema::Schema`] is assembled and
//! never changes afterwards.

use std::collections::HashMap;

use crate::error::{RelatableError, Result};
use crate::field::FieldRef;
use crate::schema::{NameHasher, TableInfo};

/// A declared foreign key, viewed as a traversable edge between tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyEdge {
    /// The column carrying the FOREIGN KEY constraint.
    pub source: FieldRef,
    /// The referenced column.
    pub target: FieldRef,
}

#[derive(Debug, Default)]
pub struct RelationGraph {
    edges: Vec<ForeignKeyEdge>,
    adjacency: HashMap<&'static str, Vec<usize>, NameHasher>,
}

impl RelationGraph {
    pub(crate) fn build(tables: &[TableInfo]) -> Self {
        let mut graph = RelationGraph::default();
        for table in tables {
            for column in &table.columns {
                if let Some(fk) = &column.foreign_key {
                    let edge = ForeignKeyEdge {
                        source: FieldRef::new(table.name, column.name),
                        target: FieldRef::new(fk.target_table, fk.target_column),
                    };
                    let index = graph.edges.len();
                    graph.edges.push(edge);
                    graph.adjacency.entry(table.name).or_default().push(index);
                    // a self-referencing key gets a single adjacency entry
                    if fk.target_table != table.name {
                        graph.adjacency.entry(fk.target_table).or_default().push(index);
                    }
                }
            }
        }
        graph
    }

    pub fn edges(&self) -> &[ForeignKeyEdge] {
        &self.edges
    }

    /// Resolve a bare join: find the single foreign key connecting `target`
    /// to any table already reachable in the query.
    ///
    /// The scan is one bounded pass over the target's adjacency list, so a
    /// cyclic schema cannot make it loop. Zero candidate edges and more
    /// than one candidate edge are both composition errors.
    pub fn resolve(&self, target: &'static str, reachable: &[&'static str]) -> Result<ForeignKeyEdge> {
        let mut found: Option<ForeignKeyEdge> = None;
        for index in self.adjacency.get(target).into_iter().flatten() {
            let edge = self.edges[*index];
            let other = if edge.source.table == target {
                edge.target.table
            } else {
                edge.source.table
            };
            if other == target || !reachable.contains(&other) {
                continue;
            }
            if found.is_some() {
                return Err(RelatableError::AmbiguousRelation { target });
            }
            found = Some(edge);
        }
        found.ok_or(RelatableError::NoRelation { target })
    }
}
