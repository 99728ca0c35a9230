//! Bidirectional binding between SQL rows and records.
//!
//! One direction materializes records: a [`RowStream`] is a lazy,
//! forward-only, pull-based cursor over a statement's results — each pull
//! either yields the next row mapped through the table's accessors,
//! signals completion with `None`, or fails. A stream is consumed once and
//! cannot be restarted; dropping it abandons the cursor. The other
//! direction turns record fields into statement parameters for the insert
//! and update paths, always in column declaration order.

use rusqlite::{Row, Rows, params_from_iter};

use crate::error::{RelatableError, Result};
use crate::schema::Table;
use crate::value::Value;

/// A prepared, parameter-bound statement ready to be stepped.
pub struct Prepared<'conn> {
    stmt: rusqlite::Statement<'conn>,
    params: Vec<Value>,
}

impl<'conn> Prepared<'conn> {
    pub(crate) fn new(stmt: rusqlite::Statement<'conn>, params: Vec<Value>) -> Self {
        Self { stmt, params }
    }

    /// Begin stepping. The returned stream borrows this statement, so at
    /// most one cursor can be live per statement at a time.
    pub fn rows(&mut self) -> Result<RowStream<'_>> {
        let rows = self.stmt.query(params_from_iter(self.params.iter()))?;
        Ok(RowStream { rows })
    }

    /// Run a statement that returns no rows (delete paths). Yields the
    /// number of affected rows.
    pub fn execute(&mut self) -> Result<usize> {
        Ok(self.stmt.execute(params_from_iter(self.params.iter()))?)
    }
}

/// Lazy, forward-only cursor over a statement's result rows.
pub struct RowStream<'stmt> {
    rows: Rows<'stmt>,
}

impl<'stmt> RowStream<'stmt> {
    /// Step once and materialize a record of `table`, or `None` when the
    /// results are exhausted.
    pub fn next_record<R: Default>(&mut self, table: &Table<R>) -> Result<Option<R>> {
        match self.rows.next()? {
            Some(row) => Ok(Some(read_record(row, table, 0)?)),
            None => Ok(None),
        }
    }

    /// Step once and materialize a pair of records over disjoint ordinal
    /// ranges: `a`'s columns first, then `b`'s. Matches the column layout
    /// produced by [`crate::schema::Schema::select_pair`].
    pub fn next_pair<A: Default, B: Default>(
        &mut self,
        a: &Table<A>,
        b: &Table<B>,
    ) -> Result<Option<(A, B)>> {
        match self.rows.next()? {
            Some(row) => {
                let left = read_record(row, a, 0)?;
                let right = read_record(row, b, a.n_columns())?;
                Ok(Some((left, right)))
            }
            None => Ok(None),
        }
    }

    /// Step once and read the first ordinal raw, for aggregate results.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        match self.rows.next()? {
            Some(row) => Ok(Some(Value::read(row.get_ref(0)?))),
            None => Ok(None),
        }
    }
}

/// Assign ordinals `offset..offset + n_columns` to a fresh record through
/// the table's accessors.
pub(crate) fn read_record<R: Default>(row: &Row<'_>, table: &Table<R>, offset: usize) -> Result<R> {
    let mut record = R::default();
    for index in 0..table.n_columns() {
        let value = Value::read(row.get_ref(offset + index)?);
        table.access(index).set(&mut record, value)?;
    }
    Ok(record)
}

/// Parameter plan for an insert: every column in declaration order, minus
/// the rowid alias, which the engine assigns.
pub(crate) fn insert_params<R>(table: &Table<R>, record: &R) -> Vec<Value> {
    let rowid = table.rowid_position();
    let mut params = Vec::with_capacity(table.n_columns());
    for index in 0..table.n_columns() {
        if Some(index) == rowid {
            continue;
        }
        params.push(table.access(index).get(record));
    }
    params
}

/// Parameter plan for an update: non-key columns in declaration order,
/// then the primary key as the final parameter.
pub(crate) fn update_params<R>(table: &Table<R>, record: &R) -> Result<Vec<Value>> {
    let pk = table
        .pk_position()
        .ok_or(RelatableError::NoPrimaryKey(table.name()))?;
    let mut params = Vec::with_capacity(table.n_columns());
    for index in 0..table.n_columns() {
        if index == pk {
            continue;
        }
        params.push(table.access(index).get(record));
    }
    params.push(table.access(pk).get(record));
    Ok(params)
}
