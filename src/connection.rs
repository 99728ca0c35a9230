//! The connection: one engine handle, one statement cache, one entry
//! point for dispatching compiled queries.

// used for the statement cache, keyed by table and query shape
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use rusqlite::params;
use tracing::{debug, trace};

use crate::bind::{Prepared, insert_params, read_record, update_params};
use crate::error::{RelatableError, Result};
use crate::query::{Compiled, Delete, Select};
use crate::schema::{NameHasher, Schema, Table};
use crate::value::Value;

/// Where the database lives.
#[derive(Debug, Clone)]
pub enum Storage {
    File(PathBuf),
    InMemory,
}

/// The fixed query shapes eligible for caching. Open-ended queries are
/// deliberately absent: their text may vary call to call, so reuse is the
/// caller's affair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shape {
    Insert,
    Update,
    Find,
    DeleteByKey,
    First,
    Last,
}

/// One open database. Owns the engine handle and the statement cache;
/// strictly one connection per thread.
pub struct Connection {
    db: rusqlite::Connection,
    schema: Schema,
    // rendered SQL per (table, shape); the compiled handles live in the
    // engine's prepared-statement cache under the same text
    cache: RefCell<HashMap<(&'static str, Shape), String, NameHasher>>,
}

impl Connection {
    /// Open (or create) the database and enable foreign-key enforcement.
    pub fn open(storage: Storage, schema: Schema) -> Result<Self> {
        debug!(?storage, "opening sqlite connection");
        let db = match &storage {
            Storage::File(path) => rusqlite::Connection::open(path)?,
            Storage::InMemory => rusqlite::Connection::open_in_memory()?,
        };
        db.set_prepared_statement_cache_capacity(64);
        let connection = Self {
            db,
            schema,
            cache: RefCell::new(HashMap::default()),
        };
        connection.set_foreign_keys(true)?;
        Ok(connection)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // ------------- Query composition entry points -------------

    pub fn select<'c, R>(&'c self, table: &Table<R>) -> Result<Select<'c>> {
        self.schema.select(table)
    }

    pub fn select_pair<'c, A, B>(&'c self, a: &Table<A>, b: &Table<B>) -> Result<Select<'c>> {
        self.schema.select_pair(a, b)
    }

    pub fn delete<'c, R>(&'c self, table: &Table<R>) -> Result<Delete<'c>> {
        self.schema.delete(table)
    }

    // ------------- Open-ended execution -------------

    /// Prepare a compiled query. Not routed through the shape cache: the
    /// text of an open-ended query may legitimately differ between calls.
    pub fn prepare(&self, compiled: &Compiled) -> Result<Prepared<'_>> {
        trace!(sql = %compiled.sql, "preparing statement");
        let stmt = self.db.prepare(&compiled.sql)?;
        Ok(Prepared::new(stmt, compiled.params.clone()))
    }

    /// Compile, prepare and drain a single-table select.
    pub fn fetch_all<R: Default>(&self, table: &Table<R>, query: &Select<'_>) -> Result<Vec<R>> {
        let compiled = query.compile()?;
        let mut prepared = self.prepare(&compiled)?;
        let mut rows = prepared.rows()?;
        let mut records = Vec::new();
        while let Some(record) = rows.next_record(table)? {
            records.push(record);
        }
        Ok(records)
    }

    /// Run a compiled statement that yields no rows, e.g. a delete.
    pub fn execute(&self, compiled: &Compiled) -> Result<usize> {
        let mut prepared = self.prepare(compiled)?;
        prepared.execute()
    }

    /// Execute a count-shaped select and read the single aggregate value.
    pub fn count(&self, query: &Select<'_>) -> Result<i64> {
        let compiled = query.compile()?;
        let mut prepared = self.prepare(&compiled)?;
        let mut rows = prepared.rows()?;
        match rows.next_value()? {
            Some(Value::Integer(count)) => Ok(count),
            Some(other) => Err(RelatableError::TypeMismatch {
                expected: "i64",
                got: other.type_name(),
            }),
            None => Ok(0),
        }
    }

    // ------------- Fixed-shape cached operations -------------

    fn cached_sql(
        &self,
        table: &'static str,
        shape: Shape,
        render: impl FnOnce() -> Result<String>,
    ) -> Result<String> {
        if let Some(sql) = self.cache.borrow().get(&(table, shape)) {
            return Ok(sql.clone());
        }
        let sql = render()?;
        trace!(table, ?shape, "statement cache miss");
        self.cache.borrow_mut().insert((table, shape), sql.clone());
        Ok(sql)
    }

    /// Insert one record. When the table has an INTEGER primary key the
    /// key is not bound; the engine assigns the rowid and it is written
    /// back into the record.
    pub fn insert<R>(&self, table: &Table<R>, record: &mut R) -> Result<()> {
        let sql = self.cached_sql(table.name(), Shape::Insert, || Ok(table.info().insert_query(1)))?;
        let mut stmt = self.db.prepare_cached(&sql)?;
        let bound = insert_params(table, record);
        stmt.execute(rusqlite::params_from_iter(bound.iter()))?;
        if let Some(position) = table.rowid_position() {
            let id = self.db.last_insert_rowid();
            table.access(position).set(record, Value::Integer(id))?;
        }
        Ok(())
    }

    /// Insert a batch of records inside one transaction, `batch_size`
    /// rows per statement. Rowid write-back is not performed here.
    pub fn insert_many<R>(&self, table: &Table<R>, records: &[R], batch_size: usize) -> Result<()> {
        self.transaction(|| {
            let mut batch = batch_size.max(1);
            let mut inserted = 0;
            while inserted < records.len() {
                if records.len() - inserted < batch {
                    batch = records.len() - inserted;
                }
                let sql = table.info().insert_query(batch);
                let mut stmt = self.db.prepare_cached(&sql)?;
                let mut bound = Vec::new();
                for record in &records[inserted..inserted + batch] {
                    bound.extend(insert_params(table, record));
                }
                stmt.execute(rusqlite::params_from_iter(bound.iter()))?;
                inserted += batch;
            }
            Ok(())
        })
    }

    /// Update one record, addressed by its primary key.
    pub fn update<R>(&self, table: &Table<R>, record: &R) -> Result<()> {
        let sql = self.cached_sql(table.name(), Shape::Update, || table.info().update_query())?;
        let mut stmt = self.db.prepare_cached(&sql)?;
        let bound = update_params(table, record)?;
        stmt.execute(rusqlite::params_from_iter(bound.iter()))?;
        Ok(())
    }

    /// Fetch one record by primary key. No matching row is `None`, not an
    /// error.
    pub fn find<R: Default>(&self, table: &Table<R>, key: impl Into<Value>) -> Result<Option<R>> {
        let sql = self.cached_sql(table.name(), Shape::Find, || table.info().find_query())?;
        self.fetch_one(table, &sql, key.into())
    }

    /// Delete one record by primary key.
    pub fn delete_by_key<R>(&self, table: &Table<R>, key: impl Into<Value>) -> Result<()> {
        let sql =
            self.cached_sql(table.name(), Shape::DeleteByKey, || table.info().delete_by_key_query())?;
        let mut stmt = self.db.prepare_cached(&sql)?;
        let key: Value = key.into();
        stmt.execute(params![key])?;
        Ok(())
    }

    /// The first row of the table, in engine order.
    pub fn first<R: Default>(&self, table: &Table<R>) -> Result<Option<R>> {
        let sql = self.cached_sql(table.name(), Shape::First, || Ok(table.info().first_query()))?;
        let mut stmt = self.db.prepare_cached(&sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_record(row, table, 0)?)),
            None => Ok(None),
        }
    }

    /// The row with the greatest primary key.
    pub fn last<R: Default>(&self, table: &Table<R>) -> Result<Option<R>> {
        let sql = self.cached_sql(table.name(), Shape::Last, || table.info().last_query())?;
        let mut stmt = self.db.prepare_cached(&sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_record(row, table, 0)?)),
            None => Ok(None),
        }
    }

    fn fetch_one<R: Default>(&self, table: &Table<R>, sql: &str, key: Value) -> Result<Option<R>> {
        let mut stmt = self.db.prepare_cached(sql)?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_record(row, table, 0)?)),
            None => Ok(None),
        }
    }

    // ------------- Administration -------------

    /// Create every table in the schema, inside one transaction.
    pub fn create_tables(&self, if_not_exists: bool) -> Result<()> {
        debug!(tables = self.schema.tables().len(), "creating tables");
        self.transaction(|| {
            for table in self.schema.tables() {
                self.db.execute_batch(&table.create_table_query(if_not_exists))?;
            }
            Ok(())
        })
    }

    /// How many tables exist in the database file, per the engine's own
    /// catalog.
    pub fn count_tables(&self) -> Result<i64> {
        let mut stmt = self
            .db
            .prepare("SELECT COUNT(*) FROM `sqlite_schema` WHERE `type` = 'table'")?;
        let count = stmt.query_row([], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete every row of a table.
    pub fn truncate<R>(&self, table: &Table<R>) -> Result<()> {
        self.db.execute_batch(&format!("DELETE FROM {};", table.name()))?;
        Ok(())
    }

    pub fn set_foreign_keys(&self, on: bool) -> Result<()> {
        let pragma = if on {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        };
        self.db.execute_batch(pragma)?;
        Ok(())
    }

    /// Run a closure inside BEGIN/COMMIT, rolling back when it fails.
    pub fn transaction<T>(&self, run: impl FnOnce() -> Result<T>) -> Result<T> {
        self.db.execute_batch("BEGIN TRANSACTION;")?;
        match run() {
            Ok(value) => {
                self.db.execute_batch("COMMIT TRANSACTION;")?;
                Ok(value)
            }
            Err(err) => {
                self.db.execute_batch("ROLLBACK TRANSACTION;")?;
                Err(err)
            }
        }
    }
}
