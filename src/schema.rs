//! Schema descriptors: tables, columns, constraints and record accessors.
//!
//! Records stay plain data. A [`Table`] is an external descriptor built
//! once through a composition API; it never requires the record type to
//! implement anything beyond `Default` (used when materializing rows).
//! Each column carries an accessor — either direct field access or a
//! getter/setter pair — and every later stage sees only the [`Access`]
//! trait, so the two capabilities are indistinguishable downstream.
//!
//! Descriptors are pure derived data: validation happens while building
//! (duplicate columns, multiple primary keys) and when the [`Schema`]
//! registry is assembled (foreign-key targets), always before any SQL is
//! sent to the engine.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

// fast hashing for the registry's name map
use seahash::SeaHasher;

use crate::error::{RelatableError, Result};
use crate::field::FieldRef;
use crate::relate::RelationGraph;
use crate::value::{SqlType, Value};

pub type NameHasher = BuildHasherDefault<SeaHasher>;

// ------------- Constraint vocabulary -------------

/// Conflict resolution policy for NOT NULL / PRIMARY KEY / UNIQUE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conflict {
    #[default]
    Abort,
    Rollback,
    Fail,
    Ignore,
    Replace,
}

impl Conflict {
    pub fn keyword(&self) -> &'static str {
        match self {
            Conflict::Abort => "ABORT",
            Conflict::Rollback => "ROLLBACK",
            Conflict::Fail => "FAIL",
            Conflict::Ignore => "IGNORE",
            Conflict::Replace => "REPLACE",
        }
    }
}

/// Action taken on referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl FkAction {
    pub fn keyword(&self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
            FkAction::Cascade => "CASCADE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub target_table: &'static str,
    pub target_column: &'static str,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

// ------------- Accessors -------------

/// Uniform access to one column's slot on a record.
pub trait Access<R> {
    fn get(&self, record: &R) -> Value;
    fn set(&self, record: &mut R, value: Value) -> Result<()>;
}

/// Direct field access.
pub struct FieldAccess<R> {
    read: fn(&R) -> Value,
    write: fn(&mut R, Value) -> Result<()>,
}

impl<R> FieldAccess<R> {
    pub fn new(read: fn(&R) -> Value, write: fn(&mut R, Value) -> Result<()>) -> Self {
        Self { read, write }
    }
}

impl<R> Access<R> for FieldAccess<R> {
    fn get(&self, record: &R) -> Value {
        (self.read)(record)
    }
    fn set(&self, record: &mut R, value: Value) -> Result<()> {
        (self.write)(record, value)
    }
}

/// Getter/setter pair access, for records that keep their fields private.
pub struct AccessorPair<R> {
    getter: fn(&R) -> Value,
    setter: fn(&mut R, Value) -> Result<()>,
}

impl<R> AccessorPair<R> {
    pub fn new(getter: fn(&R) -> Value, setter: fn(&mut R, Value) -> Result<()>) -> Self {
        Self { getter, setter }
    }
}

impl<R> Access<R> for AccessorPair<R> {
    fn get(&self, record: &R) -> Value {
        (self.getter)(record)
    }
    fn set(&self, record: &mut R, value: Value) -> Result<()> {
        (self.setter)(record, value)
    }
}

// ------------- Column descriptors -------------

/// Type-erased column metadata, shared by DDL rendering and the registry.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub not_null_conflict: Conflict,
    pub primary_key: Option<Conflict>,
    pub unique: Option<Conflict>,
    pub foreign_key: Option<ForeignKeyInfo>,
}

impl ColumnInfo {
    /// One column's DDL fragment. Constraint order is fixed:
    /// NOT NULL, PRIMARY KEY, UNIQUE, REFERENCES — regardless of the
    /// order constraints were declared in.
    pub fn ddl_fragment(&self) -> String {
        let mut out = format!("`{}` {}", self.name, self.sql_type.keyword());
        if !self.nullable {
            out.push_str(&format!(" NOT NULL ON CONFLICT {}", self.not_null_conflict.keyword()));
        }
        if let Some(conflict) = self.primary_key {
            out.push_str(&format!(" PRIMARY KEY ON CONFLICT {}", conflict.keyword()));
        }
        if let Some(conflict) = self.unique {
            out.push_str(&format!(" UNIQUE ON CONFLICT {}", conflict.keyword()));
        }
        if let Some(fk) = &self.foreign_key {
            out.push_str(&format!(
                " REFERENCES `{}` (`{}`) ON UPDATE {} ON DELETE {}",
                fk.target_table,
                fk.target_column,
                fk.on_update.keyword(),
                fk.on_delete.keyword()
            ));
        }
        out
    }
}

/// One column under construction: metadata plus the record accessor.
pub struct Column<R> {
    info: ColumnInfo,
    access: Box<dyn Access<R>>,
}

impl<R> Column<R> {
    pub fn new(name: &'static str, sql_type: SqlType, access: impl Access<R> + 'static) -> Self {
        Self {
            info: ColumnInfo {
                name,
                sql_type,
                nullable: false,
                not_null_conflict: Conflict::default(),
                primary_key: None,
                unique: None,
                foreign_key: None,
            },
            access: Box::new(access),
        }
    }

    /// Columns are NOT NULL unless explicitly made nullable.
    pub fn nullable(mut self) -> Self {
        self.info.nullable = true;
        self
    }

    pub fn not_null_on_conflict(mut self, conflict: Conflict) -> Self {
        self.info.nullable = false;
        self.info.not_null_conflict = conflict;
        self
    }

    pub fn primary_key(mut self, conflict: Conflict) -> Self {
        self.info.primary_key = Some(conflict);
        self
    }

    pub fn unique(mut self, conflict: Conflict) -> Self {
        self.info.unique = Some(conflict);
        self
    }

    pub fn references(
        mut self,
        table: &'static str,
        column: &'static str,
        on_update: FkAction,
        on_delete: FkAction,
    ) -> Self {
        self.info.foreign_key = Some(ForeignKeyInfo {
            target_table: table,
            target_column: column,
            on_update,
            on_delete,
        });
        self
    }
}

// ------------- Table descriptors -------------

/// Type-erased table metadata: everything needed for DDL, fixed-shape DML
/// text and schema-wide validation, with no record type attached.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: &'static str,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.primary_key.is_some())
    }

    fn primary_key_or_err(&self) -> Result<&ColumnInfo> {
        self.primary_key().ok_or(RelatableError::NoPrimaryKey(self.name))
    }

    /// An INTEGER primary key aliases the rowid; inserts leave it to the
    /// engine and read it back afterwards.
    pub fn rowid_position(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.primary_key.is_some() && c.sql_type == SqlType::Integer)
    }

    pub fn create_table_query(&self, if_not_exists: bool) -> String {
        let mut out = if if_not_exists {
            format!("CREATE TABLE IF NOT EXISTS {} (\n", self.name)
        } else {
            format!("CREATE TABLE {} (\n", self.name)
        };
        for (i, column) in self.columns.iter().enumerate() {
            out.push_str("    ");
            out.push_str(&column.ddl_fragment());
            if i + 1 < self.columns.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str(");");
        out
    }

    fn qualified_column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("`{}`.`{}`", self.name, c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT <all columns> FROM <table>` — the base of the fixed shapes.
    pub fn select_all_query(&self) -> String {
        format!("SELECT {}\nFROM {}", self.qualified_column_list(), self.name)
    }

    pub fn find_query(&self) -> Result<String> {
        let pk = self.primary_key_or_err()?;
        Ok(format!(
            "{}\nWHERE `{}`.`{}` = ?\nLIMIT 1",
            self.select_all_query(),
            self.name,
            pk.name
        ))
    }

    pub fn first_query(&self) -> String {
        format!("{}\nLIMIT 1", self.select_all_query())
    }

    pub fn last_query(&self) -> Result<String> {
        let pk = self.primary_key_or_err()?;
        Ok(format!(
            "{}\nORDER BY `{}`.`{}` DESC\nLIMIT 1",
            self.select_all_query(),
            self.name,
            pk.name
        ))
    }

    /// Multi-row insert text. The rowid alias, if any, is left unbound so
    /// the engine assigns it.
    pub fn insert_query(&self, rows: usize) -> String {
        let rowid = self.rowid_position();
        let bound: Vec<&ColumnInfo> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != rowid)
            .map(|(_, c)| c)
            .collect();
        let names = bound.iter().map(|c| format!("`{}`", c.name)).collect::<Vec<_>>().join(", ");
        let one_row = format!("({})", vec!["?"; bound.len()].join(", "));
        let values = vec![one_row; rows.max(1)].join(", ");
        format!("INSERT INTO {} ({}) VALUES {}", self.name, names, values)
    }

    /// `UPDATE` by primary key: every other column in declaration order,
    /// then the key as the final parameter.
    pub fn update_query(&self) -> Result<String> {
        let pk = self.primary_key_or_err()?;
        let assignments = self
            .columns
            .iter()
            .filter(|c| c.name != pk.name)
            .map(|c| format!("`{}` = ?", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("UPDATE {} SET {} WHERE `{}` = ?", self.name, assignments, pk.name))
    }

    pub fn delete_by_key_query(&self) -> Result<String> {
        let pk = self.primary_key_or_err()?;
        Ok(format!("DELETE FROM {}\nWHERE `{}` = ?", self.name, pk.name))
    }
}

/// Collects columns for a table and validates the whole on `build`.
pub struct TableBuilder<R> {
    name: &'static str,
    columns: Vec<Column<R>>,
}

impl<R> TableBuilder<R> {
    pub fn column(mut self, column: Column<R>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn build(self) -> Result<Table<R>> {
        let mut seen: HashMap<&'static str, (), NameHasher> = HashMap::default();
        let mut primary_keys = 0;
        for column in &self.columns {
            if seen.insert(column.info.name, ()).is_some() {
                return Err(RelatableError::DuplicateColumn {
                    table: self.name,
                    column: column.info.name,
                });
            }
            if column.info.primary_key.is_some() {
                primary_keys += 1;
            }
        }
        if primary_keys > 1 {
            return Err(RelatableError::MultiplePrimaryKeys(self.name));
        }
        let (infos, access): (Vec<_>, Vec<_>) =
            self.columns.into_iter().map(|c| (c.info, c.access)).unzip();
        Ok(Table {
            info: TableInfo { name: self.name, columns: infos },
            access,
        })
    }
}

/// A validated table descriptor for record type `R`.
pub struct Table<R> {
    info: TableInfo,
    access: Vec<Box<dyn Access<R>>>,
}

impl<R> Table<R> {
    pub fn new(name: &'static str) -> TableBuilder<R> {
        TableBuilder { name, columns: Vec::new() }
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    pub fn n_columns(&self) -> usize {
        self.info.columns.len()
    }

    pub fn column_name(&self, index: usize) -> &'static str {
        self.info.columns[index].name
    }

    pub(crate) fn access(&self, index: usize) -> &dyn Access<R> {
        self.access[index].as_ref()
    }

    /// A typed reference to one of this table's columns.
    pub fn field(&self, name: &str) -> Result<FieldRef> {
        match self.info.column(name) {
            Some(column) => Ok(FieldRef::new(self.info.name, column.name)),
            None => Err(RelatableError::UnknownColumn {
                table: self.info.name.to_owned(),
                column: name.to_owned(),
            }),
        }
    }

    pub fn primary_key_field(&self) -> Result<FieldRef> {
        let pk = self.info.primary_key().ok_or(RelatableError::NoPrimaryKey(self.info.name))?;
        Ok(FieldRef::new(self.info.name, pk.name))
    }

    pub(crate) fn pk_position(&self) -> Option<usize> {
        self.info.columns.iter().position(|c| c.primary_key.is_some())
    }

    pub(crate) fn rowid_position(&self) -> Option<usize> {
        self.info.rowid_position()
    }

    pub fn create_table_query(&self, if_not_exists: bool) -> String {
        self.info.create_table_query(if_not_exists)
    }
}

// ------------- Schema registry -------------

/// The full table set known to a connection, validated once and immutable
/// afterwards. Owns the foreign-key graph used for join resolution.
pub struct Schema {
    tables: Vec<TableInfo>,
    index: HashMap<&'static str, usize, NameHasher>,
    graph: RelationGraph,
}

impl Schema {
    pub fn new(tables: Vec<TableInfo>) -> Result<Self> {
        let mut index: HashMap<&'static str, usize, NameHasher> = HashMap::default();
        for (i, table) in tables.iter().enumerate() {
            if index.insert(table.name, i).is_some() {
                return Err(RelatableError::DuplicateTable(table.name));
            }
        }
        for table in &tables {
            for column in &table.columns {
                if let Some(fk) = &column.foreign_key {
                    let known = index
                        .get(fk.target_table)
                        .map(|i| &tables[*i])
                        .and_then(|t| t.column(fk.target_column));
                    if known.is_none() {
                        return Err(RelatableError::UnknownForeignKeyTarget {
                            table: table.name,
                            column: column.name,
                            target: fk.target_table,
                            target_column: fk.target_column,
                        });
                    }
                }
            }
        }
        let graph = RelationGraph::build(&tables);
        Ok(Self { tables, index, graph })
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Result<&TableInfo> {
        self.index
            .get(name)
            .map(|i| &self.tables[*i])
            .ok_or_else(|| RelatableError::UnknownTable(name.to_owned()))
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    /// Composition check: the field must name a known table and column.
    pub(crate) fn check_field(&self, field: FieldRef) -> Result<()> {
        let table = self.table(field.table)?;
        if table.column(field.column).is_none() {
            return Err(RelatableError::UnknownColumn {
                table: field.table.to_owned(),
                column: field.column.to_owned(),
            });
        }
        Ok(())
    }
}
