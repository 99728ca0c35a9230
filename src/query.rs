//! Query composition and SQL assembly.
//!
//! A [`Select`] or [`Delete`] is an accumulation of clauses, checked as it
//! is composed: joins must attach to tables already reachable from the
//! FROM table, and a delete refuses joins outright. [`Select::compile`]
//! and [`Delete::compile`] are pure functions of the clause list — they
//! render the canonical SQL text in fixed grammar order and thread the
//! bound parameters in placeholder order, touching no state.

use crate::error::{RelatableError, Result};
use crate::field::{FieldRef, Predicate};
use crate::schema::{Schema, Table};
use crate::value::Value;

// ------------- Clause vocabulary -------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn keyword(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
enum SelectItem {
    Table(&'static str),
    Field(FieldRef),
    Count(FieldRef),
    CountAll,
}

#[derive(Debug, Clone)]
struct JoinClause {
    table: &'static str,
    on: (FieldRef, FieldRef),
}

/// Rendered SQL text plus its parameter plan, ready to prepare and bind.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub params: Vec<Value>,
}

// ------------- Select -------------

/// A select query under composition.
pub struct Select<'s> {
    schema: &'s Schema,
    items: Vec<SelectItem>,
    from: &'static str,
    joins: Vec<JoinClause>,
    reachable: Vec<&'static str>,
    predicate: Option<Predicate>,
    group: Vec<FieldRef>,
    order: Vec<(FieldRef, Order)>,
    limit: Option<u64>,
}

impl Schema {
    fn new_select(&self, items: Vec<SelectItem>, from: &'static str) -> Select<'_> {
        Select {
            schema: self,
            items,
            from,
            joins: Vec::new(),
            reachable: vec![from],
            predicate: None,
            group: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Select every column of one table.
    pub fn select<R>(&self, table: &Table<R>) -> Result<Select<'_>> {
        self.table(table.name())?;
        Ok(self.new_select(vec![SelectItem::Table(table.name())], table.name()))
    }

    /// Select every column of two tables; rows come back as pairs. The
    /// first table is the FROM table, the second must be joined in.
    pub fn select_pair<A, B>(&self, a: &Table<A>, b: &Table<B>) -> Result<Select<'_>> {
        self.table(a.name())?;
        self.table(b.name())?;
        Ok(self.new_select(
            vec![SelectItem::Table(a.name()), SelectItem::Table(b.name())],
            a.name(),
        ))
    }

    /// Select an explicit field list. The first field's table is the FROM
    /// table unless [`Select::from`] overrides it.
    pub fn select_fields(&self, fields: Vec<FieldRef>) -> Result<Select<'_>> {
        let first = fields.first().ok_or(RelatableError::EmptySelect)?;
        for field in &fields {
            self.check_field(*field)?;
        }
        let from = first.table;
        Ok(self.new_select(fields.into_iter().map(SelectItem::Field).collect(), from))
    }

    /// `COUNT(*)` over a table. The explicit table doubles as the FROM
    /// clause, which `COUNT(*)` cannot deduce for itself.
    pub fn count_all<R>(&self, table: &Table<R>) -> Result<Select<'_>> {
        self.table(table.name())?;
        Ok(self.new_select(vec![SelectItem::CountAll], table.name()))
    }

    /// `COUNT(field)`.
    pub fn count_field(&self, field: FieldRef) -> Result<Select<'_>> {
        self.check_field(field)?;
        Ok(self.new_select(vec![SelectItem::Count(field)], field.table))
    }

    /// Start a delete against one table.
    pub fn delete<R>(&self, table: &Table<R>) -> Result<Delete<'_>> {
        self.table(table.name())?;
        Ok(Delete { schema: self, table: table.name(), predicate: None })
    }
}

impl<'s> Select<'s> {
    /// Override the FROM table. Only valid before any join has been
    /// declared, since joins resolve against the reachable set.
    pub fn from<R>(mut self, table: &Table<R>) -> Result<Self> {
        if !self.joins.is_empty() {
            return Err(RelatableError::LateFrom);
        }
        self.schema.table(table.name())?;
        self.from = table.name();
        self.reachable = vec![table.name()];
        Ok(self)
    }

    /// Bare join: the relating foreign key is found in the schema graph.
    /// Fails when no foreign key, or more than one, connects the target to
    /// the tables already in the query.
    pub fn join<R>(mut self, table: &Table<R>) -> Result<Self> {
        let name = table.name();
        self.schema.table(name)?;
        if self.reachable.contains(&name) {
            return Err(RelatableError::AlreadyJoined(name));
        }
        let edge = self.schema.graph().resolve(name, &self.reachable)?;
        self.joins.push(JoinClause { table: name, on: (edge.source, edge.target) });
        self.reachable.push(name);
        Ok(self)
    }

    /// Explicit field-pair join. The fields may come in either order; the
    /// side not yet reachable is the table being joined.
    pub fn join_on(mut self, a: FieldRef, b: FieldRef) -> Result<Self> {
        self.schema.check_field(a)?;
        self.schema.check_field(b)?;
        let a_reachable = self.reachable.contains(&a.table);
        let b_reachable = self.reachable.contains(&b.table);
        let joined = match (a_reachable, b_reachable) {
            (true, false) => b.table,
            (false, true) => a.table,
            (true, true) => return Err(RelatableError::AlreadyJoined(b.table)),
            (false, false) => {
                return Err(RelatableError::UnreachableJoin {
                    left: a.to_string(),
                    right: b.to_string(),
                });
            }
        };
        self.joins.push(JoinClause { table: joined, on: (a, b) });
        self.reachable.push(joined);
        Ok(self)
    }

    /// Add to the WHERE tree; multiple calls AND together.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn group_by(mut self, field: FieldRef) -> Self {
        self.group.push(field);
        self
    }

    pub fn order_by(mut self, field: FieldRef, order: Order) -> Self {
        self.order.push((field, order));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    fn check_reachable(&self, table: &'static str) -> Result<()> {
        if self.reachable.contains(&table) {
            Ok(())
        } else {
            Err(RelatableError::SelectionNotReachable(table))
        }
    }

    fn validate(&self) -> Result<()> {
        for item in &self.items {
            match item {
                SelectItem::Table(name) => self.check_reachable(name)?,
                SelectItem::Field(field) | SelectItem::Count(field) => {
                    self.schema.check_field(*field)?;
                    self.check_reachable(field.table)?;
                }
                SelectItem::CountAll => {}
            }
        }
        let mut fields = Vec::new();
        if let Some(predicate) = &self.predicate {
            predicate.fields(&mut fields);
        }
        fields.extend(self.group.iter().copied());
        fields.extend(self.order.iter().map(|(f, _)| *f));
        for field in fields {
            self.schema.check_field(field)?;
            self.check_reachable(field.table)?;
        }
        Ok(())
    }

    /// Render the canonical SQL text and parameter plan. Pure: the output
    /// depends only on the accumulated clauses.
    pub fn compile(&self) -> Result<Compiled> {
        self.validate()?;
        let mut columns = Vec::new();
        for item in &self.items {
            match item {
                SelectItem::Table(name) => {
                    let table = self.schema.table(name)?;
                    for column in &table.columns {
                        columns.push(format!("`{}`.`{}`", table.name, column.name));
                    }
                }
                SelectItem::Field(field) => columns.push(field.qualified()),
                SelectItem::Count(field) => columns.push(format!("COUNT({})", field.qualified())),
                SelectItem::CountAll => columns.push("COUNT(*)".to_owned()),
            }
        }
        let mut sql = format!("SELECT {}\nFROM {}", columns.join(", "), self.from);
        for join in &self.joins {
            sql.push_str(&format!(
                "\nJOIN {} ON {} = {}",
                join.table,
                join.on.0.qualified(),
                join.on.1.qualified()
            ));
        }
        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            let rendered = predicate.render(true, &mut params);
            sql.push_str(&format!("\nWHERE {}", rendered));
        }
        if !self.group.is_empty() {
            let keys = self.group.iter().map(|f| f.qualified()).collect::<Vec<_>>().join(", ");
            sql.push_str(&format!("\nGROUP BY {}", keys));
        }
        if !self.order.is_empty() {
            let keys = self
                .order
                .iter()
                .map(|(f, o)| format!("{} {}", f.qualified(), o.keyword()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!("\nORDER BY {}", keys));
        }
        if let Some(count) = self.limit {
            sql.push_str(&format!("\nLIMIT {}", count));
        }
        Ok(Compiled { sql, params })
    }
}

// ------------- Delete -------------

/// A delete query under composition. The grammar is fixed:
/// `DELETE FROM table [WHERE predicate]` — no joins.
pub struct Delete<'s> {
    schema: &'s Schema,
    table: &'static str,
    predicate: Option<Predicate>,
}

impl<'s> Delete<'s> {
    /// Deletes cannot join; the standard has no such grammar. Present so
    /// the mistake is a diagnosable composition error rather than a
    /// missing method.
    pub fn join<R>(self, _table: &Table<R>) -> Result<Self> {
        Err(RelatableError::DeleteWithJoin)
    }

    /// Add to the WHERE tree; multiple calls AND together.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn compile(&self) -> Result<Compiled> {
        let mut fields = Vec::new();
        if let Some(predicate) = &self.predicate {
            predicate.fields(&mut fields);
        }
        for field in fields {
            self.schema.check_field(field)?;
            if field.table != self.table {
                return Err(RelatableError::SelectionNotReachable(field.table));
            }
        }
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            let rendered = predicate.render(false, &mut params);
            sql.push_str(&format!("\nWHERE {}", rendered));
        }
        Ok(Compiled { sql, params })
    }
}
