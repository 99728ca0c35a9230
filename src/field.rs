//! Field references and predicate composition.
//!
//! A [`FieldRef`] is a typed handle to one column on one table, obtained
//! from a table descriptor. Comparison methods on it produce [`Predicate`]
//! leaves; `and`/`or`/`not` build the internal nodes. Rendering a predicate
//! is pure: it walks the tree once, left to right, emitting `?` placeholders
//! and pushing the matching bound values in the same order.

use std::fmt;

use crate::value::Value;

// ------------- Field references -------------

/// A handle to one column on one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl FieldRef {
    pub(crate) fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }

    pub(crate) fn qualified(&self) -> String {
        format!("`{}`.`{}`", self.table, self.column)
    }

    pub(crate) fn bare(&self) -> String {
        format!("`{}`", self.column)
    }

    fn rendered(&self, qualify: bool) -> String {
        if qualify { self.qualified() } else { self.bare() }
    }

    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Eq, value: value.into() }
    }
    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Ne, value: value.into() }
    }
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Lt, value: value.into() }
    }
    pub fn le(self, value: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Le, value: value.into() }
    }
    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Gt, value: value.into() }
    }
    pub fn ge(self, value: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Ge, value: value.into() }
    }
    pub fn like(self, pattern: impl Into<Value>) -> Predicate {
        Predicate::Compare { field: self, op: Op::Like, value: pattern.into() }
    }

    pub fn is_null(self) -> Predicate {
        Predicate::NullCheck { field: self, negated: false }
    }
    pub fn is_not_null(self) -> Predicate {
        Predicate::NullCheck { field: self, negated: true }
    }

    /// Membership test. An empty list renders as `IN (NULL)`, which is
    /// valid SQL and matches no row.
    pub fn in_values<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::In { field: self, values: values.into_iter().map(Into::into).collect() }
    }

    pub fn eq_field(self, other: FieldRef) -> Predicate {
        Predicate::CompareField { left: self, op: Op::Eq, right: other }
    }
    pub fn ne_field(self, other: FieldRef) -> Predicate {
        Predicate::CompareField { left: self, op: Op::Ne, right: other }
    }
    pub fn lt_field(self, other: FieldRef) -> Predicate {
        Predicate::CompareField { left: self, op: Op::Lt, right: other }
    }
    pub fn le_field(self, other: FieldRef) -> Predicate {
        Predicate::CompareField { left: self, op: Op::Le, right: other }
    }
    pub fn gt_field(self, other: FieldRef) -> Predicate {
        Predicate::CompareField { left: self, op: Op::Gt, right: other }
    }
    pub fn ge_field(self, other: FieldRef) -> Predicate {
        Predicate::CompareField { left: self, op: Op::Ge, right: other }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

// ------------- Operators -------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
        }
    }
}

// ------------- Predicate trees -------------

/// A WHERE-clause expression tree.
///
/// Leaves compare a field against a literal or another field; internal
/// nodes combine with AND/OR/NOT. The left-to-right order of leaves is
/// fixed at construction and is exactly the bind order of the parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare { field: FieldRef, op: Op, value: Value },
    CompareField { left: FieldRef, op: Op, right: FieldRef },
    NullCheck { field: FieldRef, negated: bool },
    In { field: FieldRef, values: Vec<Value> },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Render to SQL text, appending bound values to `params` in the same
    /// left-to-right order as the emitted `?` placeholders.
    pub(crate) fn render(&self, qualify: bool, params: &mut Vec<Value>) -> String {
        match self {
            Predicate::Compare { field, op, value } => {
                params.push(value.clone());
                format!("{} {} ?", field.rendered(qualify), op.symbol())
            }
            Predicate::CompareField { left, op, right } => {
                format!("{} {} {}", left.rendered(qualify), op.symbol(), right.rendered(qualify))
            }
            Predicate::NullCheck { field, negated } => {
                let check = if *negated { "IS NOT NULL" } else { "IS NULL" };
                format!("{} {}", field.rendered(qualify), check)
            }
            Predicate::In { field, values } => {
                if values.is_empty() {
                    return format!("{} IN (NULL)", field.rendered(qualify));
                }
                params.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{} IN ({})", field.rendered(qualify), placeholders)
            }
            Predicate::And(left, right) => {
                let l = left.render(qualify, params);
                let r = right.render(qualify, params);
                format!("({} AND {})", l, r)
            }
            Predicate::Or(left, right) => {
                let l = left.render(qualify, params);
                let r = right.render(qualify, params);
                format!("({} OR {})", l, r)
            }
            Predicate::Not(inner) => {
                format!("NOT ({})", inner.render(qualify, params))
            }
        }
    }

    /// Collect every field the tree mentions, for composition checks.
    pub(crate) fn fields(&self, out: &mut Vec<FieldRef>) {
        match self {
            Predicate::Compare { field, .. }
            | Predicate::NullCheck { field, .. }
            | Predicate::In { field, .. } => out.push(*field),
            Predicate::CompareField { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.fields(out);
                right.fields(out);
            }
            Predicate::Not(inner) => inner.fields(out),
        }
    }
}
