//! Relatable – a type-safe query builder and record mapper for embedded SQLite.
//!
//! Relatable maps plain Rust record types onto relational tables without
//! code generation, derive macros, or required traits on the record type
//! (only `Default`, used when materializing rows). The mapping lives in
//! external descriptors composed once at startup:
//!
//! * A [`schema::Table`] enumerates a record type's columns, their SQL
//!   storage classes and constraints, and how each column reaches its
//!   record field — directly ([`schema::FieldAccess`]) or through a
//!   getter/setter pair ([`schema::AccessorPair`]). Both capabilities are
//!   indistinguishable to every later stage.
//! * A [`schema::Schema`] registers the full table set, validates
//!   foreign-key targets and builds the relation graph joins resolve
//!   against.
//! * [`field::FieldRef`]s derived from tables compose predicate trees;
//!   [`query::Select`]/[`query::Delete`] accumulate clauses and compile to
//!   canonical SQL text with a left-to-right parameter plan.
//! * A [`connection::Connection`] owns one engine handle and a statement
//!   cache for the fixed query shapes (insert, update, find, delete-by-key,
//!   first, last), and drives the pull-based row streams of [`bind`].
//!
//! ## Modules
//! * [`schema`] – table/column/constraint descriptors, accessors, DDL.
//! * [`relate`] – the foreign-key graph and join resolution.
//! * [`field`] – field references and predicate composition.
//! * [`query`] – clause accumulation and the SQL compiler.
//! * [`connection`] – the engine handle, statement cache and operations.
//! * [`bind`] – row materialization and parameter plans.
//! * [`value`] – the bind/column interchange `Value` and storage classes.
//! * [`error`] – one error enum covering composition-time and runtime
//!   failures.
//!
//! ## Quick Start
//! ```
//! use relatable::connection::{Connection, Storage};
//! use relatable::schema::{Column, Conflict, FieldAccess, Schema, Table};
//! use relatable::value::{SqlType, Value};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let users: Table<User> = Table::new("user")
//!     .column(
//!         Column::new("id", SqlType::Integer, FieldAccess::new(
//!             |u: &User| Value::from(u.id),
//!             |u: &mut User, v| { u.id = v.try_into()?; Ok(()) },
//!         ))
//!         .primary_key(Conflict::Abort),
//!     )
//!     .column(Column::new("name", SqlType::Text, FieldAccess::new(
//!         |u: &User| Value::from(u.name.clone()),
//!         |u: &mut User, v| { u.name = v.try_into()?; Ok(()) },
//!     )))
//!     .build()
//!     .unwrap();
//!
//! let schema = Schema::new(vec![users.info().clone()]).unwrap();
//! let conn = Connection::open(Storage::InMemory, schema).unwrap();
//! conn.create_tables(true).unwrap();
//!
//! let mut alice = User { id: 0, name: "Alice".into() };
//! conn.insert(&users, &mut alice).unwrap();
//! assert!(alice.id > 0); // rowid written back
//!
//! let found = conn.find(&users, alice.id).unwrap().expect("row");
//! assert_eq!(found, alice);
//! ```
//!
//! ## Concurrency
//! One connection per thread, strictly: the connection owns its engine
//! handle and statement cache, statement stepping blocks, and nothing in
//! here locks. Schemas and table descriptors are immutable after
//! construction and freely shareable.
//!
//! ## Errors
//! Invalid shapes — duplicate columns, unknown foreign-key targets,
//! unresolvable or ambiguous joins, a delete with a join — are rejected
//! while composing, before any SQL reaches the engine. Engine failures
//! surface as explicit `Err` values; an empty result is `None` or an empty
//! stream, never an error.

pub mod bind;
pub mod connection;
pub mod error;
pub mod field;
pub mod query;
pub mod relate;
pub mod schema;
pub mod value;
