use relatable::error::RelatableError;
use relatable::field::FieldRef;
use relatable::schema::{Column, Conflict, FieldAccess, FkAction, Schema, Table};
use relatable::value::{SqlType, Value};

// Join resolution never touches record data, so one record shape serves
// every table in these tests.
#[derive(Default)]
struct Rec {
    id: i64,
    other_id: i64,
    text: String,
}

fn id_column() -> Column<Rec> {
    Column::new(
        "id",
        SqlType::Integer,
        FieldAccess::new(
            |r: &Rec| Value::from(r.id),
            |r: &mut Rec, v| {
                r.id = v.try_into()?;
                Ok(())
            },
        ),
    )
    .primary_key(Conflict::Abort)
}

fn text_column(name: &'static str) -> Column<Rec> {
    Column::new(
        name,
        SqlType::Text,
        FieldAccess::new(
            |r: &Rec| Value::from(r.text.clone()),
            |r: &mut Rec, v| {
                r.text = v.try_into()?;
                Ok(())
            },
        ),
    )
}

fn fk_column(name: &'static str, target: &'static str) -> Column<Rec> {
    Column::new(
        name,
        SqlType::Integer,
        FieldAccess::new(
            |r: &Rec| Value::from(r.other_id),
            |r: &mut Rec, v| {
                r.other_id = v.try_into()?;
                Ok(())
            },
        ),
    )
    .references(target, "id", FkAction::NoAction, FkAction::NoAction)
}

fn authors() -> Table<Rec> {
    Table::new("authors")
        .column(id_column())
        .column(text_column("name"))
        .build()
        .expect("table")
}

fn books() -> Table<Rec> {
    Table::new("books")
        .column(id_column())
        .column(fk_column("author_id", "authors"))
        .column(text_column("title"))
        .build()
        .expect("table")
}

fn reviews() -> Table<Rec> {
    Table::new("reviews")
        .column(id_column())
        .column(fk_column("book_id", "books"))
        .column(text_column("body"))
        .build()
        .expect("table")
}

fn tags() -> Table<Rec> {
    // relates to nothing
    Table::new("tags")
        .column(id_column())
        .column(text_column("label"))
        .build()
        .expect("table")
}

fn library() -> (Schema, Table<Rec>, Table<Rec>, Table<Rec>, Table<Rec>) {
    let (a, b, r, t) = (authors(), books(), reviews(), tags());
    let schema = Schema::new(vec![
        a.info().clone(),
        b.info().clone(),
        r.info().clone(),
        t.info().clone(),
    ])
    .expect("schema");
    (schema, a, b, r, t)
}

fn field(table: &Table<Rec>, name: &str) -> FieldRef {
    table.field(name).expect("field")
}

#[test]
fn bare_join_resolves_the_only_edge() {
    let (schema, a, b, _, _) = library();
    let compiled = schema
        .select(&a)
        .expect("select")
        .join(&b)
        .expect("join")
        .compile()
        .expect("compile");
    assert!(
        compiled.sql.contains("JOIN books ON `books`.`author_id` = `authors`.`id`"),
        "condition should be synthesized from the foreign key, got:\n{}",
        compiled.sql
    );
}

#[test]
fn bare_join_matches_explicit_join_on() {
    let (schema, a, b, _, _) = library();
    let bare = schema
        .select(&a)
        .expect("select")
        .join(&b)
        .expect("join")
        .compile()
        .expect("compile");
    let explicit = schema
        .select(&a)
        .expect("select")
        .join_on(field(&b, "author_id"), field(&a, "id"))
        .expect("join_on")
        .compile()
        .expect("compile");
    assert_eq!(bare.sql, explicit.sql);
}

#[test]
fn join_on_accepts_fields_in_either_order() {
    let (schema, a, b, _, _) = library();
    let compiled = schema
        .select(&a)
        .expect("select")
        .join_on(field(&a, "id"), field(&b, "author_id"))
        .expect("join_on")
        .compile()
        .expect("compile");
    assert!(compiled.sql.contains("JOIN books ON `authors`.`id` = `books`.`author_id`"));
}

#[test]
fn bare_join_without_relation_fails() {
    let (schema, a, _, _, t) = library();
    let result = schema.select(&a).expect("select").join(&t);
    assert!(matches!(result, Err(RelatableError::NoRelation { target: "tags" })));
}

#[test]
fn bare_join_with_two_relations_is_ambiguous() {
    let people = authors();
    let contracts = Table::new("contracts")
        .column(id_column())
        .column(fk_column("signer_id", "authors"))
        .column(
            Column::new(
                "witness_id",
                SqlType::Integer,
                FieldAccess::new(
                    |r: &Rec| Value::from(r.other_id),
                    |r: &mut Rec, v| {
                        r.other_id = v.try_into()?;
                        Ok(())
                    },
                ),
            )
            .references("authors", "id", FkAction::NoAction, FkAction::NoAction),
        )
        .build()
        .expect("table");
    let schema =
        Schema::new(vec![people.info().clone(), contracts.info().clone()]).expect("schema");
    let result = schema.select(&people).expect("select").join(&contracts);
    assert!(matches!(
        result,
        Err(RelatableError::AmbiguousRelation { target: "contracts" })
    ));
    // the explicit form still works
    let explicit = schema
        .select(&people)
        .expect("select")
        .join_on(field(&contracts, "signer_id"), field(&people, "id"))
        .expect("join_on")
        .compile()
        .expect("compile");
    assert!(explicit.sql.contains("JOIN contracts ON `contracts`.`signer_id` = `authors`.`id`"));
}

#[test]
fn joins_must_chain_in_order() {
    let (schema, a, b, r, _) = library();
    // reviews only relate to books, which are not in the query yet
    let out_of_order = schema.select(&a).expect("select").join(&r);
    assert!(matches!(
        out_of_order,
        Err(RelatableError::NoRelation { target: "reviews" })
    ));
    // chained in order, both joins resolve
    let chained = schema
        .select(&a)
        .expect("select")
        .join(&b)
        .expect("join books")
        .join(&r)
        .expect("join reviews")
        .compile()
        .expect("compile");
    assert!(chained.sql.contains("JOIN books ON `books`.`author_id` = `authors`.`id`"));
    assert!(chained.sql.contains("JOIN reviews ON `reviews`.`book_id` = `books`.`id`"));
}

#[test]
fn join_on_requires_exactly_one_reachable_side() {
    let (schema, a, b, r, _) = library();
    // neither side reachable from authors
    let neither = schema
        .select(&a)
        .expect("select")
        .join_on(field(&r, "book_id"), field(&b, "id"));
    assert!(matches!(neither, Err(RelatableError::UnreachableJoin { .. })));
    // both sides reachable
    let both = schema
        .select(&a)
        .expect("select")
        .join(&b)
        .expect("join")
        .join_on(field(&b, "author_id"), field(&a, "id"));
    assert!(matches!(both, Err(RelatableError::AlreadyJoined(_))));
}

#[test]
fn joining_the_same_table_twice_fails() {
    let (schema, a, b, _, _) = library();
    let result = schema
        .select(&a)
        .expect("select")
        .join(&b)
        .expect("join")
        .join(&b);
    assert!(matches!(result, Err(RelatableError::AlreadyJoined("books"))));
}

#[test]
fn delete_refuses_joins() {
    let (schema, a, b, _, _) = library();
    let result = schema.delete(&a).expect("delete").join(&b);
    assert!(matches!(result, Err(RelatableError::DeleteWithJoin)));
}

#[test]
fn selected_tables_must_be_joined() {
    let (schema, a, b, _, _) = library();
    let unjoined = schema.select_pair(&a, &b).expect("select").compile();
    assert!(matches!(
        unjoined,
        Err(RelatableError::SelectionNotReachable("books"))
    ));
    let joined = schema
        .select_pair(&a, &b)
        .expect("select")
        .join(&b)
        .expect("join")
        .compile();
    assert!(joined.is_ok());
}
