use chrono::NaiveDate;
use relatable::connection::{Connection, Storage};
use relatable::error::RelatableError;
use relatable::query::Order;
use relatable::schema::{Column, Conflict, FieldAccess, Schema, Table};
use relatable::value::{SqlType, Value};

#[derive(Default, Debug, Clone, PartialEq)]
struct Person {
    id: i64,
    name: String,
    age: i64,
    email: Option<String>,
    born: Option<NaiveDate>,
}

fn person_table() -> Table<Person> {
    Table::new("person")
        .column(
            Column::new(
                "id",
                SqlType::Integer,
                FieldAccess::new(
                    |p: &Person| Value::from(p.id),
                    |p: &mut Person, v| {
                        p.id = v.try_into()?;
                        Ok(())
                    },
                ),
            )
            .primary_key(Conflict::Abort),
        )
        .column(Column::new(
            "name",
            SqlType::Text,
            FieldAccess::new(
                |p: &Person| Value::from(p.name.clone()),
                |p: &mut Person, v| {
                    p.name = v.try_into()?;
                    Ok(())
                },
            ),
        ))
        .column(Column::new(
            "age",
            SqlType::Integer,
            FieldAccess::new(
                |p: &Person| Value::from(p.age),
                |p: &mut Person, v| {
                    p.age = v.try_into()?;
                    Ok(())
                },
            ),
        ))
        .column(
            Column::new(
                "email",
                SqlType::Text,
                FieldAccess::new(
                    |p: &Person| Value::from(p.email.clone()),
                    |p: &mut Person, v| {
                        p.email = v.try_into()?;
                        Ok(())
                    },
                ),
            )
            .nullable(),
        )
        .column(
            Column::new(
                "born",
                SqlType::Text,
                FieldAccess::new(
                    |p: &Person| Value::from(p.born),
                    |p: &mut Person, v| {
                        p.born = v.try_into()?;
                        Ok(())
                    },
                ),
            )
            .nullable(),
        )
        .build()
        .expect("table")
}

fn setup() -> (Connection, Table<Person>) {
    // opt-in log output: RUST_LOG=relatable=trace cargo test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let table = person_table();
    let schema = Schema::new(vec![table.info().clone()]).expect("schema");
    let conn = Connection::open(Storage::InMemory, schema).expect("open");
    conn.create_tables(false).expect("create");
    (conn, table)
}

fn alice() -> Person {
    Person {
        id: 0,
        name: "Alice".to_owned(),
        age: 34,
        email: Some("alice@example.com".to_owned()),
        born: NaiveDate::from_ymd_opt(1991, 6, 19),
    }
}

#[test]
fn insert_assigns_rowid_and_find_round_trips() {
    let (conn, table) = setup();
    let mut person = alice();
    conn.insert(&table, &mut person).expect("insert");
    assert!(person.id > 0, "rowid should be written back");
    let found = conn.find(&table, person.id).expect("find").expect("row");
    assert_eq!(found, person, "every field should survive the round trip");
}

#[test]
fn find_missing_is_none_not_an_error() {
    let (conn, table) = setup();
    let found = conn.find(&table, 999i64).expect("find");
    assert!(found.is_none());
}

#[test]
fn null_fields_round_trip() {
    let (conn, table) = setup();
    let mut person = Person { name: "Bob".to_owned(), age: 51, ..Person::default() };
    conn.insert(&table, &mut person).expect("insert");
    let found = conn.find(&table, person.id).expect("find").expect("row");
    assert_eq!(found.email, None);
    assert_eq!(found.born, None);
}

#[test]
fn update_changes_only_the_targeted_row() {
    let (conn, table) = setup();
    let mut a = alice();
    let mut b = Person { name: "Bob".to_owned(), age: 51, ..Person::default() };
    conn.insert(&table, &mut a).expect("insert");
    conn.insert(&table, &mut b).expect("insert");

    a.age = 35;
    conn.update(&table, &a).expect("update");

    let found_a = conn.find(&table, a.id).expect("find").expect("row");
    let found_b = conn.find(&table, b.id).expect("find").expect("row");
    assert_eq!(found_a.age, 35);
    assert_eq!(found_b, b);
}

#[test]
fn delete_by_key_removes_the_row() {
    let (conn, table) = setup();
    let mut person = alice();
    conn.insert(&table, &mut person).expect("insert");
    conn.delete_by_key(&table, person.id).expect("delete");
    assert!(conn.find(&table, person.id).expect("find").is_none());
}

#[test]
fn first_and_last_follow_primary_key_order() {
    let (conn, table) = setup();
    for name in ["one", "two", "three"] {
        let mut person = Person { name: name.to_owned(), ..Person::default() };
        conn.insert(&table, &mut person).expect("insert");
    }
    let first = conn.first(&table).expect("first").expect("row");
    let last = conn.last(&table).expect("last").expect("row");
    assert_eq!(first.name, "one");
    assert_eq!(last.name, "three");
    assert!(first.id < last.id);
}

#[test]
fn first_on_empty_table_is_none() {
    let (conn, table) = setup();
    assert!(conn.first(&table).expect("first").is_none());
    assert!(conn.last(&table).expect("last").is_none());
}

#[test]
fn insert_many_round_trips_in_order() {
    let (conn, table) = setup();
    let people: Vec<Person> = (0..25)
        .map(|i| Person { name: format!("p{i}"), age: i, ..Person::default() })
        .collect();
    conn.insert_many(&table, &people, 10).expect("insert_many");

    let count = conn.count(&conn.schema().count_all(&table).expect("count")).expect("count");
    assert_eq!(count, 25);

    let select = conn
        .select(&table)
        .expect("select")
        .order_by(table.field("id").expect("field"), Order::Asc);
    let fetched = conn.fetch_all(&table, &select).expect("fetch");
    let names: Vec<&str> = fetched.iter().map(|p| p.name.as_str()).collect();
    let expected: Vec<String> = (0..25).map(|i| format!("p{i}")).collect();
    assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn truncate_empties_the_table() {
    let (conn, table) = setup();
    let mut person = alice();
    conn.insert(&table, &mut person).expect("insert");
    conn.truncate(&table).expect("truncate");
    let count = conn.count(&conn.schema().count_all(&table).expect("count")).expect("count");
    assert_eq!(count, 0);
}

#[test]
fn count_tables_sees_the_created_schema() {
    let (conn, _table) = setup();
    assert_eq!(conn.count_tables().expect("count"), 1);
}

#[test]
fn count_field_counts_non_null_values() {
    let (conn, table) = setup();
    let mut with_email = alice();
    let mut without_email = Person { name: "Bob".to_owned(), ..Person::default() };
    conn.insert(&table, &mut with_email).expect("insert");
    conn.insert(&table, &mut without_email).expect("insert");
    let email = table.field("email").expect("field");
    let count = conn.count(&conn.schema().count_field(email).expect("select")).expect("count");
    assert_eq!(count, 1, "COUNT(column) skips NULLs");
}

#[test]
fn failed_transaction_rolls_back() {
    let (conn, table) = setup();
    let result: Result<(), RelatableError> = conn.transaction(|| {
        let mut person = alice();
        conn.insert(&table, &mut person)?;
        Err(RelatableError::Incomplete)
    });
    assert!(result.is_err());
    let count = conn.count(&conn.schema().count_all(&table).expect("count")).expect("count");
    assert_eq!(count, 0, "rollback should discard the insert");
}

#[test]
fn repeated_cached_operations_stay_consistent() {
    // find/delete share one cached statement per table; only the bound
    // key changes between calls
    let (conn, table) = setup();
    let mut people: Vec<Person> = (0..5)
        .map(|i| Person { name: format!("p{i}"), ..Person::default() })
        .collect();
    for person in &mut people {
        conn.insert(&table, person).expect("insert");
    }
    for person in &people {
        let found = conn.find(&table, person.id).expect("find").expect("row");
        assert_eq!(&found, person);
    }
    for person in &people {
        conn.delete_by_key(&table, person.id).expect("delete");
    }
    for person in &people {
        assert!(conn.find(&table, person.id).expect("find").is_none());
    }
}
