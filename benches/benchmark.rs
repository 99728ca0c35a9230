use criterion::{Criterion, black_box, criterion_group, criterion_main};

use relatable::connection::{Connection, Storage};
use relatable::schema::{Column, Conflict, FieldAccess, Schema, Table};
use relatable::value::{SqlType, Value};

#[derive(Default, Debug, Clone, PartialEq)]
struct Entry {
    id: i64,
    name: String,
    score: f64,
}

fn entry_table() -> Table<Entry> {
    Table::new("entry")
        .column(
            Column::new(
                "id",
                SqlType::Integer,
                FieldAccess::new(
                    |e: &Entry| Value::from(e.id),
                    |e: &mut Entry, v| {
                        e.id = v.try_into()?;
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
                |e: &Entry| Value::from(e.name.clone()),
                |e: &mut Entry, v| {
                    e.name = v.try_into()?;
                    Ok(())
                },
            ),
        ))
        .column(Column::new(
            "score",
            SqlType::Real,
            FieldAccess::new(
                |e: &Entry| Value::from(e.score),
                |e: &mut Entry, v| {
                    e.score = v.try_into()?;
                    Ok(())
                },
            ),
        ))
        .build()
        .expect("table")
}

fn compile_select(c: &mut Criterion) {
    let table = entry_table();
    let schema = Schema::new(vec![table.info().clone()]).expect("schema");
    let name = table.field("name").expect("field");
    let score = table.field("score").expect("field");
    c.bench_function("compile filtered select", |bencher| {
        bencher.iter(|| {
            let compiled = schema
                .select(&table)
                .expect("select")
                .filter(name.like(black_box("a%")).and(score.gt(black_box(0.5))))
                .limit(100)
                .compile()
                .expect("compile");
            black_box(compiled)
        })
    });
}

fn render_ddl(c: &mut Criterion) {
    let table = entry_table();
    c.bench_function("render create table", |bencher| {
        bencher.iter(|| black_box(table.create_table_query(black_box(false))))
    });
}

fn cached_insert_find(c: &mut Criterion) {
    let table = entry_table();
    let schema = Schema::new(vec![table.info().clone()]).expect("schema");
    let conn = Connection::open(Storage::InMemory, schema).expect("open");
    conn.create_tables(false).expect("create");
    c.bench_function("cached insert and find", |bencher| {
        bencher.iter(|| {
            let mut entry = Entry { id: 0, name: "bench".to_owned(), score: 1.5 };
            conn.insert(&table, &mut entry).expect("insert");
            let found = conn.find(&table, entry.id).expect("find").expect("row");
            black_box(found)
        })
    });
}

criterion_group!(benches, compile_select, render_ddl, cached_insert_find);
criterion_main!(benches);
