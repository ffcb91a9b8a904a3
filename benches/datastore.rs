use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use datastore::{Database, FieldSpec, FieldType, Predicate, Qualifier, RowRef, Scheme, Value};
use std::hint::black_box;
use std::sync::Arc;

fn scheme() -> Arc<Scheme> {
    Arc::new(
        Scheme::new(vec![
            FieldSpec::new("STB", FieldType::Text).key(),
            FieldSpec::new("TITLE", FieldType::Text).key(),
            FieldSpec::new("REV", FieldType::Float),
            FieldSpec::new("VIEW_TIME", FieldType::Time),
        ])
        .unwrap(),
    )
}

fn insert_view(db: &mut Database, i: usize) {
    let mut row = db.create_row();
    row.set_value(0, Value::from(format!("stb{}", i % 100).as_str()));
    row.set_value(1, Value::from(format!("title{}", i).as_str()));
    row.set_value(2, Value::Float((i % 17) as f64));
    row.set_value(3, FieldType::Time.parse(&format!("{}:{}", i % 4, i % 3600)).unwrap());
    db.insert(row).unwrap();
}

fn setup_populated_db(n: usize) -> Database {
    let mut db = Database::new(scheme());
    for i in 0..n {
        insert_view(&mut db, i);
    }
    db
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("bulk_insert", n), n, |b, &n| {
            b.iter(|| black_box(setup_populated_db(n)));
        });
        group.bench_with_input(BenchmarkId::new("bulk_replace", n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    for i in 0..n {
                        insert_view(&mut db, i);
                    }
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query");

    for n in [1000, 10000].iter() {
        let db = setup_populated_db(*n);
        let filter = Predicate::new(Qualifier::exact(0, Value::from("stb42")));

        group.bench_with_input(BenchmarkId::new("filter", n), n, |b, _| {
            b.iter(|| black_box(db.query(&[1, 2], &filter, &[])));
        });
        group.bench_with_input(BenchmarkId::new("sort_two_fields", n), n, |b, _| {
            b.iter(|| black_box(db.query(&[], &Predicate::always_true(), &[2, 3])));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query);
criterion_main!(benches);
