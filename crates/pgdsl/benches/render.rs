use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgdsl::{ParamType, SelectQuery, Statement, Table, select, select_from};

pgdsl::table! {
    pub struct Person => "public"."person" {
        #[primary_key]
        id: i64 = "id",
        first_name: String = "first_name",
        last_name: String = "last_name" [nullable],
    }
}

pgdsl::table! {
    pub struct Event => "public"."event" {
        #[primary_key]
        id: i64 = "id",
        name: String = "name",
    }
}

pgdsl::table! {
    pub struct PersonEventLog => "public"."person_event_log" {
        #[primary_key]
        id: i64 = "id",
        person_id: i64 = "person_id",
        event_id: i64 = "event_id",
    }
}

const PERSON: Person = Person::new();
const EVENT: Event = Event::new();
const PERSON_EVENT_LOG: PersonEventLog = PersonEventLog::new();

fn join_query() -> SelectQuery {
    select((&PERSON.first_name, &EVENT.name))
        .from(&PERSON)
        .join(&PERSON_EVENT_LOG)
        .on(PERSON.id.eq_col(&PERSON_EVENT_LOG.person_id))
        .and_then(|q| q.join(&EVENT).on(EVENT.id.eq_col(&PERSON_EVENT_LOG.event_id)))
        .and_then(|q| q.filter(EVENT.name.eq("jProfessionals")))
        .expect("valid query")
}

/// Render the three-table join in both modes.
fn bench_render_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/join");
    let query = join_query();

    for (label, mode) in [
        ("parameterized", ParamType::Parameterized),
        ("inlined", ParamType::Inlined),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &mode, |b, mode| {
            b.iter(|| black_box(query.render(*mode).expect("render")));
        });
    }

    group.finish();
}

/// Build and render the same join from scratch, including scope checks.
fn bench_build_and_render(c: &mut Criterion) {
    c.bench_function("render/build_and_render_join", |b| {
        b.iter(|| black_box(join_query().to_sql().expect("render")));
    });
}

/// WHERE chains of growing length.
fn bench_and_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/and_chain");

    for n in [1, 5, 20, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut query = select_from(&PERSON);
                for i in 0..n {
                    query = query.and(PERSON.id.ne(i as i64)).expect("in scope");
                }
                black_box(query.to_sql().expect("render"));
            });
        });
    }

    group.finish();
}

/// Aliased self-join: every column rebinds to its alias.
fn bench_alias(c: &mut Criterion) {
    c.bench_function("render/alias_self_join", |b| {
        b.iter(|| {
            let a = PERSON.as_alias("a");
            let z = PERSON.as_alias("z");
            let query = select((&a.first_name, &z.first_name))
                .from(&a)
                .join(&z)
                .on(a.last_name.eq_col(&z.last_name))
                .expect("in scope");
            black_box(query.to_sql().expect("render"));
        });
    });
}

criterion_group!(
    benches,
    bench_render_join,
    bench_build_and_render,
    bench_and_chain,
    bench_alias
);
criterion_main!(benches);
