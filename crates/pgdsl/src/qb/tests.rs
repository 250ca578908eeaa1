use crate::error::OrmError;
use crate::qb::{
    Mutation, Statement, StatementKind, delete_from, field, insert_into, select, select_all,
    select_from, table, update,
};
use crate::render::{KeywordCase, ParamType, PlaceholderStyle, RenderSettings};
use crate::schema::Table;
use crate::test_support::{EVENT, MockClient, PERSON, PERSON_EVENT_LOG, text};
use crate::value::Value;

fn question() -> RenderSettings {
    RenderSettings::new().with_placeholder(PlaceholderStyle::Question)
}

/// Replace each `?` placeholder with the literal of the matching parameter.
fn substitute(stmt: &impl Statement) -> String {
    let rendered = stmt.render_with(ParamType::Parameterized, &question()).unwrap();
    assert_eq!(rendered.sql.matches('?').count(), rendered.params.len());
    let mut parts = rendered.sql.split('?');
    let mut out = parts.next().unwrap_or_default().to_string();
    for (part, value) in parts.zip(&rendered.params) {
        out.push_str(&value.to_literal());
        out.push_str(part);
    }
    out
}

fn person_event_query(event_name: &str) -> crate::qb::SelectQuery {
    select((&PERSON.first_name, &EVENT.name))
        .from(&PERSON)
        .join(&PERSON_EVENT_LOG)
        .on(PERSON.id.eq_col(&PERSON_EVENT_LOG.person_id))
        .unwrap()
        .join(&EVENT)
        .on(EVENT.id.eq_col(&PERSON_EVENT_LOG.event_id))
        .unwrap()
        .filter(EVENT.name.eq(event_name))
        .unwrap()
}

// ==================== SELECT rendering ====================

#[test]
fn join_query_renders_one_placeholder() {
    let query = person_event_query("any_value");
    let rendered = query
        .render_with(ParamType::Parameterized, &question())
        .unwrap();
    assert_eq!(
        rendered.sql,
        r#"select "public"."person"."first_name", "public"."event"."name" from "public"."person" join "public"."person_event_log" on "public"."person"."id" = "public"."person_event_log"."person_id" join "public"."event" on "public"."event"."id" = "public"."person_event_log"."event_id" where "public"."event"."name" = ?"#
    );
    assert_eq!(rendered.params, vec![text("any_value")]);
}

#[test]
fn default_settings_use_dollar_placeholders() {
    let sql = person_event_query("x").to_sql().unwrap();
    assert!(sql.ends_with(r#"where "public"."event"."name" = $1"#));
}

#[test]
fn aliased_tables_render_with_as() {
    let p = PERSON.as_alias("p");
    let pel = PERSON_EVENT_LOG.as_alias("pel");
    let e = EVENT.as_alias("e");

    let query = select((&p.first_name, &e.name))
        .from(&p)
        .join(&pel)
        .on(p.id.eq_col(&pel.person_id))
        .unwrap()
        .join(&e)
        .on(e.id.eq_col(&pel.event_id))
        .unwrap()
        .filter(e.name.equal_ignore_case("jProfessionals"))
        .unwrap();

    assert_eq!(
        query.to_inlined_sql().unwrap(),
        r#"select "p"."first_name", "e"."name" from "public"."person" as "p" join "public"."person_event_log" as "pel" on "p"."id" = "pel"."person_id" join "public"."event" as "e" on "e"."id" = "pel"."event_id" where lower("e"."name") = lower('jProfessionals')"#
    );
}

#[test]
fn select_from_spells_out_columns_in_schema_order() {
    assert_eq!(
        select_from(&PERSON).to_sql().unwrap(),
        r#"select "public"."person"."id", "public"."person"."first_name", "public"."person"."last_name" from "public"."person""#
    );
}

#[test]
fn empty_projection_covers_every_joined_table_in_order() {
    let query = select_all()
        .from(&PERSON)
        .join(&PERSON_EVENT_LOG)
        .on(PERSON.id.eq_col(&PERSON_EVENT_LOG.person_id))
        .unwrap();
    let names: Vec<String> = query
        .resolve_projection()
        .unwrap()
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "public.person.id",
            "public.person.first_name",
            "public.person.last_name",
            "public.person_event_log.id",
            "public.person_event_log.person_id",
            "public.person_event_log.event_id",
        ]
    );
}

#[test]
fn self_join_is_distinguished_by_alias() {
    let a = PERSON.as_alias("a");
    let b = PERSON.as_alias("b");
    let query = select((&a.first_name, &b.first_name))
        .from(&a)
        .left_join(&b)
        .on(a.last_name.eq_col(&b.last_name))
        .unwrap()
        .filter(a.id.lt(10))
        .unwrap();
    assert_eq!(
        query.to_sql().unwrap(),
        r#"select "a"."first_name", "b"."first_name" from "public"."person" as "a" left join "public"."person" as "b" on "a"."last_name" = "b"."last_name" where "a"."id" < $1"#
    );
}

#[test]
fn and_chains_number_placeholders_left_to_right() {
    let query = select_from(&PERSON)
        .filter(PERSON.first_name.eq("Ada"))
        .unwrap()
        .and(PERSON.last_name.is_not_null())
        .unwrap()
        .and(PERSON.id.ge(3))
        .unwrap();
    let rendered = query.render(ParamType::Parameterized).unwrap();
    assert!(rendered.sql.ends_with(
        r#"where "public"."person"."first_name" = $1 and "public"."person"."last_name" is not null and "public"."person"."id" >= $2"#
    ));
    assert_eq!(rendered.params, vec![text("Ada"), Value::Int(3)]);
}

#[test]
fn order_by_limit_offset() {
    let query = select((&PERSON.first_name,))
        .from(&PERSON)
        .order_by(PERSON.last_name.desc())
        .unwrap()
        .order_by(&PERSON.first_name)
        .unwrap()
        .limit(10)
        .offset(20);
    assert_eq!(
        query.to_sql().unwrap(),
        r#"select "public"."person"."first_name" from "public"."person" order by "public"."person"."last_name" desc, "public"."person"."first_name" asc limit 10 offset 20"#
    );
}

#[test]
fn upper_case_keywords() {
    let settings = RenderSettings::new().with_keyword_case(KeywordCase::Upper);
    let rendered = select_from(&EVENT)
        .filter(EVENT.name.is_null())
        .unwrap()
        .render_with(ParamType::Inlined, &settings)
        .unwrap();
    assert_eq!(
        rendered.sql,
        r#"SELECT "public"."event"."id", "public"."event"."name" FROM "public"."event" WHERE "public"."event"."name" IS NULL"#
    );
}

#[test]
fn rendering_is_pure() {
    let query = person_event_query("jProfessionals");
    let first = query.render(ParamType::Parameterized).unwrap();
    let second = query.render(ParamType::Parameterized).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        query.render(ParamType::Inlined).unwrap(),
        query.render(ParamType::Inlined).unwrap()
    );
}

#[test]
fn parameterized_with_substitution_equals_inlined() {
    let select_query = select_from(&PERSON)
        .filter(PERSON.first_name.eq("O'Brien"))
        .unwrap()
        .and(PERSON.id.ne(7))
        .unwrap();
    assert_eq!(
        substitute(&select_query),
        select_query.to_inlined_sql().unwrap()
    );

    let joined = person_event_query("Devoxx '24");
    assert_eq!(substitute(&joined), joined.to_inlined_sql().unwrap());

    let insert = insert_into(&PERSON)
        .set(&PERSON.first_name, "Ada")
        .unwrap()
        .set_null(&PERSON.last_name)
        .unwrap();
    assert_eq!(substitute(&insert), insert.to_inlined_sql().unwrap());

    let upd = update(&PERSON)
        .set(&PERSON.last_name, "Lovelace")
        .unwrap()
        .filter(PERSON.id.eq(1))
        .unwrap();
    assert_eq!(substitute(&upd), upd.to_inlined_sql().unwrap());
}

// ==================== SELECT errors ====================

#[test]
fn filter_on_table_not_in_scope_is_a_reference_error() {
    let err = select_from(&PERSON)
        .filter(EVENT.name.eq("x"))
        .unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn on_condition_outside_scope_is_a_reference_error() {
    let err = select_from(&PERSON)
        .join(&EVENT)
        .on(PERSON_EVENT_LOG.event_id.eq_col(&EVENT.id))
        .unwrap_err();
    match err {
        OrmError::Reference { column, table } => {
            assert_eq!(column, "public.person_event_log.event_id");
            assert_eq!(table, "public.person_event_log");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn alias_columns_are_not_in_scope_of_the_unaliased_table() {
    let p = PERSON.as_alias("p");
    let err = select_from(&PERSON).filter(p.id.eq(1)).unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn projection_is_checked_when_the_join_list_closes() {
    let query = select((&PERSON.first_name, &EVENT.name)).from(&PERSON);
    assert!(query.clone().filter(PERSON.id.eq(1)).unwrap_err().is_reference());
    assert!(query.to_sql().unwrap_err().is_reference());
}

#[test]
fn select_without_from_is_malformed() {
    assert!(select_all().to_sql().unwrap_err().is_malformed());
    assert!(
        select((&PERSON.id,))
            .render(ParamType::Inlined)
            .unwrap_err()
            .is_malformed()
    );
}

#[test]
fn join_after_where_is_malformed() {
    let err = select_from(&PERSON)
        .filter(PERSON.id.eq(1))
        .unwrap()
        .join(&PERSON_EVENT_LOG)
        .on(PERSON.id.eq_col(&PERSON_EVENT_LOG.person_id))
        .unwrap_err();
    assert!(err.is_malformed());
}

// ==================== INSERT / UPDATE / DELETE ====================

#[test]
fn insert_renders_columns_and_returning() {
    let insert = insert_into(&PERSON)
        .set(&PERSON.first_name, "Ada")
        .unwrap()
        .set(&PERSON.last_name, "Lovelace")
        .unwrap()
        .returning((&PERSON.id,))
        .unwrap();
    let rendered = insert.render(ParamType::Parameterized).unwrap();
    assert_eq!(
        rendered.sql,
        r#"insert into "public"."person" ("first_name", "last_name") values ($1, $2) returning "public"."person"."id""#
    );
    assert_eq!(rendered.params, vec![text("Ada"), text("Lovelace")]);
    assert_eq!(insert.kind(), StatementKind::Insert);
}

#[test]
fn insert_same_column_twice_keeps_last_value() {
    let insert = insert_into(&EVENT)
        .set(&EVENT.name, "a")
        .unwrap()
        .set(&EVENT.name, "b")
        .unwrap();
    assert_eq!(
        insert.to_inlined_sql().unwrap(),
        r#"insert into "public"."event" ("name") values ('b')"#
    );
}

#[test]
fn insert_without_assignments_uses_default_values() {
    assert_eq!(
        insert_into(&EVENT).to_sql().unwrap(),
        r#"insert into "public"."event" default values"#
    );
}

#[test]
fn insert_into_other_table_column_is_a_reference_error() {
    let err = insert_into(&PERSON).set(&EVENT.name, "x").unwrap_err();
    assert!(err.is_reference());
    let err = insert_into(&PERSON).returning((&EVENT.id,)).unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn update_renders_set_and_where() {
    let upd = update(&PERSON)
        .set(&PERSON.first_name, "Grace")
        .unwrap()
        .filter(PERSON.id.eq(5))
        .unwrap()
        .and(PERSON.last_name.is_null())
        .unwrap();
    let rendered = upd.render(ParamType::Parameterized).unwrap();
    assert_eq!(
        rendered.sql,
        r#"update "public"."person" set "first_name" = $1 where "public"."person"."id" = $2 and "public"."person"."last_name" is null"#
    );
    assert_eq!(rendered.params, vec![text("Grace"), Value::Int(5)]);
}

#[test]
fn update_without_assignments_is_malformed() {
    let upd = update(&PERSON).filter(PERSON.id.eq(1)).unwrap();
    assert!(upd.to_sql().unwrap_err().is_malformed());
}

#[test]
fn delete_with_and_without_where() {
    assert_eq!(
        delete_from(&PERSON_EVENT_LOG).to_sql().unwrap(),
        r#"delete from "public"."person_event_log""#
    );
    let del = delete_from(&EVENT).filter(EVENT.id.eq(3)).unwrap();
    assert_eq!(
        del.to_inlined_sql().unwrap(),
        r#"delete from "public"."event" where "public"."event"."id" = 3"#
    );
    assert!(delete_from(&EVENT).filter(PERSON.id.eq(1)).unwrap_err().is_reference());
}

#[test]
fn statement_kind_from_sql() {
    assert_eq!(StatementKind::from_sql("  select 1"), StatementKind::Select);
    assert_eq!(StatementKind::from_sql("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Select);
    assert_eq!(StatementKind::from_sql("INSERT INTO t DEFAULT VALUES"), StatementKind::Insert);
    assert_eq!(StatementKind::from_sql("update t set a = 1"), StatementKind::Update);
    assert_eq!(StatementKind::from_sql("delete from t"), StatementKind::Delete);
    assert_eq!(StatementKind::from_sql("create table t ()"), StatementKind::Other);
}

// ==================== Execution ====================

#[tokio::test]
async fn fetch_sends_dollar_sql_and_keeps_row_order() {
    let client = MockClient::new().with_rows(vec![
        vec![text("Ada"), text("jProfessionals")],
        vec![text("Bob"), text("jProfessionals")],
    ]);
    let result = person_event_query("jProfessionals").fetch(&client).await.unwrap();

    assert_eq!(result.len(), 2);
    let names: Vec<String> = result
        .iter()
        .map(|r| r.get(&PERSON.first_name).unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Bob"]);

    let statements = client.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].0.ends_with("= $1"));
    assert_eq!(statements[0].1, vec![text("jProfessionals")]);
}

#[tokio::test]
async fn fetch_of_no_rows_is_empty_not_an_error() {
    let client = MockClient::new();
    let result = select_from(&EVENT).fetch(&client).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.fields().len(), 2);
}

#[tokio::test]
async fn fetch_one_cardinality() {
    let none = MockClient::new();
    assert!(select_from(&EVENT).fetch_one(&none).await.unwrap().is_none());

    let one = MockClient::new().with_rows(vec![vec![Value::Int(1), text("a")]]);
    let record = select_from(&EVENT).fetch_optional(&one).await.unwrap().unwrap();
    assert_eq!(record.get(&EVENT.name).unwrap(), "a");

    let two = MockClient::new().with_rows(vec![
        vec![Value::Int(1), text("a")],
        vec![Value::Int(2), text("b")],
    ]);
    let err = select_from(&EVENT).fetch_one(&two).await.unwrap_err();
    assert!(matches!(err, OrmError::Cardinality { expected: 1, got: 2 }));
}

#[tokio::test]
async fn fetch_one_into_single_column() {
    let client = MockClient::new().with_rows(vec![vec![text("Ada")]]);
    let name = select((&PERSON.first_name,))
        .from(&PERSON)
        .filter(PERSON.id.eq(1))
        .unwrap()
        .fetch_one_into(&client, |r| r.value::<String>(0))
        .await
        .unwrap();
    assert_eq!(name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn fetch_into_maps_every_row() {
    let client = MockClient::new().with_rows(vec![
        vec![Value::Int(1), text("a")],
        vec![Value::Int(2), text("b")],
    ]);
    let ids = select_from(&EVENT)
        .fetch_into(&client, |r| r.get(&EVENT.id))
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn mutation_execute_reports_affected_rows() {
    let client = MockClient::new().with_affected(4);
    let n = delete_from(&PERSON).execute(&client).await.unwrap();
    assert_eq!(n, 4);
    assert_eq!(client.sql(), vec![r#"delete from "public"."person""#.to_string()]);
}

#[tokio::test]
async fn malformed_statements_never_reach_the_client() {
    let client = MockClient::new();
    let err = update(&PERSON).execute(&client).await.unwrap_err();
    assert!(err.is_malformed());
    assert!(client.statements().is_empty());
}

#[tokio::test]
async fn insert_fetch_returning() {
    let client = MockClient::new().with_rows(vec![vec![Value::Int(42)]]);
    let record = insert_into(&EVENT)
        .set(&EVENT.name, "jProfessionals")
        .unwrap()
        .returning((&EVENT.id,))
        .unwrap()
        .fetch_one_returning(&client)
        .await
        .unwrap();
    assert_eq!(record.get(&EVENT.id).unwrap(), 42);
    assert!(client.sql()[0].ends_with(r#"returning "public"."event"."id""#));
}

// ==================== Repeated scope entries ====================

#[test]
fn joining_the_same_table_twice_is_malformed() {
    let err = select_from(&PERSON)
        .join(&PERSON)
        .on(PERSON.id.eq_col(&PERSON.id))
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn reusing_an_alias_for_another_table_is_malformed() {
    let p = PERSON.as_alias("x");
    let e = EVENT.as_alias("x");
    let err = select_from(&p).join(&e).on(p.id.eq_col(&e.id)).unwrap_err();
    assert!(err.is_malformed());

    // An alias may not shadow an unaliased table's name either.
    let shadow = EVENT.as_alias("person");
    let err = select_from(&PERSON)
        .join(&shadow)
        .on(PERSON.id.eq_col(&shadow.id))
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn repeated_from_is_malformed() {
    let query = select_all().from(&PERSON).from(&PERSON);
    assert!(query.to_sql().unwrap_err().is_malformed());
    assert!(query.filter(PERSON.id.eq(1)).unwrap_err().is_malformed());

    let p = PERSON.as_alias("p");
    let ok = select((&PERSON.id, &p.id)).from(&PERSON).from(&p);
    assert!(ok.to_sql().is_ok());
}

// ==================== Plain SQL ====================

#[test]
fn plain_table_selects_star() {
    let query = select_all().from(&table("PERSON"));
    assert_eq!(query.to_sql().unwrap(), "select * from PERSON");
    assert_eq!(select_from(&table("PERSON")).to_sql().unwrap(), "select * from PERSON");
}

#[test]
fn plain_fields_join_plain_tables() {
    let query = select((
        field("PERSON.first_name").unwrap(),
        field("PERSON_EVENT.description").unwrap(),
    ))
    .from(&table("PERSON"))
    .join(&table("PERSON_EVENT"))
    .on(field("PERSON.ID")
        .unwrap()
        .equal(field("PERSON_EVENT.person_id").unwrap()))
    .unwrap();
    assert_eq!(
        query.to_sql().unwrap(),
        "select PERSON.first_name, PERSON_EVENT.description from PERSON join PERSON_EVENT on PERSON.ID = PERSON_EVENT.person_id"
    );
}

#[test]
fn plain_fields_are_scope_checked() {
    let err = select_all()
        .from(&table("PERSON"))
        .filter(field("EVENT.name").unwrap().equal_value("x"))
        .unwrap_err();
    assert!(err.is_reference());

    let err = select(field("EVENT.name").unwrap())
        .from(&table("PERSON"))
        .to_sql()
        .unwrap_err();
    assert!(err.is_reference());

    assert!(field("first_name").unwrap_err().is_malformed());
}

#[test]
fn plain_and_typed_references_mix() {
    let pel = table("person_event_log").as_alias("pel");
    let query = select((&PERSON.first_name, pel.field("event_id")))
        .from(&PERSON)
        .join(&pel)
        .on(pel.field("person_id").equal(&PERSON.id))
        .unwrap()
        .filter(pel.field("event_id").equal_value(3_i64))
        .unwrap();
    assert_eq!(
        query.to_sql().unwrap(),
        r#"select "public"."person"."first_name", "pel".event_id from "public"."person" join person_event_log as "pel" on "pel".person_id = "public"."person"."id" where "pel".event_id = $1"#
    );
}

#[tokio::test]
async fn star_over_a_plain_table_is_not_fetched() {
    let client = MockClient::new();
    let err = select_all()
        .from(&table("PERSON"))
        .fetch(&client)
        .await
        .unwrap_err();
    assert!(err.is_malformed());
    assert!(client.sql().is_empty());
}

#[tokio::test]
async fn plain_projection_is_fetched() {
    let client = MockClient::new().with_rows(vec![vec![text("Ivan")]]);
    let first_name = field("PERSON.first_name").unwrap();
    let result = select(&first_name)
        .from(&table("PERSON"))
        .fetch(&client)
        .await
        .unwrap();
    assert_eq!(result.first().unwrap().value::<String>(0).unwrap(), "Ivan");
    assert_eq!(client.sql(), vec!["select PERSON.first_name from PERSON"]);
}
