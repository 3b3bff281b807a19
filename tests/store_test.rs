mod common;

use common::*;
use empire_store::db::{Database, Execer, Inserter, Queryer, Record, Value, find_by};
use empire_store::error::DbError;
use empire_store::impl_record;
use empire_store::models::{App, Config, Job, Process, Release, Slug};

#[tokio::test]
async fn test_round_trip_all_records() {
    let (_file, mut db) = open_store().await;

    let mut app = app("acme-inc");
    let mut config = config("acme-inc");
    let mut slug = slug();
    db.insert(&mut [&mut app, &mut config, &mut slug])
        .await
        .unwrap();

    let mut release = release("acme-inc", config.id, slug.id);
    db.insert_one(&mut release).await.unwrap();
    let mut process = process(release.id);
    let mut job = job("acme-inc");
    db.insert(&mut [&mut process, &mut job]).await.unwrap();

    let found: App = db
        .select_one("select * from apps where id = $1", &["acme-inc".into()])
        .await
        .unwrap();
    assert_eq!(found, app);

    let found: Config = db
        .select_one("select * from configs where id = $1", &[config.id.into()])
        .await
        .unwrap();
    assert_eq!(found, config);

    let found: Slug = db
        .select_one("select * from slugs where id = $1", &[slug.id.into()])
        .await
        .unwrap();
    assert_eq!(found, slug);

    let found: Release = db
        .select_one("select * from releases where id = $1", &[release.id.into()])
        .await
        .unwrap();
    assert_eq!(found, release);

    let found: Process = db
        .select_one("select * from processes where id = $1", &[process.id.into()])
        .await
        .unwrap();
    assert_eq!(found, process);

    let found: Job = db
        .select_one("select * from jobs where id = $1", &[job.id.into()])
        .await
        .unwrap();
    assert_eq!(found, job);
}

#[tokio::test]
async fn test_insert_writes_generated_keys_back() {
    let (_file, mut db) = open_store().await;

    let mut first = slug();
    let mut second = slug();
    db.insert(&mut [&mut first, &mut second]).await.unwrap();

    assert_ne!(first.id, 0);
    assert_ne!(second.id, 0);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_insert_leaves_app_untouched() {
    let (_file, mut db) = open_store().await;

    let original = app("acme-inc");
    let mut inserted = original.clone();
    db.insert_one(&mut inserted).await.unwrap();

    assert_eq!(inserted, original);
}

#[tokio::test]
async fn test_app_without_repo_round_trips_null() {
    let (_file, mut db) = open_store().await;

    let mut app = App {
        repo: None,
        ..app("no-repo")
    };
    db.insert_one(&mut app).await.unwrap();

    let found: App = find_by(&mut db, "apps", "id", "no-repo").await.unwrap();
    assert_eq!(found.repo, None);
}

#[tokio::test]
async fn test_empty_insert_is_noop() {
    let (_file, mut db) = open_store().await;
    db.insert(&mut []).await.unwrap();
}

#[tokio::test]
async fn test_select_with_no_rows_is_empty() {
    let (_file, mut db) = open_store().await;

    let apps: Vec<App> = db.select("select * from apps", &[]).await.unwrap();
    assert!(apps.is_empty());
}

#[tokio::test]
async fn test_select_returns_rows_in_query_order() {
    let (_file, mut db) = open_store().await;

    let mut a = app("alpha");
    let mut b = app("bravo");
    let mut c = app("charlie");
    db.insert(&mut [&mut b, &mut c, &mut a]).await.unwrap();

    let apps: Vec<App> = db
        .select("select * from apps order by id desc", &[])
        .await
        .unwrap();
    let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["charlie", "bravo", "alpha"]);
}

#[tokio::test]
async fn test_select_one_without_match_is_not_found() {
    let (_file, mut db) = open_store().await;

    let err = db
        .select_one::<App>("select * from apps where id = $1", &["missing".into()])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, DbError::NotFound { ref table } if table == "apps"));
}

#[tokio::test]
async fn test_select_one_ignores_extra_rows() {
    let (_file, mut db) = open_store().await;

    let mut a = app("alpha");
    let mut b = app("bravo");
    db.insert(&mut [&mut a, &mut b]).await.unwrap();

    let found: App = db
        .select_one("select * from apps order by id", &[])
        .await
        .unwrap();
    assert_eq!(found.id, "alpha");
}

#[tokio::test]
async fn test_find_by_matches_handwritten_query() {
    let (_file, mut db) = open_store().await;

    let mut app = app("abc");
    db.insert_one(&mut app).await.unwrap();

    let by_helper: App = find_by(&mut db, "apps", "id", "abc").await.unwrap();
    let by_hand: App = db
        .select_one(
            "select * from apps where id = $1 limit 1",
            &[Value::from("abc")],
        )
        .await
        .unwrap();
    assert_eq!(by_helper, by_hand);
    assert_eq!(by_helper, app);
}

#[tokio::test]
async fn test_find_by_integer_field() {
    let (_file, mut db) = open_store().await;

    let mut release = release("acme-inc", 1, 1);
    db.insert_one(&mut release).await.unwrap();

    let found: Release = find_by(&mut db, "releases", "version", 1i64).await.unwrap();
    assert_eq!(found, release);

    let err = find_by::<Release, _>(&mut db, "releases", "version", 2i64)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_find_by_rejects_non_identifiers() {
    let (_file, mut db) = open_store().await;

    let err = find_by::<App, _>(&mut db, "apps; drop table apps", "id", "abc")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    let err = find_by::<App, _>(&mut db, "apps", "id = id or 1", "abc")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    // The table is still there.
    let apps: Vec<App> = db.select("select * from apps", &[]).await.unwrap();
    assert!(apps.is_empty());
}

#[derive(Debug, Clone, PartialEq)]
struct Domain {
    id: i64,
    hostname: String,
}

impl_record!(Domain { id, hostname });

#[tokio::test]
async fn test_unregistered_type_is_mapping_error() {
    let (_file, mut db) = open_store().await;
    db.exec(
        "CREATE TABLE domains (id INTEGER PRIMARY KEY, hostname TEXT NOT NULL)",
        &[],
    )
    .await
    .unwrap();

    let mut domain = Domain {
        id: 0,
        hostname: "acme.example.com".to_string(),
    };
    let err = db.insert_one(&mut domain).await.unwrap_err();
    assert!(matches!(err, DbError::Mapping { .. }));

    let err = db
        .select::<Domain>("select * from domains", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Mapping { .. }));

    let err = db
        .select_one::<Domain>("select * from domains", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Mapping { .. }));
}

#[tokio::test]
async fn test_unmapped_record_in_batch_inserts_nothing() {
    let (_file, mut db) = open_store().await;

    let mut app = app("acme-inc");
    let mut domain = Domain {
        id: 0,
        hostname: "acme.example.com".to_string(),
    };
    let err = db.insert(&mut [&mut app, &mut domain]).await.unwrap_err();
    assert!(matches!(err, DbError::Mapping { .. }));

    let apps: Vec<App> = db.select("select * from apps", &[]).await.unwrap();
    assert!(apps.is_empty());
}

#[tokio::test]
async fn test_extra_result_column_is_binding_error() {
    let (_file, mut db) = open_store().await;

    let mut app = app("acme-inc");
    db.insert_one(&mut app).await.unwrap();

    let err = db
        .select::<App>("select *, 1 as extra from apps", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Binding { .. }));
}

#[tokio::test]
async fn test_missing_result_column_is_binding_error() {
    let (_file, mut db) = open_store().await;

    let mut app = app("acme-inc");
    db.insert_one(&mut app).await.unwrap();

    let err = db
        .select_one::<App>("select id, repo from apps", &[])
        .await
        .unwrap_err();
    match err {
        DbError::Binding { column, .. } => assert_eq!(column.as_deref(), Some("created_at")),
        other => panic!("expected binding error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exec_reports_rows_affected() {
    let (_file, mut db) = open_store().await;

    let mut a = app("alpha");
    let mut b = app("bravo");
    db.insert(&mut [&mut a, &mut b]).await.unwrap();

    let result = db
        .exec(
            "update apps set repo = $1 where id <> $2",
            &["remind101/other".into(), "nobody".into()],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 2);

    let result = db
        .exec("delete from apps where id = $1", &["alpha".into()])
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 1);
}

#[tokio::test]
async fn test_exec_reports_last_insert_id_on_sqlite() {
    let (_file, mut db) = open_store().await;

    let result = db
        .exec(
            "insert into slugs (image, process_types) values ($1, $2)",
            &["acme:1".into(), Value::Json(serde_json::json!({}))],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 1);
    let id = result.last_insert_id.unwrap();

    let found: Slug = find_by(&mut db, "slugs", "id", id).await.unwrap();
    assert_eq!(found.image, "acme:1");
    assert!(found.process_types.0.is_empty());
}

#[tokio::test]
async fn test_store_error_is_database_error() {
    let (_file, mut db) = open_store().await;

    let mut first = app("acme-inc");
    db.insert_one(&mut first).await.unwrap();
    let mut duplicate = app("acme-inc");
    let err = db.insert_one(&mut duplicate).await.unwrap_err();
    assert!(matches!(err, DbError::Database { .. }));
}

#[tokio::test]
async fn test_clones_share_the_pool() {
    let (_file, mut db) = open_store().await;
    let mut other: Database = db.clone();

    let mut app = app("acme-inc");
    db.insert_one(&mut app).await.unwrap();

    let found: App = find_by(&mut other, "apps", "id", "acme-inc").await.unwrap();
    assert_eq!(found, app);
    assert_eq!(other.tables().len(), 6);
}

#[tokio::test]
async fn test_operations_after_close_fail() {
    let (_file, mut db) = open_store().await;
    db.close().await.unwrap();
    assert!(db.is_closed());

    let mut app = app("acme-inc");
    let err = db.insert_one(&mut app).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));

    let err = db.insert(&mut []).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));

    let err = db.exec("delete from apps", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));

    let err = db
        .select::<App>("select * from apps", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));

    let err = db
        .select_one::<App>("select * from apps", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));

    assert!(matches!(
        db.begin().await.unwrap_err(),
        DbError::Connection { .. }
    ));
}

#[tokio::test]
async fn test_second_close_fails() {
    let (_file, db) = open_store().await;
    db.close().await.unwrap();
    assert!(matches!(
        db.close().await.unwrap_err(),
        DbError::Connection { .. }
    ));
}

#[tokio::test]
async fn test_racing_closes_on_clones_succeed_once() {
    let (_file, db) = open_store().await;
    let other = db.clone();

    let (first, second) = tokio::join!(db.close(), other.close());
    assert_eq!(
        [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count(),
        1
    );
    assert!(db.is_closed());
    assert!(other.is_closed());
}

#[tokio::test]
async fn test_open_rejects_unknown_scheme() {
    let err = Database::open("mysql://root@localhost/empire")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
}

#[tokio::test]
async fn test_open_accepts_pool_options() {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let uri = format!(
        "sqlite:{}?max_connections=2&acquire_timeout=5",
        temp_file.path().to_str().unwrap()
    );
    let db = Database::open(&uri).await.unwrap();
    assert_eq!(db.tables().len(), 6);
    db.close().await.unwrap();
}

#[test]
fn test_records_expose_their_columns() {
    assert_eq!(App::columns(), &["id", "repo", "created_at"]);
    assert_eq!(Slug::columns(), &["id", "image", "process_types"]);
}
