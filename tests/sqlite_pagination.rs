#![cfg(feature = "sqlite")]
use std::sync::Arc;

use sql_pager::prelude::*;
use sql_pager::record_binding;

#[derive(Debug, Default, PartialEq)]
struct Item {
    id: i64,
    name: String,
    price: Option<f64>,
    active: bool,
}

record_binding!(Item { id: Long, name: Text, price: Double, active: Boolean });

fn seed(conn: &SqliteConnection, rows: i64) -> Result<(), SqlPagerError> {
    conn.execute_batch(
        "create table items (id integer primary key, name text not null, price real, active text);",
    )?;
    let runner = QueryRunner::default();
    let sets: Vec<Vec<RowValues>> = (0..rows)
        .map(|i| {
            vec![
                RowValues::Int(i),
                RowValues::Text(format!("item {i:02}")),
                if i % 5 == 0 { RowValues::Null } else { RowValues::Float(i as f64 * 1.5) },
                RowValues::Text(if i % 2 == 0 { "Y" } else { "false" }.into()),
            ]
        })
        .collect();
    runner.batch(
        conn,
        "insert into items (id, name, price, active) values (?, ?, ?, ?)",
        &sets,
    )?;
    Ok(())
}

fn engine() -> PaginationEngine {
    PaginationEngine::new(Arc::new(DialectDetector::new()))
}

#[test]
fn second_page_of_twenty_five() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("items.db");
    let conn = SqliteConnection::sqlite_builder(path.display().to_string())
        .source_name("items")
        .open()?;
    seed(&conn, 25)?;

    let request = PageRequest::new(
        "select count(*) from items",
        "select id from items order by id;",
    )
    .with_page(2)
    .with_size(10);
    let page = engine().paginate_detected(&conn, &request, &RowShape::<()>::scalar(ScalarType::Long))?;

    let ids: Vec<i128> = page
        .rows
        .iter()
        .filter_map(|p| p.clone().into_scalar().and_then(|v| v.as_i128()))
        .collect();
    assert_eq!(ids, (10..20).collect::<Vec<i128>>());
    assert_eq!(page.total_rows, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.current_page, 2);
    assert!(page.has_next_page);
    assert!(page.has_previous_page);
    Ok(())
}

#[test]
fn last_and_out_of_range_pages() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    seed(&conn, 25)?;
    let engine = engine();

    let last = PageRequest::new("select count(*) from items", "select * from items order by id")
        .with_page(3)
        .with_size(10);
    let page = engine.paginate(&conn, Dialect::Sqlite, &last, &RowShape::<()>::array())?;
    assert_eq!(page.len(), 5);
    assert!(!page.has_next_page);

    let beyond = last.clone().with_page(9);
    let page = engine.paginate(&conn, Dialect::Sqlite, &beyond, &RowShape::<()>::array())?;
    assert!(page.is_empty());
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_next_page);
    assert!(page.has_previous_page);

    let zero = last.with_page(0);
    let page = engine.paginate(&conn, Dialect::Sqlite, &zero, &RowShape::<()>::array())?;
    assert_eq!(page.current_page, 1);
    assert_eq!(page.rows[0].clone().into_array().ok_or("array row")?[0], RowValues::Int(0));
    Ok(())
}

#[test]
fn mysql_style_window_runs_on_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    seed(&conn, 12)?;
    let rows = engine()
        .windowed_query(
            &conn,
            Dialect::MySql,
            "select name from items order by id",
            None,
            &RowShape::<()>::scalar(ScalarType::Text).list(),
            4,
            3,
        )?
        .into_list();
    let names: Vec<String> = rows
        .into_iter()
        .filter_map(|p| match p.into_scalar() {
            Some(ScalarValue::Text(s)) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["item 04", "item 05", "item 06"]);
    Ok(())
}

#[test]
fn trailing_comment_keeps_the_window() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    seed(&conn, 6)?;
    let ids = |page: PageResult<Projected<()>>| -> Vec<i128> {
        page.rows
            .into_iter()
            .filter_map(|p| p.into_scalar().and_then(|v| v.as_i128()))
            .collect()
    };
    let request = PageRequest::new(
        "select count(*) from items -- every row",
        "select id from items order by id -- oldest first",
    )
    .with_page(2)
    .with_size(2);
    let page = engine().paginate(&conn, Dialect::Sqlite, &request, &RowShape::<()>::scalar(ScalarType::Long))?;
    assert_eq!(page.total_rows, 6);
    assert_eq!(ids(page), vec![2, 3]);

    let first = request.with_page(1);
    let page = engine().paginate(&conn, Dialect::MySql, &first, &RowShape::<()>::scalar(ScalarType::Long))?;
    assert_eq!(ids(page), vec![0, 1]);
    Ok(())
}

#[test]
fn records_bind_through_pagination() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    seed(&conn, 8)?;
    let request = PageRequest::new(
        "select count(*) from items where id >= ?",
        "select ID, Name, PRICE, active, 'ignored' as extra from items where id >= ? order by id",
    )
    .with_params(vec![RowValues::Int(4)])
    .with_size(3);
    let page = engine()
        .paginate(&conn, Dialect::Sqlite, &request, &RowShape::<Item>::record())?
        .into_records();
    assert_eq!(page.total_rows, 4);
    assert_eq!(page.total_pages, 2);
    assert_eq!(
        page.rows,
        vec![
            Item { id: 4, name: "item 04".into(), price: Some(6.0), active: true },
            Item { id: 5, name: "item 05".into(), price: None, active: false },
            Item { id: 6, name: "item 06".into(), price: Some(9.0), active: true },
        ]
    );
    Ok(())
}

#[test]
fn map_rows_follow_key_case() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    seed(&conn, 3)?;
    let engine = PaginationEngine::with_options(
        Arc::new(DialectDetector::new()),
        RunnerOptions::default().with_key_case(KeyCase::Upper),
    );
    let request = PageRequest::new("select count(*) from items", "select id, name from items order by id");
    let page = engine.paginate_detected(&conn, &request, &RowShape::<()>::map())?;
    let row = page.rows[1].clone().into_map().ok_or("map row")?;
    assert_eq!(row.keys().collect::<Vec<_>>(), vec!["ID", "NAME"]);
    assert_eq!(row.get("name"), Some(&RowValues::Text("item 01".into())));

    let json = serde_json::to_value(&page)?;
    assert_eq!(json["rows"][0]["ID"], serde_json::json!(0));
    assert_eq!(json["total_pages"], serde_json::json!(1));
    Ok(())
}

#[test]
fn failing_data_query_reports_both_statements() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    seed(&conn, 3)?;
    let request = PageRequest::new("select count(*) from items", "select nope from items")
        .with_params(vec![RowValues::Text("x".into())]);
    let err = engine()
        .paginate(&conn, Dialect::Sqlite, &request, &RowShape::<()>::map())
        .unwrap_err();
    match &err {
        SqlPagerError::PaginationFailed { count_sql, data_sql, params, .. } => {
            assert_eq!(count_sql, "select count(*) from items");
            assert_eq!(data_sql, "select nope from items");
            assert_eq!(params, "[x]");
        }
        other => panic!("expected PaginationFailed, got {other:?}"),
    }
    assert!(matches!(err.root_cause(), SqlPagerError::SqliteError(_)));
    Ok(())
}
