use sqlite_shim::prelude::*;

fn seeded(rows: &[i64]) -> Result<Database> {
    let db = Database::in_memory()?;
    db.execute("CREATE TABLE t (x INTEGER)")?;
    let mut insert = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    for x in rows {
        insert.run(&params![*x])?;
    }
    Ok(db)
}

fn x(row: &Row) -> i64 {
    row.get("x").and_then(RowValues::as_int).copied().unwrap_or(-1)
}

#[test]
fn iterate_yields_rows_in_cursor_order() -> Result<()> {
    let db = seeded(&[10, 20, 30])?;
    let stmt = db.prepare("SELECT x FROM t ORDER BY x", false)?;
    let mut it = stmt.iterate(&[])?;
    assert_eq!(it.columns(), ["x".to_string()]);

    let mut seen = Vec::new();
    while let Some(row) = it.next_row()? {
        seen.push(x(&row));
    }
    assert_eq!(seen, vec![10, 20, 30]);
    assert!(it.next_row()?.is_none());
    Ok(())
}

#[test]
fn auto_close_iterators_release_on_exhaustion() -> Result<()> {
    let db = seeded(&[1, 2])?;
    let stmt = db.prepare("SELECT x FROM t ORDER BY x", true)?;
    let mut it = stmt.iterate(&[])?;
    assert!(it.auto_close());
    let rows: Vec<Row> = it.by_ref().collect::<Result<_>>()?;
    assert_eq!(rows.len(), 2);
    assert!(it.is_closed());
    assert!(it.next_row()?.is_none());
    assert!(it.reset().unwrap_err().is_closed_handle());
    Ok(())
}

#[test]
fn plain_iterators_can_be_restarted() -> Result<()> {
    let db = seeded(&[1, 2])?;
    let stmt = db.prepare("SELECT x FROM t ORDER BY x", false)?;
    let mut it = stmt.iterate(&[])?;
    assert_eq!(it.by_ref().count(), 2);
    assert!(!it.is_closed());
    it.reset()?;
    let again: Vec<i64> = it.by_ref().map(|r| r.map(|row| x(&row))).collect::<Result<_>>()?;
    assert_eq!(again, vec![1, 2]);
    Ok(())
}

#[test]
fn first_and_last_rows() -> Result<()> {
    let db = seeded(&[5, 6, 7])?;
    let stmt = db.prepare("SELECT x FROM t ORDER BY x", false)?;

    let mut it = stmt.iterate(&[])?;
    assert_eq!(x(&it.get_last()?), 7);
    assert_eq!(x(&it.get_first()?), 5);
    // position untouched by the edge reads
    assert_eq!(it.next_row()?.map(|row| x(&row)), Some(5));

    let mut once = db.prepare("SELECT x FROM t ORDER BY x", true)?.iterate(&[])?;
    assert_eq!(x(&once.get_last()?), 7);
    assert!(once.is_closed());
    Ok(())
}

#[test]
fn edges_of_an_empty_result_are_empty_results() -> Result<()> {
    let db = seeded(&[])?;
    let mut it = db.prepare("SELECT x FROM t", false)?.iterate(&[])?;
    assert!(matches!(it.get_first(), Err(SqliteShimError::EmptyResult(_))));
    assert!(matches!(it.get_last(), Err(SqliteShimError::EmptyResult(_))));
    assert!(it.next_row()?.is_none());
    Ok(())
}

#[test]
fn iterator_close_is_idempotent() -> Result<()> {
    let db = seeded(&[1])?;
    let mut it = db.prepare("SELECT x FROM t", false)?.iterate(&[])?;
    it.close();
    it.close();
    assert!(it.is_closed());
    assert!(it.next_row()?.is_none());
    Ok(())
}

#[test]
fn bound_iteration_filters_rows() -> Result<()> {
    let db = seeded(&[1, 2, 3, 4])?;
    let stmt = db.prepare("SELECT x FROM t WHERE x > ? ORDER BY x", false)?;
    let above_two: Vec<i64> = stmt
        .iterate(&params![2])?
        .map(|r| r.map(|row| x(&row)))
        .collect::<Result<_>>()?;
    assert_eq!(above_two, vec![3, 4]);
    // the same statement iterates again with other parameters
    assert_eq!(stmt.iterate(&params![3])?.count(), 1);
    Ok(())
}

#[test]
fn pending_iteration_fails_after_the_database_closes() -> Result<()> {
    let db = seeded(&[1, 2])?;
    let mut it = db.prepare("SELECT x FROM t", false)?.iterate(&[])?;
    assert!(it.next_row()?.is_some());
    db.close()?;
    assert!(it.next_row().unwrap_err().is_closed_handle());
    it.close();
    assert!(it.next_row()?.is_none());
    Ok(())
}

#[test]
fn unbounded_queries_iterate_lazily() -> Result<()> {
    let db = Database::in_memory()?;
    let stmt = db.prepare(
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c",
        true,
    )?;
    let head: Vec<i64> = stmt
        .iterate(&[])?
        .take(100)
        .map(|row| row.map(|r| x(&r)))
        .collect::<Result<_>>()?;
    assert_eq!(head, (1..=100).collect::<Vec<i64>>());
    Ok(())
}

#[test]
fn long_results_read_back_in_order() -> Result<()> {
    let values: Vec<i64> = (1..=3000).collect();
    let db = seeded(&values)?;
    let mut it = db.prepare("SELECT x FROM t ORDER BY x", false)?.iterate(&[])?;
    assert_eq!(x(&it.get_last()?), 3000);
    let read: Vec<i64> = it.by_ref().map(|row| row.map(|r| x(&r))).collect::<Result<_>>()?;
    assert_eq!(read, values);
    it.reset()?;
    assert_eq!(it.next_row()?.map(|r| x(&r)), Some(1));
    Ok(())
}

#[test]
fn returning_statements_run_once_under_iteration() -> Result<()> {
    let db = seeded(&[])?;
    let stmt = db.prepare("INSERT INTO t (x) VALUES (1), (2), (3) RETURNING x", false)?;
    let mut it = stmt.iterate(&[])?;
    assert_eq!(x(&it.get_last()?), 3);
    assert_eq!(it.by_ref().count(), 3);
    it.reset()?;
    assert_eq!(it.count(), 3);
    assert_eq!(
        db.prepare("SELECT count(*) FROM t", false)?.get_single_number(&[])?,
        3
    );
    Ok(())
}
