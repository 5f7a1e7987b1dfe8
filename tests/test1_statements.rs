use sqlite_shim::prelude::*;

fn db_with_table() -> Result<Database> {
    let db = Database::in_memory()?;
    db.execute("CREATE TABLE t (x INTEGER)")?;
    Ok(db)
}

#[test]
fn insert_reports_one_change_and_the_new_rowid() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let db = db_with_table()?;
    let mut insert = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    assert_eq!(insert.run(&params![42])?, 1);
    assert_eq!(db.last_insert_row_id()?, 1);
    assert_eq!(insert.run(&params![43])?, 1);
    assert_eq!(db.last_insert_row_id()?, 2);
    Ok(())
}

#[test]
fn get_returns_the_matching_row() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let db = db_with_table()?;
    db.prepare("INSERT INTO t (x) VALUES (?)", false)?
        .run(&params![42])?;

    let row = db
        .prepare("SELECT x FROM t WHERE x = ?", false)?
        .get(&params![42])?;
    assert_eq!(row.columns(), ["x".to_string()]);
    assert_eq!(row.get("x"), Some(&RowValues::Int(42)));
    assert_eq!(
        serde_json::to_value(&row)?,
        serde_json::json!({ "x": 42 })
    );
    Ok(())
}

#[test]
fn get_on_no_rows_is_an_empty_result() -> Result<()> {
    let db = db_with_table()?;
    let err = db.prepare("SELECT x FROM t", false)?.get(&[]).unwrap_err();
    assert!(matches!(err, SqliteShimError::EmptyResult(_)));
    Ok(())
}

#[test]
fn all_on_an_empty_table_is_empty() -> Result<()> {
    let db = db_with_table()?;
    let rows = db.prepare("SELECT x FROM t", false)?.all(&[])?;
    assert!(rows.is_empty());
    Ok(())
}

#[test]
fn null_parameters_read_back_as_null() -> Result<()> {
    let db = db_with_table()?;
    db.prepare("INSERT INTO t (x) VALUES (?)", false)?
        .run(&params![None::<i64>])?;
    let row = db.prepare("SELECT x FROM t", false)?.get(&[])?;
    assert_eq!(row.get("x"), Some(&RowValues::Null));
    Ok(())
}

#[test]
fn parameters_bind_in_order() -> Result<()> {
    let db = Database::in_memory()?;
    let row = db
        .prepare("SELECT ? AS a, ? AS b, ? AS c", false)?
        .get(&params![1, "two", 3.5])?;
    assert_eq!(row.get("a"), Some(&RowValues::Int(1)));
    assert_eq!(row.get("b"), Some(&RowValues::Text("two".into())));
    assert_eq!(row.get("c"), Some(&RowValues::Float(3.5)));
    Ok(())
}

#[test]
fn unbound_trailing_placeholders_are_null() -> Result<()> {
    let db = Database::in_memory()?;
    let row = db
        .prepare("SELECT ? AS a, ? AS b", false)?
        .get(&params![7])?;
    assert_eq!(row.get("a"), Some(&RowValues::Int(7)));
    assert_eq!(row.get("b"), Some(&RowValues::Null));
    Ok(())
}

#[test]
fn values_are_classified_before_binding() -> Result<()> {
    let db = Database::in_memory()?;
    let mut typeof_stmt = db.prepare("SELECT typeof(?)", false)?;
    let mut kind = |value: RowValues| typeof_stmt.get_single_string(&[value]);

    assert_eq!(kind(RowValues::Float(2.0))?, "integer");
    assert_eq!(kind(RowValues::Float(2.5))?, "real");
    assert_eq!(kind(RowValues::Bool(true))?, "integer");
    assert_eq!(kind(RowValues::Text("a".into()))?, "text");
    assert_eq!(kind(RowValues::Blob(vec![1, 2]))?, "blob");
    assert_eq!(kind(RowValues::JSON(serde_json::json!({"k": 1})))?, "blob");
    assert_eq!(kind(RowValues::Null)?, "null");
    Ok(())
}

#[test]
fn too_many_parameters_is_a_bind_error() -> Result<()> {
    let db = db_with_table()?;
    let mut insert = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    assert!(matches!(
        insert.run(&params![1, 2]),
        Err(SqliteShimError::BindError(_))
    ));
    assert!(matches!(
        db.prepare("SELECT ?", false)?.all(&params![1, 2]),
        Err(SqliteShimError::BindError(_))
    ));
    Ok(())
}

#[test]
fn malformed_sql_is_an_execution_error() -> Result<()> {
    let db = Database::in_memory()?;
    assert!(matches!(
        db.execute("CREATE TABLE"),
        Err(SqliteShimError::ExecutionError(_))
    ));
    let mut stmt = db.prepare("SELEC 1", false)?;
    assert!(matches!(
        stmt.run(&[]),
        Err(SqliteShimError::ExecutionError(_))
    ));
    Ok(())
}

#[test]
fn constraint_violations_are_execution_errors() -> Result<()> {
    let db = Database::in_memory()?;
    db.execute("CREATE TABLE u (id INTEGER PRIMARY KEY)")?;
    let mut insert = db.prepare("INSERT INTO u (id) VALUES (?)", false)?;
    insert.run(&params![1])?;
    assert!(matches!(
        insert.run(&params![1]),
        Err(SqliteShimError::ExecutionError(_))
    ));
    // the statement stays usable after a failed run
    assert_eq!(insert.run(&params![2])?, 1);
    Ok(())
}

#[test]
fn scalar_queries_check_their_shape() -> Result<()> {
    let db = db_with_table()?;
    db.execute("INSERT INTO t (x) VALUES (5)")?;

    assert_eq!(db.prepare("SELECT count(*) FROM t", false)?.get_single_number(&[])?, 1);
    assert_eq!(db.prepare("SELECT 3.0", false)?.get_single_number(&[])?, 3);
    assert_eq!(db.prepare("SELECT 'v' || x FROM t", false)?.get_single_string(&[])?, "v5");
    assert_eq!(db.prepare("SELECT x FROM t", false)?.get_single_string(&[])?, "5");

    let empty = db
        .prepare("SELECT x FROM t WHERE x = ?", false)?
        .get_single_number(&params![99]);
    assert!(matches!(empty, Err(SqliteShimError::EmptyResult(_))));

    let two_columns = db.prepare("SELECT 1, 2", false)?.get_single_number(&[]);
    assert!(matches!(two_columns, Err(SqliteShimError::ScalarQueryError(_))));

    let fractional = db.prepare("SELECT 1.5", false)?.get_single_number(&[]);
    assert!(matches!(fractional, Err(SqliteShimError::ScalarQueryError(_))));

    let text = db.prepare("SELECT 'abc'", false)?.get_single_number(&[]);
    assert!(matches!(text, Err(SqliteShimError::ScalarQueryError(_))));

    let null = db.prepare("SELECT NULL", false)?.get_single_string(&[]);
    assert!(matches!(null, Err(SqliteShimError::ScalarQueryError(_))));
    Ok(())
}

#[test]
fn memoized_statements_keep_their_compiled_form() -> Result<()> {
    let db = db_with_table()?;
    let mut kept = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    assert!(!kept.is_compiled());
    kept.run(&params![1])?;
    assert!(kept.is_compiled());
    kept.run(&params![2])?;
    assert_eq!(kept.parameter_count()?, 1);

    let mut once = db.prepare("INSERT INTO t (x) VALUES (?)", true)?;
    once.run(&params![3])?;
    assert!(!once.is_compiled());
    // auto_close statements recompile on demand
    once.run(&params![4])?;
    assert!(!once.is_compiled());

    assert_eq!(db.prepare("SELECT count(*) FROM t", false)?.get_single_number(&[])?, 4);
    Ok(())
}

#[test]
fn statement_close_is_idempotent() -> Result<()> {
    let db = db_with_table()?;
    let mut stmt = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    stmt.run(&params![1])?;
    stmt.close();
    stmt.close();
    assert!(!stmt.is_compiled());
    assert_eq!(stmt.sql(), "INSERT INTO t (x) VALUES (?)");
    Ok(())
}

#[test]
fn repeated_queries_are_deterministic() -> Result<()> {
    let db = db_with_table()?;
    let mut insert = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    for x in [3, 1, 2] {
        insert.run(&params![x])?;
    }
    let select = db.prepare("SELECT x FROM t ORDER BY x", false)?;
    let first = select.all(&[])?;
    let second = select.all(&[])?;
    assert_eq!(first, second);
    let xs: Vec<i64> = first
        .iter()
        .filter_map(|row| row.get("x").and_then(RowValues::as_int).copied())
        .collect();
    assert_eq!(xs, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn duplicate_column_names_keep_the_last_value() -> Result<()> {
    let db = Database::in_memory()?;
    let row = db.prepare("SELECT 1 AS x, 2 AS x", false)?.get(&[])?;
    assert_eq!(row.len(), 2);
    assert_eq!(row.get("x"), Some(&RowValues::Int(2)));
    Ok(())
}

#[test]
fn blobs_and_floats_round_trip() -> Result<()> {
    let db = Database::in_memory()?;
    db.execute("CREATE TABLE b (data BLOB, f REAL)")?;
    db.prepare("INSERT INTO b (data, f) VALUES (?, ?)", false)?
        .run(&params![vec![0_u8, 255, 7], 0.25])?;
    let row = db.prepare("SELECT data, f FROM b", false)?.get(&[])?;
    assert_eq!(row.get("data"), Some(&RowValues::Blob(vec![0, 255, 7])));
    assert_eq!(row.get("f"), Some(&RowValues::Float(0.25)));
    Ok(())
}

#[test]
fn get_stops_after_the_first_row_of_an_unbounded_query() -> Result<()> {
    let db = Database::in_memory()?;
    let sql = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c";
    let row = db.prepare(sql, false)?.get(&[])?;
    assert_eq!(row.get("x"), Some(&RowValues::Int(1)));
    let row = db.prepare(sql, true)?.get(&[])?;
    assert_eq!(row.get("x"), Some(&RowValues::Int(1)));
    Ok(())
}

#[test]
fn reals_render_as_the_engine_casts_them() -> Result<()> {
    let db = Database::in_memory()?;
    let render = |sql: &str| db.prepare(sql, true)?.get_single_string(&[]);
    assert_eq!(render("SELECT 1.0")?, "1.0");
    assert_eq!(render("SELECT 1e20")?, "1.0e+20");
    for literal in ["0.1", "49.47", "-2.5e-7", "123456789.125"] {
        let expected = render(&format!("SELECT CAST({literal} AS TEXT)"))?;
        assert_eq!(render(&format!("SELECT {literal}"))?, expected);
    }
    Ok(())
}

#[test]
fn integer_extremes_round_trip() -> Result<()> {
    let db = db_with_table()?;
    let echo = db.prepare("SELECT ? AS x", false)?;
    for edge in [i64::MIN, i64::MAX] {
        let row = echo.get(&params![edge])?;
        assert_eq!(row.get("x"), Some(&RowValues::Int(edge)));
    }

    let mut insert = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
    insert.run(&params![i64::MIN])?;
    insert.run(&params![i64::MAX])?;
    let stored: Vec<i64> = db
        .prepare("SELECT x FROM t ORDER BY x", false)?
        .all(&[])?
        .iter()
        .filter_map(|row| row.get("x").and_then(RowValues::as_int).copied())
        .collect();
    assert_eq!(stored, vec![i64::MIN, i64::MAX]);
    assert_eq!(
        db.prepare("SELECT max(x) FROM t", false)?.get_single_number(&[])?,
        i64::MAX
    );
    Ok(())
}

#[test]
fn text_that_is_not_utf8_is_an_execution_error() -> Result<()> {
    let db = Database::in_memory()?;
    let stmt = db.prepare("SELECT CAST(x'ff' AS TEXT) AS t", false)?;
    assert!(matches!(
        stmt.get(&[]),
        Err(SqliteShimError::ExecutionError(_))
    ));
    let mut scalar = db.prepare("SELECT CAST(x'ff' AS TEXT)", true)?;
    assert!(matches!(
        scalar.get_single_string(&[]),
        Err(SqliteShimError::ExecutionError(_))
    ));
    Ok(())
}
