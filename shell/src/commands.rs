use std::io::{self, Write};

use serde_json::Value as JsonValue;
use sqlite_shim::{Database, Result, Row, RowValues};

use crate::args::Command;

/// Run one shell command against `db`, writing results to `out`.
pub(crate) fn run<W: Write>(db: &Database, command: &Command, out: &mut W) -> Result<()> {
    match command {
        Command::Exec { sql } => {
            db.execute_batch(sql)?;
            tracing::info!(database = %db.name(), "executed");
        }
        Command::Query { sql, params } => {
            let stmt = db.prepare(sql, true)?;
            let mut count = 0_usize;
            for row in stmt.iterate(&parse_params(params))? {
                write_row(out, &row?)?;
                count += 1;
            }
            tracing::info!(rows = count, "query finished");
        }
        Command::Pragma { sql } => {
            for row in db.pragma(sql)? {
                write_row(out, &row)?;
            }
        }
        Command::Version { set: Some(version) } => {
            db.set_version(*version)?;
            writeln!(out, "{version}")?;
        }
        Command::Version { set: None } => {
            writeln!(out, "{}", db.version()?)?;
        }
        Command::Scalar { sql, params } => {
            let value = db.prepare(sql, true)?.get_single_string(&parse_params(params))?;
            writeln!(out, "{value}")?;
        }
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, row: &Row) -> Result<()> {
    serde_json::to_writer(&mut *out, row).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

fn parse_params(raw: &[String]) -> Vec<RowValues> {
    raw.iter().map(|value| parse_param(value)).collect()
}

/// JSON scalars map onto their natural values; anything that is not JSON is text.
fn parse_param(raw: &str) -> RowValues {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Null) => RowValues::Null,
        Ok(JsonValue::Bool(b)) => RowValues::Bool(b),
        Ok(JsonValue::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => RowValues::Int(i),
            (None, Some(f)) => RowValues::Float(f),
            (None, None) => RowValues::Text(n.to_string()),
        },
        Ok(JsonValue::String(s)) => RowValues::Text(s),
        Ok(other) => RowValues::JSON(other),
        Err(_) => RowValues::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(db: &Database, command: Command) -> String {
        let mut out = Vec::new();
        run(db, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn params_parse_as_json_then_text() {
        assert_eq!(parse_param("42"), RowValues::Int(42));
        assert_eq!(parse_param("1.5"), RowValues::Float(1.5));
        assert_eq!(parse_param("null"), RowValues::Null);
        assert_eq!(parse_param("true"), RowValues::Bool(true));
        assert_eq!(parse_param("\"quoted\""), RowValues::Text("quoted".into()));
        assert_eq!(parse_param("plain"), RowValues::Text("plain".into()));
    }

    #[test]
    fn query_prints_json_lines() {
        let db = Database::in_memory().unwrap();
        output(
            &db,
            Command::Exec {
                sql: "CREATE TABLE t (x INTEGER, y TEXT); INSERT INTO t VALUES (1, 'a'), (2, 'b');"
                    .into(),
            },
        );
        let printed = output(
            &db,
            Command::Query {
                sql: "SELECT x, y FROM t WHERE x >= ? ORDER BY x".into(),
                params: vec!["1".into()],
            },
        );
        let rows: Vec<JsonValue> = printed
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            rows,
            vec![
                serde_json::json!({"x": 1, "y": "a"}),
                serde_json::json!({"x": 2, "y": "b"}),
            ]
        );
    }

    #[test]
    fn version_and_scalar_print_plain_values() {
        let db = Database::in_memory().unwrap();
        assert_eq!(output(&db, Command::Version { set: Some(5) }), "5\n");
        assert_eq!(output(&db, Command::Version { set: None }), "5\n");
        assert_eq!(
            output(
                &db,
                Command::Scalar {
                    sql: "SELECT ? || '!'".into(),
                    params: vec!["hi".into()],
                }
            ),
            "hi!\n"
        );
    }

    #[test]
    fn pragma_rows_are_printed() {
        let db = Database::in_memory().unwrap();
        db.execute("CREATE TABLE t (a INTEGER, b TEXT)").unwrap();
        let printed = output(
            &db,
            Command::Pragma {
                sql: "table_info(t)".into(),
            },
        );
        assert_eq!(printed.lines().count(), 2);
    }
}
