//! Statement and connection behavior outside row iteration.

use super::{expect_kind, CheckContext, CheckResult, Topic};
use crate::error::ErrorKind;
use crate::value::Value;

checks!(Topic::Statement => [
    execute_scalar_returns_null_when_empty,
    execute_scalar_returns_first_column_of_first_row,
    execute_scalar_returns_db_null_for_null_value,
    statement_can_execute_again_after_cursor_closed,
    connection_close_is_idempotent,
    statement_on_closed_connection_fails,
]);

fn execute_scalar_returns_null_when_empty(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    let mut stmt = conn.statement(ctx.sql("SELECT 1 WHERE 0 = 1;"))?;
    ensure_eq!(stmt.execute_scalar()?, None);
    Ok(())
}

fn execute_scalar_returns_first_column_of_first_row(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    let mut stmt = conn.statement(ctx.sql("SELECT 42, 'x' UNION ALL SELECT 7, 'y';"))?;
    ensure_eq!(stmt.execute_scalar()?, Some(Value::Integer(42)));
    Ok(())
}

fn execute_scalar_returns_db_null_for_null_value(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    let mut stmt = conn.statement(ctx.sql("SELECT NULL;"))?;
    ensure_eq!(stmt.execute_scalar()?, Some(Value::Null));
    Ok(())
}

fn statement_can_execute_again_after_cursor_closed(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    let mut stmt = conn.statement(ctx.sql("SELECT 1;"))?;
    {
        let mut cursor = stmt.execute_cursor()?;
        ensure!(cursor.read()?, "expected a row on first execution");
        cursor.close();
    }
    let mut cursor = stmt.execute_cursor()?;
    ensure!(cursor.read()?, "expected a row on second execution");
    ensure_eq!(cursor.get::<i64>(0)?, 1);
    Ok(())
}

fn connection_close_is_idempotent(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    ensure!(conn.is_open(), "fresh connection reports closed");
    conn.close();
    conn.close();
    ensure!(!conn.is_open(), "closed connection reports open");
    Ok(())
}

fn statement_on_closed_connection_fails(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    conn.close();
    let stmt = conn.statement(ctx.sql("SELECT 1;"));
    expect_kind(stmt, ErrorKind::Closed, "statement")
}
