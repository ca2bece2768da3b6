//! Cursor state machine: advancing rows and result sets, closing.

use super::{expect_kind, CheckContext, CheckResult, Topic};
use crate::error::ErrorKind;
use crate::value::{DbNull, Value};

checks!(Topic::Lifecycle => [
    depth_returns_zero,
    field_count_works,
    field_count_throws_when_closed,
    is_closed_returns_false_when_active,
    is_closed_returns_true_when_closed,
    close_is_idempotent,
    closed_cursor_rejects_every_operation,
    read_works,
    read_throws_when_closed,
    read_returns_false_after_exhaustion,
    rows_iterates_every_row,
    has_rows_returns_true_when_rows,
    has_rows_returns_false_when_no_rows,
    has_rows_works_when_batching,
    next_result_works,
    next_result_can_be_called_more_than_once,
    next_result_throws_when_closed,
    closing_cursor_keeps_connection_usable,
]);

fn depth_returns_zero(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1;"), |cursor| {
        ensure_eq!(cursor.depth()?, 0);
        Ok(())
    })
}

fn field_count_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1 AS a, 2 AS b;"), |cursor| {
        ensure_eq!(cursor.field_count()?, 2);
        ensure!(cursor.read()?, "expected a row");
        ensure_eq!(cursor.field_count()?, 2);
        Ok(())
    })
}

fn field_count_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql("SELECT 1;"), |cursor| {
        expect_kind(cursor.field_count(), ErrorKind::Closed, "field_count")
    })
}

fn is_closed_returns_false_when_active(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1;"), |cursor| {
        ensure!(!cursor.is_closed(), "fresh cursor reports closed");
        cursor.read()?;
        ensure!(!cursor.is_closed(), "cursor on a row reports closed");
        Ok(())
    })
}

fn is_closed_returns_true_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql("SELECT 1;"), |cursor| {
        ensure!(cursor.is_closed(), "closed cursor reports open");
        Ok(())
    })
}

fn close_is_idempotent(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1;"), |cursor| {
        cursor.close();
        cursor.close();
        ensure!(cursor.is_closed(), "cursor closed twice reports open");
        Ok(())
    })
}

fn closed_cursor_rejects_every_operation(ctx: &CheckContext<'_>) -> CheckResult {
    let closed = ErrorKind::Closed;
    ctx.with_row(ctx.sql("SELECT 1 AS a;"), |cursor| {
        cursor.close();
        // twice: closing is irreversible
        for _ in 0..2 {
            expect_kind(cursor.field_count(), closed, "field_count")?;
            expect_kind(cursor.name(0), closed, "name")?;
            expect_kind(cursor.ordinal("a"), closed, "ordinal")?;
            expect_kind(cursor.data_type_name(0), closed, "data_type_name")?;
            expect_kind(cursor.field_type(0), closed, "field_type")?;
            expect_kind(cursor.value(0), closed, "value")?;
            expect_kind(cursor.value_by_name("a"), closed, "value_by_name")?;
            expect_kind(cursor.is_null(0), closed, "is_null")?;
            expect_kind(cursor.get::<i64>(0), closed, "get::<i64>")?;
            expect_kind(cursor.get::<DbNull>(0), closed, "get::<DbNull>")?;
            expect_kind(cursor.get_bytes(0, 0, &mut [0u8; 4]), closed, "get_bytes")?;
            expect_kind(cursor.get_chars(0, 0, &mut ['\0'; 4]), closed, "get_chars")?;
            expect_kind(
                cursor.get_values(&mut [Value::Null, Value::Null]),
                closed,
                "get_values",
            )?;
            expect_kind(cursor.depth(), closed, "depth")?;
            expect_kind(cursor.has_rows(), closed, "has_rows")?;
            expect_kind(cursor.read(), closed, "read")?;
            expect_kind(cursor.next_result(), closed, "next_result")?;
            ensure!(cursor.is_closed(), "is_closed must stay answerable");
        }
        Ok(())
    })
}

fn read_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1 UNION SELECT 2;"), |cursor| {
        ensure!(cursor.read()?, "expected first row");
        ensure_eq!(cursor.get::<i64>(0)?, 1);
        ensure!(cursor.read()?, "expected second row");
        ensure_eq!(cursor.get::<i64>(0)?, 2);
        ensure!(!cursor.read()?, "expected exactly two rows");
        Ok(())
    })
}

fn read_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql("SELECT 1;"), |cursor| {
        expect_kind(cursor.read(), ErrorKind::Closed, "read")
    })
}

fn read_returns_false_after_exhaustion(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_exhausted_cursor(ctx.sql("SELECT 1;"), |cursor| {
        ensure!(!cursor.read()?, "read after exhaustion returned a row");
        ensure!(!cursor.read()?, "read after exhaustion returned a row");
        Ok(())
    })
}

fn rows_iterates_every_row(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1 AS a, 'x' AS b UNION ALL SELECT 2, NULL;"), |cursor| {
        let rows = cursor.rows().collect::<crate::error::Result<Vec<_>>>()?;
        ensure_eq!(
            rows,
            vec![
                vec![Value::Integer(1), Value::Text("x".to_string())],
                vec![Value::Integer(2), Value::Null],
            ]
        );
        ensure!(!cursor.read()?, "rows left the cursor before its last row");
        Ok(())
    })
}

fn has_rows_returns_true_when_rows(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1;"), |cursor| {
        ensure!(cursor.has_rows()?, "has_rows is false for a one-row result");
        // the lookahead must not consume the row
        ensure!(cursor.read()?, "row vanished after has_rows");
        ensure_eq!(cursor.get::<i64>(0)?, 1);
        ensure!(cursor.has_rows()?, "has_rows changed while on a row");
        Ok(())
    })
}

fn has_rows_returns_false_when_no_rows(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = ctx.fixture().select_no_rows().to_string();
    ctx.with_cursor(ctx.sql(&sql), |cursor| {
        ensure!(!cursor.has_rows()?, "has_rows is true for an empty result");
        ensure!(!cursor.read()?, "empty result returned a row");
        Ok(())
    })
}

fn has_rows_works_when_batching(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("{}SELECT 1;", ctx.fixture().select_no_rows());
    ctx.with_cursor(ctx.sql(&sql), |cursor| {
        ensure!(!cursor.has_rows()?, "first (empty) result set reports rows");
        ensure!(cursor.next_result()?, "expected a second result set");
        ensure!(cursor.has_rows()?, "second result set reports no rows");
        ensure!(cursor.read()?, "expected a row in the second result set");
        ensure_eq!(cursor.get::<i64>(0)?, 1);
        Ok(())
    })
}

fn next_result_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1; SELECT 2;"), |cursor| {
        ensure!(cursor.read()?, "expected a row in the first result set");
        ensure_eq!(cursor.get::<i64>(0)?, 1);
        ensure!(cursor.next_result()?, "expected a second result set");
        ensure!(cursor.read()?, "expected a row in the second result set");
        ensure_eq!(cursor.get::<i64>(0)?, 2);
        ensure!(!cursor.next_result()?, "expected exactly two result sets");
        Ok(())
    })
}

fn next_result_can_be_called_more_than_once(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1;"), |cursor| {
        ensure!(!cursor.next_result()?, "unexpected second result set");
        ensure!(!cursor.next_result()?, "next_result is not idempotent at the end");
        ensure!(!cursor.read()?, "read after the last result set returned a row");
        Ok(())
    })
}

fn next_result_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql("SELECT 1;"), |cursor| {
        expect_kind(cursor.next_result(), ErrorKind::Closed, "next_result")
    })
}

fn closing_cursor_keeps_connection_usable(ctx: &CheckContext<'_>) -> CheckResult {
    let mut conn = ctx.open()?;
    {
        let mut stmt = conn.statement(ctx.sql("SELECT 1;"))?;
        let mut cursor = stmt.execute_cursor()?;
        cursor.read()?;
        cursor.close();
    }
    ensure!(conn.is_open(), "closing a cursor closed its connection");
    let mut stmt = conn.statement("SELECT 2;")?;
    ensure_eq!(stmt.execute_scalar()?, Some(Value::Integer(2)));
    Ok(())
}
