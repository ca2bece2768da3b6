use super::{expect_kind, CheckContext, CheckResult, Topic};
use crate::error::ErrorKind;
use crate::value::{DbNull, Value};
use chrono::NaiveDateTime;
use uuid::Uuid;

checks!(Topic::NullSemantics => [
    is_db_null_works,
    is_db_null_returns_false_when_value,
    is_db_null_throws_before_read,
    is_db_null_throws_when_done,
    is_db_null_throws_when_closed,
    get_value_works_when_null,
    get_field_value_of_db_null_works,
    get_field_value_of_db_null_throws_when_not_null,
    get_int64_throws_when_null,
    get_double_throws_when_null,
    get_string_throws_when_null,
    get_date_time_throws_when_null,
    get_guid_throws_when_null,
    get_field_value_of_byte_array_throws_when_null,
    get_boolean_throws_when_null,
]);

const SELECT_NULL: &str = "SELECT NULL;";

fn is_db_null_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT NULL, 1;"), |cursor| {
        ensure!(cursor.is_null(0)?, "NULL column is not null");
        ensure!(!cursor.is_null(1)?, "integer column is null");
        Ok(())
    })
}

fn is_db_null_returns_false_when_value(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT 0, '', {};", ctx.fixture().binary_literal(&[]));
    ctx.with_row(ctx.sql(&sql), |cursor| {
        for ordinal in 0..3 {
            ensure!(!cursor.is_null(ordinal)?, "empty value at {ordinal} reported null");
        }
        Ok(())
    })
}

fn is_db_null_throws_before_read(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.is_null(0), ErrorKind::BeforeRead, "is_null")
    })
}

fn is_db_null_throws_when_done(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_exhausted_cursor(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.is_null(0), ErrorKind::Exhausted, "is_null")
    })
}

fn is_db_null_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.is_null(0), ErrorKind::Closed, "is_null")
    })
}

fn get_value_works_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        ensure_eq!(cursor.value(0)?, Value::Null);
        Ok(())
    })
}

fn get_field_value_of_db_null_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        ensure_eq!(cursor.get::<DbNull>(0)?, DbNull);
        Ok(())
    })
}

fn get_field_value_of_db_null_throws_when_not_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1;"), |cursor| {
        expect_kind(cursor.get::<DbNull>(0), ErrorKind::TypeMismatch, "get::<DbNull>")
    })
}

fn get_int64_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.get::<i64>(0), ErrorKind::TypeMismatch, "get::<i64>")
    })
}

fn get_double_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.get::<f64>(0), ErrorKind::TypeMismatch, "get::<f64>")
    })
}

fn get_string_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.get::<String>(0), ErrorKind::TypeMismatch, "get::<String>")
    })
}

fn get_date_time_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(
            cursor.get::<NaiveDateTime>(0),
            ErrorKind::TypeMismatch,
            "get::<NaiveDateTime>",
        )
    })
}

fn get_guid_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.get::<Uuid>(0), ErrorKind::TypeMismatch, "get::<Uuid>")
    })
}

fn get_field_value_of_byte_array_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.get::<Vec<u8>>(0), ErrorKind::TypeMismatch, "get::<Vec<u8>>")
    })
}

fn get_boolean_throws_when_null(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql(SELECT_NULL), |cursor| {
        expect_kind(cursor.get::<bool>(0), ErrorKind::TypeMismatch, "get::<bool>")
    })
}
