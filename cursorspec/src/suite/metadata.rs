//! Column names, ordinals and types of the current result set.

use super::{expect_kind, CheckContext, CheckResult, Topic};
use crate::error::ErrorKind;
use crate::value::ValueKind;

checks!(Topic::Metadata => [
    get_name_works,
    get_name_throws_when_ordinal_out_of_range,
    get_name_throws_when_closed,
    get_ordinal_works,
    get_ordinal_throws_when_out_of_range,
    get_ordinal_throws_when_closed,
    get_field_type_works,
    get_field_type_throws_when_ordinal_out_of_range,
    get_field_type_throws_when_closed,
    get_data_type_name_works,
    get_data_type_name_throws_when_ordinal_out_of_range,
    get_data_type_name_throws_when_closed,
    zero_row_result_exposes_metadata,
    metadata_resets_on_next_result,
]);

const SELECT_ID: &str = "SELECT 1 AS Id;";

fn get_name_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql(SELECT_ID), |cursor| {
        ensure_eq!(cursor.name(0)?, "Id");
        Ok(())
    })
}

fn get_name_throws_when_ordinal_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.name(1), ErrorKind::IndexOutOfRange, "name(1)")
    })
}

fn get_name_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.name(0), ErrorKind::Closed, "name")
    })
}

fn get_ordinal_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1 AS Id, 2 AS Name;"), |cursor| {
        ensure_eq!(cursor.ordinal("Id")?, 0);
        ensure_eq!(cursor.ordinal("Name")?, 1);
        Ok(())
    })
}

fn get_ordinal_throws_when_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.ordinal("Name"), ErrorKind::IndexOutOfRange, "ordinal(\"Name\")")
    })
}

fn get_ordinal_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.ordinal("Id"), ErrorKind::Closed, "ordinal")
    })
}

fn get_field_type_works(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!(
        "SELECT 'test', 1, 1.5, {};",
        ctx.fixture().binary_literal(&[0x00])
    );
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.field_type(0)?, ValueKind::Text);
        ensure_eq!(cursor.field_type(1)?, ValueKind::Integer);
        ensure_eq!(cursor.field_type(2)?, ValueKind::Real);
        ensure_eq!(cursor.field_type(3)?, ValueKind::Blob);
        Ok(())
    })
}

fn get_field_type_throws_when_ordinal_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.field_type(1), ErrorKind::IndexOutOfRange, "field_type(1)")
    })
}

fn get_field_type_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.field_type(0), ErrorKind::Closed, "field_type")
    })
}

fn get_data_type_name_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test', 1;"), |cursor| {
        ensure_eq!(cursor.data_type_name(0)?, "TEXT");
        ensure_eq!(cursor.data_type_name(1)?, "INTEGER");
        Ok(())
    })
}

fn get_data_type_name_throws_when_ordinal_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(
            cursor.data_type_name(1),
            ErrorKind::IndexOutOfRange,
            "data_type_name(1)",
        )
    })
}

fn get_data_type_name_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql(SELECT_ID), |cursor| {
        expect_kind(cursor.data_type_name(0), ErrorKind::Closed, "data_type_name")
    })
}

fn zero_row_result_exposes_metadata(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1 AS a, 'x' AS b WHERE 0 = 1;"), |cursor| {
        ensure_eq!(cursor.field_count()?, 2);
        ensure_eq!(cursor.name(1)?, "b");
        ensure_eq!(cursor.ordinal("a")?, 0);
        ensure!(!cursor.has_rows()?, "empty result reports rows");
        ensure!(!cursor.read()?, "empty result returned a row");
        ensure_eq!(cursor.field_count()?, 2);
        Ok(())
    })
}

fn metadata_resets_on_next_result(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT 1 AS a; SELECT 'x' AS b, 2 AS c;"), |cursor| {
        ensure_eq!(cursor.field_count()?, 1);
        ensure_eq!(cursor.name(0)?, "a");
        ensure!(cursor.next_result()?, "expected a second result set");
        ensure_eq!(cursor.field_count()?, 2);
        ensure_eq!(cursor.name(0)?, "b");
        ensure_eq!(cursor.ordinal("c")?, 1);
        expect_kind(cursor.ordinal("a"), ErrorKind::IndexOutOfRange, "ordinal(\"a\")")
    })
}
