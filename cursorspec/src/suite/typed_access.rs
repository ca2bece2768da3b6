//! Typed getters on a current row and the untyped accessors.

use super::{expect_kind, CheckContext, CheckResult, Topic};
use crate::error::ErrorKind;
use crate::value::{DbNull, Value};
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

checks!(Topic::TypedAccess => [
    get_boolean_works,
    get_byte_works,
    get_int16_works,
    get_int32_works,
    get_int64_works,
    get_float_works,
    get_double_works,
    get_string_works,
    get_date_time_works_with_text,
    get_guid_works_when_blob,
    get_guid_works_when_text,
    get_field_value_of_string_works,
    get_field_value_of_byte_array_works,
    get_field_value_of_byte_array_empty,
    get_field_value_throws_before_read,
    get_field_value_throws_when_done,
    get_int64_throws_when_text,
    get_byte_throws_when_out_of_range,
    get_value_works_when_string,
    get_value_works_when_blob,
    get_value_throws_before_read,
    get_value_throws_when_done,
    get_value_throws_when_closed,
    get_values_works,
    get_values_when_too_narrow,
    item_by_ordinal_works,
    item_by_name_works,
]);

const GUID_BLOB: [u8; 16] = [
    0x0E, 0x7E, 0x0D, 0xDC, 0x5D, 0x36, 0x48, 0x49, 0xAB, 0x9B, 0x8C, 0xA8, 0x05, 0x6B, 0xF9, 0x3A,
];
const GUID_TEXT: &str = "dc0d7e0e-365d-4948-ab9b-8ca8056bf93a";

fn get_boolean_works(ctx: &CheckContext<'_>) -> CheckResult {
    let fixture = ctx.fixture();
    let sql = format!(
        "SELECT {}, {};",
        fixture.boolean_literal(true),
        fixture.boolean_literal(false)
    );
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<bool>(0)?, true);
        ensure_eq!(cursor.get::<bool>(1)?, false);
        Ok(())
    })
}

fn get_byte_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1;"), |cursor| {
        ensure_eq!(cursor.get::<u8>(0)?, 1);
        Ok(())
    })
}

fn get_int16_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1;"), |cursor| {
        ensure_eq!(cursor.get::<i16>(0)?, 1);
        Ok(())
    })
}

fn get_int32_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1;"), |cursor| {
        ensure_eq!(cursor.get::<i32>(0)?, 1);
        Ok(())
    })
}

fn get_int64_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 1, 9223372036854775807;"), |cursor| {
        ensure_eq!(cursor.get::<i64>(0)?, 1);
        ensure_eq!(cursor.get::<i64>(1)?, i64::MAX);
        Ok(())
    })
}

fn get_float_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 3;"), |cursor| {
        ensure_eq!(cursor.get::<f32>(0)?, 3.0);
        Ok(())
    })
}

fn get_double_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 3.5, 3;"), |cursor| {
        ensure_eq!(cursor.get::<f64>(0)?, 3.5);
        ensure_eq!(cursor.get::<f64>(1)?, 3.0);
        Ok(())
    })
}

fn get_string_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test';"), |cursor| {
        ensure_eq!(cursor.get::<String>(0)?, "test");
        Ok(())
    })
}

fn get_date_time_works_with_text(ctx: &CheckContext<'_>) -> CheckResult {
    let expected = NaiveDate::from_ymd_opt(2014, 4, 15)
        .and_then(|date| date.and_hms_opt(10, 47, 16))
        .ok_or_else(|| super::CheckFailure::violation("invalid expected timestamp"))?;
    ctx.with_row(ctx.sql("SELECT '2014-04-15 10:47:16';"), |cursor| {
        ensure_eq!(cursor.get::<NaiveDateTime>(0)?, expected);
        Ok(())
    })
}

fn get_guid_works_when_blob(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT {};", ctx.fixture().binary_literal(&GUID_BLOB));
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<Uuid>(0)?.to_string(), GUID_TEXT);
        Ok(())
    })
}

fn get_guid_works_when_text(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT '{GUID_TEXT}';");
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<Uuid>(0)?.to_string(), GUID_TEXT);
        Ok(())
    })
}

fn get_field_value_of_string_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test' AS t;"), |cursor| {
        ensure_eq!(cursor.get_by_name::<String>("t")?, "test");
        Ok(())
    })
}

fn get_field_value_of_byte_array_works(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT {};", ctx.fixture().binary_literal(&[0x7E, 0x57]));
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<Vec<u8>>(0)?, vec![0x7E, 0x57]);
        Ok(())
    })
}

fn get_field_value_of_byte_array_empty(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT {};", ctx.fixture().binary_literal(&[]));
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<Vec<u8>>(0)?, Vec::<u8>::new());
        Ok(())
    })
}

fn get_field_value_throws_before_read(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT NULL;"), |cursor| {
        expect_kind(cursor.get::<DbNull>(0), ErrorKind::BeforeRead, "get::<DbNull>")
    })
}

fn get_field_value_throws_when_done(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_exhausted_cursor(ctx.sql("SELECT NULL;"), |cursor| {
        expect_kind(cursor.get::<DbNull>(0), ErrorKind::Exhausted, "get::<DbNull>")
    })
}

fn get_int64_throws_when_text(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test';"), |cursor| {
        expect_kind(cursor.get::<i64>(0), ErrorKind::TypeMismatch, "get::<i64>")
    })
}

fn get_byte_throws_when_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 300, -1;"), |cursor| {
        expect_kind(cursor.get::<u8>(0), ErrorKind::TypeMismatch, "get::<u8>(300)")?;
        expect_kind(cursor.get::<u8>(1), ErrorKind::TypeMismatch, "get::<u8>(-1)")
    })
}

fn get_value_works_when_string(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test';"), |cursor| {
        ensure_eq!(cursor.value(0)?, Value::Text("test".to_string()));
        Ok(())
    })
}

fn get_value_works_when_blob(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT {};", ctx.fixture().binary_literal(&[0x7E, 0x57]));
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.value(0)?, Value::Blob(vec![0x7E, 0x57]));
        Ok(())
    })
}

fn get_value_throws_before_read(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_cursor(ctx.sql("SELECT NULL;"), |cursor| {
        expect_kind(cursor.value(0), ErrorKind::BeforeRead, "value")
    })
}

fn get_value_throws_when_done(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_exhausted_cursor(ctx.sql("SELECT NULL;"), |cursor| {
        expect_kind(cursor.value(0), ErrorKind::Exhausted, "value")
    })
}

fn get_value_throws_when_closed(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_closed_cursor(ctx.sql("SELECT NULL;"), |cursor| {
        expect_kind(cursor.value(0), ErrorKind::Closed, "value")
    })
}

fn get_values_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'a', 'b';"), |cursor| {
        let sentinel = Value::Integer(-1);
        let mut dest = vec![sentinel.clone(); 3];
        ensure_eq!(cursor.get_values(&mut dest)?, 2);
        ensure_eq!(dest[0], Value::Text("a".to_string()));
        ensure_eq!(dest[1], Value::Text("b".to_string()));
        ensure_eq!(dest[2], sentinel);
        Ok(())
    })
}

fn get_values_when_too_narrow(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'a', 'b';"), |cursor| {
        let mut empty: [Value; 0] = [];
        ensure_eq!(cursor.get_values(&mut empty)?, 0);
        let mut one = [Value::Null];
        ensure_eq!(cursor.get_values(&mut one)?, 1);
        ensure_eq!(one[0], Value::Text("a".to_string()));
        Ok(())
    })
}

fn item_by_ordinal_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test' AS Id;"), |cursor| {
        ensure_eq!(cursor.value(0)?, Value::Text("test".to_string()));
        Ok(())
    })
}

fn item_by_name_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test' AS Id;"), |cursor| {
        ensure_eq!(cursor.value_by_name("Id")?, Value::Text("test".to_string()));
        ensure_eq!(cursor.value_by_name("Id")?, cursor.value(0)?);
        Ok(())
    })
}
