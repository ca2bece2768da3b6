//! Text values with one- to four-byte UTF-8 scalars read back exactly.

use super::{CheckContext, CheckResult, Topic};

checks!(Topic::TextEncoding => [
    get_string_works_utf8_one_byte,
    get_string_works_utf8_two_bytes,
    get_string_works_utf8_three_bytes,
    get_string_works_utf8_four_bytes,
    get_field_value_works_utf8_one_byte,
    get_field_value_works_utf8_two_bytes,
    get_field_value_works_utf8_three_bytes,
    get_field_value_works_utf8_four_bytes,
    get_value_to_string_works_utf8_one_byte,
    get_value_to_string_works_utf8_two_bytes,
    get_value_to_string_works_utf8_three_bytes,
    get_value_to_string_works_utf8_four_bytes,
    mixed_width_text_round_trips,
]);

const ONE_BYTE: &str = "a";
const TWO_BYTES: &str = "Ä";
const THREE_BYTES: &str = "Ḁ";
const FOUR_BYTES: &str = "😀";

fn select_text(ctx: &CheckContext<'_>, text: &str) -> String {
    format!("SELECT {} AS t;", ctx.fixture().text_literal(text))
}

fn get_string(ctx: &CheckContext<'_>, text: &str) -> CheckResult {
    let sql = select_text(ctx, text);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<String>(0)?, text);
        Ok(())
    })
}

fn get_field_value(ctx: &CheckContext<'_>, text: &str) -> CheckResult {
    let sql = select_text(ctx, text);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get_by_name::<String>("t")?, text);
        Ok(())
    })
}

fn get_value_to_string(ctx: &CheckContext<'_>, text: &str) -> CheckResult {
    let sql = select_text(ctx, text);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.value(0)?.to_string(), text);
        Ok(())
    })
}

fn get_string_works_utf8_one_byte(ctx: &CheckContext<'_>) -> CheckResult {
    get_string(ctx, ONE_BYTE)
}

fn get_string_works_utf8_two_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_string(ctx, TWO_BYTES)
}

fn get_string_works_utf8_three_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_string(ctx, THREE_BYTES)
}

fn get_string_works_utf8_four_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_string(ctx, FOUR_BYTES)
}

fn get_field_value_works_utf8_one_byte(ctx: &CheckContext<'_>) -> CheckResult {
    get_field_value(ctx, ONE_BYTE)
}

fn get_field_value_works_utf8_two_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_field_value(ctx, TWO_BYTES)
}

fn get_field_value_works_utf8_three_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_field_value(ctx, THREE_BYTES)
}

fn get_field_value_works_utf8_four_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_field_value(ctx, FOUR_BYTES)
}

fn get_value_to_string_works_utf8_one_byte(ctx: &CheckContext<'_>) -> CheckResult {
    get_value_to_string(ctx, ONE_BYTE)
}

fn get_value_to_string_works_utf8_two_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_value_to_string(ctx, TWO_BYTES)
}

fn get_value_to_string_works_utf8_three_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_value_to_string(ctx, THREE_BYTES)
}

fn get_value_to_string_works_utf8_four_bytes(ctx: &CheckContext<'_>) -> CheckResult {
    get_value_to_string(ctx, FOUR_BYTES)
}

fn mixed_width_text_round_trips(ctx: &CheckContext<'_>) -> CheckResult {
    let text = [ONE_BYTE, TWO_BYTES, THREE_BYTES, FOUR_BYTES].join(" ");
    let sql = select_text(ctx, &text);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        ensure_eq!(cursor.get::<String>(0)?, text);
        let mut bytes = vec![0u8; text.len() + 4];
        ensure_eq!(cursor.get_bytes(0, 0, &mut bytes)?, text.len());
        ensure_eq!(&bytes[..text.len()], text.as_bytes());
        let mut chars = vec!['\0'; 16];
        ensure_eq!(cursor.get_chars(0, 0, &mut chars)?, text.chars().count());
        Ok(())
    })
}
