//! Partial reads into caller-supplied buffers.

use super::{expect_kind, CheckContext, CheckResult, Topic};
use crate::error::ErrorKind;

checks!(Topic::Buffers => [
    get_bytes_works,
    get_bytes_copies_at_most_buffer_length,
    get_bytes_with_source_offset,
    get_bytes_past_end_copies_nothing,
    get_bytes_throws_when_ordinal_out_of_range,
    get_chars_works,
    get_chars_with_source_offset,
    get_chars_does_not_split_multibyte,
    get_chars_throws_when_ordinal_out_of_range,
]);

const FIVE_BYTES: [u8; 5] = [1, 2, 3, 4, 5];

fn select_blob(ctx: &CheckContext<'_>, bytes: &[u8]) -> String {
    format!("SELECT {};", ctx.fixture().binary_literal(bytes))
}

fn get_bytes_works(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = select_blob(ctx, &[0x7E, 0x57]);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        let mut buffer = [0u8; 2];
        ensure_eq!(cursor.get_bytes(0, 0, &mut buffer)?, 2);
        ensure_eq!(buffer, [0x7E, 0x57]);
        Ok(())
    })
}

fn get_bytes_copies_at_most_buffer_length(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = select_blob(ctx, &FIVE_BYTES);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        let mut buffer = [0u8; 3];
        ensure_eq!(cursor.get_bytes(0, 0, &mut buffer)?, 3);
        ensure_eq!(buffer, [1, 2, 3]);

        // a window into a larger buffer leaves the rest untouched
        let mut wide = [0u8; 6];
        ensure_eq!(cursor.get_bytes(0, 0, &mut wide[2..4])?, 2);
        ensure_eq!(wide, [0, 0, 1, 2, 0, 0]);
        Ok(())
    })
}

fn get_bytes_with_source_offset(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = select_blob(ctx, &FIVE_BYTES);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        let mut buffer = [0u8; 4];
        ensure_eq!(cursor.get_bytes(0, 3, &mut buffer)?, 2);
        ensure_eq!(buffer, [4, 5, 0, 0]);
        Ok(())
    })
}

fn get_bytes_past_end_copies_nothing(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = select_blob(ctx, &FIVE_BYTES);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        let mut buffer = [9u8; 2];
        ensure_eq!(cursor.get_bytes(0, 5, &mut buffer)?, 0);
        ensure_eq!(cursor.get_bytes(0, 100, &mut buffer)?, 0);
        ensure_eq!(buffer, [9, 9]);
        Ok(())
    })
}

fn get_bytes_throws_when_ordinal_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = select_blob(ctx, &FIVE_BYTES);
    ctx.with_row(ctx.sql(&sql), |cursor| {
        expect_kind(
            cursor.get_bytes(1, 0, &mut [0u8; 2]),
            ErrorKind::IndexOutOfRange,
            "get_bytes(1)",
        )
    })
}

fn get_chars_works(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test';"), |cursor| {
        let mut buffer = ['\0'; 4];
        ensure_eq!(cursor.get_chars(0, 0, &mut buffer)?, 4);
        ensure_eq!(buffer, ['t', 'e', 's', 't']);
        Ok(())
    })
}

fn get_chars_with_source_offset(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test';"), |cursor| {
        let mut buffer = ['\0'; 4];
        ensure_eq!(cursor.get_chars(0, 2, &mut buffer)?, 2);
        ensure_eq!(buffer, ['s', 't', '\0', '\0']);
        Ok(())
    })
}

fn get_chars_does_not_split_multibyte(ctx: &CheckContext<'_>) -> CheckResult {
    let sql = format!("SELECT {};", ctx.fixture().text_literal("a😀Ḁ"));
    ctx.with_row(ctx.sql(&sql), |cursor| {
        let mut buffer = ['\0'; 1];
        ensure_eq!(cursor.get_chars(0, 1, &mut buffer)?, 1);
        ensure_eq!(buffer[0], '😀');
        let mut rest = ['\0'; 3];
        ensure_eq!(cursor.get_chars(0, 0, &mut rest)?, 3);
        ensure_eq!(rest, ['a', '😀', 'Ḁ']);
        Ok(())
    })
}

fn get_chars_throws_when_ordinal_out_of_range(ctx: &CheckContext<'_>) -> CheckResult {
    ctx.with_row(ctx.sql("SELECT 'test';"), |cursor| {
        expect_kind(
            cursor.get_chars(1, 0, &mut ['\0'; 2]),
            ErrorKind::IndexOutOfRange,
            "get_chars(1)",
        )
    })
}
