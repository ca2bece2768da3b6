//! SQL text helpers shared by connectors.

/// Quote `text` as a SQL string literal.
pub fn text_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_literal_escapes_quotes() {
        assert_eq!(text_literal("it's"), "'it''s'");
        assert_eq!(text_literal("''"), "''''''");
        assert_eq!(text_literal("Ä"), "'Ä'");
    }
}
