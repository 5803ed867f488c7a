//! Plain-text `!` commands kept for members used to the old bot.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegacyCommand {
    Ping,
    /// `!book "<title>" <days>`
    Book { title: String, days: u32 },
    /// Started with `!book ` but did not match the expected shape.
    MalformedBook,
}

static BOOK_RE: OnceLock<Regex> = OnceLock::new();

fn book_re() -> &'static Regex {
    BOOK_RE.get_or_init(|| Regex::new(r#"!book\s+"([^"]+)"\s+(\d+)"#).expect("valid regex"))
}

/// Recognize a legacy command. Anything else returns `None`.
pub fn parse(content: &str) -> Option<LegacyCommand> {
    if content == "!ping" {
        return Some(LegacyCommand::Ping);
    }
    if !content.starts_with("!book ") {
        return None;
    }

    let Some(caps) = book_re().captures(content) else {
        return Some(LegacyCommand::MalformedBook);
    };
    // Digit runs too large for a day count are treated like a bad format.
    let Ok(days) = caps[2].parse::<u32>() else {
        return Some(LegacyCommand::MalformedBook);
    };

    Some(LegacyCommand::Book {
        title: caps[1].to_string(),
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_must_match_exactly() {
        assert_eq!(parse("!ping"), Some(LegacyCommand::Ping));
        assert_eq!(parse("!ping now"), None);
        assert_eq!(parse("ping"), None);
    }

    #[test]
    fn book_with_quoted_title_and_days() {
        assert_eq!(
            parse(r#"!book "The Hobbit" 14"#),
            Some(LegacyCommand::Book {
                title: "The Hobbit".to_string(),
                days: 14
            })
        );
        assert_eq!(
            parse("!book   \"Dune\"   3 please"),
            Some(LegacyCommand::Book {
                title: "Dune".to_string(),
                days: 3
            })
        );
    }

    #[test]
    fn malformed_book_is_reported() {
        assert_eq!(parse("!book Dune 3"), Some(LegacyCommand::MalformedBook));
        assert_eq!(parse(r#"!book "Dune""#), Some(LegacyCommand::MalformedBook));
        assert_eq!(
            parse(r#"!book "Dune" 99999999999999"#),
            Some(LegacyCommand::MalformedBook)
        );
    }

    #[test]
    fn other_text_is_ignored() {
        assert_eq!(parse("!books"), None);
        assert_eq!(parse("hello"), None);
        assert_eq!(parse(""), None);
    }
}
