use anyhow::anyhow;
use chumsky::Parser;
use chumsky::error::Simple;
use chumsky::primitive::{end, filter};

pub type ParseError = Simple<char>;

// Parsing infrastructure
pub trait CharParser<T>: Parser<char, T, Error = Simple<char>> + Sized {
    fn parse_text(&self, input: &str) -> anyhow::Result<T> {
        self.parse(input)
            .map_err(|errors| anyhow!("{}", format_errors(input, errors)))
    }
}
impl<T, P> CharParser<T> for P where P: Parser<char, T, Error = Simple<char>> {}

/// Formats the first `chumsky` error into a single line with a caret marker below the input.
pub fn format_errors(input: &str, mut errors: Vec<Simple<char>>) -> String {
    use chumsky::Span;
    use std::fmt::Write;

    errors.truncate(1);
    let Some(error) = errors.pop() else {
        return "unknown parse error".to_string();
    };

    let mut output = String::new();
    let span = error.span();

    let reason = match error.reason() {
        chumsky::error::SimpleReason::Custom(msg) => msg.clone(),
        _ => match error.found() {
            Some(c) => format!("unexpected token `{c}`"),
            None => "unexpected end of input".to_string(),
        },
    };
    let _ = match error.label() {
        Some(label) => write!(output, "{reason} while parsing {label}"),
        None => write!(output, "{reason}"),
    };

    if input.is_empty() {
        output.push_str(" (the input was empty)");
    } else {
        let _ = write!(
            output,
            " at character {}: '{}'",
            span.start(),
            input.chars().skip(span.start()).collect::<String>()
        );
    }
    output
}

// Common parsers
fn parse_integer_string() -> impl CharParser<String> {
    filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .labelled("number")
}

/// Parse 8-byte integer.
pub fn parse_u64() -> impl CharParser<u64> {
    parse_integer_string().try_map(|p, span| {
        p.parse::<u64>()
            .map_err(|_| Simple::custom(span, "Cannot parse as 8-byte unsigned integer"))
    })
}

/// Return a parser that will fail if there is any input following the text parsed by the
/// provided parser.
pub fn all_consuming<T>(parser: impl CharParser<T>) -> impl CharParser<T> {
    parser.then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::primitive::just;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64().parse_text("0").unwrap(), 0);
        assert_eq!(parse_u64().parse_text("1048576").unwrap(), 1048576);
        assert!(all_consuming(parse_u64()).parse_text("").is_err());
        assert!(all_consuming(parse_u64()).parse_text("x").is_err());
    }

    #[test]
    fn test_parse_u64_overflow() {
        let error = all_consuming(parse_u64())
            .parse_text("99999999999999999999999")
            .unwrap_err();
        assert!(
            error
                .to_string()
                .starts_with("Cannot parse as 8-byte unsigned integer")
        );
    }

    #[test]
    fn test_error_empty_input() {
        let error = all_consuming(just('x')).parse_text("").unwrap_err();
        assert!(error.to_string().ends_with("(the input was empty)"));
    }

    #[test]
    fn test_error_points_at_offending_token() {
        let error = all_consuming(just('x').repeated())
            .parse_text("xxy")
            .unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"unexpected token `y` at character 2: 'y'");
    }
}
