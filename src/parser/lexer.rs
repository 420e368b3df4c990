// Lexer utilities shared by the pipeline DSL and the expression language

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map_res, opt, recognize},
    sequence::{delimited, pair, tuple},
    IResult,
};

/// Parse and consume whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier (column name, function name)
/// Format: [a-zA-Z_][a-zA-Z0-9_.]*
pub fn identifier(input: &str) -> IResult<&str, String> {
    let (rest, ident) =
        recognize(take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.'))(input)?;

    if let Some(first) = ident.chars().next() {
        if !first.is_alphabetic() && first != '_' {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Alpha,
            )));
        }
    }

    Ok((rest, ident.to_string()))
}

/// Parse a back-quoted name, allowing any character except the backquote
/// Format: `my column`
pub fn quoted_identifier(input: &str) -> IResult<&str, String> {
    let (input, name) = delimited(char('`'), take_while1(|c| c != '`'), char('`'))(input)?;
    Ok((input, name.to_string()))
}

/// Parse a string literal
/// Format: "..." (may be empty)
pub fn string_literal(input: &str) -> IResult<&str, String> {
    let (input, content) = delimited(char('"'), take_while(|c| c != '"'), char('"'))(input)?;
    Ok((input, content.to_string()))
}

/// Parse an unsigned number literal (integer, decimal, optional exponent).
/// Signs are handled by the callers' unary minus.
pub fn unsigned_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            digit1,
            opt(pair(char('.'), digit0)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse a number literal with an optional leading minus
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    let (input, neg) = opt(char('-'))(input)?;
    let (input, value) = unsigned_number(input)?;
    Ok((input, if neg.is_some() { -value } else { value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::bytes::complete::tag;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("foo"), Ok(("", "foo".to_string())));
        assert_eq!(identifier("foo123"), Ok(("", "foo123".to_string())));
        assert_eq!(identifier("_bar"), Ok(("", "_bar".to_string())));
        assert_eq!(identifier("Sepal.Length"), Ok(("", "Sepal.Length".to_string())));
    }

    #[test]
    fn test_identifier_invalid_start_with_number() {
        assert!(identifier("123abc").is_err());
        assert!(identifier(".x").is_err());
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(quoted_identifier("`unit price`"), Ok(("", "unit price".to_string())));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""hello""#), Ok(("", "hello".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
        assert!(string_literal(r#""hello"#).is_err());
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal("42"), Ok(("", 42.0)));
        assert_eq!(number_literal("3.5"), Ok(("", 3.5)));
        assert_eq!(number_literal("-0.1"), Ok(("", -0.1)));
        assert_eq!(number_literal("1e3"), Ok(("", 1000.0)));
    }

    #[test]
    fn test_unsigned_number_does_not_eat_identifiers() {
        assert!(unsigned_number("inf").is_err());
        assert!(unsigned_number("nan").is_err());
    }

    #[test]
    fn test_ws() {
        let mut parser = ws(tag("foo"));
        assert_eq!(parser("  foo  "), Ok(("", "foo")));
        assert_eq!(parser("\n\tfoo\t\n"), Ok(("", "foo")));
    }
}
