//! Text grammar producing [`SyntaxNode`] trees.
//!
//! ```text
//! number : /-?[0-9]+(\.[0-9]+)?/
//! symbol : /[a-zA-Z0-9_+\-*\/\\=<>!&%^|]+/
//! sexpr  : '(' <expr>* ')'
//! qexpr  : '{' <expr>* '}'
//! expr   : <number> | <symbol> | <sexpr> | <qexpr>
//! vhisp  : /^/ <expr>* /$/
//! ```
//!
//! The whole input is one root node, so a line like `+ 1 2` reads as the
//! S-expression `(+ 1 2)`. Delimiters and the start/end markers are kept in the
//! tree as leaf nodes.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace0},
    combinator::{cut, eof, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::preceded,
};

use crate::reader::{Rule, SyntaxNode};
use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Characters admitted in symbols besides ASCII letters and digits
pub const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&%^|";

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum number of nested lists; the root line itself does not count
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            max_depth: MAX_PARSE_DEPTH,
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Parse a number literal, keeping its text
fn parse_number(input: &str) -> IResult<&str, SyntaxNode> {
    let (input, text) = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
    ))
    .parse(input)?;

    Ok((input, SyntaxNode::leaf(Rule::Number, text)))
}

/// Parse a symbol (identifier or operator name)
fn parse_symbol(input: &str) -> IResult<&str, SyntaxNode> {
    let (input, text) = take_while1(is_symbol_char).parse(input)?;
    Ok((input, SyntaxNode::leaf(Rule::Symbol, text)))
}

/// Parse a delimited list.
///
/// Once the opening delimiter is consumed, failures are fatal so that the error
/// points into the unfinished list rather than at its start.
fn parse_list<'a>(
    input: &'a str,
    (rule, open, close): (Rule, char, char),
    config: ParseConfig,
    depth: usize,
) -> IResult<&'a str, SyntaxNode> {
    let start = input;
    let (input, _) = char(open).parse(input)?;

    if depth >= config.max_depth {
        return Err(nom::Err::Failure(nom::error::Error::new(
            start,
            ErrorKind::TooLarge,
        )));
    }

    let (input, elements) = many0(|input| parse_expr(input, config, depth + 1)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = cut(char(close)).parse(input)?;

    let mut children = Vec::with_capacity(elements.len() + 2);
    children.push(SyntaxNode::delimiter(open));
    children.extend(elements);
    children.push(SyntaxNode::delimiter(close));
    Ok((input, SyntaxNode::branch(rule, children)))
}

/// Parse one expression, skipping leading whitespace
fn parse_expr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, SyntaxNode> {
    preceded(
        multispace0,
        alt((
            |input| parse_list(input, (Rule::SExpr, '(', ')'), config, depth),
            |input| parse_list(input, (Rule::QExpr, '{', '}'), config, depth),
            parse_number,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Parse a whole line into a root node
fn parse_root(input: &str, config: ParseConfig) -> IResult<&str, SyntaxNode> {
    let (input, elements) = many0(|input| parse_expr(input, config, 0)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = eof.parse(input)?;

    let mut children = Vec::with_capacity(elements.len() + 2);
    children.push(SyntaxNode::marker());
    children.extend(elements);
    children.push(SyntaxNode::marker());
    Ok((input, SyntaxNode::branch(Rule::Root, children)))
}

/// Convert nom parsing errors to positioned diagnostics
fn parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>, config: ParseConfig) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = input.len().saturating_sub(e.input.len());
            let (kind, message) = match e.code {
                ErrorKind::TooLarge => (
                    ParseErrorKind::TooDeeplyNested,
                    format!(
                        "expression too deeply nested (max depth: {})",
                        config.max_depth
                    ),
                ),
                _ if e.input.is_empty() => (
                    ParseErrorKind::Incomplete,
                    "unexpected end of input, expected closing delimiter".to_owned(),
                ),
                ErrorKind::Char => (
                    ParseErrorKind::InvalidSyntax,
                    "expected closing delimiter".to_owned(),
                ),
                ErrorKind::Eof => (
                    ParseErrorKind::InvalidSyntax,
                    "expected number, symbol, '(' or '{'".to_owned(),
                ),
                _ => (ParseErrorKind::InvalidSyntax, "invalid syntax".to_owned()),
            };
            ParseError::with_context(kind, message, input, offset)
        }
        nom::Err::Incomplete(_) => ParseError::with_context(
            ParseErrorKind::Incomplete,
            "incomplete input",
            input,
            input.len(),
        ),
    }
}

/// Parse a line of text with the default configuration.
pub fn parse(input: &str) -> Result<SyntaxNode, ParseError> {
    parse_with_config(input, ParseConfig::default())
}

/// Parse a line of text into a syntax tree rooted at a [`Rule::Root`] node.
pub fn parse_with_config(input: &str, config: ParseConfig) -> Result<SyntaxNode, ParseError> {
    match parse_root(input, config) {
        Ok((_, tree)) => Ok(tree),
        Err(e) => Err(parse_error(input, e, config)),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{Value, qexpr, sexpr, sym, val};
    use crate::reader::read;
    use pretty_assertions::assert_eq;

    /// Test result variants for parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        Success(Value),              // Parsing should succeed and read as this value
        SpecificError(ParseErrorKind, usize), // Parsing should fail with this kind at this column
    }
    use ParseTestResult::*;

    /// Helper for successful parse test cases
    fn success<T: Into<Value>>(value: T) -> ParseTestResult {
        Success(value.into())
    }

    /// Parse, read, and check round-trip printing of the result
    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Parse test #{} ('{input}')", i + 1);

            match (parse(input), expected) {
                (Ok(tree), Success(expected_val)) => {
                    let actual = read(&tree);
                    assert_eq!(actual, *expected_val, "{test_id}: value mismatch");

                    // Display -> parse -> display should be identical
                    let displayed = actual.to_string();
                    let reparsed = parse(&displayed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip parse failed for '{displayed}': {e}")
                    });
                    let Some(inner) = read(&reparsed).take(0) else {
                        panic!("{test_id}: round-trip produced an empty root");
                    };
                    assert_eq!(
                        inner.to_string(),
                        displayed,
                        "{test_id}: round-trip display mismatch"
                    );
                }
                (Err(err), SpecificError(kind, column)) => {
                    assert_eq!(err.kind, *kind, "{test_id}: error kind mismatch ({err})");
                    assert_eq!(err.column, *column, "{test_id}: error column mismatch ({err})");
                }
                (Ok(tree), SpecificError(..)) => {
                    panic!("{test_id}: expected error, got {:?}", read(&tree));
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: unexpected parse error: {err}");
                }
            }
        }
    }

    #[test]
    fn test_parse_data_driven() {
        use ParseErrorKind::*;

        let test_cases = vec![
            // The root wraps every top-level expression
            ("42", success(sexpr([42]))),
            ("-7", success(sexpr([-7]))),
            ("3.14", success(sexpr([3]))),
            ("foo", success(sexpr([sym("foo")]))),
            ("+ 1 2", success(sexpr([sym("+"), val(1), val(2)]))),
            ("(+ 1 2)", success(sexpr([sexpr([sym("+"), val(1), val(2)])]))),
            ("  ( +   1\t2 )  ", success(sexpr([sexpr([sym("+"), val(1), val(2)])]))),
            ("{1 2 3}", success(sexpr([qexpr([1, 2, 3])]))),
            ("()", success(sexpr([Value::sexpr()]))),
            ("{}", success(sexpr([Value::qexpr()]))),
            ("{(1) {}}", success(sexpr([qexpr([sexpr([1]), Value::qexpr()])]))),
            // Every operator name is a symbol
            (
                "% ^ | & < > / \\ = !",
                success(sexpr(
                    ["%", "^", "|", "&", "<", ">", "/", "\\", "=", "!"].map(sym),
                )),
            ),
            ("snake_case x1", success(sexpr([sym("snake_case"), sym("x1")]))),
            // A lone minus is a symbol, a signed digit run is a number
            ("- -5", success(sexpr([sym("-"), val(-5)]))),
            ("+5", success(sexpr([sym("+5")]))),
            // Numbers are tried first and need no trailing separator
            ("12x", success(sexpr([val(12), sym("x")]))),
            ("(1)(2)", success(sexpr([sexpr([1]), sexpr([2])]))),
            // Errors
            ("(+ 1 2", SpecificError(Incomplete, 7)),
            ("{1 {2}", SpecificError(Incomplete, 7)),
            ("(1 2}", SpecificError(InvalidSyntax, 5)),
            ("1 2)", SpecificError(InvalidSyntax, 4)),
            ("}", SpecificError(InvalidSyntax, 1)),
            ("(+ 1 #)", SpecificError(InvalidSyntax, 6)),
            ("1.", SpecificError(InvalidSyntax, 2)),
            ("\"str\"", SpecificError(InvalidSyntax, 1)),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_empty_input() {
        for input in ["", "   ", "\t"] {
            let tree = parse(input).unwrap();
            assert_eq!(tree.rule, Rule::Root);
            assert_eq!(read(&tree), Value::sexpr());
        }
    }

    #[test]
    fn test_tree_keeps_punctuation() {
        let tree = parse("(a {1})").unwrap();
        let tags: Vec<_> = tree.children.iter().map(|node| node.rule.tag()).collect();
        assert_eq!(tags, vec!["regex", "sexpr", "regex"]);

        let list = &tree.children[1];
        let contents: Vec<_> = list
            .children
            .iter()
            .map(|node| (node.rule, node.contents.as_str()))
            .collect();
        assert_eq!(
            contents,
            vec![
                (Rule::Delimiter, "("),
                (Rule::Symbol, "a"),
                (Rule::QExpr, ""),
                (Rule::Delimiter, ")"),
            ]
        );
    }

    #[test]
    fn test_parse_depth_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        assert!(parse(&nested(MAX_PARSE_DEPTH)).is_ok());
        let err = parse(&nested(MAX_PARSE_DEPTH + 1)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested);
        assert_eq!(err.column, MAX_PARSE_DEPTH + 1);

        let shallow = ParseConfig { max_depth: 2 };
        assert!(parse_with_config("((1)) {{2}}", shallow).is_ok());
        let err = parse_with_config("{({3})}", shallow).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested);
        assert!(err.message.contains("max depth: 2"), "{}", err.message);

        // Deep nesting that would otherwise be fine still fails fast
        let err = parse(&"(".repeat(10_000)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeeplyNested);
    }

    #[test]
    fn test_parse_error_display() {
        let err = parse("(+ 1 2").unwrap_err();
        let rendered = err.to_string();
        assert!(
            rendered.starts_with("<stdin>:1:7: error: unexpected end of input"),
            "{rendered}"
        );
        assert_eq!(err.found, None);

        let err = parse("(1 2]").unwrap_err();
        assert_eq!(err.found, Some(']'));
        assert!(err.to_string().contains("found: ']'"));
    }
}
