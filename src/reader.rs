//! Syntax trees and their conversion into values.
//!
//! A [`SyntaxNode`] is what a grammar hands to the interpreter: a rule tag, the
//! literal text for leaves and the ordered children for branches. Delimiter
//! tokens and start/end-of-input markers stay in the tree; [`read`] skips them
//! while building the [`Value`] tree.

use crate::EvalError;
use crate::ast::{NumberType, Value};

/// Grammar rule that produced a syntax node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Whole input line
    Root,
    Number,
    Symbol,
    SExpr,
    QExpr,
    /// One of `(`, `)`, `{`, `}`
    Delimiter,
    /// Zero-width start/end-of-input artifact
    Marker,
}

impl Rule {
    pub fn tag(self) -> &'static str {
        match self {
            Rule::Root => ">",
            Rule::Number => "number",
            Rule::Symbol => "symbol",
            Rule::SExpr => "sexpr",
            Rule::QExpr => "qexpr",
            Rule::Delimiter => "char",
            Rule::Marker => "regex",
        }
    }
}

/// Node of a parsed syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub rule: Rule,
    /// Literal text for leaves, empty for branches
    pub contents: String,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(rule: Rule, contents: impl Into<String>) -> Self {
        SyntaxNode {
            rule,
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(rule: Rule, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode {
            rule,
            contents: String::new(),
            children,
        }
    }

    pub fn delimiter(token: char) -> Self {
        Self::leaf(Rule::Delimiter, token)
    }

    pub fn marker() -> Self {
        Self::leaf(Rule::Marker, "")
    }

    /// True for nodes that carry no value: delimiter tokens and markers
    fn is_punctuation(&self) -> bool {
        match self.rule {
            Rule::Delimiter | Rule::Marker => true,
            _ => matches!(self.contents.as_str(), "(" | ")" | "{" | "}"),
        }
    }
}

/// Convert a syntax tree into a value tree.
///
/// Numeric literals that do not fit the integer range become
/// `Error(invalid number)` values; nothing else can fail.
pub fn read(node: &SyntaxNode) -> Value {
    match node.rule {
        Rule::Number => read_number(&node.contents),
        Rule::Symbol => Value::Symbol(node.contents.clone()),
        Rule::Root | Rule::SExpr => read_cells(Value::sexpr(), &node.children),
        Rule::QExpr => read_cells(Value::qexpr(), &node.children),
        Rule::Delimiter | Rule::Marker => Value::sexpr(),
    }
}

fn read_cells(list: Value, children: &[SyntaxNode]) -> Value {
    children
        .iter()
        .filter(|child| !child.is_punctuation())
        .fold(list, |list, child| list.add(read(child)))
}

/// Base-10 conversion of a number literal.
///
/// The grammar admits a fractional part; like `strtol`, only the integer digits
/// before the `.` are converted.
fn read_number(text: &str) -> Value {
    let integer_part = text.split('.').next().unwrap_or(text);
    match integer_part.parse::<NumberType>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Error(EvalError::InvalidNumber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{qexpr, sexpr, sym, val};
    use pretty_assertions::assert_eq;

    fn number(text: &str) -> SyntaxNode {
        SyntaxNode::leaf(Rule::Number, text)
    }

    fn symbol(text: &str) -> SyntaxNode {
        SyntaxNode::leaf(Rule::Symbol, text)
    }

    fn list(rule: Rule, open: char, close: char, inner: Vec<SyntaxNode>) -> SyntaxNode {
        let mut children = vec![SyntaxNode::delimiter(open)];
        children.extend(inner);
        children.push(SyntaxNode::delimiter(close));
        SyntaxNode::branch(rule, children)
    }

    fn root(inner: Vec<SyntaxNode>) -> SyntaxNode {
        let mut children = vec![SyntaxNode::marker()];
        children.extend(inner);
        children.push(SyntaxNode::marker());
        SyntaxNode::branch(Rule::Root, children)
    }

    #[test]
    fn test_read_numbers() {
        let cases = vec![
            ("42", val(42)),
            ("-5", val(-5)),
            ("0", val(0)),
            ("9223372036854775807", val(NumberType::MAX)),
            ("-9223372036854775808", val(NumberType::MIN)),
            ("3.75", val(3)),
            ("-2.5", val(-2)),
            ("9223372036854775808", Value::Error(EvalError::InvalidNumber)),
            ("-99999999999999999999", Value::Error(EvalError::InvalidNumber)),
        ];

        for (text, expected) in cases {
            assert_eq!(read(&number(text)), expected, "reading {text}");
        }
    }

    #[test]
    fn test_read_skips_punctuation() {
        let tree = root(vec![list(
            Rule::SExpr,
            '(',
            ')',
            vec![
                symbol("+"),
                number("1"),
                list(Rule::QExpr, '{', '}', vec![number("2"), symbol("x")]),
            ],
        )]);

        assert_eq!(
            read(&tree),
            sexpr([sexpr([sym("+"), val(1), qexpr([val(2), sym("x")])])])
        );
    }

    #[test]
    fn test_read_empty_forms() {
        assert_eq!(read(&root(vec![])), Value::sexpr());
        assert_eq!(read(&list(Rule::QExpr, '{', '}', vec![])), Value::qexpr());
        assert_eq!(read(&SyntaxNode::marker()), Value::sexpr());
    }

    #[test]
    fn test_read_keeps_overflow_inside_lists() {
        let tree = list(
            Rule::QExpr,
            '{',
            '}',
            vec![number("1"), number("99999999999999999999")],
        );
        assert_eq!(
            read(&tree),
            qexpr([val(1), Value::Error(EvalError::InvalidNumber)])
        );
    }

    #[test]
    fn test_read_round_trip_display() {
        let tree = list(
            Rule::SExpr,
            '(',
            ')',
            vec![number("1"), number("2"), number("3")],
        );
        assert_eq!(read(&tree).to_string(), "(1 2 3)");
        assert_eq!(Rule::Root.tag(), ">");
    }
}
