//! Vhisp - a small S-expression interpreter
//!
//! This crate provides an interpreter for a tiny Lisp dialect built around two
//! list forms: S-expressions, which are reduced when evaluated, and
//! Q-expressions, which are inert data until forced with `eval`.
//!
//! ```text
//! (+ 1 2 3)              ; 6
//! (- 10 3 2)             ; 5, folds left to right
//! (head {1 2 3})         ; {1}
//! (join {1 2} {3})       ; {1 2 3}
//! (eval {* 2 (+ 1 2)})   ; 6
//! ```
//!
//! ## Errors Are Values
//!
//! A failing operation does not unwind. It produces an [`EvalError`], which the
//! evaluator carries on the `Result` channel and which can also live inside the
//! data model as [`ast::Value::Error`]. Within an S-expression every child is
//! evaluated first, then the leftmost failure becomes the result of the whole
//! expression.
//!
//! ## Modules
//!
//! - `ast`: the value model and its printed form
//! - `reader`: syntax trees and their conversion into values
//! - `builtinops`: the fixed catalogue of builtin operations
//! - `evaluator`: the symbol environment and the reduction algorithm
//! - `parser`: the text grammar producing syntax trees (feature `parser`)

use std::fmt;

/// Default maximum nesting depth accepted by the parser.
///
/// The evaluator recurses once per level of nesting, so bounding the depth of
/// parsed input also bounds evaluation depth.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (stray delimiters, characters outside the grammar)
    InvalidSyntax,
    /// Input ended before an open list was closed
    Incomplete,
    /// Expression nesting exceeded the configured maximum depth
    TooDeeplyNested,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Column (1-based) where the error was detected
    pub column: usize,
    /// Context snippet from the input showing where the error occurred (max 40 chars)
    pub context: Option<String>,
    /// The problematic character encountered, if any
    pub found: Option<char>,
}

impl ParseError {
    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 40;

        let error_offset = error_offset.min(input.len());
        let column = input[..error_offset].chars().count() + 1;
        let found = input[error_offset..].chars().next();

        let context_start = column.saturating_sub(11);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        let context = (!input.trim().is_empty()).then_some(display_context);

        ParseError {
            kind,
            message: message.into(),
            column,
            context,
            found,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<stdin>:1:{}: error: {}", self.column, self.message)?;
        if let Some(found) = self.found {
            write!(f, "\n  found: '{found}'")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\n  near: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Failures produced while reading or evaluating a program.
///
/// The message of every variant is the exact text shown to the user after the
/// `Error: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unbound symbol!")]
    UnboundSymbol,
    #[error("invalid number")]
    InvalidNumber,
    #[error("Cannot operate on non-number!")]
    NonNumber,
    #[error("Division By Zero!")]
    DivisionByZero,
    #[error("Unknown Symbol!")]
    UnknownSymbol,
    #[error("Integer overflow in {0}!")]
    Overflow(&'static str),
    #[error("Negative exponent!")]
    NegativeExponent,
    #[error("Function '{0}' passed no arguments!")]
    NoArguments(&'static str),
    #[error("Function '{0}' passed too many arguments!")]
    TooManyArguments(&'static str),
    #[error("Function '{0}' passed incorrect type!")]
    IncorrectType(&'static str),
    #[error("Function '{0}' passed {{}}!")]
    EmptyList(&'static str),
    #[error("Function 'join' passed incorrect type.")]
    JoinIncorrectType,
    #[error("S-expression Does not start with symbol!")]
    NotAFunction,
    #[error("{0}")]
    Message(String),
}

/// Error type for the text-to-value pipeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Error: {0}")]
    Eval(#[from] EvalError),
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod reader;

#[cfg(feature = "parser")]
pub mod parser;

/// Parse one line of text, read it into a value tree and evaluate it.
///
/// The whole line is the root S-expression, so `+ 1 2` and `(+ 1 2)` both
/// evaluate to `3`.
#[cfg(feature = "parser")]
pub fn evaluate(
    input: &str,
    env: &mut evaluator::Environment,
) -> Result<ast::Value, Error> {
    evaluate_with_config(input, parser::ParseConfig::default(), env)
}

/// Like [`evaluate`], with an explicit parser configuration.
#[cfg(feature = "parser")]
pub fn evaluate_with_config(
    input: &str,
    config: parser::ParseConfig,
    env: &mut evaluator::Environment,
) -> Result<ast::Value, Error> {
    let tree = parser::parse_with_config(input, config)?;
    let value = reader::read(&tree);
    Ok(evaluator::eval(env, value)?)
}
