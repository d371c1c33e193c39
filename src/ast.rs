//! This module defines the core value type of the interpreter and helper functions
//! for building values. The main enum, [`Value`], covers every runtime datum:
//! numbers, errors, symbols, builtin functions, and the two list forms
//! (S-expressions and Q-expressions). Lists own their children exclusively, so a
//! value tree is always finite, acyclic and singly owned; `Clone` produces a fully
//! independent deep copy and dropping a value releases its children.
//!
//! Ergonomic helpers such as [`val`], [`sym`], [`sexpr`] and [`qexpr`] are provided
//! for building trees in code and tests. Display logic renders values in the same
//! surface syntax the parser accepts.

use crate::EvalError;
use crate::builtinops::BuiltinOp;

/// Type alias for number values in interpreter
pub type NumberType = i64;

/// Core value type in interpreter
///
/// To build a tree, use the helper functions:
/// - `val(42)` for numbers, `sym("name")` for symbols
/// - `sexpr([...])` and `qexpr([...])` for lists
#[derive(Clone, PartialEq, Eq)]
pub enum Value {
    /// Numbers (integers only)
    Number(NumberType),
    /// A failure carried as data
    Error(EvalError),
    /// Symbols (identifiers)
    Symbol(String),
    /// Reference to an entry of the builtin registry
    Function(&'static BuiltinOp),
    /// Expression pending evaluation
    SExpr(Vec<Value>),
    /// Quoted list, never evaluated automatically
    QExpr(Vec<Value>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_cells(
            f: &mut std::fmt::Formatter<'_>,
            name: &str,
            cells: &[Value],
        ) -> std::fmt::Result {
            write!(f, "{name}(")?;
            for (i, v) in cells.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{v:?}")?;
            }
            write!(f, ")")
        }

        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Error(e) => write!(f, "Error({:?})", e.to_string()),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Function(op) => write!(f, "Function({})", op.id),
            Value::SExpr(cells) => write_cells(f, "SExpr", cells),
            Value::QExpr(cells) => write_cells(f, "QExpr", cells),
        }
    }
}

impl Value {
    pub fn number(n: NumberType) -> Self {
        Value::Number(n)
    }

    /// An error value with an arbitrary message
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(EvalError::Message(message.into()))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn function(op: &'static BuiltinOp) -> Self {
        Value::Function(op)
    }

    /// An empty S-expression
    pub fn sexpr() -> Self {
        Value::SExpr(Vec::new())
    }

    /// An empty Q-expression
    pub fn qexpr() -> Self {
        Value::QExpr(Vec::new())
    }

    /// Append `child` to a list value, taking ownership of it.
    ///
    /// Non-list values are returned unchanged and `child` is dropped.
    #[must_use]
    pub fn add(mut self, child: Value) -> Self {
        if let Some(cells) = self.cells_mut() {
            cells.push(child);
        }
        self
    }

    /// Remove and return the child at index `i`, shifting later children left.
    ///
    /// Returns `None` for non-list values and out-of-range indices, leaving the
    /// value untouched.
    pub fn pop(&mut self, i: usize) -> Option<Value> {
        let cells = self.cells_mut()?;
        (i < cells.len()).then(|| cells.remove(i))
    }

    /// Extract the child at index `i` and drop the rest of the list.
    pub fn take(mut self, i: usize) -> Option<Value> {
        self.pop(i)
    }

    /// Borrow the children of a list value
    pub fn cells(&self) -> Option<&[Value]> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => Some(cells),
            _ => None,
        }
    }

    fn cells_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => Some(cells),
            _ => None,
        }
    }

    /// Number of children of a list value (zero for atoms)
    pub fn len(&self) -> usize {
        self.cells().map_or(0, <[Value]>::len)
    }

    /// True for empty lists and for atoms
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Short name of the active variant, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::Function(_) => "Function",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
        }
    }
}

impl From<EvalError> for Value {
    fn from(e: EvalError) -> Self {
        Value::Error(e)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl TryFrom<Value> for NumberType {
    type Error = EvalError;

    fn try_from(value: Value) -> Result<NumberType, EvalError> {
        match value {
            Value::Number(n) => Ok(n),
            _ => Err(EvalError::NonNumber),
        }
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for building an S-expression from its children
pub fn sexpr<I>(cells: I) -> Value
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Value::SExpr(cells.into_iter().map(Into::into).collect())
}

/// Helper function for building a Q-expression from its children
pub fn qexpr<I>(cells: I) -> Value
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Value::QExpr(cells.into_iter().map(Into::into).collect())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_list(
            f: &mut std::fmt::Formatter<'_>,
            open: char,
            cells: &[Value],
            close: char,
        ) -> std::fmt::Result {
            write!(f, "{open}")?;
            for (i, elem) in cells.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{elem}")?;
            }
            write!(f, "{close}")
        }

        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Error(e) => write!(f, "Error: {e}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Function(_) => write!(f, "<function>"),
            Value::SExpr(cells) => write_list(f, '(', cells, ')'),
            Value::QExpr(cells) => write_list(f, '{', cells, '}'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtinops::find_builtin_op;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (val(42), Value::Number(42)),
            (val(-17), Value::Number(-17)),
            (val(4294967295u32), Value::Number(4294967295)),
            (val(-128i8), Value::Number(-128)),
            (val(NumberType::MAX), Value::Number(NumberType::MAX)),
            (val(NumberType::MIN), Value::Number(NumberType::MIN)),
            (sym("head"), Value::Symbol("head".to_owned())),
            (sym(String::from("+")), Value::Symbol("+".to_owned())),
            (sexpr(Vec::<Value>::new()), Value::sexpr()),
            (qexpr(Vec::<Value>::new()), Value::qexpr()),
            (
                sexpr([sym("+"), val(1), val(2)]),
                Value::SExpr(vec![
                    Value::Symbol("+".to_owned()),
                    Value::Number(1),
                    Value::Number(2),
                ]),
            ),
            (
                qexpr([1, 2, 3]),
                Value::QExpr(vec![Value::Number(1), Value::Number(2), Value::Number(3)]),
            ),
            (
                val(EvalError::DivisionByZero),
                Value::Error(EvalError::DivisionByZero),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_display() {
        let plus = find_builtin_op("+").map(Value::function);
        let cases = vec![
            (val(42), "42"),
            (val(-5), "-5"),
            (Value::from(EvalError::DivisionByZero), "Error: Division By Zero!"),
            (Value::error("custom"), "Error: custom"),
            (sym("foo"), "foo"),
            (Value::sexpr(), "()"),
            (Value::qexpr(), "{}"),
            (sexpr([1, 2, 3]), "(1 2 3)"),
            (qexpr([val(1), qexpr([2, 3]), sexpr([sym("x")])]), "{1 {2 3} (x)}"),
        ];

        for (value, expected) in cases {
            assert_eq!(value.to_string(), expected);
        }

        assert_eq!(plus.map(|f| f.to_string()).as_deref(), Some("<function>"));
    }

    #[test]
    fn test_add_pop_take() {
        let list = Value::qexpr().add(val(1)).add(val(2)).add(val(3));
        assert_eq!(list, qexpr([1, 2, 3]));

        // Adding to an atom leaves it alone
        assert_eq!(val(7).add(val(8)), val(7));

        let mut list = list;
        assert_eq!(list.pop(1), Some(val(2)));
        assert_eq!(list, qexpr([1, 3]));
        assert_eq!(list.pop(5), None);
        assert_eq!(list, qexpr([1, 3]));
        assert_eq!(list.pop(0), Some(val(1)));
        assert_eq!(list.pop(0), Some(val(3)));
        assert!(list.is_empty());
        assert_eq!(list.pop(0), None);

        assert_eq!(sexpr([4, 5, 6]).take(2), Some(val(6)));
        assert_eq!(sym("x").take(0), None);
        assert_eq!(val(1).pop(0), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = qexpr([val(1), qexpr([2, 3])]);
        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.pop(1);
        let copy = copy.add(sym("extra"));
        assert_eq!(original, qexpr([val(1), qexpr([2, 3])]));
        assert_ne!(copy, original);
    }

    #[test]
    fn test_accessors() {
        let list = sexpr([1, 2]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.cells(), Some(&[val(1), val(2)][..]));
        assert_eq!(val(3).len(), 0);
        assert!(val(3).is_empty());
        assert!(val(3).cells().is_none());
        assert!(Value::error("x").is_error());
        assert_eq!(qexpr([1]).kind_name(), "Q-Expression");
        assert_eq!(NumberType::try_from(val(9)), Ok(9));
        assert_eq!(NumberType::try_from(sym("x")), Err(EvalError::NonNumber));
    }
}
