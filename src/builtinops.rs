//! Built-in operations registry.
//!
//! Every builtin is an entry of a static registry, bound by name into the global
//! environment once, when the environment is created. Evaluating a symbol such as
//! `+` yields a `Function` value pointing at its registry entry; applying it never
//! compares operator names again.
//!
//! ```text
//! (+ 1 2 3)          ; arithmetic family, folds left to right
//! (list 1 2 3)       ; {1 2 3}
//! (head {1 2 3})     ; {1}
//! (tail {1 2 3})     ; {2 3}
//! (join {1} {2 3})   ; {1 2 3}
//! (eval {+ 1 2})     ; 3
//! (len {1 2 3})      ; 3
//! ```
//!
//! ## Error Handling
//!
//! Builtins take ownership of their already-evaluated arguments and return
//! `Result<Value, EvalError>`. Preconditions are checked in a fixed order
//! (arity, then argument types, then emptiness) so that each failure reports a
//! single, predictable message.
//!
//! ## Dialects
//!
//! The program this interpreter descends from bound `len` to the `join`
//! implementation and made `pow` add its result onto the accumulator. Both
//! behaviours are available through [`Dialect::Faithful`]; the default
//! [`Dialect::Corrected`] counts with `len` and composes `pow` as plain
//! exponentiation.

use crate::EvalError;
use crate::ast::{NumberType, Value};
use crate::evaluator::{Environment, eval};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

/// Selects between the historical and the corrected behaviour of `len` and `pow`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `len` counts the elements of a Q-expression, `pow` replaces the accumulator
    #[default]
    Corrected,
    /// `len` behaves as `join`, `pow` adds `acc ^ y` onto the accumulator
    Faithful,
}

/// Number of arguments a builtin accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an argument count, naming the builtin in the error
    pub fn validate(self, id: &'static str, got: usize) -> Result<(), EvalError> {
        match self {
            Arity::Exact(n) if got != n => Err(EvalError::TooManyArguments(id)),
            Arity::AtLeast(n) if got < n => Err(EvalError::NoArguments(id)),
            _ => Ok(()),
        }
    }
}

/// Binary operations of the arithmetic family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    /// `acc ^ y`
    Pow,
    /// `acc + acc ^ y`
    PowAccumulate,
    Min,
    Max,
}

impl ArithOp {
    /// Apply one fold step
    fn apply(self, acc: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
        match self {
            ArithOp::Add => acc
                .checked_add(y)
                .ok_or(EvalError::Overflow("addition")),
            ArithOp::Sub => acc
                .checked_sub(y)
                .ok_or(EvalError::Overflow("subtraction")),
            ArithOp::Mul => acc
                .checked_mul(y)
                .ok_or(EvalError::Overflow("multiplication")),
            ArithOp::Div => {
                if y == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                acc.checked_div(y).ok_or(EvalError::Overflow("division"))
            }
            ArithOp::Mod => {
                if y == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                acc.checked_rem(y).ok_or(EvalError::Overflow("modulo"))
            }
            ArithOp::And => Ok(acc & y),
            ArithOp::Or => Ok(acc | y),
            ArithOp::Pow => power(acc, y),
            ArithOp::PowAccumulate => acc
                .checked_add(power(acc, y)?)
                .ok_or(EvalError::Overflow("exponentiation")),
            ArithOp::Min => Ok(acc.min(y)),
            ArithOp::Max => Ok(acc.max(y)),
        }
    }
}

impl FromStr for ArithOp {
    type Err = EvalError;

    fn from_str(op: &str) -> Result<Self, EvalError> {
        match op {
            "+" | "add" => Ok(ArithOp::Add),
            "-" | "sub" => Ok(ArithOp::Sub),
            "*" | "mul" => Ok(ArithOp::Mul),
            "/" | "div" => Ok(ArithOp::Div),
            "%" | "mod" => Ok(ArithOp::Mod),
            "&" | "and" => Ok(ArithOp::And),
            "|" | "or" => Ok(ArithOp::Or),
            "^" | "pow" | "exp" => Ok(ArithOp::Pow),
            "<" | "min" => Ok(ArithOp::Min),
            ">" | "max" => Ok(ArithOp::Max),
            _ => Err(EvalError::UnknownSymbol),
        }
    }
}

/// Exponentiation by squaring with overflow detection
fn power(base: NumberType, exponent: NumberType) -> Result<NumberType, EvalError> {
    if exponent < 0 {
        return Err(EvalError::NegativeExponent);
    }

    let overflow = || EvalError::Overflow("exponentiation");
    let mut result: NumberType = 1;
    let mut base = base;
    let mut exponent = exponent;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.checked_mul(base).ok_or_else(overflow)?;
        }
        exponent >>= 1;
        if exponent > 0 {
            base = base.checked_mul(base).ok_or_else(overflow)?;
        }
    }
    Ok(result)
}

/// Represents the implementation of a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Arithmetic(ArithOp),
    List,
    Head,
    Tail,
    Eval,
    Join,
    Len,
}

/// Definition of a built-in operation
#[derive(Debug)]
pub struct BuiltinOp {
    /// The name this operation is bound to
    pub id: &'static str,
    pub kind: OpKind,
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for BuiltinOp {}

impl BuiltinOp {
    /// Apply this operation to owned, already-evaluated arguments
    pub fn call(&self, env: &mut Environment, args: Vec<Value>) -> Result<Value, EvalError> {
        self.arity.validate(self.id, args.len())?;
        match self.kind {
            OpKind::Arithmetic(op) => builtin_arithmetic(self.id, op, args),
            OpKind::List => Ok(builtin_list(args)),
            OpKind::Head => builtin_head(args),
            OpKind::Tail => builtin_tail(args),
            OpKind::Eval => builtin_eval(env, args),
            OpKind::Join => builtin_join(args),
            OpKind::Len => builtin_len(args),
        }
    }
}

//
// Builtin Function Implementations
//

/// Fold an arithmetic operation across number arguments, left to right.
///
/// Every argument is checked before any arithmetic happens. A single argument to
/// `-` is negated; the `sub` alias returns it unchanged.
fn builtin_arithmetic(
    id: &'static str,
    op: ArithOp,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    let numbers = args
        .into_iter()
        .map(NumberType::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut iter = numbers.into_iter();
    let Some(first) = iter.next() else {
        return Err(EvalError::NoArguments(id));
    };

    if id == "-" && iter.len() == 0 {
        return first
            .checked_neg()
            .map(Value::Number)
            .ok_or(EvalError::Overflow("negation"));
    }

    iter.try_fold(first, |acc, y| op.apply(acc, y))
        .map(Value::Number)
}

/// Apply an arithmetic operator given by name, for hosts that hold operator
/// names rather than function values.
///
/// Evaluation never comes through here: source text reaches builtins as
/// `Function` values bound in the environment. This is the only place an
/// operator outside the arithmetic family is reported, with `Unknown Symbol!`.
pub fn arithmetic(op: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    let arith = op.parse::<ArithOp>()?;
    let id = find_builtin_op(op).map_or("arithmetic", |builtin| builtin.id);
    builtin_arithmetic(id, arith, args)
}

fn builtin_list(args: Vec<Value>) -> Value {
    Value::QExpr(args)
}

/// Unpack the single non-empty Q-expression argument of `head` and `tail`
fn single_nonempty_qexpr(id: &'static str, args: Vec<Value>) -> Result<Vec<Value>, EvalError> {
    match args.into_iter().next() {
        Some(Value::QExpr(cells)) if cells.is_empty() => Err(EvalError::EmptyList(id)),
        Some(Value::QExpr(cells)) => Ok(cells),
        _ => Err(EvalError::IncorrectType(id)),
    }
}

fn builtin_head(args: Vec<Value>) -> Result<Value, EvalError> {
    let mut cells = single_nonempty_qexpr("head", args)?;
    cells.truncate(1);
    Ok(Value::QExpr(cells))
}

fn builtin_tail(args: Vec<Value>) -> Result<Value, EvalError> {
    let mut cells = single_nonempty_qexpr("tail", args)?;
    cells.remove(0);
    Ok(Value::QExpr(cells))
}

fn builtin_eval(env: &mut Environment, args: Vec<Value>) -> Result<Value, EvalError> {
    match args.into_iter().next() {
        Some(Value::QExpr(cells)) => eval(env, Value::SExpr(cells)),
        _ => Err(EvalError::IncorrectType("eval")),
    }
}

fn builtin_join(args: Vec<Value>) -> Result<Value, EvalError> {
    if !args.iter().all(|arg| matches!(arg, Value::QExpr(_))) {
        return Err(EvalError::JoinIncorrectType);
    }

    let mut joined = Vec::new();
    for arg in args {
        if let Value::QExpr(cells) = arg {
            joined.extend(cells);
        }
    }
    Ok(Value::QExpr(joined))
}

fn builtin_len(args: Vec<Value>) -> Result<Value, EvalError> {
    match args.into_iter().next() {
        Some(Value::QExpr(cells)) => NumberType::try_from(cells.len())
            .map(Value::Number)
            .map_err(|_| EvalError::Overflow("len")),
        _ => Err(EvalError::IncorrectType("len")),
    }
}

macro_rules! arithmetic_ops {
    ($($id:literal => $op:ident),* $(,)?) => {
        [$(BuiltinOp {
            id: $id,
            kind: OpKind::Arithmetic(ArithOp::$op),
            arity: Arity::AtLeast(1),
        }),*]
    };
}

/// Global registry of all built-in operations, in the order they are bound.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    let mut ops = Vec::from(arithmetic_ops![
        "+" => Add, "add" => Add,
        "-" => Sub, "sub" => Sub,
        "*" => Mul, "mul" => Mul,
        "/" => Div, "div" => Div,
        "%" => Mod, "mod" => Mod,
        "&" => And, "and" => And,
        "|" => Or, "or" => Or,
        "^" => Pow, "pow" => Pow, "exp" => Pow,
        "<" => Min, "min" => Min,
        ">" => Max, "max" => Max,
    ]);

    ops.extend([
        BuiltinOp {
            id: "list",
            kind: OpKind::List,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "head",
            kind: OpKind::Head,
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "tail",
            kind: OpKind::Tail,
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "eval",
            kind: OpKind::Eval,
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "join",
            kind: OpKind::Join,
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "len",
            kind: OpKind::Len,
            arity: Arity::Exact(1),
        },
    ]);
    ops
});

/// Entries that replace same-named operations under [`Dialect::Faithful`]
static FAITHFUL_OVERRIDES: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    let mut ops = Vec::from(arithmetic_ops![
        "^" => PowAccumulate, "pow" => PowAccumulate, "exp" => PowAccumulate,
    ]);
    ops.push(BuiltinOp {
        id: "len",
        kind: OpKind::Join,
        arity: Arity::Any,
    });
    ops
});

/// Lazy static map from id to BuiltinOp (private - use find_builtin_op)
static BUILTIN_BY_ID: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.id, op)).collect()
});

/// Get all builtin operations for a dialect, in binding order
pub fn builtin_ops(dialect: Dialect) -> Vec<&'static BuiltinOp> {
    let overrides: &'static [BuiltinOp] = match dialect {
        Dialect::Corrected => &[],
        Dialect::Faithful => FAITHFUL_OVERRIDES.as_slice(),
    };

    BUILTIN_OPS
        .iter()
        .map(|op| {
            overrides
                .iter()
                .find(|replacement| replacement.id == op.id)
                .unwrap_or(op)
        })
        .collect()
}

/// Find a builtin operation of the corrected dialect by name
pub fn find_builtin_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_BY_ID.get(id).copied()
}
