use crate::EvalError;
use crate::ast::Value;
use crate::builtinops::{Dialect, builtin_ops};

/// Environment for symbol bindings
///
/// Bindings are kept in insertion order and looked up by linear scan; the global
/// environment holds a few dozen names at most.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    bindings: Vec<(String, Value)>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: Vec::new(),
        }
    }

    /// Look up a symbol, returning an independent copy of its value
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.bindings
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .ok_or(EvalError::UnboundSymbol)
    }

    /// Bind a copy of `value` to `name`, replacing any previous binding in place
    pub fn bind(&mut self, name: &str, value: &Value) {
        match self.bindings.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value.clone(),
            None => self.bindings.push((name.to_owned(), value.clone())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.iter().any(|(key, _)| key == name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over bindings in the order they were first made
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Get all bindings as (name, value) pairs sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut result = self.bindings.clone();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

/// Evaluate a value.
///
/// Numbers, functions and Q-expressions evaluate to themselves, symbols are
/// looked up, and S-expressions are reduced. An `Error` value, written directly
/// or bound to a symbol, is surfaced on the error channel.
pub fn eval(env: &mut Environment, value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Number(_) | Value::Function(_) | Value::QExpr(_) => Ok(value),
        Value::Error(e) => Err(e),
        Value::Symbol(name) => match env.lookup(&name)? {
            Value::Error(e) => Err(e),
            bound => Ok(bound),
        },
        Value::SExpr(cells) => eval_sexpr(env, cells),
    }
}

/// Evaluate a value, folding any failure back into a `Value::Error`
pub fn eval_value(env: &mut Environment, value: Value) -> Value {
    eval(env, value).unwrap_or_else(Value::Error)
}

/// Reduce the children of an S-expression.
///
/// Every child is evaluated, left to right, even after one of them fails; the
/// leftmost failure then becomes the result.
fn eval_sexpr(env: &mut Environment, cells: Vec<Value>) -> Result<Value, EvalError> {
    let evaluated: Vec<Result<Value, EvalError>> =
        cells.into_iter().map(|cell| eval(env, cell)).collect();
    let mut cells = evaluated.into_iter().collect::<Result<Vec<_>, _>>()?;

    match cells.len() {
        0 => return Ok(Value::SExpr(cells)),
        1 => return Ok(cells.remove(0)),
        _ => {}
    }

    let Value::Function(op) = cells.remove(0) else {
        return Err(EvalError::NotAFunction);
    };

    tracing::trace!(builtin = op.id, args = cells.len(), "applying builtin");
    op.call(env, cells)
}

/// Create a global environment with the builtins of the corrected dialect
pub fn create_global_env() -> Environment {
    create_global_env_with_dialect(Dialect::default())
}

/// Create a global environment with every builtin of `dialect` bound by name
pub fn create_global_env_with_dialect(dialect: Dialect) -> Environment {
    let mut env = Environment::new();

    for builtin_op in builtin_ops(dialect) {
        env.bind(builtin_op.id, &Value::function(builtin_op));
    }

    tracing::debug!(?dialect, bindings = env.len(), "populated global environment");
    env
}
