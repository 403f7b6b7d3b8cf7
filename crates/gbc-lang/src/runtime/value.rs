use std::fmt;

use crate::error::RuntimeError;
use crate::syntax::ast::truthy;

/// Result of evaluating a node. Numbers are the only primitive; a tuple is a
/// flat list of numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Tuple(Vec<f64>),
}

impl Value {
    pub const ZERO: Value = Value::Number(0.0);

    pub fn as_number(&self) -> Result<f64, RuntimeError> {
        match self {
            Self::Number(x) => Ok(*x),
            Self::Tuple(items) => Err(RuntimeError::not_a_number(items.len())),
        }
    }

    /// Integer key for the variable store and function table. Truncates
    /// toward zero.
    pub fn key(&self) -> Result<i64, RuntimeError> { self.as_number().map(|x| x as i64) }

    /// Numbers are truthy when nonzero, tuples when non-empty.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Number(x) => truthy(*x),
            Self::Tuple(items) => !items.is_empty(),
        }
    }

    /// The value itself when truthy, otherwise 0.
    pub fn or_zero(self) -> Value { if self.truthy() { self } else { Self::ZERO } }

    /// Contribution to a sum: the number, or the total of the tuple.
    /// Starts from `+0.0`; `Iterator::sum` on floats starts from `-0.0`.
    pub fn total(&self) -> f64 {
        match self {
            Self::Number(x) => *x,
            Self::Tuple(items) => items.iter().fold(0.0, |acc, x| acc + x),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Self::Number(x) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => write!(f, "{x}"),
            Self::Tuple(items) => {
                f.write_str("[")?;
                for (i, x) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn truthiness() {
        assert!(Value::Number(-2.0).truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::Tuple(vec![0.0]).truthy());
        assert!(!Value::Tuple(vec![]).truthy());
    }

    #[test]
    fn keys_truncate_toward_zero() {
        assert_eq!(Value::Number(2.9).key(), Ok(2));
        assert_eq!(Value::Number(-1.7).key(), Ok(-1));
        assert_eq!(Value::Tuple(vec![1.0]).key().unwrap_err().code, ErrorCode::R006);
    }

    #[test]
    fn empty_tuple_totals_positive_zero() {
        let total = Value::Tuple(vec![]).total();
        assert!(total == 0.0 && total.is_sign_positive(), "{total:?}");
        assert_eq!(Value::Tuple(vec![1.0, 2.5]).total(), 3.5);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Tuple(vec![1.0, 2.5]).to_string(), "[1, 2.5]");
    }
}
