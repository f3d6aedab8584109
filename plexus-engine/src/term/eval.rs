//! Arithmetic reduction for the `is/2` built-in and arithmetic comparators (spec.md §4.4).
//!
//! `eval` never panics and never touches the `Factory`'s interning cache (arithmetic results are
//! always atomic, never compound, so there is nothing to intern): it is pure term-to-term
//! reduction. Failure (division by zero, an unbound variable, a non-arithmetic functor) is the
//! `ArithmeticUndefined` local-failure kind from spec.md §7 — it is returned as an `Err` here only
//! because this module's callers (the `is/2`, comparator, and `abs/min/max` built-ins in
//! `resolver::builtins`) need to distinguish failure from a result, but the moment it reaches the
//! resolver it collapses into an ordinary failed-goal backtrack, never an `EngineError`.

use ordered_float::OrderedFloat;

use super::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
  UnboundVariable,
  NotArithmetic,
  DivisionByZero,
}

/// Numeric value used for mixed int/float arithmetic: an operation involving any `Float` operand
/// produces a `Float` result, matching ordinary numeric-tower promotion.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
  Int(i64),
  Float(f64),
}

impl Number {
  fn as_f64(self) -> f64 {
    match self {
      Number::Int(i) => i as f64,
      Number::Float(f) => f,
    }
  }

  fn into_term(self) -> Term {
    match self {
      Number::Int(i) => Term::Int(i),
      Number::Float(f) => Term::Float(OrderedFloat(f)),
    }
  }
}

fn as_number(term: &Term) -> Result<Number, EvalError> {
  match term {
    Term::Int(i) => Ok(Number::Int(*i)),
    Term::Float(f) => Ok(Number::Float(f.0)),
    Term::Variable(_) => Err(EvalError::UnboundVariable),
    _ => Err(EvalError::NotArithmetic),
  }
}

/// The numeric value of an already-evaluated `Int`/`Float` term, promoted to `f64`. Used by the
/// `<, >, =<, >=` comparators (spec.md §4.4: "evaluate both sides, compare numerically"), which
/// must not fall back to the *standard order of terms* (`term::order`) — that order ranks every
/// `Float` below every `Int` regardless of value, which is the wrong relation for arithmetic
/// comparison.
pub fn numeric_value(term: &Term) -> Result<f64, EvalError> {
  as_number(term).map(Number::as_f64)
}

fn promote(a: Number, b: Number) -> (Number, Number, bool) {
  let is_float = matches!(a, Number::Float(_)) || matches!(b, Number::Float(_));
  (a, b, is_float)
}

/// Reduces an arithmetic expression term to a ground numeric value. `expr` must already be fully
/// substituted (no remaining bound variables to resolve) by the caller.
pub fn eval(expr: &Term) -> Result<Term, EvalError> {
  match expr {
    Term::Int(_) | Term::Float(_) => Ok(expr.clone()),
    Term::Variable(_) => Err(EvalError::UnboundVariable),
    Term::Atom(_) => Err(EvalError::NotArithmetic),
    Term::Compound(c) => {
      let functor: &str = &c.functor;
      match (functor, c.args.len()) {
        ("+", 2) => binary(c.args.get(0).unwrap(), c.args.get(1).unwrap(), |a, b| Ok(a + b), |a, b| Ok(a + b)),
        ("-", 2) => binary(c.args.get(0).unwrap(), c.args.get(1).unwrap(), |a, b| Ok(a - b), |a, b| Ok(a - b)),
        ("*", 2) => binary(c.args.get(0).unwrap(), c.args.get(1).unwrap(), |a, b| Ok(a * b), |a, b| Ok(a * b)),
        // spec.md §4.1: "Int⊗Int → Int" — `Int/Int` truncates towards zero, same as Rust's `/` on
        // integers, rather than promoting to `Float` when the division isn't exact.
        ("/", 2) => {
          let a = as_number(&eval(&c.args[0])?)?;
          let b = as_number(&eval(&c.args[1])?)?;
          match (a, b) {
            (Number::Int(x), Number::Int(y)) => {
              if y == 0 {
                Err(EvalError::DivisionByZero)
              } else {
                Ok(Term::Int(x / y))
              }
            }
            _ => {
              let divisor = b.as_f64();
              if divisor == 0.0 {
                Err(EvalError::DivisionByZero)
              } else {
                Ok(Term::Float(OrderedFloat(a.as_f64() / divisor)))
              }
            }
          }
        }
        ("-", 1) => {
          let inner = eval(&c.args[0])?;
          match as_number(&inner)? {
            Number::Int(i) => Ok(Term::Int(-i)),
            Number::Float(f) => Ok(Term::Float(OrderedFloat(-f))),
          }
        }
        ("abs", 1) => {
          let inner = eval(&c.args[0])?;
          match as_number(&inner)? {
            Number::Int(i) => Ok(Term::Int(i.abs())),
            Number::Float(f) => Ok(Term::Float(OrderedFloat(f.abs()))),
          }
        }
        ("min", 2) => binary(c.args.get(0).unwrap(), c.args.get(1).unwrap(), |a, b| Ok(a.min(b)), |a, b| Ok(a.min(b))),
        ("max", 2) => binary(c.args.get(0).unwrap(), c.args.get(1).unwrap(), |a, b| Ok(a.max(b)), |a, b| Ok(a.max(b))),
        ("float", 1) => {
          let inner = eval(&c.args[0])?;
          Ok(Term::Float(OrderedFloat(as_number(&inner)?.as_f64())))
        }
        ("integer", 1) => {
          let inner = eval(&c.args[0])?;
          match as_number(&inner)? {
            Number::Int(i) => Ok(Term::Int(i)),
            Number::Float(f) => Ok(Term::Int(f as i64)),
          }
        }
        _ => Err(EvalError::NotArithmetic),
      }
    }
  }
}

fn binary(
  lhs: &Term,
  rhs: &Term,
  int_op: impl Fn(i64, i64) -> Result<i64, EvalError>,
  float_op: impl Fn(f64, f64) -> Result<f64, EvalError>,
) -> Result<Term, EvalError> {
  let a = as_number(&eval(lhs)?)?;
  let b = as_number(&eval(rhs)?)?;
  let (a, b, is_float) = promote(a, b);
  if is_float {
    Ok(Term::Float(OrderedFloat(float_op(a.as_f64(), b.as_f64())?)))
  } else {
    match (a, b) {
      (Number::Int(x), Number::Int(y)) => Ok(Term::Int(int_op(x, y)?)),
      _ => unreachable!("is_float already routed mixed operands"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::term::{Factory, FactoryConfig};

  #[test]
  fn integer_addition() {
    let factory = Factory::new(FactoryConfig::default());
    let expr = factory.create_compound("+", vec![factory.create_int(2), factory.create_int(3)]);
    assert_eq!(eval(&expr), Ok(Term::Int(5)));
  }

  #[test]
  fn mixed_float_promotion() {
    let factory = Factory::new(FactoryConfig::default());
    let expr = factory.create_compound("*", vec![factory.create_int(2), factory.create_float(1.5)]);
    assert_eq!(eval(&expr), Ok(Term::Float(OrderedFloat(3.0))));
  }

  #[test]
  fn division_by_zero_is_undefined() {
    let factory = Factory::new(FactoryConfig::default());
    let expr = factory.create_compound("/", vec![factory.create_int(1), factory.create_int(0)]);
    assert_eq!(eval(&expr), Err(EvalError::DivisionByZero));
  }

  #[test]
  fn unbound_variable_is_undefined() {
    let factory = Factory::new(FactoryConfig::default());
    let expr = factory.create_compound("+", vec![factory.create_variable("X"), factory.create_int(1)]);
    assert_eq!(eval(&expr), Err(EvalError::UnboundVariable));
  }
}
