//! Operator semantics and coercion rules
//!
//! Both operands of every binary operator are already evaluated when these
//! functions run; `&&` and `||` only choose which operand becomes the result.

use std::cmp::Ordering;

use super::errors::{ExecutionError, FaultCode};
use super::types::Value;
use crate::parser::ast::{BinaryOperator, UnaryOperator};

pub fn apply_binary(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<Value, ExecutionError> {
    let value = match operator {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOperator::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOperator::Div => {
            let divisor = right.to_number();
            if divisor == 0.0 {
                return Err(ExecutionError::new(
                    FaultCode::DivByZero,
                    format!("Division of {} by zero", left),
                ));
            }
            Value::Number(left.to_number() / divisor)
        }
        BinaryOperator::Rem => {
            let divisor = right.to_number();
            if divisor == 0.0 {
                return Err(ExecutionError::new(
                    FaultCode::ModByZero,
                    format!("Remainder of {} by zero", left),
                ));
            }
            Value::Number(left.to_number() % divisor)
        }
        BinaryOperator::Lt => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinaryOperator::Gt => Value::Boolean(compare(left, right) == Some(Ordering::Greater)),
        BinaryOperator::LtEq => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GtEq => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOperator::Eq => Value::Boolean(loose_equals(left, right)),
        BinaryOperator::NotEq => Value::Boolean(!loose_equals(left, right)),
        BinaryOperator::StrictEq => Value::Boolean(strict_equals(left, right)),
        BinaryOperator::StrictNotEq => Value::Boolean(!strict_equals(left, right)),
        BinaryOperator::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOperator::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
    };
    Ok(value)
}

pub fn apply_unary(operator: UnaryOperator, argument: &Value) -> Value {
    match operator {
        UnaryOperator::Not => Value::Boolean(!argument.is_truthy()),
        UnaryOperator::Minus => Value::Number(-argument.to_number()),
        UnaryOperator::Plus => Value::Number(argument.to_number()),
    }
}

/// String concatenation if either side is a string, numeric addition otherwise
fn add(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            Value::String(format!("{}{}", left, right))
        }
        _ => Value::Number(left.to_number() + right.to_number()),
    }
}

/// Two strings compare lexicographically, anything else numerically.
/// `None` when a NaN is involved.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// Same kind and same value. `NaN` is not equal to itself.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

/// Equality with coercion toward numbers.
///
/// `null` equals only `null`; booleans become numbers first; a number and a
/// string compare numerically.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Boolean(_), _) => loose_equals(&Value::Number(left.to_number()), right),
        (_, Value::Boolean(_)) => loose_equals(left, &Value::Number(right.to_number())),
        (Value::Number(a), Value::String(_)) => *a == right.to_number(),
        (Value::String(_), Value::Number(b)) => left.to_number() == *b,
        _ => strict_equals(left, right),
    }
}
