//! The runtime value domain shared by the AST interpreter and the VM.
//!
//! # Ownership
//! `Value::String` owns a `String`. Values are cloned freely -- strings
//! are the only heap-backed variant, everything else is `Copy`-sized.
//! There is no garbage collector: strings are dropped the ordinary way
//! when their last `Value` goes out of scope.

use std::fmt;

use crate::error::{ArithmeticError, Error, TypeError};

/// A runtime value: integer, float, boolean, or string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl Value {
    /// The truthiness rule used by `if`, `while`, and `JUMP_IF_FALSE`:
    /// zero numbers, empty string, and `false` are falsy; everything
    /// else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(_) => None,
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, Error> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (a, b) if is_numeric(a) && is_numeric(b) => {
                Ok(Value::Float(a.as_f64().unwrap() + b.as_f64().unwrap()))
            }
            (a, b) => Err(binary_type_error("+", a, b)),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, Error> {
        numeric_binop(self, other, "-", |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, Error> {
        numeric_binop(self, other, "*", |a, b| a * b, |a, b| a * b)
    }

    pub fn div(&self, other: &Value) -> Result<Value, Error> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    return Err(ArithmeticError::DivideByZero.into());
                }
                Ok(Value::Int(floor_div(*a, *b)))
            }
            (a, b) if is_numeric(a) && is_numeric(b) => {
                let b = b.as_f64().unwrap();
                Ok(Value::Float(a.as_f64().unwrap() / b))
            }
            (a, b) => Err(binary_type_error("/", a, b)),
        }
    }

    pub fn unary_plus(&self) -> Result<Value, Error> {
        match self {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(n) => Ok(Value::Float(*n)),
            other => Err(TypeError::UnsupportedOperand {
                op: "unary +",
                operand: other.clone(),
            }
            .into()),
        }
    }

    pub fn unary_minus(&self) -> Result<Value, Error> {
        match self {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(TypeError::UnsupportedOperand {
                op: "unary -",
                operand: other.clone(),
            }
            .into()),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    /// `left && right`: eager, returns the deciding operand (not
    /// necessarily a `Bool`), matching host short-circuit semantics.
    pub fn and(self, right: Value) -> Value {
        if self.is_truthy() {
            right
        } else {
            self
        }
    }

    /// `left || right`: eager, returns the deciding operand.
    pub fn or(self, right: Value) -> Value {
        if self.is_truthy() {
            self
        } else {
            right
        }
    }

    pub fn equals(&self, other: &Value) -> Result<Value, Error> {
        Ok(Value::Bool(numeric_or_string_cmp(self, other)?.is_eq()))
    }

    pub fn not_equals(&self, other: &Value) -> Result<Value, Error> {
        Ok(Value::Bool(!numeric_or_string_cmp(self, other)?.is_eq()))
    }

    pub fn less_than(&self, other: &Value) -> Result<Value, Error> {
        Ok(Value::Bool(numeric_or_string_cmp(self, other)?.is_lt()))
    }

    pub fn greater_than(&self, other: &Value) -> Result<Value, Error> {
        Ok(Value::Bool(numeric_or_string_cmp(self, other)?.is_gt()))
    }

    pub fn less_equal(&self, other: &Value) -> Result<Value, Error> {
        Ok(Value::Bool(numeric_or_string_cmp(self, other)?.is_le()))
    }

    pub fn greater_equal(&self, other: &Value) -> Result<Value, Error> {
        Ok(Value::Bool(numeric_or_string_cmp(self, other)?.is_ge()))
    }

    /// Concatenates two string values. Both operands must already be
    /// strings -- callers (the VM's `CONCAT`, the interpolation
    /// evaluator) are responsible for running `TO_STRING` first.
    pub fn concat(&self, other: &Value) -> Result<Value, Error> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (a, b) => Err(TypeError::ConcatNonString {
                left: a.clone(),
                right: b.clone(),
            }
            .into()),
        }
    }

    /// The textual form used by both `print` and `TO_STRING` -- these
    /// two call sites MUST stay in sync.
    pub fn to_text(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(n) => format!("{n}"),
            Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Value::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Integer division that floors toward negative infinity rather than
/// truncating toward zero, per the language's `/` contract on two ints.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn is_numeric(v: &Value) -> bool {
    !matches!(v, Value::String(_))
}

fn numeric_binop(
    a: &Value,
    b: &Value,
    op: &'static str,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        (x, y) if is_numeric(x) && is_numeric(y) => {
            Ok(Value::Float(float_op(x.as_f64().unwrap(), y.as_f64().unwrap())))
        }
        (x, y) => Err(binary_type_error(op, x, y)),
    }
}

fn numeric_or_string_cmp(a: &Value, b: &Value) -> Result<std::cmp::Ordering, Error> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (x, y) if is_numeric(x) && is_numeric(y) => Ok(x
            .as_f64()
            .unwrap()
            .partial_cmp(&y.as_f64().unwrap())
            .unwrap_or(std::cmp::Ordering::Equal)),
        (x, y) => Err(binary_type_error("comparison", x, y)),
    }
}

fn binary_type_error(op: &'static str, a: &Value, b: &Value) -> Error {
    TypeError::UnsupportedOperand {
        op,
        operand: if is_numeric(a) { b.clone() } else { a.clone() },
    }
    .into()
}
