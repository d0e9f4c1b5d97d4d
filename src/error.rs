//! Crate-wide error type.
//!
//! One enum covers every stage of the pipeline (lexer, parser, AST
//! interpreter, compiler, VM). There is no source-location tracking --
//! diagnostics carry only what the stage that raised them already had
//! on hand, never a resolved line/column.

use thiserror::Error;

use crate::value::Value;

/// Anything that can go wrong while lexing, parsing, compiling, or
/// running a program.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("name error: {0}")]
    Name(#[from] NameError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("vm error: {0}")]
    Vm(#[from] VmError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated interpolation expression")]
    UnterminatedInterpolation,
    #[error("expected '&&', got a single '&'")]
    LoneAmpersand,
    #[error("expected '||', got a single '|'")]
    LonePipe,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, got {got}")]
    UnexpectedToken { expected: String, got: String },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NameError {
    #[error("variable '{0}' referenced before declaration")]
    Undeclared(String),
    #[error("variable slot {0} read before initialization")]
    Uninitialized(u32),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("unsupported operand type(s) for '{op}': {operand}")]
    UnsupportedOperand { op: &'static str, operand: Value },
    #[error("concat requires two strings, got {left} and {right}")]
    ConcatNonString { left: Value, right: Value },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivideByZero,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("jump target {target} out of range (program has {len} instructions)")]
    JumpOutOfRange { target: u32, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
