//! A small imperative toy-language toolchain.
//!
//! Source text becomes tokens ([`lexer`]), tokens become an AST
//! ([`parser`], [`ast`]), and the AST is executed either directly by a
//! tree-walking interpreter ([`interpreter`]) or after being lowered to
//! a flat instruction stream ([`compiler`]) and run on a stack machine
//! ([`vm`]). [`interpret`] and [`compile_and_run`] are the two entry
//! points a host embeds; everything else in this crate is the pipeline
//! behind them.
//!
//! The language has integers, floats, booleans, and strings (with
//! `${expr}` interpolation), arithmetic/comparison/logical operators,
//! `var`/assignment, `print`, `if`/`else`, and `while`. It does not
//! have functions, user-defined types, arrays/maps, modules, closures,
//! or file I/O -- see the module docs for the pieces that do exist.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod opcode;
pub mod parser;
pub mod token;
pub mod value;
pub mod vm;

pub use compiler::{Compiler, Program};
pub use error::Error;
pub use value::Value;
pub use vm::VirtualMachine;

/// Runs `source` through the tree-walking AST interpreter, printing
/// `print` output to standard output.
pub fn interpret(source: &str) -> error::Result<()> {
    interpreter::interpret(source)
}

/// Compiles `source` to bytecode and runs it on a fresh VM, printing
/// `print` output to standard output. Produces the same observable
/// output as [`interpret`] for any well-formed program.
pub fn compile_and_run(source: &str) -> error::Result<()> {
    vm::compile_and_run(source)
}
