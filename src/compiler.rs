//! Lowers the AST into a flat [`Instruction`] stream, a deduplicated
//! constants pool, and a variable-name-to-slot table.
//!
//! # Jump patching
//! Forward jumps (`if`/`while`) are emitted with a sentinel `u32::MAX`
//! operand and a position is recorded; once the real target index is
//! known the operand is rewritten in place. `while`'s backward jump to
//! its own condition needs no patching -- the target is already known
//! when it's emitted.

use std::collections::HashMap;

use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::error::Error;
use crate::opcode::Instruction;
use crate::value::Value;

/// A sentinel jump target rewritten by [`Compiler::patch_jump`] once
/// the real destination is known.
const PLACEHOLDER: u32 = u32::MAX;

/// The output of compilation: everything the VM needs to run, treated
/// as immutable from that point on.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub constants: Vec<Value>,
    pub instructions: Vec<Instruction>,
    pub variable_table: HashMap<String, u32>,
}

#[derive(Default)]
pub struct Compiler {
    constants: Vec<Value>,
    instructions: Vec<Instruction>,
    variables: HashMap<String, u32>,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler::default()
    }

    /// Compiles a whole program (as produced by [`crate::parser::Parser`])
    /// into a [`Program`], ending with an implicit `HALT`.
    pub fn compile(source: &str) -> Result<Program, Error> {
        let ast = crate::parser::Parser::new(source)?.parse_program()?;
        let mut compiler = Compiler::new();
        compiler.compile_stmt(&ast)?;
        compiler.emit(Instruction::Halt);
        Ok(Program {
            constants: compiler.constants,
            instructions: compiler.instructions,
            variable_table: compiler.variables,
        })
    }

    /// Appends `value` to the constants pool, reusing an existing slot
    /// if an equal value was already added (`add_constant` is
    /// idempotent by value-equality).
    fn add_constant(&mut self, value: Value) -> u32 {
        if let Some(idx) = self.constants.iter().position(|existing| existing == &value) {
            return idx as u32;
        }
        self.constants.push(value);
        (self.constants.len() - 1) as u32
    }

    /// Returns the slot for `name`, allocating the next dense index
    /// (in first-seen order) if this is a new variable.
    fn variable_slot(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.variables.get(name) {
            return slot;
        }
        let slot = self.variables.len() as u32;
        self.variables.insert(name.to_string(), slot);
        slot
    }

    fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    fn here(&self) -> u32 {
        self.instructions.len() as u32
    }

    /// Rewrites the jump operand at `pos` to `target`, preserving the
    /// opcode (`JUMP` vs `JUMP_IF_FALSE`).
    fn patch_jump(&mut self, pos: usize, target: u32) {
        self.instructions[pos] = match self.instructions[pos] {
            Instruction::Jump(_) => Instruction::Jump(target),
            Instruction::JumpIfFalse(_) => Instruction::JumpIfFalse(target),
            other => unreachable!("patched a non-jump instruction: {other:?}"),
        };
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::NoOp => Ok(()),
            Stmt::Compound(statements) => {
                for s in statements {
                    self.compile_stmt(s)?;
                }
                Ok(())
            }
            Stmt::VarDecl(name, initializer) => {
                self.compile_expr(initializer)?;
                let slot = self.variable_slot(name);
                self.emit(Instruction::StoreVar(slot));
                Ok(())
            }
            Stmt::Assign(name, value) => {
                self.compile_expr(value)?;
                let slot = self.variable_slot(name);
                self.emit(Instruction::StoreVar(slot));
                Ok(())
            }
            Stmt::Print(expr) => {
                self.compile_expr(expr)?;
                self.emit(Instruction::Print);
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let start = self.here();
                self.compile_expr(condition)?;
                let jump_if_false = self.emit(Instruction::JumpIfFalse(PLACEHOLDER));
                self.compile_stmt(then_branch)?;

                if let Some(else_branch) = else_branch {
                    let jump_over_else = self.emit(Instruction::Jump(PLACEHOLDER));
                    self.patch_jump(jump_if_false, self.here());
                    self.compile_stmt(else_branch)?;
                    self.patch_jump(jump_over_else, self.here());
                } else {
                    self.patch_jump(jump_if_false, self.here());
                }

                tracing::debug!(from = start, to = self.here(), "compiled if statement");
                Ok(())
            }
            Stmt::While { condition, body } => {
                let loop_start = self.here();
                self.compile_expr(condition)?;
                let jump_if_false = self.emit(Instruction::JumpIfFalse(PLACEHOLDER));
                self.compile_stmt(body)?;
                self.emit(Instruction::Jump(loop_start));
                self.patch_jump(jump_if_false, self.here());
                tracing::debug!(from = loop_start, to = self.here(), "compiled while statement");
                Ok(())
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), Error> {
        match expr {
            Expr::Number(n) => {
                let idx = self.add_constant(Value::Int(*n));
                self.emit(Instruction::LoadConst(idx));
            }
            Expr::Float(n) => {
                let idx = self.add_constant(Value::Float(*n));
                self.emit(Instruction::LoadConst(idx));
            }
            Expr::Boolean(b) => {
                let idx = self.add_constant(Value::Bool(*b));
                self.emit(Instruction::LoadConst(idx));
            }
            Expr::String(s) => {
                let idx = self.add_constant(Value::String(s.clone()));
                self.emit(Instruction::LoadConst(idx));
            }
            Expr::Variable(name) => {
                let slot = self.variable_slot(name);
                self.emit(Instruction::LoadVar(slot));
            }
            Expr::UnaryOp(op, operand) => {
                self.compile_expr(operand)?;
                self.emit(match op {
                    UnaryOp::Plus => Instruction::UnaryPlus,
                    UnaryOp::Minus => Instruction::UnaryMinus,
                    UnaryOp::Not => Instruction::Not,
                });
            }
            Expr::BinOp(op, left, right) => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(binop_instruction(*op));
            }
            Expr::StringInterpolation(parts) => self.compile_interpolation(parts)?,
        }
        Ok(())
    }

    /// `TO_STRING` is only emitted for parts that are not *statically*
    /// known to already be strings (literal or nested interpolation);
    /// `CONCAT` glues each part onto the running result after the first.
    fn compile_interpolation(&mut self, parts: &[Expr]) -> Result<(), Error> {
        if parts.is_empty() {
            let idx = self.add_constant(Value::String(String::new()));
            self.emit(Instruction::LoadConst(idx));
            return Ok(());
        }

        for (i, part) in parts.iter().enumerate() {
            self.compile_expr(part)?;
            if !matches!(part, Expr::String(_) | Expr::StringInterpolation(_)) {
                self.emit(Instruction::ToString);
            }
            if i > 0 {
                self.emit(Instruction::Concat);
            }
        }
        Ok(())
    }
}

fn binop_instruction(op: BinaryOp) -> Instruction {
    match op {
        BinaryOp::Add => Instruction::Add,
        BinaryOp::Subtract => Instruction::Subtract,
        BinaryOp::Multiply => Instruction::Multiply,
        BinaryOp::Divide => Instruction::Divide,
        BinaryOp::Equals => Instruction::Equals,
        BinaryOp::NotEquals => Instruction::NotEquals,
        BinaryOp::Less => Instruction::LessThan,
        BinaryOp::Greater => Instruction::GreaterThan,
        BinaryOp::LessEqual => Instruction::LessEqual,
        BinaryOp::GreaterEqual => Instruction::GreaterEqual,
        BinaryOp::And => Instruction::And,
        BinaryOp::Or => Instruction::Or,
    }
}
