//! Stack-based virtual machine: fetch-decode-execute over a
//! [`Program`]'s instruction stream.
//!
//! # Ownership
//! The VM owns its operand stack and variable array; `constants` and
//! `instructions` are borrowed from the `Program` for the run's
//! lifetime -- the VM never mutates them, matching the invariant that
//! a compiled program is runnable multiple times without disturbing
//! the AST or the bytecode that produced it.

use crate::compiler::Program;
use crate::error::{Error, NameError, VmError};
use crate::opcode::Instruction;
use crate::value::Value;

pub struct VirtualMachine<'p> {
    program: &'p Program,
    stack: Vec<Value>,
    /// One slot per distinct variable; `None` until first `STORE_VAR`.
    variables: Vec<Option<Value>>,
    pc: usize,
}

impl<'p> VirtualMachine<'p> {
    pub fn new(program: &'p Program) -> Self {
        let slot_count = program.variable_table.len();
        VirtualMachine {
            program,
            stack: Vec::new(),
            variables: vec![None; slot_count],
            pc: 0,
        }
    }

    /// Runs until `HALT` or until `pc` walks past the last instruction,
    /// writing `PRINT` output to `out`.
    pub fn run_to<W: std::io::Write>(&mut self, out: &mut W) -> Result<(), Error> {
        tracing::info!("starting VM run");
        while self.pc < self.program.instructions.len() {
            let instruction = self.program.instructions[self.pc];
            tracing::trace!(pc = self.pc, op = instruction.tag(), depth = self.stack.len(), "step");
            if self.step(instruction, out)? {
                break;
            }
        }
        Ok(())
    }

    /// Executes one instruction. Returns `Ok(true)` on `HALT`.
    fn step<W: std::io::Write>(
        &mut self,
        instruction: Instruction,
        out: &mut W,
    ) -> Result<bool, Error> {
        let mut advance = true;

        match instruction {
            Instruction::LoadConst(idx) => {
                self.push(self.program.constants[idx as usize].clone());
            }
            Instruction::LoadVar(slot) => {
                let value = self
                    .variables
                    .get(slot as usize)
                    .and_then(|v| v.clone())
                    .ok_or(NameError::Uninitialized(slot))?;
                self.push(value);
            }
            Instruction::StoreVar(slot) => {
                let value = self.pop()?;
                self.variables[slot as usize] = Some(value);
            }
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::Add => self.binary(Value::add)?,
            Instruction::Subtract => self.binary(Value::sub)?,
            Instruction::Multiply => self.binary(Value::mul)?,
            Instruction::Divide => self.binary(Value::div)?,
            Instruction::Equals => self.binary(Value::equals)?,
            Instruction::NotEquals => self.binary(Value::not_equals)?,
            Instruction::LessThan => self.binary(Value::less_than)?,
            Instruction::GreaterThan => self.binary(Value::greater_than)?,
            Instruction::LessEqual => self.binary(Value::less_equal)?,
            Instruction::GreaterEqual => self.binary(Value::greater_equal)?,
            Instruction::Concat => self.binary(Value::concat)?,
            Instruction::And => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.push(left.and(right));
            }
            Instruction::Or => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.push(left.or(right));
            }
            Instruction::UnaryPlus => {
                let value = self.pop()?;
                self.push(value.unary_plus()?);
            }
            Instruction::UnaryMinus => {
                let value = self.pop()?;
                self.push(value.unary_minus()?);
            }
            Instruction::Not => {
                let value = self.pop()?;
                self.push(value.not());
            }
            Instruction::ToString => {
                let value = self.pop()?;
                self.push(Value::String(value.to_text()));
            }
            Instruction::Jump(target) => {
                self.pc = self.resolve_jump(target)?;
                advance = false;
            }
            Instruction::JumpIfFalse(target) => {
                let value = self.pop()?;
                if !value.is_truthy() {
                    self.pc = self.resolve_jump(target)?;
                    advance = false;
                }
            }
            Instruction::Print => {
                let value = self.pop()?;
                writeln!(out, "{}", value.to_text())?;
            }
            Instruction::Halt => return Ok(true),
        }

        if advance {
            self.pc += 1;
        }
        Ok(false)
    }

    fn resolve_jump(&self, target: u32) -> Result<usize, Error> {
        if target as usize > self.program.instructions.len() {
            return Err(VmError::JumpOutOfRange {
                target,
                len: self.program.instructions.len(),
            }
            .into());
        }
        Ok(target as usize)
    }

    fn binary(&mut self, op: impl FnOnce(&Value, &Value) -> Result<Value, Error>) -> Result<(), Error> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(op(&left, &right)?);
        Ok(())
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, Error> {
        self.stack.pop().ok_or_else(|| VmError::StackUnderflow.into())
    }
}

/// Compiles `source` and runs it on a fresh VM, writing `print` output
/// to `out`.
pub fn compile_and_run_to<W: std::io::Write>(source: &str, out: &mut W) -> Result<(), Error> {
    let program = crate::compiler::Compiler::compile(source)?;
    let mut vm = VirtualMachine::new(&program);
    vm.run_to(out)
}

/// Compiles `source` and runs it on a fresh VM, writing `print` output
/// to standard output.
pub fn compile_and_run(source: &str) -> Result<(), Error> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    compile_and_run_to(source, &mut handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        let mut buf = Vec::new();
        compile_and_run_to(source, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("var x = 2 + 3 * 4; print x;"), "14\n");
    }

    #[test]
    fn while_loop_factorial() {
        let out = run("var n = 5; var f = 1; while (n > 1) { f = f * n; n = n - 1; } print f;");
        assert_eq!(out, "120\n");
    }

    #[test]
    fn string_interpolation() {
        assert_eq!(
            run(r#"var name = "World"; print "Hello, ${name}!";"#),
            "Hello, World!\n"
        );
    }

    #[test]
    fn if_else_inside_while() {
        let out = run(
            r#"var i = 1; while (i <= 5) { if (i == 3) { print "three"; } else { print i; } i = i + 1; }"#,
        );
        assert_eq!(out, "1\n2\nthree\n4\n5\n");
    }

    #[test]
    fn string_concat_in_loop() {
        let out = run(r#"var s = "x"; var i = 0; while (i < 3) { s = s + "y"; i = i + 1; } print s;"#);
        assert_eq!(out, "xyyy\n");
    }

    #[test]
    fn uninitialized_slot_read_is_name_error() {
        // Unlike the AST interpreter, the compiler does not enforce
        // declare-before-use -- `print x;` compiles fine, allocating a
        // slot for `x`, and only fails at run time when that slot turns
        // out to have never been written.
        assert!(matches!(
            compile_and_run_to("print x;", &mut Vec::new()),
            Err(Error::Name(NameError::Uninitialized(_)))
        ));
    }

    #[test]
    fn divide_by_zero_is_arithmetic_error() {
        assert!(compile_and_run_to("var x = 1 / 0;", &mut Vec::new()).is_err());
    }

    #[test]
    fn stack_underflow_on_malformed_program() {
        use crate::compiler::Program;
        let program = Program {
            constants: vec![],
            instructions: vec![Instruction::Add, Instruction::Halt],
            variable_table: Default::default(),
        };
        let mut vm = VirtualMachine::new(&program);
        assert!(matches!(
            vm.run_to(&mut Vec::new()),
            Err(Error::Vm(VmError::StackUnderflow))
        ));
    }

    #[test]
    fn jump_out_of_range_is_vm_error() {
        use crate::compiler::Program;
        let program = Program {
            constants: vec![],
            instructions: vec![Instruction::Jump(99)],
            variable_table: Default::default(),
        };
        let mut vm = VirtualMachine::new(&program);
        assert!(matches!(
            vm.run_to(&mut Vec::new()),
            Err(Error::Vm(VmError::JumpOutOfRange { .. }))
        ));
    }
}
