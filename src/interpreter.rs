//! Tree-walking interpreter: evaluates an [`Expr`]/[`Stmt`] AST
//! directly against a single flat global environment.
//!
//! # Ownership
//! `Environment` owns a `HashMap<String, Value>`. There is no nested
//! scoping -- `var` and plain assignment both write into the same map,
//! the interpreter's job is only to enforce declare-before-assign,
//! something the bytecode compiler deliberately does not do (see
//! `compiler.rs`).

use std::collections::HashMap;

use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::error::{Error, NameError};
use crate::value::Value;

#[derive(Default)]
struct Environment {
    variables: HashMap<String, Value>,
}

impl Environment {
    fn declare(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), Error> {
        if !self.variables.contains_key(name) {
            return Err(NameError::Undeclared(name.to_string()).into());
        }
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Value, Error> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| NameError::Undeclared(name.to_string()).into())
    }
}

/// Parses and runs `source` through the tree-walking interpreter,
/// writing `print` output to `out`.
pub fn interpret_to<W: std::io::Write>(source: &str, out: &mut W) -> Result<(), Error> {
    let ast = crate::parser::Parser::new(source)?.parse_program()?;
    let mut env = Environment::default();
    tracing::info!("starting AST interpreter run");
    exec_stmt(&ast, &mut env, out)
}

/// Parses and runs `source` through the tree-walking interpreter,
/// writing `print` output to standard output.
pub fn interpret(source: &str) -> Result<(), Error> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    interpret_to(source, &mut handle)
}

fn exec_stmt<W: std::io::Write>(
    stmt: &Stmt,
    env: &mut Environment,
    out: &mut W,
) -> Result<(), Error> {
    match stmt {
        Stmt::NoOp => Ok(()),
        Stmt::Compound(statements) => {
            for s in statements {
                exec_stmt(s, env, out)?;
            }
            Ok(())
        }
        Stmt::VarDecl(name, initializer) => {
            let value = eval_expr(initializer, env)?;
            env.declare(name, value);
            Ok(())
        }
        Stmt::Assign(name, value_expr) => {
            let value = eval_expr(value_expr, env)?;
            env.assign(name, value)
        }
        Stmt::Print(expr) => {
            let value = eval_expr(expr, env)?;
            writeln!(out, "{}", value.to_text())?;
            Ok(())
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if eval_expr(condition, env)?.is_truthy() {
                exec_stmt(then_branch, env, out)
            } else if let Some(else_branch) = else_branch {
                exec_stmt(else_branch, env, out)
            } else {
                Ok(())
            }
        }
        Stmt::While { condition, body } => {
            while eval_expr(condition, env)?.is_truthy() {
                exec_stmt(body, env, out)?;
            }
            Ok(())
        }
    }
}

fn eval_expr(expr: &Expr, env: &Environment) -> Result<Value, Error> {
    match expr {
        Expr::Number(n) => Ok(Value::Int(*n)),
        Expr::Float(n) => Ok(Value::Float(*n)),
        Expr::Boolean(b) => Ok(Value::Bool(*b)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Variable(name) => env.get(name),
        Expr::StringInterpolation(parts) => {
            let mut result = String::new();
            for part in parts {
                result.push_str(&eval_expr(part, env)?.to_text());
            }
            Ok(Value::String(result))
        }
        Expr::UnaryOp(op, operand) => {
            let value = eval_expr(operand, env)?;
            match op {
                UnaryOp::Plus => value.unary_plus(),
                UnaryOp::Minus => value.unary_minus(),
                UnaryOp::Not => Ok(value.not()),
            }
        }
        Expr::BinOp(op, left, right) => {
            // `&&`/`||` short-circuit here, matching the host's own
            // boolean operators; the VM intentionally does not (see
            // compiler.rs).
            match op {
                BinaryOp::And => {
                    let left = eval_expr(left, env)?;
                    if !left.is_truthy() {
                        return Ok(left);
                    }
                    Ok(left.and(eval_expr(right, env)?))
                }
                BinaryOp::Or => {
                    let left = eval_expr(left, env)?;
                    if left.is_truthy() {
                        return Ok(left);
                    }
                    Ok(left.or(eval_expr(right, env)?))
                }
                _ => {
                    let left = eval_expr(left, env)?;
                    let right = eval_expr(right, env)?;
                    apply_binop(*op, &left, &right)
                }
            }
        }
    }
}

fn apply_binop(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Error> {
    match op {
        BinaryOp::Add => left.add(right),
        BinaryOp::Subtract => left.sub(right),
        BinaryOp::Multiply => left.mul(right),
        BinaryOp::Divide => left.div(right),
        BinaryOp::Equals => left.equals(right),
        BinaryOp::NotEquals => left.not_equals(right),
        BinaryOp::Less => left.less_than(right),
        BinaryOp::Greater => left.greater_than(right),
        BinaryOp::LessEqual => left.less_equal(right),
        BinaryOp::GreaterEqual => left.greater_equal(right),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuited above"),
    }
}
