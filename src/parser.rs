//! Recursive-descent parser: tokens in, [`Stmt`]/[`Expr`] AST out.
//!
//! # Precedence
//! The grammar collapses additive, comparison, and logical operators
//! into a single left-associative `expr` loop, with `term` handling
//! `*`/`/` at the next level down and `factor` handling atoms, parens,
//! and unary operators. This is a deliberate simplification carried
//! over verbatim from the language design: comparison and logical
//! operators share precedence with `+`/`-`.

use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::error::{Error, ParseError};
use crate::lexer::Lexer;
use crate::token::{StringSegment, Token};

pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    /// Parses an entire program: either a single top-level compound
    /// statement (`{ ... }`) or a flat list of statements up to EOF.
    pub fn parse_program(&mut self) -> Result<Stmt, Error> {
        if self.current == Token::LBrace {
            self.compound_stmt()
        } else {
            let statements = self.statement_list(&Token::Eof)?;
            Ok(Stmt::Compound(statements))
        }
    }

    /// Parses a single standalone expression from a whole source
    /// string and requires it to consume all input. Used to re-lex and
    /// re-parse the raw text captured inside a `${...}` interpolation.
    pub fn parse_standalone_expr(source: &str) -> Result<Expr, Error> {
        let mut parser = Parser::new(source)?;
        let expr = parser.expr()?;
        if parser.current != Token::Eof {
            return Err(ParseError::UnexpectedToken {
                expected: "end of expression".to_string(),
                got: parser.current.to_string(),
            }
            .into());
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: &Token) -> Result<(), Error> {
        if &self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                got: self.current.to_string(),
            }
            .into())
        }
    }

    fn compound_stmt(&mut self) -> Result<Stmt, Error> {
        self.expect(&Token::LBrace)?;
        let statements = self.statement_list(&Token::RBrace)?;
        self.expect(&Token::RBrace)?;
        Ok(Stmt::Compound(statements))
    }

    fn statement_list(&mut self, terminator: &Token) -> Result<Vec<Stmt>, Error> {
        let mut statements = Vec::new();
        while &self.current != terminator && self.current != Token::Eof {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, Error> {
        match &self.current {
            Token::Semicolon => {
                self.advance()?;
                Ok(Stmt::NoOp)
            }
            Token::LBrace => self.compound_stmt(),
            Token::Var => {
                self.advance()?;
                let name = self.identifier_name()?;
                self.expect(&Token::Assign)?;
                let value = self.expr()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::VarDecl(name, value))
            }
            Token::Print => {
                self.advance()?;
                let value = self.expr()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::Print(value))
            }
            Token::If => {
                self.advance()?;
                self.expect(&Token::LParen)?;
                let condition = self.expr()?;
                self.expect(&Token::RParen)?;
                let then_branch = Box::new(self.statement()?);
                let else_branch = if self.current == Token::Else {
                    self.advance()?;
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                })
            }
            Token::While => {
                self.advance()?;
                self.expect(&Token::LParen)?;
                let condition = self.expr()?;
                self.expect(&Token::RParen)?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { condition, body })
            }
            Token::Identifier(_) => {
                let name = self.identifier_name()?;
                self.expect(&Token::Assign)?;
                let value = self.expr()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::Assign(name, value))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "a statement".to_string(),
                got: other.to_string(),
            }
            .into()),
        }
    }

    fn identifier_name(&mut self) -> Result<String, Error> {
        match self.advance()? {
            Token::Identifier(name) => Ok(name),
            other => Err(ParseError::UnexpectedToken {
                expected: "an identifier".to_string(),
                got: other.to_string(),
            }
            .into()),
        }
    }

    /// `expr := term (( '+' | '-' | '==' | '!=' | '<' | '>' | '<=' | '>=' | '&&' | '||' ) term)*`
    fn expr(&mut self) -> Result<Expr, Error> {
        let mut left = self.term()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                Token::Equals => BinaryOp::Equals,
                Token::NotEquals => BinaryOp::NotEquals,
                Token::Less => BinaryOp::Less,
                Token::Greater => BinaryOp::Greater,
                Token::LessEqual => BinaryOp::LessEqual,
                Token::GreaterEqual => BinaryOp::GreaterEqual,
                Token::And => BinaryOp::And,
                Token::Or => BinaryOp::Or,
                _ => break,
            };
            self.advance()?;
            let right = self.term()?;
            left = Expr::BinOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `term := factor (( '*' | '/' ) factor)*`
    fn term(&mut self) -> Result<Expr, Error> {
        let mut left = self.factor()?;
        loop {
            let op = match self.current {
                Token::Multiply => BinaryOp::Multiply,
                Token::Divide => BinaryOp::Divide,
                _ => break,
            };
            self.advance()?;
            let right = self.factor()?;
            left = Expr::BinOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `factor := INTEGER | FLOAT | BOOLEAN | STRING | STRING_INTERPOLATION
    ///          | IDENT | '(' expr ')' | ('+' | '-' | '!') factor`
    fn factor(&mut self) -> Result<Expr, Error> {
        match self.advance()? {
            Token::Integer(n) => Ok(Expr::Number(n)),
            Token::Float(n) => Ok(Expr::Float(n)),
            Token::Boolean(b) => Ok(Expr::Boolean(b)),
            Token::String(s) => Ok(Expr::String(s)),
            Token::StringInterpolation(segments) => self.interpolation(segments),
            Token::Identifier(name) => Ok(Expr::Variable(name)),
            Token::LParen => {
                let expr = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::Plus => Ok(Expr::UnaryOp(UnaryOp::Plus, Box::new(self.factor()?))),
            Token::Minus => Ok(Expr::UnaryOp(UnaryOp::Minus, Box::new(self.factor()?))),
            Token::Not => Ok(Expr::UnaryOp(UnaryOp::Not, Box::new(self.factor()?))),
            other => Err(ParseError::UnexpectedToken {
                expected: "an expression".to_string(),
                got: other.to_string(),
            }
            .into()),
        }
    }

    /// Re-lexes and re-parses each `${...}` segment's raw text as a
    /// fresh expression, preserving literal runs as `Expr::String`.
    fn interpolation(&mut self, segments: Vec<StringSegment>) -> Result<Expr, Error> {
        let parts = segments
            .into_iter()
            .map(|segment| match segment {
                StringSegment::Literal(text) => Ok(Expr::String(text)),
                StringSegment::Interpolation(raw) => Parser::parse_standalone_expr(&raw),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::StringInterpolation(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Stmt {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn precedence_collapses_to_two_levels() {
        // 2 + 3 * 4 == 14, but `==` sits at the same level as `+`.
        let stmt = parse("print 2 + 3 * 4 == 14;");
        let Stmt::Compound(stmts) = stmt else { panic!() };
        let Stmt::Print(expr) = &stmts[0] else { panic!() };
        // (2 + (3*4)) == 14, parsed left-associatively at the `expr` level.
        assert!(matches!(expr, Expr::BinOp(BinaryOp::Equals, _, _)));
    }

    #[test]
    fn var_decl_and_assign() {
        let stmt = parse("var x = 1; x = 2;");
        let Stmt::Compound(stmts) = stmt else { panic!() };
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0], Stmt::VarDecl(ref n, _) if n == "x"));
        assert!(matches!(stmts[1], Stmt::Assign(ref n, _) if n == "x"));
    }

    #[test]
    fn if_else_without_braces() {
        let stmt = parse("if (1) print 1; else print 2;");
        let Stmt::Compound(stmts) = stmt else { panic!() };
        assert!(matches!(
            stmts[0],
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn while_with_compound_body() {
        let stmt = parse("while (1) { print 1; }");
        let Stmt::Compound(stmts) = stmt else { panic!() };
        let Stmt::While { body, .. } = &stmts[0] else { panic!() };
        assert!(matches!(**body, Stmt::Compound(_)));
    }

    #[test]
    fn interpolation_mixes_literal_and_expr_nodes() {
        let stmt = parse(r#"print "Hello, ${1 + 1}!";"#);
        let Stmt::Compound(stmts) = stmt else { panic!() };
        let Stmt::Print(Expr::StringInterpolation(parts)) = &stmts[0] else {
            panic!()
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], Expr::String(ref s) if s == "Hello, "));
        assert!(matches!(parts[1], Expr::BinOp(BinaryOp::Add, _, _)));
        assert!(matches!(parts[2], Expr::String(ref s) if s == "!"));
    }

    #[test]
    fn unexpected_token_is_parse_error() {
        assert!(Parser::new("var x = ;").unwrap().parse_program().is_err());
    }

    #[test]
    fn unclosed_paren_is_parse_error() {
        assert!(Parser::new("print (1;").unwrap().parse_program().is_err());
    }
}
