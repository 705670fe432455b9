//! Pratt parser: precedence climbing over the token stream.
//!
//! Precedence, loosest first: `||`, `&&`, `==`/`!=`, `<`/`<=`/`>`/`>=`,
//! then prefix `!`. Nesting depth is capped at [`MAX_DEPTH`].

use std::ops::Range;

use logos::Logos;

use crate::ast::{BinaryOp, Expr};
use crate::error::ExprError;
use crate::eval::MAX_DEPTH;
use crate::token::Token;
use crate::value::ExprValue;

/// Binary operator metadata: (precedence, operator). Higher binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::OrOr => Some((10, BinaryOp::Or)),
        Token::AndAnd => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((40, BinaryOp::Lt)),
        Token::LtEq => Some((40, BinaryOp::Le)),
        Token::Gt => Some((40, BinaryOp::Gt)),
        Token::GtEq => Some((40, BinaryOp::Ge)),
        _ => None,
    }
}

/// Parse a complete expression.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let mut tokens = Vec::new();
    for (token, span) in Token::lexer(source).spanned() {
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(ExprError::Lex {
                    offset: span.start,
                    fragment: source[span].to_string(),
                })
            }
        }
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: source.len(),
    };
    let expr = parser.parse_pratt(0)?;
    if let Some((token, span)) = parser.tokens.get(parser.pos) {
        return Err(ExprError::Parse {
            offset: span.start,
            message: format!("unexpected {token} after complete expression"),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<(Token, Range<usize>)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep { max: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_pratt(&mut self, min_prec: u8) -> Result<Expr, ExprError> {
        self.enter()?;
        let mut left = self.parse_prefix()?;

        while let Some((prec, op)) = self.peek().and_then(binary_op_info) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_pratt(prec + 1)?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }

        self.leave();
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Bang)) {
            self.advance();
            self.enter()?;
            let operand = self.parse_prefix()?;
            self.leave();
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        let Some((token, span)) = self.advance() else {
            return Err(ExprError::Parse {
                offset: self.end,
                message: "unexpected end of expression".to_string(),
            });
        };

        match token {
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::Integer(n) => Ok(Expr::Literal(ExprValue::Int(n))),
            Token::Str(s) => Ok(Expr::Literal(ExprValue::Str(s))),
            Token::True => Ok(Expr::Literal(ExprValue::Bool(true))),
            Token::False => Ok(Expr::Literal(ExprValue::Bool(false))),
            Token::LParen => {
                let inner = self.parse_pratt(0)?;
                match self.advance() {
                    Some((Token::RParen, _)) => Ok(inner),
                    Some((other, span)) => Err(ExprError::Parse {
                        offset: span.start,
                        message: format!("expected ')', found {other}"),
                    }),
                    None => Err(ExprError::Parse {
                        offset: self.end,
                        message: "expected ')', found end of expression".to_string(),
                    }),
                }
            }
            other => Err(ExprError::Parse {
                offset: span.start,
                message: format!("unexpected {other}, expected a knob name, literal or '('"),
            }),
        }
    }
}
