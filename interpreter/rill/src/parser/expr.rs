//! Expression grammar (precedence climbing).

use std::sync::Arc;

use crate::ast::{BinaryOp, Expr, ExprKind, FuncDecl, Stmt, UnaryOp};
use crate::lexer::TokenKind;

use super::{ParseError, ParseResult, Parser};

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_ternary()
    }

    /// Expression in a control-flow header, where a `{` begins the body
    /// rather than a record literal.
    pub(crate) fn parse_header_expr(&mut self) -> ParseResult<Expr> {
        let saved = self.no_record;
        self.no_record = true;
        let result = self.parse_ternary();
        self.no_record = saved;
        result
    }

    fn parse_ternary(&mut self) -> ParseResult<Expr> {
        let pos = self.cursor.position();
        let cond = self.parse_or()?;
        if self.cursor.eat(&TokenKind::Question) {
            self.cursor.skip_newlines();
            let then = self.parse_or()?;
            self.expect(&TokenKind::Colon, "`:`")?;
            self.cursor.skip_newlines();
            let els = self.parse_ternary()?;
            return Ok(Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    els: Box::new(els),
                },
                pos,
            ));
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.cursor.eat(&TokenKind::OrOr) {
            self.cursor.skip_newlines();
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_bit_or()?;
        while self.cursor.eat(&TokenKind::AndAnd) {
            self.cursor.skip_newlines();
            let rhs = self.parse_bit_or()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_bit_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_bit_xor()?;
        while self.cursor.eat(&TokenKind::Pipe) {
            self.cursor.skip_newlines();
            let rhs = self.parse_bit_xor()?;
            lhs = binary(BinaryOp::BitOr, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_bit_and()?;
        while self.cursor.eat(&TokenKind::Caret) {
            self.cursor.skip_newlines();
            let rhs = self.parse_bit_and()?;
            lhs = binary(BinaryOp::BitXor, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_bit_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.cursor.eat(&TokenKind::Amp) {
            self.cursor.skip_newlines();
            let rhs = self.parse_equality()?;
            lhs = binary(BinaryOp::BitAnd, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_newlines();
            let rhs = self.parse_comparison()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_shift()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_newlines();
            let rhs = self.parse_shift()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_newlines();
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_newlines();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_newlines();
            let rhs = self.parse_power()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// `**` is right-associative.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;
        if self.cursor.eat(&TokenKind::StarStar) {
            self.cursor.skip_newlines();
            let rhs = self.parse_power()?;
            return Ok(binary(BinaryOp::Pow, lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let pos = self.cursor.position();
        match self.cursor.kind() {
            TokenKind::Minus => {
                self.cursor.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        expr: Box::new(expr),
                    },
                    pos,
                ))
            }
            TokenKind::Bang => {
                self.cursor.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        expr: Box::new(expr),
                    },
                    pos,
                ))
            }
            TokenKind::Caret => {
                self.cursor.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::BitNot,
                        expr: Box::new(expr),
                    },
                    pos,
                ))
            }
            TokenKind::Amp => {
                self.cursor.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::new(ExprKind::Addr(Box::new(expr)), pos))
            }
            TokenKind::Star => {
                self.cursor.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::new(ExprKind::Deref(Box::new(expr)), pos))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let pos = self.cursor.position();
            match self.cursor.kind() {
                TokenKind::LParen => {
                    let (args, variadic) = self.parse_call_args()?;
                    // `?` directly after a call marks the error-propagating form.
                    let propagate = self.cursor.eat(&TokenKind::Question);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                            variadic,
                            propagate,
                        },
                        pos,
                    );
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    self.cursor.skip_newlines();
                    expr = self.parse_index_or_slice(expr, pos)?;
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    let name = self.expect_ident("member name")?;
                    expr = Expr::new(
                        ExprKind::Member {
                            expr: Box::new(expr),
                            name,
                        },
                        pos,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> ParseResult<(Vec<Expr>, bool)> {
        self.expect(&TokenKind::LParen, "`(`")?;
        self.cursor.skip_newlines();
        let mut args = Vec::new();
        let mut variadic = false;
        let saved = self.no_record;
        self.no_record = false;
        let result = (|| -> ParseResult<()> {
            if !self.cursor.check(&TokenKind::RParen) {
                loop {
                    args.push(self.parse_expr()?);
                    if self.cursor.eat(&TokenKind::Ellipsis) {
                        variadic = true;
                        self.cursor.skip_newlines();
                        break;
                    }
                    if !self.cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                    self.cursor.skip_newlines();
                }
            }
            self.cursor.skip_newlines();
            self.expect(&TokenKind::RParen, "`)`")?;
            Ok(())
        })();
        self.no_record = saved;
        result?;
        Ok((args, variadic))
    }

    fn parse_index_or_slice(&mut self, base: Expr, pos: crate::ast::Pos) -> ParseResult<Expr> {
        // `[` already consumed.
        let from = if self.cursor.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        if self.cursor.eat(&TokenKind::Colon) {
            self.cursor.skip_newlines();
            let to = if self.cursor.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            self.expect(&TokenKind::RBracket, "`]`")?;
            return Ok(Expr::new(
                ExprKind::Slice {
                    expr: Box::new(base),
                    from,
                    to,
                },
                pos,
            ));
        }
        self.expect(&TokenKind::RBracket, "`]`")?;
        let index = from.ok_or_else(|| ParseError::new("expected index expression", pos))?;
        Ok(Expr::new(
            ExprKind::Index {
                expr: Box::new(base),
                index,
            },
            pos,
        ))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let pos = self.cursor.position();
        match self.cursor.kind().clone() {
            TokenKind::Nil => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Nil, pos))
            }
            TokenKind::True => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Bool(true), pos))
            }
            TokenKind::False => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Bool(false), pos))
            }
            TokenKind::Int(n) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Int(n), pos))
            }
            TokenKind::Float(f) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Float(f), pos))
            }
            TokenKind::Str(s) => {
                self.cursor.advance();
                Ok(Expr::new(ExprKind::Str(s), pos))
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                if self.cursor.check(&TokenKind::LBrace) && !self.no_record {
                    return self.parse_record_literal(name, pos);
                }
                Ok(Expr::new(ExprKind::Ident(name), pos))
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                self.cursor.skip_newlines();
                let mut items = Vec::new();
                while !self.cursor.check(&TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    if !self.cursor.eat(&TokenKind::Comma) {
                        self.cursor.skip_newlines();
                        break;
                    }
                    self.cursor.skip_newlines();
                }
                self.expect(&TokenKind::RBracket, "`]`")?;
                Ok(Expr::new(ExprKind::Seq(items), pos))
            }
            TokenKind::LBrace => {
                self.cursor.advance();
                self.cursor.skip_newlines();
                let mut entries = Vec::new();
                while !self.cursor.check(&TokenKind::RBrace) {
                    let key = self.parse_expr()?;
                    self.expect(&TokenKind::Colon, "`:`")?;
                    self.cursor.skip_newlines();
                    let value = self.parse_expr()?;
                    entries.push((key, value));
                    if !self.cursor.eat(&TokenKind::Comma) {
                        self.cursor.skip_newlines();
                        break;
                    }
                    self.cursor.skip_newlines();
                }
                self.expect(&TokenKind::RBrace, "`}`")?;
                Ok(Expr::new(ExprKind::Map(entries), pos))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                self.cursor.skip_newlines();
                let saved = self.no_record;
                self.no_record = false;
                let inner = self.parse_expr();
                self.no_record = saved;
                let inner = inner?;
                // `(ch <- v)` — parenthesized channel send.
                let inner = if self.cursor.eat(&TokenKind::Arrow) {
                    self.cursor.skip_newlines();
                    let value = self.parse_expr()?;
                    Expr::new(
                        ExprKind::ChanSend {
                            chan: Box::new(inner),
                            value: Box::new(value),
                        },
                        pos,
                    )
                } else {
                    inner
                };
                self.cursor.skip_newlines();
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(Expr::new(ExprKind::Paren(Box::new(inner)), pos))
            }
            TokenKind::Func => self.parse_func_literal(),
            TokenKind::Make => self.parse_make(),
            other => Err(ParseError::new(
                format!("unexpected token {other:?}"),
                pos,
            )),
        }
    }

    fn parse_record_literal(&mut self, type_name: String, pos: crate::ast::Pos) -> ParseResult<Expr> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        self.cursor.skip_newlines();
        let mut fields = Vec::new();
        while !self.cursor.check(&TokenKind::RBrace) {
            let name = self.expect_ident("field name")?;
            self.expect(&TokenKind::Colon, "`:`")?;
            self.cursor.skip_newlines();
            let value = self.parse_expr()?;
            fields.push((name, value));
            if !self.cursor.eat(&TokenKind::Comma) {
                self.cursor.skip_newlines();
                break;
            }
            self.cursor.skip_newlines();
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Expr::new(ExprKind::Record { type_name, fields }, pos))
    }

    /// `func [Recv.]name(params) { body }` or anonymous `func(params) { body }`.
    fn parse_func_literal(&mut self) -> ParseResult<Expr> {
        let pos = self.cursor.position();
        self.expect(&TokenKind::Func, "`func`")?;

        let mut name = String::new();
        let mut receiver = None;
        if self.cursor.check_ident() {
            let first = self.expect_ident("function name")?;
            if self.cursor.eat(&TokenKind::Dot) {
                receiver = Some(first);
                name = self.expect_ident("method name")?;
            } else {
                name = first;
            }
        }

        self.expect(&TokenKind::LParen, "`(`")?;
        self.cursor.skip_newlines();
        let mut params = Vec::new();
        let mut variadic = false;
        while !self.cursor.check(&TokenKind::RParen) {
            params.push(self.expect_ident("parameter name")?);
            if self.cursor.eat(&TokenKind::Ellipsis) {
                variadic = true;
                self.cursor.skip_newlines();
                break;
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
            self.cursor.skip_newlines();
        }
        self.expect(&TokenKind::RParen, "`)`")?;

        let saved = self.no_record;
        self.no_record = false;
        let body = self.parse_block();
        self.no_record = saved;
        let body: Stmt = body?;

        Ok(Expr::new(
            ExprKind::Func(Arc::new(FuncDecl {
                name,
                receiver,
                params,
                variadic,
                body: Arc::new(body),
                pos,
            })),
            pos,
        ))
    }

    /// `make(chan)`, `make(chan, n)`, `make(Type)`.
    fn parse_make(&mut self) -> ParseResult<Expr> {
        let pos = self.cursor.position();
        self.expect(&TokenKind::Make, "`make`")?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let expr = if self.cursor.eat(&TokenKind::Chan) {
            let size = if self.cursor.eat(&TokenKind::Comma) {
                self.cursor.skip_newlines();
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            Expr::new(ExprKind::MakeChan { size }, pos)
        } else {
            let type_name = self.expect_ident("type name")?;
            Expr::new(ExprKind::Make { type_name }, pos)
        };
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(expr)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let pos = lhs.pos;
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        pos,
    )
}
