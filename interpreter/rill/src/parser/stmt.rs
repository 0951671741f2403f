//! Statement grammar.

use crate::ast::{Expr, ExprKind, FieldDecl, Stmt, StmtKind, SwitchCase};
use crate::lexer::TokenKind;

use super::{ParseError, ParseResult, Parser};

impl Parser {
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        match self.cursor.kind() {
            TokenKind::Var => self.parse_var(),
            TokenKind::Break => {
                self.cursor.advance();
                Ok(Stmt::new(StmtKind::Break, pos))
            }
            TokenKind::Continue => {
                self.cursor.advance();
                Ok(Stmt::new(StmtKind::Continue, pos))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => {
                self.cursor.advance();
                let expr = self.parse_expr()?;
                Ok(Stmt::new(StmtKind::Throw(expr), pos))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Try => self.parse_try(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Module => self.parse_module(),
            TokenKind::Go => self.parse_go(),
            TokenKind::Delete => self.parse_delete(),
            TokenKind::Close => self.parse_close(),
            TokenKind::Struct => self.parse_struct(),
            TokenKind::Import => self.parse_import(),
            _ => self.parse_expr_led_stmt(),
        }
    }

    /// A braced statement sequence.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.expect(&TokenKind::LBrace, "`{`")?;
        self.cursor.skip_separators();
        let mut stmts = Vec::new();
        while !self.cursor.check(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            stmts.push(self.parse_stmt()?);
            self.expect_stmt_end()?;
            self.cursor.skip_separators();
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Stmt::new(StmtKind::Stmts(stmts), pos))
    }

    /// `var a, b = e1, e2`
    fn parse_var(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let mut names = vec![self.expect_ident("variable name")?];
        while self.cursor.eat(&TokenKind::Comma) {
            self.cursor.skip_newlines();
            names.push(self.expect_ident("variable name")?);
        }
        self.expect(&TokenKind::Assign, "`=`")?;
        self.cursor.skip_newlines();
        let exprs = self.parse_expr_list()?;
        Ok(Stmt::new(StmtKind::Var { names, exprs }, pos))
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let exprs = if matches!(
            self.cursor.kind(),
            TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof
        ) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        Ok(Stmt::new(StmtKind::Return(exprs), pos))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let cond = self.parse_header_expr()?;
        let then = Box::new(self.parse_block()?);
        let mut elifs = Vec::new();
        let mut els = None;

        loop {
            // `else` may sit on the line after the closing brace.
            let mark = self.cursor.mark();
            self.cursor.skip_newlines();
            if !self.cursor.eat(&TokenKind::Else) {
                self.cursor.reset(mark);
                break;
            }
            if self.cursor.eat(&TokenKind::If) {
                let cond = self.parse_header_expr()?;
                let body = self.parse_block()?;
                elifs.push((cond, body));
            } else {
                els = Some(Box::new(self.parse_block()?));
                break;
            }
        }
        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then,
                elifs,
                els,
            },
            pos,
        ))
    }

    fn parse_try(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let body = Box::new(self.parse_block()?);

        let mut catch_name = None;
        let mut catch = None;
        let mark = self.cursor.mark();
        self.cursor.skip_newlines();
        if self.cursor.eat(&TokenKind::Catch) {
            if self.cursor.check_ident() {
                catch_name = Some(self.expect_ident("catch variable")?);
            }
            catch = Some(Box::new(self.parse_block()?));
        } else {
            self.cursor.reset(mark);
        }

        let mut finally = None;
        let mark = self.cursor.mark();
        self.cursor.skip_newlines();
        if self.cursor.eat(&TokenKind::Finally) {
            finally = Some(Box::new(self.parse_block()?));
        } else {
            self.cursor.reset(mark);
        }

        if catch.is_none() && finally.is_none() {
            return Err(ParseError::new("try requires catch or finally", pos));
        }
        Ok(Stmt::new(
            StmtKind::Try {
                body,
                catch_name,
                catch,
                finally,
            },
            pos,
        ))
    }

    /// `for {}` / `for cond {}` / `for x in xs {}` / `for init; cond; post {}`
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();

        if self.cursor.check(&TokenKind::LBrace) {
            let body = Box::new(self.parse_block()?);
            return Ok(Stmt::new(StmtKind::Loop { cond: None, body }, pos));
        }

        // for-in: one or two loop variables followed by `in`
        let mark = self.cursor.mark();
        if self.cursor.check_ident() {
            let mut names = vec![self.expect_ident("loop variable")?];
            if self.cursor.eat(&TokenKind::Comma) {
                if self.cursor.check_ident() {
                    names.push(self.expect_ident("loop variable")?);
                }
            }
            if names.len() <= 2 && self.cursor.eat(&TokenKind::In) {
                let iter = self.parse_header_expr()?;
                let body = Box::new(self.parse_block()?);
                return Ok(Stmt::new(StmtKind::ForIn { names, iter, body }, pos));
            }
            self.cursor.reset(mark);
        }

        if self.cursor.semi_before_body() {
            type CForHeader = (Option<Box<Stmt>>, Option<Expr>, Option<Box<Stmt>>);
            let saved = self.no_record;
            self.no_record = true;
            let header = (|| -> ParseResult<CForHeader> {
                let init = if self.cursor.check(&TokenKind::Semi) {
                    None
                } else {
                    Some(Box::new(self.parse_simple_stmt()?))
                };
                self.expect(&TokenKind::Semi, "`;`")?;
                let cond = if self.cursor.check(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::Semi, "`;`")?;
                let post = if self.cursor.check(&TokenKind::LBrace) {
                    None
                } else {
                    Some(Box::new(self.parse_simple_stmt()?))
                };
                Ok((init, cond, post))
            })();
            self.no_record = saved;
            let (init, cond, post) = header?;
            let body = Box::new(self.parse_block()?);
            return Ok(Stmt::new(
                StmtKind::CFor {
                    init,
                    cond,
                    post,
                    body,
                },
                pos,
            ));
        }

        let cond = Some(self.parse_header_expr()?);
        let body = Box::new(self.parse_block()?);
        Ok(Stmt::new(StmtKind::Loop { cond, body }, pos))
    }

    /// Restricted statement for `for` init/post clauses.
    fn parse_simple_stmt(&mut self) -> ParseResult<Stmt> {
        if self.cursor.check(&TokenKind::Var) {
            return self.parse_var();
        }
        self.parse_expr_led_stmt()
    }

    fn parse_switch(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let expr = self.parse_header_expr()?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        self.cursor.skip_separators();

        let mut cases = Vec::new();
        let mut default = None;
        while !self.cursor.check(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            if self.cursor.eat(&TokenKind::Case) {
                let exprs = self.parse_expr_list()?;
                self.expect(&TokenKind::Colon, "`:`")?;
                let body = self.parse_case_body()?;
                cases.push(SwitchCase { exprs, body });
            } else if self.cursor.eat(&TokenKind::Default) {
                self.expect(&TokenKind::Colon, "`:`")?;
                if default.is_some() {
                    return Err(ParseError::new("duplicate default case", pos));
                }
                default = Some(Box::new(self.parse_case_body()?));
            } else {
                return Err(ParseError::new(
                    format!("expected case or default, found {:?}", self.cursor.kind()),
                    self.cursor.position(),
                ));
            }
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Stmt::new(
            StmtKind::Switch {
                expr,
                cases,
                default,
            },
            pos,
        ))
    }

    /// Statements until the next `case`, `default`, or `}`.
    fn parse_case_body(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.skip_separators();
        let mut stmts = Vec::new();
        while !matches!(
            self.cursor.kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
        ) {
            stmts.push(self.parse_stmt()?);
            self.expect_stmt_end()?;
            self.cursor.skip_separators();
        }
        Ok(Stmt::new(StmtKind::Stmts(stmts), pos))
    }

    fn parse_module(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let name = self.expect_ident("module name")?;
        let body = Box::new(self.parse_block()?);
        Ok(Stmt::new(StmtKind::Module { name, body }, pos))
    }

    fn parse_go(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let expr = self.parse_expr()?;
        if !matches!(expr.kind, ExprKind::Call { .. }) {
            return Err(ParseError::new("go requires a function call", pos));
        }
        Ok(Stmt::new(StmtKind::Go(expr), pos))
    }

    fn parse_delete(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`")?;
        let item = self.parse_expr()?;
        let key = if self.cursor.eat(&TokenKind::Comma) {
            self.cursor.skip_newlines();
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(Stmt::new(StmtKind::Delete { item, key }, pos))
    }

    fn parse_close(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(`")?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(Stmt::new(StmtKind::Close(expr), pos))
    }

    fn parse_struct(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();
        let name = self.expect_ident("struct name")?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        self.cursor.skip_separators();
        let mut fields = Vec::new();
        while !self.cursor.check(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            let field = self.expect_ident("field name")?;
            let type_name = if self.cursor.eat(&TokenKind::Colon) {
                Some(self.expect_ident("field type")?)
            } else {
                None
            };
            fields.push(FieldDecl {
                name: field,
                type_name,
            });
            if !self.cursor.eat(&TokenKind::Comma)
                && !matches!(
                    self.cursor.kind(),
                    TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace
                )
            {
                return Err(ParseError::new(
                    format!("expected `,` or newline, found {:?}", self.cursor.kind()),
                    self.cursor.position(),
                ));
            }
            self.cursor.skip_separators();
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Stmt::new(StmtKind::Struct { name, fields }, pos))
    }

    /// `import a/b.c as d` (registry) or `import "path" as d` (local).
    fn parse_import(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        self.cursor.advance();

        let (path, local) = match self.cursor.kind().clone() {
            TokenKind::Str(path) => {
                self.cursor.advance();
                (path, true)
            }
            TokenKind::Ident(first) => {
                self.cursor.advance();
                let mut path = first;
                loop {
                    // Both `.` and `/` separate segments; normalized to `/`.
                    if self.cursor.eat(&TokenKind::Dot) || self.cursor.eat(&TokenKind::Slash) {
                        path.push('/');
                        path.push_str(&self.expect_ident("import path segment")?);
                    } else {
                        break;
                    }
                }
                (path, false)
            }
            other => {
                return Err(ParseError::new(
                    format!("expected import path, found {other:?}"),
                    pos,
                ))
            }
        };

        let alias = if self.cursor.eat(&TokenKind::As) {
            Some(self.expect_ident("import alias")?)
        } else {
            None
        };
        Ok(Stmt::new(StmtKind::Import { path, alias, local }, pos))
    }

    /// Statement that begins with an expression: plain expression,
    /// assignment (`a, b = ...`), or channel operation (`a <- ch`).
    fn parse_expr_led_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        let first = self.parse_expr()?;

        if self.cursor.eat(&TokenKind::Arrow) {
            self.cursor.skip_newlines();
            let rhs = self.parse_expr()?;
            return Ok(Stmt::new(
                StmtKind::Chan {
                    lhs: first,
                    ok: None,
                    rhs,
                },
                pos,
            ));
        }

        if self.cursor.check(&TokenKind::Comma) {
            let mut lhss = vec![first];
            while self.cursor.eat(&TokenKind::Comma) {
                self.cursor.skip_newlines();
                lhss.push(self.parse_expr()?);
            }
            if self.cursor.eat(&TokenKind::Arrow) {
                self.cursor.skip_newlines();
                let rhs = self.parse_expr()?;
                if lhss.len() != 2 {
                    return Err(ParseError::new(
                        "channel receive takes one value and one ok target",
                        pos,
                    ));
                }
                let ok = lhss.pop();
                let lhs = lhss.pop().expect("two receive targets");
                return Ok(Stmt::new(StmtKind::Chan { lhs, ok, rhs }, pos));
            }
            self.expect(&TokenKind::Assign, "`=`")?;
            self.cursor.skip_newlines();
            let rhss = self.parse_expr_list()?;
            return Ok(Stmt::new(StmtKind::Lets { lhss, rhss }, pos));
        }

        if self.cursor.eat(&TokenKind::Assign) {
            self.cursor.skip_newlines();
            let rhss = self.parse_expr_list()?;
            return Ok(Stmt::new(
                StmtKind::Lets {
                    lhss: vec![first],
                    rhss,
                },
                pos,
            ));
        }

        Ok(Stmt::new(StmtKind::Expr(first), pos))
    }

    /// Comma-separated expressions.
    pub(crate) fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.cursor.eat(&TokenKind::Comma) {
            self.cursor.skip_newlines();
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }
}
