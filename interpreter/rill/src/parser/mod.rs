//! Recursive descent parser for Rill.
//!
//! Statements are separated by newlines or semicolons; blocks are braced.
//! The parser produces the `ast` tree the evaluator walks.

mod cursor;
mod expr;
mod stmt;
#[cfg(test)]
mod tests;

use std::fmt;

pub use cursor::Cursor;

use crate::ast::{Pos, Stmt, StmtKind};
use crate::lexer::{tokenize, LexError, Token, TokenKind};

/// Parse failure with position.
#[derive(Clone, Debug)]
pub struct ParseError {
    pub message: String,
    pub pos: Pos,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        ParseError {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::new(e.message, e.pos)
    }
}

pub(crate) type ParseResult<T> = Result<T, ParseError>;

/// Parser state.
pub struct Parser {
    cursor: Cursor,
    /// Set while parsing control-flow headers, where `{` opens the body
    /// and must not be taken as a record literal.
    no_record: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            no_record: false,
        }
    }

    /// Parse a whole program into a statement sequence.
    pub fn parse_program(&mut self) -> ParseResult<Stmt> {
        let pos = self.cursor.position();
        let mut stmts = Vec::new();
        self.cursor.skip_separators();
        while !self.cursor.is_at_end() {
            stmts.push(self.parse_stmt()?);
            self.expect_stmt_end()?;
            self.cursor.skip_separators();
        }
        Ok(Stmt::new(StmtKind::Stmts(stmts), pos))
    }

    /// After a statement, require a separator, a closing brace, or EOF.
    fn expect_stmt_end(&mut self) -> ParseResult<()> {
        match self.cursor.kind() {
            TokenKind::Newline | TokenKind::Semi => {
                self.cursor.skip_separators();
                Ok(())
            }
            // `case`/`default` end the statement list of a switch arm.
            TokenKind::RBrace | TokenKind::Eof | TokenKind::Case | TokenKind::Default => Ok(()),
            other => Err(ParseError::new(
                format!("expected end of statement, found {other:?}"),
                self.cursor.position(),
            )),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> ParseResult<Token> {
        if self.cursor.check(kind) {
            return Ok(self.cursor.advance());
        }
        Err(ParseError::new(
            format!("expected {what}, found {:?}", self.cursor.kind()),
            self.cursor.position(),
        ))
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        match self.cursor.kind().clone() {
            TokenKind::Ident(name) => {
                self.cursor.advance();
                Ok(name)
            }
            other => Err(ParseError::new(
                format!("expected {what}, found {other:?}"),
                self.cursor.position(),
            )),
        }
    }
}

/// Parse source text into a program statement.
pub fn parse(source: &str) -> Result<Stmt, ParseError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_program()
}
