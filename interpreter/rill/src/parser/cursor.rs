//! Token cursor for navigating the token stream.

use crate::ast::Pos;
use crate::lexer::{Token, TokenKind};

/// Cursor over the token stream produced by the lexer.
///
/// The stream always ends with `Eof`, so `current` never runs off the end.
pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Cursor { tokens, pos: 0 }
    }

    /// Get the current token.
    pub fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Get the current token's kind.
    pub fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    /// Get the current token's position.
    pub fn position(&self) -> Pos {
        self.current().pos
    }

    /// Look ahead one token.
    pub fn peek_next(&self) -> &TokenKind {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Check the current token against a kind, ignoring payloads.
    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.kind()) == std::mem::discriminant(kind)
    }

    pub fn check_ident(&self) -> bool {
        matches!(self.kind(), TokenKind::Ident(_))
    }

    /// Advance and return the consumed token.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    /// Record the current position for backtracking.
    pub fn mark(&self) -> usize {
        self.pos
    }

    /// Rewind to a previously recorded position.
    pub fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Scan ahead to decide whether a `for` header is the three-part form:
    /// a `;` at bracket depth zero before the body brace or a line break.
    pub fn semi_before_body(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Semi if depth == 0 => return true,
                TokenKind::LBrace | TokenKind::Newline | TokenKind::Eof if depth == 0 => {
                    return false
                }
                _ => {}
            }
        }
        false
    }

    /// Skip any run of newline tokens.
    pub fn skip_newlines(&mut self) {
        while matches!(self.kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    /// Skip newlines and semicolons (statement separators).
    pub fn skip_separators(&mut self) {
        while matches!(self.kind(), TokenKind::Newline | TokenKind::Semi) {
            self.advance();
        }
    }
}
