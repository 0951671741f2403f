//! Lexer for Rill source text.
//!
//! Produces a flat token stream with source positions. Newlines are
//! significant (they separate statements) and survive as tokens; the
//! parser decides where they matter.

#[cfg(test)]
mod tests;

use logos::Logos;

use crate::ast::Pos;

/// Raw token kinds, derived with logos.
#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // Comments
    #[regex(r"#[^\n]*", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Comment,

    // Statement separator
    #[token("\n")]
    Newline,

    // Keywords
    #[token("var")]
    Var,
    #[token("func")]
    Func,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("module")]
    Module,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("go")]
    Go,
    #[token("delete")]
    Delete,
    #[token("close")]
    Close,
    #[token("struct")]
    Struct,
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("make")]
    Make,
    #[token("chan")]
    Chan,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    // Literals
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("?")]
    Question,

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<-")]
    Arrow,

    /// Synthetic end-of-input marker appended by `tokenize`.
    Eof,
}

/// A token with its source position.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

/// Lexing failure with position.
#[derive(Clone, Debug)]
pub struct LexError {
    pub message: String,
    pub pos: Pos,
}

/// Cook the escape sequences of a quoted string literal.
fn unescape(quoted: &str) -> Option<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

/// Tokenize source text into a position-annotated token stream.
///
/// A trailing `Eof` token is always present so the parser never runs off
/// the end of the stream.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    // Byte offsets where each line starts, for span -> line/col mapping.
    let mut line_starts = vec![0usize];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }
    let pos_at = |offset: usize| -> Pos {
        let line = match line_starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        let col = offset - line_starts[line];
        Pos::new(line as u32 + 1, col as u32 + 1)
    };

    let mut tokens = Vec::new();
    for (result, span) in TokenKind::lexer(source).spanned() {
        let pos = pos_at(span.start);
        match result {
            Ok(kind) => tokens.push(Token { kind, pos }),
            Err(()) => {
                return Err(LexError {
                    message: format!(
                        "unexpected character {:?}",
                        source[span.start..span.end].chars().next().unwrap_or('?')
                    ),
                    pos,
                });
            }
        }
    }
    let end = pos_at(source.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        pos: end,
    });
    Ok(tokens)
}
