use super::{tokenize, TokenKind};

fn kinds(src: &str) -> Vec<TokenKind> {
    tokenize(src)
        .expect("lex should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lex_numbers() {
    assert_eq!(
        kinds("1 23 0x10 1.5 2e3"),
        vec![
            TokenKind::Int(1),
            TokenKind::Int(23),
            TokenKind::Int(16),
            TokenKind::Float(1.5),
            TokenKind::Float(2000.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_string_escapes() {
    assert_eq!(
        kinds(r#""a\nb\"c""#),
        vec![TokenKind::Str("a\nb\"c".to_string()), TokenKind::Eof]
    );
}

#[test]
fn lex_keywords_and_idents() {
    assert_eq!(
        kinds("var x = func"),
        vec![
            TokenKind::Var,
            TokenKind::Ident("x".to_string()),
            TokenKind::Assign,
            TokenKind::Func,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_compound_operators() {
    assert_eq!(
        kinds("<- <= << == ... ** &&"),
        vec![
            TokenKind::Arrow,
            TokenKind::LtEq,
            TokenKind::Shl,
            TokenKind::EqEq,
            TokenKind::Ellipsis,
            TokenKind::StarStar,
            TokenKind::AndAnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_comments_skipped() {
    assert_eq!(
        kinds("1 # comment\n2 // other\n"),
        vec![
            TokenKind::Int(1),
            TokenKind::Newline,
            TokenKind::Int(2),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_positions() {
    let tokens = tokenize("a\n  b").expect("lex should succeed");
    assert_eq!(tokens[0].pos.line, 1);
    assert_eq!(tokens[0].pos.col, 1);
    // `b` is on line 2, column 3
    assert_eq!(tokens[2].pos.line, 2);
    assert_eq!(tokens[2].pos.col, 3);
}

#[test]
fn lex_error_reports_position() {
    let err = tokenize("a $ b").expect_err("lex should fail");
    assert_eq!(err.pos.line, 1);
    assert_eq!(err.pos.col, 3);
}
