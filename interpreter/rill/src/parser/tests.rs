use crate::ast::{ExprKind, StmtKind};

use super::parse;

fn program(src: &str) -> Vec<crate::ast::Stmt> {
    match parse(src).expect("parse should succeed").kind {
        StmtKind::Stmts(stmts) => stmts,
        other => panic!("expected statement list, got {other:?}"),
    }
}

#[test]
fn parse_var_and_expr() {
    let stmts = program("var a = 1; var b = 2; a + b");
    assert_eq!(stmts.len(), 3);
    assert!(matches!(&stmts[0].kind, StmtKind::Var { names, .. } if names == &["a"]));
    assert!(matches!(&stmts[2].kind, StmtKind::Expr(_)));
}

#[test]
fn parse_multi_var() {
    let stmts = program("var a, b = 1, 2");
    match &stmts[0].kind {
        StmtKind::Var { names, exprs } => {
            assert_eq!(names, &["a", "b"]);
            assert_eq!(exprs.len(), 2);
        }
        other => panic!("expected var, got {other:?}"),
    }
}

#[test]
fn parse_named_func() {
    let stmts = program("func add(a, b) { return a + b }");
    match &stmts[0].kind {
        StmtKind::Expr(e) => match &e.kind {
            ExprKind::Func(decl) => {
                assert_eq!(decl.name, "add");
                assert_eq!(decl.params, vec!["a", "b"]);
                assert!(!decl.variadic);
            }
            other => panic!("expected func literal, got {other:?}"),
        },
        other => panic!("expected expr stmt, got {other:?}"),
    }
}

#[test]
fn parse_variadic_method() {
    let stmts = program("func Point.scale(fs...) { }");
    match &stmts[0].kind {
        StmtKind::Expr(e) => match &e.kind {
            ExprKind::Func(decl) => {
                assert_eq!(decl.receiver.as_deref(), Some("Point"));
                assert_eq!(decl.name, "scale");
                assert!(decl.variadic);
            }
            other => panic!("expected func literal, got {other:?}"),
        },
        other => panic!("expected expr stmt, got {other:?}"),
    }
}

#[test]
fn parse_if_chain() {
    let stmts = program("if a { } else if b { } else { }");
    match &stmts[0].kind {
        StmtKind::If { elifs, els, .. } => {
            assert_eq!(elifs.len(), 1);
            assert!(els.is_some());
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn parse_for_forms() {
    assert!(matches!(
        &program("for { break }")[0].kind,
        StmtKind::Loop { cond: None, .. }
    ));
    assert!(matches!(
        &program("for a < 3 { }")[0].kind,
        StmtKind::Loop { cond: Some(_), .. }
    ));
    match &program("for k, v in m { }")[0].kind {
        StmtKind::ForIn { names, .. } => assert_eq!(names, &["k", "v"]),
        other => panic!("expected for-in, got {other:?}"),
    }
    assert!(matches!(
        &program("for var i = 0; i < 3; i = i + 1 { }")[0].kind,
        StmtKind::CFor {
            init: Some(_),
            cond: Some(_),
            post: Some(_),
            ..
        }
    ));
}

#[test]
fn parse_try_catch_finally() {
    match &program("try { } catch e { } finally { }")[0].kind {
        StmtKind::Try {
            catch_name,
            catch,
            finally,
            ..
        } => {
            assert_eq!(catch_name.as_deref(), Some("e"));
            assert!(catch.is_some());
            assert!(finally.is_some());
        }
        other => panic!("expected try, got {other:?}"),
    }
}

#[test]
fn parse_call_forms() {
    match &program("f(xs...)")[0].kind {
        StmtKind::Expr(e) => {
            assert!(matches!(
                &e.kind,
                ExprKind::Call { variadic: true, propagate: false, .. }
            ));
        }
        other => panic!("expected call, got {other:?}"),
    }
    match &program("f(1)?")[0].kind {
        StmtKind::Expr(e) => {
            assert!(matches!(&e.kind, ExprKind::Call { propagate: true, .. }));
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn parse_chan_statements() {
    assert!(matches!(
        &program("v <- ch")[0].kind,
        StmtKind::Chan { ok: None, .. }
    ));
    assert!(matches!(
        &program("v, ok <- ch")[0].kind,
        StmtKind::Chan { ok: Some(_), .. }
    ));
}

#[test]
fn parse_switch_cases() {
    match &program("switch x { case 1, 2: y = 1\ncase 3: y = 2\ndefault: y = 3 }")[0].kind {
        StmtKind::Switch { cases, default, .. } => {
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[0].exprs.len(), 2);
            assert!(default.is_some());
        }
        other => panic!("expected switch, got {other:?}"),
    }
}

#[test]
fn parse_import_forms() {
    match &program("import encoding.json as js")[0].kind {
        StmtKind::Import { path, alias, local } => {
            assert_eq!(path, "encoding/json");
            assert_eq!(alias.as_deref(), Some("js"));
            assert!(!local);
        }
        other => panic!("expected import, got {other:?}"),
    }
    match &program("import \"./lib\"")[0].kind {
        StmtKind::Import { path, local, .. } => {
            assert_eq!(path, "./lib");
            assert!(*local);
        }
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn parse_struct_decl() {
    match &program("struct Point { x, y: int }")[0].kind {
        StmtKind::Struct { name, fields } => {
            assert_eq!(name, "Point");
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[1].type_name.as_deref(), Some("int"));
        }
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn parse_record_literal_not_in_header() {
    // In an if header, `{` opens the body even after an identifier.
    let stmts = program("if ok { x = Point{x: 1} }");
    assert!(matches!(&stmts[0].kind, StmtKind::If { .. }));
}

#[test]
fn parse_addr_and_deref() {
    match &program("f(&x)")[0].kind {
        StmtKind::Expr(e) => match &e.kind {
            ExprKind::Call { args, .. } => {
                assert!(matches!(&args[0].kind, ExprKind::Addr(_)));
            }
            other => panic!("expected call, got {other:?}"),
        },
        other => panic!("expected expr, got {other:?}"),
    }
    assert!(matches!(
        &program("*p = 1")[0].kind,
        StmtKind::Lets { .. }
    ));
}

#[test]
fn parse_go_requires_call() {
    assert!(matches!(&program("go f(1)")[0].kind, StmtKind::Go(_)));
    assert!(parse("go 1 + 2").is_err());
}

#[test]
fn parse_multiline_program() {
    let src = "\nfunc mk() {\n  var x = 0\n  return func() {\n    x = x + 1\n    return x\n  }\n}\nvar c = mk()\nc()\n";
    let stmts = program(src);
    assert_eq!(stmts.len(), 3);
}

#[test]
fn parse_slice_forms() {
    for src in ["s[1:2]", "s[:2]", "s[1:]", "s[:]"] {
        match &program(src)[0].kind {
            StmtKind::Expr(e) => assert!(matches!(&e.kind, ExprKind::Slice { .. })),
            other => panic!("expected slice, got {other:?}"),
        }
    }
}
