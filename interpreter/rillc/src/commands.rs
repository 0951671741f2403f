//! CLI subcommands.

use std::io::{self, BufRead, Write};
use std::process::exit;

use tracing::debug;

use rill::{execute, lexer, packages, parse, Env, Options, Value};

fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read {path}: {e}");
            exit(1);
        }
    }
}

fn script_env() -> Env {
    let env = Env::new();
    packages::define_core(&env);
    packages::register_std();
    env
}

/// Execute a script file and print its result value.
pub fn run_file(path: &str) {
    let source = read_source(path);
    debug!(path, bytes = source.len(), "run script");
    let env = script_env();
    match execute(&env, &Options::default(), &source) {
        Ok(Value::Nil) => {}
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    }
}

/// Parse a script file and dump the AST.
pub fn parse_file(path: &str) {
    let source = read_source(path);
    match parse(&source) {
        Ok(program) => println!("{program:#?}"),
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    }
}

/// Tokenize a script file and dump the tokens.
pub fn lex_file(path: &str) {
    let source = read_source(path);
    match lexer::tokenize(&source) {
        Ok(tokens) => {
            for token in tokens {
                println!("{}:{}\t{:?}", token.pos.line, token.pos.col, token.kind);
            }
        }
        Err(e) => {
            eprintln!("lex error at {}: {}", e.pos, e.message);
            exit(1);
        }
    }
}

/// Line-per-statement loop over stdin; the environment persists across
/// lines.
pub fn repl() {
    let env = script_env();
    let options = Options::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("> ");
    let _ = stdout.flush();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if !line.trim().is_empty() {
            match execute(&env, &options, &line) {
                Ok(Value::Nil) => {}
                Ok(value) => println!("{value}"),
                Err(e) => eprintln!("error: {e}"),
            }
        }
        print!("> ");
        let _ = stdout.flush();
    }
}
