//! Rill CLI.

mod commands;
mod tracing_setup;

use commands::{lex_file, parse_file, repl, run_file};

fn main() {
    tracing_setup::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: rill run <file.rl>");
                std::process::exit(1);
            }
            run_file(&args[2]);
        }
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: rill parse <file.rl>");
                std::process::exit(1);
            }
            parse_file(&args[2]);
        }
        "lex" => {
            if args.len() < 3 {
                eprintln!("Usage: rill lex <file.rl>");
                std::process::exit(1);
            }
            lex_file(&args[2]);
        }
        "repl" => repl(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Rill scripting language");
    println!();
    println!("Usage:");
    println!("  rill run <file.rl>     Execute a script");
    println!("  rill parse <file.rl>   Dump the AST");
    println!("  rill lex <file.rl>     Dump the token stream");
    println!("  rill repl              Interactive prompt");
    println!("  rill help              Show this help");
}
