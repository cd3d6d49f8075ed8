extern crate momoc;

use docopt::Docopt;
use momoc::{ast_to_dot, fmt_vec, gen, lex, lower, optimize, parse, Analyzer};

const USAGE: &str = "
momoc, a batch compiler for the momo toy language.

With no file argument the program is collected from stdin a line at a time,
until a line reading 'exit'.

Usage:
  momoc [--dot] [<file>]
  momoc (-h | --help)

Options:
  --dot      Print the parse tree as a Graphviz digraph and stop.
  -h --help  Show this screen.
";

fn main() {
    env_logger::init();
    let args = Docopt::new(USAGE).and_then(|d| d.parse()).unwrap_or_else(|e| e.exit());
    let filename = args.get_str("<file>");
    let source = if filename.is_empty() {
        collect_source()
    } else {
        std::fs::read_to_string(filename).expect("could not load given file")
    };

    let tokens = match lex(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("Tokens:");
    for token in &tokens {
        println!("  ({}, {})", token.kind, token.lexeme);
    }

    let ast = match parse(tokens) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if args.get_bool("--dot") {
        print!("{}", ast_to_dot(&ast));
        return;
    }

    let mut analyzer = Analyzer::new();
    analyzer.analyze(&ast);
    println!("\nSemantic Analysis:");
    if !analyzer.errors().is_empty() {
        for error in analyzer.errors() {
            println!("{}", error);
        }
        std::process::exit(1);
    }
    println!("No errors found.");

    let ir = lower(&ast);
    println!("\nIntermediate Code (Before Optimization):");
    println!("{}", fmt_vec(&ir.instructions));

    let optimized = optimize(ir.instructions);
    println!("\nOptimized Intermediate Code:");
    println!("{}", fmt_vec(&optimized));

    let target = match gen(&optimized) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("\nTarget Code:");
    println!("{}", fmt_vec(&target));
}

/// the interactive front end: gather lines until the user types 'exit'
fn collect_source() -> String {
    use std::io::BufRead;
    println!("Please enter your code (type 'exit' to end input):");
    let stdin = std::io::stdin();
    let mut code = String::new();
    for line in stdin.lock().lines() {
        let line = line.expect("could not read from stdin");
        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }
        code.push_str(&line);
        code.push('\n');
    }
    code
}
