use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::process::ExitCode;
use vhisp::ast::Value;
use vhisp::builtinops::Dialect;
use vhisp::evaluator::{self, Environment};
use vhisp::parser::ParseConfig;
use vhisp::{Error, evaluate_with_config};

/// Interactive interpreter for Vhisp S-expressions
#[derive(Debug, Parser)]
#[command(name = "vhisp", version, about)]
struct Args {
    /// Reproduce the historical `len` and `pow` behaviour
    #[arg(long)]
    faithful: bool,

    /// Maximum list nesting depth accepted by the parser
    #[arg(long, value_name = "N", default_value_t = vhisp::MAX_PARSE_DEPTH)]
    max_depth: usize,

    /// Evaluate an expression and print its result instead of starting the REPL (repeatable)
    #[arg(short, long = "eval", value_name = "EXPR")]
    eval: Vec<String>,

    /// Do not print the banner
    #[arg(short, long)]
    quiet: bool,
}

/// Install a log subscriber when `RUST_LOG` is set, so REPL output stays clean otherwise
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let dialect = if args.faithful {
        Dialect::Faithful
    } else {
        Dialect::Corrected
    };
    let config = ParseConfig {
        max_depth: args.max_depth,
    };
    let mut env = evaluator::create_global_env_with_dialect(dialect);

    if !args.eval.is_empty() {
        return run_expressions(&args.eval, config, &mut env);
    }

    if !args.quiet {
        println!("Vhisp 0.5");
        println!("Press Ctrl+c to exit.");
        println!();
    }

    match run_repl(config, &mut env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vhisp: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Evaluate each expression against one environment and print its result
fn run_expressions(exprs: &[String], config: ParseConfig, env: &mut Environment) -> ExitCode {
    let mut status = ExitCode::SUCCESS;
    for expr in exprs {
        if !print_result(expr, config, env) {
            status = ExitCode::FAILURE;
        }
    }
    status
}

/// Evaluate one line and print the result. Returns false if the line did not parse.
fn print_result(line: &str, config: ParseConfig, env: &mut Environment) -> bool {
    tracing::debug!(line, "evaluating");
    match evaluate_with_config(line, config, env) {
        Ok(value) => {
            println!("{value}");
            true
        }
        Err(err @ Error::Eval(_)) => {
            println!("{err}");
            true
        }
        Err(err @ Error::Parse(_)) => {
            println!("{err}");
            false
        }
    }
}

/// What the REPL does with one input line
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Help,
    Env,
    Quit,
    /// Any other line, including an empty one, is evaluated
    Eval(&'a str),
}

fn classify(line: &str) -> ReplCommand<'_> {
    match line.trim() {
        ":help" => ReplCommand::Help,
        ":env" => ReplCommand::Env,
        ":quit" | ":exit" => ReplCommand::Quit,
        expr => ReplCommand::Eval(expr),
    }
}

fn run_repl(config: ParseConfig, env: &mut Environment) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("vhisp% ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.trim());
                }

                match classify(&line) {
                    ReplCommand::Help => print_help(),
                    ReplCommand::Env => print_environment(env),
                    ReplCommand::Quit => break,
                    ReplCommand::Eval(expr) => {
                        print_result(expr, config, env);
                    }
                }
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Expressions:");
    println!("  Numbers: 42, -5");
    println!("  S-expressions are evaluated: (+ 1 2)");
    println!("  Q-expressions are quoted data: {{1 2 3}}");
    println!("  The whole line is an S-expression: + 1 2");
    println!();
    println!("Builtins:");
    println!("  Arithmetic: + - * / % ^ & | < > (add sub mul div mod pow exp and or min max)");
    println!("  Lists: list head tail join eval len");
    println!();
    println!("Examples:");
    println!("  (- 10 3 2)");
    println!("  (head {{1 2 3}})");
    println!("  (eval (join {{+}} {{1 2}}))");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Function(_) => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        for row in builtins.chunks(4) {
            for name in row {
                print!("  {name:<15}");
            }
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_lines() {
        let cases = [
            (":help", ReplCommand::Help),
            ("  :env ", ReplCommand::Env),
            (":quit", ReplCommand::Quit),
            (":exit", ReplCommand::Quit),
            ("(+ 1 2)", ReplCommand::Eval("(+ 1 2)")),
            (" + 1 2\t", ReplCommand::Eval("+ 1 2")),
            ("", ReplCommand::Eval("")),
            ("   ", ReplCommand::Eval("")),
            (":other", ReplCommand::Eval(":other")),
        ];

        for (line, expected) in cases {
            assert_eq!(classify(line), expected, "line: {line:?}");
        }
    }

    #[test]
    fn test_empty_line_evaluates_to_empty_sexpr() {
        let mut env = evaluator::create_global_env();
        let ReplCommand::Eval(expr) = classify("  ") else {
            panic!("blank lines are evaluated");
        };
        assert_eq!(
            evaluate_with_config(expr, ParseConfig::default(), &mut env),
            Ok(Value::sexpr())
        );
        assert!(print_result(expr, ParseConfig::default(), &mut env));
    }
}
