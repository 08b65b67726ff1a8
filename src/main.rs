// ABOUTME: CLI driver: runs a script file once, or starts an interactive REPL

use clap::Parser as ClapParser;
use lox_treewalk::config::{REPL_HELP_TEXT, VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use lox_treewalk::error::{ParseError, ScanError};
use lox_treewalk::interpreter::Interpreter;
use lox_treewalk::parser::Parser;
use lox_treewalk::scanner::Scanner;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::process::ExitCode;

/// A tree-walking interpreter for a small Lox-family scripting language
#[derive(ClapParser, Debug)]
#[command(name = "lox")]
#[command(version = VERSION)]
#[command(about = "A tree-walking interpreter for a small Lox-family scripting language")]
struct CliArgs {
    /// Script file to execute (if omitted, starts a REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

const EXIT_DATAERR: u8 = 65; // scan/parse error, matches jlox's convention
const EXIT_SOFTWARE: u8 = 70; // runtime error

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match args.script {
        Some(path) => run_script(&path),
        None => {
            run_repl();
            ExitCode::SUCCESS
        }
    }
}

fn run_script(path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot read script file {}: {e}", path.display());
            return ExitCode::from(EXIT_DATAERR);
        }
    };

    let statements = match scan_and_parse(&source) {
        Ok(statements) => statements,
        Err(messages) => {
            for message in messages {
                eprintln!("{message}");
            }
            return ExitCode::from(EXIT_DATAERR);
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.interpret(&statements) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(EXIT_SOFTWARE)
        }
    }
}

/// Scans and parses `source`, collecting every diagnostic message produced
/// along the way (a scan error is fatal and reported alone; parse errors may
/// be multiple thanks to the parser's synchronization — see §4.2).
fn scan_and_parse(source: &str) -> Result<Vec<lox_treewalk::ast::Stmt>, Vec<String>> {
    let tokens = Scanner::new(source)
        .scan_tokens()
        .map_err(|e: ScanError| vec![e.to_string()])?;

    Parser::new(tokens)
        .parse()
        .map_err(|errs: Vec<ParseError>| errs.iter().map(ToString::to_string).collect())
}

fn run_repl() {
    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> = match Editor::with_config(config)
    {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to initialize REPL: {e}");
            return;
        }
    };

    let history_file = ".lox_history";
    let _ = rl.load_history(history_file);

    let mut interpreter = Interpreter::new();

    loop {
        match rl.readline("lox> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }
                if line == "help" {
                    println!("{REPL_HELP_TEXT}");
                    continue;
                }

                match scan_and_parse(line) {
                    Ok(statements) => {
                        if let Err(err) = interpreter.interpret(&statements) {
                            eprintln!("{err}");
                        }
                    }
                    Err(messages) => {
                        for message in messages {
                            eprintln!("{message}");
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}
