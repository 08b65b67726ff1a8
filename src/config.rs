// ABOUTME: Version info and REPL banner constants for the CLI driver

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "Lox tree-walking interpreter";
pub const WELCOME_SUBTITLE: &str = "Type an expression or statement; Ctrl-D or 'exit' quits.";

pub const REPL_HELP_TEXT: &str = r#"
Available REPL commands:
  help         - Show this message
  exit, quit   - Exit the REPL
  Ctrl-D       - Exit the REPL

Type any Lox statement or expression to evaluate it.
"#;
