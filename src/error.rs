// ABOUTME: Error types for scanning, parsing, and evaluation failures

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] scan error: {message}")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl ScanError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ScanError {
            line,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] syntax error at '{lexeme}': {message}")]
pub struct ParseError {
    pub line: usize,
    pub lexeme: String,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, lexeme: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError {
            line,
            lexeme: lexeme.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("runtime error: {message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        RuntimeError::new(format!("undefined variable '{name}'"))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::new(message)
    }

    pub fn arity_error(expected: usize, actual: usize) -> Self {
        RuntimeError::new(format!("expected {expected} arguments but got {actual}"))
    }

    pub fn not_callable() -> Self {
        RuntimeError::new("can only call functions and classes")
    }
}
