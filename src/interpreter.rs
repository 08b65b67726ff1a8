// ABOUTME: Evaluator: walks the AST against a chain of lexical environments

use crate::ast::{Expr, Stmt};
use crate::callable::{Callable, NativeFunction, UserFunction};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::token::{Literal, TokenKind};
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Statement execution either completes normally or unwinds a `return`.
/// Kept as an explicit, inspectable result variant rather than an
/// exception-like mechanism (see the design notes on return-as-control-flow).
#[derive(Debug, Clone)]
pub enum Signal {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<Environment>,
    env: Rc<Environment>,
    out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        install_globals(&globals);
        Interpreter {
            globals: globals.clone(),
            env: globals,
            out,
        }
    }

    /// Runs a full program: statements execute in source order, and the
    /// first runtime error aborts the run.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(Signal::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{value}").expect("write to output sink failed");
                Ok(Signal::Normal)
            }
            Stmt::VarDecl { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.env.define(name.lexeme.clone(), value);
                Ok(Signal::Normal)
            }
            Stmt::Block(stmts) => {
                let child = Environment::with_parent(self.env.clone());
                self.execute_block(stmts, child)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.evaluate(cond)?.is_truthy() {
                    match self.execute(body)? {
                        Signal::Normal => {}
                        signal => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::Fun { name, params, body } => {
                let function = UserFunction::new(
                    name.clone(),
                    params.clone(),
                    body.clone(),
                    self.env.clone(),
                );
                self.env
                    .define(name.lexeme.clone(), Value::Callable(Rc::new(function)));
                Ok(Signal::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(value))
            }
        }
    }

    /// Executes `stmts` against `env`, restoring the previous environment on
    /// the way out (used for blocks and for user-function call frames).
    pub fn execute_block(
        &mut self,
        stmts: &[Stmt],
        env: Rc<Environment>,
    ) -> Result<Signal, RuntimeError> {
        let previous = std::mem::replace(&mut self.env, env);

        let mut result = Ok(Signal::Normal);
        for stmt in stmts {
            match self.execute(stmt) {
                Ok(Signal::Normal) => {}
                Ok(signal) => {
                    result = Ok(signal);
                    break;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        self.env = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(token) => Ok(literal_value(token)),
            Expr::Variable(name) => self.env.get(&name.lexeme),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { op, right } => self.eval_unary(op.kind, right),
            Expr::Binary { left, op, right } => self.eval_binary(left, op.kind, right),
            Expr::Logical { left, op, right } => self.eval_logical(left, op.kind, right),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.env.set(&name.lexeme, value.clone())?;
                Ok(value)
            }
            Expr::Call {
                callee,
                args,
                paren: _,
            } => self.eval_call(callee, args),
        }
    }

    fn eval_unary(&mut self, op: TokenKind, right: &Expr) -> Result<Value, RuntimeError> {
        let right = self.evaluate(right)?;
        match op {
            TokenKind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(RuntimeError::type_error(format!(
                    "operand of unary '-' must be a number, got {}",
                    other.type_name()
                ))),
            },
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("scanner/parser only produce '!' and '-' as unary operators"),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: TokenKind, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        use TokenKind::*;
        match op {
            Plus => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (a, b) => Err(RuntimeError::type_error(format!(
                    "operands of '+' must both be numbers or both be strings, got {} and {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
            Minus => numeric_binary(left, right, "-", |a, b| a - b),
            Star => numeric_binary(left, right, "*", |a, b| a * b),
            Slash => numeric_binary(left, right, "/", |a, b| a / b),
            Greater => ordering_binary(left, right, |o| o.is_gt()),
            GreaterEqual => ordering_binary(left, right, |o| o.is_ge()),
            Less => ordering_binary(left, right, |o| o.is_lt()),
            LessEqual => ordering_binary(left, right, |o| o.is_le()),
            EqualEqual => Ok(Value::Bool(left.lox_eq(&right))),
            BangEqual => Ok(Value::Bool(!left.lox_eq(&right))),
            _ => unreachable!("scanner/parser only produce binary operators here"),
        }
    }

    fn eval_logical(&mut self, left: &Expr, op: TokenKind, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        match op {
            TokenKind::Or if left.is_truthy() => Ok(left),
            TokenKind::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn eval_call(&mut self, callee: &Expr, arg_exprs: &[Expr]) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.evaluate(arg)?);
        }

        let Value::Callable(callable) = callee else {
            return Err(RuntimeError::not_callable());
        };

        if args.len() != callable.arity() {
            return Err(RuntimeError::arity_error(callable.arity(), args.len()));
        }

        callable.call(self, args)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(token: &crate::token::Token) -> Value {
    match &token.literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
        Literal::None => match token.kind {
            TokenKind::Nil => Value::Nil,
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            other => unreachable!("literal token with no literal payload: {other:?}"),
        },
    }
}

fn numeric_binary(
    left: Value,
    right: Value,
    op: &str,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(a, b))),
        (a, b) => Err(RuntimeError::type_error(format!(
            "operands of '{op}' must both be numbers, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn ordering_binary(
    left: Value,
    right: Value,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match a.partial_cmp(&b) {
            Some(ordering) => Ok(Value::Bool(f(ordering))),
            None => Ok(Value::Bool(false)),
        },
        (Value::String(a), Value::String(b)) => Ok(Value::Bool(f(a.cmp(&b)))),
        (a, b) => Err(RuntimeError::type_error(format!(
            "comparison operands must both be numbers or both be strings, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn install_globals(globals: &Rc<Environment>) {
    globals.define(
        "clock",
        Value::Callable(Rc::new(NativeFunction::new("clock", 0, |_args| {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock is before the Unix epoch")
                .as_millis();
            Ok(Value::Number(millis as f64 / 1000.0))
        }))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn run_captured(src: &str) -> Result<String, RuntimeError> {
        let tokens = Scanner::new(src).scan_tokens().unwrap();
        let stmts = Parser::new(tokens).parse().unwrap();
        let captured = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut interp = Interpreter::with_writer(Box::new(CapturingWriter(captured.clone())));
        interp.interpret(&stmts)?;
        let bytes = captured.borrow().clone();
        Ok(String::from_utf8(bytes).unwrap())
    }

    struct CapturingWriter(Rc<std::cell::RefCell<Vec<u8>>>);

    impl Write for CapturingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_string_concatenation() {
        let out = run_captured(r#"print "hello" + ", " + "world" + "!";"#).unwrap();
        assert_eq!(out, "hello, world!\n");
    }

    #[test]
    fn test_variable_shadowing_in_nested_blocks() {
        let out = run_captured(
            r#"
            var a = "global";
            { var a = "outer"; { var a = "inner"; print a; } print a; }
            print a;
            "#,
        )
        .unwrap();
        assert_eq!(out, "inner\nouter\nglobal\n");
    }

    #[test]
    fn test_fibonacci_recursion() {
        let out = run_captured(
            "fun fib(n) { if (n <= 1) return n; return fib(n-2)+fib(n-1); } print fib(10);",
        )
        .unwrap();
        assert_eq!(out, "55\n");
    }

    #[test]
    fn test_for_loop_desugaring_and_assignment() {
        let out = run_captured(
            r#"
            var a = 0; var temp;
            for (var b = 1; a < 10; b = temp + b) { print a; temp = a; a = b; }
            "#,
        )
        .unwrap();
        assert_eq!(out, "0\n1\n1\n2\n3\n5\n8\n");
    }

    #[test]
    fn test_short_circuit_no_side_effect_and_no_undefined_error() {
        let out = run_captured(
            r#"
            print nil or "default";
            print "first" and "second";
            print false and undefined_name;
            "#,
        )
        .unwrap();
        assert_eq!(out, "default\nsecond\nfalse\n");
    }

    #[test]
    fn test_mixed_type_addition_is_runtime_error() {
        let err = run_captured(r#"print 1 + "a";"#).unwrap_err();
        assert!(err.message.contains('+'));
    }

    #[test]
    fn test_cross_kind_equality_is_false_not_error() {
        let out = run_captured(r#"print 1 == "1";"#).unwrap();
        assert_eq!(out, "false\n");
    }

    #[test]
    fn test_nested_closures_capture_declaring_scope() {
        let out = run_captured(
            r#"
            fun makeCounter() {
              var count = 0;
              fun increment() { count = count + 1; return count; }
              return increment;
            }
            var counter = makeCounter();
            print counter();
            print counter();
            "#,
        )
        .unwrap();
        assert_eq!(out, "1\n2\n");
    }

    #[test]
    fn test_arity_mismatch_is_runtime_error_without_running_body() {
        let err = run_captured("fun f(a, b) { print \"ran\"; } f(1);").unwrap_err();
        assert!(err.message.contains("expected 2 arguments but got 1"));
    }

    #[test]
    fn test_return_exits_enclosing_function_from_nested_loop() {
        let out = run_captured(
            r#"
            fun firstEven(n) {
              var i = 0;
              while (i < n) {
                if (i / 2 * 2 == i) { return i; }
                i = i + 1;
              }
              return -1;
            }
            print firstEven(7);
            "#,
        )
        .unwrap();
        assert_eq!(out, "0\n");
    }

    #[test]
    fn test_calling_non_callable_is_runtime_error() {
        let err = run_captured("var x = 1; x();").unwrap_err();
        assert!(err.message.contains("can only call"));
    }

    #[test]
    fn test_clock_builtin_returns_number() {
        let out = run_captured("print clock() >= 0;").unwrap();
        assert_eq!(out, "true\n");
    }

    #[test]
    fn test_nan_ordering_is_false_not_a_runtime_error() {
        let out = run_captured(
            r#"
            var n = 0 / 0;
            print n < 1;
            print n <= 1;
            print n > 1;
            print n >= 1;
            "#,
        )
        .unwrap();
        assert_eq!(out, "false\nfalse\nfalse\nfalse\n");
    }
}
