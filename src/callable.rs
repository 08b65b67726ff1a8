// ABOUTME: Uniform callable interface shared by user functions and built-ins

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, Signal};
use crate::token::Token;
use crate::value::Value;
use std::rc::Rc;

pub trait Callable {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError>;
    fn display_name(&self) -> String;
}

/// A user-defined function, capturing the environment active at the point
/// of its `fun` declaration (proper lexical closure — §9 resolved open question).
pub struct UserFunction {
    name: String,
    params: Vec<Token>,
    body: Rc<Vec<Stmt>>,
    closure: Rc<Environment>,
}

impl UserFunction {
    pub fn new(name: Token, params: Vec<Token>, body: Vec<Stmt>, closure: Rc<Environment>) -> Self {
        UserFunction {
            name: name.lexeme,
            params,
            body: Rc::new(body),
            closure,
        }
    }
}

impl Callable for UserFunction {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let call_env = Environment::with_parent(self.closure.clone());
        for (param, arg) in self.params.iter().zip(args.into_iter()) {
            call_env.define(param.lexeme.clone(), arg);
        }

        match interpreter.execute_block(self.body.as_slice(), call_env)? {
            Signal::Return(value) => Ok(value),
            Signal::Normal => Ok(Value::Nil),
        }
    }

    fn display_name(&self) -> String {
        format!("<fn {}>", self.name)
    }
}

/// A built-in function installed directly into the global environment.
pub struct NativeFunction {
    #[allow(dead_code)]
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> Result<Value, RuntimeError>,
}

impl NativeFunction {
    pub fn new(
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, RuntimeError>,
    ) -> Self {
        NativeFunction { name, arity, func }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.func)(&args)
    }

    fn display_name(&self) -> String {
        "<nativeFn>".to_string()
    }
}
