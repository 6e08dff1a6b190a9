//! Runtime values and the callable protocol.
//!
//! `Value` is cheap to clone: primitives are copied, everything with identity
//! (functions, classes, instances, file handles) sits behind an `Rc` and
//! compares by pointer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::{FunctionDecl, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::natives::LoxFile;
use crate::token::Token;

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction<'a>>),
    /// User function, method, getter or lambda.
    Function(Rc<LoxFunction<'a>>),
    Class(Rc<LoxClass<'a>>),
    Instance(Rc<RefCell<LoxInstance<'a>>>),
    /// Opaque handle returned by `open`.
    File(Rc<RefCell<LoxFile>>),
}

impl<'a> Value<'a> {
    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// View this value through the uniform call interface, if callable.
    pub fn as_callable(&self) -> Option<&dyn Callable<'a>> {
        match self {
            Value::NativeFunction(native) => Some(native.as_ref()),
            Value::Function(function) => Some(function.as_ref()),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::NativeFunction(_) | Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::File(_) => "file",
        }
    }
}

impl<'a> PartialEq for Value<'a> {
    /// Value equality without coercion; reference types compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // 3.0 → "3", 3.5 → "3.5"
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name),

            Value::Function(function) => match function.name {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<lambda>"),
            },

            Value::Class(class) => write!(f, "{}", class.name()),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class().name()),

            Value::File(file) => write!(f, "<file {}>", file.borrow().path()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callable protocol
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can appear in callee position.
pub trait Callable<'a> {
    /// Exact number of arguments accepted.
    fn arity(&self) -> usize;

    /// Invoke with arguments whose count already matches [`arity`](Self::arity).
    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>)
        -> Result<Value<'a>>;
}

/// Host function pointer.  A returned `Err` is a native failure message.
pub type NativeFn<'a> = fn(&[Value<'a>]) -> std::result::Result<Value<'a>, String>;

pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn<'a>,
}

impl<'a> fmt::Debug for NativeFunction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(LoxError::Native)
    }
}

/// A user function, method, getter or lambda paired with its closure frame.
pub struct LoxFunction<'a> {
    /// `None` for lambdas.
    name: Option<&'a str>,
    params: &'a [&'a Token<'a>],
    body: &'a [Stmt<'a>],
    closure: EnvRef<'a>,
    is_initializer: bool,
    is_getter: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(
        declaration: &'a FunctionDecl<'a>,
        closure: EnvRef<'a>,
        is_initializer: bool,
        is_getter: bool,
    ) -> Self {
        LoxFunction {
            name: Some(declaration.name.lexeme),
            params: &declaration.params,
            body: &declaration.body,
            closure,
            is_initializer,
            is_getter,
        }
    }

    pub fn lambda(params: &'a [&'a Token<'a>], body: &'a [Stmt<'a>], closure: EnvRef<'a>) -> Self {
        LoxFunction {
            name: None,
            params,
            body,
            closure,
            is_initializer: false,
            is_getter: false,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    pub fn is_getter(&self) -> bool {
        self.is_getter
    }

    pub fn is_initializer(&self) -> bool {
        self.is_initializer
    }

    /// Copy of this function whose closure is a fresh frame holding `this`.
    pub fn bind(&self, instance: Value<'a>) -> LoxFunction<'a> {
        let mut frame: Environment<'a> = Environment::with_enclosing(Rc::clone(&self.closure));
        frame.define("this", instance);

        LoxFunction {
            name: self.name,
            params: self.params,
            body: self.body,
            closure: frame.into_ref(),
            is_initializer: self.is_initializer,
            is_getter: self.is_getter,
        }
    }
}

impl<'a> fmt::Debug for LoxFunction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name)
            .field("arity", &self.params.len())
            .field("is_initializer", &self.is_initializer)
            .field("is_getter", &self.is_getter)
            .finish()
    }
}

impl<'a> Callable<'a> for LoxFunction<'a> {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Calling {}", self.name.unwrap_or("<lambda>"));

        let mut frame: Environment<'a> = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.params.iter().zip(arguments) {
            frame.define(param.lexeme, argument);
        }

        let flow: Flow<'a> = interpreter.execute_block(self.body, frame.into_ref())?;

        if self.is_initializer {
            // Initializers always yield the instance, even on a bare `return;`.
            return environment::get_at(&self.closure, 0, "this")
                .map_err(|_| LoxError::Native("Initializer is not bound to an instance.".into()));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            // `break` / `continue` never cross a call boundary.
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Nil),
        }
    }
}
