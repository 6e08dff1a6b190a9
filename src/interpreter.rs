//! Tree‑walking evaluator.
//!
//! Executes a resolved program against a chain of [`Environment`] frames.
//! Variable occurrences the resolver recorded are read from exactly the frame
//! `distance` hops out; everything else goes straight to the globals.
//!
//! Non‑local exits (`return`, `break`, `continue`) travel back up as a
//! [`Flow`] value rather than as errors, so `?` only ever propagates real
//! failures.

use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance, MethodTable, Property, INITIALIZER};
use crate::environment::{self, EnvRef, Environment, LookupError};
use crate::error::{LoxError, Result};
use crate::natives;
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{Callable, LoxFunction, Value};

/// Deepest permitted nesting of calls before `Stack overflow.` is reported.
pub const MAX_CALL_DEPTH: usize = 2048;

/// Remaining native stack below which a call switches to a fresh segment.
const RED_ZONE: usize = 100 * 1024;

/// Size of each freshly allocated stack segment.
const STACK_GROWTH: usize = 1024 * 1024;

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow<'a> {
    Normal,
    Break,
    Continue,
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    globals: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: Locals,
    out: Box<dyn Write>,
    depth: usize,
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Interpreter<'a> {
    /// An interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// An interpreter whose `print` statements write to `out`.
    pub fn with_output(out: impl Write + 'static) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef<'a> = Environment::new().into_ref();

        for native in natives::all() {
            debug!("Defining native function '{}'", native.name);

            globals
                .borrow_mut()
                .define(native.name, Value::NativeFunction(Rc::new(native)));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            out: Box::new(out),
            depth: 0,
        }
    }

    pub fn globals(&self) -> &EnvRef<'a> {
        &self.globals
    }

    /// Merge a resolver's distance table into the one already held.
    pub fn add_locals(&mut self, locals: Locals) {
        debug!("Adding {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Run a resolved program.  Stops at the first runtime error and
    /// returns it; output produced before the error stays written.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>], locals: Locals) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        self.add_locals(locals);

        let result: Result<()> = statements
            .iter()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        self.out.flush()?;

        match &result {
            Ok(()) => info!("Interpretation completed successfully"),
            Err(e) => info!("Interpretation aborted: {}", e.message()),
        }

        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value<'a> = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                match initializer {
                    Some(expr) => {
                        let value: Value<'a> = self.evaluate(expr)?;
                        debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                        self.environment.borrow_mut().define(name.lexeme, value);
                    }
                    None => {
                        debug!("Variable '{}' declared without a value", name.lexeme);
                        self.environment.borrow_mut().declare(name.lexeme);
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame: Environment<'a> = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, frame.into_ref())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Continue { .. } => Ok(Flow::Continue),

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function: LoxFunction<'a> =
                    LoxFunction::new(decl, Rc::clone(&self.environment), false, false);

                self.environment
                    .borrow_mut()
                    .define(decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value<'a> = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class(decl) => {
                self.execute_class(decl)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the current frame
    /// afterwards whether or not they succeed.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: EnvRef<'a>,
    ) -> Result<Flow<'a>> {
        let previous: EnvRef<'a> = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<Flow<'a>> = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, decl: &'a ClassDecl<'a>) -> Result<()> {
        debug!("Defining class '{}'", decl.name.lexeme);

        let mut superclasses: Vec<Rc<LoxClass<'a>>> = Vec::with_capacity(decl.mixins.len());

        for mixin in &decl.mixins {
            match self.evaluate(mixin)? {
                Value::Class(class) => superclasses.push(class),
                _ => return Err(LoxError::runtime(mixin.line(), "Superclass must be a class.")),
            }
        }

        self.environment.borrow_mut().declare(decl.name.lexeme);

        let enclosing: EnvRef<'a> = Rc::clone(&self.environment);

        if let Some(first) = superclasses.first() {
            let mut frame: Environment<'a> = Environment::with_enclosing(Rc::clone(&enclosing));
            frame.define("super", Value::Class(Rc::clone(first)));
            self.environment = frame.into_ref();
        }

        let mut methods: MethodTable<'a> = MethodTable::new();
        for method in &decl.methods {
            let is_initializer: bool = method.name.lexeme == INITIALIZER;
            let function = LoxFunction::new(method, Rc::clone(&self.environment), is_initializer, false);
            methods.insert(method.name.lexeme.to_string(), Rc::new(function));
        }

        let mut getters: MethodTable<'a> = MethodTable::new();
        for getter in &decl.getters {
            let function = LoxFunction::new(getter, Rc::clone(&self.environment), false, true);
            getters.insert(getter.name.lexeme.to_string(), Rc::new(function));
        }

        let mut statics: MethodTable<'a> = MethodTable::new();
        for method in &decl.statics {
            let function = LoxFunction::new(method, Rc::clone(&self.environment), false, false);
            statics.insert(method.name.lexeme.to_string(), Rc::new(function));
        }

        let class: LoxClass<'a> =
            LoxClass::new(decl.name.lexeme, superclasses, methods, getters, statics);

        self.environment = enclosing;
        self.environment
            .borrow_mut()
            .define(decl.name.lexeme, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", decl.name.lexeme);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value<'a> = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value<'a> = self.evaluate(value)?;

                let assigned = match self.locals.get(id) {
                    Some(&distance) => {
                        environment::assign_at(&self.environment, distance, name.lexeme, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name.lexeme, value.clone()),
                };

                assigned.map_err(|e| lookup_error(e, name))?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value<'a> = self.evaluate(callee)?;

                let mut args: Vec<Value<'a>> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                let callable: &dyn Callable<'a> = callee_val.as_callable().ok_or_else(|| {
                    LoxError::runtime(paren.line, "Can only call functions and classes.")
                })?;

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    ));
                }

                self.invoke(callable, args, paren.line)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => match LoxInstance::get(&instance, name.lexeme) {
                    Some(Property::Field(value)) => Ok(value),
                    Some(Property::Method(method)) => Ok(Value::Function(Rc::new(method))),
                    Some(Property::Getter(getter)) => self.invoke(&getter, Vec::new(), name.line),
                    None => Err(undefined_property(name)),
                },

                Value::Class(class) => class
                    .find_static(name.lexeme)
                    .map(Value::Function)
                    .ok_or_else(|| undefined_property(name)),

                _ => Err(LoxError::runtime(name.line, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value<'a> = self.evaluate(value)?;
                instance.borrow_mut().set(name.lexeme, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Lambda { params, body, .. } => Ok(Value::Function(Rc::new(LoxFunction::lambda(
                params,
                body,
                Rc::clone(&self.environment),
            )))),
        }
    }

    fn evaluate_unary(&mut self, op: &Token<'a>, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        let right_val: Value<'a> = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op.line, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(
                op.line,
                format!("Invalid unary operator '{}'", op.lexeme),
            )),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        op: &Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val: Value<'a> = self.evaluate(left)?;
        let right_val: Value<'a> = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            // IEEE semantics: x / 0 is ±inf or NaN, never an error.
            TokenType::MINUS | TokenType::STAR | TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(match op.token_type {
                    TokenType::MINUS => a - b,
                    TokenType::STAR => a * b,
                    _ => a / b,
                })),
                _ => Err(LoxError::runtime(op.line, "Operands must be a number")),
            },

            TokenType::GREATER
            | TokenType::GREATER_EQUAL
            | TokenType::LESS
            | TokenType::LESS_EQUAL => {
                let ordering = match (&left_val, &right_val) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => {
                        return Err(LoxError::runtime(
                            op.line,
                            "Operands must be two numbers or two strings.",
                        ))
                    }
                };

                // NaN compares false under every operator.
                let result: bool = ordering.map_or(false, |ordering| match op.token_type {
                    TokenType::GREATER => ordering.is_gt(),
                    TokenType::GREATER_EQUAL => ordering.is_ge(),
                    TokenType::LESS => ordering.is_lt(),
                    _ => ordering.is_le(),
                });

                Ok(Value::Bool(result))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),
            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            _ => Err(LoxError::runtime(
                op.line,
                format!("Invalid binary operator '{}'", op.lexeme),
            )),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token<'a>,
        method: &Token<'a>,
    ) -> Result<Value<'a>> {
        let distance: usize = *self.locals.get(&id).ok_or_else(|| {
            LoxError::runtime(keyword.line, "Cannot use 'super' outside of a class.")
        })?;

        let superclass: Value<'a> = environment::get_at(&self.environment, distance, "super")
            .map_err(|e| lookup_error(e, keyword))?;

        // `this` always sits one frame inside `super`.
        let object: Value<'a> = distance
            .checked_sub(1)
            .ok_or(LookupError::Undefined)
            .and_then(|d| environment::get_at(&self.environment, d, "this"))
            .map_err(|_| LoxError::runtime(keyword.line, "Cannot use 'super' outside of a method."))?;

        let Value::Class(superclass) = superclass else {
            return Err(LoxError::runtime(keyword.line, "Superclass must be a class."));
        };

        match superclass.find_method(method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),
            None => Err(undefined_property(method)),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token<'a>) -> Result<Value<'a>> {
        let found = match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.environment, distance, name.lexeme),
            None => self.globals.borrow().get(name.lexeme),
        };

        found.map_err(|e| lookup_error(e, name))
    }

    /// Single entry point for every call: enforces the depth limit, grows
    /// the native stack on demand and pins native failures to `line`.
    fn invoke(
        &mut self,
        callable: &dyn Callable<'a>,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>> {
        if self.depth >= MAX_CALL_DEPTH {
            info!("Call depth limit {} reached at line {}", MAX_CALL_DEPTH, line);
            return Err(LoxError::StackOverflow { line });
        }

        self.depth += 1;
        let result: Result<Value<'a>> =
            stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || callable.call(self, arguments));
        self.depth -= 1;

        result.map_err(|e| e.at_call_site(line))
    }
}

fn lookup_error(error: LookupError, name: &Token<'_>) -> LoxError {
    match error {
        LookupError::Undefined => {
            LoxError::runtime(name.line, format!("Undefined variable '{}'.", name.lexeme))
        }
        LookupError::Uninitialized => LoxError::runtime(
            name.line,
            format!("Uninitialized variable '{}'.", name.lexeme),
        ),
    }
}

fn undefined_property(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name.line, format!("Undefined property '{}'.", name.lexeme))
}

/// Returns true if two Values are considered equal.
pub fn is_equal<'a>(a: &Value<'a>, b: &Value<'a>) -> bool {
    a == b
}
