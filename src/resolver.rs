//! Static resolver pass.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str, Binding>` tracking
//!    declared / defined / read).
//! 2. Collect static diagnostics (redeclaration, self‑read in initializer,
//!    unused locals, misplaced `return` / `break` / `continue` / `this` /
//!    `super`, self‑inheritance).  Nothing short‑circuits: one pass reports
//!    every problem in the program.
//! 3. Record, for *each* variable occurrence, how many frames out its
//!    binding lives.  Occurrences with no entry are globals.
//!
//! The scopes pushed here must mirror, one for one, the frames the
//! interpreter creates: block, function parameters, `super` (classes with
//! mixins only) and `this` (instance methods and getters only).

use crate::ast::{ClassDecl, Expr, ExprId, Stmt};
use crate::class::INITIALIZER;
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Distance table: expression identity → number of frames to walk outward.
pub type Locals = HashMap<ExprId, usize>;

/// Output of a resolver run.
#[derive(Debug, Default)]
pub struct Resolution {
    pub locals: Locals,
    /// Empty for a legal program.
    pub diagnostics: Vec<LoxError>,
}

impl Resolution {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Resolve a whole program.
pub fn resolve<'a>(statements: &'a [Stmt<'a>]) -> Resolution {
    Resolver::new().resolve(statements)
}

/// What kind of function body are we in?  Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Getter,
    Initializer,
    Method,
}

/// What kind of class body are we in?  Validates `this` / `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
    /// Inside a static method: no `this`, no `super`.
    StaticMethod,
}

/// Which loop encloses us?  Validates `break` / `continue`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoopType {
    None,
    While,
    For,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum VariableState {
    Declared,
    Defined,
    Read,
}

#[derive(Clone, Debug)]
struct Binding<'a> {
    /// `None` for the implicit `this` / `super` bindings.
    name: Option<&'a Token<'a>>,
    state: VariableState,
}

pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, Binding<'a>>>,
    locals: Locals,
    diagnostics: Vec<LoxError>,
    current_function: FunctionType,
    current_class: ClassType,
    current_loop: LoopType,
}

impl<'a> Default for Resolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            locals: Locals::new(),
            diagnostics: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            current_loop: LoopType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(mut self, statements: &'a [Stmt<'a>]) -> Resolution {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        info!(
            "Resolve pass finished: {} local(s), {} diagnostic(s)",
            self.locals.len(),
            self.diagnostics.len()
        );

        Resolution {
            locals: self.locals,
            diagnostics: self.diagnostics,
        }
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(LoxError::resolve(line, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt<'a>) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible inside its own body
                self.declare(decl.name);
                self.define(decl.name);
                self.resolve_function(&decl.params, &decl.body, FunctionType::Function);
            }

            Stmt::Class(decl) => self.resolve_class(decl),

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While {
                condition,
                body,
                is_for_loop,
            } => {
                let enclosing = self.current_loop;
                self.current_loop = if *is_for_loop {
                    LoopType::For
                } else {
                    LoopType::While
                };

                self.resolve_expr(condition);
                self.resolve_stmt(body);

                self.current_loop = enclosing;
            }

            Stmt::Break { keyword } => {
                if self.current_loop == LoopType::None {
                    self.error(keyword.line, "Cannot use 'break' outside of a loop.");
                }
            }

            Stmt::Continue { keyword } => match self.current_loop {
                LoopType::While => {}
                // The lowered increment sits at the end of the body and
                // would be skipped.
                LoopType::For => self.error(keyword.line, "Cannot use 'continue' inside for loop."),
                LoopType::None => {
                    self.error(keyword.line, "Cannot use 'continue' outside of a loop.")
                }
            },

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword.line, "Cannot return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword.line, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(&mut self, decl: &'a ClassDecl<'a>) {
        debug!("Resolving class '{}'", decl.name.lexeme);

        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        // Methods may refer to the class by name; a class never has to be
        // read to count as used.
        self.declare(decl.name);
        self.define_class(decl.name);

        // Mixins are evaluated in the enclosing frame, before `super` exists.
        for mixin in &decl.mixins {
            if let Expr::Variable { name, .. } = mixin {
                if name.lexeme == decl.name.lexeme {
                    self.error(name.line, "A class cannot inherit from itself.");
                }
            }
            self.resolve_expr(mixin);
        }

        let has_mixins: bool = !decl.mixins.is_empty();

        if has_mixins {
            self.current_class = ClassType::Subclass;
            // `super` is the first mixin only.
            self.begin_scope();
            self.bind_implicit("super");
        }

        self.begin_scope();
        self.bind_implicit("this");

        for method in &decl.methods {
            let kind: FunctionType = if method.name.lexeme == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(&method.params, &method.body, kind);
        }

        for getter in &decl.getters {
            self.resolve_function(&getter.params, &getter.body, FunctionType::Getter);
        }

        self.end_scope();

        // Statics are never bound, so they see no `this` frame.
        let class_kind = self.current_class;
        self.current_class = ClassType::StaticMethod;
        for method in &decl.statics {
            self.resolve_function(&method.params, &method.body, FunctionType::Method);
        }
        self.current_class = class_kind;

        if has_mixins {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                // Cannot read in own initializer
                let declared_here: bool = self.scopes.last().map_or(false, |scope| {
                    scope
                        .get(name.lexeme)
                        .map_or(false, |binding| binding.state == VariableState::Declared)
                });

                if declared_here {
                    self.error(name.line, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => match self.current_class {
                ClassType::None => self.error(keyword.line, "Cannot use 'this' outside of a class."),
                ClassType::StaticMethod => {
                    self.error(keyword.line, "Cannot use 'this' in a static method.")
                }
                ClassType::Class | ClassType::Subclass => self.resolve_local(*id, keyword),
            },

            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => {
                    self.error(keyword.line, "Cannot use 'super' outside of a class.")
                }
                ClassType::Class => self.error(
                    keyword.line,
                    "Cannot use 'super' in a class with no superclass.",
                ),
                ClassType::StaticMethod => {
                    self.error(keyword.line, "Cannot use 'super' in a static method.")
                }
                ClassType::Subclass => self.resolve_local(*id, keyword),
            },

            Expr::Lambda { params, body, .. } => {
                self.resolve_function(params, body, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(
        &mut self,
        params: &'a [&'a Token<'a>],
        body: &'a [Stmt<'a>],
        kind: FunctionType,
    ) {
        let enclosing_function = self.current_function;
        let enclosing_loop = self.current_loop;
        self.current_function = kind;
        self.current_loop = LoopType::None;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        for stmt in body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_function;
        self.current_loop = enclosing_loop;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope and report every binding nobody read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<&'a Token<'a>> = scope
            .values()
            .filter(|binding| binding.state != VariableState::Read)
            .filter_map(|binding| binding.name)
            .collect();
        unused.sort_by(|a, b| a.line.cmp(&b.line).then(a.lexeme.cmp(b.lexeme)));

        for name in unused {
            self.error(name.line, format!("Unused variable '{}'.", name.lexeme));
        }
    }

    fn declare(&mut self, name: &'a Token<'a>) {
        let duplicate: bool = match self.scopes.last_mut() {
            Some(scope) => scope
                .insert(
                    name.lexeme,
                    Binding {
                        name: Some(name),
                        state: VariableState::Declared,
                    },
                )
                .is_some(),
            None => false,
        };

        if duplicate {
            self.error(
                name.line,
                "Variable with this name already declared in this scope.",
            );
        }
    }

    /// Mark `name` usable.  A binding already read stays read.
    fn define(&mut self, name: &'a Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            let binding = scope.entry(name.lexeme).or_insert(Binding {
                name: Some(name),
                state: VariableState::Declared,
            });
            binding.state = binding.state.max(VariableState::Defined);
        }
    }

    /// Classes are exempt from the unused‑variable rule.
    fn define_class(&mut self, name: &'a Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.lexeme,
                Binding {
                    name: Some(name),
                    state: VariableState::Read,
                },
            );
        }
    }

    fn bind_implicit(&mut self, keyword: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                keyword,
                Binding {
                    name: None,
                    state: VariableState::Read,
                },
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        // innermost → outermost
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(binding) = scope.get_mut(name.lexeme) {
                binding.state = VariableState::Read;
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
