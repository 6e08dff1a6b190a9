//! Syntax tree produced by the [`Parser`](crate::parser::Parser) and consumed
//! read‑only by the resolver and the interpreter.
//!
//! Nodes borrow their tokens from the scanner's token buffer, so the whole
//! tree lives exactly as long as that buffer (`'a`).  Nodes that name a
//! variable (`Variable`, `Assign`, `This`, `Super`) carry an [`ExprId`]: the
//! node's *identity*, which keys the resolver's distance table.  Two
//! textually identical occurrences get different ids and are resolved
//! independently.

use serde::Serialize;

use crate::token::Token;

/// Identity of a variable‑referencing expression node.  Allocated by the
/// parser, unique within one parsed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree and
/// do **not** retain a reference to the originating [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>, // `AND` or `OR`
        right: Box<Expr<'a>>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr<'a>>,
        then_branch: Box<Expr<'a>>,
        else_branch: Box<Expr<'a>>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr<'a>>),

    /// Variable access.
    Variable { id: ExprId, name: &'a Token<'a> },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Function‑, method‑ or class‑call expression
    /// *Example:* `clock()` or `Point(1, 2)`
    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// object.property
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    /// object.property = value
    Set {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: &'a Token<'a> },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: &'a Token<'a>,
        method: &'a Token<'a>,
    },

    /// Anonymous function: `fun (a, b) { ... }`
    Lambda {
        /// The `fun` keyword.
        keyword: &'a Token<'a>,
        params: Vec<&'a Token<'a>>,
        body: Vec<Stmt<'a>>,
    },
}

impl<'a> Expr<'a> {
    /// Line of the token that best locates this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Unary { operator, .. }
            | Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. } => operator.line,
            Expr::Ternary { condition, .. } => condition.line(),
            Expr::Grouping(inner) => inner.line(),
            Expr::Variable { name, .. } | Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } | Expr::Set { name, .. } => name.line,
            Expr::This { keyword, .. }
            | Expr::Super { keyword, .. }
            | Expr::Lambda { keyword, .. } => keyword.line,
        }
    }
}

/// Named function: top‑level `fun`, or a method / getter / static inside a
/// class body.  Getters always have an empty parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<'a> {
    pub name: &'a Token<'a>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<&'a Token<'a>>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt<'a>>,
}

/// `class Name < MixinA, MixinB { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl<'a> {
    pub name: &'a Token<'a>,

    /// Superclass references in declaration order; each is an
    /// [`Expr::Variable`].
    pub mixins: Vec<Expr<'a>>,

    pub methods: Vec<FunctionDecl<'a>>,
    pub getters: Vec<FunctionDecl<'a>>,
    pub statics: Vec<FunctionDecl<'a>>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr<'a>),

    /// `print` statement used for output.
    Print(Expr<'a>),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt<'a>>),

    /// `if` / `else` conditional.
    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `while` loop.  `for` loops are lowered into this node with
    /// `is_for_loop` set; the increment then lives at the end of `body`.
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
        is_for_loop: bool,
    },

    Break { keyword: &'a Token<'a> },

    Continue { keyword: &'a Token<'a> },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(FunctionDecl<'a>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: &'a Token<'a>,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr<'a>>,
    },

    Class(ClassDecl<'a>),
}
