//! Abstract Syntax Tree Types
//!
//! Defines the expression, statement, and program structures consumed by
//! the interpreter. The host lexer/parser produces these nodes and stamps
//! each one with its source position.

use std::collections::HashMap;
use std::fmt;

// ─── Source Positions ─────────────────────────────────────

/// Position information for error reporting, stamped on every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ─── Operator Types ───────────────────────────────────────

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,    // ~
    NotMatch, // !~
    And,      // &&
    Or,       // ||
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

/// Assignment operators. The compound forms read the old value,
/// apply the arithmetic, and store the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

// ─── Expressions ──────────────────────────────────────────

/// An expression node: a kind plus the source position the parser saw it at.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

/// Expression node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal of any primitive kind, kept as the text the parser saw.
    Constant(String),
    /// A regex literal. Only legal as a rule predicate or as an argument
    /// to a regex-accepting built-in parameter.
    Regex(String),
    /// A named variable reference.
    Variable(String),
    /// A field reference: `$expr`.
    FieldRef(Box<Expr>),
    /// An array element reference with one or more index dimensions:
    /// `a[i]`, `a[i, j]`, ...
    ArrayRef { name: String, indices: Vec<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    PreIncrement(Box<Expr>),
    PreDecrement(Box<Expr>),
    PostIncrement(Box<Expr>),
    PostDecrement(Box<Expr>),
    Ternary {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assignment {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Array membership: `key in a` or `(k1, k2) in a` for nested arrays.
    In { keys: Vec<Expr>, array: String },
    /// A call to a built-in or user-defined function.
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    /// Attach a source position to this node.
    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }

    /// Constant from the literal text the parser saw.
    pub fn constant(text: impl Into<String>) -> Self {
        Self::new(ExprKind::Constant(text.into()), Position::default())
    }

    /// Constant from a number, rendered without a trailing `.0` when integral.
    pub fn number(n: f64) -> Self {
        let text = if n == n.trunc() && n.is_finite() && n.abs() < i64::MAX as f64 {
            format!("{}", n as i64)
        } else {
            format!("{}", n)
        };
        Self::constant(text)
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(ExprKind::Regex(pattern.into()), Position::default())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Variable(name.into()), Position::default())
    }

    pub fn field(index: Expr) -> Self {
        Self::new(ExprKind::FieldRef(Box::new(index)), Position::default())
    }

    pub fn array(name: impl Into<String>, indices: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::ArrayRef { name: name.into(), indices },
            Position::default(),
        )
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(
            ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
            Position::default(),
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary { op, operand: Box::new(operand) }, Position::default())
    }

    pub fn ternary(condition: Expr, consequent: Expr, alternate: Expr) -> Self {
        Self::new(
            ExprKind::Ternary {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            Position::default(),
        )
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::assign_op(AssignOp::Assign, target, value)
    }

    pub fn assign_op(op: AssignOp, target: Expr, value: Expr) -> Self {
        Self::new(
            ExprKind::Assignment { op, target: Box::new(target), value: Box::new(value) },
            Position::default(),
        )
    }

    pub fn in_array(keys: Vec<Expr>, array: impl Into<String>) -> Self {
        Self::new(ExprKind::In { keys, array: array.into() }, Position::default())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call { name: name.into(), args }, Position::default())
    }
}

// ─── Statements ───────────────────────────────────────────

/// A statement node: a kind plus its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

/// Statement node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement (assignment, function call, ...).
    Expr(Expr),
    /// Nested statement list.
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    ForIn {
        variable: String,
        array: String,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    /// `delete a[i, ...]`, or `delete a` (empty indices) to clear the array.
    Delete { array: String, indices: Vec<Expr> },
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    /// Attach a source position to this node.
    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr), Position::default())
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(stmts), Position::default())
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return(value), Position::default())
    }
}

// ─── Program Structure ────────────────────────────────────

/// A pattern/action rule: an optional predicate plus a statement list.
/// An absent predicate matches every record; a bare regex predicate
/// matches when the current record contains the pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub predicate: Option<Expr>,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

impl Rule {
    pub fn new(predicate: Option<Expr>, body: Vec<Stmt>) -> Self {
        Self { predicate, body, pos: Position::default() }
    }
}

/// A user-defined function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self { name: name.into(), params, body, pos: Position::default() }
    }
}

/// The top-level program structure: BEGIN rules, per-record rules,
/// END rules, and the user-defined function table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub begin: Vec<Rule>,
    pub main: Vec<Rule>,
    pub end: Vec<Rule>,
    pub functions: HashMap<String, FunctionDef>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user-defined function under its own name.
    pub fn define_function(&mut self, func: FunctionDef) {
        self.functions.insert(func.name.clone(), func);
    }
}
