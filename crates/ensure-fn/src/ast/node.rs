use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{Shared, number::Number, range::Range};

use super::{IdentName, Program};

pub type Args = SmallVec<[Shared<Node>; 4]>;
pub type Params = SmallVec<[Ident; 4]>;
pub type Properties = Vec<(IdentName, Shared<Node>)>;

/// A statement. `range` is `None` for statements synthesized by a rewrite.
#[derive(PartialEq, Debug, Clone)]
pub struct Stmt {
    pub range: Option<Range>,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self { range: None, kind }
    }

    pub fn with_range(kind: StmtKind, range: Range) -> Self {
        Self {
            range: Some(range),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl Display for DeclKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DeclKind::Var => write!(f, "var"),
            DeclKind::Let => write!(f, "let"),
            DeclKind::Const => write!(f, "const"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Declarator {
    pub ident: Ident,
    pub init: Option<Shared<Node>>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum StmtKind {
    VarDecl(DeclKind, Vec<Declarator>),
    FunctionDecl(Shared<FunctionDef>),
    Return(Option<Shared<Node>>),
    If(Shared<Node>, Shared<Stmt>, Option<Shared<Stmt>>),
    While(Shared<Node>, Shared<Stmt>),
    Block(Program),
    Expr(Shared<Node>),
    Empty,
}

/// An expression. `range` is `None` for expressions synthesized by a rewrite.
#[derive(PartialEq, Debug, Clone)]
pub struct Node {
    pub range: Option<Range>,
    pub expr: Expr,
}

impl Node {
    pub fn new(expr: Expr) -> Self {
        Self { range: None, expr }
    }

    pub fn with_range(expr: Expr, range: Range) -> Self {
        Self {
            range: Some(range),
            expr,
        }
    }

    #[inline(always)]
    pub fn is_function(&self) -> bool {
        matches!(self.expr, Expr::Function(_) | Expr::Arrow(_))
    }
}

#[derive(Debug, Eq, Clone)]
pub struct Ident {
    pub name: IdentName,
    pub range: Option<Range>,
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ident {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            range: None,
        }
    }

    pub fn new_with_range(name: &str, range: Range) -> Self {
        Self {
            name: SmolStr::new(name),
            range: Some(range),
        }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::new(name)
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.name)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Literal {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The binary operator a compound assignment applies before storing.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Typeof => write!(f, "typeof "),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
        };
        write!(f, "{}", op)
    }
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
            LogicalOp::Nullish => write!(f, "??"),
        }
    }
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            AssignOp::Assign => write!(f, "="),
            AssignOp::Add => write!(f, "+="),
            AssignOp::Sub => write!(f, "-="),
            AssignOp::Mul => write!(f, "*="),
            AssignOp::Div => write!(f, "/="),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum FunctionBody {
    /// `{ ... }`, always a `StmtKind::Block`.
    Block(Shared<Stmt>),
    /// Concise arrow body: `x => x * 2`.
    Expr(Shared<Node>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDef {
    pub name: Option<Ident>,
    pub params: Params,
    pub body: FunctionBody,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Ident(Ident),
    Array(Args),
    Object(Properties),
    Member(Shared<Node>, IdentName),
    Index(Shared<Node>, Shared<Node>),
    Call(Shared<Node>, Args),
    Unary(UnaryOp, Shared<Node>),
    Binary(BinaryOp, Shared<Node>, Shared<Node>),
    Logical(LogicalOp, Shared<Node>, Shared<Node>),
    Conditional(Shared<Node>, Shared<Node>, Shared<Node>),
    Assign(AssignOp, Shared<Node>, Shared<Node>),
    Function(Shared<FunctionDef>),
    Arrow(Shared<FunctionDef>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Position;

    #[test]
    fn test_ident_equality_ignores_range() {
        let range = Range::new(Position::new(1, 1, 0), Position::new(1, 5, 4));
        assert_eq!(Ident::new("item"), Ident::new_with_range("item", range));
    }

    #[test]
    fn test_is_function() {
        let def = Shared::new(FunctionDef {
            name: None,
            params: Params::new(),
            body: FunctionBody::Expr(Shared::new(Node::new(Expr::Literal(Literal::Null)))),
        });

        assert!(Node::new(Expr::Arrow(Shared::clone(&def))).is_function());
        assert!(Node::new(Expr::Function(def)).is_function());
        assert!(!Node::new(Expr::Ident(Ident::new("f"))).is_function());
    }

    #[test]
    fn test_compound_assignment_operator() {
        assert_eq!(AssignOp::Add.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::Assign.binary_op(), None);
    }
}
