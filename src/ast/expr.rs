use super::position::Position;
use super::stmt::Block;
use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A single (name, declared-type, optional default) parameter, shared by
/// function declarations and lambdas.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub declared_type: Type,
    pub default: Option<Box<Expr>>,
}

/// An anonymous function literal (spec §4.1 "Lambdas"). Unlike [`FunctionDef`]
/// it carries no name and no type parameters: lambdas are captured wholesale,
/// never monomorphized.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub body: Block,
    pub position: Position,
}

/// A bound-variable reference inside a polyglot block envelope (spec §4.6,
/// §6): `<<lang[v1, v2] code >>`. The core only cares about the triple
/// `(language, code, bound_vars)`; surface syntax is the parser's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyglotBlock {
    pub language: String,
    pub code: String,
    pub bound_vars: Vec<String>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral(i64, Position),
    FloatLiteral(f64, Position),
    BoolLiteral(bool, Position),
    StringLiteral(String, Position),
    NullLiteral(Position),
    ListLiteral(Vec<Expr>, Position),
    DictLiteral(Vec<(Expr, Expr)>, Position),
    Ident(String, Position),
    StructLiteral {
        name: String,
        type_args: Vec<Type>,
        fields: Vec<(String, Expr)>,
        position: Position,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        position: Position,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        position: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        position: Position,
    },
    /// `x |> f(a1, …)`, spliced into a [`Expr::Call`] at evaluation time
    /// (spec §4.1, §8 invariant 6), not before.
    Pipeline {
        value: Box<Expr>,
        call: Box<Expr>,
        position: Position,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        position: Position,
    },
    MemberAccess {
        object: Box<Expr>,
        field: String,
        position: Position,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        position: Position,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
        position: Position,
    },
    Lambda(Lambda),
    Polyglot(PolyglotBlock),
    /// `from..to`, recognized only in a `for` loop header (spec §4.1); not a
    /// general-purpose value, see spec's Value enum (§3.1) which has no
    /// range variant.
    Range {
        from: Box<Expr>,
        to: Box<Expr>,
        position: Position,
    },
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::IntLiteral(_, p)
            | Expr::FloatLiteral(_, p)
            | Expr::BoolLiteral(_, p)
            | Expr::StringLiteral(_, p)
            | Expr::NullLiteral(p)
            | Expr::ListLiteral(_, p)
            | Expr::DictLiteral(_, p)
            | Expr::Ident(_, p)
            | Expr::StructLiteral { position: p, .. }
            | Expr::Binary { position: p, .. }
            | Expr::Logical { position: p, .. }
            | Expr::Unary { position: p, .. }
            | Expr::Pipeline { position: p, .. }
            | Expr::Call { position: p, .. }
            | Expr::MemberAccess { position: p, .. }
            | Expr::Index { position: p, .. }
            | Expr::Assignment { position: p, .. }
            | Expr::Range { position: p, .. } => p.clone(),
            Expr::Lambda(lambda) => lambda.position.clone(),
            Expr::Polyglot(block) => block.position.clone(),
        }
    }
}
