//! Abstract syntax tree for the restricted language.
//!
//! `Block` is what `agentrt_core::SandboxFunction::body` bincode-encodes;
//! keeping this crate the sole owner of the AST (rather than putting it in
//! `agentrt-core`) avoids a dependency cycle, per that type's doc comment.

use serde::{Deserialize, Serialize};

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
}

/// Assignment target: a bare name, a tuple of targets (unpacking), an
/// attribute path, or a subscript — matches the LHS grammar permitted by
///"Assignment targets".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Name(String),
    Tuple(Vec<Target>),
    Attribute { obj: Box<Expr>, attr: String },
    Index { obj: Box<Expr>, index: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FStringPart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    FString(Vec<FStringPart>),
    Name(String),
    List(Vec<Expr>),
    TupleLit(Vec<Expr>),
    SetLit(Vec<Expr>),
    MapLit(Vec<(Expr, Expr)>),
    RecordLit { type_tag: Option<String>, fields: Vec<(String, Expr)> },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    BoolOp(BoolOp, Vec<Expr>),
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    Call { func: Box<Expr>, args: Vec<Expr> },
    Attribute { obj: Box<Expr>, attr: String },
    Index { obj: Box<Expr>, index: Box<Expr> },
    Ternary { cond: Box<Expr>, body: Box<Expr>, orelse: Box<Expr> },
    /// `lambda`-free inline function value, sugar for a one-statement
    /// `FuncDef` evaluated as an expression — not part of the grammar
    ///; kept out intentionally, no variant here.
}

/// One `expr as name` (or bare `expr`) clause of a `with` statement. `binding` is dropped
/// from the enclosing frame the moment the body finishes, win or lose, so it
/// never reaches `flush_dirty_state`'s mutation diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithItem {
    pub context: Expr,
    pub binding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    /// `None` means a bare `except:` clause, which the parser rejects
    /// ("an unrecognised exception class in except" is
    /// forbidden syntax) — kept as an `Option` only because the AST is also
    /// reused for validated, already-parsed handlers where this is always
    /// `Some`.
    pub kind: Option<String>,
    pub bind: Option<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Assign { targets: Vec<Target>, value: Expr },
    AugAssign { target: Target, op: BinOp, value: Expr },
    If { branches: Vec<(Expr, Block)>, orelse: Option<Block> },
    While { cond: Expr, body: Block },
    For { target: Target, iter: Expr, body: Block },
    Break,
    Continue,
    Return(Option<Expr>),
    Pass,
    FuncDef { name: String, params: Vec<String>, body: Block },
    RecordDef { name: String, fields: Vec<String> },
    Import { name: String, alias: Option<String> },
    With { items: Vec<WithItem>, body: Block },
    Try {
        body: Block,
        handlers: Vec<ExceptHandler>,
        orelse: Option<Block>,
        finally: Option<Block>,
    },
}
