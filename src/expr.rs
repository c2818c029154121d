use std::rc::Rc;

use crate::token::Token;
use crate::object::Object;
use crate::stmt::Stmt;

pub type ExprRef = Box<Expr>;

/// Identity of a variable-referencing expression, assigned by the parser and used as
/// the key into the resolution side-table.  Ids stay unique for the lifetime of an
/// interpreter session, so resolutions recorded for earlier REPL lines keep working.
pub type ExprId = u32;

#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Assign(ExprId, Token, ExprRef),
    Binary(ExprRef, Token, ExprRef),
    Call(ExprRef, Token, Vec<Expr>),
    Function(Rc<Stmt>),
    Get(ExprRef, Token),
    Grouping(ExprRef),
    Literal(Object),
    Logical(ExprRef, Token, ExprRef),
    Set(ExprRef, Token, ExprRef),
    Super(ExprId, Token, Token),
    This(ExprId, Token),
    Unary(Token, ExprRef),
    Variable(ExprId, Token),

    None,
}

macro_rules! number {
    ($a:expr) => {
        Box::new(Expr::Literal(Object::Number($a)))
    };
}

macro_rules! boolean {
    ($a:expr) => {
        Box::new(Expr::Literal(Object::Boolean($a)))
    };
}

macro_rules! literal {
    ($a:expr) => {
        Box::new(Expr::Literal($a))
    };
}

macro_rules! this {
    ($a:expr,$b:expr) => {
        Box::new(Expr::This($a, $b))
    };
}

macro_rules! super_expr {
    ($a:expr,$b:expr,$c:expr) => {
        Box::new(Expr::Super($a, $b, $c))
    };
}

macro_rules! grouping {
    ($a:expr) => {
        Box::new(Expr::Grouping($a))
    };
}

macro_rules! variable {
    ($a:expr,$b:expr) => {
        Box::new(Expr::Variable($a, $b))
    };
}

macro_rules! assign {
    ($a:expr,$b:expr,$c:expr) => {
        Box::new(Expr::Assign($a, $b, $c))
    };
}

macro_rules! binary {
    ($a:expr,$b:expr,$c:expr) => {
        Box::new(Expr::Binary($a, $b, $c))
    };
}

macro_rules! logical {
    ($a:expr,$b:expr,$c:expr) => {
        Box::new(Expr::Logical($a, $b, $c))
    };
}

macro_rules! call {
    ($a:expr,$b:expr,$c:expr) => {
        Box::new(Expr::Call(Box::new($a), $b, $c))
    };
}

macro_rules! unary {
    ($a:expr,$b:expr) => {
        Box::new(Expr::Unary($a, $b))
    };
}

macro_rules! get {
    ($a:expr,$b:expr) => {
        Box::new(Expr::Get($a, $b))
    };
}

macro_rules! set {
    ($a:expr,$b:expr,$c:expr) => {
        Box::new(Expr::Set($a, $b, $c))
    };
}

pub(crate) use {number, boolean, literal, assign, grouping, binary, logical, call, unary, variable, get, set, this, super_expr};
