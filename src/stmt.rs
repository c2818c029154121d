use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// The statement forms of Lox.  `For` is the shape a three-clause `for` loop takes
/// after desugaring: a `While` that still owns its increment, so `continue` can run
/// the increment before re-testing the condition.
///
#[derive(PartialEq, Debug)]
pub enum Stmt {
    Block(Vec<Rc<Stmt>>),
    Break(Token),
    Class(Token, Expr, Vec<Rc<Stmt>>),
    Continue(Token),
    Expression(Expr),
    For(Expr, Rc<Stmt>, Expr),
    Function(Token, Vec<Token>, Vec<Rc<Stmt>>),
    If(Expr, Rc<Stmt>, Rc<Stmt>),
    Print(Expr),
    Return(Token, Box<Expr>),
    Var(Token, Expr),
    While(Expr, Rc<Stmt>),
    None,
}
