use std::rc::Rc;

use crate::object::Object;
use crate::token::Token;

use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;

/// Visitor.
///
/// Translates Rust's match structure into a more standard Visitor style for code clarity.
/// The associated Error type lets each pass fail in its own way: the resolver with a
/// static diagnostic, the interpreter with a runtime unwind.
///
pub trait Visitor {
    type Error;

    /// Matches expression and dispatches to appropriate method.
    ///
    fn visit_expr(&mut self, expr: &Expr) -> Result<Object, Self::Error> {
        match expr {
            Expr::Assign(id, name, value) => self.visit_assign(*id, name, value),
            Expr::Binary(left, operator, right) => self.visit_binary(left, operator, right),
            Expr::Call(callee, paren, args) => self.visit_call(callee, paren, args),
            Expr::Function(declaration) => self.visit_anon_function(declaration),
            Expr::Get(object, name) => self.visit_get(object, name),
            Expr::Grouping(value) => self.visit_grouping(value),
            Expr::Literal(object) => self.visit_literal(object),
            Expr::Logical(left, operator, right) => self.visit_logical(left, operator, right),
            Expr::Set(object, name, value) => self.visit_set(object, name, value),
            Expr::Super(id, keyword, method) => self.visit_super(*id, keyword, method),
            Expr::This(id, keyword) => self.visit_this(*id, keyword),
            Expr::Unary(operator, value) => self.visit_unary(operator, value),
            Expr::Variable(id, name) => self.visit_variable(*id, name),
            Expr::None => Ok(Object::Nil),
        }
    }

    /// Matches statement and dispatches to appropriate method.
    ///
    fn visit_stmt(&mut self, stmt: &Rc<Stmt>) -> Result<(), Self::Error> {
        match stmt.as_ref() {
            Stmt::Block(stmts) => self.visit_block(stmts),
            Stmt::Break(keyword) => self.visit_break(keyword),
            Stmt::Class(name, superclass, methods) => self.visit_class(name, superclass, methods),
            Stmt::Continue(keyword) => self.visit_continue(keyword),
            Stmt::Expression(expr) => self.visit_expression(expr),
            Stmt::For(condition, body, increment) => self.visit_for(condition, body, increment),
            Stmt::Function(name, params, body) => self.visit_function(stmt, name, params, body),
            Stmt::If(condition, then_branch, else_branch) => self.visit_if(condition, then_branch, else_branch),
            Stmt::Print(expr) => self.visit_print(expr),
            Stmt::Return(keyword, value) => self.visit_return(keyword, value),
            Stmt::Var(name, initializer) => self.visit_var(name, initializer),
            Stmt::While(condition, body) => self.visit_while(condition, body),
            Stmt::None => Ok(()),
        }
    }

    /// Handles Assign expression.
    ///
    fn visit_assign(&mut self, _id: ExprId, _name: &Token, _value: &Expr) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Binary expression.
    ///
    fn visit_binary(&mut self, _left: &Expr, _operator: &Token, _right: &Expr) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Call expression.
    ///
    fn visit_call(&mut self, _callee: &Expr, _paren: &Token, _args: &Vec<Expr>) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles anonymous function expression.
    ///
    fn visit_anon_function(&mut self, _declaration: &Rc<Stmt>) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Get expression.
    ///
    fn visit_get(&mut self, _object: &Expr, _name: &Token) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Grouping expression.
    ///
    fn visit_grouping(&mut self, _expr: &Expr) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Literal expression.
    ///
    fn visit_literal(&mut self, _object: &Object) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Logical expression.
    ///
    fn visit_logical(&mut self, _left: &Expr, _operator: &Token, _right: &Expr) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Set expression.
    ///
    fn visit_set(&mut self, _object: &Expr, _name: &Token, _value: &Expr) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Super expression.
    ///
    fn visit_super(&mut self, _id: ExprId, _keyword: &Token, _method: &Token) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles This expression.
    ///
    fn visit_this(&mut self, _id: ExprId, _keyword: &Token) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Unary expression.
    ///
    fn visit_unary(&mut self, _operator: &Token, _right: &Expr) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Variable expression.
    ///
    fn visit_variable(&mut self, _id: ExprId, _name: &Token) -> Result<Object, Self::Error> {
        Ok(Object::Nil)
    }

    /// Handles Block statement.
    ///
    fn visit_block(&mut self, _stmts: &Vec<Rc<Stmt>>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Break statement.
    ///
    fn visit_break(&mut self, _keyword: &Token) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Class statement.
    ///
    fn visit_class(&mut self, _name: &Token, _superclass: &Expr, _methods: &Vec<Rc<Stmt>>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Continue statement.
    ///
    fn visit_continue(&mut self, _keyword: &Token) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Expression statement.
    ///
    fn visit_expression(&mut self, _expr: &Expr) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles the desugared three-clause loop.
    ///
    fn visit_for(&mut self, _condition: &Expr, _body: &Rc<Stmt>, _increment: &Expr) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Function statement.
    ///
    fn visit_function(&mut self, _stmt: &Rc<Stmt>, _name: &Token, _params: &Vec<Token>, _body: &Vec<Rc<Stmt>>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles If statement.
    ///
    fn visit_if(&mut self, _condition: &Expr, _then_branch: &Rc<Stmt>, _else_branch: &Rc<Stmt>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Print statement.
    ///
    fn visit_print(&mut self, _expr: &Expr) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Return statement.
    ///
    fn visit_return(&mut self, _keyword: &Token, _value: &Expr) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles Var statement.
    ///
    fn visit_var(&mut self, _name: &Token, _initializer: &Expr) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles While statement.
    ///
    fn visit_while(&mut self, _condition: &Expr, _body: &Rc<Stmt>) -> Result<(), Self::Error> {
        Ok(())
    }
}
