use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::smart_pointer::{copy_ref, new_cell_ref};

use crate::error::Unwind;

use crate::token::Token;
use crate::object::{InstanceRef, Object};

use crate::stmt::Stmt;

use crate::interpreter::Interpreter;

use crate::environment::{Environment, EnvironmentRef};

/// Anything a call expression can dispatch to: user functions and natives.
///
pub trait LoxCallable {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind>;
    fn to_string(&self) -> String;
}

/// A user-defined function: the declaration plus the environment that was current
/// when it was declared.  Calls run against that closure, not against whatever is
/// current at the call site.
///
pub struct LoxFunction {
    name: Token,
    parameters: Vec<Token>,
    body: Vec<Rc<Stmt>>,
    closure: Option<EnvironmentRef>,
    is_initializer: bool,
}

impl LoxFunction {
    /// Factory method to create a new LoxFunction!  Only takes Stmt::Function.
    ///
    pub fn new(declaration: Rc<Stmt>, closure: Option<EnvironmentRef>, is_initializer: bool) -> LoxFunction {
        if let Stmt::Function(name, parameters, body) = declaration.as_ref() {
            return LoxFunction {
                name: name.copy(),
                parameters: parameters.to_vec(),
                body: body.to_vec(),
                closure,
                is_initializer,
            };
        }
        panic!("only takes functions!");
    }

    /// Produces the bound form of this function: the same declaration closing over an
    /// extra frame with the receiver at slot 0, where `this` resolves.
    ///
    pub fn bind(&self, instance: InstanceRef) -> LoxFunction {
        let mut environment = Environment::new(self.closure.clone());
        environment.define(Object::Instance(copy_ref!(&instance)));

        LoxFunction {
            name: self.name.copy(),
            parameters: self.parameters.to_vec(),
            body: self.body.to_vec(),
            closure: Some(new_cell_ref!(environment)),
            is_initializer: self.is_initializer,
        }
    }

    // Initializers always produce the receiver, which bind() placed at slot 0 of the
    // closure frame.
    //
    fn bound_this(&self) -> Object {
        match &self.closure {
            Some(environment) => Environment::get_at(copy_ref!(environment), 0, 0),
            None => Object::Nil,
        }
    }
}

impl LoxCallable for LoxFunction {
    // Returns the number of parameters.
    //
    fn arity(&self) -> usize {
        self.parameters.len()
    }

    // Runs the function!!  Parameters fill the first slots of a fresh frame hanging
    // off the closure; Return unwinds stop here and become the call's value.
    //
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
        let mut environment = Environment::new(self.closure.clone());

        for argument in arguments {
            environment.define(argument);
        }

        match interpreter.execute_block(&self.body, new_cell_ref!(environment)) {
            Ok(()) => {
                if self.is_initializer {
                    return Ok(self.bound_this());
                }
                Ok(Object::Nil)
            }
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    return Ok(self.bound_this());
                }
                Ok(value)
            }
            Err(other) => Err(other),
        }
    }

    // The function's display form.
    //
    fn to_string(&self) -> String {
        if self.name.lexeme.is_empty() {
            return String::from("<anonymous fn>");
        }
        format!("<fn {}>", self.name.lexeme)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}
