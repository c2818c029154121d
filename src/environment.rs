use std::collections::HashMap;

use std::cell::RefCell;
use std::rc::Rc;

use ahash::RandomState;

use crate::object::Object;
use crate::token::Token;

use crate::error::{runtime_error, RuntimeError};

pub type EnvironmentRef = Rc<RefCell<Environment>>;

/// Environment for one local scope.  Locals are addressed by slot index, never by
/// name: the resolver assigns slots in declaration order, and definitions at runtime
/// push values in the same order.  The enclosing environments create a "cactus"
/// structure with multiple owners needing mutable access, so we use the reference
/// counting cell pattern to implement it.  A closure keeps its chain alive for as
/// long as the callable itself lives.
///
#[derive(Debug)]
pub struct Environment {
    pub enclosing: Option<EnvironmentRef>,
    slots: Vec<Object>,
}

impl Environment {
    /// Factory method to create a new Environment inside an enclosing one.  The
    /// enclosing environment is None for frames that hang directly off the global
    /// scope.
    ///
    pub fn new(enclosing: Option<EnvironmentRef>) -> Environment {
        Environment { enclosing, slots: Vec::new() }
    }

    /// Defines the next local of this scope, returning the slot it landed in.
    ///
    pub fn define(&mut self, value: Object) -> usize {
        self.slots.push(value);
        self.slots.len() - 1
    }

    /// Reads a slot from an ancestor environment.  The parameter "depth" is how many
    /// hops up the ancestor chain reach the correct scope.
    ///
    pub fn get_at(self_ref: EnvironmentRef, depth: usize, slot: usize) -> Object {
        Environment::ancestor(self_ref, depth).borrow().slots.get(slot).cloned().unwrap_or(Object::Nil)
    }

    /// Writes a slot in an ancestor environment.  The parameter "depth" is how many
    /// hops up the ancestor chain reach the correct scope.
    ///
    pub fn assign_at(self_ref: EnvironmentRef, depth: usize, slot: usize, value: Object) {
        let environment = Environment::ancestor(self_ref, depth);
        let mut environment = environment.borrow_mut();

        if slot >= environment.slots.len() {
            environment.slots.resize(slot + 1, Object::Nil);
        }
        environment.slots[slot] = value;
    }

    // Hops up the ancestor chain by "depth".
    //
    fn ancestor(self_ref: EnvironmentRef, depth: usize) -> EnvironmentRef {
        let mut environment = self_ref;

        for _ in 0..depth {
            let enclosing = environment.borrow().enclosing.clone();
            match enclosing {
                Some(parent) => environment = parent,
                None => break,
            }
        }
        environment
    }
}

/// The global scope.  Globals stay name-keyed because a session never sees the whole
/// program at once: the REPL feeds the interpreter one line at a time, so the
/// resolver cannot slot them.
///
#[derive(Debug)]
pub struct GlobalEnvironment {
    values: HashMap<String, Object, RandomState>,
}

impl GlobalEnvironment {
    /// Factory method to create an empty global scope.
    ///
    pub fn new() -> GlobalEnvironment {
        GlobalEnvironment { values: HashMap::default() }
    }

    /// Defines a global variable.  Declaring a name twice is an error, even at the
    /// top level.
    ///
    /// # Errors
    ///
    /// Returns a runtime error if the name is already defined.
    ///
    pub fn define(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            return Err(runtime_error!(name, format!("Variable '{}' is already defined.", name.lexeme)));
        }
        self.values.insert(name.to_lexeme(), value);
        Ok(())
    }

    /// Registers a built-in under a fixed name.
    ///
    pub fn define_native(&mut self, name: &str, value: Object) {
        self.values.insert(String::from(name), value);
    }

    /// Gets a global variable.
    ///
    /// # Errors
    ///
    /// Returns a runtime error if the variable is not defined.
    ///
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        match self.values.get(&name.lexeme) {
            Some(value) => Ok(value.copy()),
            None => Err(runtime_error!(name, format!("Undefined variable '{}'.", name.lexeme))),
        }
    }

    /// Assigns a value to an existing global variable.
    ///
    /// # Errors
    ///
    /// Returns a runtime error if the variable is not defined.
    ///
    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.to_lexeme(), value);
            return Ok(());
        }
        Err(runtime_error!(name, format!("Undefined variable '{}'.", name.lexeme)))
    }
}
