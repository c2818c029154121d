use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use std::collections::HashMap;

use ahash::RandomState;

use crate::smart_pointer::{copy_ref, new_cell_ref};

use crate::error::Unwind;

use crate::object::{ClassRef, Object};
use crate::lox_function::{LoxCallable, LoxFunction};

use crate::interpreter::Interpreter;
use crate::lox_instance::LoxInstance;

/// A Lox class: a name, an optional superclass, and a method table.  Calling the
/// class constructs an instance.
///
pub struct LoxClass {
    pub name: String,
    superclass: Option<ClassRef>,
    methods: HashMap<String, LoxFunction, RandomState>,
}

impl LoxClass {
    /// Factory method to create a new LoxClass!
    ///
    pub fn new(name: &str, superclass: Option<ClassRef>, methods: HashMap<String, LoxFunction, RandomState>) -> LoxClass {
        LoxClass { name: name.to_owned(), superclass, methods }
    }

    /// The class's display form.
    ///
    pub fn to_string(&self) -> String {
        format!("<class {}>", self.name)
    }

    /// Finds a method, searching up the superclass chain.
    ///
    pub fn find_method(&self, name: &str) -> Option<&LoxFunction> {
        if let Some(method) = self.methods.get(name) {
            return Some(method);
        }

        match &self.superclass {
            Some(superclass) => superclass.find_method(name),
            None => None,
        }
    }

    /// A class's arity is its initializer's arity, or zero without one.
    ///
    pub fn arity(&self) -> usize {
        match self.find_method("init") {
            Some(initializer) => initializer.arity(),
            None => 0,
        }
    }

    /// Calling a class builds an instance.  When an `init` method exists it runs
    /// bound to the new instance; the instance is the result either way.
    ///
    pub fn construct(class: &ClassRef, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
        let instance = new_cell_ref!(LoxInstance::new(copy_ref!(class)));

        if let Some(initializer) = class.find_method("init") {
            initializer.bind(copy_ref!(&instance)).call(interpreter, arguments)?;
        }

        Ok(Object::Instance(instance))
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use crate::lox_class::LoxClass;

    // Tests LoxClass's display form.
    //
    #[test]
    fn lox_class_to_string() {
        let uut = LoxClass::new("Breakfast", None, HashMap::default());

        assert_eq!("<class Breakfast>", uut.to_string());
    }

    // A class without an initializer takes no arguments.
    //
    #[test]
    fn lox_class_arity_without_init() {
        let uut = LoxClass::new("Breakfast", None, HashMap::default());

        assert_eq!(0, uut.arity());
    }

    // Method lookup misses cleanly on an empty class, with or without a superclass.
    //
    #[test]
    fn lox_class_find_method_missing() {
        let base = Rc::new(LoxClass::new("Base", None, HashMap::default()));
        let child = LoxClass::new("Child", Some(base), HashMap::default());

        assert!(child.find_method("cook").is_none());
    }
}
