use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Unwind;

use crate::interpreter::{Clock, Interpreter};

use crate::lox_function::{LoxCallable, LoxFunction};
use crate::lox_class::LoxClass;
use crate::lox_instance::LoxInstance;

pub type FunctionRef = Rc<LoxFunction>;
pub type ClassRef = Rc<LoxClass>;
pub type InstanceRef = Rc<RefCell<LoxInstance>>;

/// Object.
///
/// Enumeration of all the types of values that can be used in Lox.
///
#[derive(Debug, Clone)]
pub enum Object {
    String(String),
    Number(f64),
    Boolean(bool),
    Function(FunctionRef),

    Class(ClassRef),
    Instance(InstanceRef),

    ClockFunction(Clock),
    Nil,
}

impl Object {
    /// Converts any value into a boolean.
    ///
    /// Object::Nil is false.
    /// Object::Boolean(false) is false.
    /// Everything else is true, including zero and the empty string.
    ///
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Nil => false,
            Object::Boolean(value) => *value,
            _ => true,
        }
    }

    /// Converts Object to a 64 bit number.  Caller should check is_number() first.  If not a number, panics.
    ///
    pub fn to_number(&self) -> f64 {
        match self {
            Object::Number(number) => *number,
            _ => panic!("invalid cast!"),
        }
    }

    /// Returns true if a number, false otherwise.
    ///
    pub fn is_number(&self) -> bool {
        matches!(self, Object::Number(_))
    }

    /// Returns true if a string, false otherwise.
    ///
    pub fn is_string(&self) -> bool {
        matches!(self, Object::String(_))
    }

    /// The number of arguments this value expects when called, or None if it is not callable.
    ///
    pub fn arity(&self) -> Option<usize> {
        match self {
            Object::Function(function) => Some(function.arity()),
            Object::Class(class) => Some(class.arity()),
            Object::ClockFunction(native) => Some(native.arity()),
            _ => None,
        }
    }

    /// Invokes a callable value.  Callers check arity() first; calling anything else panics.
    ///
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
        match self {
            Object::Function(function) => function.call(interpreter, arguments),
            Object::Class(class) => LoxClass::construct(class, interpreter, arguments),
            Object::ClockFunction(native) => native.call(interpreter, arguments),
            _ => panic!("not callable"),
        }
    }

    /// Returns a copy of Object.  All complex objects are behind references, so this stays cheap.
    ///
    pub fn copy(&self) -> Object {
        self.clone()
    }
}

impl fmt::Display for Object {
    /// The user-visible form, as produced by `print`.
    ///
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::String(string) => write!(f, "{}", string),
            Object::Number(number) => write!(f, "{}", number),
            Object::Boolean(value) => write!(f, "{}", if *value { "true" } else { "false" }),
            Object::Function(function) => write!(f, "{}", function.to_string()),
            Object::Class(class) => write!(f, "{}", class.to_string()),
            Object::Instance(instance) => write!(f, "{}", instance.borrow().to_string()),
            Object::ClockFunction(native) => write!(f, "{}", native.to_string()),
            Object::Nil => write!(f, "nil"),
        }
    }
}

impl PartialEq for Object {
    /// Nil only equals nil.  Strings, numbers, and booleans compare by value; functions,
    /// classes, and instances compare by identity.
    ///
    fn eq(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Nil, Object::Nil) => true,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Number(a), Object::Number(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Class(a), Object::Class(b)) => Rc::ptr_eq(a, b),
            (Object::Instance(a), Object::Instance(b)) => Rc::ptr_eq(a, b),
            (Object::ClockFunction(_), Object::ClockFunction(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use crate::object::Object;
    use crate::lox_class::LoxClass;

    // Yeah, this is weird, but Object::String still needs to be converted to String.
    //
    #[test]
    fn object_string_to_string() {
        let string = Object::String(String::from("ABC"));

        assert_eq!("ABC", string.to_string());
    }

    // Numbers without a decimal should be displayed without a decimal.
    //
    #[test]
    fn object_integer_to_string() {
        let number = Object::Number(1.0);

        assert_eq!("1", number.to_string());
    }

    // Numbers with a decimal should be displayed with a decimal.
    //
    #[test]
    fn object_number_to_string() {
        let number = Object::Number(3.14);

        assert_eq!("3.14", number.to_string());
    }

    // Tests that false is converted to string properly.
    //
    #[test]
    fn object_false_to_string() {
        let object = Object::Boolean(false);

        assert_eq!("false", object.to_string());
    }

    // Tests that true is converted to string properly.
    //
    #[test]
    fn object_true_to_string() {
        let object = Object::Boolean(true);

        assert_eq!("true", object.to_string());
    }

    // Object::Nil should be displayed as "nil".
    //
    #[test]
    fn object_nil_to_string() {
        let object = Object::Nil;

        assert_eq!("nil", object.to_string());
    }

    // Classes display with their name.
    //
    #[test]
    fn object_class_to_string() {
        let class = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        assert_eq!("<class Bagel>", Object::Class(class).to_string());
    }

    // Nil is falsey, and so is false.
    //
    #[test]
    fn object_truthiness_false() {
        assert_eq!(false, Object::Nil.is_truthy());
        assert_eq!(false, Object::Boolean(false).is_truthy());
    }

    // Everything else is truthy, including zero and the empty string.
    //
    #[test]
    fn object_truthiness_true() {
        assert_eq!(true, Object::Boolean(true).is_truthy());
        assert_eq!(true, Object::Number(0.0).is_truthy());
        assert_eq!(true, Object::String(String::new()).is_truthy());
    }

    // Values of different types are never equal, and nil only equals nil.
    //
    #[test]
    fn object_equality_across_types() {
        assert_eq!(Object::Nil, Object::Nil);
        assert_ne!(Object::Nil, Object::Number(0.0));
        assert_ne!(Object::Number(1.0), Object::String("1".to_owned()));
    }

    // Classes compare by identity, not by name.
    //
    #[test]
    fn object_equality_class_identity() {
        let first = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));
        let second = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        assert_eq!(Object::Class(Rc::clone(&first)), Object::Class(Rc::clone(&first)));
        assert_ne!(Object::Class(first), Object::Class(second));
    }
}
