use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use ahash::RandomState;

use crate::error::{runtime_error, RuntimeError};

use crate::token::Token;
use crate::object::{ClassRef, InstanceRef, Object};

/// One object: a class plus this instance's own fields.  Fields shadow methods on
/// lookup, and methods come back bound to the instance they were found through.
///
pub struct LoxInstance {
    class: ClassRef,
    fields: HashMap<String, Object, RandomState>,
}

impl LoxInstance {
    /// Factory method to create a new LoxInstance!
    ///
    pub fn new(class: ClassRef) -> LoxInstance {
        LoxInstance { class, fields: HashMap::default() }
    }

    /// The instance's display form.
    ///
    pub fn to_string(&self) -> String {
        format!("<instance of {}>", self.class.name)
    }

    /// Gets a property value from the instance: fields first, then the class's
    /// methods up the superclass chain, bound to this instance.
    ///
    /// # Errors
    ///
    /// Returns a runtime error if the property is undefined.
    ///
    pub fn get(&self, name: &Token, instance: InstanceRef) -> Result<Object, RuntimeError> {
        if let Some(value) = self.fields.get(&name.lexeme) {
            return Ok(value.copy());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            let function = method.bind(instance);

            return Ok(Object::Function(Rc::new(function)));
        }
        Err(runtime_error!(name, format!("Undefined property '{}'.", name.lexeme)))
    }

    /// Sets a property value, unconditionally.
    ///
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.to_lexeme(), value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::smart_pointer::{copy_ref, new_cell_ref};

    use crate::object::Object;
    use crate::token::{token, Token, TokenType};

    use crate::lox_class::LoxClass;
    use crate::lox_instance::LoxInstance;

    use std::cell::RefCell;
    use std::rc::Rc;
    use std::collections::HashMap;

    // Tests LoxInstance's display form.
    //
    #[test]
    fn lox_instance_to_string() {
        let class = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        let uut = LoxInstance::new(class);

        assert_eq!("<instance of Bagel>", uut.to_string());
    }

    // Test LoxInstance get field.
    //
    #[test]
    fn lox_instance_get() {
        let class = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        let mut uut = LoxInstance::new(class);

        let name = &token!(TokenType::Identifier, "flavor", Object::Nil, 1);
        uut.set(name, Object::Number(123.0));

        let uut = new_cell_ref!(uut);
        let instance = copy_ref!(&uut);

        let result = uut.borrow().get(name, instance).expect("should be defined");

        assert_eq!(Object::Number(123.0), result);
    }

    // Test LoxInstance get of an undefined field.
    //
    #[test]
    fn lox_instance_get_undefined() {
        let class = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        let uut = new_cell_ref!(LoxInstance::new(class));

        let name = &token!(TokenType::Identifier, "flavor", Object::Nil, 1);

        let instance = copy_ref!(&uut);
        let result = uut.borrow().get(name, instance);

        match result {
            Err(err) => assert_eq!("Undefined property 'flavor'.", err.message),
            _ => panic!("should have error"),
        }
    }

    // Setting a field overwrites any previous value.
    //
    #[test]
    fn lox_instance_set_overwrites() {
        let class = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        let uut = new_cell_ref!(LoxInstance::new(class));

        let name = &token!(TokenType::Identifier, "flavor", Object::Nil, 1);

        uut.borrow_mut().set(name, Object::Number(123.0));
        uut.borrow_mut().set(name, Object::Number(321.0));

        let instance = copy_ref!(&uut);
        assert_eq!(Object::Number(321.0), uut.borrow().get(name, instance).expect("should be defined"));
    }

    // Clones of the instance handle share the same fields.
    //
    #[test]
    fn lox_instance_clones_share_fields() {
        let class = Rc::new(LoxClass::new("Bagel", None, HashMap::default()));

        let uut = new_cell_ref!(LoxInstance::new(class));

        let name = &token!(TokenType::Identifier, "flavor", Object::Nil, 1);

        let clone = copy_ref!(&uut);
        clone.borrow_mut().set(name, Object::Number(123.0));

        let instance = copy_ref!(&uut);
        let result = uut.borrow().get(name, instance).expect("should be defined");

        assert_eq!(Object::Number(123.0), result);
    }
}
