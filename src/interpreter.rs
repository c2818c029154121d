use std::time::{SystemTime, UNIX_EPOCH};
use std::collections::HashMap;
use std::cell::RefCell;
use std::rc::Rc;

use ahash::RandomState;

use crate::lox::Lox;

use crate::error::{runtime_error, RuntimeError, Unwind};

use crate::smart_pointer::{copy_ref, new_cell_ref};

use crate::object::{ClassRef, Object};
use crate::token::{Token, TokenType};

use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;

use crate::visitor::Visitor;

use crate::environment::{Environment, EnvironmentRef, GlobalEnvironment};
use crate::lox_function::{LoxCallable, LoxFunction};
use crate::lox_class::LoxClass;
use crate::resolver::Loc;

/// Clock.  Implements the native function clock().
///
#[derive(Debug, Clone)]
pub struct Clock;

impl LoxCallable for Clock {
    /// Takes no arguments.
    ///
    fn arity(&self) -> usize {
        0
    }

    /// Milliseconds since the epoch, as a Lox number.
    ///
    fn call(&self, _interpreter: &mut Interpreter, _arguments: Vec<Object>) -> Result<Object, Unwind> {
        let since_the_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards");

        Ok(Object::Number(since_the_epoch.as_millis() as f64))
    }

    /// Display value is <native fn>.
    ///
    fn to_string(&self) -> String {
        String::from("<native fn>")
    }
}

/// Interpreter.  Runs a syntax tree created by Scanner and Parser, after Resolver has
/// filled in `locals`.
///
/// Globals live in a name-keyed map; every other variable is reached through the
/// current environment chain by the `(depth, slot)` the resolver recorded for its
/// expression id.  `environment` is None while executing at the top level.
///
/// # Example
///
/// ```
/// let mut scanner = Scanner::new(String::from("var test = 5.0;"));
/// scanner.scan_tokens();
///
/// let mut parser = Parser::new(scanner.tokens);
/// let stmts = parser.parse();
/// let mut interpreter = Interpreter::new();
///
/// interpreter.interpret(&stmts);
///
/// let name = token!(TokenType::Identifier, "test", Object::Nil, 1);
/// let value = interpreter.globals.borrow().get(&name).expect("should be found");
///
/// assert_eq!(Object::Number(5.0), value);
/// ```
pub struct Interpreter {
    pub globals: Rc<RefCell<GlobalEnvironment>>,
    pub locals: HashMap<ExprId, Loc, RandomState>,
    environment: Option<EnvironmentRef>,
}

impl Interpreter {
    /// Factory method to create a new Interpreter.  Sets up the global scope and
    /// registers native functions.
    ///
    /// # Native Functions
    ///
    /// clock() - see: Clock
    ///
    pub fn new() -> Interpreter {
        let globals = new_cell_ref!(GlobalEnvironment::new());
        globals.borrow_mut().define_native("clock", Object::ClockFunction(Clock));

        Interpreter { globals, locals: HashMap::default(), environment: None }
    }

    /// Executes a single statement.  If a problem is encountered, returns the unwind.
    ///
    pub fn execute(&mut self, stmt: &Rc<Stmt>) -> Result<(), Unwind> {
        self.visit_stmt(stmt)
    }

    /// Runs a list of statements.  The first runtime error is reported and stops the
    /// program.
    ///
    pub fn interpret(&mut self, statements: &Vec<Rc<Stmt>>) {
        for statement in statements {
            match self.visit_stmt(statement) {
                Ok(()) => (),
                Err(Unwind::Error(err)) => {
                    Lox::runtime_error(err);
                    return;
                }
                Err(_) => panic!("loop control escaped the top level"),
            }
        }
    }

    /// Executes a list of statements inside the given environment, restoring the
    /// previous environment on every exit path, including unwinds.
    ///
    pub fn execute_block(&mut self, statements: &Vec<Rc<Stmt>>, environment: EnvironmentRef) -> Result<(), Unwind> {
        let previous = self.environment.replace(environment);

        let mut result = Ok(());
        for statement in statements {
            result = self.visit_stmt(statement);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    // Evaluates an expression.
    //
    fn evaluate(&mut self, expr: &Expr) -> Result<Object, Unwind> {
        self.visit_expr(expr)
    }

    // Returns a runtime error if both operands are not numbers.
    //
    fn check_number_operands(left: &Object, right: &Object, operator: &Token) -> Result<(), RuntimeError> {
        if !left.is_number() || !right.is_number() {
            return Err(runtime_error!(operator, "Operands must be numbers."));
        }
        Ok(())
    }

    // Reads a variable.  A side-table entry routes the read through the environment
    // chain by depth and slot; everything else is a global, looked up by name.
    //
    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Object, RuntimeError> {
        if let (Some(loc), Some(environment)) = (self.locals.get(&id), &self.environment) {
            return Ok(Environment::get_at(copy_ref!(environment), loc.depth, loc.slot));
        }
        self.globals.borrow().get(name)
    }
}

impl Visitor for Interpreter {
    type Error = Unwind;

    // Assigns a value to a variable, through the slot path for resolved locals and by
    // name for globals.  The assigned value is the value of the expression.
    //
    fn visit_assign(&mut self, id: ExprId, name: &Token, value: &Expr) -> Result<Object, Unwind> {
        let value = self.evaluate(value)?;

        if let (Some(loc), Some(environment)) = (self.locals.get(&id), &self.environment) {
            Environment::assign_at(copy_ref!(environment), loc.depth, loc.slot, value.copy());
        }
        else {
            self.globals.borrow_mut().assign(name, value.copy())?;
        }
        Ok(value)
    }

    // Evaluates a binary expression.  Valid operators are Minus, Slash, Star, Plus,
    // Greater, GreaterEqual, Less, LessEqual, BangEqual, and EqualEqual.
    //
    // # Errors
    //
    // Both left and right must be numbers for Minus, Slash, Star, Greater,
    // GreaterEqual, Less, and LessEqual.  Division by zero is an error.  For Plus, the
    // operands must be two numbers or two strings.
    //
    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, Unwind> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::Minus => {
                Self::check_number_operands(&left, &right, operator)?;
                Ok(Object::Number(left.to_number() - right.to_number()))
            }

            TokenType::Slash => {
                Self::check_number_operands(&left, &right, operator)?;
                if right.to_number() == 0.0 {
                    return Err(runtime_error!(operator, "Division by zero.").into());
                }
                Ok(Object::Number(left.to_number() / right.to_number()))
            }

            TokenType::Star => {
                Self::check_number_operands(&left, &right, operator)?;
                Ok(Object::Number(left.to_number() * right.to_number()))
            }

            // Adds numbers or concatenates strings.
            TokenType::Plus => {
                if left.is_number() && right.is_number() {
                    return Ok(Object::Number(left.to_number() + right.to_number()));
                }
                if left.is_string() && right.is_string() {
                    return Ok(Object::String(format!("{}{}", left, right)));
                }
                Err(runtime_error!(operator, "Operands must be two numbers or two strings.").into())
            }

            TokenType::Greater => {
                Self::check_number_operands(&left, &right, operator)?;
                Ok(Object::Boolean(left.to_number() > right.to_number()))
            }

            TokenType::GreaterEqual => {
                Self::check_number_operands(&left, &right, operator)?;
                Ok(Object::Boolean(left.to_number() >= right.to_number()))
            }

            TokenType::Less => {
                Self::check_number_operands(&left, &right, operator)?;
                Ok(Object::Boolean(left.to_number() < right.to_number()))
            }

            TokenType::LessEqual => {
                Self::check_number_operands(&left, &right, operator)?;
                Ok(Object::Boolean(left.to_number() <= right.to_number()))
            }

            TokenType::BangEqual => Ok(Object::Boolean(left != right)),
            TokenType::EqualEqual => Ok(Object::Boolean(left == right)),

            _ => panic!("not a binary operator"),
        }
    }

    // Calls a function, class, or native.
    //
    // # Errors
    //
    // Returns a runtime error if passed the wrong number of arguments.
    // Returns a runtime error if the callee is not callable.
    //
    fn visit_call(&mut self, callee: &Expr, paren: &Token, args: &Vec<Expr>) -> Result<Object, Unwind> {
        let callee = self.evaluate(callee)?;

        let mut arguments = Vec::new();
        for argument in args {
            arguments.push(self.evaluate(argument)?);
        }

        match callee.arity() {
            Some(arity) => {
                if arguments.len() != arity {
                    let message = format!("Expected {} arguments but got {}.", arity, arguments.len());
                    return Err(runtime_error!(paren, message).into());
                }
                callee.call(self, arguments)
            }
            None => Err(runtime_error!(paren, "Can only call functions and classes.").into()),
        }
    }

    // An anonymous function literal closes over the environment it appears in.
    //
    fn visit_anon_function(&mut self, declaration: &Rc<Stmt>) -> Result<Object, Unwind> {
        let function = LoxFunction::new(copy_ref!(declaration), self.environment.clone(), false);

        Ok(Object::Function(Rc::new(function)))
    }

    // Evaluates a property read.  Fields win over methods; methods come back bound to
    // the instance.
    //
    // # Errors
    //
    // Returns a runtime error when reading a property of a non-instance, or a
    // property that is not defined.
    //
    fn visit_get(&mut self, object: &Expr, name: &Token) -> Result<Object, Unwind> {
        let object = self.evaluate(object)?;

        if let Object::Instance(instance) = object {
            let value = instance.borrow().get(name, copy_ref!(&instance))?;
            return Ok(value);
        }
        Err(runtime_error!(name, "Only instances have properties.").into())
    }

    // Evaluates the inside expression and returns the value.
    //
    fn visit_grouping(&mut self, expr: &Expr) -> Result<Object, Unwind> {
        self.evaluate(expr)
    }

    // Returns the literal's value.
    //
    fn visit_literal(&mut self, value: &Object) -> Result<Object, Unwind> {
        Ok(value.copy())
    }

    // Executes the logical operators "or" and "and" with short-circuit evaluation.
    // The result is the deciding operand's value, not a coerced boolean.
    //
    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, Unwind> {
        let left = self.evaluate(left)?;

        match operator.token_type {
            TokenType::Or => {
                if left.is_truthy() {
                    return Ok(left);
                }
            }
            TokenType::And => {
                if !left.is_truthy() {
                    return Ok(left);
                }
            }
            _ => panic!("not a logical operator"),
        }
        self.evaluate(right)
    }

    // Evaluates a property write.  The field is set unconditionally; the value is the
    // value of the expression.
    //
    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> Result<Object, Unwind> {
        let object = self.evaluate(object)?;

        if let Object::Instance(instance) = object {
            let value = self.evaluate(value)?;

            instance.borrow_mut().set(name, value.copy());

            return Ok(value);
        }

        Err(runtime_error!(name, "Only instances have fields.").into())
    }

    // Looks up a method on the superclass and binds it to the current instance.  The
    // resolver recorded the depth of the `super` frame; `this` lives one frame nearer.
    //
    fn visit_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Object, Unwind> {
        let (loc, environment) = match (self.locals.get(&id), &self.environment) {
            (Some(loc), Some(environment)) => (*loc, copy_ref!(environment)),
            _ => return Err(runtime_error!(keyword, "Can't use 'super' outside of a class.").into()),
        };

        let superclass = Environment::get_at(copy_ref!(&environment), loc.depth, 0);
        let object = Environment::get_at(environment, loc.depth - 1, 0);

        if let (Object::Class(class), Object::Instance(instance)) = (superclass, object) {
            return match class.find_method(&method.lexeme) {
                Some(function) => Ok(Object::Function(Rc::new(function.bind(instance)))),
                None => Err(runtime_error!(method, format!("Undefined property '{}'.", method.lexeme)).into()),
            };
        }
        panic!("super frame is missing its class or instance");
    }

    // `this` reads the instance bound at slot 0 of the frame the resolver pointed at.
    //
    fn visit_this(&mut self, id: ExprId, keyword: &Token) -> Result<Object, Unwind> {
        Ok(self.lookup_variable(id, keyword)?)
    }

    // Evaluates a unary expression.  Supports operators Bang and Minus.
    //
    // # Errors
    //
    // Returns a runtime error if the operand of Minus is not a number.
    //
    fn visit_unary(&mut self, operator: &Token, value: &Expr) -> Result<Object, Unwind> {
        let right = self.evaluate(value)?;

        match operator.token_type {
            TokenType::Bang => Ok(Object::Boolean(!right.is_truthy())),

            TokenType::Minus => {
                if !right.is_number() {
                    return Err(runtime_error!(operator, "Operand must be a number.").into());
                }
                Ok(Object::Number(-right.to_number()))
            }
            _ => panic!("not a unary operator"),
        }
    }

    // Gets a variable from the environment chain or the globals.
    //
    fn visit_variable(&mut self, id: ExprId, name: &Token) -> Result<Object, Unwind> {
        Ok(self.lookup_variable(id, name)?)
    }

    // Executes a block.  Creates a new environment enclosed by the current one.
    //
    fn visit_block(&mut self, stmts: &Vec<Rc<Stmt>>) -> Result<(), Unwind> {
        let environment = Environment::new(self.environment.clone());

        self.execute_block(stmts, new_cell_ref!(environment))
    }

    // Break unwinds to the nearest enclosing loop.
    //
    fn visit_break(&mut self, _keyword: &Token) -> Result<(), Unwind> {
        Err(Unwind::Break)
    }

    // Declares a class.  The superclass expression must evaluate to a class.  The
    // name is defined before the methods capture their closures, and when there is a
    // superclass the methods close over an extra frame binding `super` at slot 0.
    //
    fn visit_class(&mut self, name: &Token, superclass: &Expr, methods: &Vec<Rc<Stmt>>) -> Result<(), Unwind> {
        let mut superklass: Option<ClassRef> = None;
        if let Expr::Variable(_, super_name) = superclass {
            match self.evaluate(superclass)? {
                Object::Class(class) => superklass = Some(class),
                _ => return Err(runtime_error!(super_name, "Superclass must be a class.").into()),
            }
        }

        // Reserve the name now so methods can refer to the class once it exists.
        let slot = match &self.environment {
            Some(environment) => Some(environment.borrow_mut().define(Object::Nil)),
            None => {
                self.globals.borrow_mut().define(name, Object::Nil)?;
                None
            }
        };

        if let Some(class) = &superklass {
            let mut environment = Environment::new(self.environment.clone());
            environment.define(Object::Class(copy_ref!(class)));

            self.environment = Some(new_cell_ref!(environment));
        }

        let mut class_methods: HashMap<String, LoxFunction, RandomState> = HashMap::default();
        for method in methods {
            if let Stmt::Function(method_name, _, _) = method.as_ref() {
                let function = LoxFunction::new(
                    copy_ref!(method),
                    self.environment.clone(),
                    method_name.lexeme == "init",
                );
                class_methods.insert(method_name.to_lexeme(), function);
            }
        }

        if superklass.is_some() {
            if let Some(environment) = self.environment.take() {
                self.environment = environment.borrow().enclosing.clone();
            }
        }

        let class = Object::Class(Rc::new(LoxClass::new(&name.lexeme, superklass, class_methods)));

        match (slot, &self.environment) {
            (Some(slot), Some(environment)) => {
                Environment::assign_at(copy_ref!(environment), 0, slot, class);
            }
            _ => {
                self.globals.borrow_mut().assign(name, class)?;
            }
        }
        Ok(())
    }

    // Continue unwinds to the nearest enclosing loop, which re-tests its condition.
    //
    fn visit_continue(&mut self, _keyword: &Token) -> Result<(), Unwind> {
        Err(Unwind::Continue)
    }

    // Evaluates an expression for its effects.
    //
    fn visit_expression(&mut self, expr: &Expr) -> Result<(), Unwind> {
        self.evaluate(expr)?;
        Ok(())
    }

    // Runs the desugared three-clause loop.  The increment runs after every pass over
    // the body, including passes cut short by `continue`; `break` skips it and exits.
    //
    fn visit_for(&mut self, condition: &Expr, body: &Rc<Stmt>, increment: &Expr) -> Result<(), Unwind> {
        while self.evaluate(condition)?.is_truthy() {
            match self.visit_stmt(body) {
                Ok(()) | Err(Unwind::Continue) => (),
                Err(Unwind::Break) => break,
                Err(other) => return Err(other),
            }
            self.evaluate(increment)?;
        }
        Ok(())
    }

    // Defines a function in the current scope.  The closure is the environment at the
    // point of declaration, not at any call.
    //
    fn visit_function(&mut self, stmt: &Rc<Stmt>, name: &Token, _params: &Vec<Token>, _body: &Vec<Rc<Stmt>>) -> Result<(), Unwind> {
        let function = LoxFunction::new(copy_ref!(stmt), self.environment.clone(), false);
        let function = Object::Function(Rc::new(function));

        match &self.environment {
            Some(environment) => {
                environment.borrow_mut().define(function);
            }
            None => {
                self.globals.borrow_mut().define(name, function)?;
            }
        }
        Ok(())
    }

    // Executes an if statement.  If the condition evaluates truthy, executes the then
    // branch, otherwise the else branch when there is one.
    //
    fn visit_if(&mut self, condition: &Expr, then_branch: &Rc<Stmt>, else_branch: &Rc<Stmt>) -> Result<(), Unwind> {
        if self.evaluate(condition)?.is_truthy() {
            self.execute(then_branch)?;
        }
        else if **else_branch != Stmt::None {
            self.execute(else_branch)?;
        }
        Ok(())
    }

    // Prints a value to standard out.
    //
    fn visit_print(&mut self, expr: &Expr) -> Result<(), Unwind> {
        let object = self.evaluate(expr)?;
        println!("{}", object);
        Ok(())
    }

    // Return unwinds to the nearest call frame, carrying the value (or nil).
    //
    fn visit_return(&mut self, _keyword: &Token, value: &Expr) -> Result<(), Unwind> {
        let mut result = Object::Nil;
        if *value != Expr::None {
            result = self.evaluate(value)?;
        }
        Err(Unwind::Return(result))
    }

    // Defines a variable: a slot in the current frame, or a global at the top level.
    //
    fn visit_var(&mut self, name: &Token, initializer: &Expr) -> Result<(), Unwind> {
        let value = self.evaluate(initializer)?;

        match &self.environment {
            Some(environment) => {
                environment.borrow_mut().define(value);
            }
            None => {
                self.globals.borrow_mut().define(name, value)?;
            }
        }
        Ok(())
    }

    // Runs a while loop as long as the condition evaluates truthy.  Break exits the
    // loop; continue goes straight back to the condition test.
    //
    fn visit_while(&mut self, condition: &Expr, body: &Rc<Stmt>) -> Result<(), Unwind> {
        while self.evaluate(condition)?.is_truthy() {
            match self.visit_stmt(body) {
                Ok(()) | Err(Unwind::Continue) => (),
                Err(Unwind::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }
}
