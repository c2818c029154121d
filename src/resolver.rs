use std::collections::HashMap;
use std::rc::Rc;

use ahash::RandomState;

use crate::lox::Lox;

use crate::error::ResolveError;

use crate::object::Object;
use crate::token::Token;

use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;

use crate::visitor::Visitor;

#[derive(Debug, Clone, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Where the evaluator finds a resolved local: how many environments up, and which
/// slot in that frame.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loc {
    pub depth: usize,
    pub slot: usize,
}

// One name in a scope.  `defined` flips once the initializer has run, `used` once any
// reference resolves to it, and `slot` is the frame index assigned at declaration.
//
#[derive(Debug)]
struct Local {
    defined: bool,
    used: bool,
    slot: usize,
    line: usize,
}

/// Resolver.  Semantic analysis pass that binds every local variable reference to a
/// `(depth, slot)` location for the Interpreter, and rejects statically invalid
/// programs.  Resolution stops at the first error; locals that are never read only
/// earn a warning when their scope closes.
///
pub struct Resolver {
    pub locals: HashMap<ExprId, Loc, RandomState>,
    scopes: Vec<HashMap<String, Local, RandomState>>,

    current_function: FunctionType,
    current_class: ClassType,
}

impl Resolver {
    /// Factory method to create a new Resolver.
    ///
    pub fn new() -> Resolver {
        Resolver {
            locals: HashMap::default(),
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Resolves a list of statements.
    ///
    pub fn resolve(&mut self, stmts: &Vec<Rc<Stmt>>) -> Result<(), ResolveError> {
        for stmt in stmts {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    // A function introduces a new scope holding its parameters and body locals.  The
    // caller has already declared the name when there is one.
    //
    fn resolve_function(&mut self, stmt: &Stmt, function_type: FunctionType) -> Result<(), ResolveError> {
        if let Stmt::Function(_name, params, body) = stmt {
            let enclosing_function = self.current_function.clone();
            self.current_function = function_type;

            self.begin_scope();

            let mut result = Ok(());
            for param in params {
                result = self.declare(param);
                if result.is_err() {
                    break;
                }
                self.define(param);
            }

            if result.is_ok() {
                result = self.resolve(body);
            }
            self.end_scope();

            self.current_function = enclosing_function;

            return result;
        }
        panic!("only function statements can be resolved as functions");
    }

    // Walks scopes innermost to outermost.  The first scope holding the name supplies
    // the location: its distance from the innermost scope, and the slot assigned at
    // declaration.  A reference that matches no scope is a global and gets no entry.
    //
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        let last = self.scopes.len();

        for (index, scope) in self.scopes.iter_mut().enumerate().rev() {
            if let Some(local) = scope.get_mut(&name.lexeme) {
                local.used = true;
                self.locals.insert(id, Loc { depth: last - 1 - index, slot: local.slot });
                return;
            }
        }
    }

    // Begins a new scope.
    //
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::default());
    }

    // Ends the current scope.  Anything defined but never read earns a warning; the
    // synthetic `this` and `super` bindings are created pre-used and never do.
    //
    fn end_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (name, local) in scope {
                if local.defined && !local.used {
                    Lox::warning(local.line, &format!("Local variable '{}' is never used.", name));
                }
            }
        }
    }

    // Declares a variable in the innermost scope, claiming the next slot.  Does
    // nothing at the top level; globals are not scoped.
    //
    fn declare(&mut self, name: &Token) -> Result<(), ResolveError> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(Self::error(name, "Already a variable with this name in this scope."));
            }

            let slot = scope.len();
            scope.insert(name.to_lexeme(), Local { defined: false, used: false, slot, line: name.line });
        }
        Ok(())
    }

    // Defines a variable: its initializer has run and reads are legal now.
    //
    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(local) = scope.get_mut(&name.lexeme) {
                local.defined = true;
            }
        }
    }

    // Inserts an implicit binding such as `this` or `super` at the next slot of the
    // innermost scope.  Marked used up front so it never warns.
    //
    fn declare_synthetic(&mut self, name: &str, line: usize) {
        if let Some(scope) = self.scopes.last_mut() {
            let slot = scope.len();
            scope.insert(String::from(name), Local { defined: true, used: true, slot, line });
        }
    }

    // Reports an error and returns it.
    //
    fn error(token: &Token, message: &str) -> ResolveError {
        Lox::token_error(token, message);

        ResolveError { token: token.copy(), message: String::from(message) }
    }
}

impl Visitor for Resolver {
    type Error = ResolveError;

    // Assignment expressions resolve their value, then the variable written to.
    //
    fn visit_assign(&mut self, id: ExprId, name: &Token, value: &Expr) -> Result<Object, ResolveError> {
        self.visit_expr(value)?;
        self.resolve_local(id, name);

        Ok(Object::Nil)
    }

    // Traverses the tree.
    //
    fn visit_binary(&mut self, left: &Expr, _operator: &Token, right: &Expr) -> Result<Object, ResolveError> {
        self.visit_expr(left)?;
        self.visit_expr(right)?;

        Ok(Object::Nil)
    }

    // Traverses the tree.
    //
    fn visit_call(&mut self, callee: &Expr, _paren: &Token, args: &Vec<Expr>) -> Result<Object, ResolveError> {
        self.visit_expr(callee)?;

        for arg in args {
            self.visit_expr(arg)?;
        }

        Ok(Object::Nil)
    }

    // An anonymous function resolves like a named one, minus the outer declaration.
    //
    fn visit_anon_function(&mut self, declaration: &Rc<Stmt>) -> Result<Object, ResolveError> {
        self.resolve_function(declaration, FunctionType::Function)?;

        Ok(Object::Nil)
    }

    // Traverses the tree.  Property names are looked up dynamically, so only the
    // object expression resolves.
    //
    fn visit_get(&mut self, object: &Expr, _name: &Token) -> Result<Object, ResolveError> {
        self.visit_expr(object)?;

        Ok(Object::Nil)
    }

    // Traverses the tree.
    //
    fn visit_grouping(&mut self, expr: &Expr) -> Result<Object, ResolveError> {
        self.visit_expr(expr)?;

        Ok(Object::Nil)
    }

    // Literals contain nothing to resolve.
    //
    fn visit_literal(&mut self, _object: &Object) -> Result<Object, ResolveError> {
        Ok(Object::Nil)
    }

    // Traverses the tree.
    //
    fn visit_logical(&mut self, left: &Expr, _operator: &Token, right: &Expr) -> Result<Object, ResolveError> {
        self.visit_expr(left)?;
        self.visit_expr(right)?;

        Ok(Object::Nil)
    }

    // Traverses the tree.
    //
    fn visit_set(&mut self, object: &Expr, _name: &Token, value: &Expr) -> Result<Object, ResolveError> {
        self.visit_expr(object)?;
        self.visit_expr(value)?;

        Ok(Object::Nil)
    }

    // Super resolves against the implicit binding created by the class declaration.
    //
    fn visit_super(&mut self, id: ExprId, keyword: &Token, _method: &Token) -> Result<Object, ResolveError> {
        if self.current_class == ClassType::None {
            return Err(Self::error(keyword, "Can't use 'super' outside of a class."));
        }
        if self.current_class != ClassType::Subclass {
            return Err(Self::error(keyword, "Can't use 'super' in a class with no superclass."));
        }

        self.resolve_local(id, keyword);
        Ok(Object::Nil)
    }

    // This resolves against the implicit binding created by the class declaration.
    //
    fn visit_this(&mut self, id: ExprId, keyword: &Token) -> Result<Object, ResolveError> {
        if self.current_class == ClassType::None {
            return Err(Self::error(keyword, "Can't use 'this' outside of a class."));
        }

        self.resolve_local(id, keyword);
        Ok(Object::Nil)
    }

    // Traverses the tree.
    //
    fn visit_unary(&mut self, _operator: &Token, right: &Expr) -> Result<Object, ResolveError> {
        self.visit_expr(right)?;

        Ok(Object::Nil)
    }

    // Variable expressions resolve to a location.  Reading a local inside its own
    // initializer is an error.
    //
    fn visit_variable(&mut self, id: ExprId, name: &Token) -> Result<Object, ResolveError> {
        if let Some(scope) = self.scopes.last() {
            if let Some(local) = scope.get(&name.lexeme) {
                if !local.defined {
                    return Err(Self::error(name, "Can't read local variable in its own initializer."));
                }
            }
        }

        self.resolve_local(id, name);
        Ok(Object::Nil)
    }

    // A block statement introduces a new scope for the statements it contains.
    //
    fn visit_block(&mut self, stmts: &Vec<Rc<Stmt>>) -> Result<(), ResolveError> {
        self.begin_scope();
        let result = self.resolve(stmts);
        self.end_scope();

        result
    }

    // Nothing to resolve; the parser has already checked the loop context.
    //
    fn visit_break(&mut self, _keyword: &Token) -> Result<(), ResolveError> {
        Ok(())
    }

    // A class declares its name, resolves its superclass, and resolves each method
    // inside implicit scopes binding `super` (for subclasses) and `this`.
    //
    fn visit_class(&mut self, name: &Token, superclass: &Expr, methods: &Vec<Rc<Stmt>>) -> Result<(), ResolveError> {
        let enclosing_class = self.current_class.clone();
        self.current_class = ClassType::Class;

        let mut result = self.declare(name);
        if result.is_ok() {
            self.define(name);

            if let Expr::Variable(_, super_name) = superclass {
                if name.lexeme == super_name.lexeme {
                    result = Err(Self::error(super_name, "A class can't inherit from itself."));
                }
                else {
                    self.current_class = ClassType::Subclass;
                    result = self.visit_expr(superclass).map(|_| ());
                }
            }
        }

        if result.is_ok() {
            if let Expr::Variable(_, _) = superclass {
                self.begin_scope();
                self.declare_synthetic("super", name.line);
            }

            self.begin_scope();
            self.declare_synthetic("this", name.line);

            for method in methods {
                if let Stmt::Function(method_name, _, _) = method.as_ref() {
                    let declaration = if method_name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    result = self.resolve_function(method, declaration);
                    if result.is_err() {
                        break;
                    }
                }
            }
            self.end_scope();

            if let Expr::Variable(_, _) = superclass {
                self.end_scope();
            }
        }

        self.current_class = enclosing_class;

        result
    }

    // Expression statements simply traverse the tree.
    //
    fn visit_expression(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        self.visit_expr(expr)?;

        Ok(())
    }

    // Traverses the desugared loop: condition, body, then the increment, which runs
    // in the loop's own scope rather than the body's.
    //
    fn visit_for(&mut self, condition: &Expr, body: &Rc<Stmt>, increment: &Expr) -> Result<(), ResolveError> {
        self.visit_expr(condition)?;
        self.visit_stmt(body)?;
        self.visit_expr(increment)?;

        Ok(())
    }

    // A function declaration binds its name early to enable recursion, then resolves
    // the body in its own scope.
    //
    fn visit_function(&mut self, stmt: &Rc<Stmt>, name: &Token, _params: &Vec<Token>, _body: &Vec<Rc<Stmt>>) -> Result<(), ResolveError> {
        self.declare(name)?;
        self.define(name);

        self.resolve_function(stmt, FunctionType::Function)
    }

    // Traverses the tree.
    //
    fn visit_if(&mut self, condition: &Expr, then_branch: &Rc<Stmt>, else_branch: &Rc<Stmt>) -> Result<(), ResolveError> {
        self.visit_expr(condition)?;
        self.visit_stmt(then_branch)?;
        self.visit_stmt(else_branch)?;

        Ok(())
    }

    // Traverses the tree.
    //
    fn visit_print(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        self.visit_expr(expr)?;

        Ok(())
    }

    // Return is only legal inside a function, and initializers cannot return values.
    //
    fn visit_return(&mut self, keyword: &Token, value: &Expr) -> Result<(), ResolveError> {
        if self.current_function == FunctionType::None {
            return Err(Self::error(keyword, "Can't return from top-level code."));
        }

        if *value != Expr::None && self.current_function == FunctionType::Initializer {
            return Err(Self::error(keyword, "Can't return a value from an initializer."));
        }

        self.visit_expr(value)?;
        Ok(())
    }

    // A variable declaration adds a new variable to the current scope.  The name is
    // declared before the initializer resolves and defined after, which is what makes
    // `var a = a;` detectable.
    //
    fn visit_var(&mut self, name: &Token, initializer: &Expr) -> Result<(), ResolveError> {
        self.declare(name)?;
        self.visit_expr(initializer)?;
        self.define(name);
        Ok(())
    }

    // Traverses the tree.
    //
    fn visit_while(&mut self, condition: &Expr, body: &Rc<Stmt>) -> Result<(), ResolveError> {
        self.visit_expr(condition)?;
        self.visit_stmt(body)?;
        Ok(())
    }

    // Nothing to resolve; the parser has already checked the loop context.
    //
    fn visit_continue(&mut self, _keyword: &Token) -> Result<(), ResolveError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::resolver::{Loc, Resolver};

    use crate::visitor::Visitor;

    use crate::token::Token;
    use crate::scanner::Scanner;
    use crate::parser::Parser;

    // Convenience method to scan tokens from a string, to make tests more readable
    // than building tokens by hand.
    //
    fn scan(value: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(value.to_owned());
        scanner.scan_tokens();

        scanner.tokens
    }

    // Resolves a program as one surrounding block, so that top level declarations act
    // as locals and land in the side-table.
    //
    fn resolve_block(value: &str) -> Resolver {
        let mut parser = Parser::new(scan(value));
        let statements = parser.parse();

        let mut resolver = Resolver::new();
        resolver.visit_block(&statements).expect("should resolve");

        resolver
    }

    // Resolves a program and returns the first error message.
    //
    fn resolve_error(value: &str) -> String {
        let mut parser = Parser::new(scan(value));
        let statements = parser.parse();

        let mut resolver = Resolver::new();
        match resolver.visit_block(&statements) {
            Err(err) => err.message,
            Ok(()) => panic!("should fail"),
        }
    }

    // A variable used in the scope it was defined in has zero hops.
    //
    #[test]
    fn resolve_same_scope() {
        let resolver = resolve_block("var test = true; print test;");

        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // Usage of a variable in a nested scope should have one hop.
    //
    #[test]
    fn resolve_one_hop() {
        let resolver = resolve_block("var test = true; {print test;}");

        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // Testing two hops.
    //
    #[test]
    fn resolve_two_hops() {
        let resolver = resolve_block("var test = true; {{print test;}}");

        assert_eq!(Loc { depth: 2, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // Slots are handed out in declaration order within a scope.
    //
    #[test]
    fn resolve_slots_in_declaration_order() {
        let resolver = resolve_block("var a = 1; var b = 2; print b; print a;");

        assert_eq!(Loc { depth: 0, slot: 1 }, *resolver.locals.get(&1).unwrap());
        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&2).unwrap());
    }

    // A shadowing declaration gets its own slot in the inner scope, while the outer
    // binding keeps its own.
    //
    #[test]
    fn resolve_shadowing() {
        let resolver = resolve_block("var test = 1; { var test = 2; print test; }");

        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // Testing that assignment resolves locals.
    //
    #[test]
    fn resolve_assignment() {
        let resolver = resolve_block("var test = true; {test = false;}");

        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&2).unwrap());
    }

    // Testing that logical expressions resolve locals.
    //
    #[test]
    fn resolve_logical() {
        let resolver = resolve_block("var test = true; {test = false or true;}");

        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&2).unwrap());
    }

    // Testing that unary expressions resolve locals.
    //
    #[test]
    fn resolve_unary() {
        let resolver = resolve_block("var test = true; var test2 = !test;");

        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // Testing that binary expressions resolve locals.
    //
    #[test]
    fn resolve_binary() {
        let resolver = resolve_block("var test = true; {test = 1 > 2;}");

        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&2).unwrap());
    }

    // Testing that groupings resolve locals.
    //
    #[test]
    fn resolve_grouping() {
        let resolver = resolve_block("var test = true; var test2 = (test);");

        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // Function parameters take the first slots of the function scope.
    //
    #[test]
    fn resolve_function_parameters() {
        let resolver = resolve_block("
            fun abc(a, b, c) {
                print c;
            }
            abc(1, 2, 3);
            ");

        // `c` is the only variable reference inside the body.
        assert_eq!(Loc { depth: 0, slot: 2 }, *resolver.locals.get(&1).unwrap());
    }

    // A function can refer to itself; the reference resolves to the enclosing scope.
    //
    #[test]
    fn resolve_recursion() {
        let resolver = resolve_block("
            fun again(n) {
                again(n);
            }
            ");

        // `again` inside the body reaches one scope out to the declaration.
        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&1).unwrap());
        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&2).unwrap());
    }

    // Tests resolving if statements.
    //
    #[test]
    fn resolve_if() {
        let resolver = resolve_block("
            var test = 1;
            if (test == 1) {
                test = 2;
            }
            else {
                test = 3;
            }
            ");

        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&3).unwrap());
        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&5).unwrap());
    }

    // Tests resolving while statements.
    //
    #[test]
    fn resolve_while() {
        let resolver = resolve_block("
            var test = 1;

            while (test < 10) {
                test = test + 1;
            }
            ");

        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&3).unwrap());
        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&4).unwrap());
    }

    // The increment of a desugared for loop resolves in the loop's scope, not the
    // body's, so `continue` can still run it.
    //
    #[test]
    fn resolve_for_increment() {
        let resolver = resolve_block("
            for (var i = 0; i < 3; i = i + 1) {
                if (i == 1) continue;
                print i;
            }
            ");

        // Every `i` reference lands on slot 0 of the hoisted initializer scope.
        for loc in resolver.locals.values() {
            assert_eq!(0, loc.slot);
        }
        assert!(!resolver.locals.is_empty());
    }

    // `this` inside a method resolves to the implicit scope around the method body.
    //
    #[test]
    fn resolve_this_in_method() {
        let resolver = resolve_block("
            class Thing {
                me() {
                    return this;
                }
            }
            ");

        assert_eq!(Loc { depth: 1, slot: 0 }, *resolver.locals.get(&1).unwrap());
    }

    // `super` inside a subclass method resolves one scope above `this`.
    //
    #[test]
    fn resolve_super_in_subclass() {
        let resolver = resolve_block("
            class A { hello() {} }
            class B < A {
                hello() {
                    super.hello();
                }
            }
            ");

        // id 1 is the superclass reference, id 2 the super expression.
        assert_eq!(Loc { depth: 0, slot: 0 }, *resolver.locals.get(&1).unwrap());
        assert_eq!(Loc { depth: 2, slot: 0 }, *resolver.locals.get(&2).unwrap());
    }

    // An unused local is a warning, not an error: resolution still succeeds.
    //
    #[test]
    fn resolve_unused_local_is_not_an_error() {
        let resolver = resolve_block("{ var unused = 1; }");

        assert!(resolver.locals.is_empty());
    }

    // The resolver should fail if a local variable is used in its own initializer.
    //
    #[test]
    fn resolve_local_variable_own_initializer() {
        let message = resolve_error("{{ var test = test; }}");

        assert_eq!("Can't read local variable in its own initializer.", message);
    }

    // The resolver should fail if a local variable is declared twice in the same scope.
    //
    #[test]
    fn resolve_duplicate_variable() {
        let message = resolve_error("
            fun bad() {
                var a = \"first\";
                var a = \"second\";
            }
            ");

        assert_eq!("Already a variable with this name in this scope.", message);
    }

    // Duplicate parameter names are also a redeclaration.
    //
    #[test]
    fn resolve_duplicate_parameter() {
        let message = resolve_error("fun bad(a, a) { print a; }");

        assert_eq!("Already a variable with this name in this scope.", message);
    }

    // The resolver should fail if a return statement is not in a function body.
    //
    #[test]
    fn resolve_invalid_return() {
        let mut parser = Parser::new(scan("return \"not at top level\";"));
        let statements = parser.parse();

        let mut resolver = Resolver::new();
        let result = resolver.resolve(&statements);

        match result {
            Err(err) => assert_eq!("Can't return from top-level code.", err.message),
            Ok(()) => panic!("should fail"),
        }
    }

    // Returning a value from an initializer is rejected; a bare return is fine.
    //
    #[test]
    fn resolve_return_value_from_initializer() {
        let message = resolve_error("
            class Thing {
                init() {
                    return 1;
                }
            }
            ");
        assert_eq!("Can't return a value from an initializer.", message);

        resolve_block("
            class Thing {
                init() {
                    return;
                }
            }
            ");
    }

    // The resolver should fail if a class tries to inherit from itself.
    //
    #[test]
    fn resolve_class_inherit_from_self() {
        let message = resolve_error("class Pie < Pie {}");

        assert_eq!("A class can't inherit from itself.", message);
    }

    // `this` is rejected outside a class body.
    //
    #[test]
    fn resolve_this_outside_class() {
        let message = resolve_error("print this;");

        assert_eq!("Can't use 'this' outside of a class.", message);
    }

    // `super` is rejected outside a class, and in a class without a superclass.
    //
    #[test]
    fn resolve_super_misuse() {
        let message = resolve_error("print super.x;");
        assert_eq!("Can't use 'super' outside of a class.", message);

        let message = resolve_error("class A { m() { return super.x; } }");
        assert_eq!("Can't use 'super' in a class with no superclass.", message);
    }
}
