use std::rc::Rc;

use crate::lox::Lox;

use crate::error::ParseError;

use crate::object::Object;
use crate::token::{token, Token, TokenType};

use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;

use crate::expr::*;

type Expression = Box<Expr>;

/// Parses a list of tokens, creating a list of statements.
///
/// Every variable-referencing expression gets a fresh id from `id_counter`; those ids
/// key the resolution side-table.  A REPL hands the counter from one line's parser to
/// the next through `with_first_id` / `last_id`, so ids never collide across lines.
///
/// On a syntax error the parser reports it, keeps the first one in `first_error`, and
/// synchronizes to the next statement so later problems still surface.
///
pub struct Parser {
    pub first_error: Option<ParseError>,

    tokens: Vec<Token>,
    current: usize,
    id_counter: ExprId,
    loop_depth: usize,
}

impl Parser {
    /// Factory method to create a new Parser.
    ///
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser::with_first_id(tokens, 0)
    }

    /// Creates a Parser whose expression ids continue from an earlier parse.
    ///
    pub fn with_first_id(tokens: Vec<Token>, first_id: ExprId) -> Parser {
        Parser { first_error: None, tokens, current: 0, id_counter: first_id, loop_depth: 0 }
    }

    /// The last expression id handed out.  Feed this into `with_first_id` for the next
    /// parse of the same session.
    ///
    pub fn last_id(&self) -> ExprId {
        self.id_counter
    }

    /// Parses tokens, and returns a list of statements.
    ///
    pub fn parse(&mut self) -> Vec<Rc<Stmt>> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            let stmt = self.declaration();
            statements.push(stmt.into());
        }

        statements
    }

    // Parses a declaration.  This can be a class, function, or variable declaration, or
    // a statement.  If a parse error is returned, synchronizes to the next statement to
    // avoid unhelpful error messages.
    //
    // A `fun` token only starts a declaration when a name follows; `fun (` is an
    // anonymous function expression and falls through to statement().
    //
    fn declaration(&mut self) -> Stmt {
        if self.match_token(&[TokenType::Class]) {
            return self.class_declaration_sync();
        }
        if self.check(&TokenType::Fun) && self.check_next(&TokenType::Identifier) {
            self.advance();
            return self.function_sync();
        }
        if self.match_token(&[TokenType::Var]) {
            return self.var_declaration_sync();
        }
        self.statement_sync()
    }

    // Parses a class declaration.
    //
    // # Errors
    //
    // Returns a parse error if no class name.
    // Returns a parse error if no superclass name (when matching <).
    // Returns a parse error if no opening brace before body.
    // Returns a parse error if no closing brace after body.
    //
    fn class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(&TokenType::Identifier, "Expect class name.")?;

        let mut superclass = Expr::None;
        if self.match_token(&[TokenType::Less]) {
            self.consume(&TokenType::Identifier, "Expect superclass name.")?;
            superclass = Expr::Variable(self.make_id(), self.previous());
        }

        self.consume(&TokenType::LeftBrace, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<Stmt>> = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?.into());
        }
        self.consume(&TokenType::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(name, superclass, methods))
    }

    // Parses a class declaration, synchronizing if error.
    //
    fn class_declaration_sync(&mut self) -> Stmt {
        match self.class_declaration() {
            Ok(value) => value,
            Err(_err) => {
                self.synchronize();
                Stmt::None
            }
        }
    }

    // Parses a function, synchronizing if error.
    //
    fn function_sync(&mut self) -> Stmt {
        match self.function("function") {
            Ok(value) => value,
            Err(_err) => {
                self.synchronize();
                Stmt::None
            }
        }
    }

    // Parses a variable declaration, synchronizing if error.
    //
    fn var_declaration_sync(&mut self) -> Stmt {
        match self.var_declaration() {
            Ok(value) => value,
            Err(_err) => {
                self.synchronize();
                Stmt::None
            }
        }
    }

    // Parses a statement, synchronizing if error.
    //
    fn statement_sync(&mut self) -> Stmt {
        match self.statement() {
            Ok(value) => value,
            Err(_err) => {
                self.synchronize();
                Stmt::None
            }
        }
    }

    // Parses a named function.
    //
    fn function(&mut self, kind: &str) -> Result<Stmt, ParseError> {
        let name = self.consume(&TokenType::Identifier, &format!("Expect {} name.", kind))?;
        self.function_body(name, kind)
    }

    // Parses the parameter list and body shared by named functions, methods, and
    // anonymous functions.  The loop depth is reset across the body so a `break`
    // inside a nested function cannot target a loop outside it.
    //
    // # Errors
    //
    // Returns a parse error if no open parenthesis after the name.
    // Returns a parse error if more than 255 parameters.
    // Returns a parse error if a parameter is not an identifier.
    // Returns a parse error if no close parenthesis after parameters.
    // Returns a parse error if no opening brace before body.
    //
    fn function_body(&mut self, name: Token, kind: &str) -> Result<Stmt, ParseError> {
        self.consume(&TokenType::LeftParen, &format!("Expect '(' after {} name.", kind))?;

        let mut parameters = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                if parameters.len() >= 255 {
                    return Err(self.error(&self.peek(), "Can't have more than 255 parameters."));
                }
                let param = self.consume(&TokenType::Identifier, "Expect parameter name.")?;
                parameters.push(param);

                if !self.match_token(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(&TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(&TokenType::LeftBrace, &format!("Expect '{{' before {} body.", kind))?;

        let enclosing_loops = self.loop_depth;
        self.loop_depth = 0;
        let body = self.block();
        self.loop_depth = enclosing_loops;

        Ok(Stmt::Function(name, parameters, body?))
    }

    // Continues parsing a var statement.
    //
    // # Errors
    //
    // Returns a parse error if the name is not an identifier.
    // Returns a parse error if the statement doesn't end with a semicolon.
    //
    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(&TokenType::Identifier, "Expect variable name.")?;

        let mut initializer = Expr::None;
        if self.match_token(&[TokenType::Equal]) {
            initializer = *self.expression()?;
        }
        self.consume(&TokenType::Semicolon, "Expect ';' after variable declaration.")?;

        Ok(Stmt::Var(name, initializer))
    }

    // Parses a statement.  Valid statements are For, If, Print, Return, While, Break,
    // Continue, Block, and Expression.
    //
    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_token(&[TokenType::For]) {
            return self.for_statement();
        }

        if self.match_token(&[TokenType::If]) {
            return self.if_statement();
        }

        if self.match_token(&[TokenType::Print]) {
            return self.print_statement();
        }

        if self.match_token(&[TokenType::Return]) {
            return self.return_statement();
        }

        if self.match_token(&[TokenType::While]) {
            return self.while_statement();
        }

        if self.match_token(&[TokenType::Break]) {
            return self.break_statement();
        }

        if self.match_token(&[TokenType::Continue]) {
            return self.continue_statement();
        }

        if self.match_token(&[TokenType::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    // Parses an if statement.
    //
    // # Errors
    //
    // Returns a parse error if the condition doesn't start with a left paren.
    // Returns a parse error if the condition doesn't end with a right paren.
    //
    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RightParen, "Expect ')' after condition.")?;

        let then_branch = self.statement()?;
        let mut else_branch = Stmt::None;
        if self.match_token(&[TokenType::Else]) {
            else_branch = self.statement()?;
        }

        Ok(Stmt::If(*condition, then_branch.into(), else_branch.into()))
    }

    // Parses a for statement.  The for loop is syntactic sugar: the initializer is
    // hoisted into a surrounding block, and the loop itself becomes either a plain
    // While, or a For statement that keeps the increment so `continue` still runs it.
    //
    // # Errors
    //
    // Returns a parse error if the clauses don't start with a left paren.
    // Returns a parse error if there is no semicolon after the loop condition.
    // Returns a parse error if the clauses don't end with a right paren.
    //
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&TokenType::LeftParen, "Expect '(' after 'for'.")?;

        let initializer;
        if self.match_token(&[TokenType::Semicolon]) {
            initializer = Stmt::None;
        }
        else if self.match_token(&[TokenType::Var]) {
            initializer = self.var_declaration()?;
        }
        else {
            initializer = self.expression_statement()?;
        }

        let mut condition = Expr::None;
        if !self.check(&TokenType::Semicolon) {
            condition = *self.expression()?;
        }
        self.consume(&TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let mut increment = Expr::None;
        if !self.check(&TokenType::RightParen) {
            increment = *self.expression()?;
        }
        self.consume(&TokenType::RightParen, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let body = body?;

        if condition == Expr::None {
            condition = Expr::Literal(Object::Boolean(true));
        }

        let mut body = if increment == Expr::None {
            Stmt::While(condition, body.into())
        }
        else {
            Stmt::For(condition, body.into(), increment)
        };

        if initializer != Stmt::None {
            body = Stmt::Block(vec![initializer.into(), body.into()]);
        }
        Ok(body)
    }

    // Parses a while statement.
    //
    // # Errors
    //
    // Returns a parse error if no open parenthesis after while.
    // Returns a parse error if no close parenthesis after the condition.
    //
    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RightParen, "Expect ')' after condition.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While(*condition, body?.into()))
    }

    // Parses a break statement.  Only valid inside a loop.
    //
    fn break_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous();

        if self.loop_depth == 0 {
            return Err(self.error(&keyword, "Can't use 'break' outside of a loop."));
        }
        self.consume(&TokenType::Semicolon, "Expect ';' after 'break'.")?;

        Ok(Stmt::Break(keyword))
    }

    // Parses a continue statement.  Only valid inside a loop.
    //
    fn continue_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous();

        if self.loop_depth == 0 {
            return Err(self.error(&keyword, "Can't use 'continue' outside of a loop."));
        }
        self.consume(&TokenType::Semicolon, "Expect ';' after 'continue'.")?;

        Ok(Stmt::Continue(keyword))
    }

    // Parses a Print statement.  Returns a parse error if not ended with a semicolon.
    //
    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(&TokenType::Semicolon, "Expect ';' after value.")?;

        Ok(Stmt::Print(*value))
    }

    // Parses a return statement.  The value is optional.
    //
    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous();

        let mut value = Box::new(Expr::None);
        if !self.check(&TokenType::Semicolon) {
            value = self.expression()?;
        }
        self.consume(&TokenType::Semicolon, "Expect ';' after return value.")?;

        Ok(Stmt::Return(keyword, value))
    }

    // Parses an Expression statement.  Returns a parse error if not ended with a
    // semicolon.
    //
    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(&TokenType::Semicolon, "Expect ';' after value.")?;

        Ok(Stmt::Expression(*value))
    }

    // Parses a block statement.  Returns a parse error if the block is not ended with
    // a closing brace.
    //
    fn block(&mut self) -> Result<Vec<Rc<Stmt>>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration().into());
        }

        self.consume(&TokenType::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    // Parses an Expression.  Calls assignment().
    //
    fn expression(&mut self) -> Result<Expression, ParseError> {
        self.assignment()
    }

    // Calls or() to continue evaluating the expression.  If the next token is Equal,
    // inspects the left side: a variable becomes an Assign, a property access becomes
    // a Set, and anything else reports an invalid assignment target and keeps the
    // expression as parsed.
    //
    fn assignment(&mut self) -> Result<Expression, ParseError> {
        let expr = self.or()?;

        if self.match_token(&[TokenType::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;

            match *expr {
                Expr::Variable(_, name) => {
                    return Ok(assign!(self.make_id(), name, value));
                }
                Expr::Get(object, name) => {
                    return Ok(set!(object, name, value));
                }
                other => {
                    self.error(&equals, "Invalid assignment target.");
                    return Ok(Box::new(other));
                }
            }
        }
        Ok(expr)
    }

    // Logical operator or has precedence after and.
    //
    fn or(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.and()?;

        while self.match_token(&[TokenType::Or]) {
            let operator = self.previous();
            let right = self.and()?;

            expr = logical!(expr, operator, right);
        }
        Ok(expr)
    }

    // Logical operator and has precedence before or, and after equality.
    //
    fn and(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.equality()?;

        while self.match_token(&[TokenType::And]) {
            let operator = self.previous();
            let right = self.equality()?;

            expr = logical!(expr, operator, right);
        }
        Ok(expr)
    }

    // Equality has precedence between comparison and the logical operators.  Value
    // equality types are EqualEqual and BangEqual.
    //
    fn equality(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.comparison()?;

        while self.match_token(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator = self.previous();
            let right = self.comparison()?;

            expr = binary!(expr, operator, right);
        }
        Ok(expr)
    }

    // Comparison has precedence between term and equality.  Valid comparison types are
    // Greater, GreaterEqual, Less and LessEqual.
    //
    fn comparison(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.term()?;

        while self.match_token(&[TokenType::Greater, TokenType::GreaterEqual, TokenType::Less, TokenType::LessEqual]) {
            let operator = self.previous();
            let right = self.term()?;

            expr = binary!(expr, operator, right);
        }
        Ok(expr)
    }

    // Term has precedence between factor and comparison.  Valid term types are Minus
    // and Plus.
    //
    fn term(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.factor()?;

        while self.match_token(&[TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous();
            let right = self.factor()?;

            expr = binary!(expr, operator, right);
        }
        Ok(expr)
    }

    // Factor has precedence between unary and term.  Valid factor types are Slash and
    // Star.
    //
    fn factor(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.unary()?;

        while self.match_token(&[TokenType::Slash, TokenType::Star]) {
            let operator = self.previous();
            let right = self.unary()?;

            expr = binary!(expr, operator, right);
        }
        Ok(expr)
    }

    // Unary is next in precedence after function calls.  Valid unary types are Bang
    // and Minus.
    //
    fn unary(&mut self) -> Result<Expression, ParseError> {
        if self.match_token(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;

            return Ok(unary!(operator, right));
        }
        self.call()
    }

    // If an expression is followed by parentheses, treat it as a call.
    // If an expression is followed by a dot, treat it as a property access.
    //
    // # Errors
    //
    // Returns a parse error if a property access has no property name.
    //
    fn call(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.match_token(&[TokenType::LeftParen]) {
                expr = self.finish_call(*expr)?;
            }
            else if self.match_token(&[TokenType::Dot]) {
                let name = self.consume(&TokenType::Identifier, "Expect property name after '.'.")?;
                expr = get!(expr, name);
            }
            else {
                break;
            }
        }
        Ok(expr)
    }

    // When an expression is followed by a paren, it is a function call.  This method
    // parses the arguments.
    //
    // # Errors
    //
    // Returns a parse error if more than 255 arguments.
    // Returns a parse error if the arguments are not followed by a closing paren.
    //
    fn finish_call(&mut self, callee: Expr) -> Result<Expression, ParseError> {
        let mut arguments = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    return Err(self.error(&self.peek(), "Can't have more than 255 arguments."));
                }
                arguments.push(*self.expression()?);
                if !self.match_token(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(&TokenType::RightParen, "Expect ')' after arguments.")?;

        Ok(call!(callee, paren, arguments))
    }

    // Primary has the highest precedence in parsing.  Consists of booleans, nil,
    // numbers, strings, this, super, identifiers, anonymous functions, and groupings.
    //
    // When encountering a parenthesis, returns a grouping of the expression, raising
    // its precedence.  If there is no closing parenthesis, returns a ParseError.
    //
    // Returns a ParseError if none of the above is matched.
    //
    fn primary(&mut self) -> Result<Expression, ParseError> {
        if self.match_token(&[TokenType::False]) {
            return Ok(boolean!(false));
        }

        if self.match_token(&[TokenType::True]) {
            return Ok(boolean!(true));
        }

        if self.match_token(&[TokenType::Nil]) {
            return Ok(literal!(Object::Nil));
        }

        if self.match_token(&[TokenType::Number, TokenType::String]) {
            return Ok(literal!(self.previous().to_literal()));
        }

        if self.match_token(&[TokenType::Super]) {
            let keyword = self.previous();
            self.consume(&TokenType::Dot, "Expect '.' after 'super'.")?;

            let method = self.consume(&TokenType::Identifier, "Expect superclass method name.")?;

            return Ok(super_expr!(self.make_id(), keyword, method));
        }

        if self.match_token(&[TokenType::This]) {
            return Ok(this!(self.make_id(), self.previous()));
        }

        if self.match_token(&[TokenType::Identifier]) {
            return Ok(variable!(self.make_id(), self.previous()));
        }

        if self.check(&TokenType::Fun) && self.check_next(&TokenType::LeftParen) {
            self.advance();
            return self.anonymous_function();
        }

        if self.match_token(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(&TokenType::RightParen, "Expect ')' after expression.")?;

            return Ok(grouping!(expr));
        }
        Err(self.error(&self.peek(), "Expect expression."))
    }

    // Parses an anonymous function literal.  The `fun` keyword has been consumed; the
    // declaration carries an empty name.
    //
    fn anonymous_function(&mut self) -> Result<Expression, ParseError> {
        let name = token!(TokenType::Identifier, "", Object::Nil, self.previous().line);
        let declaration = self.function_body(name, "anonymous function")?;

        Ok(Box::new(Expr::Function(Rc::new(declaration))))
    }

    // Hands out the next expression id.
    //
    fn make_id(&mut self) -> ExprId {
        self.id_counter += 1;
        self.id_counter
    }

    // Checks if the current token matches a given list of tokens.  If it does, advances
    // and returns true.  Otherwise it returns false and does not change the token
    // pointer.
    //
    fn match_token(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();

                return true;
            }
        }
        false
    }

    // If the token matches, then advances and returns the previous token.  Otherwise
    // returns a ParseError.
    //
    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<Token, ParseError> {
        if self.check(token_type) {
            return Ok(self.advance());
        }
        Err(self.error(&self.peek(), message))
    }

    // Checks if the current token matches.  Always returns false if at end.
    //
    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek().token_type == token_type
    }

    // Checks the token after the current one.
    //
    fn check_next(&self, token_type: &TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(next) => &next.token_type == token_type,
            None => false,
        }
    }

    // Advances the current token pointer if not at the end, and returns the previous
    // token.
    //
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    // Checks to see if the current token is Eof.
    //
    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    // Returns the current token.
    //
    fn peek(&self) -> Token {
        self.tokens[self.current].copy()
    }

    // Returns the previous token.
    //
    fn previous(&self) -> Token {
        self.tokens[self.current - 1].copy()
    }

    // Reports an error, keeps the first one, and returns it.
    //
    fn error(&mut self, token: &Token, message: &str) -> ParseError {
        Lox::token_error(token, message);

        let error = ParseError { token: token.copy(), message: String::from(message) };
        if self.first_error.is_none() {
            self.first_error = Some(error.clone());
        }
        error
    }

    // When an error occurs, we don't want to flood the user with cascading errors.  But
    // we also don't want to feed them one error at a time.  This method provides a
    // synchronization mechanism to skip tokens until the next statement, and then resume
    // normal parsing.
    //
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class | TokenType::For | TokenType::Fun | TokenType::If | TokenType::Print |
                TokenType::Return | TokenType::Var | TokenType::While => return,
                _ => (),
            }
            self.advance();
        }
    }
}
