use std::collections::HashMap;

use ahash::RandomState;

use crate::lox::Lox;

use crate::error::ScanError;

use crate::token::{token, Token, TokenType};

use crate::object::Object;

/// Scans a source string, converting it into a list of Tokens to be used by Parser.
///
/// Scanning continues past bad input so every problem gets reported, but the first
/// one is kept in `first_error` for callers to check once scanning is done.
///
/// # Example
///
/// ```
/// let mut scanner = Scanner::new(String::from("fun"));
///
/// scanner.scan_tokens();
///
/// assert_eq!(TokenType::Fun, scanner.tokens[0].token_type);
/// ```
pub struct Scanner {
    pub tokens: Vec<Token>,
    pub first_error: Option<ScanError>,

    chars: Vec<char>,
    line: usize,
    start: usize,
    current: usize,

    keywords: HashMap<String, TokenType, RandomState>,
}

impl Scanner {
    /// Factory method to create Scanner.
    ///
    /// Sets the source, and starts the scanner at the beginning, with empty tokens, and line at 1.
    ///
    pub fn new(source: String) -> Scanner {
        let chars = source.chars().collect();

        let mut map = HashMap::default();
        map.insert(String::from("and"),      TokenType::And);
        map.insert(String::from("break"),    TokenType::Break);
        map.insert(String::from("class"),    TokenType::Class);
        map.insert(String::from("continue"), TokenType::Continue);
        map.insert(String::from("else"),     TokenType::Else);
        map.insert(String::from("false"),    TokenType::False);
        map.insert(String::from("for"),      TokenType::For);
        map.insert(String::from("fun"),      TokenType::Fun);
        map.insert(String::from("if"),       TokenType::If);
        map.insert(String::from("nil"),      TokenType::Nil);
        map.insert(String::from("or"),       TokenType::Or);
        map.insert(String::from("print"),    TokenType::Print);
        map.insert(String::from("return"),   TokenType::Return);
        map.insert(String::from("super"),    TokenType::Super);
        map.insert(String::from("this"),     TokenType::This);
        map.insert(String::from("true"),     TokenType::True);
        map.insert(String::from("var"),      TokenType::Var);
        map.insert(String::from("while"),    TokenType::While);

        Scanner { tokens: Vec::new(), first_error: None, chars, line: 1, start: 0, current: 0, keywords: map }
    }

    /// Scan Tokens.
    ///
    /// Scans until it reaches the end of the source and sets the list of tokens, ending
    /// with Eof.  This method can only be called once until the source is exhausted, and
    /// a new Scanner must be created.
    ///
    /// # Errors
    ///
    /// Records an error for an unrecognized character, an unterminated string, or an
    /// unterminated block comment, and keeps scanning.
    ///
    pub fn scan_tokens(&mut self) {
        while !self.is_at_end() {
            self.start = self.current;

            self.scan_token();
        }
        self.tokens.push(token!(TokenType::Eof, "", Object::Nil, self.line));
    }

    // Scans a single token.
    //
    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),

            '!' => self.add_token_cmp('=', TokenType::BangEqual,    TokenType::Bang),
            '=' => self.add_token_cmp('=', TokenType::EqualEqual,   TokenType::Equal),
            '<' => self.add_token_cmp('=', TokenType::LessEqual,    TokenType::Less),
            '>' => self.add_token_cmp('=', TokenType::GreaterEqual, TokenType::Greater),

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                else if self.match_char('*') {
                    self.block_comment();
                }
                else {
                    self.add_token(TokenType::Slash)
                }
            }

            ' ' | '\r' | '\t' => (),

            '\n' => self.line += 1,

            '"' => self.string(),

            _ => {
                if Self::is_digit(c) {
                    self.number();
                }
                else if Self::is_alpha(c) {
                    self.identifier();
                }
                else {
                    self.error(self.line, &format!("Unexpected character: {}.", c));
                }
            }
        }
    }

    // Scans an identifier.  Identifiers must start with an alphabetic character and can
    // contain alphanumeric values.  If the identifier is contained in the map of keywords,
    // the specific keyword token is returned instead.
    //
    fn identifier(&mut self) {
        while self.is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let text: String = self.chars[self.start..self.current].iter().collect();
        let token_type = self.keywords.get(&text).unwrap_or(&TokenType::Identifier);

        self.add_token(*token_type);
    }

    // Scans for a Number.  In the source, numbers can look like "123" or "3.14".  A
    // leading or trailing dot is not part of a number.  In the literal value Lox treats
    // all numbers as 64 bit floating point.
    //
    fn number(&mut self) {
        while Self::is_digit(self.peek()) {
            self.advance();
        }

        if self.peek() == '.' && Self::is_digit(self.peek_next()) {
            self.advance();

            while Self::is_digit(self.peek()) {
                self.advance();
            }
        }

        let text: String = self.chars[self.start..self.current].iter().collect();
        let number: f64 = text.parse().expect("number should parse");

        self.add_token_literal(TokenType::Number, Object::Number(number));
    }

    // Scans for a String until a terminating quotation mark or the end of source.  If end
    // of source, records an error.  Newlines inside the string bump the line counter; no
    // escape sequences are processed.
    //
    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error(self.line, "Unterminated string.");
            return;
        }
        self.advance();
        let text: String = self.chars[self.start + 1..self.current - 1].iter().collect();

        self.add_token_literal(TokenType::String, Object::String(text));
    }

    // Skips a block comment, honoring nesting.  The opening "/*" has already been
    // consumed; records an error if the source ends before every level is closed.
    //
    fn block_comment(&mut self) {
        let mut nesting = 1;

        while nesting > 0 && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
                self.advance();
            }
            else if self.peek() == '/' && self.peek_next() == '*' {
                self.advance();
                self.advance();
                nesting += 1;
            }
            else if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                nesting -= 1;
            }
            else {
                self.advance();
            }
        }

        if nesting > 0 {
            self.error(self.line, "Unterminated block comment.");
        }
    }

    // Returns the current character in the source.  If at end, returns 0 instead.
    //
    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.chars[self.current]
    }

    // Lookahead to the next character.  If it is past the end, returns 0 instead.
    //
    fn peek_next(&self) -> char {
        if self.current + 1 >= self.chars.len() {
            return '\0';
        }
        self.chars[self.current + 1]
    }

    // Determines if character is alphabetic.
    //
    fn is_alpha(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    // Determines if character is alphabetic or numeric.
    //
    fn is_alpha_numeric(&self, c: char) -> bool {
        Self::is_alpha(c) || Self::is_digit(c)
    }

    // Determines if character is a digit (numeric).
    //
    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    // Conditionally adds a token based on the character argument.
    //
    fn add_token_cmp(&mut self, c: char, first: TokenType, second: TokenType) {
        let token_type = if self.match_char(c) { first } else { second };
        self.add_token(token_type);
    }

    // Matches a character.  If at end or not matched, simply returns, otherwise the
    // current character is advanced.
    //
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }

        if self.chars[self.current] != expected {
            return false;
        }

        self.current += 1;
        true
    }

    // Unconditionally advances current character, returning previous value.
    //
    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;

        c
    }

    // Uses the start and current characters to add a Token with no literal payload.
    //
    fn add_token(&mut self, token_type: TokenType) {
        self.add_token_literal(token_type, Object::Nil);
    }

    // Uses the start and current characters to add a Token to the list.
    //
    fn add_token_literal(&mut self, token_type: TokenType, literal: Object) {
        let text: String = self.chars[self.start..self.current].iter().collect();

        self.tokens.push(Token::new(token_type, text, literal, self.line));
    }

    // Are we at the end of the source?
    //
    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    // Reports an error and keeps the first one for callers.
    //
    fn error(&mut self, line: usize, message: &str) {
        Lox::error(line, message);

        if self.first_error.is_none() {
            self.first_error = Some(ScanError { line, message: String::from(message) });
        }
    }
}
