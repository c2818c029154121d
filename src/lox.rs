use std::{fs, process};
use std::{io, io::Write};

use crate::GLOBALS;
use crate::error::RuntimeError;

use crate::token::{Token, TokenType};
use crate::expr::ExprId;

use crate::scanner::Scanner;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::interpreter::Interpreter;

/// The front door: runs scripts and the interactive prompt, and carries the
/// diagnostic reporters every phase funnels through.
///
pub struct Lox;

impl Lox {
    /// Runs a Lox file.
    ///
    /// # Errors
    ///
    /// If a scan, parse, or resolve error, exits the process with code 65.
    /// If a runtime error, exits the process with code 70.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    ///
    pub fn run_file(path: &str) {
        let contents = fs::read_to_string(path).expect("unable to read file");
        let mut interpreter = Interpreter::new();

        Self::run(&contents, &mut interpreter, 0);

        if GLOBALS.lock().unwrap().had_error {
            process::exit(65);
        }
        if GLOBALS.lock().unwrap().had_runtime_error {
            process::exit(70);
        }
    }

    /// Runs a REPL until end of input.  Each line runs against the same interpreter,
    /// so definitions persist, and the expression id counter is threaded from line to
    /// line so earlier resolutions stay valid.
    ///
    /// # Panics
    ///
    /// Panics if standard in or standard out is unusable.
    ///
    pub fn run_prompt() {
        let mut interpreter = Interpreter::new();
        let mut next_id: ExprId = 0;

        loop {
            print!("> ");
            io::stdout().flush().expect("cannot flush stdout");

            let mut line = String::new();
            let bytes = io::stdin()
                .read_line(&mut line)
                .expect("failed to read line");
            if bytes == 0 {
                break;
            }

            next_id = Self::run(&line, &mut interpreter, next_id);

            GLOBALS.lock().unwrap().had_error = false;
        }
    }

    // Drives the pipeline over one source chunk: scan, parse, resolve, interpret.  A
    // phase that records an error stops the pipeline.  Returns the expression id
    // counter for the next chunk of this session.
    //
    fn run(source: &str, interpreter: &mut Interpreter, first_id: ExprId) -> ExprId {
        let mut scanner = Scanner::new(String::from(source));
        scanner.scan_tokens();
        if scanner.first_error.is_some() {
            return first_id;
        }

        let mut parser = Parser::with_first_id(scanner.tokens, first_id);
        let statements = parser.parse();
        let next_id = parser.last_id();
        if parser.first_error.is_some() {
            return next_id;
        }

        let mut resolver = Resolver::new();
        if resolver.resolve(&statements).is_err() {
            return next_id;
        }

        interpreter.locals.extend(resolver.locals);
        interpreter.interpret(&statements);

        next_id
    }

    /// Reports an error at a bare line number.
    ///
    pub fn error(line: usize, message: &str) {
        Self::report(line, "", message);
    }

    /// Reports a warning.  Warnings do not fail the run.
    ///
    pub fn warning(line: usize, message: &str) {
        eprintln!("[line {line}] Warning: {message}");
    }

    /// Handles a runtime error.
    ///
    /// Prints the message with its line and marks the global runtime error flag.
    ///
    pub fn runtime_error(error: RuntimeError) {
        eprintln!("{}\n[line {}]", error.message, error.token.line);

        let mut globals = GLOBALS.lock().unwrap();
        globals.had_runtime_error = true;
        if globals.first_error.is_empty() {
            globals.first_error = error.message;
        }
    }

    /// Handles an error associated with a parsed token.
    ///
    /// Prints an error message and sets the global error indicator.
    ///
    pub fn token_error(token: &Token, message: &str) {
        if token.token_type == TokenType::Eof {
            Self::report(token.line, "at end", message);
        }
        else {
            let where_at = format!("at '{}'", token.lexeme);

            Self::report(token.line, &where_at, message);
        }
    }

    // Writes the diagnostic to standard error and records it in the globals.  The
    // first message of a run sticks; later ones only print.
    //
    fn report(line: usize, where_at: &str, message: &str) {
        let error_message = if where_at.is_empty() {
            format!("[line {line}] Error: {message}")
        }
        else {
            format!("[line {line}] Error {where_at}: {message}")
        };

        eprintln!("{}", error_message);

        let mut globals = GLOBALS.lock().unwrap();
        globals.had_error = true;
        if globals.first_error.is_empty() {
            globals.first_error = error_message;
        }
    }
}
