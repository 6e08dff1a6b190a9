#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver;
use rox::scanner::Scanner;
use rox::token::Token;

/// `Write` sink whose contents stay readable after the interpreter owns it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What running a program produced.
#[derive(Debug)]
pub struct Outcome {
    /// Everything `print` wrote.
    pub output: String,
    /// Static errors (lex, parse, resolve), rendered.
    pub diagnostics: Vec<String>,
    /// The runtime error that stopped the run, rendered.
    pub error: Option<String>,
}

pub fn tokens(source: &str) -> Vec<Token<'_>> {
    Scanner::new(source)
        .collect::<Result<Vec<_>, _>>()
        .expect("source should scan cleanly")
}

/// Scan, parse, resolve and interpret `source`.
pub fn run(source: &str) -> Outcome {
    let mut diagnostics: Vec<LoxError> = Vec::new();
    let mut tokens: Vec<Token<'_>> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => diagnostics.push(e),
        }
    }

    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => {
            diagnostics.extend(errors);
            Vec::new()
        }
    };

    if diagnostics.is_empty() {
        let resolution = resolver::resolve(&statements);
        if !resolution.is_ok() {
            return Outcome {
                output: String::new(),
                diagnostics: resolution.diagnostics.iter().map(|e| e.to_string()).collect(),
                error: None,
            };
        }

        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(buffer.clone());
        let error = interpreter
            .interpret(&statements, resolution.locals)
            .err()
            .map(|e| e.to_string());

        return Outcome {
            output: buffer.contents(),
            diagnostics: Vec::new(),
            error,
        };
    }

    Outcome {
        output: String::new(),
        diagnostics: diagnostics.iter().map(|e| e.to_string()).collect(),
        error: None,
    }
}

/// Output of a program expected to run cleanly.
pub fn output(source: &str) -> String {
    let outcome = run(source);
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        outcome.diagnostics
    );
    assert!(outcome.error.is_none(), "unexpected runtime error: {:?}", outcome.error);
    outcome.output
}

/// Static diagnostics of a program expected not to run.
pub fn diagnostics(source: &str) -> Vec<String> {
    let outcome = run(source);
    assert!(!outcome.diagnostics.is_empty(), "expected diagnostics, got none");
    outcome.diagnostics
}

/// Runtime error of a program that passes the static checks.
pub fn runtime_error(source: &str) -> String {
    let outcome = run(source);
    assert!(
        outcome.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        outcome.diagnostics
    );
    outcome.error.expect("expected a runtime error")
}
