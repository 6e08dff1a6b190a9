use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::Stmt;
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver;
use rox::scanner::Scanner;
use rox::token::Token;

/// Exit status for lexical, syntax and resolver errors.
const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status for runtime errors, stack overflow included.
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads the whole file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("{:?} is not valid UTF-8", filename))
}

/// Scan everything, keeping the good tokens and every lexical error.
fn scan(source: &str) -> (Vec<Token<'_>>, Vec<LoxError>) {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    debug!("Scanned {} token(s), {} error(s)", tokens.len(), errors.len());

    (tokens, errors)
}

fn report_and_exit(errors: &[LoxError], code: i32) -> ! {
    for e in errors {
        eprintln!("{}", e);
    }

    debug!("Exiting with code {}", code);
    std::process::exit(code);
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, errors) = scan(&source);

    for e in &errors {
        eprintln!("{}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        std::process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, errors) = scan(&source);

    if !errors.is_empty() {
        report_and_exit(&errors, EXIT_STATIC_ERROR);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => {
            let ast_str = AstPrinter::print(&expr);

            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
        }

        Err(e) => report_and_exit(&[e], EXIT_STATIC_ERROR),
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn evaluate(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, errors) = scan(&source);

    if !errors.is_empty() {
        report_and_exit(&errors, EXIT_STATIC_ERROR);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => report_and_exit(&[e], EXIT_STATIC_ERROR),
    };

    // Resolve as a one‑statement program so lambdas see their parameters.
    let program: Vec<Stmt<'_>> = vec![Stmt::Expression(expr)];
    let resolution = resolver::resolve(&program);

    if !resolution.is_ok() {
        report_and_exit(&resolution.diagnostics, EXIT_STATIC_ERROR);
    }

    let Some(Stmt::Expression(expr)) = program.first() else {
        return Ok(());
    };

    let mut interpreter = Interpreter::new();
    interpreter.add_locals(resolution.locals);

    match interpreter.evaluate(expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }

        Err(e) => report_and_exit(&[e], EXIT_RUNTIME_ERROR),
    }

    info!("Evaluate subcommand completed");
    Ok(())
}

fn run(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let (tokens, mut errors) = scan(&source);

    let statements: Vec<Stmt<'_>> = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Vec::new()
        }
    };

    if !errors.is_empty() {
        report_and_exit(&errors, EXIT_STATIC_ERROR);
    }

    info!("Parsed {} statements", statements.len());

    let resolution = resolver::resolve(&statements);

    if !resolution.is_ok() {
        report_and_exit(&resolution.diagnostics, EXIT_STATIC_ERROR);
    }

    let mut interpreter = Interpreter::new();

    match interpreter.interpret(&statements, resolution.locals) {
        Ok(()) => info!("Program executed successfully"),
        Err(e) => report_and_exit(&[e], EXIT_RUNTIME_ERROR),
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse { filename } => parse(filename),
        Commands::Evaluate { filename } => evaluate(filename),
        Commands::Run { filename } => run(filename),
    }
}
