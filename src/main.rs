use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use loxide::ast::Ast;
use loxide::lox::{Lox, RunError};
use loxide::parser::Parser;
use loxide::scanner::Scanner;

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
    Tokenize { filename: PathBuf },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Runs a Lox program from a file, or starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Module path + source line, RUST_LOG overrides the Debug default
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxide::")
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
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &PathBuf) -> Result<()> {
    info!("Running Tokenize subcommand");

    let buf = read_file(filename)?;
    let scanner = Scanner::new(&buf);
    let mut tokenized = true;

    for token in scanner {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                println!("{}", token);
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");

        std::process::exit(65);
    }

    info!("Tokenization completed successfully");

    Ok(())
}

fn parse(filename: &PathBuf) -> Result<()> {
    info!("Running Parse subcommand");

    let buf = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&buf).scan_all();

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }

        std::process::exit(65);
    }

    let mut parser = Parser::new(&tokens, 0);

    match parser.parse_expression() {
        Ok(expr) => {
            info!("Expression parsed successfully");

            let ast_str = Ast.print(&expr);

            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
        }

        Err(e) => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(65);
        }
    }

    info!("Parse subcommand completed");

    Ok(())
}

fn run_file(filename: &PathBuf) -> Result<()> {
    info!("Running Run subcommand");

    let buf = read_file(filename)?;
    let source = String::from_utf8(buf).context("Source file is not valid UTF-8")?;

    let mut lox = Lox::new();

    match lox.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
        }

        Err(RunError::Static(errors)) => {
            for e in &errors {
                debug!("Static debug: {}", e);
                eprintln!("{}", e);
            }

            std::process::exit(65);
        }

        Err(RunError::Runtime(e)) => {
            debug!("Runtime debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(70);
        }
    }

    Ok(())
}

/// Line-oriented prompt.  One `Lox` session lives for the whole loop, so
/// definitions persist across lines; errors are printed and the prompt
/// continues.
fn run_repl() -> Result<()> {
    info!("Starting REPL");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();

        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        match lox.run(&line) {
            Ok(()) => {}

            Err(RunError::Static(errors)) => {
                for e in &errors {
                    eprintln!("{}", e);
                }
            }

            Err(RunError::Runtime(e)) => {
                eprintln!("{}", e);
            }
        }
    }

    info!("REPL ended");

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

    match args.commands {
        Commands::Tokenize { filename } => tokenize(&filename),
        Commands::Parse { filename } => parse(&filename),
        Commands::Run { filename } => match filename {
            Some(filename) => run_file(&filename),
            None => run_repl(),
        },
    }
}
