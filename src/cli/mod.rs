//! CLI module for the SigScript engine
//!
//! ## Commands
//!
//! - `lex <expr>` - Dump the tokens of an expression
//! - `check <expr>` - Parse and type check, print the expression type
//! - `eval <expr>` - Evaluate a value or condition, or execute an action
//! - `decompile <expr> --to <grammar>` - Print canonical text in a grammar
//! - `describe <expr>` - Print a human-readable description
//!
//! ## Design
//!
//! Host names resolve against a JSON fixture (`--host`), or an empty host when none is given.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use sigscript_core::lang::grammars::{self, GrammarId};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Parse failures, unreadable fixtures.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The expression parsed but failed while evaluating.
    pub const RUNTIME: ExitCode = ExitCode(2);
    /// A condition evaluated to false.
    pub const FALSE: ExitCode = ExitCode(3);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::RUNTIME)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Parse, evaluate and translate SigScript expressions
#[derive(Parser, Debug)]
#[command(name = "sigscript")]
#[command(version = VERSION)]
#[command(about = "Parse, evaluate and translate SigScript expressions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: GlobalOptions,
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOptions {
    /// JSON host fixture declaring signals, actions and properties
    #[arg(long, global = true, value_name = "FILE")]
    pub host: Option<PathBuf>,

    /// Grammar used when the expression carries no marker
    #[arg(long, global = true, value_name = "GRAMMAR", value_parser = parse_grammar, default_value = "infix")]
    pub grammar: GrammarId,

    /// Reject string literals outside a signal's declared options
    #[arg(long, global = true)]
    pub strict: bool,

    /// Leave `{% ... %}` text untouched
    #[arg(long = "no-macros", global = true)]
    pub no_macros: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump the tokens of an expression
    Lex {
        #[arg(value_name = "EXPR")]
        expr: String,
    },

    /// Parse and type check an expression
    Check {
        #[arg(value_name = "EXPR")]
        expr: String,
    },

    /// Evaluate a value or condition, or execute an action
    Eval {
        #[arg(value_name = "EXPR")]
        expr: String,
    },

    /// Print an expression in canonical form
    Decompile {
        #[arg(value_name = "EXPR")]
        expr: String,
        /// Target grammar (default: the source grammar)
        #[arg(long, value_name = "GRAMMAR", value_parser = parse_grammar)]
        to: Option<GrammarId>,
    },

    /// Print a human-readable description of an expression
    Describe {
        #[arg(value_name = "EXPR")]
        expr: String,
    },
}

fn parse_grammar(name: &str) -> Result<GrammarId, String> {
    grammars::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = grammars::GRAMMARS.iter().map(|g| g.name).collect();
        format!("unknown grammar '{name}' (expected one of: {})", known.join(", "))
    })
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    let session = commands::Session::open(&cli.options)?;
    match cli.command {
        Command::Lex { expr } => commands::lex(&session, &expr),
        Command::Check { expr } => commands::check(&session, &expr),
        Command::Eval { expr } => commands::eval(&session, &expr),
        Command::Decompile { expr, to } => commands::decompile(&session, &expr, to),
        Command::Describe { expr } => commands::describe(&session, &expr),
    }
}

// ============================================================================
// Tests
// ============================================================================
