//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use sigscript_core::lang::grammars::{self, GrammarId};
use sigscript_core::static_registry::StaticRegistry;
use sigscript_core::value::ScriptValue;
use sigscript_syntax::ExprType;
use sigscript_syntax::lexer::{self, tokens::SyntaxConfig};

use super::{CliError, CliResult, ExitCode, GlobalOptions};
use crate::engine::{Engine, EngineConfig, Expression, ScriptError};
use crate::host::HostFixture;
use crate::report::ErrorReporter;

// ============================================================================
// Session setup (shared by every command)
// ============================================================================

/// An engine bound to the host the command runs against.
pub struct Session {
    engine: Engine,
    host: StaticRegistry,
}

impl Session {
    pub fn open(options: &GlobalOptions) -> CliResult<Self> {
        let host = match &options.host {
            Some(path) => HostFixture::load(path)
                .and_then(HostFixture::into_registry)
                .map_err(|e| CliError::failure(format!("Error: {e}")))?,
            None => StaticRegistry::new(),
        };
        let config = EngineConfig::new()
            .with_default_grammar(options.grammar)
            .with_strict_options(options.strict)
            .with_macros(!options.no_macros);
        Ok(Self {
            engine: Engine::new(host.shared(), config),
            host,
        })
    }

    fn parse(&self, source: &str) -> CliResult<Expression> {
        self.engine
            .parse(source)
            .map_err(|err| CliError::failure(render_error(err, source)))
    }
}

/// Render a parse failure with the offending source highlighted.
fn render_error(err: ScriptError, source: &str) -> String {
    let report = miette::Report::new(err).with_source_code(source.to_string());
    format!("{report:?}")
}

// ============================================================================
// Commands
// ============================================================================

/// Print one token per line: kind, span, text.
pub fn lex(session: &Session, source: &str) -> CliResult<ExitCode> {
    let (grammar, body) = match grammars::strip_marker(source) {
        Some((forced, rest)) => (forced, rest),
        None => (session.engine.config().default_grammar, source),
    };
    let offset = source.len() - body.len();
    let config = SyntaxConfig::for_grammar(grammar);
    let tokens = lexer::tokenize(body, &config)
        .map_err(|err| CliError::failure(render_error(ScriptError::from(err.shifted(offset)), source)))?;

    for tok in &tokens {
        println!(
            "{:<10} {:>3}..{:<3} {}",
            tok.kind.to_string(),
            tok.span.start + offset,
            tok.span.end + offset,
            tok.value
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and print the expression type with its canonical form.
pub fn check(session: &Session, source: &str) -> CliResult<ExitCode> {
    let expr = session.parse(source)?;
    println!("{}: {}", expr.expr_type(), expr.canonical());
    Ok(ExitCode::SUCCESS)
}

/// Evaluate the expression according to its type.
///
/// Conditions exit with [`ExitCode::FALSE`] when they do not hold; actions print the host calls they made.
pub fn eval(session: &Session, source: &str) -> CliResult<ExitCode> {
    let expr = session.parse(source)?;
    let mut reporter = ErrorReporter::default();
    let rule = expr.canonical();

    let result = match expr.expr_type() {
        ExprType::Boolean => reporter.check(&rule, expr.test()).map(|holds| {
            println!("{holds}");
            if holds { ExitCode::SUCCESS } else { ExitCode::FALSE }
        }),
        ExprType::Action => reporter.check(&rule, expr.execute()).map(|outcome| {
            for call in session.host.calls() {
                let args: Vec<String> = call.args.iter().map(display_value).collect();
                println!("{}({})", call.name, args.join(", "));
            }
            if outcome.deactivate {
                println!("(deactivated)");
            }
            ExitCode::SUCCESS
        }),
        _ => reporter.check(&rule, expr.value()).map(|value| {
            println!("{}", display_value(&value));
            ExitCode::SUCCESS
        }),
    };

    result.map_err(|_| {
        let message = reporter
            .statuses()
            .iter()
            .map(|status| format!("error[{}]: {}", status.key, status.message))
            .collect::<Vec<_>>()
            .join("\n");
        CliError::runtime(message)
    })
}

pub fn decompile(session: &Session, source: &str, to: Option<GrammarId>) -> CliResult<ExitCode> {
    let expr = session.parse(source)?;
    let target = to.unwrap_or(expr.grammar());
    println!("{}", session.engine.decompile(&expr, target));
    Ok(ExitCode::SUCCESS)
}

pub fn describe(session: &Session, source: &str) -> CliResult<ExitCode> {
    let expr = session.parse(source)?;
    println!("{}", session.engine.describe(&expr));
    Ok(ExitCode::SUCCESS)
}

fn display_value(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Unset => "unset".to_string(),
        ScriptValue::String(s) => sigscript_syntax::decompile::quote(s),
        ScriptValue::Number(_) => value.as_string(),
    }
}
