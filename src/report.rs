//! Rule status reporting.
//!
//! A runtime error can cross several evaluation layers (an action that evaluates another rule, a
//! macro evaluated while parsing) and every layer may try to report it. The reporter renders each
//! error once and leaves already-reported errors alone.

use sigscript_core::errors::RuntimeError;
use sigscript_core::lang::messages::{EnglishCatalog, MessageCatalog};

/// A visible status line attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStatus {
    pub rule: String,
    pub key: &'static str,
    pub message: String,
}

pub struct ErrorReporter {
    catalog: Box<dyn MessageCatalog>,
    statuses: Vec<RuleStatus>,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(Box::new(EnglishCatalog))
    }
}

impl ErrorReporter {
    pub fn new(catalog: Box<dyn MessageCatalog>) -> Self {
        Self {
            catalog,
            statuses: Vec::new(),
        }
    }

    /// Record a status for `err` against `rule` and mark it reported.
    ///
    /// ## Returns
    /// - `None` if an inner layer already reported this error.
    pub fn report(&mut self, rule: &str, err: &mut RuntimeError) -> Option<&RuleStatus> {
        if err.is_reported() {
            tracing::trace!(rule, "error already reported");
            return None;
        }
        err.mark_reported();
        let message = err.message().render(self.catalog.as_ref());
        tracing::warn!(rule, key = err.message().key(), %message, "rule failed");
        self.statuses.push(RuleStatus {
            rule: rule.to_string(),
            key: err.message().key(),
            message,
        });
        self.statuses.last()
    }

    /// Report the error of `result`, if any, and pass the result through.
    pub fn check<T>(&mut self, rule: &str, result: Result<T, RuntimeError>) -> Result<T, RuntimeError> {
        result.map_err(|mut err| {
            self.report(rule, &mut err);
            err
        })
    }

    pub fn statuses(&self) -> &[RuleStatus] {
        &self.statuses
    }

    pub fn clear(&mut self) {
        self.statuses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineConfig};
    use sigscript_core::capabilities::{ActionDefinition, ActionExecutor, SignalDefinition};
    use sigscript_core::static_registry::StaticRegistry;
    use sigscript_core::value::{ScriptValue, ValueType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> Engine {
        let registry = StaticRegistry::new().with_signal(
            SignalDefinition::new("Room.Temp", ValueType::Number),
            ScriptValue::from_int(21),
        );
        Engine::new(registry.shared(), EngineConfig::default())
    }

    #[test]
    fn test_reports_once_across_layers() {
        let engine = engine();
        let inner = engine.parse("Room.Temp / 0 > 1").unwrap();
        let mut reporter = ErrorReporter::default();

        let inner_result = reporter.check("inner", inner.test());
        let mut err = inner_result.unwrap_err();
        assert!(err.is_reported());
        assert!(reporter.report("outer", &mut err).is_none());

        assert_eq!(reporter.statuses().len(), 1);
        assert_eq!(reporter.statuses()[0].rule, "inner");
        assert_eq!(reporter.statuses()[0].message, "division by zero");
    }

    #[test]
    fn test_action_handler_failure_is_reported_once() {
        let reporter = Rc::new(RefCell::new(ErrorReporter::default()));
        let inner = engine().parse("Room.Temp / 0 > 1").unwrap();
        let handler_reporter = Rc::clone(&reporter);
        let handler: ActionExecutor = Rc::new(move |_args: &[ScriptValue]| {
            handler_reporter.borrow_mut().check("inner", inner.test()).map(|_| ())
        });
        let host = StaticRegistry::new().with_action_handler(ActionDefinition::new("Rule.Inner"), handler);
        let outer = Engine::new(host.shared(), EngineConfig::default())
            .parse("Rule.Inner()")
            .unwrap();

        let result = outer.execute();
        let err = reporter.borrow_mut().check("outer", result).unwrap_err();
        assert!(err.is_reported());

        let reporter = reporter.borrow();
        assert_eq!(reporter.statuses().len(), 1);
        assert_eq!(reporter.statuses()[0].rule, "inner");
        assert_eq!(reporter.statuses()[0].key, "error.division_by_zero");
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn test_successful_results_leave_no_status() {
        let engine = engine();
        let expr = engine.parse("Room.Temp > 20").unwrap();
        let mut reporter = ErrorReporter::default();
        assert!(reporter.check("warm", expr.test()).unwrap());
        assert!(reporter.statuses().is_empty());
    }
}
