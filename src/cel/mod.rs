use std::collections::{HashMap, HashSet};

use cel_interpreter::{Context, Program};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::IntegrationError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier regex is valid"));

/// Compiles and evaluates CEL boolean expressions over integration-name variables (§4.7). Each
/// known integration name is declared once at construction; `evaluate` reports exactly which of
/// the referenced names are missing when the expression doesn't hold.
pub struct CelEvaluator {
    known_names: HashSet<String>,
}

impl CelEvaluator {
    pub fn new(known_names: impl IntoIterator<Item = String>) -> Self {
        CelEvaluator {
            known_names: known_names.into_iter().collect(),
        }
    }

    /// Compiles `expression`, binds each known name to `configured[name]` (absent ⇒ `false`), and
    /// evaluates it. On `false`, the returned `ErrMissingIntegrations` names exactly the
    /// referenced variables that are not configured (§4.7, §8).
    pub fn evaluate(&self, configured: &HashMap<String, bool>, expression: &str) -> Result<(), IntegrationError> {
        if expression.trim().is_empty() {
            return Ok(());
        }

        let program = Program::compile(expression).map_err(|err| IntegrationError::InvalidExpression {
            expression: expression.to_string(),
            reason: err.to_string(),
        })?;

        let mut referenced = identifiers(expression);
        referenced.sort();
        referenced.dedup();
        if let Some(undeclared) = referenced.iter().find(|name| !self.known_names.contains(*name)) {
            return Err(IntegrationError::InvalidExpression {
                expression: expression.to_string(),
                reason: format!("undeclared integration name: {undeclared}"),
            });
        }

        let mut context = Context::default();
        for name in &self.known_names {
            let value = *configured.get(name).unwrap_or(&false);
            context
                .add_variable(name.as_str(), value)
                .map_err(|err| IntegrationError::InvalidExpression {
                    expression: expression.to_string(),
                    reason: err.to_string(),
                })?;
        }

        let result = program.execute(&context).map_err(|err| IntegrationError::InvalidExpression {
            expression: expression.to_string(),
            reason: err.to_string(),
        })?;

        let truthy = matches!(result, cel_interpreter::Value::Bool(true));
        if truthy {
            return Ok(());
        }

        let missing: Vec<String> = referenced
            .into_iter()
            .filter(|name| !*configured.get(name).unwrap_or(&false))
            .collect();
        Err(IntegrationError::MissingIntegrations {
            expression: expression.to_string(),
            missing,
        })
    }
}

/// Extracts every standalone identifier token referenced in `expression`, excluding CEL's
/// reserved literals (`true`/`false`/`null`) and names immediately followed by `(` — those are
/// function or macro calls (e.g. `has(...)`), not integration-name variables. Used both to
/// pre-validate that every referenced name is declared (§4.7 step 1, §8) and, on a `false`
/// result, to report exactly which referenced names are missing — `cel-interpreter` does not
/// expose a variable-reference walk directly.
fn identifiers(expression: &str) -> Vec<String> {
    IDENTIFIER
        .find_iter(expression)
        .filter(|m| !matches!(m.as_str(), "true" | "false" | "null"))
        .filter(|m| expression[m.end()..].trim_start().chars().next() != Some('('))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(pairs: &[(&str, bool)]) -> HashMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn empty_expression_trivially_succeeds() {
        let evaluator = CelEvaluator::new(["i1".to_string()]);
        assert!(evaluator.evaluate(&configured(&[]), "").is_ok());
    }

    #[test]
    fn true_expression_succeeds() {
        let evaluator = CelEvaluator::new(["i1".to_string()]);
        assert!(evaluator.evaluate(&configured(&[("i1", true)]), "i1").is_ok());
    }

    #[test]
    fn false_expression_reports_missing_names() {
        let evaluator = CelEvaluator::new(["i1".to_string(), "i2".to_string()]);
        let err = evaluator.evaluate(&configured(&[("i1", true), ("i2", false)]), "i1 && i2").unwrap_err();
        match err {
            IntegrationError::MissingIntegrations { missing, .. } => assert_eq!(missing, vec!["i2".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undeclared_name_is_an_invalid_expression() {
        let evaluator = CelEvaluator::new(["i1".to_string()]);
        let err = evaluator.evaluate(&configured(&[]), "i1 && undeclared").unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidExpression { .. }));
    }

    /// `i1` unconfigured would short-circuit `i1 && undeclared` to `false` without ever
    /// evaluating `undeclared` at runtime — pre-validation must still catch the undeclared name.
    #[test]
    fn undeclared_name_is_caught_even_when_short_circuited_away() {
        let evaluator = CelEvaluator::new(["i1".to_string()]);
        let err = evaluator.evaluate(&configured(&[("i1", false)]), "i1 && undeclared").unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidExpression { .. }));
    }

    #[test]
    fn identifiers_excludes_literals_and_call_names() {
        assert_eq!(identifiers("i1 && (true || i2)"), vec!["i1".to_string(), "i2".to_string()]);
        assert_eq!(identifiers("size(i1) > 0"), vec!["i1".to_string()]);
    }
}
