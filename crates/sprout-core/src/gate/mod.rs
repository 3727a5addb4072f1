//! Gate-expression evaluation against per-learner facts.
//!
//! The DSL references three fact functions -- `level('ID')`,
//! `confidence('ID')`, `age()` -- combined with arithmetic, comparisons,
//! `&&`/`||`, and parentheses. Expressions are parsed by a constrained
//! recursive-descent parser and interpreted over an AST; learner- or
//! config-supplied text is never executed as code.
//!
//! [`evaluate_gate`] is total: malformed or unsafe input logs a diagnostic
//! and evaluates to `false`, so a broken prerequisite fails closed while a
//! broken boost/block fails open toward "no effect".

pub mod ast;
pub mod parser;

use tracing::warn;

use sprout_types::learner::LearnerState;

pub use ast::Expr;
pub use parser::ExprParseError;

// ---------------------------------------------------------------------------
// Fact providers
// ---------------------------------------------------------------------------

/// Capability interface the DSL's fact functions are interpreted against.
pub trait FactProvider {
    /// Recorded level for a node, 0..3. Unknown nodes are 0.
    fn level(&self, node_id: &str) -> f64;
    /// Recorded confidence for a node, 0..1. Unknown nodes are 0.
    fn confidence(&self, node_id: &str) -> f64;
    /// Learner age in months.
    fn age_months(&self) -> f64;
}

/// Neutral provider: every level and confidence is zero, age is fixed.
/// Useful before any observations exist for a learner.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFacts {
    pub age_months: f64,
}

impl NullFacts {
    pub fn at_age(age_months: f64) -> Self {
        Self { age_months }
    }
}

impl FactProvider for NullFacts {
    fn level(&self, _node_id: &str) -> f64 {
        0.0
    }

    fn confidence(&self, _node_id: &str) -> f64 {
        0.0
    }

    fn age_months(&self) -> f64 {
        self.age_months
    }
}

/// Provider backed by a learner's recorded skill states.
#[derive(Debug, Clone, Copy)]
pub struct StateFacts<'a> {
    state: &'a LearnerState,
    age_months: f64,
}

impl<'a> StateFacts<'a> {
    pub fn new(state: &'a LearnerState, age_months: f64) -> Self {
        Self { state, age_months }
    }
}

impl FactProvider for StateFacts<'_> {
    fn level(&self, node_id: &str) -> f64 {
        self.state.get(node_id).level
    }

    fn confidence(&self, node_id: &str) -> f64 {
        self.state.get(node_id).confidence
    }

    fn age_months(&self) -> f64 {
        self.age_months
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Evaluate a gate expression to a boolean. Never raises: any lex, parse,
/// or evaluation anomaly is reported as a warning and yields `false`.
pub fn evaluate_gate(expr: &str, facts: &dyn FactProvider) -> bool {
    match parser::parse(expr) {
        Ok(ast) => ast.eval(facts).truthy(),
        Err(err) => {
            warn!(expr, %err, "rejected gate expression");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_types::learner::SkillState;

    fn facts_with(node_id: &str, level: f64, confidence: f64) -> LearnerState {
        let mut state = LearnerState::new();
        state.insert(
            node_id,
            SkillState {
                level,
                confidence,
                evidence: 1,
            },
        );
        state
    }

    // -----------------------------------------------------------------------
    // Happy paths
    // -----------------------------------------------------------------------

    #[test]
    fn test_plain_numeric_comparison() {
        assert!(evaluate_gate("2 >= 1", &NullFacts::default()));
        assert!(!evaluate_gate("1 > 2", &NullFacts::default()));
    }

    #[test]
    fn test_level_fact_comparison() {
        let state = facts_with("X", 2.0, 0.0);
        let facts = StateFacts::new(&state, 0.0);
        assert!(evaluate_gate("level('X') >= 2", &facts));
        assert!(!evaluate_gate("level('X') > 2", &facts));
    }

    #[test]
    fn test_confidence_and_age_facts() {
        let state = facts_with("X", 1.0, 0.7);
        let facts = StateFacts::new(&state, 14.0);
        assert!(evaluate_gate("confidence('X') >= 0.5 && age() >= 12", &facts));
        assert!(!evaluate_gate("confidence('X') >= 0.8 && age() >= 12", &facts));
    }

    #[test]
    fn test_arithmetic_combination_of_facts() {
        let mut state = LearnerState::new();
        state.insert("A", SkillState { level: 1.0, confidence: 0.0, evidence: 0 });
        state.insert("B", SkillState { level: 2.0, confidence: 0.0, evidence: 0 });
        let facts = StateFacts::new(&state, 0.0);
        assert!(evaluate_gate("level('A') + level('B') >= 3", &facts));
        assert!(evaluate_gate("(level('A') + level('B')) / 2 >= 1.5", &facts));
    }

    #[test]
    fn test_or_short_circuit_semantics() {
        let facts = NullFacts::at_age(20.0);
        assert!(evaluate_gate("level('X') >= 1 || age() > 18", &facts));
    }

    #[test]
    fn test_unknown_node_reads_as_zero() {
        let state = LearnerState::new();
        let facts = StateFacts::new(&state, 0.0);
        assert!(evaluate_gate("level('NEVER-SEEN') <= 0", &facts));
    }

    // -----------------------------------------------------------------------
    // Totality: hostile or malformed input always yields false
    // -----------------------------------------------------------------------

    #[test]
    fn test_statement_injection_is_false() {
        assert!(!evaluate_gate("level('X'); doEvil()", &NullFacts::default()));
    }

    #[test]
    fn test_arbitrary_garbage_is_false() {
        for bad in [
            "",
            ")(",
            "level(",
            "age() >",
            "import os",
            "1 +",
            "&& 1",
            "level('X') ** 2",
            "\u{0}\u{1}\u{2}",
            "🌱 > 1",
        ] {
            assert!(
                !evaluate_gate(bad, &NullFacts::default()),
                "expected false for {bad:?}"
            );
        }
    }

    #[test]
    fn test_pathological_input_sizes_are_false_not_fatal() {
        // Deeply nested or very long inputs must evaluate to false, never
        // exhaust the stack.
        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(!evaluate_gate(&parens, &NullFacts::default()));

        let negations = format!("{}1", "-".repeat(200_000));
        assert!(!evaluate_gate(&negations, &NullFacts::default()));

        let chain = format!("1{}", " + 1".repeat(100_000));
        assert!(!evaluate_gate(&chain, &NullFacts::default()));
    }

    #[test]
    fn test_division_by_zero_is_handled() {
        // 1/0 -> inf, truthy; 0/0 -> NaN, falsy. Neither panics.
        assert!(evaluate_gate("1 / 0 > 100", &NullFacts::default()));
        assert!(!evaluate_gate("0 / 0", &NullFacts::default()));
    }
}
