//! AST and interpreter for the gate-expression DSL.
//!
//! Expressions are interpreted directly against a [`FactProvider`]; no text
//! substitution and no dynamic code execution anywhere. Numeric/boolean
//! coercion is loose on purpose: booleans are 1/0 in arithmetic, and a
//! number is truthy iff it is non-zero and not NaN.

use super::FactProvider;

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

/// A parsed gate expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// `age()` -- the learner's age in months.
    Age,
    /// `level('NODE_ID')` -- recorded level for a node, 0..3.
    Level(String),
    /// `confidence('NODE_ID')` -- recorded confidence for a node, 0..1.
    Confidence(String),
    Neg(Box<Expr>),
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Result of evaluating an expression node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
}

impl Value {
    /// Numeric view: booleans coerce to 1/0.
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Num(n) => n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }

    /// Boolean view: a number is truthy iff non-zero and not NaN.
    pub fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Num(n) => n != 0.0 && !n.is_nan(),
        }
    }
}

impl Expr {
    /// Interpret the expression against the given facts.
    pub fn eval(&self, facts: &dyn FactProvider) -> Value {
        match self {
            Expr::Number(n) => Value::Num(*n),
            Expr::Age => Value::Num(facts.age_months()),
            Expr::Level(id) => Value::Num(facts.level(id)),
            Expr::Confidence(id) => Value::Num(facts.confidence(id)),
            Expr::Neg(inner) => Value::Num(-inner.eval(facts).as_f64()),
            Expr::Arith { op, lhs, rhs } => {
                let (a, b) = (lhs.eval(facts).as_f64(), rhs.eval(facts).as_f64());
                Value::Num(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                })
            }
            Expr::Compare { op, lhs, rhs } => {
                let (a, b) = (lhs.eval(facts).as_f64(), rhs.eval(facts).as_f64());
                Value::Bool(match op {
                    CompareOp::Gt => a > b,
                    CompareOp::Ge => a >= b,
                    CompareOp::Lt => a < b,
                    CompareOp::Le => a <= b,
                    CompareOp::Eq => a == b,
                    CompareOp::Ne => a != b,
                })
            }
            Expr::And(lhs, rhs) => Value::Bool(lhs.eval(facts).truthy() && rhs.eval(facts).truthy()),
            Expr::Or(lhs, rhs) => Value::Bool(lhs.eval(facts).truthy() || rhs.eval(facts).truthy()),
        }
    }
}
