//! Condition expressions and their evaluation
//!
//! Conditions restrict which right-hand matches survive an optional join.
//! Evaluation uses two-valued logic and reports every anomaly - an unbound
//! variable, an incomparable pair of operands, a non-boolean result - as a
//! recoverable [`ConditionError`] so the caller can treat the candidate as
//! filtered out and keep going.
//!
//! Numeric comparisons coerce `Long`↔`Double`. Everything else compares
//! only within its own kind; `!=` on incomparable operands is `true`, `=`
//! is `false`, and order comparisons are a type mismatch.

use crate::error::ConditionError;
use std::cmp::Ordering;
use std::sync::Arc;
use weft_core::{Solution, Value};

/// Comparison operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

/// A condition expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Variable reference
    Var(Arc<str>),
    /// Constant value
    Const(Value),
    /// Comparison of two sub-expressions
    Compare(CompareOp, Box<Expression>, Box<Expression>),
    /// Logical conjunction (short-circuit)
    And(Box<Expression>, Box<Expression>),
    /// Logical disjunction (short-circuit)
    Or(Box<Expression>, Box<Expression>),
    /// Logical negation
    Not(Box<Expression>),
    /// True iff the named variable is bound
    Bound(Arc<str>),
}

impl Expression {
    /// Variable reference
    pub fn var(name: impl AsRef<str>) -> Self {
        Expression::Var(Arc::from(name.as_ref()))
    }

    /// Constant value
    pub fn value(value: Value) -> Self {
        Expression::Const(value)
    }

    /// `left = right`
    pub fn eq(left: Expression, right: Expression) -> Self {
        Expression::Compare(CompareOp::Eq, Box::new(left), Box::new(right))
    }

    /// `left != right`
    pub fn ne(left: Expression, right: Expression) -> Self {
        Expression::Compare(CompareOp::Ne, Box::new(left), Box::new(right))
    }

    /// `left < right`
    pub fn lt(left: Expression, right: Expression) -> Self {
        Expression::Compare(CompareOp::Lt, Box::new(left), Box::new(right))
    }

    /// `left <= right`
    pub fn le(left: Expression, right: Expression) -> Self {
        Expression::Compare(CompareOp::Le, Box::new(left), Box::new(right))
    }

    /// `left > right`
    pub fn gt(left: Expression, right: Expression) -> Self {
        Expression::Compare(CompareOp::Gt, Box::new(left), Box::new(right))
    }

    /// `left >= right`
    pub fn ge(left: Expression, right: Expression) -> Self {
        Expression::Compare(CompareOp::Ge, Box::new(left), Box::new(right))
    }

    /// Logical conjunction
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    /// Logical disjunction
    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    /// Logical negation
    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    /// Bound check
    pub fn bound(name: impl AsRef<str>) -> Self {
        Expression::Bound(Arc::from(name.as_ref()))
    }
}

/// Evaluate a condition against a solution
pub fn evaluate(expr: &Expression, solution: &Solution) -> Result<bool, ConditionError> {
    match evaluate_value(expr, solution)? {
        Value::Boolean(b) => Ok(b),
        other => Err(ConditionError::NotBoolean(other.kind())),
    }
}

fn evaluate_value(expr: &Expression, solution: &Solution) -> Result<Value, ConditionError> {
    match expr {
        Expression::Var(name) => solution
            .get(name)
            .cloned()
            .ok_or_else(|| ConditionError::UnboundVariable(name.clone())),
        Expression::Const(value) => Ok(value.clone()),
        Expression::Compare(op, left, right) => {
            let left = evaluate_value(left, solution)?;
            let right = evaluate_value(right, solution)?;
            compare(*op, &left, &right).map(Value::Boolean)
        }
        Expression::And(left, right) => {
            if !evaluate(left, solution)? {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(evaluate(right, solution)?))
        }
        Expression::Or(left, right) => {
            if evaluate(left, solution)? {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(evaluate(right, solution)?))
        }
        Expression::Not(inner) => Ok(Value::Boolean(!evaluate(inner, solution)?)),
        Expression::Bound(name) => Ok(Value::Boolean(solution.is_bound(name))),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, ConditionError> {
    let ordering = partial_compare(left, right);
    match op {
        CompareOp::Eq => Ok(ordering == Some(Ordering::Equal)),
        CompareOp::Ne => Ok(ordering != Some(Ordering::Equal)),
        CompareOp::Lt => ordered(left, right, ordering).map(|o| o == Ordering::Less),
        CompareOp::Le => ordered(left, right, ordering).map(|o| o != Ordering::Greater),
        CompareOp::Gt => ordered(left, right, ordering).map(|o| o == Ordering::Greater),
        CompareOp::Ge => ordered(left, right, ordering).map(|o| o != Ordering::Less),
    }
}

fn ordered(
    left: &Value,
    right: &Value,
    ordering: Option<Ordering>,
) -> Result<Ordering, ConditionError> {
    ordering.ok_or(ConditionError::TypeMismatch {
        left: left.kind(),
        right: right.kind(),
    })
}

/// Order two values, or `None` if they are incomparable (which includes NaN)
fn partial_compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
        (Value::Long(a), Value::Double(b)) => (*a as f64).partial_cmp(b),
        (Value::Double(a), Value::Long(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Iri(a), Value::Iri(b)) => (a == b).then_some(Ordering::Equal),
        _ => None,
    }
}
