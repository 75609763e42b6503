//! Query algebra types
//!
//! Operators form an immutable plan tree produced upstream (parsing and
//! source selection are not this crate's job). The dispatcher walks the tree
//! and wires child output streams into the appropriate pipeline per variant.
//!
//! The operator set is deliberately closed and matched exhaustively: new
//! variants are an API change, not a runtime surprise.

use crate::expression::Expression;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use weft_core::{MemberId, Value};

/// A term in a triple pattern - variable or constant
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// Variable binding
    Var(Arc<str>),
    /// Constant value
    Const(Value),
}

impl Term {
    /// Create a variable term
    pub fn var(name: impl AsRef<str>) -> Self {
        Term::Var(Arc::from(name.as_ref()))
    }

    /// Check if this term is a variable
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Get the variable name if this is a Var term
    pub fn as_var(&self) -> Option<&Arc<str>> {
        match self {
            Term::Var(v) => Some(v),
            Term::Const(_) => None,
        }
    }
}

/// A triple pattern for matching against a member's data
///
/// Each position can be a variable or a constant.
#[derive(Clone, Debug, PartialEq)]
pub struct TriplePattern {
    /// Subject term
    pub s: Term,
    /// Predicate term
    pub p: Term,
    /// Object term
    pub o: Term,
}

impl TriplePattern {
    /// Create a new triple pattern
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Self { s, p, o }
    }

    /// Get the variables in this pattern (in order: s, p, o)
    pub fn variables(&self) -> Vec<Arc<str>> {
        [&self.s, &self.p, &self.o]
            .into_iter()
            .filter_map(|t| t.as_var().cloned())
            .collect()
    }
}

/// A node in the query plan
///
/// Operators are immutable: owned only by the plan tree, never mutated
/// during evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    /// Leaf triple pattern, answered by the federation's triple source
    Pattern(TriplePattern),
    /// Inner join of two sub-plans
    Join {
        /// Driving (left) sub-plan
        left: Box<Operator>,
        /// Sub-plan evaluated once per left solution
        right: Box<Operator>,
    },
    /// Inner join of two or more sub-plans, folded left-to-right
    NaryJoin {
        /// Join arguments in evaluation order
        args: Vec<Operator>,
    },
    /// Left outer join (OPTIONAL) with an optional post-join condition
    LeftJoin {
        /// Required (left) sub-plan
        left: Box<Operator>,
        /// Optional (right) sub-plan
        right: Box<Operator>,
        /// Condition restricting which right matches survive
        condition: Option<Expression>,
    },
    /// Union of two sub-plans (no ordering across branches)
    Union {
        /// First branch
        left: Box<Operator>,
        /// Second branch
        right: Box<Operator>,
    },
    /// Sub-plan owned by a single member, which may evaluate it wholesale
    MemberOwned {
        /// The owning member
        member: MemberId,
        /// The sub-plan to evaluate at that member
        arg: Box<Operator>,
    },
}

impl Operator {
    /// Inner join constructor
    pub fn join(left: Operator, right: Operator) -> Self {
        Operator::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// N-ary inner join constructor
    pub fn nary_join(args: Vec<Operator>) -> Self {
        Operator::NaryJoin { args }
    }

    /// Left outer join constructor
    pub fn left_join(left: Operator, right: Operator, condition: Option<Expression>) -> Self {
        Operator::LeftJoin {
            left: Box::new(left),
            right: Box::new(right),
            condition,
        }
    }

    /// Union constructor
    pub fn union(left: Operator, right: Operator) -> Self {
        Operator::Union {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Member-owned sub-plan constructor
    pub fn member_owned(member: MemberId, arg: Operator) -> Self {
        Operator::MemberOwned {
            member,
            arg: Box::new(arg),
        }
    }

    /// Short name of this operator's variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Operator::Pattern(_) => "pattern",
            Operator::Join { .. } => "join",
            Operator::NaryJoin { .. } => "nary-join",
            Operator::LeftJoin { .. } => "left-join",
            Operator::Union { .. } => "union",
            Operator::MemberOwned { .. } => "member-owned",
        }
    }

    /// The free variables of this sub-plan
    ///
    /// For a left join these are the variables of both arguments; condition
    /// variables do not contribute (a condition can only observe, never
    /// bind).
    pub fn free_variables(&self) -> FxHashSet<Arc<str>> {
        let mut vars = FxHashSet::default();
        self.collect_free_variables(&mut vars);
        vars
    }

    fn collect_free_variables(&self, vars: &mut FxHashSet<Arc<str>>) {
        match self {
            Operator::Pattern(pattern) => {
                vars.extend(pattern.variables());
            }
            Operator::Join { left, right }
            | Operator::LeftJoin { left, right, .. }
            | Operator::Union { left, right } => {
                left.collect_free_variables(vars);
                right.collect_free_variables(vars);
            }
            Operator::NaryJoin { args } => {
                for arg in args {
                    arg.collect_free_variables(vars);
                }
            }
            Operator::MemberOwned { arg, .. } => {
                arg.collect_free_variables(vars);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str, p: &str, o: &str) -> TriplePattern {
        let term = |t: &str| {
            if let Some(name) = t.strip_prefix('?') {
                Term::var(name)
            } else {
                Term::Const(Value::iri(t))
            }
        };
        TriplePattern::new(term(s), term(p), term(o))
    }

    #[test]
    fn test_pattern_variables() {
        let p = pattern("?s", "urn:name", "?name");
        assert_eq!(p.variables(), vec![Arc::from("s"), Arc::from("name")]);
        assert!(p.s.is_var());
        assert!(!p.p.is_var());
    }

    #[test]
    fn test_free_variables_nested() {
        let op = Operator::left_join(
            Operator::Pattern(pattern("?s", "urn:name", "?name")),
            Operator::Pattern(pattern("?s", "urn:email", "?email")),
            None,
        );
        let vars = op.free_variables();
        assert_eq!(vars.len(), 3);
        assert!(vars.contains("s"));
        assert!(vars.contains("name"));
        assert!(vars.contains("email"));
    }

    #[test]
    fn test_condition_vars_are_not_free() {
        let op = Operator::left_join(
            Operator::Pattern(pattern("?s", "urn:name", "?name")),
            Operator::Pattern(pattern("?s", "urn:age", "?age")),
            Some(Expression::gt(
                Expression::var("age"),
                Expression::value(Value::long(18)),
            )),
        );
        // ?age is free because the right pattern binds it, but a condition
        // mentioning a variable bound nowhere would not make it free.
        let vars = op.free_variables();
        assert_eq!(vars.len(), 3);
    }
}
