//! Solution binding sets
//!
//! A [`Solution`] is one (partial or complete) query result row: a mapping
//! from variable name to [`Value`]. Solutions are immutable by contract -
//! every operation returns a new solution rather than mutating in place, so
//! a solution handed to a background pipeline can never change under it.
//!
//! Two solutions are *compatible* iff they agree on every shared variable;
//! merging two compatible solutions unions their mappings. This is the
//! unification rule every join in the engine relies on.

use crate::value::Value;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// A variable→value binding set (one result row)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    bindings: FxHashMap<Arc<str>, Value>,
}

impl Solution {
    /// Create an empty solution (the unit of joining)
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value bound to a variable
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.bindings.get(var)
    }

    /// Check whether a variable is bound
    pub fn is_bound(&self, var: &str) -> bool {
        self.bindings.contains_key(var)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether no variables are bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Return a new solution with one additional binding
    ///
    /// An existing binding for the same variable is replaced; callers that
    /// need conflict detection use [`Solution::merged`] instead.
    pub fn with(&self, var: impl Into<Arc<str>>, value: Value) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.insert(var.into(), value);
        Self { bindings }
    }

    /// Iterate over the bound variable names
    pub fn bound_vars(&self) -> impl Iterator<Item = &Arc<str>> {
        self.bindings.keys()
    }

    /// Iterate over (variable, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.bindings.iter()
    }

    /// Check join compatibility: all shared variables agree
    pub fn is_compatible(&self, other: &Solution) -> bool {
        self.bindings
            .iter()
            .all(|(var, value)| other.get(var).map_or(true, |v| v == value))
    }

    /// Merge two solutions, or `None` if they disagree on a shared variable
    pub fn merged(&self, other: &Solution) -> Option<Solution> {
        if !self.is_compatible(other) {
            return None;
        }
        let mut bindings = self.bindings.clone();
        for (var, value) in &other.bindings {
            bindings
                .entry(var.clone())
                .or_insert_with(|| value.clone());
        }
        Some(Solution { bindings })
    }

    /// Restrict to the given variable scope
    pub fn project(&self, scope: &FxHashSet<Arc<str>>) -> Solution {
        let bindings = self
            .bindings
            .iter()
            .filter(|(var, _)| scope.contains(*var))
            .map(|(var, value)| (var.clone(), value.clone()))
            .collect();
        Solution { bindings }
    }

    /// Return a new solution with the named variables removed
    pub fn without(&self, vars: &[Arc<str>]) -> Solution {
        let bindings = self
            .bindings
            .iter()
            .filter(|(var, _)| !vars.contains(*var))
            .map(|(var, value)| (var.clone(), value.clone()))
            .collect();
        Solution { bindings }
    }
}

impl FromIterator<(Arc<str>, Value)> for Solution {
    fn from_iter<I: IntoIterator<Item = (Arc<str>, Value)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol(pairs: &[(&str, Value)]) -> Solution {
        pairs
            .iter()
            .map(|(v, val)| (Arc::from(*v), val.clone()))
            .collect()
    }

    #[test]
    fn test_with_does_not_mutate() {
        let a = Solution::new().with("x", Value::long(1));
        let b = a.with("y", Value::long(2));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("x"), Some(&Value::long(1)));
    }

    #[test]
    fn test_compatibility() {
        let a = sol(&[("x", Value::long(1)), ("y", Value::long(2))]);
        let b = sol(&[("y", Value::long(2)), ("z", Value::long(3))]);
        let c = sol(&[("y", Value::long(9))]);

        assert!(a.is_compatible(&b));
        assert!(b.is_compatible(&a));
        assert!(!a.is_compatible(&c));

        // The empty solution is compatible with anything
        assert!(Solution::new().is_compatible(&a));
        assert!(a.is_compatible(&Solution::new()));
    }

    #[test]
    fn test_merged() {
        let a = sol(&[("x", Value::long(1))]);
        let b = sol(&[("y", Value::long(2))]);
        let merged = a.merged(&b).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("x"), Some(&Value::long(1)));
        assert_eq!(merged.get("y"), Some(&Value::long(2)));

        let conflicting = sol(&[("x", Value::long(9))]);
        assert!(a.merged(&conflicting).is_none());
    }

    #[test]
    fn test_project_and_without() {
        let a = sol(&[("x", Value::long(1)), ("y", Value::long(2))]);

        let scope: FxHashSet<Arc<str>> = [Arc::from("x")].into_iter().collect();
        let projected = a.project(&scope);
        assert_eq!(projected.len(), 1);
        assert!(projected.is_bound("x"));
        assert!(!projected.is_bound("y"));

        let stripped = a.without(&[Arc::from("y")]);
        assert_eq!(stripped.len(), 1);
        assert!(stripped.is_bound("x"));
    }
}
