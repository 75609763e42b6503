//! In-memory federation members
//!
//! A [`MemorySource`] holds each member's triples in memory and answers
//! pattern evaluation directly. It backs tests and embedded use; production
//! deployments implement [`FederationSource`] over real member connections
//! instead.

use crate::algebra::{Operator, Term, TriplePattern};
use crate::error::{FederationError, Result};
use crate::source::FederationSource;
use crate::stream::{BoxedStream, IterStream};
use async_trait::async_trait;
use weft_core::{MemberId, Solution, Value};

/// One member's triples
pub struct MemoryMember {
    id: MemberId,
    triples: Vec<(Value, Value, Value)>,
}

impl MemoryMember {
    /// Create an empty member
    pub fn new(id: impl Into<MemberId>) -> Self {
        Self {
            id: id.into(),
            triples: Vec::new(),
        }
    }

    /// This member's id
    pub fn id(&self) -> &MemberId {
        &self.id
    }

    /// Add a triple
    pub fn insert(&mut self, s: Value, p: Value, o: Value) {
        self.triples.push((s, p, o));
    }

    /// Builder-style [`MemoryMember::insert`]
    pub fn with_triple(mut self, s: Value, p: Value, o: Value) -> Self {
        self.insert(s, p, o);
        self
    }

    /// Match a pattern against this member's triples, honoring the input
    /// solution's bindings. Emitted solutions are the input merged with the
    /// pattern's matches, in insertion order.
    fn matches(&self, pattern: &TriplePattern, input: &Solution) -> Vec<Solution> {
        self.triples
            .iter()
            .filter_map(|(s, p, o)| {
                let solution = unify(input.clone(), &pattern.s, s)?;
                let solution = unify(solution, &pattern.p, p)?;
                unify(solution, &pattern.o, o)
            })
            .collect()
    }
}

fn unify(solution: Solution, term: &Term, value: &Value) -> Option<Solution> {
    match term {
        Term::Const(constant) => (constant == value).then_some(solution),
        Term::Var(var) => match solution.get(var) {
            Some(bound) => (bound == value).then_some(solution),
            None => Some(solution.with(var.clone(), value.clone())),
        },
    }
}

/// A federation source over in-memory members
#[derive(Default)]
pub struct MemorySource {
    members: Vec<MemoryMember>,
}

impl MemorySource {
    /// Create an empty federation
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member
    pub fn with_member(mut self, member: MemoryMember) -> Self {
        self.members.push(member);
        self
    }

    fn member(&self, id: &MemberId) -> Result<&MemoryMember> {
        self.members
            .iter()
            .find(|m| m.id() == id)
            .ok_or_else(|| FederationError::member(id.clone(), "unknown member"))
    }
}

#[async_trait]
impl FederationSource for MemorySource {
    async fn evaluate_pattern(
        &self,
        pattern: &TriplePattern,
        input: &Solution,
        member: Option<&MemberId>,
    ) -> Result<BoxedStream> {
        let solutions = match member {
            Some(id) => self.member(id)?.matches(pattern, input),
            None => self
                .members
                .iter()
                .flat_map(|m| m.matches(pattern, input))
                .collect(),
        };
        Ok(Box::new(IterStream::new(solutions)))
    }

    async fn evaluate_member_owned(
        &self,
        member: &MemberId,
        plan: &Operator,
        input: &Solution,
    ) -> Result<Option<BoxedStream>> {
        // Single patterns are answered member-side; anything larger falls
        // back to generic evaluation scoped to the member.
        match plan {
            Operator::Pattern(pattern) => {
                let stream = self.evaluate_pattern(pattern, input, Some(member)).await?;
                Ok(Some(stream))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> MemoryMember {
        MemoryMember::new("members/people")
            .with_triple(
                Value::iri("urn:alice"),
                Value::iri("urn:name"),
                Value::string("Alice"),
            )
            .with_triple(
                Value::iri("urn:bob"),
                Value::iri("urn:name"),
                Value::string("Bob"),
            )
            .with_triple(
                Value::iri("urn:alice"),
                Value::iri("urn:age"),
                Value::long(42),
            )
    }

    fn name_pattern() -> TriplePattern {
        TriplePattern::new(
            Term::var("s"),
            Term::Const(Value::iri("urn:name")),
            Term::var("name"),
        )
    }

    #[test]
    fn test_pattern_matching() {
        let matches = member().matches(&name_pattern(), &Solution::new());
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].get("name"), Some(&Value::string("Alice")));
        assert_eq!(matches[1].get("name"), Some(&Value::string("Bob")));
    }

    #[test]
    fn test_input_bindings_constrain_matches() {
        let input = Solution::new().with("s", Value::iri("urn:bob"));
        let matches = member().matches(&name_pattern(), &input);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("name"), Some(&Value::string("Bob")));
    }

    #[test]
    fn test_repeated_variable_must_unify() {
        // ?x ?p ?x only matches triples whose subject equals their object
        let pattern = TriplePattern::new(Term::var("x"), Term::var("p"), Term::var("x"));
        assert!(member().matches(&pattern, &Solution::new()).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_member_is_an_error() {
        let source = MemorySource::new().with_member(member());
        let unknown = MemberId::new("members/unknown");
        let result = source
            .evaluate_pattern(&name_pattern(), &Solution::new(), Some(&unknown))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_member_owned_declines_composite_plans() {
        let source = MemorySource::new().with_member(member());
        let id = MemberId::new("members/people");
        let plan = Operator::join(
            Operator::Pattern(name_pattern()),
            Operator::Pattern(name_pattern()),
        );
        let answer = source
            .evaluate_member_owned(&id, &plan, &Solution::new())
            .await
            .unwrap();
        assert!(answer.is_none());
    }
}
