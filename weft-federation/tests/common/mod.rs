//! Shared fixtures for federation integration tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{MemberId, Solution, Value};
use weft_federation::source::FederationSource;
use weft_federation::stream::{BoxedStream, CompatibleFilterStream};
use weft_federation::{
    FederationError, MemoryMember, MemorySource, Operator, PlanEvaluator, Result, Term,
    TriplePattern,
};

/// Three-member test federation:
///
/// - `members/directory`: names for alice, bob, carol
/// - `members/contact`: emails for alice and bob (not carol), ages for all
/// - `members/social`: alice knows bob, bob knows carol
pub fn federation() -> MemorySource {
    MemorySource::new()
        .with_member(
            MemoryMember::new("members/directory")
                .with_triple(iri("urn:alice"), iri("urn:name"), Value::string("Alice"))
                .with_triple(iri("urn:bob"), iri("urn:name"), Value::string("Bob"))
                .with_triple(iri("urn:carol"), iri("urn:name"), Value::string("Carol")),
        )
        .with_member(
            MemoryMember::new("members/contact")
                .with_triple(
                    iri("urn:alice"),
                    iri("urn:email"),
                    Value::string("alice@example.org"),
                )
                .with_triple(
                    iri("urn:bob"),
                    iri("urn:email"),
                    Value::string("bob@example.org"),
                )
                .with_triple(iri("urn:alice"), iri("urn:age"), Value::long(34))
                .with_triple(iri("urn:bob"), iri("urn:age"), Value::long(17))
                .with_triple(iri("urn:carol"), iri("urn:age"), Value::long(25)),
        )
        .with_member(
            MemoryMember::new("members/social")
                .with_triple(iri("urn:alice"), iri("urn:knows"), iri("urn:bob"))
                .with_triple(iri("urn:bob"), iri("urn:knows"), iri("urn:carol")),
        )
}

pub fn iri(s: &str) -> Value {
    Value::iri(s)
}

/// Build a pattern operator from `?var` / constant-IRI terms
pub fn pattern(s: &str, p: &str, o: &str) -> Operator {
    let term = |t: &str| {
        if let Some(name) = t.strip_prefix('?') {
            Term::var(name)
        } else {
            Term::Const(Value::iri(t))
        }
    };
    Operator::Pattern(TriplePattern::new(term(s), term(p), term(o)))
}

/// Pull a stream to exhaustion
pub async fn drain(mut stream: BoxedStream) -> Result<Vec<Solution>> {
    let mut out = Vec::new();
    while let Some(solution) = stream.next().await? {
        out.push(solution);
    }
    stream.close()?;
    Ok(out)
}

/// Source wrapper that records whether the badly-designed left-join path
/// was taken, and fails any pattern whose predicate is `urn:boom`.
pub struct ProbeSource {
    inner: MemorySource,
    pub delegated: Arc<AtomicBool>,
}

impl ProbeSource {
    pub fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            delegated: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl FederationSource for ProbeSource {
    async fn evaluate_pattern(
        &self,
        pattern: &TriplePattern,
        input: &Solution,
        member: Option<&MemberId>,
    ) -> Result<BoxedStream> {
        if let Term::Const(Value::Iri(p)) = &pattern.p {
            if p.as_ref() == "urn:boom" {
                return Err(FederationError::Evaluation(
                    "boom predicate always fails".into(),
                ));
            }
        }
        self.inner.evaluate_pattern(pattern, input, member).await
    }

    async fn evaluate_member_owned(
        &self,
        member: &MemberId,
        plan: &Operator,
        input: &Solution,
    ) -> Result<Option<BoxedStream>> {
        self.inner.evaluate_member_owned(member, plan, input).await
    }

    async fn evaluate_badly_designed_left_join(
        &self,
        evaluator: &dyn PlanEvaluator,
        left_join: &Operator,
        input: &Solution,
        problem_variables: &[std::sync::Arc<str>],
    ) -> Result<BoxedStream> {
        self.delegated.store(true, Ordering::SeqCst);
        // Same strategy as the provided default: evaluate against the
        // reduced input (well-designed again), then re-impose the full one.
        let reduced = input.without(problem_variables);
        let inner = evaluator.evaluate(left_join, &reduced).await?;
        Ok(Box::new(CompatibleFilterStream::new(inner, input.clone())))
    }
}
