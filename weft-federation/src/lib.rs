//! Federated query evaluation
//!
//! This crate evaluates a relational-algebra plan (joins, optional joins,
//! unions) whose leaf operators resolve against the members of a
//! federation, producing the same result set a non-federated evaluator
//! would - while overlapping member latency through concurrent evaluation.
//!
//! # Architecture
//!
//! ```text
//! FederationEvaluator (execute)
//!   ├── ConcurrentJoinStream (join) ──────┐
//!   ├── ConcurrentLeftJoinStream (optional)│ worker task + bounded
//!   │     ├── ScopedFilterStream (filter)  │ handoff per pipeline
//!   │     └── FallbackStream (fallback)    │
//!   └── FederationSource (source) ─────────┘
//! ```
//!
//! Each join or optional join runs as its own pipeline: a worker task walks
//! the left input and evaluates the right sub-plan per solution, handing
//! the resulting sub-streams through a bounded queue to the consuming task,
//! which flattens them in order. Closing the output stream cancels every
//! stage transitively.

pub mod algebra;
pub mod config;
pub mod error;
pub mod execute;
pub mod expression;
pub mod fallback;
pub mod filter;
pub mod handoff;
pub mod join;
pub mod memory;
pub mod optional;
pub mod source;
pub mod stream;

pub use algebra::{Operator, Term, TriplePattern};
pub use config::FederationConfig;
pub use error::{ConditionError, FederationError, Result};
pub use execute::{FederationEvaluator, PlanEvaluator};
pub use expression::{CompareOp, Expression};
pub use fallback::FallbackStream;
pub use filter::ScopedFilterStream;
pub use join::ConcurrentJoinStream;
pub use memory::{MemoryMember, MemorySource};
pub use optional::ConcurrentLeftJoinStream;
pub use source::FederationSource;
pub use stream::{BoxedStream, SolutionStream};
