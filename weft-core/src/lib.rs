//! Core data model for the weft federated query engine
//!
//! This crate holds the types shared between the federation layer and member
//! connectors:
//!
//! - [`Value`]: a term value bound to a variable
//! - [`Solution`]: a variable→value binding set (one result row)
//! - [`MemberId`]: the identity of one federation member

pub mod member;
pub mod solution;
pub mod value;

pub use member::MemberId;
pub use solution::Solution;
pub use value::Value;
