//! Plain data describing a single invocation and its failure modes.

pub mod errors;
pub mod model;
