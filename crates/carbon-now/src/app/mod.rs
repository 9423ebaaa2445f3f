//! Application layer orchestrating domain logic and infrastructure.

pub mod input;
pub mod output;
pub mod snapshot;
