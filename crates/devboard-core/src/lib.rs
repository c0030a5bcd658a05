//! Core abstractions for Devboard: the task model, load-time normalization,
//! the store contract, and the reply boundary used by front ends.

pub mod error;
pub mod reply;
pub mod store;
pub mod tasks;
