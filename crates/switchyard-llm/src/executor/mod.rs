//! Resilient executor
//!
//! Drives one logical request across the ranked candidates: circuit check,
//! rate gate, dispatch, classify, then retry in place, fail over, or abort.
//!
//! # Module Structure
//!
//! - `builder`: ExecutorConfig and ExecutorBuilder
//! - `failure`: per-candidate failure records and the exhaustion error
//! - `executor_impl`: ResilientExecutor implementation

mod builder;
mod executor_impl;
mod failure;


pub use builder::{ExecutorBuilder, ExecutorConfig};
pub use executor_impl::ResilientExecutor;
pub use failure::{CandidateFailure, ExhaustionError, FailureReason};
