//! # Multicall
//!
//! Batches many independent contract calls, transactions and simulations into a single round
//! trip against a batching contract, and reconciles the aggregated response back into one
//! result per call.
//!
//! Chains without the batching contract are served by a deployless fallback that composes the
//! same results from direct calls.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod multicall;
pub mod provider;
pub mod serde;
pub mod signers;
pub mod transport;
pub mod types;

pub use multicall::{MultiCall, Operation, Submission};
pub use types::{BatchResult, Call, CallSet, CallWithFailure, NetworkRecord, ResultData};
