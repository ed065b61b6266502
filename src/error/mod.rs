//! Multicall error types.
use alloy::{
    primitives::Bytes,
    providers::PendingTransactionError,
    transports::TransportError,
};
use thiserror::Error;

mod decode;
pub use decode::DecodeError;

mod normalization;
pub use normalization::NormalizationError;

/// The overarching error type carried by a [`BatchResult`](crate::types::BatchResult).
#[derive(Debug, Error)]
pub enum MulticallError {
    /// The call set could not be normalized into the contract's tuple shape.
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    /// The call set or its arguments could not be ABI encoded.
    #[error("failed to encode calldata: {0}")]
    Encode(#[source] alloy::dyn_abi::Error),
    /// The response did not match the declared outer or per-call schema.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The dry run of a mutating batch failed, so the transaction was never broadcast.
    #[error("error calling contract: {source}, with data: {calldata}")]
    DryRun {
        /// The error returned by the node.
        #[source]
        source: TransportError,
        /// The calldata that was dry-run.
        calldata: Bytes,
    },
    /// The transaction request could not be turned into a signable transaction.
    #[error("invalid transaction request")]
    InvalidTransaction,
    /// Error occurred while signing the transaction.
    #[error(transparent)]
    Sign(#[from] alloy::signers::Error),
    /// Error occurred while broadcasting or awaiting the transaction.
    #[error("error sending signed transaction: {0}")]
    Broadcast(#[from] PendingTransactionError),
    /// A mutating batch was requested but no signer is configured.
    #[error("no signer configured")]
    NoSigner,
    /// The operation needs the batching contract, which is not deployed on this chain.
    #[error("no multicall contract on this chain")]
    NotDeployed,
    /// A read reverted.
    ///
    /// Against the batching contract the whole batch reverts, so there is no index.
    /// Deployless execution knows which required call reverted.
    #[error("call reverted (index: {index:?}): {revert_data}")]
    CallReverted {
        /// Position of the reverting call in the call set, if known.
        index: Option<usize>,
        /// The revert data, empty if the node returned none.
        revert_data: Bytes,
    },
}

impl MulticallError {
    /// Returns `true` if the error was raised before any network access.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Normalization(_) | Self::Encode(_) | Self::NoSigner | Self::NotDeployed
        )
    }
}

impl From<alloy::dyn_abi::Error> for MulticallError {
    fn from(err: alloy::dyn_abi::Error) -> Self {
        Self::Encode(err)
    }
}
