//! Terminal results of a batch dispatch.

use crate::error::MulticallError;
use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, TxHash},
};
use serde::{Deserialize, Serialize};

/// What happened at the network boundary during a dispatch.
///
/// Populated on a best-effort basis, failures included, so that they remain diagnosable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NetworkRecord {
    /// A transaction was built, and possibly signed and broadcast.
    #[serde(rename_all = "camelCase")]
    Transaction {
        /// The transaction hash, once signed.
        hash: Option<TxHash>,
        /// The sender.
        from: Address,
        /// The nonce the transaction was built with.
        nonce: u64,
        /// The block the transaction was included in, or the head at the time of failure.
        block_number: Option<u64>,
    },
    /// A stateless read was issued.
    #[serde(rename_all = "camelCase")]
    Call {
        /// The sender of the read.
        from: Address,
        /// The block that was queried.
        block_number: Option<u64>,
    },
}

impl NetworkRecord {
    /// Creates a record for a stateless read.
    pub const fn call(from: Address, block_number: Option<u64>) -> Self {
        Self::Call { from, block_number }
    }

    /// Returns the block number attached to the record.
    pub const fn block_number(&self) -> Option<u64> {
        match self {
            Self::Transaction { block_number, .. } | Self::Call { block_number, .. } => {
                *block_number
            }
        }
    }
}

/// The decoded payload of a dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultData {
    /// Nothing was decoded.
    #[default]
    Empty,
    /// One reconciled result per submitted call, in submission order.
    Calls(Vec<DynSolValue>),
    /// The raw decoded outer values, for responses without per-call structure.
    Outer(Vec<DynSolValue>),
}

impl ResultData {
    /// Picks the reconciled per-call list if it is non-empty, the raw outer values otherwise.
    pub fn from_reconciled(calls: Vec<DynSolValue>, outer: Vec<DynSolValue>) -> Self {
        if calls.is_empty() { Self::Outer(outer) } else { Self::Calls(calls) }
    }

    /// Returns the values held by the payload, regardless of their structure.
    pub fn values(&self) -> &[DynSolValue] {
        match self {
            Self::Empty => &[],
            Self::Calls(values) | Self::Outer(values) => values,
        }
    }
}

/// The terminal result of a batch dispatch.
#[derive(Debug)]
pub struct BatchResult {
    /// Whether the batch succeeded.
    ///
    /// For broadcast transactions this is the receipt status.
    pub success: bool,
    /// The decoded payload.
    pub data: ResultData,
    /// The error, if the dispatch failed.
    pub error: Option<MulticallError>,
    /// What happened at the network boundary.
    pub record: Option<NetworkRecord>,
}

impl BatchResult {
    /// Creates a successful result.
    pub fn new(success: bool, data: ResultData, record: Option<NetworkRecord>) -> Self {
        Self { success, data, error: None, record }
    }

    /// Creates a failed result.
    pub fn failed(error: impl Into<MulticallError>, record: Option<NetworkRecord>) -> Self {
        Self { success: false, data: ResultData::Empty, error: Some(error.into()), record }
    }

    /// Returns `true` if the batch succeeded.
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the per-call results, if the payload has per-call structure.
    pub fn calls(&self) -> Option<&[DynSolValue]> {
        match &self.data {
            ResultData::Calls(calls) => Some(calls),
            _ => None,
        }
    }

    /// Returns the raw outer values, if the payload has no per-call structure.
    pub fn outer(&self) -> Option<&[DynSolValue]> {
        match &self.data {
            ResultData::Outer(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the error, if any.
    pub const fn error(&self) -> Option<&MulticallError> {
        self.error.as_ref()
    }

    /// Converts into a [`Result`], surfacing the error if there is one.
    pub fn into_result(self) -> Result<(ResultData, Option<NetworkRecord>), MulticallError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.data, self.record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    #[test]
    fn prefers_per_call_payload() {
        let outer = vec![DynSolValue::Array(vec![])];
        assert_eq!(
            ResultData::from_reconciled(vec![], outer.clone()),
            ResultData::Outer(outer.clone())
        );

        let calls = vec![DynSolValue::Uint(U256::from(1), 256)];
        assert_eq!(ResultData::from_reconciled(calls.clone(), outer), ResultData::Calls(calls));
    }

    #[test]
    fn record_serializes_tagged() {
        let record = NetworkRecord::call(Address::ZERO, Some(16));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "call");
        assert_eq!(json["blockNumber"], 16);
        assert_eq!(serde_json::from_value::<NetworkRecord>(json).unwrap(), record);
    }

    #[test]
    fn surfaces_error() {
        let record = NetworkRecord::call(Address::ZERO, None);
        let err = BatchResult::failed(MulticallError::NotDeployed, Some(record.clone()))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, MulticallError::NotDeployed));

        let (data, from_result) =
            BatchResult::new(true, ResultData::Empty, Some(record.clone())).into_result().unwrap();
        assert_eq!(data, ResultData::Empty);
        assert_eq!(from_result, Some(record));
    }
}
