//! Additional helpers for RPC error handling

use crate::constants::EXECUTION_REVERTED;
use alloy::{primitives::Bytes, transports::TransportError};

/// An extension trait for [`TransportError`]
pub trait TransportErrExt {
    /// Returns true if the node reported that execution reverted.
    fn is_execution_reverted(&self) -> bool;

    /// Returns the revert data attached to the error response, if any.
    fn revert_data(&self) -> Option<Bytes>;

    /// Returns the revert data if this is an "execution reverted" error carrying data.
    ///
    /// This is how a simulation hands its results back.
    fn revert_payload(&self) -> Option<Bytes> {
        if self.is_execution_reverted() { self.revert_data() } else { None }
    }
}

impl TransportErrExt for TransportError {
    fn is_execution_reverted(&self) -> bool {
        // geth and reth both prefix the message, e.g. "execution reverted: <reason>"
        self.as_error_resp()
            .map(|err| err.message.contains(EXECUTION_REVERTED))
            .unwrap_or_default()
    }

    fn revert_data(&self) -> Option<Bytes> {
        self.as_error_resp().and_then(|err| err.as_revert_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        primitives::bytes,
        rpc::json_rpc::ErrorPayload,
        transports::{RpcError, TransportErrorKind},
    };
    use serde_json::value::RawValue;

    fn error_resp(message: &'static str, data: Option<&str>) -> TransportError {
        RpcError::ErrorResp(ErrorPayload {
            code: 3,
            message: message.into(),
            data: data.map(|data| RawValue::from_string(format!("\"{data}\"")).unwrap()),
        })
    }

    #[test]
    fn extracts_revert_payload() {
        let err = error_resp("execution reverted", Some("0xdeadbeef"));
        assert!(err.is_execution_reverted());
        assert_eq!(err.revert_payload(), Some(bytes!("deadbeef")));

        let err = error_resp("execution reverted: custom error", Some("0x1234"));
        assert_eq!(err.revert_payload(), Some(bytes!("1234")));
    }

    #[test]
    fn requires_data_and_message() {
        let err = error_resp("execution reverted", None);
        assert!(err.is_execution_reverted());
        assert_eq!(err.revert_payload(), None);

        let err = error_resp("insufficient funds", Some("0xdeadbeef"));
        assert!(!err.is_execution_reverted());
        assert_eq!(err.revert_payload(), None);

        let err: TransportError = TransportErrorKind::custom_str("request timeout");
        assert!(!err.is_execution_reverted());
        assert_eq!(err.revert_data(), None);
    }
}
