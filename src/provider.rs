//! Alloy provider extensions.

use alloy::{
    eips::BlockId,
    primitives::Address,
    providers::Provider,
    transports::TransportResult,
};
use tracing::{trace, warn};

/// Returns the [`BlockId`] to query, latest if no block is pinned.
pub fn block_id(block: Option<u64>) -> BlockId {
    block.map(BlockId::number).unwrap_or_else(BlockId::latest)
}

/// Extension trait for [`Provider`] with the lookups used around a dispatch.
pub trait ProviderExt: Provider {
    /// Returns `true` if there is bytecode at `address`.
    fn has_code_at(&self, address: Address) -> impl Future<Output = TransportResult<bool>> + Send {
        async move {
            let code = self.get_code_at(address).await?;
            trace!(%address, len = code.len(), "fetched code");
            Ok(!code.is_empty())
        }
    }

    /// Resolves the block a dispatch ran against, for diagnostics.
    ///
    /// Returns the pinned block if there is one, otherwise the current block number. Lookup
    /// failures are logged and yield `None`.
    fn resolve_block_number(
        &self,
        pinned: Option<u64>,
    ) -> impl Future<Output = Option<u64>> + Send {
        async move {
            if pinned.is_some() {
                return pinned;
            }
            match self.get_block_number().await {
                Ok(number) => Some(number),
                Err(err) => {
                    warn!(?err, "failed to resolve block number");
                    None
                }
            }
        }
    }
}

impl<T> ProviderExt for T where T: Provider {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        primitives::{Bytes, U64},
        providers::ProviderBuilder,
        rpc::json_rpc::ErrorPayload,
        transports::mock::Asserter,
    };

    #[tokio::test]
    async fn resolves_block_best_effort() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());

        assert_eq!(provider.resolve_block_number(Some(7)).await, Some(7));

        asserter.push_success(&U64::from(12));
        assert_eq!(provider.resolve_block_number(None).await, Some(12));

        asserter.push_failure(ErrorPayload::internal_error());
        assert_eq!(provider.resolve_block_number(None).await, None);
    }

    #[tokio::test]
    async fn detects_code() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());

        asserter.push_success(&Bytes::from_static(&[0x60, 0x80]));
        assert!(provider.has_code_at(Address::repeat_byte(1)).await.unwrap());

        asserter.push_success(&Bytes::new());
        assert!(!provider.has_code_at(Address::repeat_byte(2)).await.unwrap());
    }

    #[test]
    fn pins_block() {
        assert_eq!(block_id(Some(5)), BlockId::number(5));
        assert_eq!(block_id(None), BlockId::latest());
    }
}
