//! Single round trip against the batching contract.

use super::{
    DispatchPlan, ExecutionMode, MultiCall,
    reconcile::{decode_outer, decode_simulation, reconcile_response},
};
use crate::{
    constants::{READ_SENDER, RECEIPT_POLL_INTERVAL, RECEIPT_TIMEOUT},
    error::{DecodeError, MulticallError},
    provider::{ProviderExt, block_id},
    signers::DynSigner,
    transport::TransportErrExt,
    types::{BatchResult, CallSet, NetworkRecord},
};
use alloy::{
    dyn_abi::DynSolValue,
    eips::eip2718::Encodable2718,
    network::{Ethereum, NetworkWallet, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{PendingTransactionError, Provider, WatchTxError},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use tracing::{debug, instrument, trace};

impl<P: Provider> MultiCall<P> {
    /// Sends `calldata` to `contract` and reconciles the response against `calls`.
    ///
    /// Signs, dry-runs and broadcasts a transaction for [`ExecutionMode::Transact`], issues a
    /// single `eth_call` otherwise.
    #[instrument(skip_all, fields(%contract, mode = ?plan.mode, calls = calls.len(), ?block))]
    pub(super) async fn execute(
        &self,
        contract: Address,
        plan: &DispatchPlan,
        calls: &CallSet,
        calldata: Bytes,
        value: U256,
        block: Option<u64>,
    ) -> BatchResult {
        match (plan.mode, &self.signer) {
            (ExecutionMode::Transact, Some(signer)) => {
                self.transact(signer, contract, plan, calls, calldata, value).await
            }
            (ExecutionMode::Transact, None) => BatchResult::failed(MulticallError::NoSigner, None),
            _ => self.call_contract(contract, plan, calls, calldata, value, block).await,
        }
    }

    async fn call_contract(
        &self,
        contract: Address,
        plan: &DispatchPlan,
        calls: &CallSet,
        calldata: Bytes,
        value: U256,
        block: Option<u64>,
    ) -> BatchResult {
        let from = match (plan.mode, &self.signer) {
            (ExecutionMode::TransactAsRead, Some(signer)) => signer.address(),
            _ => READ_SENDER,
        };

        let mut tx =
            TransactionRequest::default().with_from(from).with_to(contract).with_input(calldata);
        if !value.is_zero() {
            tx = tx.with_value(value);
        }

        let output = self.provider.call(tx).block(block_id(block)).await;
        let record = NetworkRecord::call(from, self.provider.resolve_block_number(block).await);

        let outer = match output {
            Ok(_) if plan.revert_is_data() => {
                return BatchResult::failed(DecodeError::SimulationNotReverted, Some(record));
            }
            Ok(output) => {
                trace!(len = output.len(), "received aggregated response");
                decode_outer(plan, &output)
            }
            Err(err) if plan.revert_is_data() && err.is_execution_reverted() => {
                match err.revert_payload() {
                    Some(revert) => decode_simulation(&revert),
                    None => Err(DecodeError::MissingRevertData),
                }
            }
            Err(err) if err.is_execution_reverted() => {
                let revert_data = err.revert_data().unwrap_or_default();
                debug!(%revert_data, "aggregated call reverted");
                let err = MulticallError::CallReverted { index: None, revert_data };
                return BatchResult::failed(err, Some(record));
            }
            Err(err) => {
                debug!(?err, "aggregated call failed");
                return BatchResult::failed(err, Some(record));
            }
        };

        finish(plan, calls, outer, true, record)
    }

    async fn transact(
        &self,
        signer: &DynSigner,
        contract: Address,
        plan: &DispatchPlan,
        calls: &CallSet,
        calldata: Bytes,
        value: U256,
    ) -> BatchResult {
        let from = signer.address();

        let nonce = match self.provider.get_transaction_count(from).pending().await {
            Ok(nonce) => nonce,
            Err(err) => return BatchResult::failed(err, None),
        };
        let record = |hash, block_number| NetworkRecord::Transaction {
            hash,
            from,
            nonce,
            block_number,
        };

        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(contract)
            .with_value(value)
            .with_input(calldata.clone())
            .with_nonce(nonce);

        let prepared = async {
            let gas_price = self.provider.get_gas_price().await?;
            let request = request.with_gas_price(gas_price);
            // nodes already reject a reverting batch at estimation
            let gas_limit = match self.provider.estimate_gas(request.clone()).await {
                Ok(gas_limit) => gas_limit,
                Err(source) if source.is_execution_reverted() => {
                    return Err(MulticallError::DryRun { source, calldata: calldata.clone() });
                }
                Err(err) => return Err(err.into()),
            };
            let chain_id = self.provider.get_chain_id().await?;
            let request = request.with_gas_limit(gas_limit).with_chain_id(chain_id);

            let tx = request
                .clone()
                .build_typed_tx()
                .map_err(|_| MulticallError::InvalidTransaction)?;
            let signed =
                NetworkWallet::<Ethereum>::sign_transaction_from(&signer.wallet(), from, tx)
                    .await?;
            Ok::<_, MulticallError>((request, signed))
        }
        .await;

        let (request, signed) = match prepared {
            Ok(prepared) => prepared,
            Err(err @ MulticallError::DryRun { .. }) => {
                debug!(?err, "gas estimation reverted, not signing");
                let block_number = self.provider.resolve_block_number(None).await;
                return BatchResult::failed(err, Some(record(None, block_number)));
            }
            Err(err) => return BatchResult::failed(err, Some(record(None, None))),
        };
        let hash = *signed.tx_hash();

        // the signed transaction is only broadcast if the same request succeeds as a call
        let output = match self.provider.call(request).await {
            Ok(output) => output,
            Err(source) => {
                debug!(%hash, ?source, "dry run failed, not broadcasting");
                let block_number = self.provider.resolve_block_number(None).await;
                return BatchResult::failed(
                    MulticallError::DryRun { source, calldata },
                    Some(record(Some(hash), block_number)),
                );
            }
        };

        if let Err(err) = self.provider.send_raw_transaction(&signed.encoded_2718()).await {
            return BatchResult::failed(err, Some(record(Some(hash), None)));
        }
        let receipt = match self.wait_for_receipt(hash).await {
            Ok(receipt) => receipt,
            Err(err) => return BatchResult::failed(err, Some(record(Some(hash), None))),
        };
        debug!(
            %hash,
            status = receipt.status(),
            block = ?receipt.block_number(),
            "transaction included"
        );

        finish(
            plan,
            calls,
            decode_outer(plan, &output),
            receipt.status(),
            record(Some(hash), receipt.block_number()),
        )
    }

    /// Polls for the receipt of `hash` until it is available or [`RECEIPT_TIMEOUT`] elapses.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TransactionReceipt, MulticallError> {
        let poll = async {
            loop {
                if let Some(receipt) = self.provider.get_transaction_receipt(hash).await? {
                    return Ok::<_, MulticallError>(receipt);
                }
                trace!(%hash, "transaction pending");
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(RECEIPT_TIMEOUT, poll).await {
            Ok(receipt) => receipt,
            Err(_) => Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout).into()),
        }
    }
}

/// Reconciles a decoded response into the terminal [`BatchResult`].
pub(super) fn finish(
    plan: &DispatchPlan,
    calls: &CallSet,
    outer: Result<Vec<DynSolValue>, DecodeError>,
    success: bool,
    record: NetworkRecord,
) -> BatchResult {
    match outer.and_then(|outer| reconcile_response(plan, calls, outer)) {
        Ok(data) => BatchResult::new(success, data, Some(record)),
        Err(err) => {
            debug!(?err, "failed to reconcile response");
            BatchResult::failed(err, Some(record))
        }
    }
}
