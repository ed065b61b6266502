//! Deployless execution.
//!
//! Without a batching contract the read operations are composed from direct requests against
//! the call targets. The composed values are shaped exactly like the contract's decoded
//! response, so they go through the same reconciliation.

use super::{DispatchPlan, MultiCall, Operation, executor::finish};
use crate::{
    constants::READ_SENDER,
    error::MulticallError,
    provider::{ProviderExt, block_id},
    transport::TransportErrExt,
    types::{BatchResult, CallSet, NetworkRecord, ResultData},
};
use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockNumberOrTag,
    network::TransactionBuilder,
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::{
        TransactionRequest,
        simulate::{SimBlock, SimulatePayload},
    },
    transports::TransportErrorKind,
};
use tracing::{debug, instrument, trace, warn};

impl<P: Provider> MultiCall<P> {
    /// Composes a call-set operation from direct calls.
    #[instrument(skip_all, fields(op = ?plan.operation, calls = calls.len(), ?block))]
    pub(super) async fn execute_deployless(
        &self,
        plan: &DispatchPlan,
        calls: &CallSet,
        block: Option<u64>,
    ) -> BatchResult {
        // normalized like the contract path, before any request
        if let Err(err) = calls.to_array(plan.includes_value()) {
            return BatchResult::failed(err, None);
        }

        let outer = match plan.operation {
            Operation::Simulate => self.simulate_deployless(calls, block).await,
            Operation::AggregateStatic
            | Operation::TryAggregateStatic { .. }
            | Operation::TryAggregateStaticWithFailure => {
                self.aggregate_deployless(plan.operation, calls, block).await
            }
            _ => Err(MulticallError::NotDeployed),
        };

        let block_number = self.provider.resolve_block_number(block).await;
        let record = NetworkRecord::call(READ_SENDER, block_number);
        match outer {
            Ok(outer) => finish(plan, calls, Ok(outer), true, record),
            Err(err) => BatchResult::failed(err, Some(record)),
        }
    }

    /// Composes a metadata operation from direct account and block lookups.
    #[instrument(skip_all, fields(op = ?plan.operation, addresses = addresses.len(), ?block))]
    pub(super) async fn metadata_deployless(
        &self,
        plan: &DispatchPlan,
        addresses: &[Address],
        block: Option<u64>,
    ) -> BatchResult {
        let outer = match plan.operation {
            Operation::CodeLengths => {
                self.code_lengths_deployless(addresses, block).await.map(|lengths| vec![lengths])
            }
            Operation::Balances => {
                self.balances_deployless(addresses, block).await.map(|balances| vec![balances])
            }
            Operation::AddressesData => match self.balances_deployless(addresses, block).await {
                Ok(balances) => self
                    .code_lengths_deployless(addresses, block)
                    .await
                    .map(|lengths| vec![balances, lengths]),
                Err(err) => Err(err),
            },
            Operation::ChainData => self.chain_data_deployless(block).await,
            _ => return BatchResult::failed(MulticallError::NotDeployed, None),
        };

        let block_number = self.provider.resolve_block_number(block).await;
        let record = NetworkRecord::call(READ_SENDER, block_number);
        match outer {
            Ok(outer) => BatchResult::new(true, ResultData::Outer(outer), Some(record)),
            Err(err) => BatchResult::failed(err, Some(record)),
        }
    }

    /// One `eth_call` per call. Reverts become `(false, revertData)` slots unless the call is
    /// required to succeed.
    async fn aggregate_deployless(
        &self,
        operation: Operation,
        calls: &CallSet,
        block: Option<u64>,
    ) -> Result<Vec<DynSolValue>, MulticallError> {
        let mut slots = Vec::with_capacity(calls.len());

        for (index, call) in calls.iter().enumerate() {
            let tx = TransactionRequest::default()
                .with_from(READ_SENDER)
                .with_to(call.target)
                .with_input(call.calldata.clone());

            let slot = match self.provider.call(tx).block(block_id(block)).await {
                Ok(output) if operation == Operation::AggregateStatic => {
                    DynSolValue::Bytes(output.to_vec())
                }
                Ok(output) => DynSolValue::Tuple(vec![
                    DynSolValue::Bool(true),
                    DynSolValue::Bytes(output.to_vec()),
                ]),
                Err(err) if err.is_execution_reverted() => {
                    let revert_data = err.revert_data().unwrap_or_default();
                    let require_success = match operation {
                        Operation::TryAggregateStatic { require_success } => require_success,
                        Operation::TryAggregateStaticWithFailure => {
                            calls.require_success_at(index).unwrap_or_default()
                        }
                        _ => true,
                    };
                    if require_success {
                        debug!(index, %revert_data, "required call reverted");
                        let index = Some(index);
                        return Err(MulticallError::CallReverted { index, revert_data });
                    }
                    trace!(index, %revert_data, "call reverted");
                    DynSolValue::Tuple(vec![
                        DynSolValue::Bool(false),
                        DynSolValue::Bytes(revert_data.to_vec()),
                    ])
                }
                Err(err) => return Err(err.into()),
            };
            slots.push(slot);
        }

        Ok(vec![DynSolValue::Array(slots)])
    }

    /// All calls in a single simulated block, so state carries across calls.
    async fn simulate_deployless(
        &self,
        calls: &CallSet,
        block: Option<u64>,
    ) -> Result<Vec<DynSolValue>, MulticallError> {
        let requests = calls.iter().map(|call| {
            TransactionRequest::default()
                .with_from(READ_SENDER)
                .with_to(call.target)
                .with_input(call.calldata.clone())
        });
        let payload = SimulatePayload::default().extend(SimBlock::default().extend_calls(requests));

        let mut blocks = self.provider.simulate(&payload).block_id(block_id(block)).await?;
        let simulated = blocks
            .pop()
            .ok_or_else(|| TransportErrorKind::custom_str("no simulated block returned"))?;

        let results = simulated
            .calls
            .into_iter()
            .map(|result| {
                DynSolValue::Tuple(vec![
                    DynSolValue::Bool(result.status),
                    DynSolValue::Bytes(result.return_data.to_vec()),
                    DynSolValue::Uint(U256::from(result.gas_used), 256),
                ])
            })
            .collect();
        Ok(vec![DynSolValue::Array(results)])
    }

    async fn code_lengths_deployless(
        &self,
        addresses: &[Address],
        block: Option<u64>,
    ) -> Result<DynSolValue, MulticallError> {
        let mut lengths = Vec::with_capacity(addresses.len());
        for address in addresses {
            let code = self.provider.get_code_at(*address).block_id(block_id(block)).await?;
            lengths.push(DynSolValue::Uint(U256::from(code.len()), 256));
        }
        Ok(DynSolValue::Array(lengths))
    }

    async fn balances_deployless(
        &self,
        addresses: &[Address],
        block: Option<u64>,
    ) -> Result<DynSolValue, MulticallError> {
        let mut balances = Vec::with_capacity(addresses.len());
        for address in addresses {
            let balance = self.provider.get_balance(*address).block_id(block_id(block)).await?;
            balances.push(DynSolValue::Uint(balance, 256));
        }
        Ok(DynSolValue::Array(balances))
    }

    /// Assembles the values `getChainData()` returns from the block header.
    ///
    /// `blockHash` is the parent hash, the most recent hash observable from within the block.
    async fn chain_data_deployless(
        &self,
        block: Option<u64>,
    ) -> Result<Vec<DynSolValue>, MulticallError> {
        let chain_id = self.provider.get_chain_id().await?;
        let tag = block.map(BlockNumberOrTag::Number).unwrap_or(BlockNumberOrTag::Latest);
        let header = self
            .provider
            .get_block_by_number(tag)
            .await?
            .ok_or_else(|| TransportErrorKind::custom_str(&format!("block {tag} not found")))?
            .header;

        let blob_base_fee = match self.provider.get_blob_base_fee().await {
            Ok(fee) => fee,
            Err(err) => {
                warn!(?err, "failed to fetch blob base fee");
                0
            }
        };

        let uint = |value: U256| DynSolValue::Uint(value, 256);
        Ok(vec![
            uint(U256::from(chain_id)),
            uint(U256::from(header.number)),
            DynSolValue::FixedBytes(header.parent_hash, 32),
            uint(U256::from(header.timestamp)),
            DynSolValue::Address(header.beneficiary),
            uint(U256::from_be_bytes(header.mix_hash.0)),
            uint(U256::from(header.gas_limit)),
            uint(U256::from(header.base_fee_per_gas.unwrap_or_default())),
            uint(U256::from(blob_base_fee)),
        ])
    }
}
