//! # Multicall dispatch
//!
//! [`MultiCall`] bundles many independent contract calls into a single round trip against a
//! batching contract, and reconstructs one result per call from the aggregated response.
//!
//! ## Execution modes
//! - Mutating batches are signed, dry-run with `eth_call` and only then broadcast. They can
//!   also be evaluated as a read with [`Submission::Call`].
//! - Static batches and metadata queries are a single `eth_call`.
//! - Simulations revert on purpose; the results are decoded from the revert data.
//!
//! ## Deployless execution
//! If there is no code at the contract address, the read entry points compose the same
//! results from direct requests against the call targets. Mutating entry points fail with
//! [`MulticallError::NotDeployed`].

use crate::{
    error::MulticallError,
    provider::ProviderExt,
    signers::DynSigner,
    types::{BatchResult, Call, CallSet, CallWithFailure},
};
use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
    providers::Provider,
    transports::TransportResult,
};
use tracing::{info, instrument};

mod deployless;
mod executor;

mod mode;
pub use mode::*;

pub mod reconcile;

/// Dispatches batches of calls against a batching contract.
#[derive(Debug, Clone)]
pub struct MultiCall<P> {
    provider: P,
    contract: Option<Address>,
    signer: Option<DynSigner>,
}

impl<P: Provider> MultiCall<P> {
    /// Creates a new [`MultiCall`], checking once whether the batching contract is deployed at
    /// `contract`.
    ///
    /// Falls back to deployless execution if there is no code at the address.
    pub async fn new(provider: P, contract: Address) -> TransportResult<Self> {
        if provider.has_code_at(contract).await? {
            Ok(Self::deployed(provider, contract))
        } else {
            info!(%contract, "multicall contract not deployed, using deployless execution");
            Ok(Self::deployless(provider))
        }
    }

    /// Creates a new [`MultiCall`] against a contract that is known to be deployed.
    pub fn deployed(provider: P, contract: Address) -> Self {
        Self { provider, contract: Some(contract), signer: None }
    }

    /// Creates a new [`MultiCall`] that always composes results from direct requests.
    pub fn deployless(provider: P) -> Self {
        Self { provider, contract: None, signer: None }
    }

    /// Sets the signer used for mutating batches.
    pub fn with_signer(mut self, signer: DynSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Returns the underlying provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the configured signer, if any.
    pub const fn signer(&self) -> Option<&DynSigner> {
        self.signer.as_ref()
    }

    /// Returns the address of the batching contract, if it is deployed.
    pub const fn contract_address(&self) -> Option<Address> {
        self.contract
    }

    /// Returns `true` if the batching contract is deployed.
    pub const fn is_deployed(&self) -> bool {
        self.contract.is_some()
    }

    /// Returns `true` if results are composed from direct requests.
    pub const fn is_deployless(&self) -> bool {
        self.contract.is_none()
    }

    /// Executes `calls` atomically, forwarding their values. Any revert reverts the batch.
    ///
    /// Returns the raw return data of every call, decoded if the call declares return types.
    pub async fn aggregate_calls(
        &self,
        calls: Vec<Call>,
        submission: Submission,
        block: Option<u64>,
    ) -> BatchResult {
        self.mutate(Operation::Aggregate, calls.into(), submission, block).await
    }

    /// Executes `calls`, forwarding their values. A revert only reverts the batch if
    /// `require_success` is set.
    ///
    /// Returns a `(success, returnData)` tuple per call.
    pub async fn try_aggregate_calls(
        &self,
        calls: Vec<Call>,
        require_success: bool,
        submission: Submission,
        block: Option<u64>,
    ) -> BatchResult {
        self.mutate(Operation::TryAggregate { require_success }, calls.into(), submission, block)
            .await
    }

    /// Like [`Self::try_aggregate_calls`], with a require-success flag per call.
    pub async fn try_aggregate_calls3(
        &self,
        calls: Vec<CallWithFailure>,
        submission: Submission,
        block: Option<u64>,
    ) -> BatchResult {
        self.mutate(Operation::TryAggregateWithFailure, calls.into(), submission, block).await
    }

    /// Simulates `calls` in sequence without committing any state.
    ///
    /// Returns a `(success, returnData, gasUsed)` tuple per call, with `returnData` as an
    /// unprefixed hex string.
    pub async fn simulate_calls(&self, calls: Vec<Call>, block: Option<u64>) -> BatchResult {
        self.read(Operation::Simulate, calls.into(), block).await
    }

    /// Reads `calls`. Any revert fails the batch.
    pub async fn aggregate_static(&self, calls: Vec<Call>, block: Option<u64>) -> BatchResult {
        self.read(Operation::AggregateStatic, calls.into(), block).await
    }

    /// Reads `calls`. A revert only fails the batch if `require_success` is set.
    pub async fn try_aggregate_static(
        &self,
        calls: Vec<Call>,
        require_success: bool,
        block: Option<u64>,
    ) -> BatchResult {
        self.read(Operation::TryAggregateStatic { require_success }, calls.into(), block).await
    }

    /// Like [`Self::try_aggregate_static`], with a require-success flag per call.
    pub async fn try_aggregate_static3(
        &self,
        calls: Vec<CallWithFailure>,
        block: Option<u64>,
    ) -> BatchResult {
        self.read(Operation::TryAggregateStaticWithFailure, calls.into(), block).await
    }

    /// Returns the code length of every address.
    pub async fn code_lengths(&self, addresses: Vec<Address>, block: Option<u64>) -> BatchResult {
        self.metadata(Operation::CodeLengths, addresses, block).await
    }

    /// Returns the native balance of every address.
    pub async fn balances(&self, addresses: Vec<Address>, block: Option<u64>) -> BatchResult {
        self.metadata(Operation::Balances, addresses, block).await
    }

    /// Returns the native balances and the code lengths of every address, as two lists.
    pub async fn addresses_data(&self, addresses: Vec<Address>, block: Option<u64>) -> BatchResult {
        self.metadata(Operation::AddressesData, addresses, block).await
    }

    /// Returns chain and block metadata: chain id, block number, block hash, timestamp,
    /// coinbase, prevrandao, gas limit, base fee and blob base fee.
    pub async fn chain_data(&self, block: Option<u64>) -> BatchResult {
        self.metadata(Operation::ChainData, Vec::new(), block).await
    }

    #[instrument(skip_all, fields(?operation, ?submission, calls = calls.len()))]
    async fn mutate(
        &self,
        operation: Operation,
        calls: CallSet,
        submission: Submission,
        block: Option<u64>,
    ) -> BatchResult {
        let plan = DispatchPlan::new(operation, submission);
        if plan.requires_signer() && self.signer.is_none() {
            return BatchResult::failed(MulticallError::NoSigner, None);
        }
        let Some(contract) = self.contract else {
            return BatchResult::failed(MulticallError::NotDeployed, None);
        };
        self.dispatch(contract, &plan, &calls, block).await
    }

    #[instrument(skip_all, fields(?operation, calls = calls.len()))]
    async fn read(&self, operation: Operation, calls: CallSet, block: Option<u64>) -> BatchResult {
        let plan = DispatchPlan::new(operation, Submission::Call);
        match self.contract {
            Some(contract) => self.dispatch(contract, &plan, &calls, block).await,
            None => self.execute_deployless(&plan, &calls, block).await,
        }
    }

    async fn dispatch(
        &self,
        contract: Address,
        plan: &DispatchPlan,
        calls: &CallSet,
        block: Option<u64>,
    ) -> BatchResult {
        match plan.encode_calls(calls) {
            Ok((calldata, value)) => {
                self.execute(contract, plan, calls, calldata, value, block).await
            }
            Err(err) => BatchResult::failed(err, None),
        }
    }

    #[instrument(skip_all, fields(?operation, addresses = addresses.len()))]
    async fn metadata(
        &self,
        operation: Operation,
        addresses: Vec<Address>,
        block: Option<u64>,
    ) -> BatchResult {
        let plan = DispatchPlan::new(operation, Submission::Call);
        let Some(contract) = self.contract else {
            return self.metadata_deployless(&plan, &addresses, block).await;
        };

        let args = match operation {
            Operation::ChainData => vec![],
            _ => vec![DynSolValue::Array(
                addresses.into_iter().map(DynSolValue::Address).collect(),
            )],
        };
        match plan.encode(&args) {
            Ok(calldata) => {
                self.execute(contract, &plan, &CallSet::Calls(vec![]), calldata, U256::ZERO, block)
                    .await
            }
            Err(err) => BatchResult::failed(err, None),
        }
    }
}
