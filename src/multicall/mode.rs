//! Execution-mode selection.
//!
//! An [`Operation`] combined with a [`Submission`] yields a [`DispatchPlan`], which fixes
//! everything the executor and the reconciler need to know about a batch.

use crate::{error::MulticallError, types::CallSet};
use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt},
    json_abi::Function,
    primitives::{Bytes, U256},
};

/// `aggregateCalls((address,bytes,uint256)[])`
pub const AGGREGATE_CALLS: &str = "aggregateCalls((address,bytes,uint256)[])";
/// `tryAggregateCalls((address,bytes,uint256)[],bool)`
pub const TRY_AGGREGATE_CALLS: &str = "tryAggregateCalls((address,bytes,uint256)[],bool)";
/// `tryAggregateCalls((address,bytes,uint256,bool)[])`
pub const TRY_AGGREGATE_CALLS3: &str = "tryAggregateCalls((address,bytes,uint256,bool)[])";
/// `simulateCalls((address,bytes)[])`
pub const SIMULATE_CALLS: &str = "simulateCalls((address,bytes)[])";
/// `aggregateStatic((address,bytes)[])`
pub const AGGREGATE_STATIC: &str = "aggregateStatic((address,bytes)[])";
/// `tryAggregateStatic((address,bytes)[],bool)`
pub const TRY_AGGREGATE_STATIC: &str = "tryAggregateStatic((address,bytes)[],bool)";
/// `tryAggregateStatic((address,bytes,bool)[])`
pub const TRY_AGGREGATE_STATIC3: &str = "tryAggregateStatic((address,bytes,bool)[])";
/// `getCodeLengths(address[])`
pub const GET_CODE_LENGTHS: &str = "getCodeLengths(address[])";
/// `getBalances(address[])`
pub const GET_BALANCES: &str = "getBalances(address[])";
/// `getAddressesData(address[])`
pub const GET_ADDRESSES_DATA: &str = "getAddressesData(address[])";
/// `getChainData()`
pub const GET_CHAIN_DATA: &str = "getChainData()";

/// A batch operation exposed by the batching contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Mutating aggregate, any revert reverts the batch.
    Aggregate,
    /// Mutating try-aggregate with a batch-level require-success flag.
    TryAggregate {
        /// Whether any revert reverts the batch.
        require_success: bool,
    },
    /// Mutating try-aggregate with per-call require-success flags.
    TryAggregateWithFailure,
    /// Simulation, results are carried out by a revert.
    Simulate,
    /// Static aggregate, any revert reverts the batch.
    AggregateStatic,
    /// Static try-aggregate with a batch-level require-success flag.
    TryAggregateStatic {
        /// Whether any revert reverts the batch.
        require_success: bool,
    },
    /// Static try-aggregate with per-call require-success flags.
    TryAggregateStaticWithFailure,
    /// Code length per address.
    CodeLengths,
    /// Native balance per address.
    Balances,
    /// Native balance and code length per address.
    AddressesData,
    /// Chain and block metadata.
    ChainData,
}

impl Operation {
    /// Returns `true` for the operations that mutate state when submitted as a transaction.
    pub const fn is_mutating(&self) -> bool {
        matches!(self, Self::Aggregate | Self::TryAggregate { .. } | Self::TryAggregateWithFailure)
    }

    /// Returns `true` for the operations that take an address list or nothing instead of a
    /// call set.
    pub const fn is_metadata(&self) -> bool {
        matches!(self, Self::CodeLengths | Self::Balances | Self::AddressesData | Self::ChainData)
    }

    /// The human readable signature of the contract function backing the operation.
    pub const fn signature(&self) -> &'static str {
        match self {
            Self::Aggregate => AGGREGATE_CALLS,
            Self::TryAggregate { .. } => TRY_AGGREGATE_CALLS,
            Self::TryAggregateWithFailure => TRY_AGGREGATE_CALLS3,
            Self::Simulate => SIMULATE_CALLS,
            Self::AggregateStatic => AGGREGATE_STATIC,
            Self::TryAggregateStatic { .. } => TRY_AGGREGATE_STATIC,
            Self::TryAggregateStaticWithFailure => TRY_AGGREGATE_STATIC3,
            Self::CodeLengths => GET_CODE_LENGTHS,
            Self::Balances => GET_BALANCES,
            Self::AddressesData => GET_ADDRESSES_DATA,
            Self::ChainData => GET_CHAIN_DATA,
        }
    }

    /// The batch-level require-success flag, appended after the call array.
    pub const fn batch_require_success(&self) -> Option<bool> {
        match self {
            Self::TryAggregate { require_success }
            | Self::TryAggregateStatic { require_success } => Some(*require_success),
            _ => None,
        }
    }

    /// The schema the response is decoded against.
    ///
    /// For [`Operation::Simulate`] this is the schema of the results carried by the revert.
    pub fn outer_schema(&self) -> Vec<DynSolType> {
        let uint = || DynSolType::Uint(256);
        let uints = || DynSolType::Array(Box::new(uint()));
        match self {
            Self::Aggregate | Self::AggregateStatic => {
                vec![DynSolType::Array(Box::new(DynSolType::Bytes))]
            }
            Self::TryAggregate { .. }
            | Self::TryAggregateWithFailure
            | Self::TryAggregateStatic { .. }
            | Self::TryAggregateStaticWithFailure => vec![DynSolType::Array(Box::new(
                DynSolType::Tuple(vec![DynSolType::Bool, DynSolType::Bytes]),
            ))],
            Self::Simulate => vec![DynSolType::Array(Box::new(DynSolType::Tuple(vec![
                DynSolType::Bool,
                DynSolType::Bytes,
                uint(),
            ])))],
            Self::CodeLengths | Self::Balances => vec![uints()],
            Self::AddressesData => vec![uints(), uints()],
            Self::ChainData => vec![
                uint(),
                uint(),
                DynSolType::FixedBytes(32),
                uint(),
                DynSolType::Address,
                uint(),
                uint(),
                uint(),
                uint(),
            ],
        }
    }
}

/// How a mutating operation is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Submission {
    /// Sign, dry-run and broadcast a transaction.
    #[default]
    Transaction,
    /// Run the mutating function as a read, without signing anything.
    Call,
}

/// The execution strategy of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Signed, dry-run and broadcast.
    Transact,
    /// A mutating function evaluated with `eth_call`.
    TransactAsRead,
    /// A pure read.
    Static,
    /// A read whose results are carried out by a revert.
    Simulate,
    /// A metadata read without per-call structure.
    Metadata,
}

/// Everything fixed by the choice of operation and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    /// The requested operation.
    pub operation: Operation,
    /// The execution strategy.
    pub mode: ExecutionMode,
    /// The schema the response is decoded against.
    pub outer: Vec<DynSolType>,
}

impl DispatchPlan {
    /// Selects the plan for `operation`.
    ///
    /// `submission` is only meaningful for mutating operations and ignored otherwise.
    pub fn new(operation: Operation, submission: Submission) -> Self {
        let mode = match operation {
            op if op.is_mutating() => match submission {
                Submission::Transaction => ExecutionMode::Transact,
                Submission::Call => ExecutionMode::TransactAsRead,
            },
            Operation::Simulate => ExecutionMode::Simulate,
            op if op.is_metadata() => ExecutionMode::Metadata,
            _ => ExecutionMode::Static,
        };
        Self { operation, mode, outer: operation.outer_schema() }
    }

    /// The human readable signature of the contract function.
    pub const fn signature(&self) -> &'static str {
        self.operation.signature()
    }

    /// Whether the dispatch needs a signer.
    pub fn requires_signer(&self) -> bool {
        self.mode == ExecutionMode::Transact
    }

    /// Whether per-call values are serialized and forwarded.
    pub fn includes_value(&self) -> bool {
        matches!(self.mode, ExecutionMode::Transact | ExecutionMode::TransactAsRead)
    }

    /// Whether a revert carrying data is the payload rather than an error.
    pub fn revert_is_data(&self) -> bool {
        self.mode == ExecutionMode::Simulate
    }

    /// Whether the response is reconciled against the call set.
    pub fn reconciles(&self) -> bool {
        self.mode != ExecutionMode::Metadata
    }

    /// Encodes `args` against the plan's function signature.
    pub fn encode(&self, args: &[DynSolValue]) -> Result<Bytes, alloy::dyn_abi::Error> {
        let function =
            Function::parse(self.signature()).map_err(alloy::dyn_abi::Error::TypeParser)?;
        Ok(function.abi_encode_input(args)?.into())
    }

    /// Serializes `calls` and encodes them, returning the calldata and the total value to
    /// forward.
    ///
    /// The batch-level require-success flag is only appended for the signatures taking one.
    pub fn encode_calls(&self, calls: &CallSet) -> Result<(Bytes, U256), MulticallError> {
        let (array, value) = calls.to_array(self.includes_value())?;
        let mut args = vec![array];
        if let Some(require_success) = self.operation.batch_require_success() {
            args.push(DynSolValue::Bool(require_success));
        }
        Ok((self.encode(&args)?, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Call, IMultiCall};
    use alloy::{
        primitives::{Address, bytes},
        sol_types::SolCall,
    };

    const ALL: [Operation; 11] = [
        Operation::Aggregate,
        Operation::TryAggregate { require_success: true },
        Operation::TryAggregateWithFailure,
        Operation::Simulate,
        Operation::AggregateStatic,
        Operation::TryAggregateStatic { require_success: false },
        Operation::TryAggregateStaticWithFailure,
        Operation::CodeLengths,
        Operation::Balances,
        Operation::AddressesData,
        Operation::ChainData,
    ];

    #[test]
    fn signatures_match_contract() {
        assert_eq!(AGGREGATE_CALLS, IMultiCall::aggregateCallsCall::SIGNATURE);
        assert_eq!(TRY_AGGREGATE_CALLS, IMultiCall::tryAggregateCalls_0Call::SIGNATURE);
        assert_eq!(TRY_AGGREGATE_CALLS3, IMultiCall::tryAggregateCalls_1Call::SIGNATURE);
        assert_eq!(SIMULATE_CALLS, IMultiCall::simulateCallsCall::SIGNATURE);
        assert_eq!(AGGREGATE_STATIC, IMultiCall::aggregateStaticCall::SIGNATURE);
        assert_eq!(TRY_AGGREGATE_STATIC, IMultiCall::tryAggregateStatic_0Call::SIGNATURE);
        assert_eq!(TRY_AGGREGATE_STATIC3, IMultiCall::tryAggregateStatic_1Call::SIGNATURE);
        assert_eq!(GET_CODE_LENGTHS, IMultiCall::getCodeLengthsCall::SIGNATURE);
        assert_eq!(GET_BALANCES, IMultiCall::getBalancesCall::SIGNATURE);
        assert_eq!(GET_ADDRESSES_DATA, IMultiCall::getAddressesDataCall::SIGNATURE);
        assert_eq!(GET_CHAIN_DATA, IMultiCall::getChainDataCall::SIGNATURE);
    }

    #[test]
    fn signatures_parse() {
        for op in ALL {
            let function = Function::parse(op.signature()).unwrap();
            assert_eq!(function.signature(), op.signature());
        }
    }

    #[test]
    fn selects_mode() {
        let plan = DispatchPlan::new(Operation::Aggregate, Submission::Transaction);
        assert_eq!(plan.mode, ExecutionMode::Transact);
        assert!(plan.requires_signer());
        assert!(plan.includes_value());

        let plan = DispatchPlan::new(Operation::Aggregate, Submission::Call);
        assert_eq!(plan.mode, ExecutionMode::TransactAsRead);
        assert!(!plan.requires_signer());
        assert!(plan.includes_value());

        let plan = DispatchPlan::new(Operation::Simulate, Submission::Transaction);
        assert_eq!(plan.mode, ExecutionMode::Simulate);
        assert!(plan.revert_is_data());
        assert!(!plan.includes_value());

        let plan = DispatchPlan::new(Operation::Balances, Submission::Transaction);
        assert_eq!(plan.mode, ExecutionMode::Metadata);
        assert!(!plan.reconciles());

        for op in ALL {
            let plan = DispatchPlan::new(op, Submission::Transaction);
            assert_eq!(plan.revert_is_data(), op == Operation::Simulate);
        }
    }

    #[test]
    fn appends_batch_flag_only_when_taken() {
        let calls = CallSet::from(vec![Call::new(Address::repeat_byte(1), bytes!("deadbeef"))]);

        let plan = DispatchPlan::new(
            Operation::TryAggregateStatic { require_success: true },
            Submission::Call,
        );
        let (calldata, value) = plan.encode_calls(&calls).unwrap();
        assert_eq!(value, U256::ZERO);
        assert_eq!(&calldata[..4], IMultiCall::tryAggregateStatic_0Call::SELECTOR);
        let decoded = IMultiCall::tryAggregateStatic_0Call::abi_decode(&calldata).unwrap();
        assert!(decoded.requireSuccess);
        assert_eq!(decoded.calls[0].target, Address::repeat_byte(1));

        let plan = DispatchPlan::new(Operation::AggregateStatic, Submission::Call);
        let (calldata, _) = plan.encode_calls(&calls).unwrap();
        assert_eq!(&calldata[..4], IMultiCall::aggregateStaticCall::SELECTOR);
        let decoded = IMultiCall::aggregateStaticCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.calls.len(), 1);
        assert_eq!(decoded.calls[0].callData, bytes!("deadbeef"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let calls = CallSet::from(vec![
            Call::new(Address::repeat_byte(1), bytes!("01")).with_value(U256::from(3)),
            Call::new(Address::repeat_byte(2), bytes!("02")).with_value(U256::from(4)),
        ]);
        let plan = DispatchPlan::new(Operation::Aggregate, Submission::Transaction);

        let first = plan.encode_calls(&calls).unwrap();
        let second = plan.encode_calls(&calls).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.1, U256::from(7));
    }
}
