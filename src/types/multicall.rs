//! Batching contract interface.
//!
//! The human readable signatures used for dispatch are checked against these definitions.

use alloy::sol;

sol! {
    /// A call forwarded by the mutating entry points.
    #[derive(Debug)]
    struct CallValue {
        /// Target contract address
        address target;
        /// Encoded function call data
        bytes callData;
        /// Value forwarded with the call
        uint256 value;
    }

    /// A call forwarded by the mutating entry points, with its own failure flag.
    #[derive(Debug)]
    struct CallValueFailure {
        address target;
        bytes callData;
        uint256 value;
        /// Whether a revert of this call reverts the batch
        bool requireSuccess;
    }

    /// A call forwarded by the static entry points.
    #[derive(Debug)]
    struct StaticCall {
        address target;
        bytes callData;
    }

    /// A call forwarded by the static entry points, with its own failure flag.
    #[derive(Debug)]
    struct StaticCallFailure {
        address target;
        bytes callData;
        bool requireSuccess;
    }

    /// Result of a single call in a failure tolerant batch
    #[derive(Debug)]
    struct CallResult {
        bool success;
        bytes returnData;
    }

    /// Result of a single simulated call
    #[derive(Debug)]
    struct SimulationResult {
        bool success;
        bytes returnData;
        uint256 gasUsed;
    }

    #[derive(Debug)]
    interface IMultiCall {
        /// Carries the simulation results out of a reverted `simulateCalls`.
        error MultiCall__Simulation(SimulationResult[] results);

        function aggregateCalls(CallValue[] calldata calls)
            external payable returns (bytes[] memory results);

        function tryAggregateCalls(CallValue[] calldata calls, bool requireSuccess)
            external payable returns (CallResult[] memory results);

        function tryAggregateCalls(CallValueFailure[] calldata calls)
            external payable returns (CallResult[] memory results);

        function simulateCalls(StaticCall[] calldata calls) external;

        function aggregateStatic(StaticCall[] calldata calls)
            external view returns (bytes[] memory results);

        function tryAggregateStatic(StaticCall[] calldata calls, bool requireSuccess)
            external view returns (CallResult[] memory results);

        function tryAggregateStatic(StaticCallFailure[] calldata calls)
            external view returns (CallResult[] memory results);

        function getCodeLengths(address[] calldata addresses)
            external view returns (uint256[] memory lengths);

        function getBalances(address[] calldata addresses)
            external view returns (uint256[] memory balances);

        function getAddressesData(address[] calldata addresses)
            external view returns (uint256[] memory balances, uint256[] memory codeLengths);

        function getChainData()
            external view
            returns (
                uint256 chainId,
                uint256 blockNumber,
                bytes32 blockHash,
                uint256 timestamp,
                address coinbase,
                uint256 prevrandao,
                uint256 gasLimit,
                uint256 baseFee,
                uint256 blobBaseFee
            );
    }
}
