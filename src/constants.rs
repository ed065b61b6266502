//! Multicall constants.

use alloy::primitives::Address;
use std::time::Duration;

/// Sender used for stateless reads.
///
/// Reads are issued from the zero address unless a signer is involved.
pub const READ_SENDER: Address = Address::ZERO;

/// Default timeout applied to every RPC request made by the engine.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default location of the configuration file used by the CLI.
pub const DEFAULT_CONFIG_PATH: &str = "multicall.yaml";

/// Marker the RPC node puts in the error message of a reverted `eth_call`.
pub const EXECUTION_REVERTED: &str = "execution reverted";

/// Interval between receipt lookups for a broadcast transaction.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for a broadcast transaction to be included.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
