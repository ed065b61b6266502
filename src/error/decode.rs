use thiserror::Error;

/// Errors raised while decoding or reconciling an aggregated response.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes did not match the declared ABI schema.
    #[error("error decoding call result: {0}")]
    Abi(#[from] alloy::dyn_abi::Error),
    /// The simulation revert payload could not be decoded.
    #[error("error decoding simulation result: {0}")]
    Simulation(#[from] alloy::sol_types::Error),
    /// The decoded response does not hold one slot per submitted call.
    #[error("expected {expected} results, got {actual}")]
    ShapeMismatch {
        /// Number of submitted calls.
        expected: usize,
        /// Number of slots found at the per-call nesting depth.
        actual: usize,
    },
    /// The decoded response ran out of nesting before reaching the per-call slots.
    #[error("expected a list at nesting depth {depth}")]
    NotNested {
        /// Depth at which a list was expected.
        depth: usize,
    },
    /// A per-call slot does not have the shape the outer schema declares.
    #[error("result {index} does not match `{expected}`")]
    UnexpectedSlot {
        /// Position of the slot.
        index: usize,
        /// The element type declared by the outer schema.
        expected: String,
    },
    /// Decoding the return data of a single call against its declared types failed.
    #[error("error decoding result {index}: {source}")]
    Call {
        /// Position of the call.
        index: usize,
        /// The underlying decoding error.
        #[source]
        source: alloy::dyn_abi::Error,
    },
    /// The simulation reverted without any revert data attached.
    #[error("simulation reverted without revert data")]
    MissingRevertData,
    /// The simulation returned normally instead of reverting with its results.
    #[error("simulation did not revert")]
    SimulationNotReverted,
}
