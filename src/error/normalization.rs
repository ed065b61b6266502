use thiserror::Error;

/// Errors raised while normalizing calls into the batching contract's tuple shape.
///
/// These are always detected before any network access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// The call at `index` has no target.
    #[error("call {index} has no target address")]
    MissingTarget {
        /// Position of the call in the call set.
        index: usize,
    },
    /// The sum of all call values does not fit into a `uint256`.
    #[error("total call value overflows uint256")]
    ValueOverflow,
    /// A return type tag could not be parsed.
    #[error("invalid return type `{ty}`: {reason}")]
    InvalidReturnType {
        /// The offending type tag.
        ty: String,
        /// Why the parser rejected it.
        reason: String,
    },
    /// A function signature could not be parsed or its arguments encoded.
    #[error("invalid call to `{signature}`: {reason}")]
    InvalidSignature {
        /// The offending signature.
        signature: String,
        /// Why encoding failed.
        reason: String,
    },
}
