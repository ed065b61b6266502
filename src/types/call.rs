//! Call descriptors submitted to the batching contract.

use crate::error::NormalizationError;
use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt},
    json_abi::Function,
    primitives::{Address, Bytes, U256},
};

/// A single call in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// The call target.
    pub target: Address,
    /// The encoded calldata.
    pub calldata: Bytes,
    /// Amount of native value to send along with the call.
    pub value: Option<U256>,
    /// The types the call returns, used to decode its slot in the aggregated response.
    pub return_types: Option<Vec<DynSolType>>,
}

impl Call {
    /// Creates a new [`Call`] with raw calldata.
    pub fn new(target: Address, calldata: impl Into<Bytes>) -> Self {
        Self { target, calldata: calldata.into(), value: None, return_types: None }
    }

    /// Creates a new [`Call`] by encoding `args` against a human readable signature, e.g.
    /// `balanceOf(address)`.
    ///
    /// See [`Function::parse`].
    pub fn from_signature(
        target: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<Self, NormalizationError> {
        let invalid = |reason: String| NormalizationError::InvalidSignature {
            signature: signature.to_string(),
            reason,
        };
        let function = Function::parse(signature).map_err(|err| invalid(err.to_string()))?;
        let calldata = function.abi_encode_input(args).map_err(|err| invalid(err.to_string()))?;
        Ok(Self::new(target, calldata))
    }

    /// Sets the value to send with the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the types the call returns, parsed from type tags such as `uint256` or
    /// `(bool,bytes)`.
    pub fn with_return_types<S: AsRef<str>>(
        mut self,
        types: &[S],
    ) -> Result<Self, NormalizationError> {
        let types = types
            .iter()
            .map(|ty| {
                DynSolType::parse(ty.as_ref()).map_err(|err| {
                    NormalizationError::InvalidReturnType {
                        ty: ty.as_ref().to_string(),
                        reason: err.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.return_types = Some(types);
        Ok(self)
    }

    /// Returns the value sent with the call, zero if unset.
    pub fn value_or_zero(&self) -> U256 {
        self.value.unwrap_or_default()
    }

    /// Wraps the call into a [`CallWithFailure`].
    pub fn require_success(self, require_success: bool) -> CallWithFailure {
        CallWithFailure { call: self, require_success }
    }
}

/// A [`Call`] carrying its own require-success flag.
///
/// Used by the batching variants that tolerate failures per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallWithFailure {
    /// The call.
    pub call: Call,
    /// Whether a revert of this call should revert the whole batch.
    pub require_success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, bytes};

    #[test]
    fn encodes_from_signature() {
        let holder = address!("0000000000000000000000000000000000000001");
        let call = Call::from_signature(
            address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            "balanceOf(address)",
            &[DynSolValue::Address(holder)],
        )
        .unwrap();

        assert_eq!(
            call.calldata,
            bytes!("70a082310000000000000000000000000000000000000000000000000000000000000001")
        );
        assert!(call.value.is_none());
    }

    #[test]
    fn rejects_bad_signature_arguments() {
        let err = Call::from_signature(Address::repeat_byte(1), "balanceOf(address)", &[])
            .unwrap_err();
        assert!(matches!(err, NormalizationError::InvalidSignature { .. }));
    }

    #[test]
    fn parses_return_types() {
        let call = Call::new(Address::repeat_byte(1), Bytes::new())
            .with_return_types(&["uint256", "(bool,bytes)"])
            .unwrap();
        assert_eq!(
            call.return_types,
            Some(vec![
                DynSolType::Uint(256),
                DynSolType::Tuple(vec![DynSolType::Bool, DynSolType::Bytes])
            ])
        );

        let err = Call::new(Address::repeat_byte(1), Bytes::new())
            .with_return_types(&["uint257"])
            .unwrap_err();
        assert!(matches!(err, NormalizationError::InvalidReturnType { ty, .. } if ty == "uint257"));
    }
}
