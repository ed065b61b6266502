//! Ordered call sets and their serialization into the batching contract's tuple shape.

use super::{Call, CallWithFailure};
use crate::error::NormalizationError;
use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::U256,
};

/// An ordered, immutable set of calls.
///
/// The position of a call is the only correlation key between the call and its slot in the
/// aggregated response, so every operation on the set preserves order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSet {
    /// Calls sharing a batch-level require-success flag.
    Calls(Vec<Call>),
    /// Calls that each carry their own require-success flag.
    WithFailure(Vec<CallWithFailure>),
}

impl CallSet {
    /// Number of calls in the set.
    pub fn len(&self) -> usize {
        match self {
            Self::Calls(calls) => calls.len(),
            Self::WithFailure(calls) => calls.len(),
        }
    }

    /// Returns `true` if the set holds no calls.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the call at `index`.
    pub fn get(&self, index: usize) -> Option<&Call> {
        match self {
            Self::Calls(calls) => calls.get(index),
            Self::WithFailure(calls) => calls.get(index).map(|call| &call.call),
        }
    }

    /// Returns an iterator over the calls, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Call> {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Returns the per-call require-success flag at `index`.
    ///
    /// Always `None` for [`CallSet::Calls`], whose flag is set per batch.
    pub fn require_success_at(&self, index: usize) -> Option<bool> {
        match self {
            Self::Calls(_) => None,
            Self::WithFailure(calls) => calls.get(index).map(|call| call.require_success),
        }
    }

    /// Returns the declared return types of the call at `index`.
    pub fn return_types_at(&self, index: usize) -> Option<&[DynSolType]> {
        self.get(index).and_then(|call| call.return_types.as_deref())
    }

    /// Serializes the set into the tuple array the batching contract expects, along with the
    /// total value to attach to the outer call.
    ///
    /// Each tuple is `(address, bytes[, uint256][, bool])`: the value is only included if
    /// `include_value` is set, the require-success flag only for [`CallSet::WithFailure`].
    /// Without `include_value` per-call values are ignored and the total is zero.
    pub fn to_array(&self, include_value: bool) -> Result<(DynSolValue, U256), NormalizationError> {
        let mut total = U256::ZERO;
        let mut tuples = Vec::with_capacity(self.len());

        for (index, call) in self.iter().enumerate() {
            if call.target.is_zero() {
                return Err(NormalizationError::MissingTarget { index });
            }

            let mut fields = vec![
                DynSolValue::Address(call.target),
                DynSolValue::Bytes(call.calldata.to_vec()),
            ];
            if include_value {
                let value = call.value_or_zero();
                total = total.checked_add(value).ok_or(NormalizationError::ValueOverflow)?;
                fields.push(DynSolValue::Uint(value, 256));
            }
            if let Some(require_success) = self.require_success_at(index) {
                fields.push(DynSolValue::Bool(require_success));
            }
            tuples.push(DynSolValue::Tuple(fields));
        }

        Ok((DynSolValue::Array(tuples), total))
    }
}

impl From<Vec<Call>> for CallSet {
    fn from(calls: Vec<Call>) -> Self {
        Self::Calls(calls)
    }
}

impl From<Vec<CallWithFailure>> for CallSet {
    fn from(calls: Vec<CallWithFailure>) -> Self {
        Self::WithFailure(calls)
    }
}

impl FromIterator<Call> for CallSet {
    fn from_iter<I: IntoIterator<Item = Call>>(iter: I) -> Self {
        Self::Calls(iter.into_iter().collect())
    }
}

impl FromIterator<CallWithFailure> for CallSet {
    fn from_iter<I: IntoIterator<Item = CallWithFailure>>(iter: I) -> Self {
        Self::WithFailure(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, bytes};

    fn call(byte: u8) -> Call {
        Call::new(Address::repeat_byte(byte), Bytes::from(vec![byte; 4]))
    }

    #[test]
    fn serializes_in_order_without_value() {
        let set = CallSet::from(vec![call(1).with_value(U256::from(5)), call(2)]);
        let (array, total) = set.to_array(false).unwrap();

        assert_eq!(total, U256::ZERO);
        assert_eq!(
            array,
            DynSolValue::Array(vec![
                DynSolValue::Tuple(vec![
                    DynSolValue::Address(Address::repeat_byte(1)),
                    DynSolValue::Bytes(vec![1; 4]),
                ]),
                DynSolValue::Tuple(vec![
                    DynSolValue::Address(Address::repeat_byte(2)),
                    DynSolValue::Bytes(vec![2; 4]),
                ]),
            ])
        );
    }

    #[test]
    fn sums_values_when_included() {
        let set = CallSet::from(vec![
            call(1).with_value(U256::from(5)),
            call(2),
            call(3).with_value(U256::from(7)),
        ]);
        let (array, total) = set.to_array(true).unwrap();

        assert_eq!(total, U256::from(12));
        let DynSolValue::Array(tuples) = array else { panic!("expected array") };
        assert_eq!(tuples.len(), 3);
        assert_eq!(
            tuples[1],
            DynSolValue::Tuple(vec![
                DynSolValue::Address(Address::repeat_byte(2)),
                DynSolValue::Bytes(vec![2; 4]),
                DynSolValue::Uint(U256::ZERO, 256),
            ])
        );
    }

    #[test]
    fn appends_per_call_flag() {
        let set = CallSet::from(vec![call(1).require_success(true), call(2).require_success(false)]);

        let (array, _) = set.to_array(false).unwrap();
        let DynSolValue::Array(tuples) = array else { panic!("expected array") };
        assert_eq!(
            tuples[1],
            DynSolValue::Tuple(vec![
                DynSolValue::Address(Address::repeat_byte(2)),
                DynSolValue::Bytes(vec![2; 4]),
                DynSolValue::Bool(false),
            ])
        );

        let (array, _) = set.to_array(true).unwrap();
        let DynSolValue::Array(tuples) = array else { panic!("expected array") };
        let DynSolValue::Tuple(fields) = &tuples[0] else { panic!("expected tuple") };
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[3], DynSolValue::Bool(true));
    }

    #[test]
    fn rejects_missing_target() {
        let set = CallSet::from(vec![call(1), Call::new(Address::ZERO, bytes!("01"))]);
        assert_eq!(set.to_array(false).unwrap_err(), NormalizationError::MissingTarget { index: 1 });
    }

    #[test]
    fn rejects_value_overflow() {
        let set = CallSet::from(vec![call(1).with_value(U256::MAX), call(2).with_value(U256::from(1))]);
        assert_eq!(set.to_array(true).unwrap_err(), NormalizationError::ValueOverflow);
        // values are ignored for reads
        assert!(set.to_array(false).is_ok());
    }

    #[test]
    fn exposes_return_types() {
        let set = CallSet::from(vec![call(1), call(2).with_return_types(&["uint256"]).unwrap()]);
        assert_eq!(set.len(), 2);
        assert!(set.return_types_at(0).is_none());
        assert_eq!(set.return_types_at(1), Some(&[DynSolType::Uint(256)][..]));
        assert!(set.return_types_at(2).is_none());
    }

    #[test]
    fn serialization_is_idempotent() {
        let set = CallSet::from(vec![call(1).with_value(U256::from(1)), call(2)]);
        assert_eq!(set.to_array(true).unwrap(), set.to_array(true).unwrap());
    }
}
