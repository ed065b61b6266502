//! Reconciliation of an aggregated response into one result per submitted call.

use super::DispatchPlan;
use crate::{
    error::DecodeError,
    types::{CallSet, IMultiCall, ResultData},
};
use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    hex,
    sol_types::SolError,
};
use tracing::trace;

/// Number of list levels between the decoded response and the per-call slots.
///
/// Every call-set schema is a single array whose elements are the per-call slots.
pub const PER_CALL_DEPTH: usize = 1;

/// Decodes a response against the plan's outer schema.
pub fn decode_outer(plan: &DispatchPlan, data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
    match DynSolType::Tuple(plan.outer.clone()).abi_decode_params(data)? {
        DynSolValue::Tuple(values) => Ok(values),
        value => Ok(vec![value]),
    }
}

/// Decodes the revert payload of a simulation into the outer value sequence
/// `[[(success, returnData, gasUsed), ..]]`.
pub fn decode_simulation(revert: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
    let IMultiCall::MultiCall__Simulation { results } =
        IMultiCall::MultiCall__Simulation::abi_decode(revert)?;
    let results = results
        .into_iter()
        .map(|result| {
            DynSolValue::Tuple(vec![
                DynSolValue::Bool(result.success),
                DynSolValue::Bytes(result.returnData.to_vec()),
                DynSolValue::Uint(result.gasUsed, 256),
            ])
        })
        .collect();
    Ok(vec![DynSolValue::Array(results)])
}

/// Reconciles a decoded response against the call set it was produced from.
///
/// Metadata plans have no per-call structure and yield the outer values unchanged.
pub fn reconcile_response(
    plan: &DispatchPlan,
    calls: &CallSet,
    outer: Vec<DynSolValue>,
) -> Result<ResultData, DecodeError> {
    if !plan.reconciles() {
        return Ok(ResultData::Outer(outer));
    }

    let mut reconciled = reconcile(plan, calls, &outer)?;
    if plan.revert_is_data() {
        reconciled = hex_return_data(reconciled);
    }
    Ok(ResultData::from_reconciled(reconciled, outer))
}

/// Descends to the per-call slots and decodes every slot whose call declares return types.
///
/// Fails if the slots do not line up one-to-one with the calls, or if a slot does not have
/// the element type declared by the outer schema.
pub fn reconcile(
    plan: &DispatchPlan,
    calls: &CallSet,
    outer: &[DynSolValue],
) -> Result<Vec<DynSolValue>, DecodeError> {
    let Some(slot_type) = slot_type(&plan.outer) else {
        return Err(DecodeError::NotNested { depth: 0 });
    };
    let slots = per_call_slots(outer)?;

    if slots.len() != calls.len() {
        return Err(DecodeError::ShapeMismatch { expected: calls.len(), actual: slots.len() });
    }

    slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            if !slot_type.matches(slot) {
                return Err(DecodeError::UnexpectedSlot {
                    index,
                    expected: slot_type.sol_type_name().into_owned(),
                });
            }
            reconcile_slot(index, slot, calls.return_types_at(index))
        })
        .collect()
}

fn slot_type(outer: &[DynSolType]) -> Option<&DynSolType> {
    match outer {
        [DynSolType::Array(element)] => Some(element),
        _ => None,
    }
}

fn per_call_slots(outer: &[DynSolValue]) -> Result<&[DynSolValue], DecodeError> {
    let mut slots = outer;
    for depth in 0..PER_CALL_DEPTH {
        slots = match slots {
            [DynSolValue::Array(inner)] => inner,
            _ => return Err(DecodeError::NotNested { depth }),
        };
    }
    Ok(slots)
}

fn reconcile_slot(
    index: usize,
    slot: &DynSolValue,
    return_types: Option<&[DynSolType]>,
) -> Result<DynSolValue, DecodeError> {
    let Some(return_types) = return_types else {
        return Ok(slot.clone());
    };

    match slot {
        DynSolValue::Bytes(data) => decode_return(index, return_types, data),
        DynSolValue::Tuple(fields) => match fields.as_slice() {
            [DynSolValue::Bool(true), DynSolValue::Bytes(data)] => Ok(DynSolValue::Tuple(vec![
                DynSolValue::Bool(true),
                decode_return(index, return_types, data)?,
            ])),
            _ => Ok(slot.clone()),
        },
        _ => Ok(slot.clone()),
    }
}

fn decode_return(
    index: usize,
    return_types: &[DynSolType],
    data: &[u8],
) -> Result<DynSolValue, DecodeError> {
    trace!(index, len = data.len(), "decoding call result");
    DynSolType::Tuple(return_types.to_vec())
        .abi_decode_params(data)
        .map_err(|source| DecodeError::Call { index, source })
}

/// Rewrites the `returnData` of every simulation result as a lowercase hex string without
/// prefix.
fn hex_return_data(results: Vec<DynSolValue>) -> Vec<DynSolValue> {
    results
        .into_iter()
        .map(|result| match result {
            DynSolValue::Tuple(fields) => DynSolValue::Tuple(
                fields
                    .into_iter()
                    .enumerate()
                    .map(|(position, field)| match field {
                        DynSolValue::Bytes(data) if position == 1 => {
                            DynSolValue::String(hex::encode(data))
                        }
                        field => field,
                    })
                    .collect(),
            ),
            other => other,
        })
        .collect()
}
