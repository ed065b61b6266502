//! Benchmarks for batch encoding and response reconciliation.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, U256},
    sol_types::SolValue,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use multicall::{
    Call, CallSet, Operation, Submission,
    multicall::{
        DispatchPlan,
        reconcile::{decode_outer, reconcile_response},
    },
};

fn calls(size: usize) -> CallSet {
    (0..size)
        .map(|i| {
            let holder = Address::with_last_byte(i as u8);
            Call::from_signature(
                Address::repeat_byte(0xc0),
                "balanceOf(address)",
                &[DynSolValue::Address(holder)],
            )
            .unwrap()
            .with_return_types(&["uint256"])
            .unwrap()
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_calls");
    let plan = DispatchPlan::new(Operation::AggregateStatic, Submission::Call);

    for size in [2, 16, 128] {
        let calls = calls(size);
        group.bench_with_input(BenchmarkId::new("aggregate_static", size), &calls, |b, calls| {
            b.iter(|| plan.encode_calls(black_box(calls)).unwrap());
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let operation = Operation::TryAggregateStatic { require_success: false };
    let plan = DispatchPlan::new(operation, Submission::Call);

    for size in [2, 16, 128] {
        let calls = calls(size);
        let response: Vec<(bool, Bytes)> = (0..size)
            .map(|i| (i % 4 != 0, Bytes::from(U256::from(i).abi_encode())))
            .collect();
        let response = Bytes::from((response,).abi_encode_params());

        group.bench_with_input(
            BenchmarkId::new("try_aggregate_static", size),
            &(calls, response),
            |b, (calls, response)| {
                b.iter(|| {
                    let outer = decode_outer(&plan, black_box(response)).unwrap();
                    reconcile_response(&plan, calls, outer).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_reconcile);
criterion_main!(benches);
