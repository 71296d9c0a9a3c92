// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_signal::{Signal, Slot, VirtualFunction};

const SIZES: [usize; 3] = [1, 16, 256];

fn counting_signal(n: usize) -> (Signal<u64>, Rc<Cell<u64>>, Vec<Slot>) {
    let sig = Signal::with_capacity(n);
    let acc = Rc::new(Cell::new(0_u64));
    let slots = (0..n)
        .map(|_| {
            let acc = acc.clone();
            sig.connect(move |v: u64| acc.set(acc.get().wrapping_add(v)))
        })
        .collect();
    (sig, acc, slots)
}

fn delegating_chain(n: usize) -> (VirtualFunction<u64, u64>, Vec<Slot>) {
    let vf = VirtualFunction::with_capacity(n);
    let mut slots = Vec::with_capacity(n);
    slots.push(vf.connect(|v, _| Ok(v)));
    for _ in 1..n {
        slots.push(vf.connect(|v: u64, sup| Ok(sup.invoke(v)?.wrapping_add(1))));
    }
    (vf, slots)
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_emit");
    for n in SIZES {
        let (sig, acc, _slots) = counting_signal(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("all_live_n{}", n), |b| {
            b.iter(|| sig.notify(black_box(1)));
        });
        black_box(acc.get());
    }
    for n in SIZES {
        let (sig, _acc, slots) = counting_signal(n);
        // Every other handler disabled: filtered out by the snapshot.
        for slot in slots.iter().step_by(2) {
            slot.disable();
        }
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("half_disabled_n{}", n), |b| {
            b.iter(|| sig.notify(black_box(1)));
        });
    }
    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("virtual_function_invoke");
    for n in SIZES {
        let (vf, _slots) = delegating_chain(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("full_delegation_n{}", n), |b| {
            b.iter(|| black_box(vf.invoke(black_box(1))));
        });
    }
    group.finish();
}

fn bench_connect_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect");
    for n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("connect_invalidate_reconnect_n{}", n), |b| {
            b.iter_batched(
                || counting_signal(n),
                |(sig, _acc, slots)| {
                    for slot in &slots {
                        slot.invalidate();
                    }
                    // One connect prunes every invalidated entry.
                    let fresh = sig.connect(|_| {});
                    black_box((sig.connection_count(), fresh));
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_emit, bench_chain, bench_connect_prune);
criterion_main!(benches);
