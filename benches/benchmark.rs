// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! This module contains benchmarks for the `concurrent_oram` crate.

extern crate criterion;
use core::fmt;
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion,
};
use std::time::Duration;

use concurrent_oram::{
    Block, BlockId, DRLogSet, ObliviousQuery, OramConfig, RoundCapacity, StashMode, TreeHeight,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const DEPTHS_TO_BENCHMARK: [TreeHeight; 3] = [8, 12, 16];
const ROUND_CAPACITIES_TO_BENCHMARK: [RoundCapacity; 3] = [2, 16, 128];
const ARCHIVED_ROUNDS_TO_BENCHMARK: [usize; 3] = [16, 256, 4096];
const PAYLOAD_SIZE: usize = 64;

criterion_group!(
    name = benches;
    config = Criterion::default().warm_up_time(Duration::new(0, 1_000_000_00)).measurement_time(Duration::new(0, 1_000_000_00)).sample_size(10);
    targets =
    benchmark_direct_read::<StashModeShared>,
    benchmark_direct_read::<StashModePerClient>,
    benchmark_overlapping_read::<StashModeShared>,
    benchmark_overlapping_read::<StashModePerClient>,
    benchmark_finalize_round,
    benchmark_log_set_read,
);
criterion_main!(benches);

trait Named {
    const MODE: StashMode;
    fn short_name() -> String;
}

struct StashModeShared;
struct StashModePerClient;

impl Named for StashModeShared {
    const MODE: StashMode = StashMode::Shared;

    fn short_name() -> String {
        "SharedStash".into()
    }
}

impl Named for StashModePerClient {
    const MODE: StashMode = StashMode::PerClient;

    fn short_name() -> String {
        "PerClientStash".into()
    }
}

/// An ORAM with one block per leaf; block `i` sits at leaf `i`.
fn populated_oram(config: OramConfig, rng: &mut StdRng) -> ObliviousQuery {
    let depth = config.depth;
    let oram = ObliviousQuery::new(config).unwrap();
    for leaf in 0..(1u64 << depth) {
        let mut payload = vec![0u8; PAYLOAD_SIZE];
        rng.fill(&mut payload[..]);
        oram.place_block(leaf, Block::new(leaf as BlockId, payload))
            .unwrap();
    }
    oram
}

// With c = 1 every request is the only one of its round, so each read is direct.
fn benchmark_direct_read<T: Named>(c: &mut Criterion) {
    let mut group = c.benchmark_group(T::short_name() + "::direct_read");
    let mut rng = StdRng::seed_from_u64(0);
    for depth in DEPTHS_TO_BENCHMARK {
        let config = OramConfig::new(depth, 1).with_stash_mode(T::MODE);
        let oram = populated_oram(config, &mut rng);
        let leaf_count = 1u64 << depth;
        group.bench_function(
            BenchmarkId::from_parameter(ReadParameters {
                depth,
                round_capacity: 1,
            }),
            |b| {
                b.iter(|| {
                    let id = rng.gen_range(0..leaf_count) as BlockId;
                    oram.read(black_box(id), &mut rng).unwrap()
                })
            },
        );
    }
    group.finish();
}

// Each iteration is one full round of c = 2: the original request and its overlap.
// Archived rounds accumulate across iterations, so later overlaps scan more rounds.
fn benchmark_overlapping_read<T: Named>(c: &mut Criterion) {
    let mut group = c.benchmark_group(T::short_name() + "::overlapping_read");
    let mut rng = StdRng::seed_from_u64(0);
    for depth in DEPTHS_TO_BENCHMARK {
        let config = OramConfig::new(depth, 2).with_stash_mode(T::MODE);
        let oram = populated_oram(config, &mut rng);
        let leaf_count = 1u64 << depth;
        group.bench_function(
            BenchmarkId::from_parameter(ReadParameters {
                depth,
                round_capacity: 2,
            }),
            |b| {
                b.iter(|| {
                    let id = rng.gen_range(0..leaf_count) as BlockId;
                    oram.read(black_box(id), &mut rng).unwrap();
                    oram.read(black_box(id), &mut rng).unwrap()
                })
            },
        );
    }
    group.finish();
}

fn benchmark_finalize_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("DRLogSet::finalize_round");
    let mut rng = StdRng::seed_from_u64(0);
    for round_capacity in ROUND_CAPACITIES_TO_BENCHMARK {
        group.bench_with_input(
            BenchmarkId::from_parameter(round_capacity),
            &round_capacity,
            |b, &round_capacity| {
                b.iter_batched(
                    || {
                        let dr_log_set = DRLogSet::new(round_capacity).unwrap();
                        for id in 0..round_capacity {
                            let block = Block::new(id as BlockId, [0u8; PAYLOAD_SIZE]);
                            dr_log_set.append_to_current_round(block);
                        }
                        dr_log_set
                    },
                    |dr_log_set| {
                        dr_log_set.finalize_round(&mut rng);
                        dr_log_set
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

// Looks up an id that was never logged, which leaves every search index unchanged.
fn benchmark_log_set_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("DRLogSet::read_log_set");
    let mut rng = StdRng::seed_from_u64(0);
    let round_capacity = 2;
    for archived_rounds in ARCHIVED_ROUNDS_TO_BENCHMARK {
        let dr_log_set = DRLogSet::new(round_capacity).unwrap();
        for round in 0..archived_rounds {
            for sequence_id in 0..round_capacity {
                let id = (round * round_capacity + sequence_id) as BlockId;
                dr_log_set.write_log_set(
                    Block::new(id, [0u8; PAYLOAD_SIZE]),
                    sequence_id,
                    &mut rng,
                );
            }
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(archived_rounds),
            &archived_rounds,
            |b, _| b.iter(|| dr_log_set.read_log_set(black_box(-2))),
        );
    }
    group.finish();
}

#[derive(Clone, Copy)]
struct ReadParameters {
    depth: TreeHeight,
    round_capacity: RoundCapacity,
}

impl fmt::Display for ReadParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(Depth: {} Round capacity: {})",
            self.depth, self.round_capacity,
        )
    }
}
