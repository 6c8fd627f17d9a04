// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Completion signals for the requests of a round.
//!
//! An overlapping request waits until the original request for the same block has committed
//! its result to the [`DRLogSet`](crate::DRLogSet), and the last request of a round waits until
//! every earlier request of the round has finished. Both waits are bounded: a wait that times out
//! proceeds anyway, because a request, once registered, always completes.

use crate::{BlockId, RoundId, SequenceId};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct RoundProgress {
    committed_blocks: HashSet<BlockId>,
    finished_requests: HashSet<SequenceId>,
}

/// Per-round record of committed results and finished requests, with blocking waits on both.
#[derive(Debug, Default)]
pub struct RoundCompletions {
    rounds: Mutex<HashMap<RoundId, RoundProgress>>,
    changed: Condvar,
}

impl RoundCompletions {
    /// Returns an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the result for `block_id` in round `round` is in the log set.
    pub fn commit_block(&self, round: RoundId, block_id: BlockId) {
        self.rounds
            .lock()
            .entry(round)
            .or_default()
            .committed_blocks
            .insert(block_id);
        self.changed.notify_all();
    }

    /// Records that request `sequence_id` of round `round` has responded.
    pub fn finish_request(&self, round: RoundId, sequence_id: SequenceId) {
        self.rounds
            .lock()
            .entry(round)
            .or_default()
            .finished_requests
            .insert(sequence_id);
        self.changed.notify_all();
    }

    /// Waits until a result for `block_id` has been committed in round `round`, or until
    /// `timeout` elapses. Returns whether the result was committed.
    pub fn wait_for_block(&self, round: RoundId, block_id: BlockId, timeout: Duration) -> bool {
        self.wait_until(timeout, |rounds| {
            rounds
                .get(&round)
                .is_some_and(|progress| progress.committed_blocks.contains(&block_id))
        })
    }

    /// Waits until requests `0..upto` of round `round` have all responded, or until `timeout`
    /// elapses. Returns whether they all responded.
    pub fn wait_for_prefix(&self, round: RoundId, upto: SequenceId, timeout: Duration) -> bool {
        self.wait_until(timeout, |rounds| match rounds.get(&round) {
            Some(progress) => (0..upto).all(|i| progress.finished_requests.contains(&i)),
            None => upto == 0,
        })
    }

    /// Forgets every round older than `oldest_kept`.
    pub fn retire_before(&self, oldest_kept: RoundId) {
        self.rounds.lock().retain(|round, _| *round >= oldest_kept);
    }

    fn wait_until<F>(&self, timeout: Duration, done: F) -> bool
    where
        F: Fn(&HashMap<RoundId, RoundProgress>) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut rounds = self.rounds.lock();
        while !done(&rounds) {
            if self.changed.wait_until(&mut rounds, deadline).timed_out() {
                return done(&rounds);
            }
        }
        true
    }
}
