// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The log of requests made in the current round.

use crate::{BlockId, RoundId, SequenceId};
use parking_lot::Mutex;

/// The outcome of registering a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    /// The round the request belongs to.
    pub round: RoundId,
    /// The position of the request within its round.
    pub sequence_id: SequenceId,
    /// Whether an earlier request of the same round asked for the same block.
    pub is_overlap: bool,
}

#[derive(Debug, Default)]
struct QueryLogState {
    round: RoundId,
    requests: Vec<BlockId>,
}

/// Records the block ids requested in the current round.
#[derive(Debug, Default)]
pub struct QueryLog {
    state: Mutex<QueryLogState>,
}

impl QueryLog {
    /// Returns an empty log for round 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `block_id` to the log and reports whether it was already requested this round.
    /// The check and the append happen in one critical section, so of several concurrent
    /// registrations of the same id exactly one sees `is_overlap == false`.
    pub fn register(&self, block_id: BlockId) -> Registration {
        let mut state = self.state.lock();
        let is_overlap = state.requests.contains(&block_id);
        state.requests.push(block_id);
        Registration {
            round: state.round,
            sequence_id: state.requests.len() - 1,
            is_overlap,
        }
    }

    /// Empties the log and starts the next round.
    pub fn clear(&self) {
        self.rotate(|_| ());
    }

    /// Runs `close_round` on the current round id, then empties the log and starts the next
    /// round, holding the log's lock throughout so that no request registers while the round is
    /// being closed. `close_round` must not call back into this log.
    pub fn rotate<T, F: FnOnce(RoundId) -> T>(&self, close_round: F) -> T {
        let mut state = self.state.lock();
        let result = close_round(state.round);
        state.requests.clear();
        state.round += 1;
        result
    }

    /// Like [`QueryLog::rotate`], for the request that closes round `round`: `close_round`
    /// always runs, but the log only rotates if `round` has not been closed already.
    ///
    /// `close_round` receives the number of requests registered in `round` if `round` is still
    /// current, and `None` if it was closed already, in which case the log is left untouched.
    pub fn rotate_round<T, F: FnOnce(Option<usize>) -> T>(
        &self,
        round: RoundId,
        close_round: F,
    ) -> T {
        let mut state = self.state.lock();
        if state.round != round {
            return close_round(None);
        }
        let result = close_round(Some(state.requests.len()));
        state.requests.clear();
        state.round += 1;
        result
    }

    /// The current round.
    pub fn round(&self) -> RoundId {
        self.state.lock().round
    }

    /// A copy of the ids registered this round, in registration order.
    pub fn entries(&self) -> Vec<BlockId> {
        self.state.lock().requests.clone()
    }

    /// The number of requests registered this round.
    pub fn len(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Whether no request has registered this round.
    pub fn is_empty(&self) -> bool {
        self.state.lock().requests.is_empty()
    }
}
