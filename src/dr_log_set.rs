// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The deferred-response log set.
//!
//! Each round's results accumulate in the *current round*. Closing the round pads a copy of
//! the results with `c` dummies, shuffles it, and archives it together with a *search index*:
//! the set of real block ids that may still be retrieved from that archived round. An id
//! leaves the index the first time it is looked up, so a real value can be retrieved from an
//! archived round at most once. Archived contents never change except for their order.

use crate::{Block, BlockId, OramError, RoundCapacity, SequenceId};
use parking_lot::Mutex;
use rand::{seq::SliceRandom, CryptoRng, RngCore};
use std::collections::HashSet;

#[derive(Debug)]
struct ArchivedRound {
    entries: Vec<Block>,
    search_index: HashSet<BlockId>,
}

#[derive(Debug, Default)]
struct LogSetState {
    current_round: Vec<Block>,
    archived: Vec<ArchivedRound>,
}

/// The deferred-response log set of an ORAM with round capacity `c`.
#[derive(Debug)]
pub struct DRLogSet {
    capacity: RoundCapacity,
    state: Mutex<LogSetState>,
}

impl DRLogSet {
    /// Returns an empty log set for rounds of `capacity` requests.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` if `capacity` is zero.
    pub fn new(capacity: RoundCapacity) -> Result<Self, OramError> {
        if capacity < 1 {
            return Err(OramError::invalid_configuration("round_capacity", capacity));
        }
        log::debug!("DRLogSet::new -- (c = {})", capacity);
        Ok(Self {
            capacity,
            state: Mutex::new(LogSetState::default()),
        })
    }

    /// The round capacity `c`.
    pub fn capacity(&self) -> RoundCapacity {
        self.capacity
    }

    /// Appends `block` to the current round.
    pub fn append_to_current_round(&self, block: Block) {
        self.state.lock().current_round.push(block);
    }

    /// Records the result `block` of request `sequence_id`.
    ///
    /// If an archived round exists at position `sequence_id`, its entries are reshuffled.
    /// If `sequence_id` is the last of the round (`c - 1`), the round is closed.
    /// Returns whether the round was closed.
    pub fn write_log_set<R: RngCore + CryptoRng>(
        &self,
        block: Block,
        sequence_id: SequenceId,
        rng: &mut R,
    ) -> bool {
        let mut state = self.state.lock();
        state.current_round.push(block);

        if let Some(archived_round) = state.archived.get_mut(sequence_id) {
            archived_round.entries.shuffle(rng);
        }

        if sequence_id + 1 == self.capacity {
            self.finalize_locked(&mut state, rng);
            return true;
        }
        false
    }

    /// Looks up `block_id` in the current round and then in every archived round, most recently
    /// archived first.
    ///
    /// The result holds the block from the current round if it is there, followed by one entry
    /// per archived round: the real block if `block_id` is still in that round's search index
    /// and was *not* found in the current round, and a dummy otherwise. Every archived round
    /// whose index held `block_id` loses it.
    pub fn read_log_set(&self, block_id: BlockId) -> Vec<Block> {
        let mut state = self.state.lock();
        let mut result = Vec::with_capacity(state.archived.len() + 1);

        // LEAK: unlike the stash, lookups here are not constant time. The current round and
        // each archived round are searched with early exit, and the search index is a hash set.
        let in_current_round = match state
            .current_round
            .iter()
            .find(|block| block.has_id(block_id))
        {
            Some(block) => {
                result.push(block.clone());
                true
            }
            None => false,
        };

        for archived_round in state.archived.iter_mut().rev() {
            if !archived_round.search_index.remove(&block_id) {
                result.push(Block::dummy());
                continue;
            }

            // A block requested again while its previous result is still pending must not be
            // confirmed by an archived round.
            let contribution = if in_current_round {
                None
            } else {
                archived_round
                    .entries
                    .iter()
                    .find(|block| block.has_id(block_id))
                    .cloned()
            };
            result.push(contribution.unwrap_or_default());
        }

        result
    }

    /// Closes the current round: a copy padded with `c` dummies is shuffled and archived, and
    /// the real ids of the round become its search index. Does nothing if the round is empty.
    pub fn finalize_round<R: RngCore + CryptoRng>(&self, rng: &mut R) {
        let mut state = self.state.lock();
        self.finalize_locked(&mut state, rng);
    }

    fn finalize_locked<R: RngCore + CryptoRng>(&self, state: &mut LogSetState, rng: &mut R) {
        if state.current_round.is_empty() {
            return;
        }

        let results = std::mem::take(&mut state.current_round);
        let search_index: HashSet<BlockId> = results
            .iter()
            .filter(|block| !block.is_dummy())
            .map(Block::id)
            .collect();

        let mut entries = results;
        entries.resize(entries.len() + self.capacity, Block::dummy());
        entries.shuffle(rng);

        log::debug!(
            "Round archived -- (archived round {}, entries = {}, retrievable = {})",
            state.archived.len(),
            entries.len(),
            search_index.len()
        );

        state.archived.push(ArchivedRound {
            entries,
            search_index,
        });
    }

    /// A copy of the current round's results.
    pub fn current_round(&self) -> Vec<Block> {
        self.state.lock().current_round.clone()
    }

    /// The number of archived rounds.
    pub fn archived_round_count(&self) -> usize {
        self.state.lock().archived.len()
    }

    /// A copy of the entries of archived round `round`, oldest round first.
    pub fn archived_round(&self, round: usize) -> Option<Vec<Block>> {
        self.state
            .lock()
            .archived
            .get(round)
            .map(|archived_round| archived_round.entries.clone())
    }

    /// A copy of the search index of archived round `round`.
    pub fn search_index(&self, round: usize) -> Option<HashSet<BlockId>> {
        self.state
            .lock()
            .archived
            .get(round)
            .map(|archived_round| archived_round.search_index.clone())
    }
}
