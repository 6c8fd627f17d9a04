// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The read protocol that client threads call.

use crate::{
    completion::RoundCompletions,
    config::{OramConfig, StashMode},
    tree_index::{random_leaf, CompleteBinaryTreeIndex},
    Block, BlockId, DRLogSet, ObliviousTree, OramError, PositionMap, QueryLog, Registration,
    Stash, StashSet, TreeIndex,
};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// Shared handles to the data structures an [`ObliviousQuery`] composes.
/// Each structure guards itself; there is no lock spanning several of them.
#[derive(Clone, Debug)]
pub struct OramComponents {
    /// The bucket tree.
    pub tree: Arc<ObliviousTree>,
    /// The block id to leaf mapping.
    pub position_map: Arc<PositionMap>,
    /// The stash used with [`StashMode::Shared`].
    pub stash: Arc<Stash>,
    /// The stashes used with [`StashMode::PerClient`].
    pub stash_set: Arc<StashSet>,
    /// The deferred-response log set.
    pub dr_log_set: Arc<DRLogSet>,
    /// The log of the current round's requests.
    pub query_log: Arc<QueryLog>,
}

impl OramComponents {
    /// Returns freshly allocated, empty components for `config`.
    pub fn new(config: &OramConfig) -> Result<Self, OramError> {
        config.validate()?;
        Ok(Self {
            tree: Arc::new(ObliviousTree::with_bucket_capacity(
                config.depth,
                config.bucket_capacity,
            )?),
            position_map: Arc::new(PositionMap::new()),
            stash: Arc::new(Stash::new()),
            stash_set: Arc::new(StashSet::new(config.round_capacity)?),
            dr_log_set: Arc::new(DRLogSet::new(config.round_capacity)?),
            query_log: Arc::new(QueryLog::new()),
        })
    }
}

/// Serves reads for concurrent clients.
///
/// Cloning is cheap and every clone shares the same components, so each client thread holds
/// its own clone.
///
/// ## Protocol
///
/// Each read registers with the [`QueryLog`], which numbers it within the current round and
/// reports whether an earlier request of the round asked for the same block.
///
/// - A *direct* request resolves the block's leaf in the [`PositionMap`], copies the buckets
///     on that path into the stash, takes the block out of the stash, records the result in the
///     [`DRLogSet`] and signals that the result is committed.
///     An unmapped block yields a dummy result, which is recorded all the same.
/// - An *overlapping* request never touches the block's path. It copies a uniformly random
///     decoy path into the stash, waits until the original request of the round has committed,
///     and answers from the [`DRLogSet`].
///
/// The request numbered `c - 1` closes the round: it waits for the earlier requests of the round,
/// then archives the round's results and starts a new round in one step.
/// Once every request of the round has responded, the stash is emptied in that same step.
///
/// ## Security
///
/// The physical accesses of a request are one root-to-leaf path, whether the request is direct
/// or overlapping, and a result always has the shape of a block, whether it is real or a dummy.
/// Timing is not hidden: an overlapping request waits for another request, and the stash scan
/// leaks the stash size.
#[derive(Clone, Debug)]
pub struct ObliviousQuery {
    config: OramConfig,
    components: OramComponents,
    completions: Arc<RoundCompletions>,
}

impl ObliviousQuery {
    /// Returns an ORAM with an empty tree and position map.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` if `config` is invalid.
    pub fn new(config: OramConfig) -> Result<Self, OramError> {
        let components = OramComponents::new(&config)?;
        Self::from_components(config, components)
    }

    /// Returns an ORAM operating on existing `components`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` if `config` is invalid or does not describe the
    /// components' tree depth and round capacity.
    pub fn from_components(
        config: OramConfig,
        components: OramComponents,
    ) -> Result<Self, OramError> {
        config.validate()?;
        if components.tree.depth() != config.depth {
            return Err(OramError::invalid_configuration(
                "depth",
                components.tree.depth(),
            ));
        }
        if components.dr_log_set.capacity() != config.round_capacity
            || components.stash_set.len() != config.round_capacity
        {
            return Err(OramError::invalid_configuration(
                "round_capacity",
                components.dr_log_set.capacity(),
            ));
        }

        log::debug!(
            "ObliviousQuery::new -- (D = {}, c = {}, stash = {:?})",
            config.depth,
            config.round_capacity,
            config.stash_mode
        );

        Ok(Self {
            config,
            components,
            completions: Arc::new(RoundCompletions::new()),
        })
    }

    /// The configuration.
    pub fn config(&self) -> &OramConfig {
        &self.config
    }

    /// The shared components.
    pub fn components(&self) -> &OramComponents {
        &self.components
    }

    /// Stores `block` in the bucket of leaf `leaf` and maps the block to that leaf.
    pub fn place_block(&self, leaf: TreeIndex, block: Block) -> Result<(), OramError> {
        let node = TreeIndex::from_leaf(leaf, self.config.depth)?;
        let id = block.id();
        let is_dummy = block.is_dummy();
        self.components.tree.insert(node, block)?;
        if !is_dummy {
            self.components.position_map.update(id, leaf);
        }
        Ok(())
    }

    /// Obliviously reads the block with identifier `block_id`.
    ///
    /// Returns a dummy block if the block is unknown, or if its value was already handed out to
    /// an earlier request.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidLeafError` if the position map assigns the block to a leaf outside the
    /// tree. The request still counts towards its round.
    pub fn read<R: RngCore + CryptoRng>(
        &self,
        block_id: BlockId,
        rng: &mut R,
    ) -> Result<Block, OramError> {
        let registration = self.components.query_log.register(block_id);
        log::debug!(
            "ORAM read -- block {} (round {}, request {}, overlap = {})",
            block_id,
            registration.round,
            registration.sequence_id,
            registration.is_overlap
        );

        let response = if registration.is_overlap {
            self.read_overlapping(block_id, &registration, rng)
        } else {
            self.read_direct(block_id, &registration)
        };

        if let Err(error) = &response {
            log::debug!("ORAM read of block {} failed: {}", block_id, error);
        }

        self.respond(block_id, &registration, response.as_ref().ok(), rng);
        response
    }

    /// Archives the current round and starts a new one, for callers that close rounds
    /// themselves rather than waiting for `c` requests.
    pub fn end_round<R: RngCore + CryptoRng>(&self, rng: &mut R) {
        let dr_log_set = &self.components.dr_log_set;
        let closed_round = self.components.query_log.rotate(|round| {
            dr_log_set.finalize_round(rng);
            round
        });
        self.completions.retire_before(closed_round);
    }

    fn read_direct(
        &self,
        block_id: BlockId,
        registration: &Registration,
    ) -> Result<Block, OramError> {
        let Some(leaf) = self.components.position_map.lookup(block_id) else {
            log::trace!("Block {} is unmapped", block_id);
            return Ok(Block::dummy());
        };

        let path = self.components.tree.read_path(leaf)?;
        let stash = self.stash_for(registration)?;
        stash.add_path(path);
        Ok(stash.fetch(block_id))
    }

    fn read_overlapping<R: RngCore + CryptoRng>(
        &self,
        block_id: BlockId,
        registration: &Registration,
        rng: &mut R,
    ) -> Result<Block, OramError> {
        let decoy = random_leaf(self.config.depth, rng)?;
        log::debug!(
            "Overlapping request for block {} reads decoy leaf {}",
            block_id,
            decoy
        );
        let stash = self.stash_for(registration)?;
        stash.add_path(self.components.tree.read_path(decoy)?);

        if !self.completions.wait_for_block(
            registration.round,
            block_id,
            self.config.overlap_wait,
        ) {
            log::debug!(
                "Timed out waiting for the original request for block {} in round {}",
                block_id,
                registration.round
            );
        }

        if self.config.stash_mode == StashMode::PerClient {
            // Cover traffic over every client slot; the answer comes from the log set.
            self.components.stash_set.read_across_slots(
                block_id,
                self.slot(registration),
                rng,
            )?;
        }

        let responses = self.components.dr_log_set.read_log_set(block_id);
        Ok(responses
            .into_iter()
            .find(|block| block.has_id(block_id))
            .unwrap_or_default())
    }

    /// Records the outcome of a request, closing the round if the request is its last.
    /// `result` is `None` if the request failed.
    fn respond<R: RngCore + CryptoRng>(
        &self,
        block_id: BlockId,
        registration: &Registration,
        result: Option<&Block>,
        rng: &mut R,
    ) {
        let Registration {
            round,
            sequence_id,
            is_overlap,
        } = *registration;
        let round_capacity = self.config.round_capacity;
        let closes_round = sequence_id + 1 == round_capacity;
        let dr_log_set = &self.components.dr_log_set;

        let round_drained = closes_round
            && self
                .completions
                .wait_for_prefix(round, sequence_id, self.config.overlap_wait);
        if closes_round && !round_drained {
            log::debug!("Closing round {} before all its requests responded", round);
        }

        if closes_round {
            self.components
                .query_log
                .rotate_round(round, |request_count| match request_count {
                    Some(request_count) => {
                        match result {
                            Some(block) if !is_overlap => {
                                dr_log_set.write_log_set(block.clone(), sequence_id, rng);
                            }
                            _ => dr_log_set.finalize_round(rng),
                        }
                        // No request of the round can still be between loading a path and
                        // fetching from it, and no later round has registered yet.
                        if round_drained && request_count == round_capacity {
                            self.clear_stashes();
                        }
                    }
                    None => {
                        // The round was closed by `end_round`; the log set's current round now
                        // belongs to the next round, so the result is recorded without closing it.
                        log::debug!(
                            "Request {} responded after round {} closed",
                            sequence_id,
                            round
                        );
                        if let Some(block) = result.filter(|_| !is_overlap) {
                            dr_log_set.append_to_current_round(block.clone());
                        }
                    }
                });
            self.completions.retire_before(round);
        } else if let Some(block) = result.filter(|_| !is_overlap) {
            dr_log_set.write_log_set(block.clone(), sequence_id, rng);
        }

        if !is_overlap {
            self.completions.commit_block(round, block_id);
        }
        self.completions.finish_request(round, sequence_id);
    }

    fn clear_stashes(&self) {
        match self.config.stash_mode {
            StashMode::Shared => self.components.stash.clear(),
            StashMode::PerClient => self.components.stash_set.clear(),
        }
    }

    fn slot(&self, registration: &Registration) -> usize {
        registration.sequence_id % self.config.round_capacity
    }

    fn stash_for(&self, registration: &Registration) -> Result<&Stash, OramError> {
        match self.config.stash_mode {
            StashMode::Shared => Ok(self.components.stash.as_ref()),
            StashMode::PerClient => self.components.stash_set.slot(self.slot(registration)),
        }
    }
}
