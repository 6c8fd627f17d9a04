// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! One stash per concurrent client slot.

use crate::{Block, BlockId, OramError, RoundCapacity, Stash};
use rand::{CryptoRng, RngCore};

/// A fixed number of independent [`Stash`]es, one per client slot of a round.
#[derive(Debug)]
pub struct StashSet {
    stashes: Vec<Stash>,
}

impl StashSet {
    /// Returns `slot_count` empty stashes.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` if `slot_count` is zero.
    pub fn new(slot_count: RoundCapacity) -> Result<Self, OramError> {
        if slot_count < 1 {
            return Err(OramError::invalid_configuration("round_capacity", slot_count));
        }
        Ok(Self {
            stashes: (0..slot_count).map(|_| Stash::new()).collect(),
        })
    }

    /// The number of slots.
    pub fn len(&self) -> usize {
        self.stashes.len()
    }

    /// Always `false`: a stash set has at least one slot.
    pub fn is_empty(&self) -> bool {
        self.stashes.is_empty()
    }

    /// The stash of slot `slot`.
    pub fn slot(&self, slot: usize) -> Result<&Stash, OramError> {
        self.stashes.get(slot).ok_or(OramError::InvalidSlotError {
            slot,
            slot_count: self.stashes.len(),
        })
    }

    /// Appends `block` to the stash of slot `slot`.
    pub fn add_to_slot(&self, slot: usize, block: Block) -> Result<(), OramError> {
        self.slot(slot)?.add(block);
        Ok(())
    }

    /// Returns one entry per slot, in slot order: the first slot holding a real block with
    /// identifier `id` contributes that block, every other slot contributes a dummy.
    /// Nothing is consumed. Afterwards the stash of `active_slot` is reshuffled.
    pub fn read_across_slots<R: RngCore + CryptoRng>(
        &self,
        id: BlockId,
        active_slot: usize,
        rng: &mut R,
    ) -> Result<Vec<Block>, OramError> {
        let active_stash = self.slot(active_slot)?;

        let mut found = false;
        let mut result = Vec::with_capacity(self.stashes.len());
        for stash in &self.stashes {
            let candidate = stash.all_blocks().into_iter().find(|block| block.has_id(id));
            match candidate {
                Some(block) if !found => {
                    found = true;
                    result.push(block);
                }
                _ => result.push(Block::dummy()),
            }
        }

        active_stash.reshuffle(rng);
        Ok(result)
    }

    /// Empties every slot.
    pub fn clear(&self) {
        for stash in &self.stashes {
            stash.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_logger;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn zero_slots_is_rejected() {
        init_logger();
        assert!(matches!(
            StashSet::new(0),
            Err(OramError::InvalidConfigurationError { .. })
        ));
    }

    #[test]
    fn only_the_first_holding_slot_yields_the_block() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(0);
        let stash_set = StashSet::new(4).unwrap();
        stash_set.add_to_slot(1, Block::new(9, *b"first")).unwrap();
        stash_set.add_to_slot(3, Block::new(9, *b"second")).unwrap();
        stash_set.add_to_slot(2, Block::new(8, *b"other")).unwrap();

        let result = stash_set.read_across_slots(9, 0, &mut rng).unwrap();
        assert_eq!(result.len(), 4);
        assert!(result[0].is_dummy());
        assert_eq!(result[1], Block::new(9, *b"first"));
        assert!(result[2].is_dummy());
        assert!(result[3].is_dummy());

        // Reading does not consume.
        assert!(stash_set.slot(1).unwrap().contains(9));
        assert!(stash_set.slot(3).unwrap().contains(9));
    }

    #[test]
    fn absent_block_yields_all_dummies() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(0);
        let stash_set = StashSet::new(3).unwrap();
        stash_set.add_to_slot(0, Block::new(1, *b"one")).unwrap();

        let result = stash_set.read_across_slots(2, 1, &mut rng).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(Block::is_dummy));
    }

    #[test]
    fn active_slot_is_reshuffled() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(1);
        let stash_set = StashSet::new(2).unwrap();
        for id in 0..32 {
            stash_set.add_to_slot(1, Block::new(id, *b"x")).unwrap();
            stash_set.add_to_slot(0, Block::new(id, *b"x")).unwrap();
        }
        let active_before = stash_set.slot(1).unwrap().all_blocks();
        let idle_before = stash_set.slot(0).unwrap().all_blocks();

        stash_set.read_across_slots(5, 1, &mut rng).unwrap();

        assert_ne!(stash_set.slot(1).unwrap().all_blocks(), active_before);
        assert_eq!(stash_set.slot(0).unwrap().all_blocks(), idle_before);
    }

    #[test]
    fn bad_slots_are_rejected() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(0);
        let stash_set = StashSet::new(2).unwrap();
        assert!(matches!(
            stash_set.add_to_slot(2, Block::new(1, *b"x")),
            Err(OramError::InvalidSlotError {
                slot: 2,
                slot_count: 2
            })
        ));
        assert!(stash_set.read_across_slots(1, 5, &mut rng).is_err());

        stash_set.add_to_slot(0, Block::new(1, *b"x")).unwrap();
        stash_set.clear();
        assert!(stash_set.slot(0).unwrap().is_empty());
    }
}
