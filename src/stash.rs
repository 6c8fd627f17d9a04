// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The stash: blocks pulled off a path, awaiting retrieval.

use crate::{Block, BlockId, Bucket};
use parking_lot::RwLock;
use rand::{seq::SliceRandom, CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable};

#[derive(Debug, Default)]
/// An ordered multiset of blocks. Fetching a block by id consumes it; a miss yields a dummy.
pub struct Stash {
    blocks: RwLock<Vec<Block>>,
}

impl Stash {
    /// Returns an empty stash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `block` to the stash.
    pub fn add(&self, block: Block) {
        self.blocks.write().push(block);
    }

    /// Appends every block of every bucket in `path` to the stash, under one lock acquisition.
    pub fn add_path(&self, path: Vec<Bucket>) {
        let mut blocks = self.blocks.write();
        for bucket in path {
            blocks.extend(bucket);
        }
    }

    /// Removes and returns the first real block with identifier `id`, or returns a dummy if the
    /// stash holds no such block.
    pub fn fetch(&self, id: BlockId) -> Block {
        let mut blocks = self.blocks.write();

        // Every entry is compared, so the scan takes time independent of where (or whether)
        // the block is found.
        let mut found = Choice::from(0);
        let mut position = 0u64;
        for (i, block) in (0u64..).zip(blocks.iter()) {
            let is_first_match = block.ct_has_id(id) & !found;
            position.conditional_assign(&i, is_first_match);
            found |= is_first_match;
        }

        if !bool::from(found) {
            return Block::dummy();
        }

        // LEAK: removing the block shifts the remainder of the stash, which takes time
        // proportional to the distance of the block from the end.
        match usize::try_from(position) {
            Ok(position) => blocks.remove(position),
            Err(_) => Block::dummy(),
        }
    }

    /// Whether the stash holds a real block with identifier `id`.
    pub fn contains(&self, id: BlockId) -> bool {
        let mut found = Choice::from(0);
        for block in self.blocks.read().iter() {
            found |= block.ct_has_id(id);
        }
        found.into()
    }

    /// Returns a copy of the stash contents, in stash order.
    pub fn all_blocks(&self) -> Vec<Block> {
        self.blocks.read().clone()
    }

    /// Applies a uniformly random permutation to the stash order.
    pub fn reshuffle<R: RngCore + CryptoRng>(&self, rng: &mut R) {
        self.blocks.write().shuffle(rng);
    }

    /// Removes every block.
    pub fn clear(&self) {
        self.blocks.write().clear();
    }

    /// The number of blocks (real or dummy) in the stash.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Whether the stash is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_logger;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn fetch_consumes_at_most_once() {
        init_logger();
        let stash = Stash::new();
        stash.add(Block::new(6, *b"d2 rightmost"));

        let first = stash.fetch(6);
        assert_eq!(first, Block::new(6, *b"d2 rightmost"));

        let second = stash.fetch(6);
        assert!(second.is_dummy());
        assert!(stash.is_empty());
    }

    #[test]
    fn fetch_takes_the_first_copy() {
        init_logger();
        let stash = Stash::new();
        stash.add(Block::new(1, *b"first"));
        stash.add(Block::new(2, *b"other"));
        stash.add(Block::new(1, *b"second"));

        assert_eq!(stash.fetch(1).payload(), b"first");
        assert!(stash.contains(1));
        assert_eq!(stash.fetch(1).payload(), b"second");
        assert!(!stash.contains(1));
        assert_eq!(stash.len(), 1);
    }

    #[test]
    fn dummies_are_never_fetched() {
        init_logger();
        let stash = Stash::new();
        stash.add(Block::dummy());
        assert!(!stash.contains(crate::DUMMY_BLOCK_ID));
        assert!(stash.fetch(crate::DUMMY_BLOCK_ID).is_dummy());
        assert_eq!(stash.len(), 1);
    }

    #[test]
    fn add_path_flattens_buckets() {
        init_logger();
        let tree = crate::ObliviousTree::new(1).unwrap();
        tree.insert(0, Block::new(0, *b"root")).unwrap();
        tree.insert(1, Block::new(1, *b"left")).unwrap();

        let stash = Stash::new();
        stash.add_path(tree.read_path(0).unwrap());
        assert_eq!(stash.len(), 2);
        assert!(stash.contains(0));
        assert!(stash.contains(1));
    }

    #[test]
    fn reshuffle_permutes_without_losing_blocks() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(0);
        let stash = Stash::new();
        for id in 0..32 {
            stash.add(Block::new(id, id.to_le_bytes()));
        }
        let before = stash.all_blocks();

        stash.reshuffle(&mut rng);
        let after = stash.all_blocks();
        assert_ne!(before, after);

        let mut sorted: Vec<_> = after.iter().map(Block::id).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }
}
