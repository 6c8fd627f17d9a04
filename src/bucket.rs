// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! A tree bucket.

use crate::{Block, BlockId};

#[derive(Clone, Default, PartialEq, Eq)]
/// The unordered sequence of blocks stored at one tree node.
pub struct Bucket {
    /// The blocks stored by this bucket.
    pub(crate) blocks: Vec<Block>,
}

impl Bucket {
    /// The blocks stored by this bucket, in insertion order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The number of blocks (real or dummy) in the bucket.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the bucket holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether the bucket holds a real block with identifier `id`.
    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.iter().any(|block| block.has_id(id))
    }
}

impl IntoIterator for Bucket {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.blocks.iter().all(Block::is_dummy) {
            write!(f, "Bucket::Dummy")
        } else {
            f.debug_struct("Bucket")
                .field("blocks", &self.blocks)
                .finish()
        }
    }
}
