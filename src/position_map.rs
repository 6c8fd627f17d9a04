// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The position map.

use crate::{BlockId, TreeIndex};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Maps each block id to the leaf whose path currently holds the block.
#[derive(Debug, Default)]
pub struct PositionMap {
    positions: RwLock<HashMap<BlockId, TreeIndex>>,
}

impl PositionMap {
    /// Returns an empty position map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `block_id` to `leaf`, overwriting any previous assignment.
    pub fn update(&self, block_id: BlockId, leaf: TreeIndex) {
        log::trace!("Position update -- block {} -> leaf {}", block_id, leaf);
        self.positions.write().insert(block_id, leaf);
    }

    /// The leaf assigned to `block_id`, if any.
    pub fn lookup(&self, block_id: BlockId) -> Option<TreeIndex> {
        self.positions.read().get(&block_id).copied()
    }

    /// The number of assigned blocks.
    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    /// Whether no block is assigned.
    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }
}
