// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Tree index arithmetic.
//!
//! Nodes are numbered in the 0-based array layout of a complete binary tree: the root is `0`
//! and the children of node `i` are `2i + 1` and `2i + 2`. A tree of height `h` has
//! `2^(h+1) - 1` nodes, and its `2^h` leaves occupy the last `2^h` indices.
//! Leaf (path) ids number the leaves left to right from `0`.

use crate::{OramError, TreeHeight, TreeIndex};
use rand::{CryptoRng, Rng, RngCore};

/// Array-layout arithmetic on the nodes of a complete binary tree.
pub trait CompleteBinaryTreeIndex
where
    Self: Sized,
{
    /// The parent of this node, or `None` for the root.
    fn parent(&self) -> Option<Self>;
    /// The node index of leaf `leaf` in a tree of height `height`.
    fn from_leaf(leaf: Self, height: TreeHeight) -> Result<Self, OramError>;
    /// The distance of this node from the root.
    fn depth(&self) -> TreeHeight;
    /// Whether this node is a leaf of a tree of height `height`.
    fn is_leaf(&self, height: TreeHeight) -> bool;
}

impl CompleteBinaryTreeIndex for TreeIndex {
    fn parent(&self) -> Option<Self> {
        match *self {
            0 => None,
            i => Some((i - 1) / 2),
        }
    }

    fn from_leaf(leaf: Self, height: TreeHeight) -> Result<Self, OramError> {
        let leaf_count = leaf_count(height)?;
        if leaf >= leaf_count {
            return Err(OramError::InvalidLeafError { leaf, leaf_count });
        }
        Ok(leaf_count - 1 + leaf)
    }

    fn depth(&self) -> TreeHeight {
        (self + 1).ilog2().into()
    }

    fn is_leaf(&self, height: TreeHeight) -> bool {
        self.depth() == height
    }
}

/// The number of leaves in a tree of height `height`.
pub fn leaf_count(height: TreeHeight) -> Result<TreeIndex, OramError> {
    Ok(2u64.pow(height.try_into()?))
}

/// The number of nodes in a tree of height `height`.
pub fn node_count(height: TreeHeight) -> Result<TreeIndex, OramError> {
    Ok(2 * leaf_count(height)? - 1)
}

/// Samples a leaf id uniformly from `[0, 2^height)`.
pub fn random_leaf<R: RngCore + CryptoRng>(
    height: TreeHeight,
    rng: &mut R,
) -> Result<TreeIndex, OramError> {
    Ok(rng.gen_range(0..leaf_count(height)?))
}
