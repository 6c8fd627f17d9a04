// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The bucket tree held by the server.

use crate::{
    config::MAXIMUM_TREE_DEPTH,
    tree_index::{leaf_count, node_count, CompleteBinaryTreeIndex},
    Block, Bucket, BucketSize, OramError, TreeHeight, TreeIndex,
};
use parking_lot::RwLock;

/// A complete binary tree of fixed `depth` whose nodes each hold a [`Bucket`].
///
/// Buckets are allocated empty at construction and only grow. Reads share the tree;
/// an insert excludes every other access to the tree.
#[derive(Debug)]
pub struct ObliviousTree {
    buckets: RwLock<Vec<Bucket>>,
    depth: TreeHeight,
    bucket_capacity: Option<BucketSize>,
}

impl ObliviousTree {
    /// Returns a tree of height `depth` with empty, unbounded buckets.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` unless `1 <= depth <= MAXIMUM_TREE_DEPTH`.
    pub fn new(depth: TreeHeight) -> Result<Self, OramError> {
        Self::with_bucket_capacity(depth, None)
    }

    /// Returns a tree of height `depth` whose buckets hold at most `bucket_capacity` blocks.
    pub fn with_bucket_capacity(
        depth: TreeHeight,
        bucket_capacity: Option<BucketSize>,
    ) -> Result<Self, OramError> {
        if !(1..=MAXIMUM_TREE_DEPTH).contains(&depth) {
            return Err(OramError::invalid_configuration("depth", depth));
        }
        if bucket_capacity == Some(0) {
            return Err(OramError::invalid_configuration("bucket_capacity", 0));
        }

        let number_of_nodes = usize::try_from(node_count(depth)?)?;
        log::debug!(
            "ObliviousTree::new -- (D = {}, nodes = {}, Z = {:?})",
            depth,
            number_of_nodes,
            bucket_capacity
        );

        Ok(Self {
            buckets: RwLock::new(vec![Bucket::default(); number_of_nodes]),
            depth,
            bucket_capacity,
        })
    }

    /// The height of the tree.
    pub fn depth(&self) -> TreeHeight {
        self.depth
    }

    /// The number of leaves, `2^depth`.
    pub fn leaf_count(&self) -> Result<TreeIndex, OramError> {
        leaf_count(self.depth)
    }

    /// The number of nodes, `2^(depth + 1) - 1`.
    pub fn node_count(&self) -> Result<TreeIndex, OramError> {
        node_count(self.depth)
    }

    /// Appends `block` to the bucket at `node`.
    pub fn insert(&self, node: TreeIndex, block: Block) -> Result<(), OramError> {
        let node_count = self.node_count()?;
        if node >= node_count {
            return Err(OramError::InvalidNodeError { node, node_count });
        }

        let mut buckets = self.buckets.write();
        let bucket = &mut buckets[usize::try_from(node)?];
        if let Some(capacity) = self.bucket_capacity {
            if bucket.len() >= capacity {
                return Err(OramError::BucketOverflowError { node, capacity });
            }
        }
        bucket.blocks.push(block);
        Ok(())
    }

    /// Returns the node indices on the path from the root to leaf `leaf`, root first.
    pub fn path_indices(&self, leaf: TreeIndex) -> Result<Vec<TreeIndex>, OramError> {
        let mut node = TreeIndex::from_leaf(leaf, self.depth)?;
        let mut path = Vec::with_capacity(usize::try_from(self.depth)? + 1);
        path.push(node);
        while let Some(parent) = node.parent() {
            path.push(parent);
            node = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Returns a copy of the bucket at `node`.
    pub fn node(&self, node: TreeIndex) -> Result<Bucket, OramError> {
        let node_count = self.node_count()?;
        if node >= node_count {
            return Err(OramError::InvalidNodeError { node, node_count });
        }
        Ok(self.buckets.read()[usize::try_from(node)?].clone())
    }

    /// Returns copies of the buckets on the path to leaf `leaf`, root first, read under a single
    /// lock acquisition.
    pub fn read_path(&self, leaf: TreeIndex) -> Result<Vec<Bucket>, OramError> {
        let path = self.path_indices(leaf)?;
        log::trace!("Path read -- leaf {} (nodes {:?})", leaf, path);

        let buckets = self.buckets.read();
        path.into_iter()
            .map(|node| -> Result<Bucket, OramError> {
                Ok(buckets[usize::try_from(node)?].clone())
            })
            .collect()
    }

    /// Returns copies of every bucket, level by level from the root.
    pub fn levels(&self) -> Result<Vec<Vec<Bucket>>, OramError> {
        let buckets = self.buckets.read();
        let mut levels = Vec::with_capacity(usize::try_from(self.depth)? + 1);
        let mut start = 0usize;
        for level in 0..=self.depth {
            let width = usize::try_from(leaf_count(level)?)?;
            levels.push(buckets[start..start + width].to_vec());
            start += width;
        }
        Ok(levels)
    }
}
