// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! A concurrent Oblivious RAM access protocol.
//!
//! Blocks live in a complete binary tree of buckets, as in Path ORAM. Many client threads
//! may read from the tree at once through an [`ObliviousQuery`]. Requests are grouped into
//! rounds of `c` requests. Within a round, a request for a block that another request of the
//! same round already asked for (an *overlap*) does not touch the block's path again: it fetches
//! a random decoy path and collects its answer from the [`DRLogSet`], the deferred-response log
//! that accumulates each round's results and archives them, padded and shuffled, when the round
//! closes.
//!
//! Lookups that miss never fail. A request for an unknown block, a stash miss, or an archived
//! result that was already retrieved all yield a dummy [`Block`] that has the same shape as a
//! real result. Only malformed inputs (bad leaf, node or slot indices) and invalid
//! configurations are reported as [`OramError`]s.
//!
//! ## Example
//!
//! ```
//! use concurrent_oram::{Block, ObliviousQuery, OramConfig, OramError};
//! use rand::rngs::OsRng;
//!
//! # fn main() -> Result<(), OramError> {
//! let mut rng = OsRng;
//! let oram = ObliviousQuery::new(OramConfig::new(2, 2))?;
//! oram.place_block(1, Block::new(4, *b"hello"))?;
//!
//! let block = oram.read(4, &mut rng)?;
//! assert_eq!(block.payload(), b"hello");
//!
//! let missing = oram.read(99, &mut rng)?;
//! assert!(missing.is_dummy());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::doc_markdown, missing_docs, rustdoc::all)]

use std::num::TryFromIntError;
use thiserror::Error;

pub mod block;
pub mod bucket;
pub mod completion;
pub mod config;
pub mod dr_log_set;
pub mod oblivious_query;
pub mod position_map;
pub mod query_log;
pub mod stash;
pub mod stash_set;
pub mod tree;
pub mod tree_index;

#[cfg(test)]
mod test_utils;

pub use crate::block::Block;
pub use crate::bucket::Bucket;
pub use crate::config::{OramConfig, StashMode};
pub use crate::dr_log_set::DRLogSet;
pub use crate::oblivious_query::{ObliviousQuery, OramComponents};
pub use crate::position_map::PositionMap;
pub use crate::query_log::{QueryLog, Registration};
pub use crate::stash::Stash;
pub use crate::stash_set::StashSet;
pub use crate::tree::ObliviousTree;

/// The identifier of a block. Real blocks have non-negative ids; `-1` marks a dummy.
pub type BlockId = i64;
/// An index into the array layout of the tree. Also used for leaf (path) ids.
pub type TreeIndex = u64;
/// The depth of a tree: the number of edges between the root and any leaf.
pub type TreeHeight = u64;
/// Numeric type used to bound the number of blocks per bucket.
pub type BucketSize = usize;
/// The number of requests in a round, written `c`.
pub type RoundCapacity = usize;
/// The position of a request within its round.
pub type SequenceId = usize;
/// Counts rounds since construction.
pub type RoundId = u64;

/// The id carried by every dummy block.
pub const DUMMY_BLOCK_ID: BlockId = -1;

#[derive(Error, Debug)]
/// Errors that can be returned by the ORAM.
pub enum OramError {
    /// Errors arising from conversions between integer types.
    #[error("Arithmetic error encountered.")]
    IntegerConversionError(#[from] TryFromIntError),
    /// A leaf (path) id outside `[0, leaf_count)` was supplied.
    #[error("Leaf {leaf} is outside the range of leaves [0, {leaf_count}).")]
    InvalidLeafError {
        /// The offending leaf id.
        leaf: TreeIndex,
        /// The number of leaves in the tree.
        leaf_count: TreeIndex,
    },
    /// A node index outside the tree was supplied.
    #[error("Node {node} is outside the tree of {node_count} nodes.")]
    InvalidNodeError {
        /// The offending node index.
        node: TreeIndex,
        /// The number of nodes in the tree.
        node_count: TreeIndex,
    },
    /// A stash slot outside the stash set was supplied.
    #[error("Stash slot {slot} is outside the stash set of {slot_count} slots.")]
    InvalidSlotError {
        /// The offending slot.
        slot: usize,
        /// The number of slots.
        slot_count: usize,
    },
    /// A block was inserted into a bucket that is already full.
    #[error("The bucket at node {node} already holds {capacity} blocks.")]
    BucketOverflowError {
        /// The node whose bucket is full.
        node: TreeIndex,
        /// The configured bucket capacity.
        capacity: BucketSize,
    },
    /// The ORAM was configured with invalid parameters.
    #[error("Invalid configuration: {parameter_name} = {parameter_value}.")]
    InvalidConfigurationError {
        /// The name of the invalid parameter.
        parameter_name: String,
        /// The value supplied for it.
        parameter_value: String,
    },
}

impl OramError {
    pub(crate) fn invalid_configuration(
        parameter_name: &str,
        parameter_value: impl ToString,
    ) -> Self {
        OramError::InvalidConfigurationError {
            parameter_name: parameter_name.to_string(),
            parameter_value: parameter_value.to_string(),
        }
    }
}
