// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Parameters of the ORAM.

use crate::{BucketSize, OramError, RoundCapacity, TreeHeight};
use std::time::Duration;

/// The default number of requests per round.
pub const DEFAULT_ROUND_CAPACITY: RoundCapacity = 2;

/// The default bound on how long a request waits for another request of its round.
pub const DEFAULT_OVERLAP_WAIT: Duration = Duration::from_millis(100);

/// The largest supported tree depth.
pub const MAXIMUM_TREE_DEPTH: TreeHeight = 24;

/// Where blocks fetched off a path are held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StashMode {
    /// One stash shared by every client.
    #[default]
    Shared,
    /// One stash per client slot of a round; request `i` of a round uses slot `i mod c`.
    PerClient,
}

/// The parameters of an [`ObliviousQuery`](crate::ObliviousQuery).
///
/// ## Parameters
///
/// - `depth`: the tree height. The tree has `2^depth` leaves and `2^(depth+1) - 1` nodes.
///     Must be between 1 and [`MAXIMUM_TREE_DEPTH`].
/// - `round_capacity` (`c`): the number of requests per round, and the number of dummies
///     each archived round is padded with. Must be at least 1.
/// - `overlap_wait`: the longest a request waits for another request of its round to commit.
///     The wait normally ends as soon as the other request signals; the bound only matters
///     under heavy load.
/// - `bucket_capacity`: optional bound on the number of blocks per bucket. Unbounded by default.
/// - `stash_mode`: see [`StashMode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OramConfig {
    /// The tree height.
    pub depth: TreeHeight,
    /// The number of requests per round.
    pub round_capacity: RoundCapacity,
    /// The bound on completion waits.
    pub overlap_wait: Duration,
    /// The optional bound on blocks per bucket.
    pub bucket_capacity: Option<BucketSize>,
    /// Where fetched paths are held.
    pub stash_mode: StashMode,
}

impl OramConfig {
    /// Returns a configuration with the given depth and round capacity and default values
    /// for everything else.
    pub fn new(depth: TreeHeight, round_capacity: RoundCapacity) -> Self {
        Self {
            depth,
            round_capacity,
            overlap_wait: DEFAULT_OVERLAP_WAIT,
            bucket_capacity: None,
            stash_mode: StashMode::default(),
        }
    }

    /// Sets the number of requests per round.
    pub fn with_round_capacity(mut self, round_capacity: RoundCapacity) -> Self {
        self.round_capacity = round_capacity;
        self
    }

    /// Sets the bound on completion waits.
    pub fn with_overlap_wait(mut self, overlap_wait: Duration) -> Self {
        self.overlap_wait = overlap_wait;
        self
    }

    /// Bounds the number of blocks per bucket.
    pub fn with_bucket_capacity(mut self, bucket_capacity: BucketSize) -> Self {
        self.bucket_capacity = Some(bucket_capacity);
        self
    }

    /// Sets where fetched paths are held.
    pub fn with_stash_mode(mut self, stash_mode: StashMode) -> Self {
        self.stash_mode = stash_mode;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfigurationError` naming the first invalid parameter.
    pub fn validate(&self) -> Result<(), OramError> {
        if !(1..=MAXIMUM_TREE_DEPTH).contains(&self.depth) {
            return Err(OramError::invalid_configuration("depth", self.depth));
        }
        if self.round_capacity < 1 {
            return Err(OramError::invalid_configuration(
                "round_capacity",
                self.round_capacity,
            ));
        }
        if self.bucket_capacity == Some(0) {
            return Err(OramError::invalid_configuration("bucket_capacity", 0));
        }
        Ok(())
    }
}

impl Default for OramConfig {
    fn default() -> Self {
        Self::new(2, DEFAULT_ROUND_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = OramConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stash_mode, StashMode::Shared);
        assert_eq!(config.overlap_wait, DEFAULT_OVERLAP_WAIT);
    }

    #[test]
    fn invalid_parameters_are_named() {
        let cases = [
            (OramConfig::new(0, 2), "depth"),
            (OramConfig::new(MAXIMUM_TREE_DEPTH + 1, 2), "depth"),
            (OramConfig::new(2, 0), "round_capacity"),
            (OramConfig::new(2, 2).with_bucket_capacity(0), "bucket_capacity"),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(OramError::InvalidConfigurationError { parameter_name, .. }) => {
                    assert_eq!(parameter_name, expected)
                }
                other => panic!("{config:?} validated as {other:?}"),
            }
        }
    }
}
