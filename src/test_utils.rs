// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Common test utilities.

use std::sync::Once;
use std::time::Duration;
static INIT: Once = Once::new();
use crate::tree_index::{leaf_count, CompleteBinaryTreeIndex};
use crate::{Block, BlockId, ObliviousQuery, ObliviousTree, OramConfig, StashMode, TreeHeight};
use simplelog::{Config, WriteLogger};

// For use in manual testing and inspection.
pub(crate) fn init_logger() {
    INIT.call_once(|| {
        WriteLogger::init(log::LevelFilter::Info, Config::default(), std::io::stdout()).unwrap()
    })
}

/// A block whose payload names its id.
pub(crate) fn numbered_block(id: BlockId) -> Block {
    Block::new(id, format!("block {id}"))
}

/// The blocks of the depth-2 scenario: block `3 + i` sits at leaf `i`.
pub(crate) fn scenario_block(id: BlockId) -> Block {
    match id {
        3 => Block::new(3, *b"leftmost block at depth 2"),
        4 => Block::new(4, *b"leftmost + 1 block at depth 2"),
        5 => Block::new(5, *b"d2 p2"),
        6 => Block::new(6, *b"d2 rightmost"),
        _ => Block::dummy(),
    }
}

/// Depth 2, two requests per round, and a completion wait long enough to never expire in tests.
pub(crate) fn scenario_config() -> OramConfig {
    OramConfig::new(2, 2).with_overlap_wait(Duration::from_secs(5))
}

/// Returns an ORAM for `config` holding the scenario blocks 3 through 6 at leaves 0 through 3.
pub(crate) fn populated_query(config: OramConfig) -> ObliviousQuery {
    let oram = ObliviousQuery::new(config).unwrap();
    for leaf in 0..4 {
        let id = 3 + BlockId::try_from(leaf).unwrap();
        oram.place_block(leaf, scenario_block(id)).unwrap();
    }
    oram
}

/// The depth-2 scenario with the given stash mode.
pub(crate) fn scenario_query(stash_mode: StashMode) -> ObliviousQuery {
    populated_query(scenario_config().with_stash_mode(stash_mode))
}

/// Checks that every path of a tree of height `depth` has `depth + 1` nodes, starts at the root,
/// ends at its leaf, and steps from parent to child.
pub(crate) fn check_path_correctness(depth: TreeHeight) {
    init_logger();
    let tree = ObliviousTree::new(depth).unwrap();
    let expected_length = usize::try_from(depth).unwrap() + 1;

    for leaf in 0..leaf_count(depth).unwrap() {
        let path = tree.path_indices(leaf).unwrap();
        assert_eq!(path.len(), expected_length);
        assert_eq!(path[0], 0);
        assert_eq!(*path.last().unwrap(), u64::from_leaf(leaf, depth).unwrap());
        for step in path.windows(2) {
            assert_eq!(step[1].parent(), Some(step[0]), "{leaf}: {path:?}");
        }
    }
}

macro_rules! create_path_correctness_tests {
    ($($depth: literal),+) => {
        $(
            paste::paste! {
                #[test]
                fn [<path_correctness_depth_ $depth>]() {
                    $crate::test_utils::check_path_correctness($depth);
                }
            }
        )+
    };
}

pub(crate) use create_path_correctness_tests;
