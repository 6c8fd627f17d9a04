// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Two clients reading from a small tree at the same time.

use concurrent_oram::{Block, BlockId, ObliviousQuery, OramConfig, OramError};
use rand::rngs::OsRng;
use simplelog::{Config, LevelFilter, SimpleLogger};
use std::thread;
use std::time::Duration;

const DEPTH: u64 = 2;
const CLIENTS_PER_ROUND: usize = 2;

fn client(id: usize, block_id: BlockId, oram: ObliviousQuery) -> Result<(), OramError> {
    let result = oram.read(block_id, &mut OsRng)?;
    println!(
        "[Client {}] Fetched block: {:?} (dummy = {})",
        id,
        result,
        result.is_dummy()
    );
    Ok(())
}

fn print_tree(oram: &ObliviousQuery) -> Result<(), OramError> {
    println!();
    for (level, buckets) in oram.components().tree.levels()?.iter().enumerate() {
        let rendered: Vec<String> = buckets
            .iter()
            .map(|bucket| {
                let ids: Vec<String> = bucket.blocks().iter().map(|b| b.id().to_string()).collect();
                format!("[{}]", ids.join(" "))
            })
            .collect();
        println!("level {}: {}", level, rendered.join(" "));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::init(LevelFilter::Debug, Config::default())?;

    let oram = ObliviousQuery::new(OramConfig::new(DEPTH, CLIENTS_PER_ROUND))?;
    let tree = &oram.components().tree;
    let position_map = &oram.components().position_map;

    tree.insert(0, Block::new(0, *b"Block in root"))?;
    tree.insert(1, Block::new(1, *b"Block in leftmost leaf at depth 1"))?;
    tree.insert(2, Block::new(2, *b"Block in rightmost leaf at depth 1"))?;
    tree.insert(3, Block::new(3, *b"leftmost block at depth 2"))?;
    tree.insert(4, Block::new(4, *b"leftmost + 1 block at depth 2"))?;
    tree.insert(5, Block::new(5, *b"d2 p2"))?;
    tree.insert(6, Block::new(6, *b"d2 rightmost"))?;

    for (block_id, leaf) in [(3, 0), (4, 1), (5, 2), (6, 3)] {
        position_map.update(block_id, leaf);
    }

    let first = {
        let oram = oram.clone();
        thread::spawn(move || client(1, 6, oram))
    };
    thread::sleep(Duration::from_millis(10));
    let second = {
        let oram = oram.clone();
        thread::spawn(move || client(2, 3, oram))
    };

    first.join().map_err(|_| "client 1 panicked")??;
    second.join().map_err(|_| "client 2 panicked")??;

    oram.end_round(&mut OsRng);
    let dr_log_set = &oram.components().dr_log_set;
    for round in 0..dr_log_set.archived_round_count() {
        println!(
            "archived round {}: {} entries, retrievable {:?}",
            round,
            dr_log_set.archived_round(round).map_or(0, |entries| entries.len()),
            dr_log_set.search_index(round).unwrap_or_default()
        );
    }

    print_tree(&oram)?;
    Ok(())
}
