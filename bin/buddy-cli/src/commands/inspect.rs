// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buddy inspect` command: print the level table for an arena layout.

use anyhow::Context;
use buddy_alloc::{format_size, parse_size, ArenaLayout};

pub fn execute(capacity: String, min_block: String) -> anyhow::Result<()> {
    let total = parse_size(&capacity).context("invalid --capacity")?;
    let min = parse_size(&min_block).context("invalid --min-block")?;
    let layout = ArenaLayout::new(total, min).context("invalid arena geometry")?;

    println!("  Arena: {layout}");
    println!();
    println!("  {:>5}  {:>12}  {:>8}", "Level", "Block size", "Blocks");
    for level in 0..layout.levels() {
        let size = layout.block_size(level);
        println!(
            "  {:>5}  {:>12}  {:>8}",
            level,
            format_size(size),
            layout.total_size() / size,
        );
    }
    Ok(())
}
