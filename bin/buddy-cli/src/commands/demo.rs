// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buddy demo` command: a scripted allocate/free sequence with the
//! memory map printed between steps.
//!
//! Sizes are expressed as multiples of the minimum block so the script
//! works for any layout: a 2x, a 4x, and an 8x allocation, then the 4x
//! block is freed and a 6x request lands in the hole it leaves behind
//! (rounded up to 8x).

use anyhow::Context;
use buddy_alloc::{format_size, parse_size, ArenaLayout, BuddyAllocator};

pub fn execute(capacity: String, min_block: String) -> anyhow::Result<()> {
    let total = parse_size(&capacity).context("invalid --capacity")?;
    let min = parse_size(&min_block).context("invalid --min-block")?;
    let layout = ArenaLayout::new(total, min).context("invalid arena geometry")?;

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              buddy · Allocation Demo                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Arena: {layout}");
    println!();

    let mut arena = BuddyAllocator::new(layout);

    let tile1 = arena
        .allocate(2 * min)
        .context("tile1 allocation failed")?;
    let tile2 = arena
        .allocate(4 * min)
        .context("tile2 allocation failed")?;
    let buffer = arena
        .allocate(8 * min)
        .context("buffer allocation failed")?;
    println!(
        "  Allocated tile1 ({}) at {tile1}, tile2 ({}) at {tile2}, buffer ({}) at {buffer}",
        format_size(2 * min),
        format_size(4 * min),
        format_size(8 * min),
    );
    println!();
    println!("{}", arena.memory_map());

    println!("  Freeing tile2...");
    arena.deallocate(tile2)?;
    println!();
    println!("{}", arena.memory_map());

    let tile3 = arena
        .allocate(6 * min)
        .context("tile3 allocation failed")?;
    println!(
        "  Allocated tile3 ({} requested, {} handed out) at {tile3}",
        format_size(6 * min),
        format_size(8 * min),
    );
    println!();
    println!("{}", arena.memory_map());

    println!("  Stats: {}", arena.stats().summary());
    Ok(())
}
