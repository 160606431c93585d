// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buddy replay` command: execute a TOML trace of tagged operations.
//!
//! # Trace Format
//! ```toml
//! capacity = "1G"
//! min_block = "64M"
//!
//! [[ops]]
//! op = "alloc"
//! size = "256M"
//! tag = "tile1"
//!
//! [[ops]]
//! op = "free"
//! tag = "tile1"
//! ```
//!
//! Tags name allocations so later `free` ops can refer to them; the
//! addresses themselves are chosen by the allocator. Failed operations
//! (OOM, unknown tag) are reported and the replay continues, mirroring
//! how the allocator itself treats errors as local and recoverable.
//! With `--json` the final report carries the layout, the memory map,
//! and the stats as one JSON object.

use anyhow::Context;
use buddy_alloc::{parse_size, ArenaLayout, BuddyAllocator};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, serde::Deserialize)]
struct Trace {
    capacity: String,
    min_block: String,
    #[serde(default)]
    ops: Vec<TraceOp>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum TraceOp {
    Alloc { size: String, tag: String },
    Free { tag: String },
}

pub fn execute(trace_path: PathBuf, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&trace_path)
        .with_context(|| format!("cannot read trace '{}'", trace_path.display()))?;
    let trace: Trace = toml::from_str(&content)
        .with_context(|| format!("cannot parse trace '{}'", trace_path.display()))?;

    let total = parse_size(&trace.capacity).context("invalid capacity in trace")?;
    let min = parse_size(&trace.min_block).context("invalid min_block in trace")?;
    let layout = ArenaLayout::new(total, min).context("invalid arena geometry in trace")?;

    let mut arena = BuddyAllocator::new(layout);
    let mut tags: HashMap<String, u64> = HashMap::new();
    let mut failures = 0usize;

    for (step, op) in trace.ops.iter().enumerate() {
        match op {
            TraceOp::Alloc { size, tag } => {
                let bytes = parse_size(size)
                    .with_context(|| format!("bad size in op {step} ('{tag}')"))?;
                match arena.allocate(bytes) {
                    Ok(addr) => {
                        tags.insert(tag.clone(), addr);
                        println!("  [{step}] alloc {size} '{tag}' -> {addr}");
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!("op {step}: alloc '{tag}' failed: {e}");
                        println!("  [{step}] alloc {size} '{tag}' FAILED: {e}");
                    }
                }
            }
            TraceOp::Free { tag } => match tags.remove(tag.as_str()) {
                Some(addr) => match arena.deallocate(addr) {
                    Ok(()) => println!("  [{step}] free '{tag}' ({addr})"),
                    Err(e) => {
                        failures += 1;
                        tracing::warn!("op {step}: free '{tag}' failed: {e}");
                        println!("  [{step}] free '{tag}' FAILED: {e}");
                    }
                },
                None => {
                    failures += 1;
                    tracing::warn!("op {step}: unknown tag '{tag}'");
                    println!("  [{step}] free '{tag}' FAILED: unknown tag");
                }
            },
        }
    }

    println!();
    if json {
        let report = serde_json::json!({
            "layout": arena.layout(),
            "map": arena.memory_map(),
            "stats": arena.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", arena.memory_map());
    }
    println!("  Stats: {}", arena.stats().summary());
    if failures > 0 {
        println!("  {failures} operation(s) failed");
    }
    Ok(())
}
