// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buddy-alloc
//!
//! A binary buddy-system allocator managing a single contiguous address
//! range `[0, total_size)`. Blocks come in power-of-two size classes
//! ("levels"); allocation splits larger blocks downward and deallocation
//! merges freed blocks with their buddies upward, so both operations are
//! O(log N) in the number of levels.
//!
//! # Key Components
//!
//! - [`ArenaLayout`] — the immutable geometry of the arena: total size,
//!   minimum block size, and the derived level count. Supports
//!   human-readable size parsing (`"64M"`, `"4G"`, etc.).
//! - [`BuddyAllocator`] — the allocator: per-level free sets, the
//!   address → size map of live allocations, and statistics.
//! - [`MemoryMap`] — a read-only, address-ordered snapshot of the whole
//!   range, for tests and diagnostics.
//! - [`AllocStats`] — cumulative allocator metrics (splits, merges, peak
//!   usage, OOM count).
//! - [`ArenaConfig`] — TOML-loadable configuration that builds an
//!   allocator from human-readable size strings.
//!
//! # Block Structure
//!
//! ```text
//! level 3          ┌───────────────── 1024 ─────────────────┐
//! level 2          ┌─────── 512 ───────┐┌─────── 512 ───────┐
//! level 1          ┌── 256 ──┐┌── 256 ──┐        ...
//! level 0          ┌128┐┌128┐   ...
//! ```
//!
//! Each block is aligned to its own size, so the buddy of a block at
//! `addr` on level `k` is always `addr ^ block_size(k)` — one XOR, no
//! searching.
//!
//! # Example
//! ```
//! use buddy_alloc::{ArenaLayout, BuddyAllocator};
//!
//! let layout = ArenaLayout::new(1024, 64).unwrap();
//! let mut arena = BuddyAllocator::new(layout);
//!
//! // Requests round up to the nearest size class.
//! let a = arena.allocate(200).unwrap();      // 256-byte block at 0
//! assert_eq!(a, 0);
//! assert_eq!(arena.allocated_bytes(), 256);
//!
//! // Freeing coalesces all the way back to one top-level block.
//! arena.deallocate(a).unwrap();
//! assert_eq!(arena.free_bytes(), 1024);
//! assert_eq!(arena.largest_free_block(), Some(1024));
//! ```
//!
//! # Concurrency
//!
//! The allocator is a plain value: `allocate` and `deallocate` take
//! `&mut self` and never suspend. Callers that need to share one arena
//! across threads wrap it in a `Mutex` so that a split or merge sequence
//! is never observed half-done.

mod allocator;
mod config;
mod error;
mod layout;
pub mod map;
mod stats;

pub use allocator::BuddyAllocator;
pub use config::ArenaConfig;
pub use error::BuddyError;
pub use layout::{format_size, parse_size, ArenaLayout};
pub use map::{BlockState, MapEntry, MemoryMap};
pub use stats::AllocStats;
