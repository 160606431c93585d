// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The binary buddy allocator.
//!
//! State is pure bookkeeping over an abstract address range:
//!
//! 1. One ordered set of free-block start addresses per level — the sole
//!    source of truth for "this address is free at this size".
//! 2. An ordered map of live allocations (address → size) — the sole
//!    source of truth for "this address is owned by a caller", which is
//!    why deallocation needs only the address.
//!
//! Between any two public calls the free sets and the allocated map
//! tile `[0, total_size)` exactly: no overlaps, no gaps, every block
//! aligned to its own size. That alignment is what makes
//! `addr ^ block_size(level)` the buddy's address.

use crate::map::{BlockState, MapEntry, MemoryMap};
use crate::{AllocStats, ArenaLayout, BuddyError};
use std::collections::{BTreeMap, BTreeSet};

/// A buddy-system allocator over `[0, total_size)`.
///
/// # Example
/// ```
/// use buddy_alloc::{ArenaLayout, BuddyAllocator, BuddyError};
///
/// let layout = ArenaLayout::new(1024, 128).unwrap();
/// let mut arena = BuddyAllocator::new(layout);
///
/// let a = arena.allocate(128).unwrap();
/// let b = arena.allocate(128).unwrap();
/// assert_eq!((a, b), (0, 128));
///
/// // a and b are buddies: freeing both coalesces them into one
/// // 256-byte block.
/// arena.deallocate(a).unwrap();
/// arena.deallocate(b).unwrap();
/// assert_eq!(arena.free_bytes(), 1024);
///
/// // Freeing twice is an error and changes nothing.
/// assert!(matches!(
///     arena.deallocate(a),
///     Err(BuddyError::InvalidAddress { .. })
/// ));
/// ```
pub struct BuddyAllocator {
    layout: ArenaLayout,
    /// Free-block start addresses, one set per level. Ordered so that
    /// allocation can deterministically take the smallest address.
    free_blocks: Vec<BTreeSet<u64>>,
    /// Live allocations: start address → block size.
    allocated: BTreeMap<u64, u64>,
    /// Running sum of live allocation sizes.
    allocated_bytes: u64,
    stats: AllocStats,
}

impl BuddyAllocator {
    /// Creates an allocator with the whole arena as one free block at
    /// the top level.
    pub fn new(layout: ArenaLayout) -> Self {
        let mut free_blocks = vec![BTreeSet::new(); layout.levels()];
        free_blocks[layout.levels() - 1].insert(0);
        Self {
            layout,
            free_blocks,
            allocated: BTreeMap::new(),
            allocated_bytes: 0,
            stats: AllocStats::default(),
        }
    }

    /// Allocates a block of at least `size` bytes, returning its start
    /// address. The block handed out is the request rounded up to the
    /// nearest size class (never smaller than the minimum block).
    ///
    /// The search takes the first non-empty level at or above the
    /// request's size class and removes that level's *smallest* address;
    /// the survivor of each split is always the lower half. This policy
    /// is deterministic: a fresh arena serves requests at ascending
    /// addresses.
    ///
    /// # Errors
    /// - [`BuddyError::InvalidSize`] for a zero-byte request.
    /// - [`BuddyError::OutOfMemory`] when no free block at any level is
    ///   large enough. The arena is left unchanged.
    pub fn allocate(&mut self, size: u64) -> Result<u64, BuddyError> {
        if size == 0 {
            return Err(BuddyError::InvalidSize);
        }

        let level = self.layout.level_for(size);

        // Smallest suitable block: first non-empty level at or above the
        // target, smallest address within it.
        let found = (level..self.layout.levels())
            .find_map(|l| self.free_blocks[l].first().copied().map(|addr| (l, addr)));

        let (mut current, addr) = match found {
            Some(f) => f,
            None => {
                self.stats.record_oom();
                let block_size = self
                    .layout
                    .min_block()
                    .checked_shl(level as u32)
                    .unwrap_or(u64::MAX);
                let largest_free = self.largest_free_block().unwrap_or(0);
                tracing::warn!(
                    requested = size,
                    block_size,
                    largest_free,
                    "allocation failed: out of memory"
                );
                return Err(BuddyError::OutOfMemory {
                    requested: size,
                    block_size,
                    largest_free,
                });
            }
        };

        self.free_blocks[current].remove(&addr);

        // Split downward until the block matches the request's size
        // class. The upper half goes back on the free list; the lower
        // half keeps the address and descends.
        while current > level {
            current -= 1;
            let upper = addr + self.layout.block_size(current);
            debug_assert_eq!(upper % self.layout.block_size(current), 0);
            self.free_blocks[current].insert(upper);
            self.stats.record_split();
            tracing::trace!(addr, upper, level = current, "split block");
        }

        let block = self.layout.block_size(level);
        debug_assert_eq!(addr % block, 0, "block not aligned to its own size");
        self.allocated.insert(addr, block);
        self.allocated_bytes += block;
        self.stats.record_allocation(block);
        self.stats.update_peak(self.allocated_bytes);
        tracing::debug!(addr, size = block, "allocated");
        Ok(addr)
    }

    /// Frees the block starting at `addr`, coalescing it with free
    /// buddies as far up the hierarchy as possible. The merged block
    /// always starts at the lower of the two buddy addresses.
    ///
    /// # Errors
    /// [`BuddyError::InvalidAddress`] when `addr` is not the start of a
    /// live allocation (unknown address or double free). The arena is
    /// left unchanged.
    pub fn deallocate(&mut self, addr: u64) -> Result<(), BuddyError> {
        let size = match self.allocated.remove(&addr) {
            Some(s) => s,
            None => {
                self.stats.record_invalid_free();
                tracing::debug!(addr, "rejected free of unknown address");
                return Err(BuddyError::InvalidAddress { addr });
            }
        };
        self.allocated_bytes -= size;

        let mut level = self.layout.level_for(size);
        let mut current = addr;

        // Greedy upward coalescing: a block has exactly one buddy per
        // level, and merging is safe exactly when that buddy is free.
        while level < self.layout.levels() - 1 {
            let buddy = current ^ self.layout.block_size(level);
            if !self.free_blocks[level].remove(&buddy) {
                break;
            }
            self.stats.record_merge();
            tracing::trace!(block = current, buddy, level, "merged with buddy");
            current = current.min(buddy);
            level += 1;
        }

        debug_assert_eq!(current % self.layout.block_size(level), 0);
        self.free_blocks[level].insert(current);
        self.stats.record_deallocation();
        tracing::debug!(addr, size, "deallocated");
        Ok(())
    }

    /// Takes an address-ordered snapshot of every block in the arena.
    ///
    /// Read-only: repeated calls without intervening `allocate` or
    /// `deallocate` return identical maps.
    pub fn memory_map(&self) -> MemoryMap {
        let free_count: usize = self.free_blocks.iter().map(BTreeSet::len).sum();
        let mut entries = Vec::with_capacity(self.allocated.len() + free_count);

        for (&addr, &size) in &self.allocated {
            entries.push(MapEntry {
                addr,
                size,
                state: BlockState::Allocated,
                level: self.layout.level_for(size),
            });
        }
        for (level, set) in self.free_blocks.iter().enumerate() {
            let size = self.layout.block_size(level);
            for &addr in set {
                entries.push(MapEntry {
                    addr,
                    size,
                    state: BlockState::Free,
                    level,
                });
            }
        }

        MemoryMap::new(self.layout.total_size(), entries)
    }

    /// The arena geometry.
    pub fn layout(&self) -> ArenaLayout {
        self.layout
    }

    /// Bytes currently handed out.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }

    /// Bytes currently free (across all levels).
    pub fn free_bytes(&self) -> u64 {
        self.layout.total_size() - self.allocated_bytes
    }

    /// Number of live allocations.
    pub fn live_allocations(&self) -> usize {
        self.allocated.len()
    }

    /// Size of the largest currently-free block, or `None` when the
    /// arena is fully allocated.
    pub fn largest_free_block(&self) -> Option<u64> {
        (0..self.layout.levels())
            .rev()
            .find(|&l| !self.free_blocks[l].is_empty())
            .map(|l| self.layout.block_size(l))
    }

    /// A snapshot of cumulative allocator statistics.
    pub fn stats(&self) -> AllocStats {
        self.stats.clone()
    }
}

impl std::fmt::Debug for BuddyAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuddyAllocator")
            .field("layout", &self.layout)
            .field("allocated_bytes", &self.allocated_bytes)
            .field("free_bytes", &self.free_bytes())
            .field("live_allocations", &self.allocated.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(total: u64, min: u64) -> BuddyAllocator {
        BuddyAllocator::new(ArenaLayout::new(total, min).unwrap())
    }

    #[test]
    fn test_fresh_arena_is_one_free_block() {
        let a = arena(1024, 64);
        let map = a.memory_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].addr, 0);
        assert_eq!(map.entries()[0].size, 1024);
        assert_eq!(map.entries()[0].state, BlockState::Free);
        assert_eq!(map.entries()[0].level, 4);
    }

    #[test]
    fn test_allocate_splits_top_block() {
        let mut a = arena(1024, 64);
        let addr = a.allocate(64).unwrap();
        assert_eq!(addr, 0);
        // Splitting 1024 down to 64 leaves 512, 256, 128, 64 free.
        assert_eq!(a.free_bytes(), 960);
        assert_eq!(a.stats().splits, 4);
        assert_eq!(a.memory_map().len(), 5);
    }

    #[test]
    fn test_ascending_addresses_from_fresh_arena() {
        let mut a = arena(1024, 64);
        assert_eq!(a.allocate(64).unwrap(), 0);
        assert_eq!(a.allocate(64).unwrap(), 64);
        assert_eq!(a.allocate(64).unwrap(), 128);
    }

    #[test]
    fn test_request_rounds_up_to_size_class() {
        let mut a = arena(1024, 64);
        let addr = a.allocate(100).unwrap(); // rounds to 128
        assert_eq!(a.allocated_bytes(), 128);
        a.deallocate(addr).unwrap();
        assert_eq!(a.allocated_bytes(), 0);
    }

    #[test]
    fn test_small_request_rounds_to_min_block() {
        let mut a = arena(1024, 64);
        a.allocate(1).unwrap();
        assert_eq!(a.allocated_bytes(), 64);
    }

    #[test]
    fn test_zero_request_rejected() {
        let mut a = arena(1024, 64);
        assert!(matches!(a.allocate(0), Err(BuddyError::InvalidSize)));
        assert_eq!(a.free_bytes(), 1024);
    }

    #[test]
    fn test_oversized_request_is_oom() {
        let mut a = arena(1024, 64);
        let err = a.allocate(2048).unwrap_err();
        match err {
            BuddyError::OutOfMemory {
                requested,
                largest_free,
                ..
            } => {
                assert_eq!(requested, 2048);
                assert_eq!(largest_free, 1024);
            }
            other => panic!("expected OutOfMemory, got {other:?}"),
        }
        // No state change.
        assert_eq!(a.free_bytes(), 1024);
        assert_eq!(a.stats().oom_count, 1);
    }

    #[test]
    fn test_huge_request_is_oom_not_panic() {
        // A 1-byte minimum block makes the size-class rounding as large
        // as it can get; u64::MAX must still come back as a clean OOM.
        let mut a = arena(1024, 1);
        assert!(matches!(
            a.allocate(u64::MAX),
            Err(BuddyError::OutOfMemory { .. })
        ));
        assert_eq!(a.free_bytes(), 1024);
        assert_eq!(a.stats().oom_count, 1);
    }

    #[test]
    fn test_deallocate_merges_back_to_top() {
        let mut a = arena(1024, 64);
        let addr = a.allocate(64).unwrap();
        a.deallocate(addr).unwrap();
        assert_eq!(a.largest_free_block(), Some(1024));
        assert_eq!(a.stats().merges, 4);
    }

    #[test]
    fn test_double_free_rejected_without_state_change() {
        let mut a = arena(1024, 64);
        let addr = a.allocate(64).unwrap();
        a.deallocate(addr).unwrap();
        let before = a.memory_map();
        assert!(matches!(
            a.deallocate(addr),
            Err(BuddyError::InvalidAddress { .. })
        ));
        assert_eq!(a.memory_map(), before);
        assert_eq!(a.stats().invalid_free_count, 1);
    }

    #[test]
    fn test_unknown_address_rejected() {
        let mut a = arena(1024, 64);
        let _keep = a.allocate(64).unwrap();
        assert!(matches!(
            a.deallocate(777),
            Err(BuddyError::InvalidAddress { addr: 777 })
        ));
        assert_eq!(a.allocated_bytes(), 64);
    }

    #[test]
    fn test_merge_blocked_by_allocated_buddy() {
        let mut a = arena(1024, 64);
        let x = a.allocate(64).unwrap(); // 0
        let y = a.allocate(64).unwrap(); // 64, buddy of x
        a.deallocate(x).unwrap();
        // y is still live, so x cannot merge upward.
        assert_eq!(a.largest_free_block(), Some(512));
        assert_eq!(a.stats().merges, 0);
        a.deallocate(y).unwrap();
        assert_eq!(a.largest_free_block(), Some(1024));
    }

    #[test]
    fn test_largest_free_none_when_full() {
        let mut a = arena(1024, 64);
        a.allocate(1024).unwrap();
        assert_eq!(a.largest_free_block(), None);
        assert_eq!(a.free_bytes(), 0);
    }

    #[test]
    fn test_single_level_arena() {
        let mut a = arena(64, 64);
        let addr = a.allocate(64).unwrap();
        assert_eq!(addr, 0);
        assert!(a.allocate(1).is_err());
        a.deallocate(addr).unwrap();
        assert_eq!(a.free_bytes(), 64);
    }

    #[test]
    fn test_stats_peak() {
        let mut a = arena(1024, 64);
        let x = a.allocate(256).unwrap();
        let y = a.allocate(256).unwrap();
        a.deallocate(x).unwrap();
        a.deallocate(y).unwrap();
        assert_eq!(a.stats().peak_allocated_bytes, 512);
        assert_eq!(a.stats().cumulative_allocated_bytes, 512);
    }

    #[test]
    fn test_debug_format() {
        let a = arena(1024, 64);
        let s = format!("{a:?}");
        assert!(s.contains("BuddyAllocator"));
        assert!(s.contains("free_bytes"));
    }
}
