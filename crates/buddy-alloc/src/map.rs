// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Read-only memory-map introspection.
//!
//! A [`MemoryMap`] is an address-ordered snapshot of every block in the
//! arena, free and allocated, covering `[0, total_size)` with no gaps.
//! Taking a snapshot never mutates allocator state, and repeated
//! snapshots without intervening mutation are identical.

use crate::layout::format_size;
use std::fmt;

/// Whether a block is currently handed out or available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockState {
    Allocated,
    Free,
}

/// One block in the memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MapEntry {
    /// Start address of the block.
    pub addr: u64,
    /// Block size in bytes (always a whole size class).
    pub size: u64,
    pub state: BlockState,
    /// Size class: block size is `min_block << level`.
    pub level: usize,
}

impl MapEntry {
    /// Exclusive end address of the block.
    pub fn end(&self) -> u64 {
        self.addr + self.size
    }
}

/// An address-ordered snapshot of the whole arena.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemoryMap {
    total_size: u64,
    entries: Vec<MapEntry>,
}

impl MemoryMap {
    pub(crate) fn new(total_size: u64, mut entries: Vec<MapEntry>) -> Self {
        entries.sort_by_key(|e| e.addr);
        Self {
            total_size,
            entries,
        }
    }

    /// The blocks, in ascending address order.
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MapEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of the mapped arena in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Sum of all free block sizes.
    pub fn free_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.state == BlockState::Free)
            .map(|e| e.size)
            .sum()
    }

    /// Sum of all allocated block sizes.
    pub fn allocated_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.state == BlockState::Allocated)
            .map(|e| e.size)
            .sum()
    }

    /// True when the entries tile `[0, total_size)` exactly: first block
    /// at 0, each block starting where the previous one ends, last block
    /// ending at `total_size`. Gaps and overlaps both fail this.
    pub fn is_contiguous(&self) -> bool {
        let mut cursor = 0;
        for e in &self.entries {
            if e.addr != cursor {
                return false;
            }
            cursor = e.end();
        }
        cursor == self.total_size
    }
}

impl<'a> IntoIterator for &'a MemoryMap {
    type Item = &'a MapEntry;
    type IntoIter = std::slice::Iter<'a, MapEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Buddy Memory Map ({} total, {} blocks)",
            format_size(self.total_size),
            self.entries.len(),
        )?;
        writeln!(f, "{}", "-".repeat(60))?;
        for e in &self.entries {
            let state = match e.state {
                BlockState::Allocated => "allocated",
                BlockState::Free => "free     ",
            };
            writeln!(
                f,
                "{state}  {:>12} - {:>12}  {:>10}  level {}",
                e.addr,
                e.end() - 1,
                format_size(e.size),
                e.level,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(addr: u64, size: u64, state: BlockState, level: usize) -> MapEntry {
        MapEntry {
            addr,
            size,
            state,
            level,
        }
    }

    #[test]
    fn test_sorted_on_construction() {
        let map = MemoryMap::new(
            1024,
            vec![
                entry(512, 512, BlockState::Free, 3),
                entry(0, 256, BlockState::Allocated, 2),
                entry(256, 256, BlockState::Free, 2),
            ],
        );
        let addrs: Vec<u64> = map.iter().map(|e| e.addr).collect();
        assert_eq!(addrs, vec![0, 256, 512]);
    }

    #[test]
    fn test_byte_accounting() {
        let map = MemoryMap::new(
            1024,
            vec![
                entry(0, 256, BlockState::Allocated, 2),
                entry(256, 256, BlockState::Free, 2),
                entry(512, 512, BlockState::Free, 3),
            ],
        );
        assert_eq!(map.allocated_bytes(), 256);
        assert_eq!(map.free_bytes(), 768);
        assert!(map.is_contiguous());
    }

    #[test]
    fn test_gap_detected() {
        let map = MemoryMap::new(
            1024,
            vec![
                entry(0, 256, BlockState::Allocated, 2),
                entry(512, 512, BlockState::Free, 3),
            ],
        );
        assert!(!map.is_contiguous());
    }

    #[test]
    fn test_display() {
        let map = MemoryMap::new(
            1024,
            vec![
                entry(0, 512, BlockState::Allocated, 3),
                entry(512, 512, BlockState::Free, 3),
            ],
        );
        let s = format!("{map}");
        assert!(s.contains("allocated"));
        assert!(s.contains("free"));
        assert!(s.contains("level 3"));
    }

    #[test]
    fn test_serialize() {
        let map = MemoryMap::new(64, vec![entry(0, 64, BlockState::Free, 0)]);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"state\":\"free\""));
    }
}
