// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena geometry: total size, minimum block size, and levels.
//!
//! An [`ArenaLayout`] fixes the shape of the buddy hierarchy up front.
//! Level `k` holds blocks of `min_block << k` bytes; the top level
//! (`levels() - 1`) holds a single block spanning the whole arena.
//!
//! Size strings use human-readable suffixes for CLI and config
//! ergonomics: `"64M"`, `"4G"`, `"1024K"`, or a plain byte count.

use crate::BuddyError;
use std::fmt;

/// The immutable geometry of a buddy arena.
///
/// Both `total_size` and `min_block` must be powers of two, with
/// `min_block <= total_size`. The buddy identity
/// `buddy = addr ^ block_size(level)` is only correct when every block
/// is aligned to its own (power-of-two) size, so non-power-of-two
/// geometries are rejected at construction rather than rounded.
///
/// # Examples
/// ```
/// use buddy_alloc::ArenaLayout;
///
/// let layout = ArenaLayout::new(1024, 64).unwrap();
/// assert_eq!(layout.levels(), 5);          // 64, 128, 256, 512, 1024
/// assert_eq!(layout.block_size(2), 256);
/// assert_eq!(layout.level_for(200), 2);    // rounds up to 256
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ArenaLayout {
    /// Total arena size in bytes.
    total_size: u64,
    /// Smallest allocatable block in bytes.
    min_block: u64,
    /// Number of size classes: `log2(total_size / min_block) + 1`.
    levels: usize,
}

impl ArenaLayout {
    /// Creates a layout for an arena of `total_size` bytes with a
    /// minimum block of `min_block` bytes.
    ///
    /// Fails with [`BuddyError::InvalidConfiguration`] if either size is
    /// zero or not a power of two, or if `min_block > total_size`.
    pub fn new(total_size: u64, min_block: u64) -> Result<Self, BuddyError> {
        if total_size == 0 || min_block == 0 {
            return Err(BuddyError::InvalidConfiguration {
                reason: format!(
                    "sizes must be positive (total_size = {total_size}, min_block = {min_block})"
                ),
            });
        }
        if !total_size.is_power_of_two() || !min_block.is_power_of_two() {
            return Err(BuddyError::InvalidConfiguration {
                reason: format!(
                    "sizes must be powers of two (total_size = {total_size}, min_block = {min_block})"
                ),
            });
        }
        if min_block > total_size {
            return Err(BuddyError::InvalidConfiguration {
                reason: format!(
                    "min_block ({min_block}) exceeds total_size ({total_size})"
                ),
            });
        }

        let levels = (total_size / min_block).trailing_zeros() as usize + 1;
        Ok(Self {
            total_size,
            min_block,
            levels,
        })
    }

    /// Total arena size in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Smallest allocatable block in bytes.
    pub fn min_block(&self) -> u64 {
        self.min_block
    }

    /// Number of size classes.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Block size at `level`: `min_block << level`.
    pub fn block_size(&self, level: usize) -> u64 {
        debug_assert!(level < self.levels, "level {level} out of range");
        self.min_block << level
    }

    /// The smallest level whose block size satisfies a request of `size`
    /// bytes. Requests below `min_block` round up to it.
    ///
    /// Returns `levels()` when `size > total_size`; the allocator turns
    /// that into an out-of-memory failure. The short-circuit also keeps
    /// the rounding arithmetic below overflow-free: with
    /// `size <= total_size`, `units` never exceeds `total_size / min_block`.
    pub fn level_for(&self, size: u64) -> usize {
        if size > self.total_size {
            return self.levels;
        }
        let units = size.max(self.min_block).div_ceil(self.min_block);
        units.next_power_of_two().trailing_zeros() as usize
    }
}

impl fmt::Display for ArenaLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} arena, {} min block, {} levels",
            format_size(self.total_size),
            format_size(self.min_block),
            self.levels,
        )
    }
}

/// Parses a human-readable size string into a byte count.
///
/// Accepted formats: `"512M"`, `"512MB"`, `"1G"`, `"1GB"`, `"2048K"`,
/// `"2048KB"`, or a plain byte count like `"1073741824"`.
/// Case-insensitive. Zero is rejected.
pub fn parse_size(s: &str) -> Result<u64, BuddyError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(BuddyError::InvalidConfiguration {
            reason: "empty size string".to_string(),
        });
    }

    let s_upper = s.to_uppercase();

    let (num_str, multiplier) = if s_upper.ends_with("GB") {
        (&s[..s.len() - 2], 1024 * 1024 * 1024)
    } else if s_upper.ends_with('G') {
        (&s[..s.len() - 1], 1024 * 1024 * 1024)
    } else if s_upper.ends_with("MB") {
        (&s[..s.len() - 2], 1024 * 1024)
    } else if s_upper.ends_with('M') {
        (&s[..s.len() - 1], 1024 * 1024)
    } else if s_upper.ends_with("KB") {
        (&s[..s.len() - 2], 1024)
    } else if s_upper.ends_with('K') {
        (&s[..s.len() - 1], 1024)
    } else if s_upper.ends_with('B') {
        (&s[..s.len() - 1], 1)
    } else {
        // Plain number — treat as bytes.
        (s, 1)
    };

    let value: u64 = num_str.trim().parse().map_err(|_| {
        BuddyError::InvalidConfiguration {
            reason: format!(
                "invalid size string: '{s}' — expected a number followed by an optional suffix (K, M, G)"
            ),
        }
    })?;

    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| BuddyError::InvalidConfiguration {
            reason: format!("size overflow: '{s}'"),
        })?;

    if bytes == 0 {
        return Err(BuddyError::InvalidConfiguration {
            reason: format!("size must be positive: '{s}'"),
        });
    }

    Ok(bytes)
}

/// Formats a byte count with the largest suffix that divides it evenly.
pub fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes >= GB && bytes % GB == 0 {
        format!("{} GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let l = ArenaLayout::new(1024, 64).unwrap();
        assert_eq!(l.total_size(), 1024);
        assert_eq!(l.min_block(), 64);
        assert_eq!(l.levels(), 5);
    }

    #[test]
    fn test_new_single_level() {
        let l = ArenaLayout::new(64, 64).unwrap();
        assert_eq!(l.levels(), 1);
        assert_eq!(l.block_size(0), 64);
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(ArenaLayout::new(0, 64).is_err());
        assert!(ArenaLayout::new(1024, 0).is_err());
    }

    #[test]
    fn test_new_rejects_non_power_of_two() {
        assert!(ArenaLayout::new(1000, 64).is_err());
        assert!(ArenaLayout::new(1024, 100).is_err());
    }

    #[test]
    fn test_new_rejects_min_above_total() {
        assert!(matches!(
            ArenaLayout::new(64, 1024),
            Err(BuddyError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_block_sizes() {
        let l = ArenaLayout::new(1024, 64).unwrap();
        assert_eq!(l.block_size(0), 64);
        assert_eq!(l.block_size(1), 128);
        assert_eq!(l.block_size(4), 1024);
    }

    #[test]
    fn test_level_for() {
        let l = ArenaLayout::new(1024, 64).unwrap();
        assert_eq!(l.level_for(1), 0); // below min rounds up
        assert_eq!(l.level_for(64), 0);
        assert_eq!(l.level_for(65), 1);
        assert_eq!(l.level_for(128), 1);
        assert_eq!(l.level_for(200), 2);
        assert_eq!(l.level_for(1024), 4);
        // Oversized requests land past the top level.
        assert_eq!(l.level_for(2048), 5);
    }

    #[test]
    fn test_level_for_huge_request_does_not_overflow() {
        // min_block = 1 maximizes the unit count; without the oversize
        // short-circuit, rounding u64::MAX up to a power of two would
        // overflow.
        let l = ArenaLayout::new(1024, 1).unwrap();
        assert_eq!(l.level_for(u64::MAX), l.levels());
        assert_eq!(l.level_for(1025), l.levels());
        assert_eq!(l.level_for(1024), l.levels() - 1);
    }

    #[test]
    fn test_serialize() {
        let l = ArenaLayout::new(1024, 64).unwrap();
        let json = serde_json::to_string(&l).unwrap();
        assert!(json.contains("\"total_size\":1024"));
        assert!(json.contains("\"min_block\":64"));
        assert!(json.contains("\"levels\":5"));
    }

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("512M").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_size("512mb").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("2048K").unwrap(), 2048 * 1024);
        assert_eq!(parse_size("128B").unwrap(), 128);
        assert_eq!(parse_size("1048576").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("  64M  ").unwrap(), 64 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("0M").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_size(512 * 1024 * 1024), "512 MB");
        assert_eq!(format_size(2048), "2 KB");
        assert_eq!(format_size(100), "100 B");
    }

    #[test]
    fn test_display() {
        let l = ArenaLayout::new(4 * 1024 * 1024 * 1024, 64 * 1024 * 1024).unwrap();
        let s = format!("{l}");
        assert!(s.contains("4 GB"));
        assert!(s.contains("64 MB"));
        assert!(s.contains("7 levels"));
    }
}
