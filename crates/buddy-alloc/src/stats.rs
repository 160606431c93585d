// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for profiling and diagnostics.
//!
//! [`AllocStats`] tracks cumulative metrics about arena usage: how often
//! blocks were split and merged, peak live bytes, and how many requests
//! were rejected. Useful for sizing the arena and the minimum block.

/// Cumulative statistics about buddy arena usage.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AllocStats {
    /// Number of successful allocations.
    pub total_allocations: u64,
    /// Number of successful deallocations.
    pub total_deallocations: u64,
    /// Number of requests rejected because no free block was large enough.
    pub oom_count: u64,
    /// Number of deallocations rejected for an unknown or double-freed address.
    pub invalid_free_count: u64,
    /// Number of block splits performed while descending to a request's level.
    pub splits: u64,
    /// Number of buddy merges performed while coalescing freed blocks.
    pub merges: u64,
    /// Peak live bytes.
    pub peak_allocated_bytes: u64,
    /// Total bytes ever handed out (including freed and re-allocated).
    pub cumulative_allocated_bytes: u64,
}

impl AllocStats {
    /// Records a successful allocation of `size` bytes.
    pub(crate) fn record_allocation(&mut self, size: u64) {
        self.total_allocations += 1;
        self.cumulative_allocated_bytes += size;
    }

    /// Records a successful deallocation.
    pub(crate) fn record_deallocation(&mut self) {
        self.total_deallocations += 1;
    }

    /// Records a rejected allocation (no block large enough).
    pub(crate) fn record_oom(&mut self) {
        self.oom_count += 1;
    }

    /// Records a rejected deallocation (unknown address).
    pub(crate) fn record_invalid_free(&mut self) {
        self.invalid_free_count += 1;
    }

    /// Records one block split.
    pub(crate) fn record_split(&mut self) {
        self.splits += 1;
    }

    /// Records one buddy merge.
    pub(crate) fn record_merge(&mut self) {
        self.merges += 1;
    }

    /// Updates the peak-live high-water mark if needed.
    pub(crate) fn update_peak(&mut self, current_bytes: u64) {
        if current_bytes > self.peak_allocated_bytes {
            self.peak_allocated_bytes = current_bytes;
        }
    }

    /// Returns a human-readable one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{} allocations, {} deallocations, {} splits, {} merges, \
             {} OOMs, {} invalid frees, peak {} bytes live",
            self.total_allocations,
            self.total_deallocations,
            self.splits,
            self.merges,
            self.oom_count,
            self.invalid_free_count,
            self.peak_allocated_bytes,
        )
    }
}
