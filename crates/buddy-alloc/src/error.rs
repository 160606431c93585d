// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the buddy allocator.
//!
//! Every error is local and non-fatal to the allocator instance: a failed
//! call leaves the free sets and the allocated map exactly as they were,
//! and the allocator stays usable.

/// Errors produced by arena construction and allocation operations.
#[derive(Debug, thiserror::Error)]
pub enum BuddyError {
    /// The arena geometry is unusable. Construction-time only; no
    /// allocator is produced.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A zero-sized allocation was requested.
    #[error("cannot allocate zero bytes")]
    InvalidSize,

    /// No free block large enough exists at any level. The caller may
    /// retry after other blocks are freed.
    #[error(
        "out of memory: requested {requested} bytes (a {block_size}-byte block), \
         largest free block is {largest_free} bytes"
    )]
    OutOfMemory {
        requested: u64,
        /// The size class the request rounds up to.
        block_size: u64,
        /// Size of the largest currently-free block (0 if none).
        largest_free: u64,
    },

    /// Deallocation of an address that is not the start of a live
    /// allocation. Double frees and never-allocated addresses are
    /// indistinguishable and both report this.
    #[error("invalid address {addr:#x}: not the start of a live allocation")]
    InvalidAddress { addr: u64 },
}
