// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! capacity = "4G"
//! min_block = "64M"
//! ```

use crate::{parse_size, ArenaLayout, BuddyAllocator, BuddyError};
use std::path::Path;

/// Configuration for a buddy arena, with human-readable sizes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArenaConfig {
    /// Total arena size (e.g., `"4G"`).
    pub capacity: String,
    /// Minimum block size (e.g., `"64M"`).
    pub min_block: String,
}

impl ArenaConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BuddyError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuddyError::InvalidConfiguration {
                reason: format!("cannot read config '{}': {e}", path.display()),
            }
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BuddyError> {
        toml::from_str(toml_str).map_err(|e| BuddyError::InvalidConfiguration {
            reason: format!("TOML parse error: {e}"),
        })
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, BuddyError> {
        toml::to_string_pretty(self).map_err(|e| BuddyError::InvalidConfiguration {
            reason: format!("TOML serialise error: {e}"),
        })
    }

    /// Resolves the size strings into an [`ArenaLayout`].
    pub fn parse_layout(&self) -> Result<ArenaLayout, BuddyError> {
        let total = parse_size(&self.capacity)?;
        let min = parse_size(&self.min_block)?;
        ArenaLayout::new(total, min)
    }

    /// Builds a fresh allocator from this configuration.
    pub fn build(&self) -> Result<BuddyAllocator, BuddyError> {
        Ok(BuddyAllocator::new(self.parse_layout()?))
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: "4G".to_string(),
            min_block: "64M".to_string(),
        }
    }
}
