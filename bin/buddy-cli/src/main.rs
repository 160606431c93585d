// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buddy
//!
//! Command-line interface for the buddy-alloc arena allocator.
//!
//! ## Usage
//! ```bash
//! # Scripted allocation demo
//! buddy demo --capacity 8G --min-block 128M
//!
//! # Replay a TOML trace of alloc/free operations
//! buddy replay --trace trace.toml --json
//!
//! # Print the level table for an arena layout
//! buddy inspect --capacity 4G --min-block 64M
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "buddy",
    about = "Buddy-system arena allocator: demos, trace replay, inspection",
    version
)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted allocation demo and print the memory map between steps.
    Demo {
        /// Total arena size (e.g., "8G").
        #[arg(long, default_value = "8G")]
        capacity: String,

        /// Minimum block size (e.g., "128M").
        #[arg(long, default_value = "128M")]
        min_block: String,
    },

    /// Replay a TOML trace of tagged alloc/free operations.
    Replay {
        /// Path to the trace file.
        #[arg(short, long)]
        trace: std::path::PathBuf,

        /// Emit the final memory map as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the level table for an arena layout without allocating.
    Inspect {
        /// Total arena size (e.g., "4G").
        #[arg(long, default_value = "4G")]
        capacity: String,

        /// Minimum block size (e.g., "64M").
        #[arg(long, default_value = "64M")]
        min_block: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Demo {
            capacity,
            min_block,
        } => commands::demo::execute(capacity, min_block),
        Commands::Replay { trace, json } => commands::replay::execute(trace, json),
        Commands::Inspect {
            capacity,
            min_block,
        } => commands::inspect::execute(capacity, min_block),
    }
}
