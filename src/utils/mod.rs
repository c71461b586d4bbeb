// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Utility modules
//!
//! Terminal output helpers shared by the CLI commands.

pub mod colors;

pub use colors::*;
