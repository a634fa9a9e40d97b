// SPDX-FileCopyrightText: 2025 HalfSweet
// SPDX-License-Identifier: Apache-2.0

//! TransProtel - Normalize KiCad plot output for Protel-style fabrication
//!
//! Gerber layers are renamed to Protel extensions and the plated and
//! non-plated Excellon drill files of each board are merged into one
//! optimized drill file.

#![allow(non_snake_case)]

pub mod archive;
pub mod config;
pub mod converter;
pub mod error;
pub mod excellon;
pub mod patterns;
pub mod progress;
