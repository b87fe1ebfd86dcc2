// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

pub mod compare;
pub mod config;
pub mod error;
pub mod extractor;
pub mod firmware_file;
pub mod ihex;
pub mod image;
pub mod operation;
pub mod pretty;
pub mod region;
pub mod target;

pub use crate::error::Error;
