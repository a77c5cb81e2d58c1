// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Screenshot Gallery: categorized browsing for screenshot folders
//!
//! Scans a folder tree for screenshots, labels each file from its name and
//! folder, groups them into categories and serves cached thumbnails.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod scanner;
pub mod source;
pub mod thumbnail;

pub use config::AppConfig;
pub use error::{GalleryError, Result};
