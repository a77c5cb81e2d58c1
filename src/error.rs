// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the screenshot gallery

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gallery operations
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Gallery error types
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// No way to obtain a directory on this host (e.g. no terminal and no configured root)
    #[error("Directory access is not supported here: {0}")]
    Unsupported(String),

    /// The user declined to pick a directory, or the scan was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// A directory could not be read while walking the tree
    #[error("Failed to scan {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl GalleryError {
    /// Short message for the user, without diagnostic detail
    pub fn user_message(&self) -> &'static str {
        match self {
            GalleryError::Unsupported(_) => "Directory access is not supported in this environment.",
            GalleryError::Cancelled => "Directory selection was cancelled.",
            GalleryError::Scan { .. } => "Directory selection failed.",
            GalleryError::Config(_) => "The configuration file is invalid.",
            _ => "Something went wrong.",
        }
    }
}
