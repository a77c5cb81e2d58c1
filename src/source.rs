// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Directory selection and file handles

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::{GalleryError, Result};

/// A file discovered under the chosen root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHandle {
    path: PathBuf,
    name: String,
}

/// What the thumbnail cache knows about a file without reading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub name: String,
    /// Modification time, milliseconds since the Unix epoch
    pub modified_ms: i64,
    pub size: u64,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name, modification time and size
    pub async fn identity(&self) -> Result<FileIdentity> {
        let meta = tokio::fs::metadata(&self.path).await?;
        let modified: DateTime<Utc> = meta.modified()?.into();
        Ok(FileIdentity {
            name: self.name.clone(),
            modified_ms: modified.timestamp_millis(),
            size: meta.len(),
        })
    }

    /// Read the whole file
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Obtains the root directory to scan
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    /// `Cancelled` when the user declines, `Unsupported` when no picker is available
    async fn pick(&self) -> Result<PathBuf>;
}

/// A root chosen ahead of time (command line or config)
pub struct FixedRoot(PathBuf);

impl FixedRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

#[async_trait]
impl DirectoryPicker for FixedRoot {
    async fn pick(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// Asks for a folder on the terminal
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// Interpret a typed answer; blank means the user backed out
    pub fn parse_answer(answer: &str) -> Result<PathBuf> {
        let trimmed = answer.trim().trim_matches('"').trim_matches('\'');
        if trimmed.is_empty() {
            return Err(GalleryError::Cancelled);
        }
        Ok(PathBuf::from(trimmed))
    }
}

#[async_trait]
impl DirectoryPicker for TerminalPrompt {
    async fn pick(&self) -> Result<PathBuf> {
        if !std::io::stdin().is_terminal() {
            return Err(GalleryError::Unsupported(
                "no folder given and stdin is not a terminal".to_string(),
            ));
        }

        let answer = tokio::task::spawn_blocking(|| -> std::io::Result<String> {
            let mut stderr = std::io::stderr();
            write!(stderr, "Screenshot folder: ")?;
            stderr.flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok(line)
        })
        .await??;

        Self::parse_answer(&answer)
    }
}

/// Pick from the command line, then config, then the terminal
pub fn picker_for(cli_dir: Option<PathBuf>, config_root: Option<&str>) -> Box<dyn DirectoryPicker> {
    match (cli_dir, config_root) {
        (Some(dir), _) => Box::new(FixedRoot::new(dir)),
        (None, Some(root)) => Box::new(FixedRoot::new(root)),
        (None, None) => Box::new(TerminalPrompt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_answer_is_cancellation() {
        assert!(matches!(TerminalPrompt::parse_answer("  \n"), Err(GalleryError::Cancelled)));
        assert!(matches!(TerminalPrompt::parse_answer("\"\""), Err(GalleryError::Cancelled)));
    }

    #[test]
    fn quoted_answer_is_unwrapped() {
        let path = TerminalPrompt::parse_answer("'/home/me/Screenshots'\n").unwrap();
        assert_eq!(path, PathBuf::from("/home/me/Screenshots"));
    }

    #[tokio::test]
    async fn command_line_wins_over_config() {
        let picker = picker_for(Some(PathBuf::from("/cli")), Some("/config"));
        assert_eq!(picker.pick().await.unwrap(), PathBuf::from("/cli"));

        let picker = picker_for(None, Some("/config"));
        assert_eq!(picker.pick().await.unwrap(), PathBuf::from("/config"));
    }

    #[tokio::test]
    async fn identity_reports_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"12345").unwrap();

        let handle = FileHandle::new(&path);
        assert_eq!(handle.name(), "shot.png");
        let identity = handle.identity().await.unwrap();
        assert_eq!(identity.size, 5);
        assert_eq!(identity.name, "shot.png");
        assert_eq!(handle.read().await.unwrap(), b"12345");
    }
}
