// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Recursive directory scanner for screenshot folders

use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::source::FileHandle;
use crate::{GalleryError, Result};

/// A discovered image and the folder it sits in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub handle: FileHandle,
    pub file_name: String,
    /// Immediate parent directory name, not the full path
    pub folder_name: String,
}

/// Progress notifications emitted while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanProgress {
    /// Started reading a folder
    Folder(String),
    /// Number of images found so far
    Found(usize),
}

/// Cancellation signal checked at every directory and entry
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token and the sender that trips it
    pub fn new() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A token nobody can cancel
    pub fn never() -> Self {
        Self::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Walks a directory tree and collects image files
pub struct Scanner {
    extensions: Vec<String>,
    progress: Option<mpsc::UnboundedSender<ScanProgress>>,
}

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

impl Scanner {
    /// Create a scanner accepting the given extensions (case-insensitive)
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            progress: None,
        }
    }

    /// Send progress notifications to `tx`
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<ScanProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Check whether a filename has an accepted extension
    pub fn is_image(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// Scan `root` recursively
    ///
    /// Any unreadable directory fails the whole scan; nothing partial is returned.
    pub async fn scan(&self, root: &Path, cancel: &CancelToken) -> Result<Vec<FileRecord>> {
        info!("Scanning {:?}", root);
        let mut files = Vec::new();
        self.walk(root.to_path_buf(), cancel, &mut files).await?;
        info!("Search complete. Found {} image(s)", files.len());
        Ok(files)
    }

    fn walk<'a>(
        &'a self,
        dir: PathBuf,
        cancel: &'a CancelToken,
        files: &'a mut Vec<FileRecord>,
    ) -> WalkFuture<'a> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(GalleryError::Cancelled);
            }

            let folder_name = dir_name(&dir);
            debug!("Scanning folder: {}", folder_name);
            self.report(ScanProgress::Folder(folder_name.clone()));

            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| scan_error(&dir, e))?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| scan_error(&dir, e))? {
                if cancel.is_cancelled() {
                    return Err(GalleryError::Cancelled);
                }

                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| scan_error(&path, e))?;

                if file_type.is_dir() {
                    self.walk(path, cancel, files).await?;
                } else if file_type.is_file() {
                    let file_name = entry.file_name().to_string_lossy().into_owned();
                    if self.is_image(&file_name) {
                        files.push(FileRecord {
                            handle: FileHandle::new(path),
                            file_name,
                            folder_name: folder_name.clone(),
                        });
                        self.report(ScanProgress::Found(files.len()));
                    }
                } else {
                    debug!("Skipping non-regular entry {:?}", path);
                }
            }
            Ok(())
        })
    }

    fn report(&self, event: ScanProgress) {
        if let Some(tx) = &self.progress {
            // receiver may have gone away; progress is best effort
            let _ = tx.send(event);
        }
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}

fn scan_error(path: &Path, source: std::io::Error) -> GalleryError {
    GalleryError::Scan {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scanner() -> Scanner {
        Scanner::new(&["jpg".to_string(), "jpeg".to_string(), "png".to_string()])
    }

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let s = scanner();
        assert!(s.is_image("a.PNG"));
        assert!(s.is_image("b.Jpeg"));
        assert!(!s.is_image("c.gif"));
        assert!(!s.is_image("png"));
        assert!(!s.is_image("notes.png.txt"));
    }

    #[tokio::test]
    async fn flattens_tree_with_immediate_folder_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Screenshots");
        touch(root.join("top.png"));
        touch(root.join("readme.md"));
        touch(root.join("Boss Kills").join("Barrows(10).png"));
        touch(root.join("Boss Kills").join("Zulrah(2).JPG"));
        touch(root.join("Boss Kills").join("notes.txt"));
        touch(root.join("Levels").join("Agility(61).png"));
        touch(root.join("Levels").join("Old").join("Cooking(50).jpeg"));
        fs::create_dir_all(root.join("Empty")).unwrap();

        let mut records = scanner().scan(&root, &CancelToken::never()).await.unwrap();
        assert_eq!(records.len(), 5);

        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        let pairs: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.file_name.as_str(), r.folder_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Agility(61).png", "Levels"),
                ("Barrows(10).png", "Boss Kills"),
                ("Cooking(50).jpeg", "Old"),
                ("Zulrah(2).JPG", "Boss Kills"),
                ("top.png", "Screenshots"),
            ]
        );
        for record in &records {
            assert_eq!(record.handle.name(), record.file_name);
            assert!(record.handle.path().exists());
        }
    }

    #[tokio::test]
    async fn missing_root_is_scan_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = scanner().scan(&dir.path().join("nope"), &CancelToken::never()).await;
        assert!(matches!(result, Err(GalleryError::Scan { .. })));
    }

    #[tokio::test]
    async fn cancelled_scan_is_distinct_from_failure() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path().join("a").join("x.png"));

        let (tx, cancel) = CancelToken::new();
        tx.send(true).unwrap();
        let result = scanner().scan(dir.path(), &cancel).await;
        assert!(matches!(result, Err(GalleryError::Cancelled)));
    }

    #[tokio::test]
    async fn progress_reports_folders_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        touch(root.join("one.png"));
        touch(root.join("Pets").join("two.png"));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let records = scanner()
            .with_progress(tx)
            .scan(&root, &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&ScanProgress::Folder("root".to_string())));
        assert!(events.contains(&ScanProgress::Folder("Pets".to_string())));
        assert!(events.contains(&ScanProgress::Found(2)));
    }
}
