// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Lazy per-item thumbnail state

use super::{Thumbnail, ThumbnailPipeline, ThumbnailRenderer};
use crate::db::KeyValueStore;
use crate::source::FileHandle;

/// Where a displayed item's thumbnail is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailState {
    Unrequested,
    Loading,
    Ready(Thumbnail),
    /// Terminal; show a placeholder
    Failed,
}

/// One gallery item waiting for its thumbnail
///
/// The request fires the first time the item becomes visible and never again.
#[derive(Debug, Clone)]
pub struct ThumbnailSlot {
    handle: FileHandle,
    state: ThumbnailState,
}

impl ThumbnailSlot {
    pub fn new(handle: FileHandle) -> Self {
        Self {
            handle,
            state: ThumbnailState::Unrequested,
        }
    }

    pub fn handle(&self) -> &FileHandle {
        &self.handle
    }

    pub fn state(&self) -> &ThumbnailState {
        &self.state
    }

    /// Mark the item visible; true only when this starts the request
    pub fn on_visible(&mut self) -> bool {
        if self.state == ThumbnailState::Unrequested {
            self.state = ThumbnailState::Loading;
            true
        } else {
            false
        }
    }

    /// Record the outcome of an in-flight request
    pub fn settle(&mut self, result: Option<Thumbnail>) {
        if self.state != ThumbnailState::Loading {
            return;
        }
        self.state = match result {
            Some(thumbnail) => ThumbnailState::Ready(thumbnail),
            None => ThumbnailState::Failed,
        };
    }

    /// Mark visible and, if this is the first time, fetch through the pipeline
    pub async fn load<S, R>(
        &mut self,
        pipeline: &ThumbnailPipeline<S, R>,
        max_width: u32,
        max_height: u32,
    ) -> &ThumbnailState
    where
        S: KeyValueStore,
        R: ThumbnailRenderer,
    {
        if self.on_visible() {
            let result = pipeline.get_thumbnail(&self.handle, max_width, max_height).await;
            self.settle(result);
        }
        &self.state
    }
}
