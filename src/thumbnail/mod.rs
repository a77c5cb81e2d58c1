// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Thumbnail generation with a persistent cache
//!
//! Thumbnails are keyed by name, modification time, size and target box, so
//! an edited file gets a new key instead of a stale preview.

pub mod slot;

use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use std::sync::Arc;
use tracing::{debug, error};

use crate::db::KeyValueStore;
use crate::source::{FileHandle, FileIdentity};
use crate::Result;

pub use slot::{ThumbnailSlot, ThumbnailState};

/// Default bounding box edge, in pixels
pub const DEFAULT_MAX_EDGE: u32 = 200;
/// Default JPEG quality
pub const DEFAULT_QUALITY: u8 = 70;

/// An encoded JPEG preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    bytes: Vec<u8>,
}

impl Thumbnail {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:image/jpeg;base64,...` form for embedding
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(&self.bytes))
    }
}

/// Cache key for a file rendered into a `max_width` x `max_height` box
pub fn cache_key(identity: &FileIdentity, max_width: u32, max_height: u32) -> String {
    format!(
        "{}_{}_{}_{}x{}",
        identity.name, identity.modified_ms, identity.size, max_width, max_height
    )
}

/// Output size for an image, clamping only its longer side and never upscaling
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (w, h) = if width > height {
        if width > max_width {
            let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
            (max_width, scaled)
        } else {
            (width, height)
        }
    } else if height > max_height {
        let scaled = (width as f64 * max_height as f64 / height as f64).round() as u32;
        (scaled, max_height)
    } else {
        (width, height)
    };
    (w.max(1), h.max(1))
}

/// Turns raw image bytes into an encoded thumbnail
pub trait ThumbnailRenderer: Send + Sync + 'static {
    fn render(&self, bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>>;
}

/// Decode, resize and re-encode as JPEG
#[derive(Debug, Clone)]
pub struct JpegRenderer {
    quality: u8,
}

impl JpegRenderer {
    pub fn new(quality: u8) -> Self {
        Self { quality: quality.clamp(1, 100) }
    }
}

impl Default for JpegRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}

impl ThumbnailRenderer for JpegRenderer {
    fn render(&self, bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        let (w, h) = fit_within(width, height, max_width, max_height);

        let img = if (w, h) == (width, height) {
            img
        } else {
            img.resize_exact(w, h, FilterType::Triangle)
        };

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.quality).encode_image(&rgb)?;
        Ok(buffer)
    }
}

/// Produces thumbnails on demand, caching them by content identity
pub struct ThumbnailPipeline<S, R = JpegRenderer> {
    store: S,
    renderer: Arc<R>,
}

impl<S: KeyValueStore, R: ThumbnailRenderer> ThumbnailPipeline<S, R> {
    pub fn new(store: S, renderer: R) -> Self {
        Self {
            store,
            renderer: Arc::new(renderer),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Cached or freshly rendered thumbnail; `None` if anything fails
    ///
    /// Failures are logged and never propagated, so one bad file cannot
    /// affect its neighbours.
    pub async fn get_thumbnail(
        &self,
        file: &FileHandle,
        max_width: u32,
        max_height: u32,
    ) -> Option<Thumbnail> {
        match self.fetch_or_render(file, max_width, max_height).await {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                error!("Error generating or caching thumbnail for {}: {}", file.name(), e);
                None
            }
        }
    }

    async fn fetch_or_render(&self, file: &FileHandle, max_width: u32, max_height: u32) -> Result<Thumbnail> {
        let identity = file.identity().await?;
        let key = cache_key(&identity, max_width, max_height);

        if let Some(bytes) = self.store.get(&key).await? {
            debug!("Thumbnail cache hit: {}", key);
            return Ok(Thumbnail::new(bytes));
        }

        debug!("Thumbnail cache miss: {}", key);
        let data = file.read().await?;
        let renderer = Arc::clone(&self.renderer);
        let encoded =
            tokio::task::spawn_blocking(move || renderer.render(&data, max_width, max_height)).await??;

        self.store.put(&key, encoded.clone()).await?;
        Ok(Thumbnail::new(encoded))
    }
}
