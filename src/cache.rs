// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Persistent memoization of filename classification

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::{parse_file_name, FilenameClassifier, RuleTable};
use crate::db::KeyValueStore;
use crate::Result;

/// Label and display metadata for one file, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub file_name: String,
    pub folder_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub cleaned_name: String,
    pub date_str: Option<String>,
    pub date: Option<NaiveDateTime>,
}

/// Classification lookups backed by a key-value store
///
/// Entries are keyed by filename alone. A file with the same name in another
/// folder gets whatever was stored first; nothing here ever invalidates.
pub struct ClassificationCache<S, C = RuleTable> {
    store: S,
    classifier: C,
}

impl<S: KeyValueStore, C: FilenameClassifier> ClassificationCache<S, C> {
    pub fn new(store: S, classifier: C) -> Self {
        Self { store, classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Stored classification for `file_name`, computing and storing it on a miss
    pub async fn get_or_compute(&self, file_name: &str, folder_name: &str) -> Result<Classification> {
        if let Some(bytes) = self.store.get(file_name).await? {
            match serde_json::from_slice(&bytes) {
                Ok(hit) => return Ok(hit),
                Err(e) => warn!("Discarding unreadable classification for {}: {}", file_name, e),
            }
        }

        let classification = self.compute(file_name, folder_name);
        debug!(
            "Classified {} as {} / {:?}",
            file_name, classification.category, classification.subcategory
        );
        self.store.put(file_name, serde_json::to_vec(&classification)?).await?;
        Ok(classification)
    }

    /// Classify without touching the store
    pub fn compute(&self, file_name: &str, folder_name: &str) -> Classification {
        let label = self.classifier.classify(file_name, folder_name);
        let parsed = parse_file_name(file_name);
        Classification {
            file_name: file_name.to_string(),
            folder_name: folder_name.to_string(),
            category: label.category,
            subcategory: label.subcategory,
            cleaned_name: parsed.cleaned_name,
            date_str: parsed.date_str,
            date: parsed.date,
        }
    }
}
