// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Two-level category index used for browsing

use chrono::NaiveDateTime;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::cache::ClassificationCache;
use crate::classifier::FilenameClassifier;
use crate::db::KeyValueStore;
use crate::scanner::FileRecord;
use crate::Result;

/// Bucket name for files without a subcategory
pub const MISC: &str = "Misc";

/// A scanned file plus its display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    #[serde(flatten)]
    pub record: FileRecord,
    pub cleaned_name: String,
    pub date_str: Option<String>,
    #[serde(skip)]
    pub date: Option<NaiveDateTime>,
}

/// Ordering applied to entries when listing them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Order the scanner found them in
    #[default]
    Discovery,
    Name,
    Newest,
    Oldest,
}

/// Subcategory buckets of one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
struct Buckets {
    by_name: BTreeMap<String, Vec<IndexEntry>>,
    /// Bucket names in the order they were first filled
    #[serde(skip)]
    created: Vec<String>,
}

impl Buckets {
    fn push(&mut self, bucket: String, entry: IndexEntry) {
        if !self.by_name.contains_key(&bucket) {
            self.created.push(bucket.clone());
        }
        self.by_name.entry(bucket).or_default().push(entry);
    }
}

/// category → subcategory (or [`MISC`]) → entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryIndex {
    categories: BTreeMap<String, Buckets>,
}

impl CategoryIndex {
    /// Build a fresh index from scanned files
    ///
    /// Each distinct file name is looked up once, using the folder of its
    /// first occurrence, and that label is shared by every record with the
    /// name. Lookups run concurrently; insertion follows the order of
    /// `records`, so the same input always yields the same buckets in the
    /// same order.
    pub async fn build<S, C>(records: &[FileRecord], cache: &ClassificationCache<S, C>) -> Result<Self>
    where
        S: KeyValueStore,
        C: FilenameClassifier,
    {
        let mut slot_of: HashMap<&str, usize> = HashMap::new();
        let mut unique: Vec<&FileRecord> = Vec::new();
        for record in records {
            slot_of.entry(record.file_name.as_str()).or_insert_with(|| {
                unique.push(record);
                unique.len() - 1
            });
        }

        let lookups = unique
            .iter()
            .map(|r| cache.get_or_compute(&r.file_name, &r.folder_name));
        let resolved = join_all(lookups)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let mut index = Self::default();
        for record in records {
            let classification = resolved[slot_of[record.file_name.as_str()]].clone();
            index.insert(
                classification.category,
                classification.subcategory,
                IndexEntry {
                    record: record.clone(),
                    cleaned_name: classification.cleaned_name,
                    date_str: classification.date_str,
                    date: classification.date,
                },
            );
        }

        debug!("Indexed {} files into {} categories", index.len(), index.categories.len());
        Ok(index)
    }

    fn insert(&mut self, category: String, subcategory: Option<String>, entry: IndexEntry) {
        let bucket = subcategory.unwrap_or_else(|| MISC.to_string());
        self.categories.entry(category).or_default().push(bucket, entry);
    }

    /// Category names, sorted
    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Subcategory names of one category, sorted
    pub fn subcategories(&self, category: &str) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|b| b.by_name.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// One bucket
    pub fn bucket(&self, category: &str, subcategory: &str) -> Option<&[IndexEntry]> {
        self.categories
            .get(category)
            .and_then(|b| b.by_name.get(subcategory))
            .map(Vec::as_slice)
    }

    /// Entries of one subcategory, or of the whole category when `subcategory` is `None`
    ///
    /// The whole-category view joins buckets in the order they were created.
    pub fn entries(&self, category: &str, subcategory: Option<&str>) -> Vec<&IndexEntry> {
        match subcategory {
            Some(sub) => self.bucket(category, sub).map(|b| b.iter().collect()).unwrap_or_default(),
            None => self
                .categories
                .get(category)
                .map(|b| {
                    b.created
                        .iter()
                        .filter_map(|name| b.by_name.get(name))
                        .flatten()
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.categories.values().flat_map(|b| b.by_name.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Reorder entries for display; undated entries go last for date orders
pub fn sort_entries(entries: &mut [&IndexEntry], order: SortOrder) {
    match order {
        SortOrder::Discovery => {}
        SortOrder::Name => entries.sort_by(|a, b| {
            a.cleaned_name
                .cmp(&b.cleaned_name)
                .then_with(|| a.record.file_name.cmp(&b.record.file_name))
        }),
        SortOrder::Newest => entries.sort_by(|a, b| match (a.date, b.date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        SortOrder::Oldest => entries.sort_by(|a, b| match (a.date, b.date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RuleTable;
    use crate::db::{Database, MemoryStore};
    use crate::source::FileHandle;

    fn record(folder: &str, name: &str) -> FileRecord {
        FileRecord {
            handle: FileHandle::new(format!("/shots/{}/{}", folder, name)),
            file_name: name.to_string(),
            folder_name: folder.to_string(),
        }
    }

    fn fixture() -> Vec<FileRecord> {
        vec![
            record("Boss Kills", "Zulrah(3) 2024-06-01_10-00-00.png"),
            record("Levels", "Agility(61) 2024-09-10_16-14-45.png"),
            record("Boss Kills", "Barrows(10) 2025-02-19_21-08-54.png"),
            record("Boss Kills", "Zulrah(4) 2024-06-02_10-00-00.png"),
            record("Boss Kills", "kill count.png"),
            record("Pets", "Olmlet.png"),
            record("Levels", "Agility(62) 2024-09-12_08-00-00.png"),
            record("Random", "cat.jpg"),
        ]
    }

    #[tokio::test]
    async fn groups_by_category_and_subcategory() {
        let cache = ClassificationCache::new(MemoryStore::new(), RuleTable::default());
        let index = CategoryIndex::build(&fixture(), &cache).await.unwrap();

        assert_eq!(index.categories(), vec!["Boss Kills", "Levels", "Pets", "Random"]);
        assert_eq!(index.subcategories("Boss Kills"), vec!["Barrows", MISC, "Zulrah"]);
        assert_eq!(index.subcategories("Pets"), vec![MISC]);
        assert_eq!(index.len(), 8);

        let zulrah: Vec<&str> = index
            .bucket("Boss Kills", "Zulrah")
            .unwrap()
            .iter()
            .map(|e| e.cleaned_name.as_str())
            .collect();
        assert_eq!(zulrah, vec!["Zulrah(3)", "Zulrah(4)"]);
    }

    #[tokio::test]
    async fn misc_sentinel_is_not_persisted() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let cache = ClassificationCache::new(std::sync::Arc::clone(&store), RuleTable::default());
        let index = CategoryIndex::build(&fixture(), &cache).await.unwrap();

        assert_eq!(index.bucket("Boss Kills", MISC).unwrap().len(), 1);
        let stored = store.get("kill count.png").await.unwrap().unwrap();
        let classification: crate::cache::Classification = serde_json::from_slice(&stored).unwrap();
        assert_eq!(classification.subcategory, None);
    }

    #[tokio::test]
    async fn repeated_builds_are_identical() {
        let db = Database::in_memory().unwrap();
        let cache = ClassificationCache::new(db.classifications(None), RuleTable::default());
        let records = fixture();

        let cold = CategoryIndex::build(&records, &cache).await.unwrap();
        let warm = CategoryIndex::build(&records, &cache).await.unwrap();
        assert_eq!(cold, warm);
    }

    #[tokio::test]
    async fn shared_name_across_folders_builds_the_same_twice() {
        let db = Database::in_memory().unwrap();
        let cache = ClassificationCache::new(db.classifications(None), RuleTable::default());
        let records = vec![
            record("Boss Kills", "Vorkath(5).png"),
            record("Pets", "Vorkath(5).png"),
        ];

        let cold = CategoryIndex::build(&records, &cache).await.unwrap();
        let warm = CategoryIndex::build(&records, &cache).await.unwrap();
        assert_eq!(cold, warm);
        assert_eq!(cold.categories(), vec!["Boss Kills"]);

        let folders: Vec<&str> = cold
            .bucket("Boss Kills", "Vorkath")
            .unwrap()
            .iter()
            .map(|e| e.record.folder_name.as_str())
            .collect();
        assert_eq!(folders, vec!["Boss Kills", "Pets"]);
    }

    #[tokio::test]
    async fn whole_category_follows_bucket_creation_order() {
        let cache = ClassificationCache::new(MemoryStore::new(), RuleTable::default());
        let index = CategoryIndex::build(&fixture(), &cache).await.unwrap();

        let names: Vec<&str> = index
            .entries("Boss Kills", None)
            .iter()
            .map(|e| e.record.file_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Zulrah(3) 2024-06-01_10-00-00.png",
                "Zulrah(4) 2024-06-02_10-00-00.png",
                "Barrows(10) 2025-02-19_21-08-54.png",
                "kill count.png",
            ]
        );
        assert!(index.entries("Nope", None).is_empty());
        assert!(index.entries("Boss Kills", Some("Nope")).is_empty());
    }

    #[tokio::test]
    async fn sort_orders() {
        let cache = ClassificationCache::new(MemoryStore::new(), RuleTable::default());
        let index = CategoryIndex::build(&fixture(), &cache).await.unwrap();

        let mut entries = index.entries("Boss Kills", None);
        sort_entries(&mut entries, SortOrder::Newest);
        let newest: Vec<&str> = entries.iter().map(|e| e.cleaned_name.as_str()).collect();
        assert_eq!(newest, vec!["Barrows(10)", "Zulrah(4)", "Zulrah(3)", "kill count"]);

        sort_entries(&mut entries, SortOrder::Oldest);
        assert_eq!(entries[0].cleaned_name, "Zulrah(3)");
        assert_eq!(entries[3].cleaned_name, "kill count");

        sort_entries(&mut entries, SortOrder::Name);
        let by_name: Vec<&str> = entries.iter().map(|e| e.cleaned_name.as_str()).collect();
        assert_eq!(by_name, vec!["Barrows(10)", "Zulrah(3)", "Zulrah(4)", "kill count"]);
    }

    #[tokio::test]
    async fn empty_input_gives_empty_index() {
        let cache = ClassificationCache::new(MemoryStore::new(), RuleTable::default());
        let index = CategoryIndex::build(&[], &cache).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
