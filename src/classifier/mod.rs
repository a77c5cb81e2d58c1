// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filename classification
//!
//! Screenshots are grouped by the folder they were saved into. Some folders
//! carry extra structure in their filenames (a boss name, a clue difficulty,
//! a skill) which becomes the subcategory. Folders without a rule become a
//! single-bucket category named after the folder.

pub mod name;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use name::{format_date, parse_file_name, ClockFormat, ParsedName};

/// Category assigned to boss kill screenshots
pub const BOSS_KILLS: &str = "Boss Kills";
/// Category assigned to chest loot screenshots
pub const CHEST_LOOT: &str = "Chest Loot";
/// Category assigned to clue scroll screenshots
pub const CLUE_SCROLL_REWARDS: &str = "Clue Scroll Rewards";
/// Category assigned to level-up screenshots
pub const LEVELS: &str = "Levels";

static BOSS_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^()]+)\(").expect("valid regex"));
static CHEST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*\d{4}-\d{2}-\d{2}").expect("valid regex"));
static CLUE_DIFFICULTY: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^(Beginner|Easy|Medium|Hard|Elite|Master)")
        .case_insensitive(true)
        .build()
        .expect("valid regex")
});
static SKILL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z]+)").expect("valid regex"));

static DEFAULT_TABLE: Lazy<RuleTable> = Lazy::new(RuleTable::default);

/// Category label for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub category: String,
    /// `None` when no folder rule produced a subgroup
    pub subcategory: Option<String>,
}

impl Label {
    fn new(category: &str, subcategory: Option<String>) -> Self {
        Self {
            category: category.to_string(),
            subcategory,
        }
    }
}

/// The fixed set of classification strategies a folder can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Every file is its own item; the folder is the category
    Unique,
    BossKills,
    ChestLoot,
    ClueScroll,
    Levels,
}

impl RuleKind {
    /// Apply this rule to a filename
    pub fn apply(self, file_name: &str, folder_name: &str) -> Label {
        match self {
            RuleKind::Unique => Label {
                category: folder_name.to_string(),
                subcategory: None,
            },
            RuleKind::BossKills => Label::new(BOSS_KILLS, capture_trimmed(&BOSS_NAME, file_name)),
            RuleKind::ChestLoot => Label::new(CHEST_LOOT, capture_trimmed(&CHEST_PREFIX, file_name)),
            RuleKind::ClueScroll => {
                let difficulty = CLUE_DIFFICULTY
                    .captures(file_name)
                    .and_then(|c| c.get(1))
                    .map(|m| capitalize(m.as_str()));
                Label::new(CLUE_SCROLL_REWARDS, difficulty)
            }
            RuleKind::Levels => {
                let skill = SKILL_NAME
                    .captures(file_name)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
                Label::new(LEVELS, skill)
            }
        }
    }
}

fn capture_trimmed(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Built-in folder → rule table
pub fn default_folder_rules() -> BTreeMap<String, RuleKind> {
    [
        ("Lonesoldr", RuleKind::Unique),
        ("Boss Kills", RuleKind::BossKills),
        ("Chest Loot", RuleKind::ChestLoot),
        ("Clue Scroll Rewards", RuleKind::ClueScroll),
        ("Collection Log", RuleKind::Unique),
        ("Combat Achievements", RuleKind::Unique),
        ("Kingdom Rewards", RuleKind::Unique),
        ("Levels", RuleKind::Levels),
        ("Pets", RuleKind::Unique),
        ("Quests", RuleKind::Unique),
    ]
    .into_iter()
    .map(|(folder, rule)| (folder.to_string(), rule))
    .collect()
}

/// Anything that can label a file from its name and folder
pub trait FilenameClassifier: Send + Sync {
    fn classify(&self, file_name: &str, folder_name: &str) -> Label;
}

/// Folder-name dispatch table over [`RuleKind`]
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: BTreeMap<String, RuleKind>,
}

impl RuleTable {
    pub fn new(rules: BTreeMap<String, RuleKind>) -> Self {
        Self { rules }
    }

    /// Rule registered for a folder, if any
    pub fn rule_for(&self, folder_name: &str) -> Option<RuleKind> {
        self.rules.get(folder_name.trim()).copied()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(default_folder_rules())
    }
}

impl FilenameClassifier for RuleTable {
    fn classify(&self, file_name: &str, folder_name: &str) -> Label {
        match self.rule_for(folder_name) {
            Some(rule) => rule.apply(file_name, folder_name),
            None => Label {
                category: folder_name.to_string(),
                subcategory: None,
            },
        }
    }
}

/// Classify with the built-in rule table
pub fn classify(file_name: &str, folder_name: &str) -> Label {
    DEFAULT_TABLE.classify(file_name, folder_name)
}
