// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Display names and capture timestamps embedded in screenshot filenames

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `<name> YYYY-MM-DD_HH-MM-SS`
static STAMPED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+) (\d{4}-\d{2}-\d{2})_(\d{2}-\d{2}-\d{2})$").expect("valid regex")
});

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Result of splitting a filename into display name and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    pub cleaned_name: String,
    /// ISO 8601 text exactly as found in the name, even if not a real date
    pub date_str: Option<String>,
    pub date: Option<NaiveDateTime>,
}

/// How a timestamp is rendered for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockFormat {
    #[default]
    H24,
    H12,
}

/// Strip the extension and pull out a trailing `YYYY-MM-DD_HH-MM-SS` stamp
pub fn parse_file_name(file_name: &str) -> ParsedName {
    let stem = strip_extension(file_name);

    match STAMPED_NAME.captures(stem) {
        Some(caps) => {
            let date_str = format!("{}T{}", &caps[2], caps[3].replace('-', ":"));
            let date = NaiveDateTime::parse_from_str(&date_str, ISO_FORMAT).ok();
            ParsedName {
                cleaned_name: caps[1].to_string(),
                date_str: Some(date_str),
                date,
            }
        }
        None => ParsedName {
            cleaned_name: stem.to_string(),
            date_str: None,
            date: None,
        },
    }
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// Render a timestamp the way the gallery shows it, or "No Date"
pub fn format_date(date: Option<&NaiveDateTime>, clock: ClockFormat) -> String {
    match (date, clock) {
        (Some(d), ClockFormat::H24) => d.format("%m/%d/%Y, %H:%M:%S").to_string(),
        (Some(d), ClockFormat::H12) => d.format("%m/%d/%Y, %I:%M:%S %p").to_string(),
        (None, _) => "No Date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_name_is_split() {
        let parsed = parse_file_name("Agility(61) 2024-09-10_16-14-45.png");
        assert_eq!(parsed.cleaned_name, "Agility(61)");
        assert_eq!(parsed.date_str.as_deref(), Some("2024-09-10T16:14:45"));
        assert!(parsed.date.is_some());
    }

    #[test]
    fn plain_name_has_no_date() {
        let parsed = parse_file_name("randomfile.png");
        assert_eq!(parsed.cleaned_name, "randomfile");
        assert_eq!(parsed.date_str, None);
        assert_eq!(parsed.date, None);
    }

    #[test]
    fn only_last_extension_is_removed() {
        let parsed = parse_file_name("archive.backup.png");
        assert_eq!(parsed.cleaned_name, "archive.backup");
    }

    #[test]
    fn impossible_date_passes_through() {
        let parsed = parse_file_name("Glitch 2024-13-45_25-61-00.png");
        assert_eq!(parsed.cleaned_name, "Glitch");
        assert_eq!(parsed.date_str.as_deref(), Some("2024-13-45T25:61:00"));
        assert_eq!(parsed.date, None);
        assert_eq!(format_date(parsed.date.as_ref(), ClockFormat::H24), "No Date");
    }

    #[test]
    fn dates_render_in_both_clocks() {
        let parsed = parse_file_name("The Gauntlet 2024-11-02_14-28-47.png");
        let date = parsed.date.as_ref();
        assert_eq!(format_date(date, ClockFormat::H24), "11/02/2024, 14:28:47");
        assert_eq!(format_date(date, ClockFormat::H12), "11/02/2024, 02:28:47 PM");
    }
}
