// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use screenshot_gallery::classifier::{classify, parse_file_name};
use screenshot_gallery::thumbnail::fit_within;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    file_name: &'a str,
    folder_name: &'a str,
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
}

fuzz_target!(|input: Input<'_>| {
    let label = classify(input.file_name, input.folder_name);
    assert!(!label.category.is_empty() || input.folder_name.is_empty());

    let parsed = parse_file_name(input.file_name);
    if parsed.date.is_some() {
        assert!(parsed.date_str.is_some());
    }

    if input.max_width > 0 && input.max_height > 0 {
        let (w, h) = fit_within(input.width, input.height, input.max_width, input.max_height);
        assert!(w >= 1 && h >= 1);
        assert!(w <= input.width.max(1) && h <= input.height.max(1));
    }
});
