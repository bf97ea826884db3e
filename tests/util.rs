//! Shared test utilities for integration tests
//!
//! Provides common fixture creation and helper functions
//! used across multiple test files.
#![allow(dead_code)]

use assert_fs::prelude::*;
use classpack::core::aggregate::{AggregatedClassData, PatternFrequencyMap, SourceType};

/// HTML-only class entry with the given frequency
pub fn class(
    name: &str,
    freq: u64,
) -> AggregatedClassData
{
    let mut data = AggregatedClassData::new(name, SourceType::HtmlOnly);
    data.total_frequency = freq;
    data.html_frequency = freq;
    data.source_files
        .insert("index.html".to_string());
    data
}

/// Frequency map from `(class, frequency)` pairs
pub fn map_of(entries: &[(&str, u64)]) -> PatternFrequencyMap
{
    entries
        .iter()
        .map(|(name, freq)| class(name, *freq))
        .collect()
}

/// Bundle with one HTML and one JSX file.
///
/// Merged totals: flex 7, p-4 3, items-center 2, text-center 1.
pub const BUNDLE_JSON: &str = r#"{
  "html": [{
    "filePath": "index.html",
    "classes": [
      {"className": "flex", "frequency": 5,
       "contexts": [{"tagName": "div", "attributes": {"class": "flex p-4"}, "depth": 1}]},
      {"className": "p-4", "frequency": 3,
       "contexts": [{"tagName": "div", "attributes": {"class": "flex p-4"}, "depth": 1}]},
      {"className": "text-center", "frequency": 1}
    ]
  }],
  "jsx": [{
    "filePath": "src/App.jsx",
    "classes": [
      {"className": "flex", "frequency": 2,
       "contexts": [{"pattern": "flex items-center", "lineNumber": 3, "framework": "react"}]},
      {"className": "items-center", "frequency": 2,
       "contexts": [{"pattern": "flex items-center", "lineNumber": 3, "framework": "react"}]}
    ]
  }]
}"#;

/// Temp directory holding `bundle.json` with [`BUNDLE_JSON`]
pub fn make_bundle_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("bundle.json")
        .write_str(BUNDLE_JSON)
        .expect("write bundle");

    tmp
}
