//! Integration tests for frequency analysis over an aggregated bundle.

use classpack::core::aggregate::{AggregateOptions, PatternFrequencyMap, aggregate};
use classpack::core::analyze::{
    AnalyzeOptions, SortOrder, analyze, bucket_by_frequency, co_occurrence, compression_stats, pattern_groups, sort,
};
use classpack::core::patterns::{PatternCategory, PatternClassifier};
use classpack::core::records::load_bundle;

mod util;
use util::{BUNDLE_JSON, map_of};

fn bundle_map() -> PatternFrequencyMap
{
    let bundle = load_bundle(BUNDLE_JSON).expect("bundle");
    aggregate(&bundle.html, &bundle.jsx, &AggregateOptions::default()).expect("aggregate")
}

fn names(sorted: &[&classpack::core::AggregatedClassData]) -> Vec<String>
{
    sorted
        .iter()
        .map(|d| d.class_name.clone())
        .collect()
}

#[test]
fn sort_orders_are_total_and_deterministic()
{
    let map = bundle_map();

    assert_eq!(
        names(&sort(&map, SortOrder::FrequencyDesc)),
        vec!["flex", "p-4", "items-center", "text-center"]
    );
    assert_eq!(
        names(&sort(&map, SortOrder::FrequencyAsc)),
        vec!["text-center", "items-center", "p-4", "flex"]
    );
    assert_eq!(
        names(&sort(&map, SortOrder::Alphabetical)),
        vec!["flex", "items-center", "p-4", "text-center"]
    );
    // flex spans two files; the rest tie on one and fall back to name order
    assert_eq!(
        names(&sort(&map, SortOrder::FileSpreadDesc)),
        vec!["flex", "items-center", "p-4", "text-center"]
    );
}

#[test]
fn co_occurrence_ranks_by_strength()
{
    let map = bundle_map();
    let pairs = co_occurrence(&map, 1);

    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].classes, vec!["flex", "items-center"]);
    assert!((pairs[0].strength - 0.5).abs() < 1e-9);
    assert_eq!(pairs[0].sample_contexts, vec!["src/App.jsx"]);
    assert_eq!(pairs[1].classes, vec!["flex", "p-4"]);
    assert!(pairs.iter().all(|p| p.strength > 0.0 && p.strength <= 1.0));

    assert!(co_occurrence(&map, 2).is_empty());
}

#[test]
fn buckets_follow_alphabet_capacity()
{
    let map = map_of(&[("a1", 9), ("a2", 8), ("a3", 7), ("a4", 6), ("a5", 5)]);
    let sorted = sort(&map, SortOrder::FrequencyDesc);

    // 3 one-char names, then 9 two-char names
    let buckets = bucket_by_frequency(&sorted, 3).expect("buckets");
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].name_length, 1);
    assert_eq!(buckets[0].classes.len(), 3);
    assert_eq!(buckets[1].capacity, 9);
    assert_eq!(buckets[1].classes.len(), 2);
    assert_eq!(buckets[1].total_frequency, 11);

    assert!(bucket_by_frequency(&sorted, 0).is_err());
}

#[test]
fn classes_fall_into_every_matching_category()
{
    let classifier = PatternClassifier::new().expect("rules compile");
    let categories = classifier.classify("md:hover:bg-blue-500");

    assert!(categories.contains(&PatternCategory::Responsive));
    assert!(categories.contains(&PatternCategory::StateVariant));
    assert!(categories.contains(&PatternCategory::Colors));
    assert!(!categories.contains(&PatternCategory::DarkMode));
}

#[test]
fn pattern_groups_cover_the_bundle()
{
    let groups = pattern_groups(&bundle_map()).expect("groups");

    let flex_grid = groups
        .iter()
        .find(|g| g.category == PatternCategory::FlexGrid)
        .expect("flex-grid group");
    assert_eq!(flex_grid.classes, vec!["flex", "items-center"]);
    assert_eq!(flex_grid.total_frequency, 9);

    assert!(
        groups
            .iter()
            .any(|g| g.category == PatternCategory::Spacing && g.classes == vec!["p-4"])
    );
}

#[test]
fn report_summarizes_usage()
{
    let report = analyze(&bundle_map(), 26, &AnalyzeOptions { co_occurrence_floor: 1, top: 2 }).expect("report");

    assert_eq!(report.summary.total_classes, 4);
    assert_eq!(report.summary.total_usage, 13);
    assert_eq!(report.summary.top_classes[0], ("flex".to_string(), 7));
    assert_eq!(report.summary.top_classes.len(), 2);
    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.co_occurrences.len(), 2);
}

#[test]
fn extreme_frequencies_saturate_instead_of_overflowing()
{
    let map = map_of(&[("flex", u64::MAX), ("grid", u64::MAX)]);

    let report = analyze(&map, 26, &AnalyzeOptions { co_occurrence_floor: 1, top: 2 }).expect("report");
    assert_eq!(report.summary.total_usage, u64::MAX);
    assert_eq!(report.summary.median_frequency, u64::MAX as f64);
    assert_eq!(report.buckets[0].total_frequency, u64::MAX);

    let names = [("flex", "a"), ("grid", "b")]
        .iter()
        .map(|(c, n)| (c.to_string(), n.to_string()))
        .collect();
    let stats = compression_stats(&map, &names).expect("stats");
    assert_eq!(stats.per_class[0].bytes_saved, i64::MAX);
    assert_eq!(stats.total_bytes_saved, i64::MAX);
}
