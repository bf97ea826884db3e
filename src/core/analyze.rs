//! Frequency and pattern analysis over an aggregated map.
//!
//! Nothing here depends on the map's iteration order: every function sorts
//! explicitly, breaking ties alphabetically by class name.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::aggregate::{AggregatedClassData, PatternFrequencyMap};
use crate::core::error::AnalysisError;
use crate::core::patterns::{PatternCategory, PatternClassifier};

/// Entries kept in best/worst compression lists
const EXTREMES: usize = 5;

/// Shared source files reported per co-occurrence pair
const SAMPLE_CONTEXTS: usize = 3;

/// Ordering for [`sort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder
{
    #[default]
    FrequencyDesc,
    FrequencyAsc,
    Alphabetical,
    /// Most source files first
    FileSpreadDesc,
    /// Most distinct co-occurring classes first
    CoOccurrenceDesc,
}

/// Deterministically ordered view of the map; ties break alphabetically
pub fn sort(
    map: &PatternFrequencyMap,
    order: SortOrder,
) -> Vec<&AggregatedClassData>
{
    let mut entries: Vec<&AggregatedClassData> = map
        .values()
        .collect();

    match order
    {
        SortOrder::FrequencyDesc => entries.sort_by(|a, b| {
            b.total_frequency
                .cmp(&a.total_frequency)
                .then_with(|| {
                    a.class_name
                        .cmp(&b.class_name)
                })
        }),
        SortOrder::FrequencyAsc => entries.sort_by(|a, b| {
            a.total_frequency
                .cmp(&b.total_frequency)
                .then_with(|| {
                    a.class_name
                        .cmp(&b.class_name)
                })
        }),
        SortOrder::Alphabetical => entries.sort_by(|a, b| {
            a.class_name
                .cmp(&b.class_name)
        }),
        SortOrder::FileSpreadDesc => entries.sort_by(|a, b| {
            b.source_files
                .len()
                .cmp(
                    &a.source_files
                        .len(),
                )
                .then_with(|| {
                    a.class_name
                        .cmp(&b.class_name)
                })
        }),
        SortOrder::CoOccurrenceDesc => entries.sort_by(|a, b| {
            b.co_occurrence_degree()
                .cmp(&a.co_occurrence_degree())
                .then_with(|| {
                    a.class_name
                        .cmp(&b.class_name)
                })
        }),
    }

    entries
}

/// Sum of frequencies, saturating at `u64::MAX`
fn saturating_total(frequencies: impl Iterator<Item = u64>) -> u64
{
    frequencies.fold(0u64, u64::saturating_add)
}

/// Classes that can be served by identifiers of one length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyBucket
{
    pub name_length: usize,
    /// Identifiers of this length the alphabet can produce
    pub capacity: u64,
    pub classes: Vec<String>,
    pub total_frequency: u64,
    pub min_frequency: u64,
    pub max_frequency: u64,
}

/// Partition a sorted list into identifier-length tiers.
///
/// Tier `L` holds up to `alphabet_len^L` classes, taken in list order, so
/// with a frequency-descending list the densest classes land in tier 1.
pub fn bucket_by_frequency(
    sorted: &[&AggregatedClassData],
    alphabet_len: usize,
) -> Result<Vec<FrequencyBucket>, AnalysisError>
{
    if alphabet_len == 0
    {
        return Err(AnalysisError::EmptyAlphabet);
    }

    let mut buckets = Vec::new();
    let mut rest = sorted;
    let mut length: u32 = 1;

    while !rest.is_empty()
    {
        let capacity = (alphabet_len as u64).saturating_pow(length);
        let take = usize::try_from(capacity)
            .unwrap_or(usize::MAX)
            .min(rest.len());
        let (tier, tail) = rest.split_at(take);

        buckets.push(FrequencyBucket {
            name_length: length as usize,
            capacity,
            classes: tier
                .iter()
                .map(|d| {
                    d.class_name
                        .clone()
                })
                .collect(),
            total_frequency: saturating_total(
                tier.iter()
                    .map(|d| d.total_frequency),
            ),
            min_frequency: tier
                .iter()
                .map(|d| d.total_frequency)
                .min()
                .unwrap_or(0),
            max_frequency: tier
                .iter()
                .map(|d| d.total_frequency)
                .max()
                .unwrap_or(0),
        });

        rest = tail;
        length += 1;
    }

    Ok(buckets)
}

/// Two classes that share usage contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoOccurrencePattern
{
    /// The pair, in ascending order
    pub classes: Vec<String>,
    pub joint_frequency: u64,
    /// joint / min(freq_a, freq_b), within (0, 1]
    pub strength: f64,
    /// Source files both classes appear in
    pub sample_contexts: Vec<String>,
}

/// Pairwise co-occurrence with joint count at least `floor`, strongest first
pub fn co_occurrence(
    map: &PatternFrequencyMap,
    floor: u64,
) -> Vec<CoOccurrencePattern>
{
    let floor = floor.max(1);
    let mut patterns = Vec::new();

    for a in sort(map, SortOrder::Alphabetical)
    {
        for (other, &count) in &a.co_occurrences
        {
            if *other <= a.class_name
            {
                continue;
            }
            let Some(b) = map.get(other)
            else
            {
                continue;
            };

            // Explicit extractor counts may be asymmetric
            let reverse = b
                .co_occurrences
                .get(&a.class_name)
                .copied()
                .unwrap_or(0);
            let joint = count.max(reverse);
            if joint < floor
            {
                continue;
            }

            let denom = a
                .total_frequency
                .min(b.total_frequency);
            if denom == 0
            {
                continue;
            }

            patterns.push(CoOccurrencePattern {
                classes: vec![
                    a.class_name
                        .clone(),
                    b.class_name
                        .clone(),
                ],
                joint_frequency: joint,
                strength: (joint as f64 / denom as f64).min(1.0),
                sample_contexts: a
                    .source_files
                    .intersection(&b.source_files)
                    .take(SAMPLE_CONTEXTS)
                    .cloned()
                    .collect(),
            });
        }
    }

    patterns.sort_by(|x, y| {
        y.strength
            .total_cmp(&x.strength)
            .then(
                y.joint_frequency
                    .cmp(&x.joint_frequency),
            )
            .then_with(|| {
                x.classes
                    .cmp(&y.classes)
            })
    });

    debug!(pairs = patterns.len(), floor, "co-occurrence computed");
    patterns
}

/// Classes sharing a utility category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternGroup
{
    pub category: PatternCategory,
    /// Members in ascending order
    pub classes: Vec<String>,
    /// Summed frequency of the distinct members
    pub total_frequency: u64,
}

/// Group classes into (non-exclusive) categories using the default rules
pub fn pattern_groups(map: &PatternFrequencyMap) -> Result<Vec<PatternGroup>, AnalysisError>
{
    let classifier = PatternClassifier::new()?;
    Ok(pattern_groups_with(&classifier, map))
}

/// Group classes with a caller-built classifier
pub fn pattern_groups_with(
    classifier: &PatternClassifier,
    map: &PatternFrequencyMap,
) -> Vec<PatternGroup>
{
    let mut members: BTreeMap<PatternCategory, BTreeSet<&str>> = BTreeMap::new();

    for data in map.values()
    {
        for category in classifier.classify(&data.class_name)
        {
            members
                .entry(category)
                .or_default()
                .insert(&data.class_name);
        }
    }

    members
        .into_iter()
        .map(|(category, classes)| PatternGroup {
            category,
            total_frequency: saturating_total(
                classes
                    .iter()
                    .filter_map(|c| map.get(c))
                    .map(|d| d.total_frequency),
            ),
            classes: classes
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect()
}

/// Byte savings for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCompression
{
    pub class_name: String,
    pub generated_name: String,
    pub original_bytes: usize,
    pub generated_bytes: usize,
    pub frequency: u64,
    /// original / generated
    pub ratio: f64,
    /// (original - generated) * frequency
    pub bytes_saved: i64,
}

/// Size comparison between original classes and their identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats
{
    pub total_original_bytes: usize,
    pub total_generated_bytes: usize,
    /// total original / total generated
    pub overall_compression_ratio: f64,
    /// Same ratio with each class weighted by its frequency
    pub weighted_compression_ratio: f64,
    pub total_bytes_saved: i64,
    pub per_class: Vec<ClassCompression>,
    pub best_compressed: Vec<ClassCompression>,
    pub worst_compressed: Vec<ClassCompression>,
}

fn ratio(
    original: u128,
    generated: u128,
) -> f64
{
    if generated == 0 { 1.0 } else { original as f64 / generated as f64 }
}

/// Compare original class lengths with their generated identifiers
pub fn compression_stats(
    map: &PatternFrequencyMap,
    name_map: &BTreeMap<String, String>,
) -> Result<CompressionStats, AnalysisError>
{
    let mut per_class = Vec::with_capacity(name_map.len());

    for (class, name) in name_map
    {
        let data = map
            .get(class)
            .ok_or_else(|| AnalysisError::UnknownClass(class.clone()))?;

        let original_bytes = class.len();
        let generated_bytes = name.len();
        per_class.push(ClassCompression {
            class_name: class.clone(),
            generated_name: name.clone(),
            original_bytes,
            generated_bytes,
            frequency: data.total_frequency,
            ratio: ratio(original_bytes as u128, generated_bytes as u128),
            bytes_saved: (original_bytes as i64 - generated_bytes as i64)
                .saturating_mul(i64::try_from(data.total_frequency).unwrap_or(i64::MAX)),
        });
    }

    let total_original_bytes: usize = per_class
        .iter()
        .map(|c| c.original_bytes)
        .sum();
    let total_generated_bytes: usize = per_class
        .iter()
        .map(|c| c.generated_bytes)
        .sum();
    let weighted_original = per_class
        .iter()
        .fold(0u128, |acc, c| acc.saturating_add(c.original_bytes as u128 * c.frequency as u128));
    let weighted_generated = per_class
        .iter()
        .fold(0u128, |acc, c| acc.saturating_add(c.generated_bytes as u128 * c.frequency as u128));

    let best_compressed = per_class
        .iter()
        .sorted_by(|a, b| {
            b.ratio
                .total_cmp(&a.ratio)
                .then(
                    b.bytes_saved
                        .cmp(&a.bytes_saved),
                )
                .then_with(|| {
                    a.class_name
                        .cmp(&b.class_name)
                })
        })
        .take(EXTREMES)
        .cloned()
        .collect();
    let worst_compressed = per_class
        .iter()
        .sorted_by(|a, b| {
            a.ratio
                .total_cmp(&b.ratio)
                .then(
                    a.bytes_saved
                        .cmp(&b.bytes_saved),
                )
                .then_with(|| {
                    a.class_name
                        .cmp(&b.class_name)
                })
        })
        .take(EXTREMES)
        .cloned()
        .collect();

    Ok(CompressionStats {
        total_original_bytes,
        total_generated_bytes,
        overall_compression_ratio: ratio(
            total_original_bytes as u128,
            total_generated_bytes as u128,
        ),
        weighted_compression_ratio: ratio(weighted_original, weighted_generated),
        total_bytes_saved: per_class
            .iter()
            .fold(0i64, |acc, c| acc.saturating_add(c.bytes_saved)),
        per_class,
        best_compressed,
        worst_compressed,
    })
}

/// Headline numbers for a frequency map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary
{
    pub total_classes: usize,
    pub total_usage: u64,
    pub mean_frequency: f64,
    pub median_frequency: f64,
    /// (class, frequency), most frequent first
    pub top_classes: Vec<(String, u64)>,
    /// source type label -> class count
    pub source_types: BTreeMap<String, usize>,
}

pub fn summarize(
    map: &PatternFrequencyMap,
    top: usize,
) -> AnalysisSummary
{
    let sorted = sort(map, SortOrder::FrequencyDesc);
    let total_usage = map.total_usage();

    let mut freqs: Vec<u64> = sorted
        .iter()
        .map(|d| d.total_frequency)
        .collect();
    freqs.sort_unstable();
    let median_frequency = match freqs.len()
    {
        0 => 0.0,
        n if n % 2 == 1 => freqs[n / 2] as f64,
        n => (freqs[n / 2 - 1] as f64 + freqs[n / 2] as f64) / 2.0,
    };

    let source_types = sorted
        .iter()
        .map(|d| {
            d.source_type
                .to_string()
        })
        .counts()
        .into_iter()
        .collect();

    AnalysisSummary {
        total_classes: map.len(),
        total_usage,
        mean_frequency: if map.is_empty() { 0.0 } else { total_usage as f64 / map.len() as f64 },
        median_frequency,
        top_classes: sorted
            .iter()
            .take(top)
            .map(|d| {
                (
                    d.class_name
                        .clone(),
                    d.total_frequency,
                )
            })
            .collect(),
        source_types,
    }
}

/// Knobs for a full [`analyze`] report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeOptions
{
    /// Minimum joint count for a reported co-occurrence pair
    pub co_occurrence_floor: u64,
    /// Entries kept in top-N lists
    pub top: usize,
}

impl Default for AnalyzeOptions
{
    fn default() -> Self
    {
        Self { co_occurrence_floor: 2, top: 10 }
    }
}

/// Bucket summary without member lists, for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary
{
    pub name_length: usize,
    pub capacity: u64,
    pub class_count: usize,
    pub total_frequency: u64,
}

impl From<&FrequencyBucket> for BucketSummary
{
    fn from(b: &FrequencyBucket) -> Self
    {
        Self {
            name_length: b.name_length,
            capacity: b.capacity,
            class_count: b
                .classes
                .len(),
            total_frequency: b.total_frequency,
        }
    }
}

/// Everything the analyzer knows about a map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport
{
    pub summary: AnalysisSummary,
    pub buckets: Vec<BucketSummary>,
    pub co_occurrences: Vec<CoOccurrencePattern>,
    pub pattern_groups: Vec<PatternGroup>,
}

/// Full analysis pass for a given alphabet size
pub fn analyze(
    map: &PatternFrequencyMap,
    alphabet_len: usize,
    options: &AnalyzeOptions,
) -> Result<AnalysisReport, AnalysisError>
{
    let sorted = sort(map, SortOrder::FrequencyDesc);
    let buckets = bucket_by_frequency(&sorted, alphabet_len)?;

    let mut co = co_occurrence(map, options.co_occurrence_floor);
    co.truncate(options.top);

    let mut groups = pattern_groups(map)?;
    groups.sort_by_key(|g| (Reverse(g.total_frequency), g.category));

    Ok(AnalysisReport {
        summary: summarize(map, options.top),
        buckets: buckets
            .iter()
            .map(BucketSummary::from)
            .collect(),
        co_occurrences: co,
        pattern_groups: groups,
    })
}
