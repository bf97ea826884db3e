//! Output of a generation run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::analyze::{BucketSummary, ClassCompression};
use crate::core::collision::CacheStats;
use crate::core::names::options::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata
{
    pub strategy: Strategy,
    pub total_names: usize,
    pub duration_ms: u64,
    pub overall_compression_ratio: f64,
    /// Set when the pretty pool ran dry and a fallback took over
    pub fallback_strategy: Option<Strategy>,
    /// Classes that kept an identifier from the seeded cache
    pub reused_from_cache: usize,
    /// Whole result served from an incremental store
    #[serde(default)]
    pub from_store: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatistics
{
    /// identifier length -> count
    pub length_distribution: BTreeMap<usize, usize>,
    pub frequency_buckets: Vec<BucketSummary>,
    pub best_compressed: Vec<ClassCompression>,
    pub worst_compressed: Vec<ClassCompression>,
    pub cache: CacheStats,
}

/// Class -> identifier assignment plus reporting data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult
{
    pub name_map: BTreeMap<String, String>,
    pub reverse_map: BTreeMap<String, String>,
    /// Identifiers in assignment order
    pub generated_names: Vec<String>,
    pub metadata: GenerationMetadata,
    pub statistics: GenerationStatistics,
}

impl GenerationResult
{
    pub fn is_empty(&self) -> bool
    {
        self.name_map
            .is_empty()
    }

    /// Identifier for `class`, if one was assigned
    pub fn name_for(
        &self,
        class: &str,
    ) -> Option<&str>
    {
        self.name_map
            .get(class)
            .map(String::as_str)
    }
}
