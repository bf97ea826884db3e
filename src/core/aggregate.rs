//! Merge per-file extraction records into one frequency map.
//!
//! Each file is folded into a partial map independently (in parallel), then
//! partials are merged pairwise. The merge is associative and commutative:
//! frequencies and co-occurrences add, file sets union, and context lists
//! keep the `max_contexts` smallest entries under a fixed sort key, so the
//! final map does not depend on rayon's scheduling.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, instrument};

use crate::core::error::{AggregationError, RecordSource};
use crate::core::records::{HtmlExtraction, JsxExtraction, split_classes};

/// Which extractors reported a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType
{
    HtmlOnly,
    JsxOnly,
    Mixed,
}

impl SourceType
{
    fn combine(
        self,
        other: SourceType,
    ) -> SourceType
    {
        if self == other { self } else { SourceType::Mixed }
    }
}

impl std::fmt::Display for SourceType
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            SourceType::HtmlOnly => write!(f, "html-only"),
            SourceType::JsxOnly => write!(f, "jsx-only"),
            SourceType::Mixed => write!(f, "mixed"),
        }
    }
}

/// A single recorded usage site
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum UsageContext
{
    #[serde(rename_all = "camelCase")]
    Html
    {
        file: String,
        tag_name: String,
        depth: u32,
    },
    #[serde(rename_all = "camelCase")]
    Jsx
    {
        file: String,
        line_number: u32,
        framework: Option<String>,
        extraction_type: Option<String>,
    },
}

impl UsageContext
{
    pub fn file(&self) -> &str
    {
        match self
        {
            UsageContext::Html { file, .. } | UsageContext::Jsx { file, .. } => file,
        }
    }

    fn position(&self) -> u32
    {
        match self
        {
            UsageContext::Html { depth, .. } => *depth,
            UsageContext::Jsx { line_number, .. } => *line_number,
        }
    }
}

/// Deterministic truncation: sort by (file, position, full value), dedup, keep `max`
fn normalize_contexts(
    contexts: &mut Vec<UsageContext>,
    max: usize,
)
{
    contexts.sort_by(|a, b| {
        a.file()
            .cmp(b.file())
            .then(
                a.position()
                    .cmp(&b.position()),
            )
            .then_with(|| a.cmp(b))
    });
    contexts.dedup();
    contexts.truncate(max);
}

/// Everything known about one class after aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedClassData
{
    pub class_name: String,
    pub total_frequency: u64,
    pub html_frequency: u64,
    pub jsx_frequency: u64,
    /// Other class -> number of shared usage contexts
    pub co_occurrences: BTreeMap<String, u64>,
    /// Framework -> number of JSX contexts
    pub frameworks: BTreeMap<String, u64>,
    pub source_files: BTreeSet<String>,
    pub contexts: Vec<UsageContext>,
    pub source_type: SourceType,
}

impl AggregatedClassData
{
    pub fn new(
        class_name: impl Into<String>,
        source_type: SourceType,
    ) -> Self
    {
        Self {
            class_name: class_name.into(),
            total_frequency: 0,
            html_frequency: 0,
            jsx_frequency: 0,
            co_occurrences: BTreeMap::new(),
            frameworks: BTreeMap::new(),
            source_files: BTreeSet::new(),
            contexts: Vec::new(),
            source_type,
        }
    }

    /// Fold `other` (same class) into `self`.
    ///
    /// Frequencies that overflow are an error; co-occurrence and framework
    /// counts saturate.
    fn absorb(
        &mut self,
        other: AggregatedClassData,
        max_contexts: usize,
    ) -> Result<(), AggregationError>
    {
        let overflow = || AggregationError::FrequencyOverflow {
            class: self
                .class_name
                .clone(),
        };
        let total = self
            .total_frequency
            .checked_add(other.total_frequency)
            .ok_or_else(overflow)?;
        let html = self
            .html_frequency
            .checked_add(other.html_frequency)
            .ok_or_else(overflow)?;
        let jsx = self
            .jsx_frequency
            .checked_add(other.jsx_frequency)
            .ok_or_else(overflow)?;
        self.total_frequency = total;
        self.html_frequency = html;
        self.jsx_frequency = jsx;

        for (class, count) in other.co_occurrences
        {
            bump(&mut self.co_occurrences, class, count);
        }
        for (framework, count) in other.frameworks
        {
            bump(&mut self.frameworks, framework, count);
        }

        self.source_files
            .extend(other.source_files);
        self.contexts
            .extend(other.contexts);
        normalize_contexts(&mut self.contexts, max_contexts);
        self.source_type = self
            .source_type
            .combine(other.source_type);
        Ok(())
    }

    /// Number of distinct classes this one shares a context with
    pub fn co_occurrence_degree(&self) -> usize
    {
        self.co_occurrences
            .len()
    }
}

/// Aggregated class data keyed by class name.
///
/// The container has no iteration-order guarantee; callers sort explicitly.
/// Serialization always emits keys in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PatternFrequencyMap
{
    classes: HashMap<String, AggregatedClassData>,
}

impl Serialize for PatternFrequencyMap
{
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    {
        let ordered: BTreeMap<&String, &AggregatedClassData> = self
            .classes
            .iter()
            .collect();
        ordered.serialize(serializer)
    }
}

impl PatternFrequencyMap
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn len(&self) -> usize
    {
        self.classes
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.classes
            .is_empty()
    }

    pub fn get(
        &self,
        class: &str,
    ) -> Option<&AggregatedClassData>
    {
        self.classes
            .get(class)
    }

    pub fn contains(
        &self,
        class: &str,
    ) -> bool
    {
        self.classes
            .contains_key(class)
    }

    /// Insert or replace the entry for `data.class_name`
    pub fn insert(
        &mut self,
        data: AggregatedClassData,
    )
    {
        self.classes
            .insert(
                data.class_name
                    .clone(),
                data,
            );
    }

    /// Unordered view of every entry
    pub fn values(&self) -> impl Iterator<Item = &AggregatedClassData>
    {
        self.classes
            .values()
    }

    /// Class names in ascending order
    pub fn sorted_names(&self) -> Vec<&str>
    {
        let mut names: Vec<&str> = self
            .classes
            .keys()
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Sum of all class frequencies, saturating at `u64::MAX`
    pub fn total_usage(&self) -> u64
    {
        self.classes
            .values()
            .fold(0u64, |acc, d| acc.saturating_add(d.total_frequency))
    }
}

impl FromIterator<AggregatedClassData> for PatternFrequencyMap
{
    fn from_iter<T: IntoIterator<Item = AggregatedClassData>>(iter: T) -> Self
    {
        let mut map = PatternFrequencyMap::new();
        for data in iter
        {
            map.insert(data);
        }
        map
    }
}

/// Aggregation knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions
{
    /// When false, class names are folded to lowercase before merging
    pub case_sensitive: bool,
    /// Classes whose merged frequency is below this are dropped
    pub minimum_frequency: u64,
    /// Usage contexts kept per class
    pub max_contexts: usize,
}

impl Default for AggregateOptions
{
    fn default() -> Self
    {
        Self { case_sensitive: true, minimum_frequency: 1, max_contexts: 10 }
    }
}

impl AggregateOptions
{
    fn key(
        &self,
        class: &str,
    ) -> String
    {
        if self.case_sensitive { class.to_string() } else { class.to_lowercase() }
    }
}

type Partial = HashMap<String, AggregatedClassData>;

/// Merge HTML and JSX extraction output into one frequency map.
///
/// Structurally invalid records fail the whole call; an empty but
/// well-formed input yields an empty map.
#[instrument(level = "debug", skip_all, fields(html_files = html.len(), jsx_files = jsx.len()))]
pub fn aggregate(
    html: &[HtmlExtraction],
    jsx: &[JsxExtraction],
    options: &AggregateOptions,
) -> Result<PatternFrequencyMap, AggregationError>
{
    validate_html(html)?;
    validate_jsx(jsx)?;

    let merged: Partial = html
        .par_iter()
        .map(|file| partial_from_html(file, options))
        .chain(
            jsx.par_iter()
                .map(|file| partial_from_jsx(file, options)),
        )
        .try_reduce(Partial::new, |a, b| merge_partials(a, b, options.max_contexts))?;

    let before = merged.len();
    let mut kept: Partial = merged
        .into_iter()
        .filter(|(_, data)| data.total_frequency >= options.minimum_frequency)
        .collect();

    // Co-occurrence edges may only point at surviving classes
    let survivors: BTreeSet<String> = kept
        .keys()
        .cloned()
        .collect();
    for data in kept.values_mut()
    {
        data.co_occurrences
            .retain(|other, _| survivors.contains(other));
    }

    info!(
        classes = kept.len(),
        dropped = before - kept.len(),
        min_frequency = options.minimum_frequency,
        "aggregated class usage"
    );

    Ok(PatternFrequencyMap { classes: kept })
}

fn invalid(
    origin: RecordSource,
    file: &str,
    index: usize,
    reason: &str,
) -> AggregationError
{
    AggregationError::InvalidRecord {
        origin,
        file: file.to_string(),
        index,
        reason: reason.to_string(),
    }
}

fn validate_html(files: &[HtmlExtraction]) -> Result<(), AggregationError>
{
    for (file_idx, file) in files
        .iter()
        .enumerate()
    {
        if file
            .file_path
            .trim()
            .is_empty()
        {
            return Err(invalid(RecordSource::Html, "<unnamed>", file_idx, "missing filePath"));
        }
        for (i, usage) in file
            .classes
            .iter()
            .enumerate()
        {
            if usage
                .class_name
                .trim()
                .is_empty()
            {
                return Err(invalid(RecordSource::Html, &file.file_path, i, "missing className"));
            }
            if usage
                .contexts
                .iter()
                .any(|c| {
                    c.tag_name
                        .trim()
                        .is_empty()
                })
            {
                return Err(invalid(
                    RecordSource::Html,
                    &file.file_path,
                    i,
                    "context without tagName",
                ));
            }
        }
    }
    Ok(())
}

fn validate_jsx(files: &[JsxExtraction]) -> Result<(), AggregationError>
{
    for (file_idx, file) in files
        .iter()
        .enumerate()
    {
        if file
            .file_path
            .trim()
            .is_empty()
        {
            return Err(invalid(RecordSource::Jsx, "<unnamed>", file_idx, "missing filePath"));
        }
        for (i, usage) in file
            .classes
            .iter()
            .enumerate()
        {
            if usage
                .class_name
                .trim()
                .is_empty()
            {
                return Err(invalid(RecordSource::Jsx, &file.file_path, i, "missing className"));
            }
        }
    }
    Ok(())
}

/// Saturating `map[key] += count`
fn bump(
    map: &mut BTreeMap<String, u64>,
    key: String,
    count: u64,
)
{
    let slot = map
        .entry(key)
        .or_insert(0);
    *slot = slot.saturating_add(count);
}

/// Count every other class in one context's class list once
fn add_context_co_occurrences(
    data: &mut AggregatedClassData,
    class_list: &str,
    options: &AggregateOptions,
)
{
    let others: BTreeSet<String> = split_classes(class_list)
        .map(|c| options.key(c))
        .filter(|c| *c != data.class_name)
        .collect();

    for other in others
    {
        bump(&mut data.co_occurrences, other, 1);
    }
}

fn add_explicit_co_occurrences(
    data: &mut AggregatedClassData,
    explicit: &BTreeMap<String, u64>,
    options: &AggregateOptions,
)
{
    for (other, count) in explicit
    {
        let other = options.key(other);
        if other != data.class_name
        {
            bump(&mut data.co_occurrences, other, *count);
        }
    }
}

fn insert_partial(
    partial: &mut Partial,
    data: AggregatedClassData,
    max_contexts: usize,
) -> Result<(), AggregationError>
{
    match partial.get_mut(&data.class_name)
    {
        Some(existing) => existing.absorb(data, max_contexts),
        None =>
        {
            partial.insert(
                data.class_name
                    .clone(),
                data,
            );
            Ok(())
        }
    }
}

fn partial_from_html(
    file: &HtmlExtraction,
    options: &AggregateOptions,
) -> Result<Partial, AggregationError>
{
    let mut partial = Partial::new();

    for usage in &file.classes
    {
        let mut data = AggregatedClassData::new(options.key(&usage.class_name), SourceType::HtmlOnly);
        data.html_frequency = usage.frequency;
        data.total_frequency = usage.frequency;
        data.source_files
            .insert(
                file.file_path
                    .clone(),
            );

        for ctx in &usage.contexts
        {
            if let Some(list) = ctx.class_list()
            {
                add_context_co_occurrences(&mut data, list, options);
            }
            data.contexts
                .push(UsageContext::Html {
                    file: file
                        .file_path
                        .clone(),
                    tag_name: ctx
                        .tag_name
                        .clone(),
                    depth: ctx.depth,
                });
        }
        add_explicit_co_occurrences(&mut data, &usage.co_occurrences, options);
        normalize_contexts(&mut data.contexts, options.max_contexts);

        insert_partial(&mut partial, data, options.max_contexts)?;
    }

    Ok(partial)
}

fn partial_from_jsx(
    file: &JsxExtraction,
    options: &AggregateOptions,
) -> Result<Partial, AggregationError>
{
    let mut partial = Partial::new();

    for usage in &file.classes
    {
        let mut data = AggregatedClassData::new(options.key(&usage.class_name), SourceType::JsxOnly);
        data.jsx_frequency = usage.frequency;
        data.total_frequency = usage.frequency;
        data.source_files
            .insert(
                file.file_path
                    .clone(),
            );

        for ctx in &usage.contexts
        {
            add_context_co_occurrences(&mut data, &ctx.pattern, options);
            if let Some(framework) = &ctx.framework
            {
                bump(&mut data.frameworks, framework.clone(), 1);
            }
            data.contexts
                .push(UsageContext::Jsx {
                    file: file
                        .file_path
                        .clone(),
                    line_number: ctx.line_number,
                    framework: ctx
                        .framework
                        .clone(),
                    extraction_type: ctx
                        .extraction_type
                        .clone(),
                });
        }
        add_explicit_co_occurrences(&mut data, &usage.co_occurrences, options);
        normalize_contexts(&mut data.contexts, options.max_contexts);

        insert_partial(&mut partial, data, options.max_contexts)?;
    }

    Ok(partial)
}

/// Merge the smaller partial into the larger one
fn merge_partials(
    a: Partial,
    b: Partial,
    max_contexts: usize,
) -> Result<Partial, AggregationError>
{
    let (mut big, small) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    debug!(into = big.len(), from = small.len(), "merging partial maps");

    for (_, data) in small
    {
        insert_partial(&mut big, data, max_contexts)?;
    }

    Ok(big)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::records::{HtmlClassUsage, HtmlContext, JsxClassUsage, JsxContext};

    fn html_usage(
        class: &str,
        frequency: u64,
        class_attr: &str,
    ) -> HtmlClassUsage
    {
        HtmlClassUsage {
            class_name: class.to_string(),
            frequency,
            contexts: vec![HtmlContext {
                tag_name: "div".to_string(),
                attributes: [("class".to_string(), class_attr.to_string())]
                    .into_iter()
                    .collect(),
                depth: 1,
            }],
            co_occurrences: BTreeMap::new(),
        }
    }

    #[test]
    fn context_class_lists_produce_symmetric_co_occurrence()
    {
        let html = vec![HtmlExtraction {
            file_path: "index.html".to_string(),
            classes: vec![html_usage("flex", 1, "flex p-4"), html_usage("p-4", 1, "flex p-4")],
        }];

        let map = aggregate(&html, &[], &AggregateOptions::default()).unwrap();
        assert_eq!(map.get("flex").unwrap().co_occurrences.get("p-4"), Some(&1));
        assert_eq!(map.get("p-4").unwrap().co_occurrences.get("flex"), Some(&1));
    }

    #[test]
    fn frameworks_are_counted_per_context()
    {
        let jsx = vec![JsxExtraction {
            file_path: "App.tsx".to_string(),
            classes: vec![JsxClassUsage {
                class_name: "flex".to_string(),
                frequency: 2,
                contexts: vec![
                    JsxContext {
                        pattern: "flex".to_string(),
                        line_number: 4,
                        framework: Some("react".to_string()),
                        extraction_type: None,
                    },
                    JsxContext {
                        pattern: "flex gap-2".to_string(),
                        line_number: 9,
                        framework: Some("react".to_string()),
                        extraction_type: None,
                    },
                ],
                co_occurrences: BTreeMap::new(),
            }],
        }];

        let map = aggregate(&[], &jsx, &AggregateOptions { minimum_frequency: 0, ..Default::default() })
            .unwrap();
        let flex = map
            .get("flex")
            .unwrap();
        assert_eq!(flex.frameworks.get("react"), Some(&2));
        assert_eq!(flex.source_type, SourceType::JsxOnly);
        assert_eq!(flex.contexts.len(), 2);
    }

    #[test]
    fn serialization_orders_keys()
    {
        let map: PatternFrequencyMap = ["zeta", "alpha", "mid"]
            .into_iter()
            .map(|c| AggregatedClassData::new(c, SourceType::HtmlOnly))
            .collect();

        let json = serde_json::to_string(&map).unwrap();
        let a = json.find("\"alpha\"").unwrap();
        let m = json.find("\"mid\"").unwrap();
        let z = json.find("\"zeta\"").unwrap();
        assert!(a < m && m < z);

        let back: PatternFrequencyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
