//! Generation options and the strategy/policy selectors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::error::NameGenError;
use crate::core::names::alphabet::Alphabet;

/// Default alphabet: lowercase ASCII letters
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Identifier assignment strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy
{
    /// Spreadsheet-column counting over alphabetically ordered classes
    Sequential,
    /// Shortest identifiers for the most frequent classes
    #[default]
    FrequencyOptimized,
    /// Scored permutations without repeated characters
    Pretty,
    /// Pretty names for the hottest classes, frequency-optimized for the rest
    Hybrid,
}

impl std::fmt::Display for Strategy
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        let s = match self
        {
            Strategy::Sequential => "sequential",
            Strategy::FrequencyOptimized => "frequency-optimized",
            Strategy::Pretty => "pretty",
            Strategy::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

/// What to do once every pretty candidate up to `max_length` is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustionPolicy
{
    /// Continue with sequential identifiers
    #[default]
    Sequential,
    /// Reuse pretty cores with a numeric suffix
    Hybrid,
    /// Fail with `PrettyNameExhaustionError`
    Error,
}

/// Tunable weights for the pretty-name aesthetic heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights
{
    /// Reward for vowel/consonant alternation
    pub alternation: f64,
    /// Reward for starting with a preferred leading character
    pub leading: f64,
    /// Penalty for harsh consonant clusters
    pub cluster_penalty: f64,
    /// Characters that read well at the start of a name
    pub preferred_leading: String,
}

impl Default for ScoreWeights
{
    fn default() -> Self
    {
        Self {
            alternation: 0.5,
            leading: 0.3,
            cluster_penalty: 0.4,
            preferred_leading: "abcdefghlmnoprst".to_string(),
        }
    }
}

/// Pretty-strategy knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrettyOptions
{
    /// Longest core length considered (inclusive)
    pub max_length: usize,
    /// Exhaust each length tier before moving to longer names
    pub prefer_shorter: bool,
    pub exhaustion_policy: ExhaustionPolicy,
    pub weights: ScoreWeights,
}

impl Default for PrettyOptions
{
    fn default() -> Self
    {
        Self {
            max_length: 3,
            prefer_shorter: true,
            exhaustion_policy: ExhaustionPolicy::Sequential,
            weights: ScoreWeights::default(),
        }
    }
}

/// Everything that shapes one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions
{
    /// Characters identifiers are built from, in counting order
    pub alphabet: String,
    pub strategy: Strategy,
    /// Render sequential identifiers as `<char><round>` instead of bijective base-N
    pub numeric_suffix: bool,
    /// First sequential index to hand out
    pub start_index: u64,
    /// Classes used fewer times than this get no identifier
    pub frequency_threshold: u64,
    /// Names that must never be generated (in addition to CSS keywords)
    pub reserved_names: BTreeSet<String>,
    /// Keep identifiers already present in a seeded cache
    pub use_cache: bool,
    /// Classes processed per chunk
    pub batch_size: usize,
    pub prefix: String,
    pub suffix: String,
    /// Reject candidates that are not valid CSS identifiers
    pub enforce_css_validity: bool,
    /// Consecutive rejections tolerated; defaults to alphabet size + used names
    pub max_collision_retries: Option<usize>,
    pub pretty: PrettyOptions,
}

impl Default for GenerationOptions
{
    fn default() -> Self
    {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            strategy: Strategy::FrequencyOptimized,
            numeric_suffix: false,
            start_index: 0,
            frequency_threshold: 1,
            reserved_names: BTreeSet::new(),
            use_cache: true,
            batch_size: 500,
            prefix: String::new(),
            suffix: String::new(),
            enforce_css_validity: true,
            max_collision_retries: None,
            pretty: PrettyOptions::default(),
        }
    }
}

impl GenerationOptions
{
    pub fn with_strategy(
        mut self,
        strategy: Strategy,
    ) -> Self
    {
        self.strategy = strategy;
        self
    }

    pub fn with_alphabet(
        mut self,
        alphabet: impl Into<String>,
    ) -> Self
    {
        self.alphabet = alphabet.into();
        self
    }

    pub fn with_reserved<I, S>(
        mut self,
        names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names
            .extend(
                names
                    .into_iter()
                    .map(Into::into),
            );
        self
    }

    pub fn with_threshold(
        mut self,
        threshold: u64,
    ) -> Self
    {
        self.frequency_threshold = threshold;
        self
    }

    pub fn with_affixes(
        mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self
    {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    pub fn with_pretty(
        mut self,
        pretty: PrettyOptions,
    ) -> Self
    {
        self.pretty = pretty;
        self
    }

    /// Parse the configured alphabet
    pub fn parsed_alphabet(&self) -> Result<Alphabet, NameGenError>
    {
        Alphabet::new(&self.alphabet)
    }

    /// Consecutive-rejection budget given the current cache occupancy
    pub fn retry_budget(
        &self,
        alphabet_len: usize,
        used_names: usize,
    ) -> usize
    {
        self.max_collision_retries
            .unwrap_or(alphabet_len + used_names)
            .max(1)
    }

    /// Reject option combinations the engine cannot honor
    pub fn validate(&self) -> Result<(), NameGenError>
    {
        if self.batch_size == 0
        {
            return Err(NameGenError::generation("batch_size must be at least 1"));
        }

        if self
            .pretty
            .max_length
            == 0
        {
            return Err(NameGenError::generation("pretty.max_length must be at least 1"));
        }

        Ok(())
    }
}
