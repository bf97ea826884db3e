//! Error taxonomy for aggregation, analysis, and name generation.
//!
//! Every failure mode is a distinct type so callers can match on it instead
//! of inspecting message strings. The name-generation errors are grouped
//! under [`NameGenError`]; aggregation and analysis have their own enums.

use std::path::PathBuf;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};

use crate::core::names::Strategy;

/// Which upstream producer a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource
{
    Html,
    Jsx,
}

impl std::fmt::Display for RecordSource
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            RecordSource::Html => write!(f, "html"),
            RecordSource::Jsx => write!(f, "jsx"),
        }
    }
}

/// Failures while merging extraction records
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum AggregationError
{
    /// A record is present but structurally unusable
    #[error("invalid {origin} record #{index} in '{file}': {reason}")]
    #[diagnostic(
        code(classpack::aggregate::invalid_record),
        help("every record needs a non-empty className and every file a non-empty filePath")
    )]
    InvalidRecord
    {
        origin: RecordSource,
        file: String,
        index: usize,
        reason: String,
    },

    /// Summed frequencies for one class exceed `u64`
    #[error("frequency of class '{class}' overflows when merged")]
    #[diagnostic(
        code(classpack::aggregate::frequency_overflow),
        help("an extractor reported an implausible frequency; check the input records")
    )]
    FrequencyOverflow
    {
        class: String
    },

    /// The serialized input could not be decoded at all
    #[error("malformed extraction input: {message}")]
    #[diagnostic(code(classpack::aggregate::malformed))]
    Malformed
    {
        message: String,
        #[source]
        cause: serde_json::Error,
    },
}

/// Failures while deriving statistics from a frequency map
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum AnalysisError
{
    #[error("alphabet must contain at least one character")]
    #[diagnostic(code(classpack::analyze::empty_alphabet))]
    EmptyAlphabet,

    /// A name map refers to a class the frequency map does not know
    #[error("class '{0}' is not present in the frequency map")]
    #[diagnostic(code(classpack::analyze::unknown_class))]
    UnknownClass(String),

    #[error("invalid pattern rule for {category}: {cause}")]
    #[diagnostic(code(classpack::analyze::rule))]
    Rule
    {
        category: String,
        #[source]
        cause: regex::Error,
    },
}

/// Why a candidate is not a usable CSS class identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidNameReason
{
    Empty,
    LeadingDigit,
    LeadingHyphenDigit,
    LoneHyphen,
    Whitespace,
    IllegalCharacter(char),
}

impl std::fmt::Display for InvalidNameReason
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            InvalidNameReason::Empty => write!(f, "identifier is empty"),
            InvalidNameReason::LeadingDigit => write!(f, "identifier starts with a digit"),
            InvalidNameReason::LeadingHyphenDigit =>
            {
                write!(f, "identifier starts with a hyphen followed by a digit")
            }
            InvalidNameReason::LoneHyphen => write!(f, "identifier is a single hyphen"),
            InvalidNameReason::Whitespace => write!(f, "identifier contains whitespace"),
            InvalidNameReason::IllegalCharacter(c) =>
            {
                write!(f, "identifier contains illegal character {c:?}")
            }
        }
    }
}

/// A candidate failed the CSS identifier grammar
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic, thiserror::Error)]
#[error("invalid CSS identifier '{name}': {reason}")]
#[diagnostic(
    code(classpack::names::invalid_name),
    help("identifiers may only use [A-Za-z0-9_-] and must not start with a digit or '-<digit>'")
)]
pub struct InvalidNameError
{
    pub name: String,
    pub reason: InvalidNameReason,
}

/// Too many consecutive candidates were rejected
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic, thiserror::Error)]
#[error(
    "no free identifier after {} consecutive rejections (last conflict: '{conflicting}')",
    .attempted.len()
)]
#[diagnostic(
    code(classpack::names::collision),
    help("enlarge the alphabet, drop reserved names, or raise max_collision_retries")
)]
pub struct CollisionError
{
    /// The candidate that exhausted the retry budget
    pub conflicting: String,
    /// Every candidate rejected in the failing run, in order
    pub attempted: Vec<String>,
}

/// Which cache operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOperation
{
    Load,
    Save,
    Get,
    Set,
    Encode,
    Decode,
}

impl std::fmt::Display for CacheOperation
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        let s = match self
        {
            CacheOperation::Load => "load",
            CacheOperation::Save => "save",
            CacheOperation::Get => "get",
            CacheOperation::Set => "set",
            CacheOperation::Encode => "encode",
            CacheOperation::Decode => "decode",
        };
        f.write_str(s)
    }
}

/// Loading or persisting name mappings failed
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("cache {operation} failed{}: {message}", path_label(.path))]
#[diagnostic(code(classpack::cache))]
pub struct CacheError
{
    pub operation: CacheOperation,
    pub path: Option<PathBuf>,
    pub message: String,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn path_label(path: &Option<PathBuf>) -> String
{
    path.as_ref()
        .map(|p| format!(" for {}", p.display()))
        .unwrap_or_default()
}

impl CacheError
{
    pub fn new(
        operation: CacheOperation,
        message: impl Into<String>,
    ) -> Self
    {
        Self { operation, path: None, message: message.into(), cause: None }
    }

    pub fn with_path(
        mut self,
        path: impl Into<PathBuf>,
    ) -> Self
    {
        self.path = Some(path.into());
        self
    }

    pub fn with_cause(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self
    {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Pretty-name space ran out and the policy did not allow recovery
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic, thiserror::Error)]
#[error(
    "pretty names exhausted at max length {max_length} after {generated} names (fallbacks tried: {})",
    fallbacks_label(.attempted_fallbacks)
)]
#[diagnostic(
    code(classpack::names::pretty_exhausted),
    help("raise pretty.max_length or set pretty.exhaustion_policy to 'sequential' or 'hybrid'")
)]
pub struct PrettyNameExhaustionError
{
    pub max_length: usize,
    pub generated: usize,
    pub attempted_fallbacks: Vec<Strategy>,
}

fn fallbacks_label(strategies: &[Strategy]) -> String
{
    if strategies.is_empty()
    {
        return "none".to_string();
    }

    strategies
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Top-level error for the name generation engine
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum NameGenError
{
    /// Generic failure, optionally wrapping the underlying cause
    #[error("name generation failed: {message}")]
    #[diagnostic(code(classpack::names::generation))]
    Generation
    {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Collision(#[from] CollisionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidName(#[from] InvalidNameError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PrettyExhaustion(#[from] PrettyNameExhaustionError),
}

impl NameGenError
{
    /// Plain generation failure without a cause
    pub fn generation(message: impl Into<String>) -> Self
    {
        NameGenError::Generation { message: message.into(), cause: None }
    }

    /// Generation failure caused by another error
    pub fn caused_by(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self
    {
        NameGenError::Generation { message: message.into(), cause: Some(Box::new(cause)) }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn collision_message_counts_attempts()
    {
        let err = CollisionError {
            conflicting: "b".to_string(),
            attempted: vec!["a".to_string(), "b".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("2 consecutive"));
        assert!(msg.contains("'b'"));
    }

    #[test]
    fn exhaustion_message_lists_fallbacks()
    {
        let err = PrettyNameExhaustionError {
            max_length: 2,
            generated: 12,
            attempted_fallbacks: vec![Strategy::Hybrid],
        };

        assert!(
            err.to_string()
                .contains("hybrid")
        );

        let none = PrettyNameExhaustionError { attempted_fallbacks: vec![], ..err };
        assert!(
            none.to_string()
                .contains("none")
        );
    }

    #[test]
    fn cache_error_mentions_path()
    {
        let err = CacheError::new(CacheOperation::Load, "bad json").with_path("names.json");
        let msg = err.to_string();
        assert!(msg.starts_with("cache load failed for names.json"));
    }

    #[test]
    fn name_gen_error_variants_are_distinguishable()
    {
        let err: NameGenError = InvalidNameError {
            name: "1a".to_string(),
            reason: InvalidNameReason::LeadingDigit,
        }
        .into();

        assert!(matches!(err, NameGenError::InvalidName(_)));
    }
}
