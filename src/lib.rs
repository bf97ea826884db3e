//! **classpack** - Utility-class frequency analysis and short class name generation
//!
//! Merges per-file class extraction records into a frequency map, reports on
//! usage patterns, and assigns every class a compact, collision-free identifier.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Subcommand drivers
pub mod cli_ext {
    /// Bundles in, frequency map out
    pub mod aggregate_cmd;
    pub use aggregate_cmd::{load_map, run as aggregate_run};

    /// Frequency, bucket and co-occurrence reports
    pub mod analyze_cmd;
    pub use analyze_cmd::run as analyze_run;

    /// Identifier assignment with cache file and result store
    pub mod generate_cmd;
    pub use generate_cmd::run as generate_run;
}

/// Core pipeline - aggregation, analysis and name generation
pub mod core {
    /// Error taxonomy with miette diagnostics
    pub mod error;
    pub use error::{
        AggregationError, AnalysisError, CacheError, CollisionError, InvalidNameError,
        NameGenError, PrettyNameExhaustionError,
    };

    /// Extraction record shapes (HTML and JSX)
    pub mod records;
    pub use records::{ExtractionBundle, HtmlExtraction, JsxExtraction};

    /// Merging records into a per-class frequency map
    pub mod aggregate;
    pub use aggregate::{AggregateOptions, AggregatedClassData, PatternFrequencyMap, aggregate};

    /// Utility-class category rules
    pub mod patterns;
    pub use patterns::{PatternCategory, PatternClassifier};

    /// Sorting, bucketing, co-occurrence and compression reports
    pub mod analyze;
    pub use analyze::{AnalysisReport, AnalyzeOptions, SortOrder, analyze};

    /// Used-name bookkeeping and cache seeding
    pub mod collision;
    pub use collision::{CacheStats, NameCollisionCache};

    /// Whole-result reuse keyed by input fingerprint
    pub mod store;
    pub use store::{CacheStore, MemoryStore, fingerprint, generate_with_store};

    /// Name generation engine
    pub mod names {
        /// Alphabet handling and bijective base-N counting
        pub mod alphabet;
        pub use alphabet::{Alphabet, from_base26, to_base26};

        /// Generation options and strategy selection
        pub mod options;
        pub use options::{
            DEFAULT_ALPHABET, ExhaustionPolicy, GenerationOptions, PrettyOptions, ScoreWeights,
            Strategy,
        };

        /// CSS identifier grammar and keyword checks
        pub mod validate;
        pub use validate::{is_css_keyword, validate_css_identifier};

        /// Counting-order candidates and shared acquisition loop
        pub mod sequential;
        pub use sequential::{NameLayout, generate_sequential_names, next_available_name};

        /// Scored pronounceable names and exhaustion fallback
        pub mod pretty;
        pub use pretty::{MAX_POOL_SIZE, PrettyPool, aesthetic_score, score};

        /// Frequency-first assignment order
        pub mod frequency;

        /// Pretty head, sequential tail
        pub mod hybrid;
        pub use hybrid::pretty_head_size;

        /// Generation output shapes
        pub mod result;
        pub use result::{GenerationMetadata, GenerationResult, GenerationStatistics};

        /// Strategy dispatch and statistics
        pub mod engine;
        pub use engine::generate;
    }
}

/// Infrastructure - Configuration, I/O and persistence
pub mod infra {
    /// Layered configuration (file candidates + CLASSPACK_* environment)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped bundle reading and JSON output
    pub mod io;
    pub use io::{FileContent, read_file_smart};

    /// Name cache file and directory-backed result store
    pub mod cache_file;
    pub use cache_file::{FileStore, load_name_cache, save_name_cache};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use cli_ext::{aggregate_run, analyze_run, generate_run};
pub use infra::{Config, load_config};

// Core types for external consumers
pub use core::names::{GenerationOptions, GenerationResult, Strategy, generate};
pub use core::{NameCollisionCache, PatternFrequencyMap, aggregate};
