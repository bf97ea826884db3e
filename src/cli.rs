use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::analyze::SortOrder;
use crate::core::names::{ExhaustionPolicy, Strategy};

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub quiet: bool,              // global --quiet
    pub no_color: bool,           // global --no-color
    pub dry_run: bool,            // global --dry-run
    pub verbose: bool,            // global --verbose
    pub config: Option<PathBuf>,  // global --config
}

impl AppContext {
    /// Apply `paint` unless --no-color was given
    pub fn styled<F: FnOnce(&str) -> String>(&self, text: &str, paint: F) -> String {
        if self.no_color {
            text.to_string()
        } else {
            paint(text)
        }
    }
}

#[derive(Parser)]
#[command(name = "cpk")]
#[command(about = "Analyze utility-class usage and generate compact, collision-free class names")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without writing files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging (overridden by CPK_LOG / RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Explicit config file (default: classpack.toml in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Context shared by every command
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            dry_run: self.dry_run,
            verbose: self.verbose,
            config: self.config.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge extraction records into a class frequency map
    Aggregate(AggregateArgs),

    /// Report frequencies, buckets, co-occurrence and pattern groups
    Analyze(AnalyzeArgs),

    /// Assign a generated identifier to every class
    Generate(GenerateArgs),

    /// Initialize a classpack.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where the frequency map comes from
#[derive(Parser, Debug, Clone)]
pub struct InputArgs {
    /// Extraction bundle JSON files ({"html": [...], "jsx": [...]})
    #[arg(value_name = "BUNDLE", required_unless_present = "map")]
    pub inputs: Vec<PathBuf>,

    /// Use a frequency map written by `cpk aggregate` instead of bundles
    #[arg(long, value_name = "FILE", conflicts_with = "inputs")]
    pub map: Option<PathBuf>,

    /// Drop classes used fewer times than this
    #[arg(long)]
    pub min_frequency: Option<u64>,

    /// Fold class names to lowercase before merging
    #[arg(long)]
    pub case_insensitive: bool,
}

#[derive(Parser, Debug)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Usage contexts kept per class
    #[arg(long)]
    pub max_contexts: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Ordering for the class listing
    #[arg(long, value_enum, default_value_t = SortArg::FrequencyDesc)]
    pub sort: SortArg,

    /// Entries shown in top-N lists
    #[arg(long)]
    pub top: Option<usize>,

    /// Minimum joint count for a co-occurrence pair
    #[arg(long)]
    pub min_co_occurrence: Option<u64>,

    /// Alphabet used for length buckets
    #[arg(long)]
    pub alphabet: Option<String>,

    /// Name map (class -> identifier JSON) to report compression for
    #[arg(long, value_name = "FILE")]
    pub names: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Naming strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Identifier characters in counting order
    #[arg(long)]
    pub alphabet: Option<String>,

    /// Prepended to every identifier
    #[arg(long)]
    pub prefix: Option<String>,

    /// Appended to every identifier
    #[arg(long)]
    pub suffix: Option<String>,

    /// Minimum class frequency to receive an identifier
    #[arg(long)]
    pub threshold: Option<u64>,

    /// Names that must never be generated (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub reserved: Vec<String>,

    /// Render sequential names as letter + round number (a, b, ..., a1, b1)
    #[arg(long)]
    pub numeric_suffix: bool,

    /// Longest pretty name core
    #[arg(long)]
    pub max_length: Option<usize>,

    /// What to do when pretty names run out
    #[arg(long, value_enum)]
    pub on_exhaustion: Option<ExhaustionArg>,

    /// Name cache file (class -> identifier JSON), read before and written after
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Ignore identifiers from the cache file (they stay reserved)
    #[arg(long)]
    pub no_cache: bool,

    /// Directory for whole-result reuse keyed by input fingerprint
    #[arg(long, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit only the class -> identifier map
    #[arg(long)]
    pub names_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored tables
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Sequential,
    #[value(alias = "frequency")]
    FrequencyOptimized,
    Pretty,
    Hybrid,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::FrequencyOptimized => Strategy::FrequencyOptimized,
            StrategyArg::Pretty => Strategy::Pretty,
            StrategyArg::Hybrid => Strategy::Hybrid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExhaustionArg {
    /// Continue with sequential names
    Sequential,
    /// Reuse pretty names with a numeric suffix
    Hybrid,
    /// Fail the run
    Error,
}

impl From<ExhaustionArg> for ExhaustionPolicy {
    fn from(arg: ExhaustionArg) -> Self {
        match arg {
            ExhaustionArg::Sequential => ExhaustionPolicy::Sequential,
            ExhaustionArg::Hybrid => ExhaustionPolicy::Hybrid,
            ExhaustionArg::Error => ExhaustionPolicy::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    FrequencyDesc,
    FrequencyAsc,
    Alphabetical,
    FileSpread,
    CoOccurrence,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::FrequencyDesc => SortOrder::FrequencyDesc,
            SortArg::FrequencyAsc => SortOrder::FrequencyAsc,
            SortArg::Alphabetical => SortOrder::Alphabetical,
            SortArg::FileSpread => SortOrder::FileSpreadDesc,
            SortArg::CoOccurrence => SortOrder::CoOccurrenceDesc,
        }
    }
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
