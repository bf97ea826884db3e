//! `cpk analyze`: frequency, bucket, co-occurrence and category report.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::{AnalyzeArgs, AppContext, OutputFormat};
use crate::cli_ext::aggregate_cmd::load_map;
use crate::core::aggregate::AggregatedClassData;
use crate::core::analyze::{AnalysisReport, CompressionStats, analyze, compression_stats, sort};
use crate::core::names::Alphabet;
use crate::infra::cache_file::load_name_cache;
use crate::infra::config::load_config;
use crate::infra::io::write_json;

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct ClassRow {
    #[tabled(rename = "Class")]
    class_name: String,
    #[tabled(rename = "Total")]
    total: u64,
    #[tabled(rename = "HTML")]
    html: u64,
    #[tabled(rename = "JSX")]
    jsx: u64,
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "Co-occurring")]
    co_occurring: usize,
    #[tabled(rename = "Source")]
    source: String,
}

impl From<&AggregatedClassData> for ClassRow {
    fn from(d: &AggregatedClassData) -> Self {
        Self {
            class_name: d.class_name.clone(),
            total: d.total_frequency,
            html: d.html_frequency,
            jsx: d.jsx_frequency,
            files: d.source_files.len(),
            co_occurring: d.co_occurrence_degree(),
            source: d.source_type.to_string(),
        }
    }
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Length")]
    length: usize,
    #[tabled(rename = "Capacity")]
    capacity: u64,
    #[tabled(rename = "Classes")]
    classes: usize,
    #[tabled(rename = "Usage")]
    usage: u64,
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "Pair")]
    pair: String,
    #[tabled(rename = "Joint")]
    joint: u64,
    #[tabled(rename = "Strength")]
    strength: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Classes")]
    classes: usize,
    #[tabled(rename = "Usage")]
    usage: u64,
}

#[derive(Tabled)]
struct CompressionRow {
    #[tabled(rename = "Class")]
    class_name: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Saved")]
    saved: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput<'a> {
    report: &'a AnalysisReport,
    classes: Vec<ClassRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<CompressionStats>,
}

pub fn run(args: AnalyzeArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config(ctx.config.as_deref())?;
    let map = load_map(&args.input, &config.aggregate, ctx)?;

    let mut options = config.analyze;
    if let Some(top) = args.top {
        options.top = top;
    }
    if let Some(floor) = args.min_co_occurrence {
        options.co_occurrence_floor = floor;
    }

    let alphabet = Alphabet::new(args.alphabet.as_deref().unwrap_or(&config.generate.alphabet))
        .context("Invalid alphabet")?;
    let report = analyze(&map, alphabet.len(), &options).context("Analysis failed")?;

    let compression = match &args.names {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Name map {} does not exist", path.display());
            }
            let names = load_name_cache(path)?;
            Some(compression_stats(&map, &names).context("Cannot compare name map with records")?)
        }
        None => None,
    };

    let classes: Vec<ClassRow> = sort(&map, args.sort.into())
        .into_iter()
        .take(options.top)
        .map(ClassRow::from)
        .collect();

    match args.format {
        OutputFormat::Json => write_json(&AnalyzeOutput { report: &report, classes, compression }, None),
        OutputFormat::Table => {
            print_tables(ctx, &report, classes, compression.as_ref());
            Ok(())
        }
    }
}

fn heading(ctx: &AppContext, text: &str) {
    println!("\n{}", ctx.styled(text, |s| s.bold().to_string()));
}

fn print_tables(
    ctx: &AppContext,
    report: &AnalysisReport,
    classes: Vec<ClassRow>,
    compression: Option<&CompressionStats>,
) {
    let summary = &report.summary;
    println!(
        "{} {} classes, {} usages (mean {:.2}, median {:.1})",
        ctx.styled("Summary:", |s| s.cyan().bold().to_string()),
        summary.total_classes,
        summary.total_usage,
        summary.mean_frequency,
        summary.median_frequency
    );

    if summary.total_classes == 0 {
        println!("{}", ctx.styled("No classes found", |s| s.yellow().to_string()));
        return;
    }

    heading(ctx, "Classes");
    println!("{}", Table::new(classes));

    heading(ctx, "Length buckets");
    let buckets: Vec<BucketRow> = report
        .buckets
        .iter()
        .map(|b| BucketRow {
            length: b.name_length,
            capacity: b.capacity,
            classes: b.class_count,
            usage: b.total_frequency,
        })
        .collect();
    println!("{}", Table::new(buckets));

    if !report.co_occurrences.is_empty() {
        heading(ctx, "Co-occurrence");
        let pairs: Vec<PairRow> = report
            .co_occurrences
            .iter()
            .map(|p| PairRow {
                pair: p.classes.join(" + "),
                joint: p.joint_frequency,
                strength: format!("{:.2}", p.strength),
            })
            .collect();
        println!("{}", Table::new(pairs));
    }

    if !report.pattern_groups.is_empty() {
        heading(ctx, "Pattern groups");
        let groups: Vec<GroupRow> = report
            .pattern_groups
            .iter()
            .map(|g| GroupRow {
                category: g.category.to_string(),
                classes: g.classes.len(),
                usage: g.total_frequency,
            })
            .collect();
        println!("{}", Table::new(groups));
    }

    if let Some(stats) = compression {
        heading(ctx, "Compression");
        println!(
            "{} {} -> {} bytes (ratio {:.2}, weighted {:.2}, saved {})",
            ctx.styled("✓", |s| s.green().to_string()),
            stats.total_original_bytes,
            stats.total_generated_bytes,
            stats.overall_compression_ratio,
            stats.weighted_compression_ratio,
            stats.total_bytes_saved
        );
        let best: Vec<CompressionRow> = stats
            .best_compressed
            .iter()
            .map(|c| CompressionRow {
                class_name: c.class_name.clone(),
                name: c.generated_name.clone(),
                ratio: format!("{:.2}", c.ratio),
                saved: c.bytes_saved,
            })
            .collect();
        println!("{}", Table::new(best));
    }
}
