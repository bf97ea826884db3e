//! `cpk aggregate`: extraction bundles in, frequency map JSON out.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::cli::{AggregateArgs, AppContext, InputArgs};
use crate::core::aggregate::{AggregateOptions, PatternFrequencyMap, aggregate};
use crate::infra::config::load_config;
use crate::infra::io::{read_bundles, read_frequency_map, write_json};

pub fn run(args: AggregateArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config(ctx.config.as_deref())?;
    let mut options = config.aggregate;
    if let Some(max) = args.max_contexts {
        options.max_contexts = max;
    }

    let map = load_map(&args.input, &options, ctx)?;

    if ctx.dry_run {
        if !ctx.quiet {
            let target = args
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdout".to_string());
            println!(
                "{}",
                ctx.styled(
                    &format!("DRY RUN: Would write {} classes to {target}", map.len()),
                    |s| s.yellow().to_string()
                )
            );
        }
        return Ok(());
    }

    write_json(&map, args.output.as_deref())?;

    if let Some(path) = &args.output {
        if !ctx.quiet {
            eprintln!(
                "{} Aggregated {} classes ({} usages) into {}",
                ctx.styled("✓", |s| s.green().to_string()),
                map.len(),
                map.total_usage(),
                path.display()
            );
        }
    }
    Ok(())
}

/// Build the frequency map from bundles, or read a saved one.
///
/// CLI flags override `base`; a saved map is re-filtered by the minimum
/// frequency only.
pub fn load_map(
    input: &InputArgs,
    base: &AggregateOptions,
    ctx: &AppContext,
) -> Result<PatternFrequencyMap> {
    let mut options = base.clone();
    if let Some(min) = input.min_frequency {
        options.minimum_frequency = min;
    }
    if input.case_insensitive {
        options.case_sensitive = false;
    }

    if let Some(path) = &input.map {
        let map = read_frequency_map(path)?;
        return Ok(map
            .values()
            .filter(|d| d.total_frequency >= options.minimum_frequency)
            .cloned()
            .collect());
    }

    // Set up progress bar (unless quiet mode)
    let progress = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(input.inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("reading bundles");
        pb
    };

    let bundle = read_bundles(&input.inputs, &progress)?;
    progress.finish_and_clear();

    let map = aggregate(&bundle.html, &bundle.jsx, &options).context("Failed to aggregate records")?;
    debug!(
        files = bundle.html.len() + bundle.jsx.len(),
        classes = map.len(),
        "records aggregated"
    );
    Ok(map)
}
