//! `cpk generate`: frequency map in, class -> identifier assignment out.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{AppContext, GenerateArgs};
use crate::cli_ext::aggregate_cmd::load_map;
use crate::core::collision::NameCollisionCache;
use crate::core::names::{GenerationOptions, GenerationResult, NameLayout, generate};
use crate::core::store::generate_with_store;
use crate::infra::cache_file::{FileStore, load_name_cache, save_name_cache};
use crate::infra::config::load_config;
use crate::infra::io::write_json;

/// Expand `~` and `$VAR` in a user-supplied path
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::full(&raw).map(|s| s.into_owned()).unwrap_or_else(|_| raw.into_owned()))
}

/// Overlay command-line flags on the configured options
pub fn apply_overrides(mut options: GenerationOptions, args: &GenerateArgs) -> GenerationOptions {
    if let Some(strategy) = args.strategy {
        options.strategy = strategy.into();
    }
    if let Some(alphabet) = &args.alphabet {
        options.alphabet = alphabet.clone();
    }
    if let Some(prefix) = &args.prefix {
        options.prefix = prefix.clone();
    }
    if let Some(suffix) = &args.suffix {
        options.suffix = suffix.clone();
    }
    if let Some(threshold) = args.threshold {
        options.frequency_threshold = threshold;
    }
    if let Some(max_length) = args.max_length {
        options.pretty.max_length = max_length;
    }
    if let Some(policy) = args.on_exhaustion {
        options.pretty.exhaustion_policy = policy.into();
    }
    if args.numeric_suffix {
        options.numeric_suffix = true;
    }
    if args.no_cache {
        options.use_cache = false;
    }
    options.reserved_names.extend(args.reserved.iter().cloned());
    options
}

pub fn run(args: GenerateArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config(ctx.config.as_deref())?;
    let map = load_map(&args.input, &config.aggregate, ctx)?;
    let options = apply_overrides(config.generate, &args);

    let cache_path = args
        .cache_file
        .clone()
        .or(config.cache_file)
        .map(|p| expand_path(&p));

    let seeded: BTreeMap<String, String> = match &cache_path {
        Some(path) => load_name_cache(path)?,
        None => BTreeMap::new(),
    };

    let layout = NameLayout::from_options(&options)?;
    let mut cache = NameCollisionCache::new();
    cache
        .load_from_cache(&seeded, &layout)
        .context("Failed to seed name cache")?;

    // Spinner while assigning (unless quiet mode)
    let spinner = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("assigning identifiers to {} classes", map.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let outcome = match &args.store_dir {
        Some(dir) if !ctx.dry_run => {
            let mut store = FileStore::new(expand_path(dir));
            generate_with_store(&mut store, &map, &options, &mut cache)
        }
        _ => generate(&map, &options, &mut cache),
    };
    spinner.finish_and_clear();
    let result = outcome?;

    if ctx.dry_run {
        if !ctx.quiet {
            report_dry_run(ctx, &result, args.output.as_deref(), cache_path.as_deref());
        }
        return Ok(());
    }

    if args.names_only {
        write_json(&result.name_map, args.output.as_deref())?;
    } else {
        write_json(&result, args.output.as_deref())?;
    }

    if let Some(path) = &cache_path {
        save_name_cache(path, &cache.save_to_cache())?;
    }

    if !ctx.quiet {
        report_done(ctx, &result);
    }
    Ok(())
}

fn report_dry_run(
    ctx: &AppContext,
    result: &GenerationResult,
    output: Option<&Path>,
    cache_path: Option<&Path>,
) {
    let target = output
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    println!("{}", ctx.styled("DRY RUN: Would generate:", |s| s.yellow().to_string()));
    for (class, name) in result.name_map.iter().take(10) {
        println!("  {class} -> {name}");
    }
    if result.name_map.len() > 10 {
        println!("  ... and {} more", result.name_map.len() - 10);
    }
    println!(
        "{}",
        ctx.styled(
            &format!("Would write {} identifiers to {target}", result.metadata.total_names),
            |s| s.yellow().to_string()
        )
    );
    if let Some(path) = cache_path {
        println!(
            "{}",
            ctx.styled(&format!("Would update name cache {}", path.display()), |s| s
                .yellow()
                .to_string())
        );
    }
}

fn report_done(ctx: &AppContext, result: &GenerationResult) {
    let meta = &result.metadata;
    eprintln!(
        "{} Generated {} identifiers ({}, ratio {:.2}, {} reused{})",
        ctx.styled("✓", |s| s.green().to_string()),
        meta.total_names,
        meta.strategy,
        meta.overall_compression_ratio,
        meta.reused_from_cache,
        if meta.from_store { ", from store" } else { "" }
    );
    if let Some(fallback) = meta.fallback_strategy {
        eprintln!(
            "{} pretty names ran out; continued with {fallback} names",
            ctx.styled("!", |s| s.yellow().to_string())
        );
    }
}
