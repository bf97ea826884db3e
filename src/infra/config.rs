use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{AppContext, InitArgs};
use crate::core::aggregate::AggregateOptions;
use crate::core::analyze::AnalyzeOptions;
use crate::core::names::GenerationOptions;

/// Config file names probed in the working directory, first match wins
pub const CONFIG_CANDIDATES: [&str; 4] =
    ["classpack.toml", "classpack.yaml", "classpack.json", ".classpack.toml"];

/// Environment prefix; nested keys use `__`, e.g. `CLASSPACK_GENERATE__STRATEGY=pretty`
pub const ENV_PREFIX: &str = "CLASSPACK";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Name cache file read before and written after `generate`
    pub cache_file: Option<PathBuf>,

    /// Merge settings
    pub aggregate: AggregateOptions,

    /// Report settings
    pub analyze: AnalyzeOptions,

    /// Identifier generation settings
    pub generate: GenerationOptions,
}

/// Load configuration from `explicit` (must exist) or the first candidate
/// file, then overlay `CLASSPACK_*` environment variables
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            if !path.exists()
            {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }
        None =>
        {
            // Load from config files in priority order
            for path in &CONFIG_CANDIDATES
            {
                if Path::new(path).exists()
                {
                    debug!(path, "loading config file");
                    builder = builder.add_source(config::File::with_name(path));
                    break;
                }
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("generate.reserved_names"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_CANDIDATES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would create config file at {}", config_path.display());
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml()
    {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.generate, GenerationOptions::default());
        assert_eq!(parsed.aggregate, AggregateOptions::default());
        assert!(parsed.cache_file.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults()
    {
        let parsed: Config = toml::from_str("[generate]\nstrategy = \"pretty\"\n").unwrap();

        assert_eq!(parsed.generate.strategy, crate::core::names::Strategy::Pretty);
        assert_eq!(parsed.generate.batch_size, 500);
        assert_eq!(parsed.analyze.top, 10);
    }
}
