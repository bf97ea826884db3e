use std::process::ExitCode;

use clap::Parser;
use classpack::cli::{AppContext, Cli, Commands};
use classpack::core::{AggregationError, AnalysisError, CacheError, NameGenError};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = cli.context();
    init_tracing(&ctx);

    let outcome = match cli.command {
        Commands::Aggregate(args) => classpack::aggregate_run(args, &ctx),
        Commands::Analyze(args) => classpack::analyze_run(args, &ctx),
        Commands::Generate(args) => classpack::generate_run(args, &ctx),
        Commands::Init(args) => classpack::infra::config::init(args, &ctx),
        Commands::Completions(args) => classpack::completion::run(args, &ctx),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(err, &ctx);
            ExitCode::FAILURE
        }
    }
}

/// CPK_LOG, then RUST_LOG, then `warn` (`debug` with --verbose)
fn init_tracing(ctx: &AppContext) {
    let fallback = if ctx.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CPK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!ctx.no_color)
        .with_writer(std::io::stderr)
        .init();
}

/// Library errors carry codes and help text; render those through miette
fn report(err: anyhow::Error, ctx: &AppContext) {
    if ctx.no_color {
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }

    let err = match err.downcast::<NameGenError>() {
        Ok(diag) => return eprintln!("{:?}", miette::Report::new(diag)),
        Err(err) => err,
    };
    let err = match err.downcast::<CacheError>() {
        Ok(diag) => return eprintln!("{:?}", miette::Report::new(diag)),
        Err(err) => err,
    };
    let err = match err.downcast::<AggregationError>() {
        Ok(diag) => return eprintln!("{:?}", miette::Report::new(diag)),
        Err(err) => err,
    };
    let err = match err.downcast::<AnalysisError>() {
        Ok(diag) => return eprintln!("{:?}", miette::Report::new(diag)),
        Err(err) => err,
    };
    eprintln!("Error: {err:?}");
}
