//! Shell completion scripts for `cpk`.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell as CompletionShell, generate, generate_to};
use std::{fs, io};

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

const BIN_NAME: &str = "cpk";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    let shell = CompletionShell::from(args.shell);
    let mut cmd = Cli::command();

    match (args.stdout, args.out_dir) {
        (true, _) => {
            generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
            Ok(())
        }
        (false, None) => anyhow::bail!("--out-dir is required unless --stdout is set"),
        (false, Some(dir)) if ctx.dry_run => {
            if !ctx.quiet {
                eprintln!("DRY RUN: Would write {shell} completion to {}", dir.display());
            }
            Ok(())
        }
        (false, Some(dir)) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = generate_to(shell, &mut cmd, BIN_NAME, &dir)
                .with_context(|| format!("Failed to write {shell} completion"))?;

            if !ctx.quiet {
                eprintln!("Wrote completion to {}", path.display());
            }
            Ok(())
        }
    }
}
