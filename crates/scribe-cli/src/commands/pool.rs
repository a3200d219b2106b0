use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use scribe_engine::IdentityPool;

use crate::output::format::format_pool;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct PoolArgs {
    /// JSON pool file to validate instead of the built-in pool
    #[arg(long, env = "SCRIBE_POOL")]
    pub file: Option<PathBuf>,
}

pub fn run(args: &PoolArgs, format: OutputFormat) -> Result<()> {
    let pool = match &args.file {
        Some(path) => IdentityPool::load(path)
            .with_context(|| format!("Invalid identity pool {}", path.display()))?,
        None => IdentityPool::builtin(),
    };
    print!("{}", format_pool(&pool, format));
    Ok(())
}
