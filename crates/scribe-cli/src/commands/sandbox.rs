use anyhow::Result;
use clap::Args;

use super::SessionArgs;
use crate::output::format::{format_layout, SandboxLayout};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct SandboxArgs {
    /// Leave the sandbox on disk instead of deleting it
    #[arg(long)]
    pub keep: bool,

    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn run(args: &SandboxArgs, format: OutputFormat) -> Result<()> {
    let session = args.session.begin()?;
    let sandbox = session.harness().sandbox();
    let layout = SandboxLayout {
        root: sandbox.root().to_path_buf(),
        remote: sandbox.remote_dir().to_path_buf(),
        fork: sandbox.fork_dir().map(|p| p.to_path_buf()),
        working_dir: sandbox.working_root().to_path_buf(),
        home: sandbox.home().to_path_buf(),
        kept: args.keep,
    };
    print!("{}", format_layout(&layout, format));

    if args.keep {
        session.keep_sandbox();
    }
    Ok(())
}
