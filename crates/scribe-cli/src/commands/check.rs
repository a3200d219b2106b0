use anyhow::Result;
use clap::Args;

use super::{process_documents, DocumentArgs, SessionArgs};
use crate::output::format::format_outcomes;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub documents: DocumentArgs,

    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn run(args: &CheckArgs, format: OutputFormat) -> Result<()> {
    let documents = args.documents.collect()?;
    let mut session = args.session.begin()?;

    let outcomes = process_documents(&mut session, &documents, |_| Ok(()))?;
    print!("{}", format_outcomes(&outcomes, format));

    let changed = outcomes.iter().filter(|o| o.changed).count();
    if changed > 0 {
        anyhow::bail!("{changed} document(s) are out of date. Run `scribe run` to regenerate them.");
    }
    Ok(())
}
