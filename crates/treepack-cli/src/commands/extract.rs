//! Extract command implementation.

use std::env;

use anyhow::Context;
use anyhow::Result;
use treepack_core::ArchiveConfig;
use treepack_core::ArchiveExtractor;

use super::resolve_format;
use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let target = match &args.target {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };
    let format = resolve_format(args.format.as_deref(), &args.archive)?;

    let mut config = ArchiveConfig::default().with_restore_ownership(!args.no_owner);
    if let Some(threads) = args.threads {
        config = config.with_threads(usize::from(threads));
    }

    let report = add_archive_context(
        ArchiveExtractor::new(config).extract_format(&args.archive, format, &target),
        &args.archive,
    )?;

    formatter.format_extraction_result(&target, &report)
}
