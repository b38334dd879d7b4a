//! Create command implementation.

use anyhow::Result;
use treepack_core::ArchiveConfig;
use treepack_core::ArchiveWriter;

use crate::cli::CreateArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;

pub fn execute(args: &CreateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut config = ArchiveConfig::default()
        .with_archive_root(args.archive_root.clone())
        .with_atomic_write(!args.no_atomic);
    if let Some(threads) = args.threads {
        config = config.with_threads(usize::from(threads));
    }
    if let Some(level) = args.compression_level {
        config = config.with_compression_level(level);
    }

    let report = add_archive_context(
        ArchiveWriter::new(config).create(&args.root, &args.format),
        &args.root,
    )?;

    formatter.format_creation_result(&report)
}
