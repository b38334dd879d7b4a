//! List command implementation

use anyhow::Result;
use treepack_core::inspect::list_entries;

use super::resolve_format;
use crate::cli::ListArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;

pub fn execute(args: &ListArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let format = resolve_format(args.format.as_deref(), &args.archive)?;
    let entries = add_archive_context(list_entries(&args.archive, format), &args.archive)?;

    if args.long {
        formatter.format_entries_long(&entries, args.human_readable)
    } else {
        formatter.format_entries_short(&entries)
    }
}
