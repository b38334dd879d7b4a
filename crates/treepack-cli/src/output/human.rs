//! Human-readable output formatter with colors and styling.

use std::path::Path;

use anyhow::Result;
use chrono::DateTime;
use console::Term;
use console::style;
use treepack_core::CreationReport;
use treepack_core::EntryHeader;
use treepack_core::EntryKind;
use treepack_core::ExtractionReport;

use super::formatter::OutputFormatter;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, c) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }

        result.chars().rev().collect()
    }

    /// `ls -l` style permission string, e.g. `drwxr-x---`.
    fn format_mode(kind: EntryKind, mode: u32) -> String {
        let mut out = String::with_capacity(10);
        out.push(if kind.is_directory() { 'd' } else { '-' });
        for shift in [6, 3, 0] {
            let bits = (mode >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }

    fn format_mtime(mtime: i64) -> String {
        DateTime::from_timestamp(mtime, 0).map_or_else(
            || mtime.to_string(),
            |t| t.format("%Y-%m-%d %H:%M").to_string(),
        )
    }

    fn format_owner(id: Option<u32>) -> String {
        id.map_or_else(|| "-".to_string(), |id| id.to_string())
    }

    fn headline(&self, text: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {text}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(text);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_creation_result(&self, report: &CreationReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(&format!("Archive created: {}", report.archive_path.display()));
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "  Files added:      {}",
            Self::format_number(report.files_added)
        ));
        let _ = self.term.write_line(&format!(
            "  Directories:      {}",
            Self::format_number(report.directories_added)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size:       {}",
            Self::format_size(report.bytes_read)
        ));
        let _ = self.term.write_line(&format!(
            "  Archive size:     {}",
            Self::format_size(report.bytes_written)
        ));

        if self.verbose {
            let _ = self.term.write_line(&format!(
                "  Ratio:            {:.2}",
                report.compression_ratio()
            ));
            let _ = self
                .term
                .write_line(&format!("  Duration:         {:?}", report.duration));
        }

        Ok(())
    }

    fn format_extraction_result(&self, target: &Path, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline("Extraction complete");
        let _ = self
            .term
            .write_line(&format!("  Target: {}", target.display()));
        let _ = self
            .term
            .write_line(&format!("  Files extracted: {}", report.files_extracted));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_created));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        Ok(())
    }

    fn format_entries_short(&self, entries: &[EntryHeader]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for entry in entries {
            let name = if entry.kind.is_directory() {
                entry.name.directory_form()
            } else {
                entry.name.to_string()
            };
            let _ = self.term.write_line(&name);
        }

        Ok(())
    }

    fn format_entries_long(&self, entries: &[EntryHeader], human_readable: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut total_size = 0;
        for entry in entries {
            total_size += entry.size;
            let size_str = if human_readable {
                Self::format_size(entry.size)
            } else {
                entry.size.to_string()
            };

            let _ = self.term.write_line(&format!(
                "{} {:>6} {:>6} {:>10}  {}  {}",
                Self::format_mode(entry.kind, entry.metadata.mode),
                Self::format_owner(entry.metadata.uid),
                Self::format_owner(entry.metadata.gid),
                size_str,
                Self::format_mtime(entry.metadata.mtime),
                entry.name
            ));
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "Total: {} entries, {}",
            Self::format_number(entries.len()),
            Self::format_size(total_size)
        ));

        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
