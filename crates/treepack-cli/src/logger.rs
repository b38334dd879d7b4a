//! Stderr logger for the `log` records emitted by treepack-core.

use console::style;
use log::Level;
use log::LevelFilter;
use log::Log;
use log::Metadata;
use log::Record;

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => style("error").red().bold(),
            Level::Warn => style("warn").yellow().bold(),
            Level::Info => style("info").green(),
            Level::Debug => style("debug").cyan(),
            Level::Trace => style("trace").dim(),
        };
        eprintln!("{tag}: {}", record.args());
    }

    fn flush(&self) {}
}

/// Maps the verbosity flags onto a level filter.
pub const fn level_for(verbose: bool, quiet: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    }
}

/// Installs the logger. A logger installed earlier is left in place.
pub fn init(verbose: bool, quiet: bool) {
    let level = level_for(verbose, quiet);
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}
