//! Minimal stderr logger for the `log` facade.

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes coloured `level target: message` lines to stderr.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("melodia")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "error".red().bold(),
            Level::Warn => "warn".yellow().bold(),
            Level::Info => "info".green(),
            Level::Debug => "debug".cyan(),
            Level::Trace => "trace".dimmed(),
        };
        eprintln!("{} {}: {}", level, record.target().dimmed(), record.args());
    }

    fn flush(&self) {}
}

/// Level for a `-v` count.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the logger. Calling it again is a no-op.
pub fn init(level: LevelFilter) {
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Debug);
        assert_eq!(level_for(2), LevelFilter::Trace);
        assert_eq!(level_for(5), LevelFilter::Trace);
    }

    #[test]
    fn test_filters_foreign_targets() {
        let logger = StderrLogger {
            level: LevelFilter::Debug,
        };
        let ours = Metadata::builder()
            .level(Level::Debug)
            .target("melodia_core::search")
            .build();
        let theirs = Metadata::builder()
            .level(Level::Debug)
            .target("other_crate")
            .build();
        let too_fine = Metadata::builder()
            .level(Level::Trace)
            .target("melodia_core::trace")
            .build();
        assert!(logger.enabled(&ours));
        assert!(!logger.enabled(&theirs));
        assert!(!logger.enabled(&too_fine));
    }
}
