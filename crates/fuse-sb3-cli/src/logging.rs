use std::io::Write as _;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes `<level> <target>: <message>` lines to stderr.
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
        let level = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{level} {}: {}", record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `-v` repeats win over `FUSE_SB3_LOG`; with neither, only warnings and
/// errors are shown.
pub fn level_from(verbose: u8, env: Option<&str>) -> LevelFilter {
    match verbose {
        0 => env
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

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
    fn verbosity_overrides_env() {
        assert_eq!(level_from(0, None), LevelFilter::Warn);
        assert_eq!(level_from(0, Some("debug")), LevelFilter::Debug);
        assert_eq!(level_from(0, Some("nonsense")), LevelFilter::Warn);
        assert_eq!(level_from(1, Some("error")), LevelFilter::Info);
        assert_eq!(level_from(5, None), LevelFilter::Trace);
    }
}
