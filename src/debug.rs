//! Debug log file for glyphd.
//!
//! Routes every `log::info!()` etc. from glyphd and its crates to
//! /tmp/glyphd_debug.log on Unix/macOS, or %TEMP%\glyphd_debug.log on Windows.
//! When RUST_LOG is set, lines are mirrored to stderr as well.
//!
//! Level precedence: the `--log-level` CLI flag, then RUST_LOG, then the
//! `log_level` config value (applied once the config is loaded).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

/// `log` backend writing to the debug log file.
struct LogBridge {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl LogBridge {
    fn open(level: LevelFilter, mirror_stderr: bool) -> Self {
        let file = if level != LevelFilter::Off {
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
                // Logging must never stop the program.
                .ok()
        } else {
            None
        };
        let bridge = LogBridge {
            file: Mutex::new(file),
            mirror_stderr,
        };
        bridge.write_raw(&format!(
            "\n{}\nglyphd debug session started at {} (level={})\n{}\n",
            "=".repeat(80),
            timestamp(),
            level,
            "=".repeat(80)
        ));
        bridge
    }

    fn write_raw(&self, msg: &str) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    /// Open the log file late, when only the config enables logging.
    fn ensure_file(&self) {
        let mut file = self.file.lock();
        if file.is_none() {
            *file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(log_path())
                .ok();
        }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&timestamp(), record);
        self.write_raw(&line);
        if self.mirror_stderr {
            eprint!("{}", line);
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

/// Set when the CLI flag or RUST_LOG chose the level, so the config value
/// must not override it.
static LEVEL_FIXED: AtomicBool = AtomicBool::new(false);

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    let path = PathBuf::from("/tmp/glyphd_debug.log");
    #[cfg(not(unix))]
    let path = std::env::temp_dir().join("glyphd_debug.log");
    path
}

/// Install the log bridge as the global logger.
///
/// `cli_level` is the `--log-level` flag, if given. Calling this more than
/// once has no further effect.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = cli_level.or_else(|| rust_log.as_deref().and_then(parse_rust_log));

    let bridge = BRIDGE.get_or_init(|| {
        LogBridge::open(level.unwrap_or(LevelFilter::Off), rust_log.is_some())
    });
    if log::set_logger(bridge).is_err() {
        return;
    }
    LEVEL_FIXED.store(level.is_some(), Ordering::SeqCst);
    log::set_max_level(level.unwrap_or(LevelFilter::Off));
}

/// Apply the level from the config file unless the CLI or RUST_LOG already
/// chose one.
pub fn apply_config_level(level: LevelFilter) {
    if LEVEL_FIXED.load(Ordering::SeqCst) {
        return;
    }
    if let Some(bridge) = BRIDGE.get()
        && level != LevelFilter::Off
    {
        bridge.ensure_file();
    }
    log::set_max_level(level);
}

/// Level named by a RUST_LOG value such as `debug`.
///
/// Per-module directives (`glyphd=debug`) are not supported and yield `None`.
fn parse_rust_log(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

fn format_line(timestamp: &str, record: &Record) -> String {
    format!(
        "[{}] [{:<5}] [{}] {}\n",
        timestamp,
        record.level(),
        record.target(),
        record.args()
    )
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rust_log() {
        assert_eq!(parse_rust_log("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_rust_log(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_rust_log("glyphd=trace"), None);
    }

    #[test]
    fn test_format_line() {
        let line = format_line(
            "1.000000",
            &Record::builder()
                .args(format_args!("Loaded {} fonts", 3))
                .level(log::Level::Info)
                .target("glyphd_fonts::worker")
                .build(),
        );
        assert_eq!(line, "[1.000000] [INFO ] [glyphd_fonts::worker] Loaded 3 fonts\n");
    }

    #[test]
    fn test_log_path_file_name() {
        assert_eq!(
            log_path().file_name().and_then(|n| n.to_str()),
            Some("glyphd_debug.log")
        );
    }
}
