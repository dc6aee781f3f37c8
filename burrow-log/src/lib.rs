//! Logging for Burrow.
//!
//! Session backends log through the macros in this crate so that their
//! output can be switched on per deployment without pulling in a full
//! subscriber. Output goes to stderr as JSON lines by default.
//!
//! # Usage
//!
//! ```rust
//! use burrow_log::{debug, info, warn};
//!
//! let path = "/srv/app/tmp/abc.session";
//! debug!(target: "burrow::file", "loading {}", path);
//! info!("session store ready");
//! warn!("session file older than {}s", 3600);
//! ```
//!
//! # Environment Variables
//!
//! - `BURROW_DEBUG=1` - enable debug output
//! - `BURROW_LOG_LEVEL=trace|debug|info|warn|error|off`
//! - `BURROW_LOG_FORMAT=json|pretty|compact`
//! - `BURROW_LOG_TIMESTAMPS=1|0`
//! - `BURROW_LOG_MODULE=1|0` - include the log target

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Levels and formats
// ============================================================================

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Disables all output.
    Off = 5,
}

impl Level {
    /// Upper-case name used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl FromStr for Level {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One JSON object per line.
    Json,
    /// Human readable, full timestamp.
    Pretty,
    /// Single letter level, short timestamp.
    Compact,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            _ => Err(ParseError(s.to_string())),
        }
    }
}

/// Unrecognised level or format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised log setting: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static CONFIG: Lazy<LogConfig> = Lazy::new(|| {
    let config = LogConfig::from_env();
    DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
    LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);
    config
});

/// Logging configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug: bool,
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            timestamps: true,
            module_path: true,
        }
    }
}

impl LogConfig {
    /// Build a configuration from `BURROW_*` variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debug = env_flag("BURROW_DEBUG").unwrap_or(defaults.debug);

        let level = env::var("BURROW_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        let format = env::var("BURROW_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);

        Self {
            debug,
            level,
            format,
            timestamps: env_flag("BURROW_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
            module_path: env_flag("BURROW_LOG_MODULE").unwrap_or(defaults.module_path),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Public API
// ============================================================================

/// Force the environment to be read now instead of on first use.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// The active configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

#[inline]
pub fn is_debug_enabled() -> bool {
    Lazy::force(&CONFIG);
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    Lazy::force(&CONFIG);
    level != Level::Off && level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn current_level() -> Level {
    Lazy::force(&CONFIG);
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Change the minimum level at runtime.
pub fn set_level(level: Level) {
    Lazy::force(&CONFIG);
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Toggle debug mode at runtime. Enabling it lowers the level to debug.
pub fn set_debug(enabled: bool) {
    Lazy::force(&CONFIG);
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

// ============================================================================
// Output
// ============================================================================

#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    if !should_emit(level, current_level(), is_debug_enabled()) {
        return;
    }

    let config = config();
    let line = match config.format {
        Format::Json => render_json(level, target, message),
        Format::Pretty => render_pretty(level, target, message, config),
        Format::Compact => render_compact(level, target, message, config),
    };

    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", line);
}

/// Debug mode lets debug records through regardless of the level.
fn should_emit(level: Level, min_level: Level, debug: bool) -> bool {
    if level == Level::Off {
        return false;
    }
    level >= min_level || (debug && level == Level::Debug)
}

fn render_pretty(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    let mut line = String::new();
    if config.timestamps {
        line.push_str(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f ").to_string());
    }
    line.push_str(&format!("{:5} ", level.as_str()));
    if config.module_path && !target.is_empty() {
        line.push_str(&format!("[{}] ", target));
    }
    line.push_str(message);
    line
}

fn render_compact(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    let mut line = String::new();
    if config.timestamps {
        line.push_str(&chrono::Local::now().format("%H:%M:%S ").to_string());
    }
    line.push(level.as_str().chars().next().unwrap_or('?'));
    line.push(' ');
    if config.module_path && !target.is_empty() {
        line.push_str(target);
        line.push_str(": ");
    }
    line.push_str(message);
    line
}

#[cfg(feature = "json")]
fn render_json(level: Level, target: &str, message: &str) -> String {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Record<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
    }

    let record = Record {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
    };

    serde_json::to_string(&record).unwrap_or_else(|_| message.to_string())
}

#[cfg(not(feature = "json"))]
fn render_json(level: Level, target: &str, message: &str) -> String {
    format!(
        r#"{{"timestamp":"{}","level":"{}","target":"{}","message":"{}"}}"#,
        chrono::Utc::now().to_rfc3339(),
        level.as_str(),
        escape_json(target),
        escape_json(message)
    )
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __burrow_log {
    ($level:expr, $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($level) {
            $crate::log($level, $target, &format!($($arg)+));
        }
    };
}

/// Log at trace level.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Trace, $target, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Trace, module_path!(), $($arg)+)
    };
}

/// Log at debug level. Also emitted whenever `BURROW_DEBUG=1`.
///
/// ```rust
/// use burrow_log::debug;
///
/// let id = "abc";
/// debug!("loaded session {}", id);
/// debug!(target: "burrow::redis", "refreshed ttl for {}", id);
/// ```
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_debug_enabled() || $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        $crate::debug!(target: module_path!(), $($arg)+)
    };
}

/// Log at info level.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Info, $target, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Info, module_path!(), $($arg)+)
    };
}

/// Log at warn level.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Warn, $target, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Warn, module_path!(), $($arg)+)
    };
}

/// Log at error level.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Error, $target, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__burrow_log!($crate::Level::Error, module_path!(), $($arg)+)
    };
}

// ============================================================================
// Tracing Integration
// ============================================================================

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! A `tracing` subscriber that honours the `BURROW_*` settings, for
    //! applications that also use the Redis client's `tracing` output.

    use super::*;

    pub fn subscriber() -> impl tracing::Subscriber + Send + Sync {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{EnvFilter, fmt};

        let directive = config().level.as_str().to_ascii_lowercase();
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("debug".parse::<Level>(), Ok(Level::Debug));
        assert_eq!("WARNING".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("none".parse::<Level>(), Ok(Level::Off));
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!(" Compact ".parse::<Format>(), Ok(Format::Compact));
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_off_is_never_enabled() {
        let original = current_level();
        set_level(Level::Trace);
        assert!(!is_level_enabled(Level::Off));
        assert!(is_level_enabled(Level::Trace));
        set_level(original);
    }

    #[test]
    fn test_debug_mode_emits_debug_above_level() {
        assert!(should_emit(Level::Debug, Level::Warn, true));
        assert!(!should_emit(Level::Debug, Level::Warn, false));
        assert!(!should_emit(Level::Trace, Level::Warn, true));
        assert!(!should_emit(Level::Info, Level::Warn, true));
        assert!(should_emit(Level::Error, Level::Warn, false));
        assert!(!should_emit(Level::Off, Level::Trace, true));
    }

    #[test]
    fn test_compact_render() {
        let config = LogConfig {
            timestamps: false,
            ..LogConfig::default()
        };
        let line = render_compact(Level::Warn, "burrow::file", "stale", &config);
        assert_eq!(line, "W burrow::file: stale");
    }

    #[test]
    fn test_pretty_render_without_target() {
        let config = LogConfig {
            timestamps: false,
            module_path: false,
            ..LogConfig::default()
        };
        let line = render_pretty(Level::Info, "burrow", "ready", &config);
        assert_eq!(line, "INFO  ready");
    }

    #[test]
    fn test_json_render_contains_fields() {
        let line = render_json(Level::Error, "burrow::redis", "say \"hi\"");
        assert!(line.contains("\"level\":\"ERROR\""));
        assert!(line.contains("\"target\":\"burrow::redis\""));
        assert!(line.contains("say \\\"hi\\\""));
    }

    #[test]
    fn test_macros_expand() {
        trace!("trace {}", 1);
        debug!("debug");
        info!(target: "burrow::test", "info {}", "x");
        warn!("warn");
        error!(target: "burrow::test", "error");
    }
}
