//! Stderr logger for the demo programs.
//!
//! Records are printed as `[elapsed LEVEL target] message`. Use
//! `init_with_level` (or `init_tracing` with the `tracing` feature) once at
//! startup; library crates only emit through the `log` facade and never
//! install a logger themselves. `VISTRACK_LOG` overrides `RUST_LOG`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            short_target(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Strip the crate prefix so `vistrack_ldmrs::decoder` prints as `decoder`.
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Environment variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "VISTRACK_LOG";

#[cfg(feature = "tracing")]
const DEFAULT_DIRECTIVE: &str = "info";

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// First non-blank directive among `VISTRACK_LOG` and `RUST_LOG`.
fn pick_directive(vistrack: Option<String>, rust: Option<String>) -> Option<String> {
    [vistrack, rust]
        .into_iter()
        .flatten()
        .map(|d| d.trim().to_string())
        .find(|d| !d.is_empty())
}

fn env_directive() -> Option<String> {
    pick_directive(std::env::var(LOG_ENV).ok(), std::env::var("RUST_LOG").ok())
}

/// A bare level directive (`debug`, `off`) overrides `fallback`; per-target
/// directives only make sense for the tracing subscriber and are ignored.
fn level_from_directive(directive: Option<&str>, fallback: LevelFilter) -> LevelFilter {
    directive
        .and_then(|d| d.parse::<LevelFilter>().ok())
        .unwrap_or(fallback)
}

/// Install the stderr logger and return the level it filters at.
///
/// `level` applies unless `VISTRACK_LOG` or `RUST_LOG` holds a bare level.
/// Only the first call installs anything; later calls report the installed
/// level.
pub fn init_with_level(level: LevelFilter) -> Result<LevelFilter, log::SetLoggerError> {
    let mut installed_now = false;
    let logger = LOGGER.get_or_init(|| {
        installed_now = true;
        StderrLogger {
            level: level_from_directive(env_directive().as_deref(), level),
            started: Instant::now(),
        }
    });
    if installed_now {
        log::set_logger(logger)?;
        log::set_max_level(logger.level);
    }
    Ok(logger.level)
}

/// Install a `tracing` subscriber that also closes spans with their timings.
///
/// The filter is taken from `VISTRACK_LOG`, then `RUST_LOG`, then `info`;
/// an unparsable directive falls back to `info`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let directive = env_directive().unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_target_keeps_last_path_segment() {
        assert_eq!(short_target("vistrack_ldmrs::decoder"), "decoder");
        assert_eq!(short_target("track_dot"), "track_dot");
    }

    #[test]
    fn second_init_is_a_no_op() {
        let first = init_with_level(LevelFilter::Warn).expect("first init");
        let second = init_with_level(LevelFilter::Trace).expect("second init");
        assert_eq!(second, first);
        assert_eq!(log::max_level(), first);
    }

    #[test]
    fn vistrack_log_wins_over_rust_log() {
        assert_eq!(
            pick_directive(Some("debug".into()), Some("warn".into())).as_deref(),
            Some("debug")
        );
        assert_eq!(
            pick_directive(Some("  ".into()), Some(" warn ".into())).as_deref(),
            Some("warn")
        );
        assert_eq!(pick_directive(None, None), None);
    }

    #[test]
    fn only_bare_levels_override_the_stderr_level() {
        assert_eq!(
            level_from_directive(Some("trace"), LevelFilter::Info),
            LevelFilter::Trace
        );
        assert_eq!(
            level_from_directive(Some("OFF"), LevelFilter::Info),
            LevelFilter::Off
        );
        assert_eq!(
            level_from_directive(Some("vistrack_dot=debug"), LevelFilter::Info),
            LevelFilter::Info
        );
        assert_eq!(level_from_directive(None, LevelFilter::Warn), LevelFilter::Warn);
    }
}
