use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding `EnvFilter` directives
pub const LOG_ENV: &str = "TASKDECK_LOG";

/// Install the stderr subscriber.
///
/// `TASKDECK_LOG` wins when set. Otherwise `-v` count picks the level, and
/// with no `-v` the config's `log.level` applies. Calling this twice is
/// harmless; the second call is ignored.
pub fn init(verbosity: u8, configured_level: &str) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbosity, configured_level).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

pub fn default_level(verbosity: u8, configured_level: &str) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::from_str(configured_level.trim()).unwrap_or(LevelFilter::WARN),
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
