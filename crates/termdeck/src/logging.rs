use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;

/// Map `-v` occurrences to a level: warn, info, debug, then trace.
pub fn level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Set up the global logger.
///
/// The presentation owns the terminal, so records only go to stderr when
/// `RUST_LOG` asks for them. With `--log` everything at the chosen level is
/// written to that file instead.
pub fn init(log_file: Option<&Path>, verbosity: u8) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            env_logger::Builder::new()
                .filter_level(level(verbosity))
                .format_timestamp_millis()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .try_init()?;
            log::info!("Logging to {} (level: {:?})", path.display(), level(verbosity));
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
                .format_timestamp_millis()
                .try_init()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(0), LevelFilter::Warn);
        assert_eq!(level(1), LevelFilter::Info);
        assert_eq!(level(2), LevelFilter::Debug);
        assert_eq!(level(3), LevelFilter::Trace);
        assert_eq!(level(9), LevelFilter::Trace);
    }
}
