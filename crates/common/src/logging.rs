//! Logging setup and configuration

use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Setup tracing subscriber for the application
///
/// Log output goes to stderr; stdout is reserved for probe results. Fails if
/// the level is not a valid filter or a subscriber is already installed.
pub fn setup_logging(default_level: &str) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| crate::Error::Config(format!("Invalid log filter: {}", e)))?;
    let active = filter.to_string();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| crate::Error::Config(format!("Logging already initialized: {}", e)))?;

    debug!("Logging initialized with filter '{}'", active);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_setup_is_rejected() {
        setup_logging("debug").unwrap();
        match setup_logging("debug") {
            Err(crate::Error::Config(message)) => {
                assert!(message.starts_with("Logging already initialized"))
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}
