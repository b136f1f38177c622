//! Tracing subscriber bootstrap.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{LedgerError, LedgerResult, TelemetryConfig};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Fails with
/// [`LedgerError::Configuration`] if a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> LedgerResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| LedgerError::Configuration(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    result.map_err(|e| LedgerError::Configuration(format!("tracing already initialised: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let cfg = TelemetryConfig::default();
        let first = init_tracing(&cfg);
        let second = init_tracing(&cfg);
        // Another test in this binary may have won the race for the first slot.
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
