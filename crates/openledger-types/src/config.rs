//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::{LedgerError, LedgerResult, TxContext, WalletId};

/// Configuration shared by the settlement and purchase engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Pending transactions surfaced per settlement page.
    pub page_size: usize,
    /// Bounded concurrency of each purchase-flush worker pool.
    pub worker_count: usize,
    /// Reserve wallet for mint/burn.
    pub system_wallet: WalletId,
    /// Hex length of derived record ids.
    pub id_length: usize,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            page_size: constants::DEFAULT_PAGE_SIZE,
            worker_count: constants::DEFAULT_WORKER_COUNT,
            system_wallet: WalletId::system(),
            id_length: constants::ID_LENGTH,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse from JSON; missing fields take their defaults. The result is
    /// validated before being returned.
    pub fn from_json_str(raw: &str) -> LedgerResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| LedgerError::Configuration(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.page_size == 0 {
            return Err(LedgerError::Configuration("page_size must be > 0".into()));
        }
        if self.worker_count == 0 {
            return Err(LedgerError::Configuration(
                "worker_count must be > 0".into(),
            ));
        }
        if !(1..=constants::MAX_ID_LENGTH).contains(&self.id_length) {
            return Err(LedgerError::Configuration(format!(
                "id_length must be in 1..={}, got {}",
                constants::MAX_ID_LENGTH,
                self.id_length
            )));
        }
        if self.system_wallet.is_empty() {
            return Err(LedgerError::Configuration(
                "system_wallet must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Fresh invocation context deriving ids of the configured length.
    #[must_use]
    pub fn new_context(&self) -> TxContext {
        TxContext::new().with_id_length(self.id_length)
    }
}

/// Logging configuration consumed by [`crate::telemetry::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.worker_count, 20);
        assert_eq!(cfg.id_length, 40);
        assert!(cfg.system_wallet.is_system());
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = LedgerConfig::from_json_str(r#"{"worker_count": 4}"#).unwrap();
        assert_eq!(cfg.worker_count, 4);
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.telemetry.log_level, "info");
    }

    #[test]
    fn rejects_zero_workers_and_bad_id_length() {
        let err = LedgerConfig::from_json_str(r#"{"worker_count": 0}"#).unwrap_err();
        assert!(matches!(err, LedgerError::Configuration(_)));
        let err = LedgerConfig::from_json_str(r#"{"id_length": 65}"#).unwrap_err();
        assert!(format!("{err}").starts_with("OL_ERR_901"));
    }

    #[test]
    fn contexts_follow_configured_id_length() {
        let cfg = LedgerConfig::from_json_str(r#"{"id_length": 12}"#).unwrap();
        let cx = cfg.new_context();
        assert_eq!(cx.derive_id(crate::Doc::Utxos, "0").len(), 12);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(LedgerConfig::from_json_str("{not json").is_err());
    }
}
