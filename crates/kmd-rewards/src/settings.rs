//! Settings
//!
//! Defaults can be overridden by a TOML file and then by environment
//! variables prefixed with `KMD_REWARDS`, using `__` as separator
//! (`KMD_REWARDS__FEES__TX_FEE=10000`).

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::fees::FeeSchedule;
use crate::Error;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "KMD_REWARDS";

const DEFAULT_TITLE: &str = "Scanning Blockchain for Rewards";
const DEFAULT_BODY: &str = "Exporting public keys from your Ledger device, scanning the blockchain for funds, and calculating any claimable rewards. Please approve any public key export requests on your device.";

/// Text shown while a scan is running
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Title of the progress dialog
    pub title: String,
    /// Explanation shown above the steps
    pub body: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}

/// Reward scan settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fees applied to rewards
    pub fees: FeeSchedule,
    /// Progress dialog text
    pub scan: ScanSettings,
}

impl Settings {
    /// Load settings from an optional TOML file and the environment
    pub fn new<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self, Error> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path.as_ref()).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.fees.validate()?;

        tracing::debug!("Loaded settings: {:?}", settings);

        Ok(settings)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, Error> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.fees.validate()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.fees, FeeSchedule::default());
        assert_eq!(settings.scan.title, "Scanning Blockchain for Rewards");
    }

    #[test]
    fn test_from_toml_overrides_fees() {
        let settings = Settings::from_toml(
            r#"
            [fees]
            service_fee_percent = 10
            tx_fee = 100
            "#,
        )
        .unwrap();

        assert_eq!(settings.fees, FeeSchedule::new(10, Amount::from(100)));
        assert_eq!(settings.scan, ScanSettings::default());
    }

    #[test]
    fn test_from_toml_partial_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [scan]
            title = "Checking rewards"
            "#,
        )
        .unwrap();

        assert_eq!(settings.fees, FeeSchedule::default());
        assert_eq!(settings.scan.title, "Checking rewards");
        assert_eq!(settings.scan.body, ScanSettings::default().body);
    }

    fn temp_config_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("kmd-rewards-{}.toml", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_new_layers_env_over_file() {
        let path = temp_config_path();
        std::fs::write(
            &path,
            r#"
            [fees]
            service_fee_percent = 10
            tx_fee = 100

            [scan]
            title = "Checking rewards"
            "#,
        )
        .unwrap();

        std::env::set_var("KMD_REWARDS__FEES__TX_FEE", "7000");
        let settings = Settings::new(Some(&path));

        std::env::set_var("KMD_REWARDS__FEES__SERVICE_FEE_PERCENT", "150");
        let invalid = Settings::new(Some(&path));

        std::env::remove_var("KMD_REWARDS__FEES__TX_FEE");
        std::env::remove_var("KMD_REWARDS__FEES__SERVICE_FEE_PERCENT");
        std::fs::remove_file(&path).unwrap();

        let settings = settings.unwrap();
        assert_eq!(settings.fees, FeeSchedule::new(10, Amount::from(7000)));
        assert_eq!(settings.scan.title, "Checking rewards");
        assert_eq!(settings.scan.body, ScanSettings::default().body);

        assert!(matches!(invalid, Err(Error::InvalidFeeSchedule(_))));
    }

    #[test]
    fn test_new_requires_given_file() {
        let path = temp_config_path();
        assert!(matches!(Settings::new(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_toml_rejects_invalid_fee() {
        let result = Settings::from_toml(
            r#"
            [fees]
            service_fee_percent = 150
            "#,
        );
        assert!(matches!(result, Err(Error::InvalidFeeSchedule(_))));
    }
}
