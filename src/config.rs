use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FrontDeskError;
use crate::structs::RoleId;

pub const DEFAULT_CONFIG_PATH: &str = "./frontdesk.toml";

fn default_timeout_secs() -> u64 {
    10
}

fn default_session_storage_dir() -> PathBuf {
    PathBuf::from("./.frontdesk/session")
}

fn default_local_storage_dir() -> PathBuf {
    PathBuf::from("./.frontdesk/local")
}

fn default_refresh_cron() -> String {
    "0 */5 * * * *".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrontDeskConfig {
    /// Root of the booking/room REST service, e.g. `http://localhost:4000/api`.
    pub base_url: String,
    /// Sent as a bearer token when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Role handed to the room controls explicitly. Zero or absent means
    /// "look it up".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    #[serde(default = "default_session_storage_dir")]
    pub session_storage_dir: PathBuf,
    #[serde(default = "default_local_storage_dir")]
    pub local_storage_dir: PathBuf,
    /// Six field cron expression (with seconds) for the background refresh.
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,
}

impl FrontDeskConfig {
    pub fn new(base_url: &str) -> Self {
        FrontDeskConfig {
            base_url: base_url.to_string(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
            role_id: None,
            session_storage_dir: default_session_storage_dir(),
            local_storage_dir: default_local_storage_dir(),
            refresh_cron: default_refresh_cron(),
        }
    }

    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, FrontDeskError> {
        let config_str = std::fs::read_to_string(config_path)?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self, FrontDeskError> {
        let config: FrontDeskConfig = toml::from_str(config_str)?;
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(FrontDeskError::Config(format!(
                "base_url must be an http(s) url, got {:?}",
                config.base_url
            )));
        }
        Ok(config)
    }

    pub fn write_toml(&self, config_path: impl AsRef<Path>) -> Result<(), FrontDeskError> {
        let config_str =
            toml::to_string(self).map_err(|e| FrontDeskError::Config(e.to_string()))?;
        std::fs::write(config_path, config_str)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = FrontDeskConfig::parse(r#"base_url = "http://localhost:4000/api""#).unwrap();
        assert_eq!(config, FrontDeskConfig::new("http://localhost:4000/api"));
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.refresh_cron, "0 */5 * * * *");
    }

    #[test]
    fn full_config_parses() {
        let config = FrontDeskConfig::parse(
            r#"
            base_url = "https://hotel.example/api"
            access_token = "secret"
            timeout_secs = 3
            role_id = 4
            session_storage_dir = "/tmp/s"
            local_storage_dir = "/tmp/l"
            refresh_cron = "0 0 * * * *"
            "#,
        )
        .unwrap();
        assert_eq!(config.access_token.as_deref(), Some("secret"));
        assert_eq!(config.role_id, Some(4));
        assert_eq!(config.local_storage_dir, PathBuf::from("/tmp/l"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = FrontDeskConfig::parse(r#"base_url = "localhost""#).unwrap_err();
        assert!(matches!(err, FrontDeskError::Config(_)));
        assert!(matches!(
            FrontDeskConfig::parse("timeout_secs = 2").unwrap_err(),
            FrontDeskError::ConfigFile(_)
        ));
    }

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frontdesk.toml");
        let mut config = FrontDeskConfig::new("http://127.0.0.1:4000");
        config.role_id = Some(1);
        config.write_toml(&path).unwrap();
        assert_eq!(FrontDeskConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn cleared_role_is_dropped_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frontdesk.toml");
        let mut config = FrontDeskConfig::new("http://127.0.0.1:4000");
        config.role_id = Some(4);
        config.write_toml(&path).unwrap();

        config.role_id = None;
        config.write_toml(&path).unwrap();

        assert!(!std::fs::read_to_string(&path).unwrap().contains("role_id"));
        assert_eq!(FrontDeskConfig::load(&path).unwrap().role_id, None);
    }
}
