use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::ServiceKeyMode;
use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "adaverse.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Pre-shared secret expected in the `x-api-key` header.
    pub api_key: Option<String>,
    /// Serve without a service key. Intended for local development only.
    pub insecure_no_api_key: bool,
}

impl ServerConfig {
    /// Loads `<data_dir>/adaverse.toml` when present, otherwise defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<ServerConfig>(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            ServerConfig::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("adaverse.db")
    }

    /// Decides once, at startup, how requests are gated.
    ///
    /// A missing key is an error unless `insecure_no_api_key` is set.
    pub fn resolve_service_key(&self) -> Result<ServiceKeyMode> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(ServiceKeyMode::Required(key.to_string())),
            _ if self.insecure_no_api_key => {
                tracing::warn!(
                    "No API key configured and insecure mode requested: every request will bypass the service key check"
                );
                Ok(ServiceKeyMode::Disabled)
            }
            _ => Err(Error::Config(
                "no API key configured; set ADAVERSE_API_KEY or pass --insecure-no-api-key"
                    .to_string(),
            )),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            api_key: None,
            insecure_no_api_key: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::load(dir.path()).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.db_path(), dir.path().join("adaverse.db"));
    }

    #[test]
    fn test_load_reads_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "host = \"0.0.0.0\"\nport = 9000\napi_key = \"s3cret\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(dir.path()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.resolve_service_key().unwrap(),
            ServiceKeyMode::Required("s3cret".to_string())
        );
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "port = \"not a number\"").unwrap();

        assert!(matches!(
            ServerConfig::load(dir.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_key_requires_explicit_insecure_flag() {
        let mut config = ServerConfig::default();
        assert!(matches!(config.resolve_service_key(), Err(Error::Config(_))));

        config.api_key = Some("   ".to_string());
        assert!(config.resolve_service_key().is_err());

        config.insecure_no_api_key = true;
        assert_eq!(config.resolve_service_key().unwrap(), ServiceKeyMode::Disabled);
    }
}
