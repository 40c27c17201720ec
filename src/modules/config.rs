use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::proxy::ProxyConfig;

const DATA_DIR: &str = ".survey_proxy";
const CONFIG_FILE: &str = "config.json";

/// Get data directory path
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    Ok(home.join(DATA_DIR))
}

/// Default config file location, `~/.survey_proxy/config.json`
pub fn default_config_path() -> AppResult<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Load proxy config. A missing file yields the defaults.
pub fn load_proxy_config(path: &Path) -> AppResult<ProxyConfig> {
    if !path.exists() {
        tracing::debug!("Config file {:?} not found, using defaults", path);
        return Ok(ProxyConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = serde_json::from_str(&content)?;

    if !config.upstream_base_url.ends_with('/') {
        return Err(AppError::Config(format!(
            "upstream_base_url must end with '/': {}",
            config.upstream_base_url
        )));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_proxy_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.port, 8045);
        assert_eq!(config.request_timeout, 30);
    }

    #[test]
    fn test_loads_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "port": 9100, "request_timeout": 5, "upstream_proxy": {{ "enabled": true, "url": "socks5://127.0.0.1:1080" }} }}"#
        )
        .unwrap();

        let config = load_proxy_config(file.path()).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.request_timeout, 5);
        assert!(config.upstream_proxy.enabled);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_proxy_config(file.path()),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn test_base_url_without_trailing_slash_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "upstream_base_url": "https://api.alchemer.com/v5" }}"#).unwrap();
        assert!(matches!(
            load_proxy_config(file.path()),
            Err(AppError::Config(_))
        ));
    }
}
