//! Locating and loading the poller configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use popwatch_core::PollerConfig;

/// Environment variable that supplies or overrides the password.
pub const PASSWORD_ENV: &str = "POPWATCH_PASSWORD";

const APP_DIR: &str = "popwatch";

/// Default configuration file: `<config_dir>/popwatch/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

/// State database path, creating its directory if needed.
pub async fn state_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);

    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("creating {}", data_dir.display()))?;

    Ok(data_dir.join("state.db"))
}

/// Reads the configuration file and applies the password override.
pub async fn load_config(
    path: &Path,
    password_override: Option<String>,
) -> anyhow::Result<PollerConfig> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let mut config = PollerConfig::from_json(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;

    if let Some(password) = password_override.filter(|p| !p.is_empty()) {
        config.password = password;
    }

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("popwatch-{}-{name}", std::process::id()));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    const CONFIG: &str =
        r#"{"host": "pop.example.com", "username": "alice", "password": "from-file"}"#;

    #[tokio::test]
    async fn test_load_config() {
        let path = write_temp("load.json", CONFIG).await;
        let config = load_config(&path, None).await.unwrap();
        assert_eq!(config.host, "pop.example.com");
        assert_eq!(config.password, "from-file");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_password_override() {
        let path = write_temp("override.json", CONFIG).await;

        let config = load_config(&path, Some("from-env".into())).await.unwrap();
        assert_eq!(config.password, "from-env");

        let config = load_config(&path, Some(String::new())).await.unwrap();
        assert_eq!(config.password, "from-file");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/popwatch.json"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reading"));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let path = write_temp("bad.json", "{not json").await;
        let err = load_config(&path, None).await.unwrap_err();
        assert!(err.to_string().contains("parsing"));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with("popwatch/config.json"));
    }
}
