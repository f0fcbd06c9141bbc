//! Optional `starlog.toml` supplying defaults for CLI flags. Flags always
//! win over config values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StarlogConfig {
    /// SQLite database path for the sqlite sink and search.
    pub database: Option<String>,
    /// Default output format name for the format command.
    pub format: Option<String>,
    /// Default bulk-index target index name.
    pub index_name: Option<String>,
    /// Default strftime-style date format.
    pub date_format: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("starlog.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StarlogConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StarlogConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: StarlogConfig = toml::from_str(
            r#"
            database = "stars.db"
            format = "sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("stars.db"));
        assert_eq!(config.format.as_deref(), Some("sqlite"));
        assert_eq!(config.index_name, None);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("starlog.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }
}
