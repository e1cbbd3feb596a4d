use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root of the document store. Absent = `$XDG_DATA_HOME/taskdeck`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signed-in user. Absent = signed out (nothing is loaded or saved).
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level when neither `-v` nor `TASKDECK_LOG` is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.store.dir.is_none());
        assert!(config.session.user.is_none());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn sections_parse() {
        let config: AppConfig = toml::from_str(
            r#"
[store]
dir = "/tmp/decks"

[session]
user = "ada"

[log]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.store.dir, Some(PathBuf::from("/tmp/decks")));
        assert_eq!(config.session.user.as_deref(), Some("ada"));
        assert_eq!(config.log.level, "debug");
    }
}
