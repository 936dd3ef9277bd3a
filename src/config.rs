use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) server_url: Option<String>,
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    #[serde(default)]
    pub(crate) http_configuration: Option<PathBuf>,
    #[serde(default)]
    pub(crate) minion_id_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub(crate) poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub(crate) start_timeout_secs: Option<u64>,
    #[serde(default)]
    pub(crate) simulate_interval_ms: Option<u64>,
    #[serde(default)]
    pub(crate) watch_interval_ms: Option<u64>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) color: Option<ConfigColorMode>,
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) debug: bool,
    /// File the values came from
    #[serde(skip)]
    pub(crate) source: Option<PathBuf>,
}

impl Config {
    /// Load `explicit` if given, otherwise the first parseable default location
    pub(crate) fn load(explicit: Option<&Path>) -> Self {
        let config_paths = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => Self::get_config_paths(),
        };

        for path in config_paths {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match Self::parse(&content) {
                    Ok(mut config) => {
                        config.source = Some(path);
                        return config;
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::default()
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/flexlogger-tags/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(
                home.join(".config")
                    .join("flexlogger-tags")
                    .join("config.toml"),
            );
        }

        // 2. Platform config dir (Application Support, AppData\Roaming)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("flexlogger-tags").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.flexlogger-tags.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".flexlogger-tags.toml"));
        }

        paths
    }
}
