use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defs::{DEFAULT_MAX_CARDS_FREE, DEFAULT_MAX_CARDS_PER_REQUEST, DEFAULT_MAX_ITEMS_PER_GAME};
use crate::limits::PlanLimits;
use crate::logging::LogLevel;

pub const SERVER_CONFIG_PATH: &str = "conf/server.conf";
pub const CLIENT_CONFIG_PATH: &str = "conf/client.conf";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub max_items_per_game: usize,
    pub max_cards_free: usize,
    pub max_cards_per_request: usize,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout: u64,
    pub user_id: String,
    pub state_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: PathBuf::from("data/bingo.db"),
            max_items_per_game: DEFAULT_MAX_ITEMS_PER_GAME,
            max_cards_free: DEFAULT_MAX_CARDS_FREE,
            max_cards_per_request: DEFAULT_MAX_CARDS_PER_REQUEST,
            log_level: LogLevel::Info,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            timeout: 30,
            user_id: "local-user".to_string(),
            state_path: PathBuf::from("data/caller-state.json"),
        }
    }
}

fn get_parsed<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn get_string(map: &HashMap<String, String>, key: &str, default: &str) -> String {
    map.get(key).cloned().unwrap_or_else(|| default.to_string())
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_config(&content)?))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            host: get_string(map, "host", &defaults.host),
            port: get_parsed(map, "port", defaults.port),
            database_path: map.get("database_path").map(PathBuf::from).unwrap_or(defaults.database_path),
            max_items_per_game: get_parsed(map, "max_items_per_game", defaults.max_items_per_game),
            max_cards_free: get_parsed(map, "max_cards_free", defaults.max_cards_free),
            max_cards_per_request: get_parsed(map, "max_cards_per_request", defaults.max_cards_per_request),
            log_level: map.get("log_level")
                .and_then(|l| LogLevel::parse(l))
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn load_from_or_default<P: AsRef<Path>>(config_path: P) -> Self {
        let config_path = config_path.as_ref();
        match Self::from_file(config_path) {
            Ok(config) => {
                println!("📄 Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                println!("⚠️  Could not load config from {}: {}. Using defaults.", config_path.display(), e);
                Self::default()
            }
        }
    }

    pub fn plan_limits(&self) -> PlanLimits {
        PlanLimits {
            max_items_per_game: self.max_items_per_game,
            max_cards_free: self.max_cards_free,
            max_cards_per_request: self.max_cards_per_request,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let map = parse_config(&content)?;
        let defaults = Self::default();

        Ok(ClientConfig {
            host: get_string(&map, "host", &defaults.host),
            port: get_parsed(&map, "port", defaults.port),
            timeout: get_parsed(&map, "timeout", defaults.timeout),
            user_id: get_string(&map, "user_id", &defaults.user_id),
            state_path: map.get("state_path").map(PathBuf::from).unwrap_or(defaults.state_path),
        })
    }

    pub fn load_or_default() -> Self {
        match Self::from_file(CLIENT_CONFIG_PATH) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("⚠️  Could not load client config from {CLIENT_CONFIG_PATH}: {e}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_config(content: &str) -> Result<HashMap<String, String>, Box<dyn std::error::Error>> {
    let mut config = HashMap::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                config.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => return Err(format!("line {}: expected `key = value`, got `{line}`", line_no + 1).into()),
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
            # This is a comment
            host = 0.0.0.0
            port = 8080
            # Another comment
            max_items_per_game = 100
        "#;

        let config = parse_config(content).unwrap();
        assert_eq!(config.get("host"), Some(&"0.0.0.0".to_string()));
        assert_eq!(config.get("port"), Some(&"8080".to_string()));
        assert_eq!(config.get("max_items_per_game"), Some(&"100".to_string()));
    }

    #[test]
    fn test_parse_config_rejects_garbage_line() {
        let err = parse_config("port 8080").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_items_per_game, 75);
        assert_eq!(config.max_cards_free, 50);
        assert_eq!(config.max_cards_per_request, 100);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_server_config_from_map_with_bad_values() {
        let map = parse_config("port = not-a-port\nmax_cards_free = 10\nmax_cards_per_request = 20\nlog_level = debug\ndatabase_path = /tmp/b.db").unwrap();
        let config = ServerConfig::from_map(&map);
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_cards_free, 10);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.database_path, PathBuf::from("/tmp/b.db"));

        let limits = config.plan_limits();
        assert_eq!(limits.max_cards_free, 10);
        assert_eq!(limits.max_items_per_game, 75);
        assert_eq!(limits.max_cards_per_request, 20);
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.user_id, "local-user");
    }

    #[test]
    fn test_client_config_server_url() {
        let config = ClientConfig {
            host: "192.168.1.100".to_string(),
            port: 8080,
            ..ClientConfig::default()
        };
        assert_eq!(config.server_url(), "http://192.168.1.100:8080");
    }

    #[test]
    fn test_client_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.conf");
        fs::write(&path, "user_id = host-42\nstate_path = /tmp/caller.json\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.user_id, "host-42");
        assert_eq!(config.state_path, PathBuf::from("/tmp/caller.json"));
        assert_eq!(config.port, 3000);
    }
}
