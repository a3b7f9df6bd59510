use std::path::PathBuf;
use std::str::FromStr;

/// Non-empty, trimmed value of an environment variable
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Boolean flag; anything except "0" / "false" counts as set
pub fn env_flag(key: &str, default: bool) -> bool {
    env_string(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

/// Parse a variable, falling back to `default` when unset or invalid
pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory with the browser client bundle
    pub static_dir: PathBuf,
    /// Where uploaded photos are written
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// JSON snapshot mirrored after every change (None = memory only)
    pub data_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            static_dir: PathBuf::from("static"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            data_file: None,
        }
    }
}

impl ServerConfig {
    /// Load server config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            port: env_parse("HUNT_PORT", defaults.port),
            static_dir: env_string("HUNT_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            upload_dir: env_string("HUNT_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_parse("HUNT_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            data_file: env_string("HUNT_DATA_FILE").map(PathBuf::from),
        };

        if config.data_file.is_none() {
            tracing::warn!("HUNT_DATA_FILE not set - all data is lost on restart");
        }
        tracing::info!(
            port = config.port,
            static_dir = %config.static_dir.display(),
            upload_dir = %config.upload_dir.display(),
            max_upload_bytes = config.max_upload_bytes,
            "Server config loaded"
        );
        config
    }
}
