// Configuration module entry point
// Loads layered configuration: optional file, environment, built-in defaults

mod types;

use std::net::SocketAddr;

pub use types::Config;

/// Config file looked up in the working directory (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "dashserve";

/// Route prefixes served when nothing else is configured
pub const DEFAULT_ROUTES: [&str; 2] = ["/localbackend/", "/webbackend/"];

impl Config {
    /// Load configuration from the default file name
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; defaults reproduce the fixed setup
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DASHSERVE").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 1024)?
            .set_default("logging.access_log", true)?
            .set_default("files.root", ".")?
            .set_default("files.routes", DEFAULT_ROUTES.to_vec())?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.files.routes = normalize_routes(&cfg.files.routes)?;
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Ensure every prefix starts and ends with `/`
fn normalize_routes(routes: &[String]) -> Result<Vec<String>, config::ConfigError> {
    if routes.is_empty() {
        return Err(config::ConfigError::Message(
            "files.routes must contain at least one prefix".to_string(),
        ));
    }

    Ok(routes
        .iter()
        .map(|r| {
            let trimmed = r.trim().trim_matches('/');
            if trimmed.is_empty() {
                "/".to_string()
            } else {
                format!("/{trimmed}/")
            }
        })
        .collect())
}
