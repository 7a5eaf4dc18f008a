use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Arg, Command};
use serde::Deserialize;
use thiserror::Error;

/// The full configuration of the save server. Every section is optional; by
/// default the server listens on every interface on port 8090 and saves to
/// `gamestate.json` in the working directory.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// How the HTTP side of the server is set up
    pub server: ServerConfiguration,
    /// Where saved game state ends up on disk
    pub storage: StorageConfiguration,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfiguration {
    /// The socket address the server binds to
    pub listen_address: SocketAddr,
    /// The largest save payload, in bytes, that will be accepted. Requests
    /// declaring a larger `Content-Length` are rejected before any of the
    /// body is read.
    pub max_payload_size: u64,
    /// Serve GET requests from `web_root`. The game client polls the saved
    /// state file this way, so it should stay enabled unless something else
    /// is serving the client.
    pub serve_static: bool,
    /// Directory static files are served from
    pub web_root: PathBuf,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 8090)),
            max_payload_size: 1024 * 256,
            serve_static: true,
            web_root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfiguration {
    /// The file every save overwrites
    pub state_file: PathBuf,
}

impl Default for StorageConfiguration {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("gamestate.json"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("There was an error finding or reading the configuration file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("The format of the configuration file was incorrect: {0}")]
    ParsingError(#[from] toml::de::Error),
    #[error("The maximum payload size must be non zero")]
    PayloadLimitInvalid,
    #[error("The state file must be a path to a file")]
    StateFileInvalid,
}

pub fn configure() -> Result<Configuration, ConfigurationError> {
    let matches = Command::new("gamesave - keep the latest game state on disk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Accepts game state on POST /save and writes it to a local file.")
        .arg(
            Arg::new("config")
                .help("Path to the configuration toml file. Built-in defaults are used when omitted")
                .long("config"),
        )
        .get_matches();

    match matches.get_one::<String>("config") {
        Some(config_path) => read_configuration(config_path),
        None => {
            info!("No configuration file given, using built-in defaults");
            Ok(Configuration::default())
        }
    }
}

/// Read a configuration file from disk, then parse and validate it.
pub fn read_configuration(config_path: &str) -> Result<Configuration, ConfigurationError> {
    let config = match std::fs::read_to_string(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Encountered file error when trying to read configuration at {config_path}. Error: {e}");
            return Err(e.into());
        }
    };

    parse_configuration(&config)
}

/// Parse a TOML configuration and check the values serde cannot.
pub fn parse_configuration(config: &str) -> Result<Configuration, ConfigurationError> {
    let config: Configuration = toml::from_str(config)?;

    if config.server.max_payload_size == 0 {
        return Err(ConfigurationError::PayloadLimitInvalid);
    }

    // Saves are staged next to the target and renamed over it, so there
    // has to be a file name to stage against.
    if config.storage.state_file.file_name().is_none() {
        return Err(ConfigurationError::StateFileInvalid);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_listen_on_8090_and_save_beside_the_client() {
        let config = Configuration::default();
        assert_eq!(config.server.listen_address, "0.0.0.0:8090".parse().unwrap());
        assert_eq!(config.storage.state_file, PathBuf::from("gamestate.json"));
        assert!(config.server.serve_static);
        assert_eq!(config.server.web_root, PathBuf::from("."));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_configuration("").unwrap();
        assert_eq!(config.server.listen_address.port(), 8090);
        assert_eq!(config.server.max_payload_size, 1024 * 256);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_configuration(
            r#"
            [server]
            listen_address = "127.0.0.1:9000"

            [storage]
            state_file = "saves/chess.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_address, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.server.max_payload_size, 1024 * 256);
        assert!(config.server.serve_static);
        assert_eq!(config.storage.state_file, PathBuf::from("saves/chess.json"));
    }

    #[test]
    fn zero_payload_limit_is_rejected() {
        let result = parse_configuration("[server]\nmax_payload_size = 0\n");
        assert!(matches!(result, Err(ConfigurationError::PayloadLimitInvalid)));
    }

    #[test]
    fn state_file_without_name_is_rejected() {
        let result = parse_configuration("[storage]\nstate_file = \"..\"\n");
        assert!(matches!(result, Err(ConfigurationError::StateFileInvalid)));
    }

    #[test]
    fn bad_listen_address_is_a_parsing_error() {
        let result = parse_configuration("[server]\nlisten_address = \"not an address\"\n");
        assert!(matches!(result, Err(ConfigurationError::ParsingError(_))));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = read_configuration(path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigurationError::FileError(_))));
    }

    #[test]
    fn bundled_configuration_is_valid() {
        let config = read_configuration(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/gamesave.toml"
        ))
        .unwrap();
        assert_eq!(config.server.listen_address, Configuration::default().server.listen_address);
    }

    #[test]
    fn reads_configuration_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nserve_static = false").unwrap();

        let config = read_configuration(file.path().to_str().unwrap()).unwrap();
        assert!(!config.server.serve_static);
    }
}
