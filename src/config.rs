//! The YAML configuration surface of the gateway binary.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The gateway configuration, deserialized from a YAML document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Identifier of the object-store bucket served by the backend.
    #[serde(default)]
    pub bucket: String,

    /// Path prefix within the bucket.
    #[serde(default)]
    pub prefix: String,

    /// Control-connection listeners. Defaults to plain FTP on port 21.
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,

    /// Logging options.
    #[serde(default)]
    pub log: LogConfig,

    /// Authorization options.
    #[serde(default)]
    pub authorizer: AuthorizerConfig,

    /// Minimum port number for passive data connections. A minimum above
    /// the maximum disables passive mode.
    #[serde(default)]
    pub min_passive_port: i32,

    /// Maximum port number for passive data connections. Zero lets the
    /// operating system choose.
    #[serde(default)]
    pub max_passive_port: i32,

    /// Public addresses to advertise in PASV replies; the first IPv4 wins.
    #[serde(default)]
    pub public_ips: Vec<String>,

    /// Enables guessing the public IP from cloud metadata endpoints, for
    /// servers behind NAT. The prober is provided by the deployment.
    #[serde(default)]
    pub guess_public_ip: bool,

    /// Enables the PORT and EPRT commands. Off by default because active
    /// mode carries a bounce-attack risk and most clients use passive.
    #[serde(default)]
    pub enable_active_mode: bool,

    /// Requires data-connection peers to match the control peer. On by
    /// default.
    #[serde(default = "default_true")]
    pub enable_address_check: bool,

    /// File path of the PEM-encoded certificate chain.
    #[serde(default)]
    pub certificate: String,

    /// File path of the PEM-encoded certificate private key.
    #[serde(default)]
    pub certificate_key: String,
}

/// One control-connection listener.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// The address to listen on, e.g. `0.0.0.0:21` or `:21`.
    pub address: String,

    /// Serves implicit TLS on this listener.
    #[serde(default)]
    pub tls: bool,
}

/// Logging options.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// The log format: `text` (default) or `json`.
    #[serde(default)]
    pub format: String,
}

/// Authorization options.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizerConfig {
    /// The method: `userlist`, or empty for anonymous access.
    #[serde(default)]
    pub method: String,

    /// Method-specific configuration.
    #[serde(default = "null_value")]
    pub config: serde_yaml::Value,
}

impl Default for AuthorizerConfig {
    fn default() -> AuthorizerConfig {
        AuthorizerConfig {
            method: String::new(),
            config: serde_yaml::Value::Null,
        }
    }
}

fn null_value() -> serde_yaml::Value {
    serde_yaml::Value::Null
}

/// The `authorizer.config` document of the `userlist` method.
#[derive(Debug, Deserialize)]
pub struct UserListConfig {
    /// The users allowed to log in.
    pub users: Vec<UserEntry>,
}

/// One user of the `userlist` authorizer.
#[derive(Debug, Deserialize)]
pub struct UserEntry {
    /// The login name.
    pub name: String,

    /// The bcrypt hash of the password.
    pub password: String,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads the configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(&path).map_err(|err| ConfigError {
            msg: format!("could not open {}: {}", path.as_ref().display(), err),
        })?;
        let config: Config = serde_yaml::from_reader(BufReader::new(file)).map_err(|err| ConfigError {
            msg: format!("could not parse {}: {}", path.as_ref().display(), err),
        })?;
        Ok(config)
    }

    /// Parses the `userlist` sub-configuration.
    pub fn userlist(&self) -> Result<UserListConfig, ConfigError> {
        serde_yaml::from_value(self.authorizer.config.clone()).map_err(|err| ConfigError {
            msg: format!("invalid userlist configuration: {}", err),
        })
    }
}

/// The error returned when the configuration cannot be loaded.
#[derive(Debug, thiserror::Error)]
#[error("{msg}")]
pub struct ConfigError {
    msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_document() {
        let doc = r#"
bucket: my-bucket
prefix: ftp/
listeners:
  - address: "0.0.0.0:21"
  - address: "0.0.0.0:990"
    tls: true
log:
  format: json
authorizer:
  method: userlist
  config:
    users:
      - name: alice
        password: "$2b$10$hash"
min_passive_port: 50000
max_passive_port: 50100
public_ips:
  - 192.0.2.10
enable_active_mode: true
certificate: /etc/ftp/cert.pem
certificate_key: /etc/ftp/key.pem
"#;
        let config: Config = serde_yaml::from_str(doc).unwrap();
        assert_eq!(config.bucket, "my-bucket");
        assert_eq!(config.listeners.len(), 2);
        assert!(config.listeners[1].tls);
        assert_eq!(config.log.format, "json");
        assert_eq!(config.min_passive_port, 50000);
        assert!(config.enable_active_mode);
        assert!(config.enable_address_check);

        let userlist = config.userlist().unwrap();
        assert_eq!(userlist.users.len(), 1);
        assert_eq!(userlist.users[0].name, "alice");
    }

    #[test]
    fn defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.listeners.is_empty());
        assert!(!config.enable_active_mode);
        assert!(config.enable_address_check);
        assert_eq!(config.min_passive_port, 0);
        assert_eq!(config.max_passive_port, 0);
        assert!(config.authorizer.method.is_empty());
    }
}
