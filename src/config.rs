use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    // Directory where per-request payload files are created
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    // Interpreter used to launch the validator jar
    #[serde(default = "default_java_path")]
    pub java_path: String,

    #[serde(default = "default_validator_jar")]
    pub validator_jar: String,

    // Kill a validator run after this many seconds (no limit when unset)
    #[serde(default)]
    pub validator_timeout_secs: Option<u64>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn validator_timeout(&self) -> Option<Duration> {
        self.validator_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            work_dir: default_work_dir(),
            java_path: default_java_path(),
            validator_jar: default_validator_jar(),
            validator_timeout_secs: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_port() -> u16 {
    8081
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_java_path() -> String {
    "java".to_string()
}

fn default_validator_jar() -> String {
    "validator_cli.jar".to_string()
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}
