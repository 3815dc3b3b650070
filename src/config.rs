use std::{fmt, str::FromStr};

use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ConfigError {
    #[error("expected \"<host> <port>\", got '{0}'")]
    InvalidReplicaOf(String),
    #[error("invalid master port '{0}'")]
    InvalidPort(String),
}

/// Address of the master a replica follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaOf {
    pub host: String,
    pub port: u16,
}

impl FromStr for ReplicaOf {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();

        let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ConfigError::InvalidReplicaOf(input.to_string()));
        };

        let port = port
            .parse::<u16>()
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| ConfigError::InvalidPort(port.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ReplicaOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "redis-relay", about = "in-memory key-value server speaking RESP")]
pub struct ServerConfig {
    /// port to listen on
    #[arg(short, long, default_value_t = 6379)]
    pub port: u16,

    /// directory holding the snapshot file
    #[arg(long, default_value = ".")]
    pub dir: String,

    /// snapshot file name inside --dir
    #[arg(long, default_value = "dump.rdb")]
    pub dbfilename: String,

    /// run as a replica of "<host> <port>"
    #[arg(long)]
    pub replicaof: Option<ReplicaOf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6379,
            dir: ".".to_string(),
            dbfilename: "dump.rdb".to_string(),
            replicaof: None,
        }
    }
}

impl ServerConfig {
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    pub fn is_replica(&self) -> bool {
        self.replicaof.is_some()
    }
}
