//! # envrun Configuration
//!
//! This crate provides the configuration tree consumed by the envrun
//! resolution engine, together with the logic to load it from a TOML file.
//!
//! Only structural validity is checked here. Whether a backend type exists or a
//! variable declaration has a usable shape is decided by the engine, which
//! reports those problems with the backend and variable names attached.
//!
//! ## Configuration Structure
//!
//! A typical `.envrun.toml` file has this structure:
//!
//! ```toml
//! [vars.env]
//! API_KEY = "MY_API_KEY"          # read $MY_API_KEY, export it as API_KEY
//!
//! [vars.const]
//! GREETING = "hello"
//!
//! [vars.keyring]
//! DATABASE_PASSWORD = { key = "db-password" }
//!
//! [vars.git]
//! BUILD_SHA = "rev-parse HEAD"
//!
//! [backends.git]
//! type = "shell"
//! command = "git"
//! trim = true
//! ```
//!
//! Tables keep their declaration order, so variables are resolved in the order
//! they appear in the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".envrun.toml";

/// The parsed configuration tree.
///
/// Both sections default to empty tables so that a file declaring only
/// `vars` (the common case) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend name to a table of variable name to declaration.
    #[serde(default)]
    pub vars: toml::Table,
    /// User-declared backends: chosen name to a table with a `type` field.
    #[serde(default)]
    pub backends: toml::Table,
}

impl Config {
    /// Build a configuration from an already-parsed TOML table.
    ///
    /// Unknown top-level sections are ignored.
    pub fn from_table(table: toml::Table) -> Result<Self, ParseError> {
        Ok(toml::Value::Table(table).try_into()?)
    }

    /// Returns true when the configuration declares no variables at all.
    pub fn is_empty(&self) -> bool {
        self.vars.values().all(|vars| match vars {
            toml::Value::Table(table) => table.is_empty(),
            _ => false,
        })
    }
}

impl FromStr for Config {
    type Err = ParseError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl TryFrom<&Path> for Config {
    type Error = ParseError;

    /// Load configuration from a file path.
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParseError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;
        content.parse()
    }
}

/// Errors that can occur when loading envrun configuration files.
#[derive(Debug)]
pub enum ParseError {
    /// I/O error when reading the configuration file
    Io(io::Error),
    /// TOML syntax error or a section with the wrong shape
    Toml(toml::de::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(e) => write!(f, "{}", e),
            ParseError::Toml(e) => write!(f, "Invalid configuration: {}", e.message()),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Toml(e) => Some(e),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl From<toml::de::Error> for ParseError {
    fn from(e: toml::de::Error) -> Self {
        ParseError::Toml(e)
    }
}
