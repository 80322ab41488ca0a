//! # Backend System
//!
//! A backend is a pluggable source (and optionally sink) for single string
//! values addressed by a key. The resolver asks a backend for the value of a
//! key, and when the value is missing it may hand a recovered value back for
//! storage.
//!
//! ## Architecture
//!
//! Every backend implements the [`Backend`] trait. Its two operations keep
//! three outcomes apart:
//!
//! - `read` returns `Ok(Some(value))` when the key exists, `Ok(None)` when it
//!   does not, and `Err` for anything else (I/O errors, failed commands, a
//!   locked secret store). Only `Ok(None)` triggers the missing-value flow.
//! - `write` returns [`EnvrunError::WriteUnsupported`] on read-only backends.
//!   Callers match that variant explicitly; every other error is fatal.
//!
//! ## Built-in Backends
//!
//! - [`EnvBackend`]: environment variables (read-only)
//! - [`ConstBackend`]: the key itself (read-only)
//! - [`FileBackend`]: file contents (read-only)
//! - [`ShellBackend`]: standard output of a shell command (read-only)
//! - [`KeyringBackend`]: the system secret store (read-write)
//!
//! External crates add implementations with [`register_backend!`](crate::register_backend).

use crate::environment::Environment;
use crate::{EnvrunError, Result};

pub mod constant;
pub mod env;
pub mod file;
pub mod keyring;
#[macro_use]
pub mod macros;
pub mod shell;

#[cfg(test)]
pub(crate) mod tests;

pub use constant::ConstBackend;
pub use env::EnvBackend;
pub use file::FileBackend;
pub use keyring::KeyringBackend;
pub use macros::{BACKEND_PLUGINS, BackendFactory, BackendRegistration};
pub use shell::ShellBackend;

/// Information about a backend implementation.
///
/// Used when listing the implementations a `type` field may name.
#[derive(Debug, Clone, Copy)]
pub struct BackendInfo {
    /// The type name used in `[backends.<name>] type = "..."`.
    pub name: &'static str,
    /// A human-readable description of what the backend does.
    pub description: &'static str,
    /// Example declarations using this backend.
    pub examples: &'static [&'static str],
}

impl BackendInfo {
    /// Formats the backend information for display, including examples if available.
    pub fn display_with_examples(&self) -> String {
        if self.examples.is_empty() {
            format!("{}: {}", self.name, self.description)
        } else {
            format!(
                "{}: {} (e.g., {})",
                self.name,
                self.description,
                self.examples.join(", ")
            )
        }
    }
}

/// Everything a backend instance is constructed from.
#[derive(Debug, Clone)]
pub struct BackendParams {
    /// The name the backend is registered under. For user-declared backends
    /// this is the chosen name, not the type.
    pub name: String,
    /// Whether the invocation may prompt the user.
    pub interactive: bool,
    /// Empty for built-ins; the full `[backends.<name>]` table otherwise.
    pub config: toml::Table,
    /// Environment snapshot of the invocation.
    pub environment: Environment,
}

impl BackendParams {
    pub fn new(
        name: impl Into<String>,
        interactive: bool,
        config: toml::Table,
        environment: Environment,
    ) -> Self {
        Self {
            name: name.into(),
            interactive,
            config,
            environment,
        }
    }

    /// Reads an optional string option from the backend configuration.
    pub fn string_option(&self, option: &str) -> Result<Option<&str>> {
        match self.config.get(option) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.invalid_option(option, "a string", other)),
        }
    }

    /// Reads an optional boolean option, `false` when absent.
    pub fn bool_option(&self, option: &str) -> Result<bool> {
        match self.config.get(option) {
            None => Ok(false),
            Some(toml::Value::Boolean(b)) => Ok(*b),
            Some(other) => Err(self.invalid_option(option, "a boolean", other)),
        }
    }

    fn invalid_option(&self, option: &str, expected: &str, found: &toml::Value) -> EnvrunError {
        EnvrunError::InvalidConfig(format!(
            "option '{}' of backend '{}' must be {}, found {}",
            option,
            self.name,
            expected,
            found.type_str()
        ))
    }
}

/// Trait defining the interface for value backends.
///
/// # Implementation Guidelines
///
/// - Report a missing key as `Ok(None)`, never as an error
/// - Read-only backends keep the default [`write`](Backend::write) and
///   [`allows_write`](Backend::allows_write)
/// - Read from [`BackendParams::environment`], never from the live process
///   environment
pub trait Backend: Send + Sync {
    /// The parameters this instance was created with.
    fn params(&self) -> &BackendParams;

    /// The implementation name, e.g. `"shell"` for every shell backend
    /// regardless of what it was registered as.
    fn kind(&self) -> &'static str;

    /// Retrieves the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err` if the backend could not be queried
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`.
    ///
    /// The default implementation rejects the write with
    /// [`EnvrunError::WriteUnsupported`].
    fn write(&self, _key: &str, _value: &str) -> Result<()> {
        Err(EnvrunError::WriteUnsupported {
            backend: self.name().to_string(),
        })
    }

    /// Declaration fields, besides `key`, that name the key to read.
    ///
    /// A table declaration may set at most one of `key` and these fields, and
    /// any other field is rejected.
    fn key_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns whether this backend supports [`write`](Backend::write).
    fn allows_write(&self) -> bool {
        false
    }

    /// The name this instance is registered under.
    fn name(&self) -> &str {
        &self.params().name
    }

    fn interactive(&self) -> bool {
        self.params().interactive
    }
}
