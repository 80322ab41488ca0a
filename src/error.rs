//! Error types for envrun operations

use std::path::PathBuf;
use thiserror::Error;

use envrun_config::ParseError;

/// The main error type for envrun operations
///
/// Every variant except [`EnvrunError::WriteUnsupported`] is fatal for an
/// invocation. Absence of a key is not an error at all: backends report it as
/// `Ok(None)` from [`Backend::read`](crate::backend::Backend::read).
#[derive(Error, Debug)]
pub enum EnvrunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(#[from] ParseError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Backend '{0}' is not defined")]
    UnknownBackend(String),
    #[error("Unsupported backend type '{kind}' for backend '{name}'")]
    UnsupportedBackendType { name: String, kind: String },
    #[error("Backend '{0}' has no 'type' field")]
    MissingBackendType(String),
    #[error("Invalid declaration for variable {0}: expected a string or a table")]
    InvalidDeclaration(String),
    #[error("Unknown field '{field}' in declaration of variable {variable}")]
    UnknownDeclarationField { variable: String, field: String },
    #[error("Backend '{backend}' does not support storing values")]
    WriteUnsupported { backend: String },
    #[error("Key {0} not set. Set it manually or run with -i flag.")]
    MissingValue(String),
    #[error("Secret storage locked. Unlock it or run with -i flag.")]
    StoreLocked,
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[cfg(target_os = "linux")]
    #[error("Secret storage error: {0}")]
    SecretStore(#[from] secret_service::Error),
    #[cfg(not(target_os = "linux"))]
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("{key}: {source}")]
    BackendFailure {
        key: String,
        #[source]
        source: Box<EnvrunError>,
    },
    #[error("Backend operation failed: {0}")]
    BackendOperationFailed(String),
    #[error("User interaction error: {0}")]
    Prompt(#[from] inquire::InquireError),
    #[error("No command specified. Usage: envrun [OPTIONS] -- <command> [args...]")]
    EmptyCommand,
    #[error("Command not found: {0}")]
    CommandNotFound(String),
}

/// A type alias for `Result<T, EnvrunError>`
pub type Result<T> = std::result::Result<T, EnvrunError>;
