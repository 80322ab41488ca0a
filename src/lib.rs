//! envrun - Run a command with variables resolved from pluggable backends
//!
//! A declaration file maps environment variable names to keys in backends:
//! the process environment, files, constants, shell commands and the system
//! keyring. envrun resolves every declared variable, asks for anything that
//! is missing when allowed to, stores what it was given where the backend
//! supports it, and runs a command with the result.
//!
//! # Features
//!
//! - **Declarative Configuration**: Define variables in `.envrun.toml`
//! - **Multiple Backends**: env, file, const, shell, keyring, and plugins
//! - **Named Instances**: Several configured instances of one backend type
//! - **Missing-Value Recovery**: Prompt once, store in writable backends
//!
//! # Example
//!
//! ```no_run
//! use envrun::{Config, Environment, Recovery, Registry, launch, resolve};
//! use envrun::registry::LinkedPlugins;
//! use std::path::Path;
//!
//! fn main() -> envrun::Result<()> {
//!     let config = Config::try_from(Path::new(".envrun.toml"))?;
//!     let environment = Environment::capture();
//!
//!     let registry = Registry::build(&config, false, &environment, &LinkedPlugins)?;
//!     let vars = resolve(&config, &registry, &Recovery::non_interactive())?;
//!
//!     let command = vec!["printenv".to_string()];
//!     let code = launch(&command, &vars, false)?;
//!     std::process::exit(code);
//! }
//! ```

pub mod backend;
mod environment;
mod error;
pub mod launcher;
pub mod recovery;
pub mod registry;
pub mod resolver;

// CLI support (feature-gated)
#[cfg(feature = "cli")]
pub mod logging;

pub use backend::{Backend, BackendInfo, BackendParams};
pub use environment::Environment;
pub use error::{EnvrunError, Result};
pub use launcher::launch;
pub use recovery::{Prompt, Recovery, TerminalPrompt};
pub use registry::Registry;
pub use resolver::resolve;

pub use envrun_config::{Config, DEFAULT_CONFIG_FILE, ParseError};
