//! Runs the user's command with the resolved variables.

use crate::{EnvrunError, Result};
use std::collections::HashMap;
use std::io;
use std::process::Command;

/// Runs `command` and waits for it, returning its exit code.
///
/// The child inherits envrun's own environment, including variables that are
/// not valid unicode, with `vars` layered on top. With `isolate` it sees only
/// `vars`. Standard input and output are inherited. A child killed by a
/// signal is reported as exit code 1.
///
/// # Errors
///
/// - [`EnvrunError::EmptyCommand`] if `command` is empty
/// - [`EnvrunError::CommandNotFound`] if the executable does not exist
pub fn launch(command: &[String], vars: &HashMap<String, String>, isolate: bool) -> Result<i32> {
    let (program, args) = command.split_first().ok_or(EnvrunError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    if isolate {
        cmd.env_clear();
    }
    cmd.envs(vars);

    tracing::debug!(program = %program, isolate, variables = vars.len(), "Launching command");

    let status = match cmd.status() {
        Ok(status) => status,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EnvrunError::CommandNotFound(program.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(status.code().unwrap_or(1))
}
