use super::{Backend, BackendInfo, BackendParams, BackendRegistration};
use crate::{EnvrunError, Result};
use std::process::{Command, Stdio};

/// Runs the key as a shell command and returns its standard output.
///
/// Commands run through `sh -c` (`cmd /C` on Windows) with the invocation's
/// environment snapshot. Standard input stays attached to the terminal so
/// commands such as `pass show` can ask for a passphrase. A command that
/// exits with a non-zero status is an error; its standard error is included
/// in the message.
///
/// A table declaration may name the command in a `command` field instead of
/// `key`:
///
/// ```toml
/// [vars.shell]
/// BUILD_SHA = { command = "git rev-parse HEAD" }
/// ```
///
/// # Options
///
/// - `command` (string): a command prefix. The backend then runs
///   `<command> <key>` with the key quoted as a single argument, so one
///   declared backend can serve many variables:
///
///   ```toml
///   [backends.pass]
///   type = "shell"
///   command = "pass show"
///   trim = true
///
///   [vars.pass]
///   GITHUB_TOKEN = "github/token"
///   ```
/// - `trim` (bool): strip trailing whitespace from the output.
pub struct ShellBackend {
    params: BackendParams,
    command: Option<String>,
    trim: bool,
}

impl ShellBackend {
    pub const REGISTRATION: BackendRegistration = BackendRegistration {
        info: BackendInfo {
            name: "shell",
            description: "Standard output of a shell command",
            examples: &["[vars.shell] BUILD_SHA = \"git rev-parse HEAD\""],
        },
        factory: |params| Ok(Box::new(ShellBackend::new(params)?)),
    };

    pub fn new(params: BackendParams) -> Result<Self> {
        let command = params.string_option("command")?.map(str::to_owned);
        let trim = params.bool_option("trim")?;
        Ok(Self {
            params,
            command,
            trim,
        })
    }

    /// Builds the command line executed for `key`.
    fn command_line(&self, key: &str) -> Result<String> {
        match &self.command {
            Some(prefix) => {
                let quoted = shlex::try_quote(key).map_err(|e| {
                    EnvrunError::BackendOperationFailed(format!(
                        "Cannot pass key to '{}': {}",
                        prefix, e
                    ))
                })?;
                Ok(format!("{} {}", prefix, quoted))
            }
            None => Ok(key.to_string()),
        }
    }

    fn shell_command(line: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(line);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(line);
            cmd
        }
    }
}

impl Backend for ShellBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        Self::REGISTRATION.info.name
    }

    fn key_fields(&self) -> &'static [&'static str] {
        &["command"]
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let line = self.command_line(key)?;
        tracing::debug!(backend = %self.name(), command = %line, "Running shell command");

        let output = Self::shell_command(&line)
            .env_clear()
            .envs(self.params.environment.iter())
            .stdin(Stdio::inherit())
            .output()?;

        if !output.status.success() {
            return Err(EnvrunError::CommandFailed {
                command: single_line(&line),
                status: output.status.to_string(),
                stderr: single_line(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            EnvrunError::BackendOperationFailed(format!(
                "Output of '{}' is not valid UTF-8",
                line
            ))
        })?;

        if self.trim {
            Ok(Some(stdout.trim_end().to_string()))
        } else {
            Ok(Some(stdout))
        }
    }
}

/// Joins the non-empty lines of `text` with `"; "` so that a failure is
/// reported on one line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
