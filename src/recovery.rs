//! Missing-value recovery: prompt for a value or fail.

use crate::Result;
use crate::backend::Backend;
use crate::error::EnvrunError;
use std::io::{self, Write};

/// Source of interactively entered values.
pub trait Prompt {
    /// Shows `message` and returns the line the user entered.
    fn ask(&self, message: &str) -> Result<String>;
}

/// Prompts on the controlling terminal.
///
/// By default the answer is read as a plain line of text. With `hide_input`
/// the answer is read without echo, as for a password.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt {
    hide_input: bool,
}

impl TerminalPrompt {
    pub fn new(hide_input: bool) -> Self {
        Self { hide_input }
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&self, message: &str) -> Result<String> {
        if self.hide_input {
            eprint!("{}", message);
            io::stderr().flush()?;
            Ok(rpassword::read_password()?)
        } else {
            Ok(inquire::Text::new(message).prompt()?)
        }
    }
}

/// The missing-value policy of an invocation.
///
/// Non-interactive runs fail on the first missing value. Interactive runs
/// ask for it once and accept whatever is entered, including an empty line.
pub struct Recovery {
    interactive: bool,
    prompt: Box<dyn Prompt>,
}

impl Recovery {
    pub fn new(interactive: bool, prompt: impl Prompt + 'static) -> Self {
        Self {
            interactive,
            prompt: Box::new(prompt),
        }
    }

    /// A policy that never prompts.
    pub fn non_interactive() -> Self {
        Self::new(false, TerminalPrompt::default())
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Obtains a value for `key`, which `backend` reported as missing.
    ///
    /// # Errors
    ///
    /// [`EnvrunError::MissingValue`] naming `<backend>.<key>` when not
    /// interactive; any prompt failure otherwise.
    pub fn recover(&self, backend: &dyn Backend, key: &str) -> Result<String> {
        let qualified = format!("{}.{}", backend.name(), key);

        if !self.interactive {
            return Err(EnvrunError::MissingValue(qualified));
        }

        tracing::debug!(key = %qualified, "Prompting for missing value");
        self.prompt.ask(&format!("Value for {}> ", qualified))
    }
}
