//! Resolves declared variables into their values.

use crate::backend::Backend;
use crate::recovery::Recovery;
use crate::registry::Registry;
use crate::{EnvrunError, Result};
use envrun_config::Config;
use std::collections::HashMap;

/// A variable declaration from `[vars.<backend>]`.
///
/// `NAME = "key"` is shorthand for `NAME = { key = "key" }`. In table form
/// `key` is optional and defaults to the variable name. A backend may accept
/// other fields in its place, such as `command` for shell backends; any
/// other field is an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Declaration<'a> {
    Shorthand(&'a str),
    Table(&'a toml::Table),
}

impl<'a> Declaration<'a> {
    /// Interprets `value` as the declaration of `backend.variable`.
    pub fn parse(backend: &str, variable: &str, value: &'a toml::Value) -> Result<Self> {
        match value {
            toml::Value::String(key) => Ok(Declaration::Shorthand(key.as_str())),
            toml::Value::Table(table) => Ok(Declaration::Table(table)),
            _ => Err(EnvrunError::InvalidDeclaration(format!(
                "{}.{}",
                backend, variable
            ))),
        }
    }

    /// The key `backend` should read for `variable`.
    pub fn key(&self, backend: &dyn Backend, variable: &'a str) -> Result<&'a str> {
        let table = match *self {
            Declaration::Shorthand(key) => return Ok(key),
            Declaration::Table(table) => table,
        };

        let qualified = || format!("{}.{}", backend.name(), variable);
        let aliases = backend.key_fields();
        let mut key: Option<(&'a str, &'a str)> = None;

        for (field, value) in table {
            if field != "key" && !aliases.iter().any(|alias| *alias == field.as_str()) {
                return Err(EnvrunError::UnknownDeclarationField {
                    variable: qualified(),
                    field: field.clone(),
                });
            }

            let toml::Value::String(value) = value else {
                return Err(EnvrunError::InvalidConfig(format!(
                    "'{}' of variable {} must be a string, found {}",
                    field,
                    qualified(),
                    value.type_str()
                )));
            };

            if let Some((previous, _)) = key.replace((field.as_str(), value.as_str())) {
                return Err(EnvrunError::InvalidConfig(format!(
                    "variable {} sets both '{}' and '{}'",
                    qualified(),
                    previous,
                    field
                )));
            }
        }

        Ok(key.map_or(variable, |(_, key)| key))
    }
}

/// Resolves every variable of `config` through `registry`.
///
/// Variables are resolved in declaration order. A key missing from its
/// backend goes through `recovery`; the recovered value is then offered back
/// to the backend, and read-only backends turning it down is not an error.
/// A variable name declared under more than one backend takes the value
/// resolved last.
///
/// # Errors
///
/// The first failure ends resolution: an unknown backend, a malformed
/// declaration, a backend failure, or a value that could not be recovered.
pub fn resolve(
    config: &Config,
    registry: &Registry,
    recovery: &Recovery,
) -> Result<HashMap<String, String>> {
    let mut resolved = HashMap::new();

    for (backend_name, variables) in &config.vars {
        let backend = registry
            .get(backend_name)
            .ok_or_else(|| EnvrunError::UnknownBackend(backend_name.clone()))?;

        let variables = variables.as_table().ok_or_else(|| {
            EnvrunError::InvalidConfig(format!(
                "'vars.{}' must be a table of variables",
                backend_name
            ))
        })?;

        for (variable, value) in variables {
            let declaration = Declaration::parse(backend_name, variable, value)?;
            let key = declaration.key(backend, variable)?;
            let value = resolve_key(backend, key, recovery)?;

            // TODO: report names declared under several backends once it is
            // decided whether that should be an error.
            if resolved.insert(variable.clone(), value).is_some() {
                tracing::debug!(variable = %variable, backend = %backend_name, "Overriding earlier value");
            }
        }
    }

    Ok(resolved)
}

/// Reads `key` from `backend`, recovering it when missing.
pub fn resolve_key(backend: &dyn Backend, key: &str, recovery: &Recovery) -> Result<String> {
    let qualify = |source: EnvrunError| EnvrunError::BackendFailure {
        key: format!("{}.{}", backend.name(), key),
        source: Box::new(source),
    };

    if let Some(value) = backend.read(key).map_err(qualify)? {
        tracing::debug!(backend = %backend.name(), key = %key, "Resolved");
        return Ok(value);
    }

    let value = recovery.recover(backend, key)?;

    match backend.write(key, &value) {
        Ok(()) => {
            tracing::debug!(backend = %backend.name(), key = %key, "Stored recovered value");
        }
        Err(EnvrunError::WriteUnsupported { .. }) => {
            tracing::debug!(backend = %backend.name(), key = %key, "Backend is read-only, value not stored");
        }
        Err(e) => return Err(qualify(e)),
    }

    Ok(value)
}
