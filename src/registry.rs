//! Builds the set of live backends for one invocation.
//!
//! Registration happens in three tiers:
//!
//! 1. Every built-in implementation is instantiated under its canonical name
//!    (`env`, `file`, `const`, `shell`, `keyring`) with an empty configuration.
//! 2. Plugin implementations are merged into the catalog of known types. This
//!    creates no instances; a plugin advertising a built-in's name replaces the
//!    catalog entry but not the instance created in step 1.
//! 3. Each `[backends.<name>]` table is instantiated from the catalog entry its
//!    `type` names, under the user-chosen name, replacing any instance already
//!    registered under that name.
//!
//! This lets a configuration declare several instances of one implementation
//! (two `shell` backends with different command prefixes, say) while the
//! zero-configuration built-ins stay available by their canonical names.

use crate::backend::{
    BACKEND_PLUGINS, Backend, BackendInfo, BackendParams, BackendRegistration, ConstBackend,
    EnvBackend, FileBackend, KeyringBackend, ShellBackend,
};
use crate::environment::Environment;
use crate::{EnvrunError, Result};
use envrun_config::Config;
use std::collections::{BTreeMap, HashMap};

/// The implementations that are always available.
pub fn builtin_backends() -> [BackendRegistration; 5] {
    [
        EnvBackend::REGISTRATION,
        FileBackend::REGISTRATION,
        ConstBackend::REGISTRATION,
        ShellBackend::REGISTRATION,
        KeyringBackend::REGISTRATION,
    ]
}

/// Where plugin implementations come from.
pub trait PluginSource {
    fn discover(&self) -> Vec<BackendRegistration>;
}

/// Plugins registered with [`register_backend!`](crate::register_backend) in
/// any crate linked into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedPlugins;

impl PluginSource for LinkedPlugins {
    fn discover(&self) -> Vec<BackendRegistration> {
        BACKEND_PLUGINS.iter().copied().collect()
    }
}

/// No plugins at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlugins;

impl PluginSource for NoPlugins {
    fn discover(&self) -> Vec<BackendRegistration> {
        Vec::new()
    }
}

impl PluginSource for Vec<BackendRegistration> {
    fn discover(&self) -> Vec<BackendRegistration> {
        self.clone()
    }
}

/// The backends of one invocation, by name.
pub struct Registry {
    backends: HashMap<String, Box<dyn Backend>>,
    catalog: BTreeMap<&'static str, BackendRegistration>,
}

impl Registry {
    /// Builds the backend set for `config`.
    ///
    /// # Errors
    ///
    /// - [`EnvrunError::MissingBackendType`] if a declared backend has no `type`
    /// - [`EnvrunError::UnsupportedBackendType`] if `type` names no known implementation
    /// - [`EnvrunError::InvalidConfig`] if a declaration or one of its options is malformed
    pub fn build(
        config: &Config,
        interactive: bool,
        environment: &Environment,
        plugins: &dyn PluginSource,
    ) -> Result<Self> {
        let mut registry = Self {
            backends: HashMap::new(),
            catalog: BTreeMap::new(),
        };

        for registration in builtin_backends() {
            let params = BackendParams::new(
                registration.name(),
                interactive,
                toml::Table::new(),
                environment.clone(),
            );
            registry.insert(registration.create(params)?);
            registry.catalog.insert(registration.name(), registration);
        }

        for registration in plugins.discover() {
            tracing::debug!(kind = registration.name(), "Discovered backend plugin");
            registry.catalog.insert(registration.name(), registration);
        }

        for (name, declaration) in &config.backends {
            let table = declaration.as_table().ok_or_else(|| {
                EnvrunError::InvalidConfig(format!("backend '{}' must be a table", name))
            })?;

            let kind = match table.get("type") {
                Some(toml::Value::String(kind)) => kind,
                Some(other) => {
                    return Err(EnvrunError::InvalidConfig(format!(
                        "'type' of backend '{}' must be a string, found {}",
                        name,
                        other.type_str()
                    )));
                }
                None => return Err(EnvrunError::MissingBackendType(name.clone())),
            };

            let registration = registry.catalog.get(kind.as_str()).copied().ok_or_else(|| {
                EnvrunError::UnsupportedBackendType {
                    name: name.clone(),
                    kind: kind.clone(),
                }
            })?;

            tracing::debug!(backend = %name, kind = %kind, "Registering declared backend");
            let params = BackendParams::new(
                name.clone(),
                interactive,
                table.clone(),
                environment.clone(),
            );
            registry.insert(registration.create(params)?);
        }

        Ok(registry)
    }

    /// Registers `backend` under its name, replacing any previous backend
    /// with that name.
    pub fn insert(&mut self, backend: Box<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Backend> {
        self.backends.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Names of all registered backends, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The implementations a `type` field may name, sorted by name.
    pub fn implementations(&self) -> impl Iterator<Item = &BackendInfo> {
        self.catalog.values().map(|registration| &registration.info)
    }
}
