//! Immutable snapshot of the process environment.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

/// A copy of the environment taken once, at the start of an invocation.
///
/// Backends and the launcher read from the snapshot instead of the live
/// process environment, so resolution is deterministic and tests can inject
/// any environment they like. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Arc<HashMap<String, String>>,
}

impl Environment {
    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn capture() -> Self {
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}
