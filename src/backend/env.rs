use super::{Backend, BackendInfo, BackendParams, BackendRegistration};
use crate::Result;

/// A read-only backend that reads values from environment variables.
///
/// Values come from the environment snapshot taken when the invocation
/// started, not from the live process environment. A variable that is not
/// set is reported as missing, which lets interactive runs prompt for it.
///
/// # Example
///
/// ```
/// # use envrun::backend::{Backend, BackendParams, EnvBackend};
/// # use envrun::Environment;
/// let environment: Environment = [("MY_API_KEY", "abc123")].into_iter().collect();
/// let backend = EnvBackend::new(BackendParams::new("env", false, Default::default(), environment));
/// assert_eq!(backend.read("MY_API_KEY").unwrap(), Some("abc123".to_string()));
/// assert_eq!(backend.read("TOKEN").unwrap(), None);
/// ```
pub struct EnvBackend {
    params: BackendParams,
}

impl EnvBackend {
    pub const REGISTRATION: BackendRegistration = BackendRegistration {
        info: BackendInfo {
            name: "env",
            description: "Read-only environment variables",
            examples: &["[vars.env] API_KEY = \"MY_API_KEY\""],
        },
        factory: |params| Ok(Box::new(EnvBackend::new(params))),
    };

    pub fn new(params: BackendParams) -> Self {
        Self { params }
    }
}

impl Backend for EnvBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        Self::REGISTRATION.info.name
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.params.environment.get(key).map(str::to_owned))
    }
}
