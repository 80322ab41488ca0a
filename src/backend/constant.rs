use super::{Backend, BackendInfo, BackendParams, BackendRegistration};
use crate::Result;

/// Returns the key itself as the value.
///
/// Useful for plain values that still belong in the same declaration file as
/// the secrets, e.g. `[vars.const] LOG_LEVEL = "debug"`.
pub struct ConstBackend {
    params: BackendParams,
}

impl ConstBackend {
    pub const REGISTRATION: BackendRegistration = BackendRegistration {
        info: BackendInfo {
            name: "const",
            description: "Constant values, the key is the value",
            examples: &["[vars.const] GREETING = \"hello\""],
        },
        factory: |params| Ok(Box::new(ConstBackend::new(params))),
    };

    pub fn new(params: BackendParams) -> Self {
        Self { params }
    }
}

impl Backend for ConstBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        Self::REGISTRATION.info.name
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(Some(key.to_string()))
    }
}
