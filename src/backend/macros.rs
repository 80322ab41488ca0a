use super::{Backend, BackendInfo, BackendParams};
use crate::Result;

/// Constructor stored in the implementation catalog.
pub type BackendFactory = fn(BackendParams) -> Result<Box<dyn Backend>>;

/// A backend implementation the registry can instantiate by type name.
#[derive(Debug, Clone, Copy)]
pub struct BackendRegistration {
    pub info: BackendInfo,
    pub factory: BackendFactory,
}

impl BackendRegistration {
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn create(&self, params: BackendParams) -> Result<Box<dyn Backend>> {
        (self.factory)(params)
    }
}

/// Distributed slice collecting backend implementations linked into the binary.
#[doc(hidden)]
#[linkme::distributed_slice]
pub static BACKEND_PLUGINS: [BackendRegistration];

/// Declarative macro for registering a plugin backend.
///
/// The registered type needs a `fn new(params: BackendParams) -> Result<Self>`
/// constructor and an implementation of [`Backend`]. The calling crate must
/// depend on `linkme`.
///
/// # Usage
///
/// ```ignore
/// envrun::register_backend! {
///     struct: VaultBackend,
///     name: "vault",
///     description: "HashiCorp Vault via the vault CLI",
///     examples: ["[backends.vault] type = \"vault\""],
/// }
/// ```
#[macro_export]
macro_rules! register_backend {
    (
        struct: $struct_name:ty,
        name: $name:expr,
        description: $description:expr,
        examples: [$($example:expr),* $(,)?] $(,)?
    ) => {
        const _: () = {
            #[linkme::distributed_slice($crate::backend::BACKEND_PLUGINS)]
            #[doc(hidden)]
            static BACKEND_REGISTRATION: $crate::backend::BackendRegistration =
                $crate::backend::BackendRegistration {
                    info: $crate::backend::BackendInfo {
                        name: $name,
                        description: $description,
                        examples: &[$($example,)*],
                    },
                    factory: |params| Ok(Box::new(<$struct_name>::new(params)?)),
                };
        };
    };
}
