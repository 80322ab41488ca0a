use super::{Backend, BackendInfo, BackendParams, BackendRegistration};
use crate::{EnvrunError, Result};
use std::sync::Arc;

/// Application attribute used when a keyring backend does not set one.
pub const DEFAULT_APPLICATION: &str = "envrun";

/// A connection to the system secret store.
///
/// Secrets are identified by two attributes: the application and the key.
/// Both double as the search filter on read, so changing either scheme makes
/// previously stored secrets unreachable.
pub trait SecretStore {
    fn is_locked(&self) -> Result<bool>;

    /// Asks the user to unlock the store, typically through a system dialog.
    fn unlock(&self) -> Result<()>;

    fn find(&self, application: &str, key: &str) -> Result<Option<String>>;

    /// Stores `secret`, replacing an item with the same attributes.
    fn store(&self, application: &str, key: &str, secret: &str) -> Result<()>;
}

/// Opens a fresh [`SecretStore`] connection.
pub type StoreConnector = Arc<dyn Fn() -> Result<Box<dyn SecretStore>> + Send + Sync>;

/// Provider for values stored in the system secret store.
///
/// Uses the platform's native secure credential storage:
/// - Linux: Secret Service API (GNOME Keyring, KWallet) over D-Bus
/// - macOS: Keychain
/// - Windows: Credential Manager
///
/// A connection is opened for every operation and nothing about it is cached.
/// Before each read and write the default collection is checked: when it is
/// locked, an interactive backend asks for it to be unlocked and a
/// non-interactive one fails with [`EnvrunError::StoreLocked`].
///
/// # Options
///
/// - `application` (string, default `"envrun"`): the application attribute.
///   Declaring several keyring backends with different applications keeps
///   independent sets of values apart:
///
///   ```toml
///   [backends.staging]
///   type = "keyring"
///   application = "envrun-staging"
///   ```
pub struct KeyringBackend {
    params: BackendParams,
    application: String,
    connect: StoreConnector,
}

impl KeyringBackend {
    pub const REGISTRATION: BackendRegistration = BackendRegistration {
        info: BackendInfo {
            name: "keyring",
            description: "Uses system keychain (Recommended)",
            examples: &["[vars.keyring] DATABASE_PASSWORD = \"db-password\""],
        },
        factory: |params| Ok(Box::new(KeyringBackend::new(params)?)),
    };

    /// Creates a backend talking to the platform secret store.
    pub fn new(params: BackendParams) -> Result<Self> {
        Self::with_connector(params, Arc::new(platform::connect))
    }

    /// Creates a backend that opens its connections through `connect`.
    pub fn with_connector(params: BackendParams, connect: StoreConnector) -> Result<Self> {
        let application = params
            .string_option("application")?
            .unwrap_or(DEFAULT_APPLICATION)
            .to_string();
        Ok(Self {
            params,
            application,
            connect,
        })
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Connects and makes sure the store is usable.
    fn open(&self) -> Result<Box<dyn SecretStore>> {
        let store = (self.connect)()?;

        if store.is_locked()? {
            if !self.interactive() {
                return Err(EnvrunError::StoreLocked);
            }
            tracing::debug!(backend = %self.name(), "Unlocking secret storage");
            store.unlock()?;
        }

        Ok(store)
    }
}

impl Backend for KeyringBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        Self::REGISTRATION.info.name
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        self.open()?.find(&self.application, key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.open()?.store(&self.application, key, value)
    }

    fn allows_write(&self) -> bool {
        true
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::SecretStore;
    use crate::{EnvrunError, Result};
    use secret_service::EncryptionType;
    use secret_service::blocking::SecretService;
    use std::collections::HashMap;

    /// The freedesktop Secret Service, default collection.
    struct SecretServiceStore {
        service: SecretService<'static>,
    }

    pub(super) fn connect() -> Result<Box<dyn SecretStore>> {
        let service = SecretService::connect(EncryptionType::Dh)?;
        Ok(Box::new(SecretServiceStore { service }))
    }

    fn attributes<'a>(application: &'a str, key: &'a str) -> HashMap<&'a str, &'a str> {
        HashMap::from([("application", application), ("key", key)])
    }

    impl SecretStore for SecretServiceStore {
        fn is_locked(&self) -> Result<bool> {
            Ok(self.service.get_default_collection()?.is_locked()?)
        }

        fn unlock(&self) -> Result<()> {
            Ok(self.service.get_default_collection()?.unlock()?)
        }

        fn find(&self, application: &str, key: &str) -> Result<Option<String>> {
            let collection = self.service.get_default_collection()?;
            let items = collection.search_items(attributes(application, key))?;

            let Some(item) = items.first() else {
                return Ok(None);
            };

            let secret = item.get_secret()?;
            String::from_utf8(secret).map(Some).map_err(|_| {
                EnvrunError::BackendOperationFailed(format!(
                    "Secret for '{}' is not valid UTF-8",
                    key
                ))
            })
        }

        fn store(&self, application: &str, key: &str, secret: &str) -> Result<()> {
            let collection = self.service.get_default_collection()?;
            collection.create_item(
                &format!("{}: {}", application, key),
                attributes(application, key),
                secret.as_bytes(),
                true,
                "text/plain",
            )?;
            Ok(())
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::SecretStore;
    use crate::Result;
    use keyring::Entry;

    /// Keychain / Credential Manager through the `keyring` crate. The
    /// application is the service name and the key is the account.
    struct KeychainStore;

    pub(super) fn connect() -> Result<Box<dyn SecretStore>> {
        Ok(Box::new(KeychainStore))
    }

    impl SecretStore for KeychainStore {
        // The OS unlocks the keychain itself when an entry is accessed.
        fn is_locked(&self) -> Result<bool> {
            Ok(false)
        }

        fn unlock(&self) -> Result<()> {
            Ok(())
        }

        fn find(&self, application: &str, key: &str) -> Result<Option<String>> {
            let entry = Entry::new(application, key)?;
            match entry.get_password() {
                Ok(password) => Ok(Some(password)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn store(&self, application: &str, key: &str, secret: &str) -> Result<()> {
            let entry = Entry::new(application, key)?;
            entry.set_password(secret)?;
            Ok(())
        }
    }
}
