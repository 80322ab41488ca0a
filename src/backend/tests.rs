use super::keyring::{SecretStore, StoreConnector};
use super::{Backend, BackendInfo, BackendParams, BackendRegistration, KeyringBackend};
use crate::environment::Environment;
use crate::recovery::{Prompt, Recovery};
use crate::registry::{LinkedPlugins, PluginSource, Registry};
use crate::resolver::resolve;
use crate::{EnvrunError, Result};
use envrun_config::Config;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock backend for testing
///
/// Clones share their storage, so a test can keep a handle after moving the
/// backend into a registry.
#[derive(Clone)]
pub struct MockBackend {
    params: BackendParams,
    writable: bool,
    failing: bool,
    failing_writes: bool,
    storage: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockBackend {
    fn new(name: &str, writable: bool) -> Self {
        Self {
            params: BackendParams::new(name, false, toml::Table::new(), Environment::default()),
            writable,
            failing: false,
            failing_writes: false,
            storage: Arc::new(Mutex::new(HashMap::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn read_only(name: &str) -> Self {
        Self::new(name, false)
    }

    pub fn writable(name: &str) -> Self {
        Self::new(name, true)
    }

    /// A backend whose reads and writes always fail.
    pub fn failing(name: &str) -> Self {
        Self {
            failing: true,
            ..Self::new(name, true)
        }
    }

    /// A writable backend that has no values and fails every write.
    pub fn failing_writes(name: &str) -> Self {
        Self {
            failing_writes: true,
            ..Self::new(name, true)
        }
    }

    pub fn with_values(self, values: &[(&str, &str)]) -> Self {
        {
            let mut storage = self.storage.lock().unwrap();
            for (key, value) in values {
                storage.insert(key.to_string(), value.to_string());
            }
        }
        self
    }

    /// Successful writes, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

impl Backend for MockBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        "mock"
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        if self.failing {
            return Err(EnvrunError::BackendOperationFailed("mock failure".into()));
        }
        Ok(self.storage.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if !self.writable {
            return Err(EnvrunError::WriteUnsupported {
                backend: self.name().to_string(),
            });
        }
        if self.failing || self.failing_writes {
            return Err(EnvrunError::BackendOperationFailed("mock failure".into()));
        }
        self.storage
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn allows_write(&self) -> bool {
        self.writable
    }
}

/// Prompt that answers from a fixed script and records what it was asked.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<String>>>,
    messages: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().map(Into::into).collect())),
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, message: &str) -> Result<String> {
        self.messages.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(EnvrunError::Prompt(inquire::InquireError::OperationCanceled))
    }
}

#[derive(Default)]
struct StoreState {
    locked: bool,
    unlocks: usize,
    items: HashMap<(String, String), String>,
}

/// In-memory stand-in for the system secret store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn locked() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().locked = true;
        store
    }

    pub fn unlocks(&self) -> usize {
        self.state.lock().unwrap().unlocks
    }

    pub fn item(&self, application: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .items
            .get(&(application.to_string(), key.to_string()))
            .cloned()
    }

    pub fn connector(&self) -> StoreConnector {
        let store = self.clone();
        Arc::new(move || Ok(Box::new(store.clone()) as Box<dyn SecretStore>))
    }
}

impl SecretStore for MemoryStore {
    fn is_locked(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().locked)
    }

    fn unlock(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.locked = false;
        state.unlocks += 1;
        Ok(())
    }

    fn find(&self, application: &str, key: &str) -> Result<Option<String>> {
        Ok(self.item(application, key))
    }

    fn store(&self, application: &str, key: &str, secret: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .items
            .insert((application.to_string(), key.to_string()), secret.to_string());
        Ok(())
    }
}

fn keyring_backend(store: &MemoryStore, interactive: bool, config: &str) -> KeyringBackend {
    let params = BackendParams::new(
        "keyring",
        interactive,
        toml::from_str(config).unwrap(),
        Environment::default(),
    );
    KeyringBackend::with_connector(params, store.connector()).unwrap()
}

/// Plugin registered the way an external crate would.
pub struct EchoBackend {
    params: BackendParams,
    suffix: String,
}

impl EchoBackend {
    pub fn new(params: BackendParams) -> Result<Self> {
        let suffix = params.string_option("suffix")?.unwrap_or("").to_string();
        Ok(Self { params, suffix })
    }
}

impl Backend for EchoBackend {
    fn params(&self) -> &BackendParams {
        &self.params
    }

    fn kind(&self) -> &'static str {
        "echo-test"
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(Some(format!("{}{}", key, self.suffix)))
    }
}

crate::register_backend! {
    struct: EchoBackend,
    name: "echo-test",
    description: "Echoes the key with a suffix",
    examples: ["[backends.echo] type = \"echo-test\""],
}

fn registry_with(backends: Vec<MockBackend>) -> Registry {
    let mut registry = Registry::build(
        &Config::default(),
        false,
        &Environment::default(),
        &crate::registry::NoPlugins,
    )
    .unwrap();
    for backend in backends {
        registry.insert(Box::new(backend));
    }
    registry
}

#[test]
fn test_backend_info_display() {
    let info = BackendInfo {
        name: "shell",
        description: "Standard output of a shell command",
        examples: &[],
    };
    assert_eq!(
        info.display_with_examples(),
        "shell: Standard output of a shell command"
    );

    let info = BackendInfo {
        examples: &["a", "b"],
        ..info
    };
    assert_eq!(
        info.display_with_examples(),
        "shell: Standard output of a shell command (e.g., a, b)"
    );
}

#[test]
fn test_read_only_builtins_reject_writes() {
    let registry = registry_with(Vec::new());
    for name in ["env", "const", "file", "shell"] {
        let backend = registry.get(name).unwrap();
        assert!(!backend.allows_write(), "{} should be read-only", name);
        match backend.write("KEY", "value") {
            Err(EnvrunError::WriteUnsupported { backend }) => assert_eq!(backend, name),
            other => panic!("Expected WriteUnsupported for {}, got {:?}", name, other),
        }
    }
    assert!(registry.get("keyring").unwrap().allows_write());
}

#[test]
fn test_const_is_identity() {
    let registry = registry_with(Vec::new());
    let backend = registry.get("const").unwrap();
    for key in ["hello", "", "with spaces and = signs"] {
        assert_eq!(backend.read(key).unwrap(), Some(key.to_string()));
    }
}

#[test]
fn test_option_type_errors() {
    let params = BackendParams::new(
        "git",
        false,
        toml::from_str("command = 1\ntrim = \"yes\"").unwrap(),
        Environment::default(),
    );
    assert!(matches!(
        params.string_option("command"),
        Err(EnvrunError::InvalidConfig(msg)) if msg.contains("git") && msg.contains("command")
    ));
    assert!(matches!(
        params.bool_option("trim"),
        Err(EnvrunError::InvalidConfig(_))
    ));
    assert!(!params.bool_option("absent").unwrap());
    assert_eq!(params.string_option("absent").unwrap(), None);
}

#[test]
fn test_keyring_round_trip() {
    let store = MemoryStore::default();
    let backend = keyring_backend(&store, false, "");

    assert_eq!(backend.application(), "envrun");
    assert_eq!(backend.read("db-password").unwrap(), None);
    backend.write("db-password", "hunter2").unwrap();
    assert_eq!(
        backend.read("db-password").unwrap(),
        Some("hunter2".to_string())
    );
    assert_eq!(
        store.item("envrun", "db-password"),
        Some("hunter2".to_string())
    );
}

#[test]
fn test_keyring_overwrite_replaces_value() {
    let store = MemoryStore::default();
    let backend = keyring_backend(&store, false, "");

    backend.write("token", "first").unwrap();
    backend.write("token", "second").unwrap();
    assert_eq!(backend.read("token").unwrap(), Some("second".to_string()));
}

#[test]
fn test_keyring_application_separates_values() {
    let store = MemoryStore::default();
    let default = keyring_backend(&store, false, "");
    let staging = keyring_backend(&store, false, "application = \"envrun-staging\"");

    staging.write("token", "staging-token").unwrap();
    assert_eq!(default.read("token").unwrap(), None);
    assert_eq!(
        staging.read("token").unwrap(),
        Some("staging-token".to_string())
    );
}

#[test]
fn test_locked_keyring_fails_when_not_interactive() {
    let store = MemoryStore::locked();
    let backend = keyring_backend(&store, false, "");

    assert!(matches!(
        backend.read("token"),
        Err(EnvrunError::StoreLocked)
    ));
    assert!(matches!(
        backend.write("token", "value"),
        Err(EnvrunError::StoreLocked)
    ));
    assert_eq!(store.unlocks(), 0);
}

#[test]
fn test_locked_keyring_unlocks_when_interactive() {
    let store = MemoryStore::locked();
    let backend = keyring_backend(&store, true, "");

    assert_eq!(backend.read("token").unwrap(), None);
    assert_eq!(store.unlocks(), 1);
    // Unlocked now, so no second unlock.
    backend.write("token", "value").unwrap();
    assert_eq!(store.unlocks(), 1);
}

#[test]
fn test_linked_plugin_is_discovered() {
    let plugins = LinkedPlugins.discover();
    assert!(plugins.iter().any(|p| p.name() == "echo-test"));
}

#[test]
fn test_plugin_instantiated_by_type() {
    let config: Config = r#"
[backends.echo]
type = "echo-test"
suffix = "-echoed"

[vars.echo]
GREETING = "hello"
"#
    .parse()
    .unwrap();

    let registry =
        Registry::build(&config, false, &Environment::default(), &LinkedPlugins).unwrap();
    // Plugins only extend the catalog.
    assert!(!registry.contains("echo-test"));
    assert!(registry.implementations().any(|info| info.name == "echo-test"));

    let vars = resolve(&config, &registry, &Recovery::non_interactive()).unwrap();
    assert_eq!(vars["GREETING"], "hello-echoed");
}

#[test]
fn test_plugin_shadowing_builtin_keeps_builtin_instance() {
    let shadow = BackendRegistration {
        info: BackendInfo {
            name: "env",
            description: "Shadowing env",
            examples: &[],
        },
        factory: |params| Ok(Box::new(EchoBackend::new(params)?)),
    };
    let config: Config = "[backends.other]\ntype = \"env\"\n".parse().unwrap();
    let environment: Environment = [("HOME", "/home/ops")].into_iter().collect();

    let registry = Registry::build(&config, false, &environment, &vec![shadow]).unwrap();
    assert_eq!(registry.get("env").unwrap().kind(), "env");
    assert_eq!(registry.get("other").unwrap().kind(), "echo-test");
}

#[test]
fn test_resolution_is_idempotent_without_missing_values() {
    let backend = MockBackend::writable("vault").with_values(&[("db/password", "hunter2")]);
    let registry = registry_with(vec![backend.clone()]);
    let config: Config = "[vars.vault]\nDB_PASSWORD = \"db/password\"\n"
        .parse()
        .unwrap();
    let prompt = ScriptedPrompt::default();
    let recovery = Recovery::new(true, prompt.clone());

    let first = resolve(&config, &registry, &recovery).unwrap();
    let second = resolve(&config, &registry, &recovery).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["DB_PASSWORD"], "hunter2");
    assert!(prompt.messages().is_empty());
    assert!(backend.writes().is_empty());
}

#[test]
fn test_shorthand_equals_table_form() {
    let backend = MockBackend::read_only("vault").with_values(&[("db/password", "hunter2")]);
    let registry = registry_with(vec![backend]);
    let recovery = Recovery::non_interactive();

    let shorthand: Config = "[vars.vault]\nDB_PASSWORD = \"db/password\"\n"
        .parse()
        .unwrap();
    let table: Config = "[vars.vault]\nDB_PASSWORD = { key = \"db/password\" }\n"
        .parse()
        .unwrap();

    assert_eq!(
        resolve(&shorthand, &registry, &recovery).unwrap(),
        resolve(&table, &registry, &recovery).unwrap()
    );
}

#[test]
fn test_recovered_value_is_written_back() {
    let backend = MockBackend::writable("vault");
    let registry = registry_with(vec![backend.clone()]);
    let config: Config = "[vars.vault]\nDB_PASSWORD = \"db/password\"\n"
        .parse()
        .unwrap();
    let prompt = ScriptedPrompt::new(["s3cret"]);

    let vars = resolve(&config, &registry, &Recovery::new(true, prompt.clone())).unwrap();
    assert_eq!(vars["DB_PASSWORD"], "s3cret");
    assert_eq!(
        backend.writes(),
        vec![("db/password".to_string(), "s3cret".to_string())]
    );

    // Stored, so the next run needs neither a prompt nor interactivity.
    let vars = resolve(&config, &registry, &Recovery::non_interactive()).unwrap();
    assert_eq!(vars["DB_PASSWORD"], "s3cret");
    assert_eq!(prompt.messages().len(), 1);
}

#[test]
fn test_recovered_value_for_read_only_backend_is_not_stored() {
    let backend = MockBackend::read_only("vault");
    let registry = registry_with(vec![backend.clone()]);
    let config: Config = "[vars.vault]\nTOKEN = \"token\"\n".parse().unwrap();
    let prompt = ScriptedPrompt::new(["typed"]);

    let vars = resolve(&config, &registry, &Recovery::new(true, prompt)).unwrap();
    assert_eq!(vars["TOKEN"], "typed");
    assert!(backend.writes().is_empty());
}

#[test]
fn test_backend_failure_is_qualified() {
    let registry = registry_with(vec![MockBackend::failing("vault")]);
    let config: Config = "[vars.vault]\nTOKEN = \"token\"\n".parse().unwrap();

    match resolve(&config, &registry, &Recovery::non_interactive()) {
        Err(EnvrunError::BackendFailure { key, source }) => {
            assert_eq!(key, "vault.token");
            assert!(matches!(*source, EnvrunError::BackendOperationFailed(_)));
        }
        other => panic!("Expected BackendFailure error, got {:?}", other),
    }
}

#[test]
fn test_failed_write_back_is_fatal() {
    let backend = MockBackend::failing_writes("vault");
    let registry = registry_with(vec![backend.clone()]);
    let config: Config = "[vars.vault]\nTOKEN = \"token\"\n".parse().unwrap();
    let prompt = ScriptedPrompt::new(["typed"]);

    match resolve(&config, &registry, &Recovery::new(true, prompt.clone())) {
        Err(EnvrunError::BackendFailure { key, source }) => {
            assert_eq!(key, "vault.token");
            assert!(matches!(*source, EnvrunError::BackendOperationFailed(_)));
        }
        other => panic!("Expected BackendFailure error, got {:?}", other),
    }
    // The value was obtained before the write failed.
    assert_eq!(prompt.messages().len(), 1);
    assert!(backend.writes().is_empty());
}

#[test]
fn test_locked_keyring_write_back_is_fatal() {
    let store = MemoryStore::default();
    let mut registry = registry_with(Vec::new());
    registry.insert(Box::new(keyring_backend(&store, false, "")));
    let config: Config = "[vars.keyring]\nTOKEN = \"token\"\n".parse().unwrap();

    // Locks between the read and the write.
    struct LockingPrompt(MemoryStore);
    impl Prompt for LockingPrompt {
        fn ask(&self, _message: &str) -> Result<String> {
            self.0.state.lock().unwrap().locked = true;
            Ok("typed".to_string())
        }
    }

    match resolve(&config, &registry, &Recovery::new(true, LockingPrompt(store.clone()))) {
        Err(EnvrunError::BackendFailure { key, source }) => {
            assert_eq!(key, "keyring.token");
            assert!(matches!(*source, EnvrunError::StoreLocked));
        }
        other => panic!("Expected BackendFailure error, got {:?}", other),
    }
    assert_eq!(store.item("envrun", "token"), None);
}

#[test]
fn test_missing_value_stops_resolution() {
    let registry = registry_with(vec![MockBackend::read_only("vault")]);
    let config: Config = "[vars.vault]\nTOKEN = \"token\"\n".parse().unwrap();

    match resolve(&config, &registry, &Recovery::non_interactive()) {
        Err(EnvrunError::MissingValue(key)) => assert_eq!(key, "vault.token"),
        other => panic!("Expected MissingValue error, got {:?}", other),
    }
}

#[test]
fn test_unknown_backend() {
    let registry = registry_with(Vec::new());
    let config: Config = "[vars.vault]\nTOKEN = \"token\"\n".parse().unwrap();

    match resolve(&config, &registry, &Recovery::non_interactive()) {
        Err(EnvrunError::UnknownBackend(name)) => assert_eq!(name, "vault"),
        other => panic!("Expected UnknownBackend error, got {:?}", other),
    }
}

#[test]
fn test_later_declaration_wins() {
    let registry = registry_with(Vec::new());
    let config: Config = r#"
[vars.const]
NAME = "first"

[vars.env]
NAME = { key = "UNSET_IN_SNAPSHOT" }
"#
    .parse()
    .unwrap();
    let prompt = ScriptedPrompt::new(["second"]);

    let vars = resolve(&config, &registry, &Recovery::new(true, prompt)).unwrap();
    assert_eq!(vars["NAME"], "second");
}
