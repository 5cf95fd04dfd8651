//! The process-wide type registry and its init/freeze lifecycle.
//!
//! Registration appends to a pending builder guarded by a mutex. `freeze()`
//! validates the builder and installs an immutable [`Registry`]; from then on
//! every lookup is a lock-free shared read and registration is closed.

use crate::core::builder::RegistryBuilder;
use crate::core::types::{Type, TypeData};
use crate::errors::{RegistrationError, RegistrationErrors};
use crate::infrastructure::config::ReflectConfig;
use crate::relations::RelationGraph;
use crate::variant::{ConversionMode, TypeKey, Variant};
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Mutex, MutexGuard};
use std::any::TypeId;
use std::cell::Cell;
use std::collections::HashMap;
use tracing::{info, warn};

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// `None` once registration has closed, whether by a successful or a failed freeze.
static PENDING: Lazy<Mutex<Option<RegistryBuilder>>> =
    Lazy::new(|| Mutex::new(Some(RegistryBuilder::new())));

/// The frozen registry, if `freeze()` has succeeded.
pub fn registry() -> Option<&'static Registry> {
    GLOBAL.get()
}

pub fn is_frozen() -> bool {
    GLOBAL.get().is_some()
}

thread_local! {
    /// Set while this thread runs a registration closure and holds `PENDING`.
    static REGISTERING: Cell<bool> = const { Cell::new(false) };
}

struct RegisteringGuard;

impl RegisteringGuard {
    fn enter() -> Result<Self, RegistrationError> {
        if REGISTERING.with(|flag| flag.replace(true)) {
            return Err(RegistrationError::NestedRegistration);
        }
        Ok(Self)
    }
}

impl Drop for RegisteringGuard {
    fn drop(&mut self) {
        REGISTERING.with(|flag| flag.set(false));
    }
}

/// Add registrations to the pending builder.
///
/// The closure runs with the pending builder locked. Calling `register`,
/// `configure` or `freeze` from inside it returns
/// [`RegistrationError::NestedRegistration`]; use the builder argument instead.
pub fn register<F>(f: F) -> Result<(), RegistrationError>
where
    F: FnOnce(&mut RegistryBuilder),
{
    let _guard = RegisteringGuard::enter()?;
    let mut pending = PENDING.lock();
    let builder = pending.as_mut().ok_or(RegistrationError::AlreadyFrozen)?;
    f(builder);
    Ok(())
}

/// Apply configuration to the pending builder. Only effective before freeze.
pub fn configure(config: &ReflectConfig) -> Result<(), RegistrationError> {
    register(|builder| builder.set_settings(Settings::from(config)))
}

/// Validate everything registered so far and install it process-wide.
///
/// On failure nothing is installed and registration stays closed.
pub fn freeze() -> Result<&'static Registry, RegistrationErrors> {
    if REGISTERING.with(Cell::get) {
        return Err(RegistrationError::NestedRegistration.into());
    }
    let builder = PENDING
        .lock()
        .take()
        .ok_or(RegistrationError::AlreadyFrozen)?;
    let registry = builder.build()?;
    GLOBAL
        .set(registry)
        .map_err(|_| RegistrationError::AlreadyFrozen)?;
    let registry = GLOBAL.get().ok_or(RegistrationError::AlreadyFrozen)?;
    info!(
        target: "rtreflect::registry",
        types = registry.type_count(),
        edges = registry.relations.edge_count(),
        mode = ?registry.settings.conversion_mode,
        "type registry frozen"
    );
    Ok(registry)
}

/// Behavior switches fixed at freeze time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub conversion_mode: ConversionMode,
    pub trim_whitespace: bool,
    pub log_failures: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            conversion_mode: ConversionMode::Lossy,
            trim_whitespace: true,
            log_failures: true,
        }
    }
}

impl From<&ReflectConfig> for Settings {
    fn from(config: &ReflectConfig) -> Self {
        Self {
            conversion_mode: config.conversion.mode,
            trim_whitespace: config.conversion.trim_whitespace,
            log_failures: config.dispatch.log_failures,
        }
    }
}

/// The immutable type descriptor table.
pub struct Registry {
    pub(crate) types: Vec<TypeData>,
    pub(crate) by_key: HashMap<TypeId, Type>,
    pub(crate) by_name: HashMap<String, Type>,
    pub(crate) relations: RelationGraph,
    pub(crate) settings: Settings,
    overlay: DashMap<(Type, String), Variant<'static>>,
    window: Mutex<()>,
}

impl Registry {
    pub(crate) fn new(
        types: Vec<TypeData>,
        relations: RelationGraph,
        settings: Settings,
    ) -> Self {
        let by_key = types
            .iter()
            .enumerate()
            .map(|(index, data)| (data.key.id(), Type::from_index(index)))
            .collect();
        let by_name = types
            .iter()
            .enumerate()
            .map(|(index, data)| (data.name.clone(), Type::from_index(index)))
            .collect();
        Self {
            types,
            by_key,
            by_name,
            relations,
            settings,
            overlay: DashMap::new(),
            window: Mutex::new(()),
        }
    }

    pub fn global() -> Option<&'static Registry> {
        registry()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// All registered types in registration order.
    pub fn get_types(&self) -> impl Iterator<Item = Type> + '_ {
        (0..self.types.len()).map(Type::from_index)
    }

    pub fn type_of_key(&self, key: TypeKey) -> Type {
        self.by_key.get(&key.id()).copied().unwrap_or_default()
    }

    pub fn get_by_name(&self, name: &str) -> Type {
        self.by_name.get(name).copied().unwrap_or_default()
    }

    pub(crate) fn data(&self, ty: Type) -> Option<&TypeData> {
        self.types.get(ty.index()?)
    }

    pub(crate) fn data_of_key(&self, key: TypeKey) -> Option<&TypeData> {
        self.data(self.type_of_key(key))
    }

    /// Open the controlled window for adding metadata after freeze.
    ///
    /// Windows are serialized; readers never block.
    pub fn metadata_window<R>(&self, f: impl FnOnce(&mut MetadataWindow<'_>) -> R) -> R {
        let guard = self.window.lock();
        let mut window = MetadataWindow { registry: self, _guard: guard };
        f(&mut window)
    }

    pub(crate) fn overlay_metadata(&self, ty: Type, key: &str) -> Option<Variant<'static>> {
        self.overlay
            .get(&(ty, key.to_string()))
            .map(|entry| entry.value().clone())
    }
}

/// Exclusive handle for post-freeze metadata additions.
pub struct MetadataWindow<'r> {
    registry: &'r Registry,
    _guard: MutexGuard<'r, ()>,
}

impl MetadataWindow<'_> {
    /// Attach `value` under `key` to `ty`.
    ///
    /// Static metadata registered before freeze cannot be replaced; returns
    /// `false` in that case or when `ty` is not registered.
    pub fn add(&mut self, ty: Type, key: impl Into<String>, value: Variant<'static>) -> bool {
        let key = key.into();
        let Some(data) = self.registry.data(ty) else {
            return false;
        };
        if data.metadata.get(&key).is_some() {
            warn!(target: "rtreflect::registry", ty = %data.name, %key, "static metadata cannot be replaced");
            return false;
        }
        self.registry.overlay.insert((ty, key), value.into_owned());
        true
    }

    pub fn remove(&mut self, ty: Type, key: &str) -> Option<Variant<'static>> {
        self.registry
            .overlay
            .remove(&(ty, key.to_string()))
            .map(|(_, value)| value)
    }
}
