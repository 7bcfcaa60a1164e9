//! View definition registry for viewmill
//!
//! The registry is the validated end product of synthesis: a read-only,
//! insertion-ordered collection of [`ViewDefinition`] entries keyed by
//! `"module/type"`. It is built once per process through a
//! [`RegistryBuilder`], optionally from a persisted snapshot, and then only
//! queried.
//!
//! # Build Sequence
//!
//! 1. Snapshot load, when a snapshot store is attached. A hit yields the
//!    registry directly; the alteration hook and synthesis are skipped
//!    because the snapshot holds already-altered, already-validated
//!    definitions.
//! 2. Otherwise synthesis from the fragment set, followed by the
//!    collection-alteration hook, validation, and (when a store is
//!    attached) snapshot persistence.
//!
//! # Read-Only Contract
//!
//! [`ViewRegistry::insert`] and [`ViewRegistry::remove`] exist so the
//! contract is explicit: both always fail with
//! [`ViewmillError::WriteNotAllowed`] and leave the mapping untouched.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use strsim::levenshtein;
use tracing::debug;

use crate::cache::{Snapshot, SnapshotStore};
use crate::config::ProjectConfig;
use crate::core::ViewmillError;
use crate::fragments::FragmentSet;
use crate::options::{
    Assets, Conditions, ProviderSpec, Renders, KEY_ACCESS_CALLBACK, KEY_ASSETS, KEY_CONDITIONS,
    KEY_DEFAULT_CONDITIONS, KEY_MODULE, KEY_PROVIDER, KEY_RENDERS, KEY_TITLE, KEY_TITLE_ARGS,
    KEY_TYPE,
};
use crate::synthesizer;

/// Maximum Levenshtein distance, as a percentage of the looked-up id's
/// length, for a "did you mean" suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// One validated view definition.
#[derive(Debug, Clone, Serialize)]
pub struct ViewDefinition {
    /// Definition identifier, `"<module>/<type>"`.
    pub id: String,
    /// Owning module.
    pub module: String,
    /// View type within the module.
    #[serde(rename = "type")]
    pub type_: String,
    /// Result cardinality.
    pub renders: Renders,
    /// Human-readable title.
    pub title: String,
    /// Arguments interpolated into the title by the host.
    pub title_args: Vec<Value>,
    /// Data provider, if the view fetches records.
    pub provider: Option<ProviderSpec>,
    /// Name of the access predicate guarding the view, if any.
    pub access_callback: Option<String>,
    /// Stylesheets and scripts attached when the view renders.
    pub assets: Assets,
    /// Locked conditions, part of the important layer.
    pub conditions: Conditions,
    /// Lowest-precedence conditions.
    pub default_conditions: Conditions,
    /// The normalized raw options, including unrecognized keys, as stored
    /// in snapshots and exposed to templates.
    pub raw: Map<String, Value>,
}

impl ViewDefinition {
    /// Build and validate a definition from normalized raw options.
    ///
    /// `title`, `type`, `module` and `renders` must each be present and
    /// non-empty; the first violation fails with
    /// [`ViewmillError::ValidationError`] naming the property.
    pub fn from_raw(id: &str, raw: &Map<String, Value>) -> Result<Self> {
        let title = required_string(id, raw, KEY_TITLE)?;
        let type_ = required_string(id, raw, KEY_TYPE)?;
        let module = required_string(id, raw, KEY_MODULE)?;
        let renders = raw
            .get(KEY_RENDERS)
            .and_then(Renders::from_value)
            .ok_or_else(|| ViewmillError::ValidationError {
                id: id.to_string(),
                property: KEY_RENDERS.to_string(),
            })?;

        let title_args = raw
            .get(KEY_TITLE_ARGS)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let provider = raw.get(KEY_PROVIDER).and_then(ProviderSpec::from_value);
        let access_callback = raw
            .get(KEY_ACCESS_CALLBACK)
            .and_then(Value::as_str)
            .map(str::to_string);
        let assets = raw.get(KEY_ASSETS).and_then(Assets::from_value).unwrap_or_default();

        Ok(Self {
            id: id.to_string(),
            module,
            type_,
            renders,
            title,
            title_args,
            provider,
            access_callback,
            assets,
            conditions: conditions_of(raw.get(KEY_CONDITIONS)),
            default_conditions: conditions_of(raw.get(KEY_DEFAULT_CONDITIONS)),
            raw: raw.clone(),
        })
    }
}

fn required_string(id: &str, raw: &Map<String, Value>, key: &str) -> Result<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ViewmillError::ValidationError { id: id.to_string(), property: key.to_string() }
                .into()
        })
}

fn conditions_of(value: Option<&Value>) -> Conditions {
    value
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// The read-only, insertion-ordered definition collection.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    order: Vec<String>,
    definitions: HashMap<String, ViewDefinition>,
}

impl ViewRegistry {
    /// Validate raw definitions into a registry, preserving order.
    pub fn from_views(views: Vec<(String, Map<String, Value>)>) -> Result<Self> {
        let mut order = Vec::with_capacity(views.len());
        let mut definitions = HashMap::with_capacity(views.len());

        for (id, raw) in views {
            let definition = ViewDefinition::from_raw(&id, &raw)?;
            if definitions.insert(id.clone(), definition).is_none() {
                order.push(id);
            }
        }

        Ok(Self { order, definitions })
    }

    /// Whether a definition exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Look up a definition.
    ///
    /// An unknown id fails with [`ViewmillError::ViewNotDefined`],
    /// annotated with the closest known id when one is similar enough.
    pub fn get(&self, id: &str) -> Result<&ViewDefinition> {
        if let Some(definition) = self.definitions.get(id) {
            return Ok(definition);
        }

        let error = anyhow::Error::from(ViewmillError::ViewNotDefined { id: id.to_string() });
        match self.closest_id(id) {
            Some(similar) => Err(error.context(format!("Did you mean '{similar}'?"))),
            None => Err(error),
        }
    }

    fn closest_id(&self, target: &str) -> Option<&str> {
        self.order
            .iter()
            .map(|id| (id, levenshtein(target, id)))
            .min_by_key(|(_, distance)| *distance)
            .filter(|(_, distance)| {
                *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100
            })
            .map(|(id, _)| id.as_str())
    }

    /// Definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.order.iter().filter_map(|id| self.definitions.get(id))
    }

    /// Definition ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Always fails: the registry is read-only after build.
    pub fn insert(&mut self, id: &str, _raw: Map<String, Value>) -> Result<()> {
        Err(ViewmillError::WriteNotAllowed { id: id.to_string() }.into())
    }

    /// Always fails: the registry is read-only after build.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        Err(ViewmillError::WriteNotAllowed { id: id.to_string() }.into())
    }

    /// Export the raw definitions for snapshot persistence.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            views: self
                .iter()
                .map(|definition| (definition.id.clone(), definition.raw.clone()))
                .collect(),
        }
    }
}

/// Collection-alteration hook: receives the synthesized raw definitions
/// before validation and returns the set to validate.
pub type AlterHook =
    Box<dyn Fn(Vec<(String, Map<String, Value>)>) -> Vec<(String, Map<String, Value>)> + Send + Sync>;

/// Assembles a [`ViewRegistry`] from its collaborators.
pub struct RegistryBuilder {
    config: ProjectConfig,
    fragments: Option<FragmentSet>,
    alter: Option<AlterHook>,
    store: Option<Box<dyn SnapshotStore>>,
}

impl RegistryBuilder {
    /// Start a builder for the given project.
    #[must_use]
    pub fn new(config: ProjectConfig) -> Self {
        Self { config, fragments: None, alter: None, store: None }
    }

    /// Use an explicit fragment set instead of discovering `views.toml`
    /// files from the project.
    #[must_use]
    pub fn with_fragments(mut self, fragments: FragmentSet) -> Self {
        self.fragments = Some(fragments);
        self
    }

    /// Register the collection-alteration hook.
    #[must_use]
    pub fn with_alter_hook(mut self, hook: AlterHook) -> Self {
        self.alter = Some(hook);
        self
    }

    /// Attach a snapshot store. Attaching the store is what enables
    /// caching; callers gate this on `cache-views` and the disabled
    /// marker.
    #[must_use]
    pub fn with_snapshot_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the registry: snapshot hit, or synthesize, alter, validate and
    /// persist.
    pub fn build(self) -> Result<ViewRegistry> {
        if let Some(store) = &self.store
            && let Some(snapshot) = store.load()?
        {
            debug!("Building registry from snapshot ({} views)", snapshot.views.len());
            return ViewRegistry::from_views(snapshot.views);
        }

        let fragments = match self.fragments {
            Some(fragments) => fragments,
            None => FragmentSet::discover(&self.config)?,
        };

        let mut views = synthesizer::synthesize(&fragments)?;
        if let Some(alter) = &self.alter {
            views = alter(views);
        }

        let registry = ViewRegistry::from_views(views)?;
        debug!("Built registry with {} definitions", registry.len());

        if let Some(store) = &self.store {
            store.store(&registry.to_snapshot())?;
        }

        Ok(registry)
    }
}

/// At-most-once lazy registry holder for multi-threaded hosts.
///
/// The build closure runs under a lock, so concurrent first accesses
/// synthesize exactly once; later accesses are lock-free reads.
#[derive(Default)]
pub struct RegistryCell {
    cell: OnceLock<ViewRegistry>,
    build_lock: Mutex<()>,
}

impl RegistryCell {
    /// Create an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self { cell: OnceLock::new(), build_lock: Mutex::new(()) }
    }

    /// Return the registry, building it on first access.
    pub fn get_or_build<F>(&self, build: F) -> Result<&ViewRegistry>
    where
        F: FnOnce() -> Result<ViewRegistry>,
    {
        if let Some(registry) = self.cell.get() {
            return Ok(registry);
        }

        let _guard = self
            .build_lock
            .lock()
            .map_err(|_| ViewmillError::Other { message: "registry build lock poisoned".into() })?;
        if let Some(registry) = self.cell.get() {
            return Ok(registry);
        }

        let registry = build()?;
        Ok(self.cell.get_or_init(|| registry))
    }

    /// The registry, if already built.
    #[must_use]
    pub fn get(&self) -> Option<&ViewRegistry> {
        self.cell.get()
    }
}
