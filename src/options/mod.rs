//! View option model and definition normalizer
//!
//! A view definition starts life as a raw JSON-like mapping contributed by
//! configuration fragments. This module owns the recognized option keys, the
//! typed views of individual option values ([`Renders`], [`ProviderSpec`],
//! [`Assets`]), and the two pure functions the synthesizer is built on:
//!
//! - [`normalize`] strips null and empty-collection values, then fills in a
//!   default for every recognized key. It is idempotent: normalizing twice
//!   yields the same map.
//! - [`merge_maps`] recursively merges two raw mappings, combining nested
//!   object keys rather than overwriting whole sub-maps, with the overlay
//!   winning on leaf collisions.
//!
//! Both functions operate on [`serde_json::Map`] so fragments loaded from TOML
//! and snapshots loaded from JSON share one value model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Owning module identifier, required non-empty.
pub const KEY_MODULE: &str = "module";
/// View category (`home`, `list`, `view`, ...), required non-empty.
pub const KEY_TYPE: &str = "type";
/// Cardinality of the data the view produces, required.
pub const KEY_RENDERS: &str = "renders";
/// Display title, required non-empty.
pub const KEY_TITLE: &str = "title";
/// Positional arguments interpolated into the title.
pub const KEY_TITLE_ARGS: &str = "title_args";
/// Provider selection: `"auto"` or a registered provider name.
pub const KEY_PROVIDER: &str = "provider";
/// Access predicate name, resolved through the host's access registry.
pub const KEY_ACCESS_CALLBACK: &str = "access_callback";
/// CSS/JS assets attached to the page when the view renders.
pub const KEY_ASSETS: &str = "assets";
/// Author-locked conditions, highest precedence layer.
pub const KEY_CONDITIONS: &str = "conditions";
/// Initial condition values, user-overridable.
pub const KEY_DEFAULT_CONDITIONS: &str = "default_conditions";

/// Every key a normalized definition carries, in canonical order.
pub const RECOGNIZED_KEYS: [&str; 10] = [
    KEY_ACCESS_CALLBACK,
    KEY_ASSETS,
    KEY_CONDITIONS,
    KEY_DEFAULT_CONDITIONS,
    KEY_MODULE,
    KEY_PROVIDER,
    KEY_RENDERS,
    KEY_TITLE,
    KEY_TITLE_ARGS,
    KEY_TYPE,
];

/// Condition mapping with deterministic key order.
pub type Conditions = BTreeMap<String, Value>;

/// Cardinality of the data a view produces.
///
/// `One` views fetch a single record (the provider is invoked with `limit = 1`
/// and the result unwrapped); `Many` views fetch a record collection; `Other`
/// views produce data of unspecified shape and skip the empty-data fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Renders {
    /// A single record.
    One,
    /// A record collection with count and paging.
    Many,
    /// Unspecified data shape.
    Other,
}

impl Renders {
    /// Parse a raw option value into a cardinality.
    ///
    /// Accepts the canonical string names and, for configurations migrated
    /// from numeric constants, the integers 1 (one), 2 (many), 3 (other).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "one" => Some(Self::One),
                "many" => Some(Self::Many),
                "other" => Some(Self::Other),
                _ => None,
            },
            Value::Number(n) => match n.as_u64() {
                Some(1) => Some(Self::One),
                Some(2) => Some(Self::Many),
                Some(3) => Some(Self::Other),
                _ => None,
            },
            _ => None,
        }
    }

    /// Canonical string form, as stored in normalized definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

/// How the data provider for a view is selected.
///
/// String provider options resolve to either the module-convention lookup
/// (`"auto"`) or an explicit registry name. Dynamic class-name resolution is
/// deliberately not supported; both variants go through the host's provider
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSpec {
    /// Resolve the provider registered under the module's conventional slot.
    Auto,
    /// Resolve the provider registered under this explicit name.
    Named(String),
}

impl ProviderSpec {
    /// Parse a raw `provider` option value. Null means "no provider".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if s == "auto" => Some(Self::Auto),
            Value::String(s) if !s.is_empty() => Some(Self::Named(s.clone())),
            _ => None,
        }
    }
}

/// A single asset reference with its attachment priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Path to the asset. Relative paths are resolved during synthesis.
    pub path: String,
    /// Attachment priority; lower values attach first.
    #[serde(default)]
    pub priority: i64,
}

/// CSS and JS assets declared by a view definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    /// Stylesheets to attach.
    #[serde(default)]
    pub css: Vec<AssetRef>,
    /// Scripts to attach.
    #[serde(default)]
    pub js: Vec<AssetRef>,
}

impl Assets {
    /// Parse the raw `assets` option value.
    ///
    /// Each css/js entry is either a bare path string (priority 0) or a
    /// `[path, priority]` pair.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            css: parse_asset_list(obj.get("css")),
            js: parse_asset_list(obj.get("js")),
        })
    }

    /// True when neither css nor js entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.js.is_empty()
    }
}

fn parse_asset_list(value: Option<&Value>) -> Vec<AssetRef> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(path) => Some(AssetRef {
                path: path.clone(),
                priority: 0,
            }),
            Value::Array(pair) => {
                let path = pair.first()?.as_str()?.to_string();
                let priority = pair.get(1).and_then(Value::as_i64).unwrap_or(0);
                Some(AssetRef {
                    path,
                    priority,
                })
            }
            _ => None,
        })
        .collect()
}

/// Default value for a recognized option key.
fn default_for(key: &str) -> Value {
    match key {
        KEY_ASSETS | KEY_CONDITIONS | KEY_DEFAULT_CONDITIONS => Value::Object(Map::new()),
        KEY_TITLE_ARGS => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

/// True for values the normalizer strips before filling defaults.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Normalize a raw view option set.
///
/// Drops keys whose value is null or an empty collection, then fills in a
/// default for every recognized key that is absent. Unrecognized keys survive
/// unchanged so collaborators can carry extra metadata through synthesis.
///
/// Pure and idempotent: `normalize(&normalize(x)) == normalize(x)`.
///
/// Note that defaults reintroduce nulls and empty collections for absent
/// options; the required-field validation performed at registry build time
/// runs after this fill, so `title`, `type`, `module`, and `renders` must be
/// non-empty in the merged input for the build to succeed.
#[must_use]
pub fn normalize(options: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized: Map<String, Value> = options
        .iter()
        .filter(|(_, value)| !is_empty_value(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for key in RECOGNIZED_KEYS {
        if !normalized.contains_key(key) {
            normalized.insert(key.to_string(), default_for(key));
        }
    }

    normalized
}

/// Recursively merge two raw mappings.
///
/// Keys present only in one operand are kept; when both operands carry an
/// object under the same key, the objects are merged recursively; any other
/// collision is resolved in favor of `overlay`.
#[must_use]
pub fn merge_maps(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, overlay_value) in overlay {
        match (merged.get(key), overlay_value) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => {
                let combined = merge_maps(base_obj, overlay_obj);
                merged.insert(key.clone(), Value::Object(combined));
            }
            _ => {
                merged.insert(key.clone(), overlay_value.clone());
            }
        }
    }

    merged
}
