//! Avatar profiles: named option sets merged over the `default` profile.
//!
//! A [`Profile`] is a loosely typed option map, exactly as it appears in the
//! profiles file. Resolution deep-merges the selected profile (or an ad-hoc
//! override map) over `default` and flattens nested keys into a dotted
//! namespace. Typed readers on [`ResolvedProfile`] decide which values are
//! usable; anything they do not recognize is carried along but inert.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::params::Rating;
use crate::ConfigError;

/// Name of the profile every other profile is merged over.
pub const DEFAULT_PROFILE: &str = "default";

/// Raw option map for one profile (`size`, `fallback`, `secure`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the updated profile.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recursively overlays `other` onto `self`: nested maps merge key by
    /// key, every other value in `other` replaces the one in `self`.
    pub fn merge(&mut self, other: &Profile) {
        merge_maps(&mut self.0, &other.0);
    }

    /// Returns `self` merged over `base` without mutating either.
    #[must_use]
    pub fn merged_over(&self, base: &Profile) -> Profile {
        let mut merged = base.clone();
        merged.merge(self);
        merged
    }
}

impl From<Map<String, Value>> for Profile {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_maps(existing, nested),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut BTreeMap<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(&path, nested, out),
            _ => {
                out.insert(path, value.clone());
            }
        }
    }
}

/// Chooses which options a call runs with.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selector {
    /// The `default` profile as-is.
    #[default]
    Default,
    /// A named profile merged over `default`.
    Named(String),
    /// An ad-hoc option map merged over `default`.
    Overrides(Profile),
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        if name == DEFAULT_PROFILE {
            Selector::Default
        } else {
            Selector::Named(name.to_string())
        }
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::from(name.as_str())
    }
}

impl From<Option<&str>> for Selector {
    fn from(name: Option<&str>) -> Self {
        name.map_or(Selector::Default, Selector::from)
    }
}

impl From<Profile> for Selector {
    fn from(overrides: Profile) -> Self {
        Selector::Overrides(overrides)
    }
}

impl From<Map<String, Value>> for Selector {
    fn from(overrides: Map<String, Value>) -> Self {
        Selector::Overrides(Profile(overrides))
    }
}

/// Source of named profiles, supplied by the application.
pub trait ProfileStore: Send + Sync {
    /// The profile every selection is merged over.
    fn default_profile(&self) -> Profile;

    /// Looks up a profile by name. `None` when no such profile exists.
    fn profile(&self, name: &str) -> Option<Profile>;

    /// Resolves `selector` into a fully merged, flattened profile.
    ///
    /// An unknown profile name resolves to `default` alone.
    fn resolve(&self, selector: &Selector) -> ResolvedProfile {
        let base = self.default_profile();
        let merged = match selector {
            Selector::Default => base,
            Selector::Named(name) if name == DEFAULT_PROFILE => base,
            Selector::Named(name) => {
                if let Some(named) = self.profile(name) {
                    named.merged_over(&base)
                } else {
                    tracing::warn!(profile = %name, "unknown avatar profile, using default");
                    base
                }
            }
            Selector::Overrides(overrides) => overrides.merged_over(&base),
        };
        ResolvedProfile::from_profile(&merged)
    }
}

/// In-memory profile store, normally loaded from `config/gravatar.yaml`.
///
/// Always holds a `default` profile: the built-in package defaults unless
/// the loaded file supplies its own.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: HashMap<String, Profile>,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileSet {
    /// The package defaults: 80px, `mp` fallback, `g` rating, `.jpg`.
    #[must_use]
    pub fn builtin() -> Self {
        let default = Profile::new()
            .with("size", 80)
            .with("fallback", "mp")
            .with("secure", false)
            .with("maximumRating", "g")
            .with("forceDefault", false)
            .with("forceExtension", "jpg");
        Self::with_default(default)
    }

    /// A set whose `default` profile is `default` and nothing else.
    #[must_use]
    pub fn with_default(default: Profile) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), default);
        Self { profiles }
    }

    /// Adds or replaces a named profile.
    pub fn insert(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Parses profiles from YAML and layers them over the built-in set.
    ///
    /// Groups replace built-in groups of the same name wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProfilesFileParse`] for malformed YAML and
    /// [`ConfigError::InvalidProfile`] when the document or a group is not
    /// a mapping.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut set = Self::builtin();
        if content.trim().is_empty() {
            return Ok(set);
        }

        let document: Value = serde_yaml::from_str(content)?;

        let groups = match document {
            Value::Null => return Ok(set),
            Value::Object(groups) => groups,
            _ => {
                return Err(ConfigError::InvalidProfile {
                    name: "<root>".to_string(),
                    reason: "expected a mapping of profile names".to_string(),
                })
            }
        };

        for (name, group) in groups {
            match group {
                Value::Object(options) => set.insert(name, Profile(options)),
                Value::Null => set.insert(name, Profile::new()),
                _ => {
                    return Err(ConfigError::InvalidProfile {
                        name,
                        reason: "expected a mapping of options".to_string(),
                    })
                }
            }
        }

        Ok(set)
    }
}

impl ProfileStore for ProfileSet {
    fn default_profile(&self) -> Profile {
        self.profiles
            .get(DEFAULT_PROFILE)
            .cloned()
            .unwrap_or_default()
    }

    fn profile(&self, name: &str) -> Option<Profile> {
        self.profiles.get(name).cloned()
    }
}

/// Load the profile store from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_profiles(path: &Path) -> Result<ProfileSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfilesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    ProfileSet::from_yaml_str(&content)
}

/// A profile after merging over `default`, flattened to dotted keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProfile {
    options: BTreeMap<String, Value>,
}

impl ResolvedProfile {
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        let mut options = BTreeMap::new();
        flatten_into("", &profile.0, &mut options);
        Self { options }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// `true` only for a literal boolean `true`.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.flag("secure")
    }

    /// The size in pixels, when configured as a positive integer.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.get("size")
            .and_then(Value::as_u64)
            .filter(|&size| size > 0)
    }

    #[must_use]
    pub fn maximum_rating(&self) -> Option<Rating> {
        self.get("maximumRating")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
    }

    #[must_use]
    pub fn fallback(&self) -> Option<String> {
        self.get("fallback").and_then(scalar_text)
    }

    #[must_use]
    pub fn force_default(&self) -> bool {
        self.flag("forceDefault")
    }

    #[must_use]
    pub fn force_extension(&self) -> Option<String> {
        self.get("forceExtension").and_then(scalar_text)
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }
}

/// Renders a non-empty string or non-zero number; everything else is unset.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(f64::is_normal) => Some(n.to_string()),
        _ => None,
    }
}
