use std::collections::HashMap;

use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Document formats shared by the catalog and implementation loaders.
pub mod format;
pub mod file_repository;

/// A single required control, e.g. `A.6.1 Internal organization`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Catalog-unique identifier such as `A.6.1`.
    pub id: String,
    /// Human-readable title shown in reports.
    #[serde(alias = "description")]
    pub title: String,
}

impl Control {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Errors raised when a control catalog is structurally unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("control catalog must contain at least one control")]
    EmptyCatalog,
    #[error("control at position {position} has a blank id")]
    BlankId { position: usize },
    #[error("duplicate control id `{id}`")]
    DuplicateId { id: String },
}

/// Ordered, non-empty set of controls with unique identifiers.
///
/// Construction is the only validation point; a `ControlCatalog` value is
/// always well-formed and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ControlCatalog {
    controls: Vec<Control>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ControlCatalog {
    pub fn new(controls: Vec<Control>) -> Result<Self, ConfigError> {
        if controls.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut index = HashMap::with_capacity(controls.len());
        for (position, control) in controls.iter().enumerate() {
            if control.id.trim().is_empty() {
                return Err(ConfigError::BlankId { position });
            }
            if index.insert(control.id.clone(), position).is_some() {
                return Err(ConfigError::DuplicateId {
                    id: control.id.clone(),
                });
            }
        }
        Ok(Self { controls, index })
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Always `false` for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Control> {
        self.index.get(id).map(|&idx| &self.controls[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }
}

/// Errors raised when implementation data is not a mapping of id to boolean.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputError {
    #[error("implementation data must be a mapping of control ids to booleans (got {found})")]
    NotAMapping { found: String },
    #[error("implementation status for `{id}` must be a boolean (got {found})")]
    NonBoolean { id: String, found: String },
}

/// Organization-supplied implementation status per control id.
///
/// Entries keep the order in which they were supplied. Re-inserting an id
/// keeps its original position and takes the newer value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImplementationRecord {
    entries: Vec<(String, bool)>,
    index: HashMap<String, usize>,
}

impl ImplementationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let mut record = Self::default();
        for (id, implemented) in entries {
            let id = id.into();
            match record.index.get(&id) {
                Some(&idx) => record.entries[idx].1 = implemented,
                None => {
                    record.index.insert(id.clone(), record.entries.len());
                    record.entries.push((id, implemented));
                }
            }
        }
        record
    }

    /// Validate a parsed document and convert it into a typed record.
    pub fn from_value(value: Value) -> Result<Self, InputError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(InputError::NotAMapping {
                    found: json_kind(&other).to_string(),
                })
            }
        };
        let mut entries = Vec::with_capacity(map.len());
        for (id, status) in map {
            match status {
                Value::Bool(implemented) => entries.push((id, implemented)),
                other => {
                    return Err(InputError::NonBoolean {
                        id,
                        found: json_kind(&other).to_string(),
                    })
                }
            }
        }
        Ok(Self::from_entries(entries))
    }

    /// Status for `id`, or `None` when the record does not mention it.
    pub fn status(&self, id: &str) -> Option<bool> {
        self.index.get(id).map(|&idx| self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(id, status)| (id.as_str(), *status))
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ImplementationRecord {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        Self::from_entries(iter)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Abstraction over catalog loading so the analyzer does not care where controls come from.
pub trait CatalogRepository: Send + Sync {
    /// Retrieve the full, validated catalog.
    fn load_catalog(&self) -> AnyResult<ControlCatalog>;

    /// Fetch a single control by identifier if it exists.
    fn get_control(&self, id: &str) -> AnyResult<Option<Control>>;
}
