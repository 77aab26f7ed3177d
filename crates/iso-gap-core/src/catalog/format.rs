use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Serialization formats accepted for catalog and implementation files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Json5,
    Yaml,
}

impl DocumentFormat {
    /// Pick a format from the file extension, falling back to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json5") => Self::Json5,
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, raw: &str) -> Result<T> {
        let parsed = match self {
            Self::Json => serde_json::from_str(raw)?,
            Self::Json5 => json5::from_str(raw)?,
            Self::Yaml => serde_yaml::from_str(raw)?,
        };
        Ok(parsed)
    }
}

/// Read and parse a document, choosing the format from its extension.
pub fn read_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file at {}", path.display()))?;
    DocumentFormat::from_path(path)
        .parse(&raw)
        .with_context(|| format!("invalid structure in {what} file at {}", path.display()))
}
