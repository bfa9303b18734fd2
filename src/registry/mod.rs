//! In-memory index of the platform version registry (`api-versions.xml`).
//!
//! Built once per run and then only read. Every lookup is infallible; absent
//! entries come back as `None`.

mod parse;

use crate::version::ApiLevel;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed registry document: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// When a declaration was introduced and, if ever, deprecated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionFact {
    pub since: Option<ApiLevel>,
    pub deprecated: Option<ApiLevel>,
}

impl VersionFact {
    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.deprecated.is_none()
    }

    /// Whether `level` is exactly where this fact starts or retires.
    pub fn touches(&self, level: ApiLevel) -> bool {
        self.since == Some(level) || self.deprecated == Some(level)
    }
}

/// Facts recorded for one type and its members.
#[derive(Debug, Default)]
pub struct TypeEntry {
    pub fact: VersionFact,
    /// Field (and enum constant) name to fact.
    pub fields: HashMap<String, VersionFact>,
    /// Normalized method descriptor to fact.
    pub methods: HashMap<String, VersionFact>,
}

impl TypeEntry {
    fn is_empty(&self) -> bool {
        self.fact.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }
}

/// Registry facts keyed by binary type name, e.g. `android/app/AlertDialog$Builder`.
#[derive(Debug, Default)]
pub struct RegistryIndex {
    types: HashMap<String, TypeEntry>,
}

impl RegistryIndex {
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let xml = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    pub fn parse(xml: &str) -> Result<Self, RegistryError> {
        let types = parse::types(xml)?;
        Ok(Self { types })
    }

    /// The type's own fact. `None` when the entry only exists for its members.
    pub fn lookup_type(&self, name: &str) -> Option<VersionFact> {
        self.types
            .get(name)
            .map(|entry| entry.fact)
            .filter(|fact| !fact.is_empty())
    }

    pub fn lookup_field(&self, type_name: &str, field: &str) -> Option<VersionFact> {
        self.types.get(type_name)?.fields.get(field).copied()
    }

    /// `descriptor` must already be in normalized form.
    pub fn lookup_method(&self, type_name: &str, descriptor: &str) -> Option<VersionFact> {
        self.types.get(type_name)?.methods.get(descriptor).copied()
    }

    pub fn entries(&self) -> &HashMap<String, TypeEntry> {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
