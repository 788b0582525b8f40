//! Shared registry documents of the core application.
//!
//! Three documents wire plugins into the core application: the controller
//! manifest read by the API server, the module list read by the frontend,
//! and the compose-style service registry. Each is loaded into memory,
//! mutated, and written back atomically by serialising into a temporary file
//! beside the target and renaming it into place, so a crash never leaves a
//! half-written document behind.
//!
//! A missing document reads as its empty baseline. The module list and the
//! service registry each manage one top-level key; every other key is
//! carried through untouched and in its original position.

mod controllers;
mod modules;
mod services;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

pub use controllers::{ControllerEntry, ControllerManifest};
pub use modules::{ModuleList, WebModuleEntry};
pub use services::{MANAGED_MARKER, ServiceRegistry, ServiceRegistryEntry};

/// Errors raised while reading or writing a registry document.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The document exists but could not be read or parsed.
    #[error("failed to read registry '{path}': {message}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The document could not be written.
    #[error("failed to write registry '{path}': {source}")]
    Write {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Reads the JSON document at `path`, or its default when absent.
fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T, RegistryError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => {
            return Err(RegistryError::Read {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };
    serde_json::from_str(&text).map_err(|err| RegistryError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Writes `value` as pretty JSON to `path` via a temporary sibling file.
fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), RegistryError> {
    let write_error = |err: std::io::Error| RegistryError::Write {
        path: path.to_path_buf(),
        source: Arc::new(err),
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(parent).map_err(write_error)?;
    serde_json::to_writer_pretty(&mut file, value).map_err(|err| write_error(err.into()))?;
    file.write_all(b"\n").map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}

/// Top-level JSON object with one managed key split out. The remaining keys
/// keep their order and the managed key is written back where it was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KeyedDocument {
    rest: Map<String, Value>,
    position: usize,
}

impl KeyedDocument {
    /// Reads the document at `path` and splits off the value under `key`.
    fn load(path: &Path, key: &str) -> Result<(Self, Option<Value>), RegistryError> {
        let document: Map<String, Value> = read_document(path)?;
        let mut rest = Map::new();
        let mut managed = None;
        let mut found_at = None;
        for (name, value) in document {
            if name == key {
                found_at = Some(rest.len());
                managed = Some(value);
            } else {
                rest.insert(name, value);
            }
        }
        let position = found_at.unwrap_or(rest.len());
        Ok((Self { rest, position }, managed))
    }

    /// Writes the document to `path` with `managed` under `key`.
    fn save(&self, path: &Path, key: &str, managed: Value) -> Result<(), RegistryError> {
        let mut document = Map::new();
        let mut pending = Some(managed);
        for (index, (name, value)) in self.rest.iter().enumerate() {
            if index == self.position
                && let Some(entries) = pending.take()
            {
                document.insert(key.to_owned(), entries);
            }
            document.insert(name.clone(), value.clone());
        }
        if let Some(entries) = pending {
            document.insert(key.to_owned(), entries);
        }
        write_document(path, &document)
    }

    const fn rest(&self) -> &Map<String, Value> {
        &self.rest
    }
}

fn read_error(path: &Path, message: impl Into<String>) -> RegistryError {
    RegistryError::Read {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn encode_error(path: &Path, err: serde_json::Error) -> RegistryError {
    RegistryError::Write {
        path: path.to_path_buf(),
        source: Arc::new(std::io::Error::other(err)),
    }
}
