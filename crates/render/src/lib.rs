//! Manifest template rendering
//!
//! Expands an on-disk manifest template tree into typed-but-unstructured
//! Kubernetes objects. Templates use minijinja with strict undefined
//! behavior: a template referencing a variable absent from the render
//! data is a hard error, never an empty substitution.
//!
//! Files are walked in lexical name order so a given (spec, facts) pair
//! always produces the same object sequence.

pub mod error;

use std::collections::BTreeMap;
use std::path::Path;

use kube::core::DynamicObject;
use minijinja::{Environment, UndefinedBehavior};
use serde::Deserialize;
use walkdir::WalkDir;

pub use error::RenderError;

/// Data context handed to every template of one component.
///
/// Values are inserted by the component handlers (namespace, image
/// references, pull policy, cluster facts) and looked up by name inside
/// the templates.
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    values: BTreeMap<String, serde_json::Value>,
}

impl RenderData {
    /// Creates an empty render data context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a string value under the given template variable name.
    pub fn insert_str(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), serde_json::Value::from(value));
    }

    /// Inserts a boolean value under the given template variable name.
    pub fn insert_bool(&mut self, key: &str, value: bool) {
        self.values
            .insert(key.to_string(), serde_json::Value::from(value));
    }
}

/// Expands a single template source with the given data.
fn render_source(source: &str, data: &RenderData) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.render_str(source, &data.values)
}

/// Renders every template file under `dir`, recursively, into objects.
///
/// Files are processed in lexical name order. Each file may contain
/// multiple YAML documents; empty documents (for example a document
/// fully guarded by a template conditional) are skipped. Every produced
/// object must carry apiVersion, kind and metadata.name.
pub fn render_dir(dir: &Path, data: &RenderData) -> Result<Vec<DynamicObject>, RenderError> {
    let mut objects = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|source| RenderError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let source = std::fs::read_to_string(path).map_err(|source| RenderError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let rendered = render_source(&source, data).map_err(|source| RenderError::Template {
            path: path.to_path_buf(),
            source,
        })?;

        objects.extend(parse_documents(path, &rendered)?);
    }

    Ok(objects)
}

/// Parses the rendered output of one template file into objects.
fn parse_documents(path: &Path, rendered: &str) -> Result<Vec<DynamicObject>, RenderError> {
    let mut objects = Vec::new();

    for document in serde_yaml::Deserializer::from_str(rendered) {
        let value =
            serde_json::Value::deserialize(document).map_err(|source| RenderError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if value.is_null() {
            continue;
        }

        let object: DynamicObject =
            serde_json::from_value(value).map_err(|e| RenderError::MissingIdentity {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let types = object
            .types
            .as_ref()
            .ok_or_else(|| RenderError::MissingIdentity {
                path: path.to_path_buf(),
                detail: "apiVersion/kind".to_string(),
            })?;
        if types.kind.is_empty() || types.api_version.is_empty() {
            return Err(RenderError::MissingIdentity {
                path: path.to_path_buf(),
                detail: "apiVersion/kind".to_string(),
            });
        }
        if object.metadata.name.as_deref().unwrap_or("").is_empty() {
            return Err(RenderError::MissingIdentity {
                path: path.to_path_buf(),
                detail: "metadata.name".to_string(),
            });
        }

        objects.push(object);
    }

    Ok(objects)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.') && s.len() > 1)
        .unwrap_or(false)
}
