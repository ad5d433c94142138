//! Render error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while expanding manifest templates.
///
/// Any of these is a hard error for the component being rendered: a
/// template referencing an undefined context variable fails loudly
/// instead of producing a manifest with holes in it.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template directory could not be read
    #[error("failed to read manifest directory {path}: {source}")]
    ReadDir {
        /// Directory that failed to enumerate
        path: PathBuf,
        /// Underlying walk error
        source: walkdir::Error,
    },

    /// Template file could not be read
    #[error("failed to read manifest template {path}: {source}")]
    ReadFile {
        /// File that failed to read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Template expansion failed (syntax error or undefined variable)
    #[error("failed to render manifest template {path}: {source}")]
    Template {
        /// Template that failed to expand
        path: PathBuf,
        /// Underlying template engine error
        source: minijinja::Error,
    },

    /// Rendered output is not valid YAML for a Kubernetes object
    #[error("failed to parse rendered manifest {path}: {source}")]
    Parse {
        /// Template whose output failed to parse
        path: PathBuf,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },

    /// A rendered document is missing apiVersion, kind or metadata.name
    #[error("rendered manifest {path} is missing object identity ({detail})")]
    MissingIdentity {
        /// Template that produced the document
        path: PathBuf,
        /// Which identity field was missing
        detail: String,
    },
}
