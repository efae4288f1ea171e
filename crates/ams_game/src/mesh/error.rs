use std::path::PathBuf;
use thiserror::Error;

/// Mesh loading and saving errors
#[derive(Error, Debug)]
pub enum MeshError {
    /// No loader registered for the file extension
    #[error("No mesh loader for extension '{0}'")]
    NoLoader(String),

    /// The file could not be opened, read or written
    #[error("Could not access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// First line is not `ams_mesh`
    #[error("Header is not ams_mesh ({path})")]
    InvalidHeader {
        /// File involved
        path: PathBuf,
    },

    /// Format version other than 1
    #[error("Version '{version}' is not supported ({path})")]
    UnsupportedVersion {
        /// File involved
        path: PathBuf,
        /// Version found in the file
        version: String,
    },

    /// A non-zero count whose block label never appears
    #[error("{count} > 0 but {label} not found ({path})")]
    MissingBlock {
        /// File involved
        path: PathBuf,
        /// Count line name, e.g. `vertex_count`
        count: &'static str,
        /// Block label, e.g. `vertices`
        label: &'static str,
    },

    /// A face or submesh record with a count of zero or less
    #[error("invalid {kind} size ({path})")]
    InvalidIndexCount {
        /// File involved
        path: PathBuf,
        /// `face` or `submesh`
        kind: &'static str,
    },

    /// Malformed content
    #[error("Failed to read mesh file: {message} ({path})")]
    Parse {
        /// File involved
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Error reported by a third-party loader
    #[error("Loader error: {0}")]
    Loader(String),
}
