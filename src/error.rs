//! Error types for trackio

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for trackio operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// Error types that can occur in trackio
#[derive(Debug, Error)]
pub enum TrackError {
    /// Format identifier not known to the registry
    #[error("the format '{format}' is not supported")]
    UnsupportedFormat {
        /// The offending format identifier or file extension
        format: String,
    },

    /// Malformed line in a track file
    ///
    /// Covers invalid headers, wrong column counts, non-numeric
    /// coordinates, inverted or zero-length intervals, missing
    /// chromosomes and malformed optional fields. Always fatal to the
    /// parse pass.
    #[error("the track '{}:{line}' {message}", .path.display())]
    LineFormat {
        /// Source file path
        path: PathBuf,
        /// 1-based line number
        line: u64,
        /// What is wrong with the line
        message: String,
    },

    /// GTF attribute column does not lead with gene_id, transcript_id
    #[error(
        "invalid attribute column at '{}:{line}': valid attributes begin with \"gene_id\" and \"transcript_id\", got {keys:?}",
        .path.display()
    )]
    AttributeSchema {
        /// Source file path
        path: PathBuf,
        /// 1-based line number
        line: u64,
        /// The decoded attribute keys, in source order
        keys: Vec<String>,
    },

    /// A native conversion tool is absent from this host
    ///
    /// Surfaced only by the conversion entry point, never by a line
    /// parser. Callers may treat it as "this conversion direction is
    /// unavailable here" rather than a data error.
    #[error("the executable '{tool}' required for this conversion was not found")]
    MissingExternalTool {
        /// Name of the missing executable
        tool: String,
    },

    /// Handler protocol misuse (e.g. a feature pushed before any track)
    #[error("handler protocol violation: {0}")]
    Protocol(String),

    /// Conversion entry point misuse or external tool failure
    #[error("conversion error: {0}")]
    Conversion(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
