//! The push protocol between parsers and serializers.
//!
//! [`TrackHandler`] is the sole coupling point between parsing and
//! persistence: every parser drives one, every serializer implements
//! one. The contract is fail-fast. A parser never skips a bad line:
//! the parser constructs the fatal error via [`TrackHandler::error`]
//! and returns it, aborting the pass.
//!
//! # Call ordering
//!
//! For each track: one `new_track`, then `define_fields` before the
//! first `new_feature` of that track, then zero or more `new_feature`
//! calls. Pushing a feature before any track is a protocol violation,
//! reported as [`TrackError::Protocol`].
//!
//! The GTF parser re-issues `define_fields` per feature because its
//! attribute keys can vary record to record; handlers must tolerate
//! redeclaration for the track currently open (see the GTF module
//! docs).

use crate::error::{Result, TrackError};
use crate::model::Value;
use std::path::Path;

/// Consumer side of a parse pass.
///
/// Implemented by the in-memory accumulator and by every persistence
/// backend. Parsers call these methods in source order; a handler never
/// reorders or deduplicates what it is given.
pub trait TrackHandler {
    /// Declares the field schema for the track currently open.
    ///
    /// Must be called before the first feature of that track.
    fn define_fields(&mut self, names: &[&str]) -> Result<()>;

    /// Opens a new track with the given header attributes.
    ///
    /// Subsequent features belong to it until the next `new_track`.
    fn new_track(&mut self, attributes: Vec<(String, String)>, name: Option<&str>) -> Result<()>;

    /// Appends one feature row to the track currently open.
    fn new_feature(&mut self, chrom: &str, values: Vec<Value>) -> Result<()>;

    /// Builds the fatal error for a malformed source line.
    ///
    /// `message` completes the sentence "the track 'path:line' ...",
    /// e.g. "has non integers as interval bounds". The caller returns
    /// the error immediately; there is no continue-on-error mode.
    fn error(&self, path: &Path, line: u64, message: &str) -> TrackError {
        TrackError::LineFormat {
            path: path.to_path_buf(),
            line,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::MemorySerializer;

    #[test]
    fn test_error_carries_location() {
        let handler = MemorySerializer::new();
        let err = handler.error(Path::new("/tmp/test.bed"), 12, "has no columns");
        match err {
            TrackError::LineFormat { line, message, .. } => {
                assert_eq!(line, 12);
                assert_eq!(message, "has no columns");
            }
            other => panic!("expected LineFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_error_message_names_exact_location() {
        let handler = MemorySerializer::new();
        let err = handler.error(Path::new("a.bed"), 3, "has negative or null intervals");
        assert_eq!(
            err.to_string(),
            "the track 'a.bed:3' has negative or null intervals"
        );
    }
}
