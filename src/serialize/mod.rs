//! Serializer backends: consumers of the handler protocol.
//!
//! A serializer implements [`TrackHandler`] and materializes tracks
//! somewhere: in memory, as a textual format, or in the relational
//! dump. It is a scoped resource: [`open`](Serializer::open) before the
//! parse pass, [`close`](Serializer::close) on every exit path (the
//! driver in [`crate::parse::drive`] guarantees the latter even when
//! the pass aborts).
//!
//! Persisted forms must be re-readable: re-parsing what a serializer
//! wrote reproduces the original field schema, track attributes and
//! per-field values, modulo the canonical normalizations (strand
//! encoding and coordinate convention are canonical, not
//! round-trip-preserving to the original spelling).

use crate::error::{Result, TrackError};
use crate::handler::TrackHandler;
use crate::model::{Feature, Track, Value};

pub mod bed;
pub mod gtf;
pub mod sql;
pub mod wig;

pub use bed::BedSerializer;
pub use gtf::GtfSerializer;
pub use sql::SqlSerializer;
pub use wig::WigSerializer;

/// Renders a `track` declaration line from attribute pairs, quoting
/// values that contain whitespace.
pub(crate) fn track_header(attributes: &[(String, String)]) -> String {
    let mut line = String::from("track");
    for (key, value) in attributes {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        if value.chars().any(char::is_whitespace) || value.is_empty() {
            line.push('"');
            line.push_str(value);
            line.push('"');
        } else {
            line.push_str(value);
        }
    }
    line
}

/// A handler with a release scope.
///
/// `open` runs before the first protocol call of a pass; `close` runs
/// after the last one, on both success and failure. A serializer closed
/// after an error may hold an incomplete track set and callers must not
/// assume consistency of whatever it accumulated.
pub trait Serializer: TrackHandler {
    /// Acquires whatever resources the backend needs (e.g. the output
    /// file). Called once per parse pass.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Flushes and releases the backend. Called exactly once per pass,
    /// on every exit path.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory accumulator: the default handler.
///
/// Collects tracks exactly as pushed; [`into_tracks`] exposes them
/// after the pass. Field redeclaration for the open track is tolerated
/// (last declaration wins), which is what the GTF parser's per-feature
/// `define_fields` requires.
///
/// [`into_tracks`]: MemorySerializer::into_tracks
#[derive(Debug, Default)]
pub struct MemorySerializer {
    tracks: Vec<Track>,
}

impl MemorySerializer {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the accumulator and returns the collected tracks.
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }

    /// The tracks collected so far; usable mid-pass and after an
    /// aborted pass.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn current(&mut self) -> Result<&mut Track> {
        self.tracks
            .last_mut()
            .ok_or_else(|| TrackError::Protocol("no track is open".to_string()))
    }
}

impl TrackHandler for MemorySerializer {
    fn define_fields(&mut self, names: &[&str]) -> Result<()> {
        let track = self.current()?;
        track.fields = names.iter().map(|n| n.to_string()).collect();
        Ok(())
    }

    fn new_track(&mut self, attributes: Vec<(String, String)>, name: Option<&str>) -> Result<()> {
        self.tracks.push(Track {
            name: name.map(|n| n.to_string()),
            attributes,
            fields: Vec::new(),
            features: Vec::new(),
        });
        Ok(())
    }

    fn new_feature(&mut self, chrom: &str, values: Vec<Value>) -> Result<()> {
        if chrom.is_empty() {
            return Err(TrackError::Protocol(
                "feature chromosome must be non-empty".to_string(),
            ));
        }
        let track = self.current()?;
        track.features.push(Feature {
            chrom: chrom.to_string(),
            values,
        });
        Ok(())
    }
}

impl Serializer for MemorySerializer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_before_track_is_protocol_error() {
        let mut handler = MemorySerializer::new();
        let err = handler
            .new_feature("chr1", vec![Value::Int(0), Value::Int(1)])
            .unwrap_err();
        assert!(matches!(err, TrackError::Protocol(_)));
    }

    #[test]
    fn test_tracks_accumulate_in_order() {
        let mut handler = MemorySerializer::new();
        handler.new_track(vec![], Some("a")).unwrap();
        handler.define_fields(&["start", "end"]).unwrap();
        handler
            .new_feature("chr1", vec![Value::Int(0), Value::Int(10)])
            .unwrap();
        handler.new_track(vec![], Some("b")).unwrap();
        handler.define_fields(&["start", "end"]).unwrap();

        let tracks = handler.into_tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name.as_deref(), Some("a"));
        assert_eq!(tracks[0].features.len(), 1);
        assert_eq!(tracks[1].name.as_deref(), Some("b"));
        assert!(tracks[1].features.is_empty());
    }

    #[test]
    fn test_field_redeclaration_last_wins() {
        let mut handler = MemorySerializer::new();
        handler.new_track(vec![], None).unwrap();
        handler.define_fields(&["start", "end"]).unwrap();
        handler.define_fields(&["start", "end", "score"]).unwrap();
        let tracks = handler.into_tracks();
        assert_eq!(tracks[0].fields, vec!["start", "end", "score"]);
    }

    #[test]
    fn test_empty_chromosome_rejected() {
        let mut handler = MemorySerializer::new();
        handler.new_track(vec![], None).unwrap();
        assert!(handler.new_feature("", vec![]).is_err());
    }
}
