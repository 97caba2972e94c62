//! trackio: streaming conversion between genomic track formats
//!
//! # Overview
//!
//! trackio parses genomic track files (BED, GTF, WIG and the native
//! relational dump) and pushes their content through a small handler
//! protocol into serializer backends, one feature at a time and in
//! constant memory. A parse pass is strictly sequential and fail-fast:
//! the first malformed line aborts the pass with its exact source
//! location, and the serializer is still closed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> trackio::Result<()> {
//! // One-call conversion, formats sniffed from the extensions
//! trackio::convert(Path::new("peaks.bed"), Path::new("peaks.sql"), None, None)?;
//!
//! // Or run a pass by hand into the in-memory accumulator
//! use trackio::parse::{drive, BedParser};
//! use trackio::serialize::MemorySerializer;
//!
//! let mut parser = BedParser::new(Path::new("peaks.bed"));
//! let mut serializer = MemorySerializer::new();
//! drive(&mut parser, &mut serializer)?;
//! for track in serializer.into_tracks() {
//!     println!("{} features", track.features.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`model`]: tracks, features, typed values, strand encoding
//! - [`handler`]: the parser/serializer protocol
//! - [`parse`]: line parsers (BED, GTF, WIG, relational dump)
//! - [`serialize`]: backends (SQL dump, BED, GTF, WIG, memory)
//! - [`registry`]: the closed format registry
//! - [`convert`]: the one-call entry point, bigWig via external tools
//!
//! Coordinates are canonical 0-based half-open throughout; formats
//! with other conventions are normalized at load and denormalized on
//! write. Strand is the closed set {+1, 0, -1}.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod convert;
pub mod error;
pub mod handler;
pub mod model;
pub mod parse;
pub mod registry;
pub mod serialize;

// Re-export commonly used types
pub use convert::convert;
pub use error::{Result, TrackError};
pub use handler::TrackHandler;
pub use model::{Feature, Strand, Track, Value};
pub use registry::{get_parser, get_serializer, Format};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
