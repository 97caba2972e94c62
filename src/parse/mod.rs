//! Format parsers: one module per source grammar.
//!
//! Every parser is a single forward pass over its source that drives a
//! [`Serializer`](crate::serialize::Serializer) through the
//! [`TrackHandler`](crate::handler::TrackHandler) protocol. Parsing is
//! single-threaded and synchronous; the first validation failure aborts
//! the whole pass with the exact source location.
//!
//! # Lifecycle
//!
//! A serializer is a scoped resource: [`drive`] opens it before the
//! pass, runs the parser, and closes it on every exit path, including
//! when a line error aborts the pass. A serializer released after an
//! error may hold an incomplete track set.
//!
//! # Example
//!
//! ```no_run
//! use trackio::registry::get_parser;
//! use trackio::serialize::MemorySerializer;
//! use trackio::parse::drive;
//!
//! # fn main() -> trackio::Result<()> {
//! let mut parser = get_parser("data.bed".as_ref(), "bed")?;
//! let mut serializer = MemorySerializer::new();
//! drive(parser.as_mut(), &mut serializer)?;
//! let tracks = serializer.into_tracks();
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::serialize::Serializer;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

pub mod bed;
pub mod fields;
pub mod gtf;
pub mod track;
pub mod wig;

pub use bed::BedParser;
pub use gtf::GtfParser;
pub use track::TrackStoreParser;
pub use wig::WigParser;

/// Producer side of a parse pass.
///
/// A parser is constructed bound to a source path (see
/// [`get_parser`](crate::registry::get_parser)) and consumed by one
/// call to [`parse`](Parser::parse).
pub trait Parser {
    /// The source path this parser is bound to.
    fn path(&self) -> &Path;

    /// Runs the single forward pass, pushing everything into `handler`.
    ///
    /// Callers normally go through [`drive`], which also manages the
    /// serializer's open/close scope.
    fn parse(&mut self, handler: &mut dyn Serializer) -> Result<()>;
}

/// Runs one parse pass with guaranteed serializer release.
///
/// The serializer is opened before the pass and closed on both normal
/// completion and error propagation; when both the pass and the close
/// fail, the pass error wins.
pub fn drive(parser: &mut dyn Parser, serializer: &mut dyn Serializer) -> Result<()> {
    serializer.open()?;
    let outcome = parser.parse(serializer);
    let closed = serializer.close();
    outcome.and(closed)
}

/// Line source with 1-based numbering and transparent gzip.
///
/// Reuses one line buffer across the pass; `.gz` paths are decoded with
/// [`MultiGzDecoder`]. Blank lines are skipped (no grammar in this
/// crate gives them meaning), but numbering always counts physical
/// lines so error messages name the real location.
pub struct LineReader {
    reader: Box<dyn BufRead>,
    line_buf: String,
    line_number: u64,
}

impl LineReader {
    /// Opens a reader over a plain or gzip-compressed file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if is_gzip_path(path) {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::from_bufread(reader))
    }

    /// Wraps an arbitrary reader; used by tests and the in-memory
    /// parsers.
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self::from_bufread(Box::new(BufReader::new(reader)))
    }

    fn from_bufread(reader: Box<dyn BufRead>) -> Self {
        LineReader {
            reader,
            line_buf: String::with_capacity(1024),
            line_number: 0,
        }
    }

    /// Returns the next non-blank line together with its 1-based
    /// physical line number, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<(u64, &str)>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.line_number += 1;
                    if self.line_buf.trim().is_empty() {
                        continue;
                    }
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        let line = self.line_buf.trim();
        Ok(Some((self.line_number, line)))
    }
}

fn is_gzip_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("gz") | Some("bgz") | Some("gzip")
    )
}

/// File name used as the default track name, mirroring how headerless
/// sources label the track they implicitly open.
pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
