//! Format registry: a closed set of formats resolved by name or file
//! extension.
//!
//! Resolution is a pure match over [`Format`]; there is no runtime
//! registration. Asking for a direction a format does not support (a
//! `sql` parser, a `track` serializer, anything `bigwig`) fails with
//! [`TrackError::UnsupportedFormat`]. The bigWig format is recognized
//! only so the conversion entry point can route it through the
//! external tools.

use crate::error::{Result, TrackError};
use crate::parse::{BedParser, GtfParser, Parser, TrackStoreParser, WigParser};
use crate::serialize::{BedSerializer, GtfSerializer, Serializer, SqlSerializer, WigSerializer};
use std::path::Path;

/// The closed set of formats the library knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// BED: tab-delimited intervals, 0-based half-open.
    Bed,
    /// GTF: nine-column gene annotation, 1-based closed on disk.
    Gtf,
    /// WIG: fixedStep/variableStep signal values, 1-based on disk.
    Wig,
    /// The native relational dump, read back under this identifier.
    Track,
    /// The native relational dump as a destination.
    Sql,
    /// Binary bigWig, reachable only via the external UCSC tools.
    BigWig,
}

impl Format {
    /// Resolves a format identifier. Case-sensitive, matching the
    /// identifiers the registry publishes.
    pub fn from_name(name: &str) -> Option<Format> {
        match name {
            "bed" => Some(Format::Bed),
            "gtf" => Some(Format::Gtf),
            "wig" => Some(Format::Wig),
            "track" => Some(Format::Track),
            "sql" => Some(Format::Sql),
            "bigwig" => Some(Format::BigWig),
            _ => None,
        }
    }

    /// Sniffs a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        let name = path.file_name()?.to_str()?;
        // Look through a compression suffix
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .unwrap_or(name);
        let extension = name.rsplit_once('.')?.1;
        match extension {
            "bed" => Some(Format::Bed),
            "gtf" => Some(Format::Gtf),
            "wig" => Some(Format::Wig),
            "sql" => Some(Format::Track),
            "bw" | "bigwig" | "bigWig" => Some(Format::BigWig),
            _ => None,
        }
    }

    /// The identifier this format resolves from.
    pub fn name(self) -> &'static str {
        match self {
            Format::Bed => "bed",
            Format::Gtf => "gtf",
            Format::Wig => "wig",
            Format::Track => "track",
            Format::Sql => "sql",
            Format::BigWig => "bigwig",
        }
    }

    fn parser(self, path: &Path) -> Option<Box<dyn Parser>> {
        match self {
            Format::Bed => Some(Box::new(BedParser::new(path))),
            Format::Gtf => Some(Box::new(GtfParser::new(path))),
            Format::Wig => Some(Box::new(WigParser::new(path))),
            Format::Track => Some(Box::new(TrackStoreParser::new(path))),
            Format::Sql | Format::BigWig => None,
        }
    }

    fn serializer(self, path: &Path) -> Option<Box<dyn Serializer>> {
        match self {
            Format::Sql => Some(Box::new(SqlSerializer::new(path))),
            Format::Bed => Some(Box::new(BedSerializer::new(path))),
            Format::Gtf => Some(Box::new(GtfSerializer::new(path))),
            Format::Wig => Some(Box::new(WigSerializer::new(path))),
            Format::Track | Format::BigWig => None,
        }
    }
}

/// Constructs the parser for a source file in the named format.
pub fn get_parser(path: &Path, format: &str) -> Result<Box<dyn Parser>> {
    Format::from_name(format)
        .and_then(|f| f.parser(path))
        .ok_or_else(|| TrackError::UnsupportedFormat {
            format: format.to_string(),
        })
}

/// Constructs the serializer for a destination file in the named
/// format.
pub fn get_serializer(path: &Path, format: &str) -> Result<Box<dyn Serializer>> {
    Format::from_name(format)
        .and_then(|f| f.serializer(path))
        .ok_or_else(|| TrackError::UnsupportedFormat {
            format: format.to_string(),
        })
}
