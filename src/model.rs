//! Canonical relational representation of track data.
//!
//! Every parser, whatever its source grammar, produces the same shapes:
//! a [`Track`] carrying free-form header attributes and a field schema,
//! and [`Feature`] rows whose typed [`Value`]s match that schema.
//!
//! # Coordinate System
//!
//! All intervals in the canonical representation are **0-based,
//! half-open** `[start, end)`. Formats with other conventions (GTF's
//! 1-based closed intervals, WIG's 1-based positions) are converted at
//! load time, so no downstream consumer ever sees a second convention.
//!
//! # Examples
//!
//! ```
//! use trackio::model::{Strand, Value};
//!
//! // Strand symbols normalize to a closed {-1, 0, +1} set
//! assert_eq!(Strand::from_symbol("+").as_int(), 1);
//! assert_eq!(Strand::from_symbol("-").as_int(), -1);
//! assert_eq!(Strand::from_symbol("?").as_int(), 0);
//!
//! // Typed cell values
//! let v = Value::Float(0.5);
//! assert_eq!(v.to_string(), "0.5");
//! ```

use std::fmt;

/// A typed cell value in a feature row.
///
/// The schema of a track is declared as names only; the value types are
/// determined by each format's normalization rules (e.g. BED scores are
/// floats, GTF frames are integers or [`Value::Null`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value (coordinates, strand encoding, frame)
    Int(i64),
    /// Floating point value (scores, thick starts/ends)
    Float(f64),
    /// Textual value (names, sources, attribute values)
    Str(String),
    /// Explicitly absent value (GTF frame `.`, missing optional columns)
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Null => write!(f, "."),
        }
    }
}

/// DNA strand orientation, normalized to a closed set.
///
/// The canonical encoding is `{+1, -1, 0}`; conversion from a textual
/// symbol is total (`+` is forward, `-` is reverse, anything else is
/// unknown), matching the normalization contract of every parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Plus strand (+1)
    Forward,
    /// Minus strand (-1)
    Reverse,
    /// Unknown or unspecified strand (0)
    Unknown,
}

impl Strand {
    /// Normalizes a strand symbol. Total: unknown symbols map to
    /// [`Strand::Unknown`], they are never an error.
    pub fn from_symbol(s: &str) -> Self {
        match s {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }

    /// Decodes the canonical integer encoding.
    pub fn from_int(v: i64) -> Self {
        match v {
            1 => Strand::Forward,
            -1 => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }

    /// Returns the canonical integer encoding (+1, -1 or 0).
    #[inline]
    pub fn as_int(self) -> i64 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
            Strand::Unknown => 0,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// One feature row: a chromosome plus ordered values matching the
/// owning track's field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Chromosome or contig name (non-empty)
    pub chrom: String,
    /// Ordered values, one per schema field
    pub values: Vec<Value>,
}

/// A named, attributed group of features sharing one field schema.
///
/// Attributes preserve header insertion order (repeated keys are legal
/// and order-significant in GTF, so no map type is used). Features are
/// kept strictly in source order, never reordered or deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Track name, when the source format supplies one
    pub name: Option<String>,
    /// Header attributes in insertion order
    pub attributes: Vec<(String, String)>,
    /// Ordered field names describing each feature row
    pub fields: Vec<String>,
    /// Feature rows in source order
    pub features: Vec<Feature>,
}

impl Track {
    /// Looks up the position of a schema field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}
