//! BED format parser.
//!
//! BED is a whitespace-separated positional format for genomic
//! intervals, 0-based half-open. That is already the canonical convention, so
//! no coordinate conversion happens here.
//!
//! <http://genome.ucsc.edu/FAQ/FAQformat.html#format1>
//!
//! # Line grammar
//!
//! - `browser ...` lines are ignored.
//! - `track ...` lines open a new track; the remainder is shell-quoted
//!   `key=value` pairs (a token with no `=` makes the header fatal).
//! - Everything else is a feature line: chromosome plus up to eleven
//!   positional fields. `start`/`end` are mandatory integers with
//!   `start < end` strictly; each later field is optional but must be
//!   well-formed for its type when present.
//!
//! The field schema is declared once per track from the first feature
//! line; later lines may be shorter (absent optional trailing fields
//! become [`Value::Null`]) but never longer.
//!
//! # Example
//!
//! ```
//! use trackio::parse::{drive, BedParser};
//! use trackio::serialize::MemorySerializer;
//! use trackio::model::Value;
//!
//! # fn main() -> trackio::Result<()> {
//! let mut parser = BedParser::from_reader(
//!     "chr1\t100\t200\tfoo\t0\t+\n".as_bytes(),
//!     "test.bed",
//! );
//! let mut serializer = MemorySerializer::new();
//! drive(&mut parser, &mut serializer)?;
//!
//! let tracks = serializer.into_tracks();
//! assert_eq!(tracks[0].features[0].chrom, "chr1");
//! assert_eq!(tracks[0].features[0].values[4], Value::Int(1)); // strand +
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::model::{Strand, Value};
use crate::parse::fields::parse_header_attributes;
use crate::parse::{source_name, LineReader, Parser};
use crate::serialize::Serializer;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Every field a BED line can carry, in positional order (chromosome
/// excluded). The declared schema is a prefix of this list.
pub const BED_FIELDS: [&str; 11] = [
    "start",
    "end",
    "name",
    "score",
    "strand",
    "thick_start",
    "thick_end",
    "item_rgb",
    "block_count",
    "block_sizes",
    "block_starts",
];

/// Streaming BED parser bound to one source.
pub struct BedParser {
    path: PathBuf,
    name: String,
    input: Option<LineReader>,
}

impl BedParser {
    /// Binds a parser to a file path (`.gz` inputs are decompressed
    /// transparently).
    pub fn new(path: &Path) -> Self {
        BedParser {
            path: path.to_path_buf(),
            name: source_name(path),
            input: None,
        }
    }

    /// Binds a parser to an in-memory reader; `label` stands in for
    /// the file name in track names and error messages.
    pub fn from_reader<R: Read + 'static>(reader: R, label: &str) -> Self {
        BedParser {
            path: PathBuf::from(label),
            name: label.to_string(),
            input: Some(LineReader::from_reader(reader)),
        }
    }
}

impl Parser for BedParser {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&mut self, handler: &mut dyn Serializer) -> Result<()> {
        let mut reader = match self.input.take() {
            Some(reader) => reader,
            None => LineReader::open(&self.path)?,
        };
        let path = &self.path;

        // 0 means the schema is not declared yet for the open track
        let mut schema_len = 0usize;
        let mut track_open = false;

        while let Some((number, line)) = reader.next_line()? {
            if line.starts_with("browser ") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("track ") {
                let attrs = parse_header_attributes(rest).ok_or_else(|| {
                    handler.error(path, number, "seems to have an invalid <track> header line")
                })?;
                handler.new_track(attrs, Some(&self.name))?;
                track_open = true;
                schema_len = 0;
                continue;
            }

            let items: Vec<&str> = line.split_whitespace().collect();
            if !track_open {
                // Headerless BED: the first feature opens the track
                handler.new_track(Vec::new(), Some(&self.name))?;
                track_open = true;
            }

            let chrom = items[0];
            if items.len() < 3 {
                return Err(handler.error(path, number, "has less than three columns"));
            }
            let start: i64 = items[1].parse().map_err(|_| {
                handler.error(path, number, "has non integers as interval bounds")
            })?;
            let end: i64 = items[2].parse().map_err(|_| {
                handler.error(path, number, "has non integers as interval bounds")
            })?;
            if start >= end {
                return Err(handler.error(path, number, "has negative or null intervals"));
            }

            if schema_len == 0 {
                if items.len() - 1 > BED_FIELDS.len() {
                    return Err(handler.error(path, number, "has too many columns"));
                }
                schema_len = items.len() - 1;
                handler.define_fields(&BED_FIELDS[..schema_len])?;
            } else if items.len() - 1 > schema_len {
                return Err(handler.error(
                    path,
                    number,
                    "has more columns than the first feature line",
                ));
            }

            let mut values = Vec::with_capacity(schema_len);
            values.push(Value::Int(start));
            values.push(Value::Int(end));

            // Optional fields: tolerated when absent, validated when
            // present
            if let Some(&raw) = items.get(3) {
                let name = if raw == "." { "" } else { raw };
                values.push(Value::Str(name.to_string()));
            }
            if let Some(&raw) = items.get(4) {
                let score = if raw == "." || raw.is_empty() {
                    0.0
                } else {
                    raw.parse().map_err(|_| {
                        handler.error(path, number, "has non floats as score values")
                    })?
                };
                values.push(Value::Float(score));
            }
            if let Some(&raw) = items.get(5) {
                values.push(Value::Int(Strand::from_symbol(raw).as_int()));
            }
            if let Some(&raw) = items.get(6) {
                let thick: f64 = raw.parse().map_err(|_| {
                    handler.error(path, number, "has non numbers as thick starts")
                })?;
                values.push(Value::Float(thick));
            }
            if let Some(&raw) = items.get(7) {
                let thick: f64 = raw.parse().map_err(|_| {
                    handler.error(path, number, "has non numbers as thick ends")
                })?;
                values.push(Value::Float(thick));
            }
            // item_rgb, block_count, block_sizes, block_starts are
            // carried verbatim
            if items.len() > 8 {
                for &raw in &items[8..] {
                    values.push(Value::Str(raw.to_string()));
                }
            }
            while values.len() < schema_len {
                values.push(Value::Null);
            }

            handler.new_feature(chrom, values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use crate::parse::drive;
    use crate::serialize::MemorySerializer;

    fn parse_str(data: &str) -> Result<Vec<crate::model::Track>> {
        let mut parser =
            BedParser::from_reader(std::io::Cursor::new(data.to_string()), "test.bed");
        let mut serializer = MemorySerializer::new();
        drive(&mut parser, &mut serializer)?;
        Ok(serializer.into_tracks())
    }

    #[test]
    fn test_bed6_feature() {
        let tracks = parse_str("chr1\t100\t200\tfoo\t0\t+\n").unwrap();
        assert_eq!(tracks.len(), 1);
        let feature = &tracks[0].features[0];
        assert_eq!(feature.chrom, "chr1");
        assert_eq!(
            feature.values,
            vec![
                Value::Int(100),
                Value::Int(200),
                Value::Str("foo".to_string()),
                Value::Float(0.0),
                Value::Int(1),
            ]
        );
        assert_eq!(
            tracks[0].fields,
            vec!["start", "end", "name", "score", "strand"]
        );
    }

    #[test]
    fn test_inverted_interval_aborts_pass() {
        let err = parse_str("chr1\t200\t100\tfoo\n").unwrap_err();
        match err {
            TrackError::LineFormat { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("negative or null"));
            }
            other => panic!("expected LineFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_length_interval_rejected() {
        assert!(parse_str("chr1\t100\t100\n").is_err());
    }

    #[test]
    fn test_no_features_after_error() {
        let data = "chr1\t1\t2\nchr1\t200\t100\nchr1\t5\t6\n";
        let mut parser = BedParser::from_reader(data.as_bytes(), "test.bed");
        let mut serializer = MemorySerializer::new();
        assert!(drive(&mut parser, &mut serializer).is_err());
        // Fail-fast: only the feature before the bad line was emitted
        assert_eq!(serializer.tracks()[0].features.len(), 1);
    }

    #[test]
    fn test_non_integer_bounds() {
        let err = parse_str("chr1\tabc\t200\n").unwrap_err();
        assert!(err.to_string().contains("non integers"));
    }

    #[test]
    fn test_track_header_opens_track() {
        let data = "track name=\"My track\" visibility=2\nchr1\t1\t2\n";
        let tracks = parse_str(data).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(
            tracks[0].attributes,
            vec![
                ("name".to_string(), "My track".to_string()),
                ("visibility".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_invalid_track_header_is_fatal() {
        let err = parse_str("track name=ok orphan\n").unwrap_err();
        assert!(err.to_string().contains("invalid <track> header"));
    }

    #[test]
    fn test_multiple_tracks() {
        let data = "track name=a\nchr1\t1\t2\ntrack name=b\nchr2\t3\t4\n";
        let tracks = parse_str(data).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].features.len(), 1);
        assert_eq!(tracks[1].features[0].chrom, "chr2");
    }

    #[test]
    fn test_browser_lines_ignored() {
        let data = "browser position chr1:1-1000\nchr1\t1\t2\n";
        let tracks = parse_str(data).unwrap();
        assert_eq!(tracks[0].features.len(), 1);
    }

    #[test]
    fn test_dot_name_becomes_empty() {
        let tracks = parse_str("chr1\t1\t2\t.\n").unwrap();
        assert_eq!(tracks[0].features[0].values[2], Value::Str(String::new()));
    }

    #[test]
    fn test_dot_score_becomes_zero() {
        let tracks = parse_str("chr1\t1\t2\tfoo\t.\n").unwrap();
        assert_eq!(tracks[0].features[0].values[3], Value::Float(0.0));
    }

    #[test]
    fn test_malformed_score_is_fatal() {
        assert!(parse_str("chr1\t1\t2\tfoo\thigh\n").is_err());
    }

    #[test]
    fn test_unknown_strand_symbol_is_zero() {
        let tracks = parse_str("chr1\t1\t2\tfoo\t0\t?\n").unwrap();
        assert_eq!(tracks[0].features[0].values[4], Value::Int(0));
    }

    #[test]
    fn test_shorter_lines_padded_with_null() {
        let data = "chr1\t1\t2\tfoo\t5\t+\nchr1\t3\t4\n";
        let tracks = parse_str(data).unwrap();
        let second = &tracks[0].features[1];
        assert_eq!(second.values.len(), 5);
        assert_eq!(second.values[2], Value::Null);
        assert_eq!(second.values[4], Value::Null);
    }

    #[test]
    fn test_longer_line_than_schema_is_fatal() {
        let data = "chr1\t1\t2\nchr1\t3\t4\tfoo\n";
        assert!(parse_str(data).is_err());
    }

    #[test]
    fn test_bed12_trailing_fields_kept_verbatim() {
        let data = "chr1\t1\t100\tg\t0\t+\t10\t90\t0,0,255\t2\t40,40\t0,60\n";
        let tracks = parse_str(data).unwrap();
        let values = &tracks[0].features[0].values;
        assert_eq!(values[7], Value::Str("0,0,255".to_string()));
        assert_eq!(values[8], Value::Str("2".to_string()));
        assert_eq!(values[10], Value::Str("0,60".to_string()));
        assert_eq!(tracks[0].fields.len(), 11);
    }

    #[test]
    fn test_space_separated_features() {
        // Feature columns split on any whitespace, not only tabs
        let tracks = parse_str("chr1 100 200 foo\n").unwrap();
        assert_eq!(tracks[0].features[0].values[2], Value::Str("foo".to_string()));
    }
}
