//! GTF format parser.
//!
//! GTF is tab-delimited, nine columns, with an Ensembl-style 1-based
//! closed coordinate convention. Loading converts to the canonical
//! 0-based half-open convention by incrementing `end`; this conversion
//! is a load-bearing contract, not a cosmetic detail: every downstream
//! consumer sees exactly one convention.
//!
//! <http://genome.ucsc.edu/FAQ/FAQformat.html#format4>
//!
//! # Line grammar
//!
//! - `browser ...` ignored; `track ...` headers are parsed like BED's
//!   but the track declaration is deferred until the next feature line
//!   (a header with no following features declares nothing).
//! - Feature lines split on tabs, falling back to whitespace when the
//!   line has no tab; columns beyond the ninth are rejoined with
//!   spaces into the attribute column. Anything that does not come out
//!   as nine columns is fatal.
//! - The attribute column is shell-quoted alternating `key value;`
//!   tokens and must lead with exactly `gene_id` then `transcript_id`
//!   ([`TrackError::AttributeSchema`] otherwise). Keys and values keep
//!   their source order: repeated keys carry positional meaning.
//!
//! # Schema redeclaration
//!
//! Because the attribute key set can vary record to record, this
//! parser re-issues `define_fields` (the seven core names plus the
//! record's attribute keys) for every feature. This differs from BED's
//! declare-once model and is preserved deliberately; handlers that
//! cannot change shape mid-track (the SQL backend) absorb the varying
//! declarations into a union schema instead.
//!
//! [`TrackError::AttributeSchema`]: crate::error::TrackError::AttributeSchema

use crate::error::{Result, TrackError};
use crate::model::{Strand, Value};
use crate::parse::fields::{parse_header_attributes, shell_split};
use crate::parse::{source_name, LineReader, Parser};
use crate::serialize::Serializer;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The seven core fields between the chromosome and the attribute
/// column, in source order.
pub const GTF_FIELDS: [&str; 7] = ["source", "feature", "start", "end", "score", "strand", "frame"];

/// Streaming GTF parser bound to one source.
pub struct GtfParser {
    path: PathBuf,
    name: String,
    input: Option<LineReader>,
}

impl GtfParser {
    /// Binds a parser to a file path (`.gz` inputs are decompressed
    /// transparently).
    pub fn new(path: &Path) -> Self {
        GtfParser {
            path: path.to_path_buf(),
            name: source_name(path),
            input: None,
        }
    }

    /// Binds a parser to an in-memory reader; `label` stands in for
    /// the file name in track names and error messages.
    pub fn from_reader<R: Read + 'static>(reader: R, label: &str) -> Self {
        GtfParser {
            path: PathBuf::from(label),
            name: label.to_string(),
            input: Some(LineReader::from_reader(reader)),
        }
    }
}

impl Parser for GtfParser {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&mut self, handler: &mut dyn Serializer) -> Result<()> {
        let mut reader = match self.input.take() {
            Some(reader) => reader,
            None => LineReader::open(&self.path)?,
        };
        let path = &self.path;

        let mut pending_attrs: Vec<(String, String)> = Vec::new();
        let mut declare_track = true;

        while let Some((number, line)) = reader.next_line()? {
            if line.starts_with("browser ") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("track ") {
                pending_attrs = parse_header_attributes(rest).ok_or_else(|| {
                    handler.error(path, number, "seems to have an invalid <track> header line")
                })?;
                declare_track = true;
                continue;
            }

            let mut cols: Vec<&str> = line.split('\t').collect();
            if cols.len() == 1 {
                cols = line.split_whitespace().collect();
            }
            if cols.len() < 9 {
                return Err(handler.error(path, number, "doesn't have nine columns"));
            }
            // Spaces inside an unquoted attribute column shatter it
            // under the whitespace fallback; rejoin everything past
            // the eighth column
            let attr_col: String = if cols.len() > 9 {
                cols[8..].join(" ")
            } else {
                cols[8].to_string()
            };
            let chrom = cols[0];

            if declare_track {
                declare_track = false;
                handler.new_track(std::mem::take(&mut pending_attrs), Some(&self.name))?;
            }

            let source = if cols[1] == "." { "" } else { cols[1] };
            let feature = if cols[2] == "." { "" } else { cols[2] };
            let start: i64 = cols[3].parse().map_err(|_| {
                handler.error(path, number, "has non integers as interval bounds")
            })?;
            // Convert Ensembl numbering to the half-open convention
            let end: i64 = cols[4]
                .parse::<i64>()
                .map_err(|_| handler.error(path, number, "has non integers as interval bounds"))?
                + 1;
            let score = cols[5];
            let strand = Strand::from_symbol(cols[6]);
            let frame = if cols[7] == "." {
                Value::Null
            } else {
                Value::Int(cols[7].parse().map_err(|_| {
                    handler.error(path, number, "has non integers as frame value")
                })?)
            };

            let tokens = shell_split(&attr_col).ok_or_else(|| {
                handler.error(path, number, "has an invalid attribute column")
            })?;
            if tokens.is_empty() || tokens.len() % 2 != 0 {
                return Err(handler.error(path, number, "has an invalid attribute column"));
            }
            let mut keys = Vec::with_capacity(tokens.len() / 2);
            let mut attr_values = Vec::with_capacity(tokens.len() / 2);
            for pair in tokens.chunks(2) {
                keys.push(pair[0].clone());
                attr_values.push(pair[1].trim_matches(';').to_string());
            }
            if keys.len() < 2 || keys[0] != "gene_id" || keys[1] != "transcript_id" {
                return Err(TrackError::AttributeSchema {
                    path: path.to_path_buf(),
                    line: number,
                    keys,
                });
            }

            let mut names: Vec<&str> = GTF_FIELDS.to_vec();
            names.extend(keys.iter().map(String::as_str));
            handler.define_fields(&names)?;

            let mut values = Vec::with_capacity(names.len());
            values.push(Value::Str(source.to_string()));
            values.push(Value::Str(feature.to_string()));
            values.push(Value::Int(start));
            values.push(Value::Int(end));
            values.push(Value::Str(score.to_string()));
            values.push(Value::Int(strand.as_int()));
            values.push(frame);
            values.extend(attr_values.into_iter().map(Value::Str));

            handler.new_feature(chrom, values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::drive;
    use crate::serialize::MemorySerializer;

    fn parse_str(data: &str) -> Result<Vec<crate::model::Track>> {
        let mut parser =
            GtfParser::from_reader(std::io::Cursor::new(data.to_string()), "test.gtf");
        let mut serializer = MemorySerializer::new();
        drive(&mut parser, &mut serializer)?;
        Ok(serializer.into_tracks())
    }

    const EXON: &str =
        "chr1\tHAVANA\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n";

    #[test]
    fn test_end_converted_to_half_open() {
        let data = "chr1\t.\texon\t50\t99\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n";
        let tracks = parse_str(data).unwrap();
        let values = &tracks[0].features[0].values;
        assert_eq!(values[2], Value::Int(50));
        assert_eq!(values[3], Value::Int(100)); // 99 + 1
    }

    #[test]
    fn test_attribute_order_preserved() {
        let data = "chr1\t.\texon\t1\t2\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\"; exon_number \"2\"; tag \"basic\";\n";
        let tracks = parse_str(data).unwrap();
        assert_eq!(
            tracks[0].fields,
            vec![
                "source",
                "feature",
                "start",
                "end",
                "score",
                "strand",
                "frame",
                "gene_id",
                "transcript_id",
                "exon_number",
                "tag"
            ]
        );
        let values = &tracks[0].features[0].values;
        assert_eq!(values[7], Value::Str("g1".to_string()));
        assert_eq!(values[8], Value::Str("t1".to_string()));
        assert_eq!(values[9], Value::Str("2".to_string()));
        assert_eq!(values[10], Value::Str("basic".to_string()));
    }

    #[test]
    fn test_wrong_leading_keys_is_schema_error() {
        let data = "chr1\t.\texon\t1\t2\t.\t+\t.\ttranscript_id \"t1\"; gene_id \"g1\";\n";
        let err = parse_str(data).unwrap_err();
        match err {
            TrackError::AttributeSchema { line, keys, .. } => {
                assert_eq!(line, 1);
                assert_eq!(keys[0], "transcript_id");
            }
            other => panic!("expected AttributeSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_transcript_id_is_schema_error() {
        let data = "chr1\t.\texon\t1\t2\t.\t+\t.\tgene_id \"g1\";\n";
        assert!(matches!(
            parse_str(data).unwrap_err(),
            TrackError::AttributeSchema { .. }
        ));
    }

    #[test]
    fn test_dot_source_and_feature_become_empty() {
        let data = "chr1\t.\t.\t1\t2\t.\t-\t.\tgene_id \"g1\"; transcript_id \"t1\";\n";
        let tracks = parse_str(data).unwrap();
        let values = &tracks[0].features[0].values;
        assert_eq!(values[0], Value::Str(String::new()));
        assert_eq!(values[1], Value::Str(String::new()));
        assert_eq!(values[5], Value::Int(-1));
    }

    #[test]
    fn test_frame_dot_is_null_integer_otherwise() {
        let data = "chr1\t.\tCDS\t1\t2\t.\t+\t2\tgene_id \"g1\"; transcript_id \"t1\";\n";
        let tracks = parse_str(data).unwrap();
        assert_eq!(tracks[0].features[0].values[6], Value::Int(2));

        let tracks = parse_str(EXON).unwrap();
        assert_eq!(tracks[0].features[0].values[6], Value::Null);
    }

    #[test]
    fn test_non_integer_frame_is_fatal() {
        let data = "chr1\t.\tCDS\t1\t2\t.\t+\tx\tgene_id \"g1\"; transcript_id \"t1\";\n";
        let err = parse_str(data).unwrap_err();
        assert!(err.to_string().contains("frame"));
    }

    #[test]
    fn test_non_integer_bounds_fatal_with_line() {
        let data = "chr1\t.\texon\tone\t2\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n";
        match parse_str(data).unwrap_err() {
            TrackError::LineFormat { line, .. } => assert_eq!(line, 1),
            other => panic!("expected LineFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_eight_columns_fatal() {
        let data = "chr1\t.\texon\t1\t2\t.\t+\t.\n";
        let err = parse_str(data).unwrap_err();
        assert!(err.to_string().contains("nine columns"));
    }

    #[test]
    fn test_whitespace_fallback() {
        // No tab anywhere: split on whitespace and rejoin the
        // shattered attribute column
        let data = "chr1 . exon 1 2 . + . gene_id \"g1\"; transcript_id \"t1\";\n";
        let tracks = parse_str(data).unwrap();
        let values = &tracks[0].features[0].values;
        assert_eq!(values[7], Value::Str("g1".to_string()));
        assert_eq!(values[8], Value::Str("t1".to_string()));
    }

    #[test]
    fn test_track_declaration_deferred_until_feature() {
        let data = "track name=genes\n";
        let tracks = parse_str(data).unwrap();
        // Header with no features declares nothing
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_header_attributes_attach_to_next_track() {
        let data = format!("track name=genes\n{}", EXON);
        let tracks = parse_str(&data).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(
            tracks[0].attributes,
            vec![("name".to_string(), "genes".to_string())]
        );
    }

    #[test]
    fn test_score_kept_as_raw_string() {
        let data = "chr1\t.\texon\t1\t2\t95.5\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n";
        let tracks = parse_str(data).unwrap();
        assert_eq!(
            tracks[0].features[0].values[4],
            Value::Str("95.5".to_string())
        );
    }

    #[test]
    fn test_repeated_attribute_keys_not_deduplicated() {
        let data = "chr1\t.\texon\t1\t2\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\"; tag \"a\"; tag \"b\";\n";
        let tracks = parse_str(data).unwrap();
        let fields = &tracks[0].fields;
        assert_eq!(fields[9], "tag");
        assert_eq!(fields[10], "tag");
        let values = &tracks[0].features[0].values;
        assert_eq!(values[9], Value::Str("a".to_string()));
        assert_eq!(values[10], Value::Str("b".to_string()));
    }

    #[test]
    fn test_odd_attribute_tokens_fatal() {
        let data = "chr1\t.\texon\t1\t2\t.\t+\t.\tgene_id \"g1\"; transcript_id\n";
        let err = parse_str(data).unwrap_err();
        assert!(err.to_string().contains("attribute column"));
    }
}
