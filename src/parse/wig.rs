//! WIG (wiggle) format parser.
//!
//! WIG carries a score per position or per fixed-width window. Two
//! declaration kinds switch the value-line grammar:
//!
//! ```text
//! fixedStep chrom=chr1 start=50 step=10 span=5
//! 0.5               <- one score per line, positions advance by step
//! variableStep chrom=chr2 span=2
//! 300 1.5           <- explicit 1-based position plus score
//! ```
//!
//! Positions are 1-based in the text and converted at load time: a
//! value at position `p` with span `w` becomes the half-open feature
//! `[p - 1, p - 1 + w)`. The schema is always `start, end, score`,
//! declared once per track.
//!
//! Track declaration is deferred like GTF's: a `track ` header stores
//! its attributes, and the next declaration line opens the track.
//! Every malformed declaration or value line is fatal with the exact
//! source location.

use crate::error::Result;
use crate::model::Value;
use crate::parse::fields::parse_header_attributes;
use crate::parse::{source_name, LineReader, Parser};
use crate::serialize::Serializer;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The fixed WIG schema.
pub const WIG_FIELDS: [&str; 3] = ["start", "end", "score"];

enum Step {
    Fixed { chrom: String, next: i64, step: i64, span: i64 },
    Variable { chrom: String, span: i64 },
}

/// Streaming WIG parser bound to one source.
pub struct WigParser {
    path: PathBuf,
    name: String,
    input: Option<LineReader>,
}

impl WigParser {
    /// Binds a parser to a file path (`.gz` inputs are decompressed
    /// transparently).
    pub fn new(path: &Path) -> Self {
        WigParser {
            path: path.to_path_buf(),
            name: source_name(path),
            input: None,
        }
    }

    /// Binds a parser to an in-memory reader; `label` stands in for
    /// the file name in track names and error messages.
    pub fn from_reader<R: Read + 'static>(reader: R, label: &str) -> Self {
        WigParser {
            path: PathBuf::from(label),
            name: label.to_string(),
            input: Some(LineReader::from_reader(reader)),
        }
    }
}

/// Declaration parameters common to both step kinds.
struct Declaration {
    chrom: Option<String>,
    start: Option<i64>,
    step: i64,
    span: i64,
}

fn parse_declaration(rest: &str) -> Option<Declaration> {
    let mut decl = Declaration {
        chrom: None,
        start: None,
        step: 1,
        span: 1,
    };
    for (key, value) in parse_header_attributes(rest)? {
        match key.as_str() {
            "chrom" => decl.chrom = Some(value),
            "start" => decl.start = Some(value.parse().ok().filter(|v| *v >= 1)?),
            "step" => decl.step = value.parse().ok().filter(|v| *v >= 1)?,
            "span" => decl.span = value.parse().ok().filter(|v| *v >= 1)?,
            _ => return None,
        }
    }
    Some(decl)
}

impl Parser for WigParser {
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
        let mut mode: Option<Step> = None;

        while let Some((number, line)) = reader.next_line()? {
            if line.starts_with("browser ") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("track ") {
                pending_attrs = parse_header_attributes(rest).ok_or_else(|| {
                    handler.error(path, number, "seems to have an invalid <track> header line")
                })?;
                declare_track = true;
                mode = None;
                continue;
            }

            if let Some(rest) = line.strip_prefix("fixedStep") {
                let decl = parse_declaration(rest).ok_or_else(|| {
                    handler.error(path, number, "has an invalid fixedStep declaration")
                })?;
                let chrom = decl.chrom.ok_or_else(|| {
                    handler.error(path, number, "has a fixedStep declaration without a chromosome")
                })?;
                let start = decl.start.ok_or_else(|| {
                    handler.error(path, number, "has a fixedStep declaration without a start")
                })?;
                if declare_track {
                    declare_track = false;
                    handler.new_track(std::mem::take(&mut pending_attrs), Some(&self.name))?;
                    handler.define_fields(&WIG_FIELDS)?;
                }
                mode = Some(Step::Fixed {
                    chrom,
                    next: start,
                    step: decl.step,
                    span: decl.span,
                });
                continue;
            }
            if let Some(rest) = line.strip_prefix("variableStep") {
                let decl = parse_declaration(rest).ok_or_else(|| {
                    handler.error(path, number, "has an invalid variableStep declaration")
                })?;
                if decl.start.is_some() {
                    return Err(handler.error(
                        path,
                        number,
                        "has an invalid variableStep declaration",
                    ));
                }
                let chrom = decl.chrom.ok_or_else(|| {
                    handler.error(
                        path,
                        number,
                        "has a variableStep declaration without a chromosome",
                    )
                })?;
                if declare_track {
                    declare_track = false;
                    handler.new_track(std::mem::take(&mut pending_attrs), Some(&self.name))?;
                    handler.define_fields(&WIG_FIELDS)?;
                }
                mode = Some(Step::Variable {
                    chrom,
                    span: decl.span,
                });
                continue;
            }

            // Value line
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match mode {
                None => {
                    return Err(handler.error(
                        path,
                        number,
                        "has data before a fixedStep or variableStep declaration",
                    ));
                }
                Some(Step::Fixed {
                    ref chrom,
                    ref mut next,
                    step,
                    span,
                }) => {
                    if tokens.len() != 1 {
                        return Err(handler.error(path, number, "has an invalid fixedStep data line"));
                    }
                    let score: f64 = tokens[0].parse().map_err(|_| {
                        handler.error(path, number, "has non numbers as score values")
                    })?;
                    let start0 = *next - 1;
                    let chrom = chrom.clone();
                    *next += step;
                    handler.new_feature(
                        &chrom,
                        vec![
                            Value::Int(start0),
                            Value::Int(start0 + span),
                            Value::Float(score),
                        ],
                    )?;
                }
                Some(Step::Variable { ref chrom, span }) => {
                    if tokens.len() != 2 {
                        return Err(handler.error(
                            path,
                            number,
                            "has an invalid variableStep data line",
                        ));
                    }
                    let pos: i64 = tokens[0]
                        .parse()
                        .ok()
                        .filter(|p| *p >= 1)
                        .ok_or_else(|| {
                            handler.error(path, number, "has non positive positions")
                        })?;
                    let score: f64 = tokens[1].parse().map_err(|_| {
                        handler.error(path, number, "has non numbers as score values")
                    })?;
                    let start0 = pos - 1;
                    let chrom = chrom.clone();
                    handler.new_feature(
                        &chrom,
                        vec![
                            Value::Int(start0),
                            Value::Int(start0 + span),
                            Value::Float(score),
                        ],
                    )?;
                }
            }
        }
        Ok(())
    }
}
