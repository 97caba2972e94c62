//! BED serializer.
//!
//! Writes one `track` declaration per track with attributes (tracks
//! pushed without attributes stay headerless) and one tab-delimited
//! line per feature. The strand column is rendered back to its `+`/
//! `-`/`.` symbol; empty interior values become `.` and absent
//! trailing fields shorten the line, so the output re-parses to the
//! same tracks.

use crate::error::{Result, TrackError};
use crate::handler::TrackHandler;
use crate::model::{Strand, Value};
use crate::serialize::{track_header, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes tracks in BED form.
pub struct BedSerializer {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    track_open: bool,
    strand_index: Option<usize>,
}

fn render(value: &Value) -> String {
    match value {
        Value::Str(s) if s.is_empty() => ".".to_string(),
        other => other.to_string(),
    }
}

fn render_strand(value: &Value) -> String {
    match value {
        Value::Int(v) => Strand::from_int(*v).to_string(),
        other => render(other),
    }
}

impl BedSerializer {
    /// Binds a serializer to its output path; the file is created by
    /// [`open`](Serializer::open).
    pub fn new(path: &Path) -> Self {
        BedSerializer {
            path: path.to_path_buf(),
            out: None,
            track_open: false,
            strand_index: None,
        }
    }

    fn out(&mut self) -> Result<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| TrackError::Protocol("serializer is not open".to_string()))
    }
}

impl TrackHandler for BedSerializer {
    fn define_fields(&mut self, names: &[&str]) -> Result<()> {
        if !self.track_open {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        self.strand_index = names.iter().position(|n| *n == "strand");
        Ok(())
    }

    fn new_track(&mut self, attributes: Vec<(String, String)>, _name: Option<&str>) -> Result<()> {
        self.track_open = true;
        self.strand_index = None;
        if !attributes.is_empty() {
            let out = self.out()?;
            writeln!(out, "{}", track_header(&attributes))?;
        }
        Ok(())
    }

    fn new_feature(&mut self, chrom: &str, values: Vec<Value>) -> Result<()> {
        if !self.track_open {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        // A shorter line is the canonical spelling of absent optional
        // trailing fields: rendering the Null padding as `.` would
        // put dots in columns the parser validates as numbers
        let mut width = values.len();
        while width > 2 && matches!(values[width - 1], Value::Null) {
            width -= 1;
        }
        let strand_index = self.strand_index;
        let mut columns = Vec::with_capacity(width + 1);
        columns.push(chrom.to_string());
        for (i, value) in values[..width].iter().enumerate() {
            if strand_index == Some(i) {
                columns.push(render_strand(value));
            } else {
                columns.push(render(value));
            }
        }
        let out = self.out()?;
        writeln!(out, "{}", columns.join("\t"))?;
        Ok(())
    }
}

impl Serializer for BedSerializer {
    fn open(&mut self) -> Result<()> {
        self.out = Some(BufWriter::new(File::create(&self.path)?));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_string_as_dot() {
        assert_eq!(render(&Value::Str(String::new())), ".");
        assert_eq!(render(&Value::Null), ".");
        assert_eq!(render(&Value::Int(100)), "100");
        assert_eq!(render(&Value::Float(2.5)), "2.5");
    }

    #[test]
    fn test_render_strand_symbols() {
        assert_eq!(render_strand(&Value::Int(1)), "+");
        assert_eq!(render_strand(&Value::Int(-1)), "-");
        assert_eq!(render_strand(&Value::Int(0)), ".");
        assert_eq!(render_strand(&Value::Null), ".");
    }

    #[test]
    fn test_feature_requires_open_track() {
        let mut serializer = BedSerializer::new(Path::new("/nonexistent/x.bed"));
        assert!(serializer.new_feature("chr1", vec![]).is_err());
    }

    #[test]
    fn test_trailing_null_padding_shortens_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bed");
        let mut serializer = BedSerializer::new(&path);
        serializer.open().unwrap();
        serializer.new_track(vec![], None).unwrap();
        serializer
            .define_fields(&["start", "end", "name", "score", "strand"])
            .unwrap();
        serializer
            .new_feature(
                "chr1",
                vec![
                    Value::Int(3),
                    Value::Int(4),
                    Value::Null,
                    Value::Null,
                    Value::Null,
                ],
            )
            .unwrap();
        serializer.close().unwrap();

        // Null padding never becomes dots in validated columns
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "chr1\t3\t4\n");
    }
}
