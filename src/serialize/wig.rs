//! WIG serializer.
//!
//! Emits `variableStep` sections: a new declaration line whenever the
//! chromosome or the interval span changes, then one `position score`
//! line per feature with the position back in 1-based coordinates.
//! Expects the three-field schema the WIG parser declares.

use crate::error::{Result, TrackError};
use crate::handler::TrackHandler;
use crate::model::Value;
use crate::parse::wig::WIG_FIELDS;
use crate::serialize::{track_header, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes tracks in WIG `variableStep` form.
pub struct WigSerializer {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    track_open: bool,
    section: Option<(String, i64)>,
}

impl WigSerializer {
    /// Binds a serializer to its output path; the file is created by
    /// [`open`](Serializer::open).
    pub fn new(path: &Path) -> Self {
        WigSerializer {
            path: path.to_path_buf(),
            out: None,
            track_open: false,
            section: None,
        }
    }

    fn out(&mut self) -> Result<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| TrackError::Protocol("serializer is not open".to_string()))
    }
}

impl TrackHandler for WigSerializer {
    fn define_fields(&mut self, names: &[&str]) -> Result<()> {
        if !self.track_open {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        if names != WIG_FIELDS {
            return Err(TrackError::Protocol(
                "field schema is not expressible as WIG".to_string(),
            ));
        }
        Ok(())
    }

    fn new_track(&mut self, attributes: Vec<(String, String)>, _name: Option<&str>) -> Result<()> {
        self.track_open = true;
        self.section = None;
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
        let (start, end, score) = match values.as_slice() {
            [Value::Int(start), Value::Int(end), score] => (*start, *end, score),
            _ => {
                return Err(TrackError::Protocol(
                    "feature is not expressible as WIG".to_string(),
                ))
            }
        };
        let span = end - start;
        if span < 1 {
            return Err(TrackError::Protocol(
                "feature has a non-positive span".to_string(),
            ));
        }

        let same_section = self
            .section
            .as_ref()
            .map(|(c, s)| c == chrom && *s == span)
            .unwrap_or(false);
        if !same_section {
            let out = self.out()?;
            writeln!(out, "variableStep chrom={} span={}", chrom, span)?;
            self.section = Some((chrom.to_string(), span));
        }

        let score = match score {
            Value::Float(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            _ => {
                return Err(TrackError::Protocol(
                    "feature has a non-numeric score".to_string(),
                ))
            }
        };
        let out = self.out()?;
        writeln!(out, "{} {}", start + 1, score)?;
        Ok(())
    }
}

impl Serializer for WigSerializer {
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
    fn test_rejects_foreign_schema() {
        let mut serializer = WigSerializer::new(Path::new("/nonexistent/x.wig"));
        serializer.track_open = true;
        assert!(serializer.define_fields(&["name", "score"]).is_err());
        assert!(serializer.define_fields(&["start", "end", "score"]).is_ok());
    }

    #[test]
    fn test_feature_requires_open_track() {
        let mut serializer = WigSerializer::new(Path::new("/nonexistent/x.wig"));
        let err = serializer
            .new_feature("chr1", vec![Value::Int(0), Value::Int(1), Value::Float(1.0)])
            .unwrap_err();
        assert!(matches!(err, TrackError::Protocol(_)));
    }
}
