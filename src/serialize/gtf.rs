//! GTF serializer.
//!
//! Expects the field schema the GTF parser declares: the seven fixed
//! columns followed by the attribute keys, `gene_id` and
//! `transcript_id` first. Coordinates are written back in the 1-based
//! closed convention (`end - 1`), the strand as its symbol, missing
//! score and frame as `.`, and the attribute column as
//! `key "value"; ...` in schema order.

use crate::error::{Result, TrackError};
use crate::handler::TrackHandler;
use crate::model::{Strand, Value};
use crate::parse::gtf::GTF_FIELDS;
use crate::serialize::Serializer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes tracks in GTF form.
pub struct GtfSerializer {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    track_open: bool,
    attribute_keys: Vec<String>,
}

fn fixed_column(value: &Value) -> String {
    match value {
        Value::Str(s) if s.is_empty() => ".".to_string(),
        Value::Null => ".".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Str(s) => s.clone(),
    }
}

impl GtfSerializer {
    /// Binds a serializer to its output path; the file is created by
    /// [`open`](Serializer::open).
    pub fn new(path: &Path) -> Self {
        GtfSerializer {
            path: path.to_path_buf(),
            out: None,
            track_open: false,
            attribute_keys: Vec::new(),
        }
    }

    fn out(&mut self) -> Result<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| TrackError::Protocol("serializer is not open".to_string()))
    }
}

impl TrackHandler for GtfSerializer {
    fn define_fields(&mut self, names: &[&str]) -> Result<()> {
        if !self.track_open {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        if names.len() < GTF_FIELDS.len() || names[..GTF_FIELDS.len()] != GTF_FIELDS {
            return Err(TrackError::Protocol(
                "field schema is not expressible as GTF".to_string(),
            ));
        }
        self.attribute_keys = names[GTF_FIELDS.len()..]
            .iter()
            .map(|n| n.to_string())
            .collect();
        Ok(())
    }

    fn new_track(&mut self, _attributes: Vec<(String, String)>, _name: Option<&str>) -> Result<()> {
        // GTF carries no track declaration; attributes are dropped
        self.track_open = true;
        self.attribute_keys.clear();
        Ok(())
    }

    fn new_feature(&mut self, chrom: &str, values: Vec<Value>) -> Result<()> {
        if !self.track_open {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        if values.len() != GTF_FIELDS.len() + self.attribute_keys.len() {
            return Err(TrackError::Protocol(format!(
                "feature has {} values where the schema declares {}",
                values.len(),
                GTF_FIELDS.len() + self.attribute_keys.len()
            )));
        }

        let mut columns = Vec::with_capacity(9);
        columns.push(chrom.to_string());
        columns.push(fixed_column(&values[0]));
        columns.push(fixed_column(&values[1]));
        columns.push(fixed_column(&values[2]));
        // Back to the closed-interval end
        match &values[3] {
            Value::Int(end) => columns.push((end - 1).to_string()),
            other => columns.push(fixed_column(other)),
        }
        columns.push(fixed_column(&values[4]));
        match &values[5] {
            Value::Int(v) => columns.push(Strand::from_int(*v).to_string()),
            other => columns.push(fixed_column(other)),
        }
        columns.push(fixed_column(&values[6]));

        let mut attrs = String::new();
        for (key, value) in self.attribute_keys.iter().zip(&values[GTF_FIELDS.len()..]) {
            if !attrs.is_empty() {
                attrs.push(' ');
            }
            attrs.push_str(&format!("{} \"{}\";", key, fixed_column(value)));
        }
        columns.push(attrs);

        let out = self.out()?;
        writeln!(out, "{}", columns.join("\t"))?;
        Ok(())
    }
}

impl Serializer for GtfSerializer {
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
