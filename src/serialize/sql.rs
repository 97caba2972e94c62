//! Relational dump serializer: the native persisted form.
//!
//! Each track `i` becomes two tables, written as one SQL statement per
//! line:
//!
//! ```sql
//! -- track 1: test.bed
//! CREATE TABLE 'attributes_1' ('key' text, 'value' text);
//! INSERT INTO 'attributes_1' VALUES ('name','My track');
//! CREATE TABLE 'features_1' ('chrom' text, 'start' integer, 'end' integer, 'score' real);
//! INSERT INTO 'features_1' VALUES ('chr1',100,200,0.5);
//! ```
//!
//! A relational table cannot change shape mid-track, but the GTF
//! parser redeclares its schema per feature and the attribute key set
//! varies record to record (gene rows carry no `exon_number`). The
//! backend therefore buffers the rows of the open track and
//! accumulates the union of all declared field names, in first-seen
//! order; columns a row never declared are `NULL`. The CREATE is
//! written when the track ends, with column types taken from the first
//! non-`NULL` value of each column (`Int` → integer, `Float` → real,
//! otherwise text). The dump is re-read by
//! [`TrackStoreParser`](crate::parse::TrackStoreParser) under the
//! `track` format identifier.

use crate::error::{Result, TrackError};
use crate::handler::TrackHandler;
use crate::model::Value;
use crate::serialize::Serializer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the relational dump for one parse pass.
pub struct SqlSerializer {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    track_index: usize,
    /// Union of every field name declared for the open track
    fields: Vec<String>,
    /// Maps the latest declaration's positions into `fields`
    current: Vec<usize>,
    /// Buffered feature rows of the open track, aligned to `fields`
    rows: Vec<(String, Vec<Value>)>,
    records_written: usize,
}

/// SQL-style single-quoted literal with `''` escaping.
pub(crate) fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Str(s) => quote(s),
        Value::Null => "NULL".to_string(),
    }
}

fn column_type(value: &Value) -> &'static str {
    match value {
        Value::Int(_) => "integer",
        Value::Float(_) => "real",
        Value::Str(_) | Value::Null => "text",
    }
}

impl SqlSerializer {
    /// Binds a serializer to its output path; the file is created by
    /// [`open`](Serializer::open).
    pub fn new(path: &Path) -> Self {
        SqlSerializer {
            path: path.to_path_buf(),
            out: None,
            track_index: 0,
            fields: Vec::new(),
            current: Vec::new(),
            rows: Vec::new(),
            records_written: 0,
        }
    }

    /// Number of feature rows written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    fn out(&mut self) -> Result<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| TrackError::Protocol("serializer is not open".to_string()))
    }

    /// Writes the features table of the open track: the CREATE with
    /// inferred column types, then the buffered rows padded to the
    /// final schema width.
    fn flush_track(&mut self) -> Result<()> {
        if self.track_index == 0 {
            return Ok(());
        }
        let index = self.track_index;
        let fields = std::mem::take(&mut self.fields);
        let rows = std::mem::take(&mut self.rows);
        self.current.clear();

        let mut types: Vec<Option<&'static str>> = vec![None; fields.len()];
        for (_, row) in &rows {
            for (i, value) in row.iter().enumerate() {
                if types[i].is_none() && !matches!(value, Value::Null) {
                    types[i] = Some(column_type(value));
                }
            }
        }

        let mut columns = vec!["'chrom' text".to_string()];
        for (name, ty) in fields.iter().zip(&types) {
            columns.push(format!("{} {}", quote(name), ty.unwrap_or("text")));
        }

        let mut statements = format!(
            "CREATE TABLE 'features_{}' ({});\n",
            index,
            columns.join(", ")
        );
        for (chrom, row) in &rows {
            let mut literals = Vec::with_capacity(fields.len() + 1);
            literals.push(quote(chrom));
            for i in 0..fields.len() {
                // Rows pushed before later fields joined the union are
                // shorter than the final width
                literals.push(literal(row.get(i).unwrap_or(&Value::Null)));
            }
            statements.push_str(&format!(
                "INSERT INTO 'features_{}' VALUES ({});\n",
                index,
                literals.join(",")
            ));
        }

        let out = self.out()?;
        out.write_all(statements.as_bytes())?;
        Ok(())
    }
}

impl TrackHandler for SqlSerializer {
    fn define_fields(&mut self, names: &[&str]) -> Result<()> {
        if self.track_index == 0 {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        // Map each declared position into the union, extending it with
        // unseen names. Repeated names are positional (GTF allows
        // duplicate attribute keys), so the k-th occurrence in the
        // declaration binds to the k-th occurrence in the union.
        let mut mapping = Vec::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            let occurrence = names[..position].iter().filter(|n| *n == name).count();
            let found = self
                .fields
                .iter()
                .enumerate()
                .filter(|(_, f)| f == name)
                .map(|(i, _)| i)
                .nth(occurrence);
            let index = match found {
                Some(i) => i,
                None => {
                    self.fields.push(name.to_string());
                    self.fields.len() - 1
                }
            };
            mapping.push(index);
        }
        self.current = mapping;
        Ok(())
    }

    fn new_track(&mut self, attributes: Vec<(String, String)>, name: Option<&str>) -> Result<()> {
        self.flush_track()?;
        self.track_index += 1;

        let index = self.track_index;
        let out = self.out()?;
        match name {
            Some(name) => writeln!(out, "-- track {}: {}", index, name)?,
            None => writeln!(out, "-- track {}", index)?,
        }
        writeln!(
            out,
            "CREATE TABLE 'attributes_{}' ('key' text, 'value' text);",
            index
        )?;
        for (key, value) in &attributes {
            writeln!(
                out,
                "INSERT INTO 'attributes_{}' VALUES ({},{});",
                index,
                quote(key),
                quote(value)
            )?;
        }
        Ok(())
    }

    fn new_feature(&mut self, chrom: &str, values: Vec<Value>) -> Result<()> {
        if self.track_index == 0 {
            return Err(TrackError::Protocol("no track is open".to_string()));
        }
        if values.len() != self.current.len() {
            return Err(TrackError::Protocol(format!(
                "feature has {} values where the declaration names {} fields",
                values.len(),
                self.current.len()
            )));
        }
        let mut row = vec![Value::Null; self.fields.len()];
        for (&index, value) in self.current.iter().zip(values) {
            row[index] = value;
        }
        self.rows.push((chrom.to_string(), row));
        self.records_written += 1;
        Ok(())
    }
}

impl Serializer for SqlSerializer {
    fn open(&mut self) -> Result<()> {
        self.out = Some(BufWriter::new(File::create(&self.path)?));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.out.is_some() {
            self.flush_track()?;
            if let Some(mut out) = self.out.take() {
                out.flush()?;
            }
        }
        Ok(())
    }
}
