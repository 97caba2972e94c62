//! Reader for the native relational dump written by
//! [`SqlSerializer`](crate::serialize::SqlSerializer), registered
//! under the `track` format identifier.
//!
//! The dump holds one statement per line. `-- track N: name` comments
//! carry the track name, `attributes_N` rows become track attributes,
//! the `features_N` CREATE fixes the field schema and column types,
//! and each `features_N` INSERT becomes one feature. Values are typed
//! by the declared column: `integer` parses to `Int`, `real` to
//! `Float`, `text` columns fall back on the token shape so a column
//! that mixes missing frames with integers still round-trips.

use crate::error::{Result, TrackError};
use crate::model::Value;
use crate::parse::{LineReader, Parser};
use crate::serialize::Serializer;
use std::path::{Path, PathBuf};

/// Column types declared by a features CREATE statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn from_name(name: &str) -> Option<ColumnType> {
        match name {
            "integer" => Some(ColumnType::Integer),
            "real" => Some(ColumnType::Real),
            "text" => Some(ColumnType::Text),
            _ => None,
        }
    }
}

/// Streaming parser for the relational dump format.
pub struct TrackStoreParser {
    path: PathBuf,
    input: Option<LineReader>,
}

/// Splits the body of a parenthesized tuple on top-level commas,
/// honoring single-quoted literals with `''` escaping. Returns `None`
/// on an unterminated quote.
fn split_tuple(body: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        if quoted {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    current.push_str("''");
                    chars.next();
                } else {
                    current.push('\'');
                    quoted = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '\'' => {
                    current.push('\'');
                    quoted = true;
                }
                ',' => {
                    tokens.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            }
        }
    }
    if quoted {
        return None;
    }
    tokens.push(current.trim().to_string());
    Some(tokens)
}

/// Strips the surrounding single quotes from a literal and undoes the
/// `''` escaping. Returns `None` when the token is not quoted.
fn unquote(token: &str) -> Option<String> {
    let inner = token.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Extracts the parenthesized body following the given keyword,
/// e.g. the tuple after `VALUES`.
fn tuple_body<'a>(line: &'a str, open: &str) -> Option<&'a str> {
    let start = line.find(open)? + open.len();
    let rest = line[start..].trim_start().strip_prefix('(')?;
    let rest = rest.trim_end().strip_suffix(';')?;
    rest.strip_suffix(')')
}

/// Extracts the quoted table name following a statement prefix.
fn table_name(line: &str, prefix: &str) -> Option<String> {
    let rest = line.strip_prefix(prefix)?.trim_start();
    let name = rest.strip_prefix('\'')?;
    let end = name.find('\'')?;
    Some(name[..end].to_string())
}

impl TrackStoreParser {
    /// Binds the parser to a dump file; the file is opened lazily at
    /// [`parse`](Parser::parse).
    pub fn new(path: &Path) -> Self {
        TrackStoreParser {
            path: path.to_path_buf(),
            input: None,
        }
    }

    fn parse_value(
        &self,
        handler: &dyn Serializer,
        line: u64,
        token: &str,
        ty: ColumnType,
    ) -> Result<Value> {
        if token == "NULL" {
            return Ok(Value::Null);
        }
        if let Some(text) = unquote(token) {
            return Ok(Value::Str(text));
        }
        let parsed = match ty {
            ColumnType::Integer => token.parse::<i64>().ok().map(Value::Int),
            ColumnType::Real => token.parse::<f64>().ok().map(Value::Float),
            ColumnType::Text => token
                .parse::<i64>()
                .ok()
                .map(Value::Int)
                .or_else(|| token.parse::<f64>().ok().map(Value::Float)),
        };
        parsed.ok_or_else(|| {
            handler.error(
                &self.path,
                line,
                &format!("has an invalid value '{}'", token),
            )
        })
    }
}

impl Parser for TrackStoreParser {
    fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&mut self, handler: &mut dyn Serializer) -> Result<()> {
        let mut input = match self.input.take() {
            Some(input) => input,
            None => LineReader::open(&self.path)?,
        };

        let mut pending_name: Option<String> = None;
        let mut pending_attrs: Vec<(String, String)> = Vec::new();
        let mut track_open = false;
        let mut types: Vec<ColumnType> = Vec::new();

        while let Some((number, line)) = input.next_line()? {
            if let Some(comment) = line.strip_prefix("--") {
                let comment = comment.trim();
                if let Some(rest) = comment.strip_prefix("track") {
                    if let Some((_, name)) = rest.split_once(':') {
                        pending_name = Some(name.trim().to_string());
                    }
                }
                continue;
            }

            if line.starts_with("CREATE TABLE") {
                let table = table_name(&line, "CREATE TABLE");
                let table = match table {
                    Some(table) => table,
                    None => {
                        return Err(handler.error(
                            &self.path,
                            number,
                            "has a malformed CREATE statement",
                        ))
                    }
                };

                if table.starts_with("attributes_") {
                    // Schema is fixed (key/value), nothing to record
                    continue;
                }
                if !table.starts_with("features_") {
                    return Err(handler.error(
                        &self.path,
                        number,
                        &format!("declares an unexpected table '{}'", table),
                    ));
                }

                let body = line.find('(').and_then(|start| {
                    line[start + 1..]
                        .trim_end()
                        .strip_suffix(';')?
                        .strip_suffix(')')
                });
                let columns = body.and_then(split_tuple).ok_or_else(|| {
                    handler.error(&self.path, number, "has a malformed CREATE statement")
                })?;

                let mut names = Vec::new();
                types.clear();
                for (i, column) in columns.iter().enumerate() {
                    let parsed = column.rsplit_once(' ').and_then(|(name, ty)| {
                        Some((unquote(name.trim())?, ColumnType::from_name(ty.trim())?))
                    });
                    let (name, ty) = match parsed {
                        Some(parsed) => parsed,
                        None => {
                            return Err(handler.error(
                                &self.path,
                                number,
                                &format!("has a malformed column declaration '{}'", column),
                            ))
                        }
                    };
                    if i == 0 {
                        if name != "chrom" || ty != ColumnType::Text {
                            return Err(handler.error(
                                &self.path,
                                number,
                                "doesn't declare 'chrom' as its first column",
                            ));
                        }
                        continue;
                    }
                    names.push(name);
                    types.push(ty);
                }

                handler.new_track(std::mem::take(&mut pending_attrs), pending_name.as_deref())?;
                pending_name = None;
                track_open = true;
                let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
                handler.define_fields(&names)?;
                continue;
            }

            if line.starts_with("INSERT INTO") {
                let table = table_name(&line, "INSERT INTO");
                let body = tuple_body(&line, "VALUES");
                let tokens = body.and_then(split_tuple);
                let (table, tokens) = match (table, tokens) {
                    (Some(table), Some(tokens)) => (table, tokens),
                    _ => {
                        return Err(handler.error(
                            &self.path,
                            number,
                            "has a malformed INSERT statement",
                        ))
                    }
                };

                if table.starts_with("attributes_") {
                    if tokens.len() != 2 {
                        return Err(handler.error(
                            &self.path,
                            number,
                            "has a malformed attribute row",
                        ));
                    }
                    let pair = unquote(&tokens[0]).zip(unquote(&tokens[1]));
                    match pair {
                        Some((key, value)) => pending_attrs.push((key, value)),
                        None => {
                            return Err(handler.error(
                                &self.path,
                                number,
                                "has a malformed attribute row",
                            ))
                        }
                    }
                    continue;
                }
                if !table.starts_with("features_") {
                    return Err(handler.error(
                        &self.path,
                        number,
                        &format!("inserts into an unexpected table '{}'", table),
                    ));
                }
                if !track_open {
                    return Err(handler.error(
                        &self.path,
                        number,
                        "inserts a feature before its table is declared",
                    ));
                }
                if tokens.len() != types.len() + 1 {
                    return Err(handler.error(
                        &self.path,
                        number,
                        &format!(
                            "has {} values where the table declares {} columns",
                            tokens.len(),
                            types.len() + 1
                        ),
                    ));
                }

                let chrom = match unquote(&tokens[0]) {
                    Some(chrom) => chrom,
                    None => {
                        return Err(handler.error(
                            &self.path,
                            number,
                            "has a non-textual chromosome value",
                        ))
                    }
                };
                let mut values = Vec::with_capacity(types.len());
                for (token, ty) in tokens[1..].iter().zip(&types) {
                    values.push(self.parse_value(&*handler, number, token, *ty)?);
                }
                handler.new_feature(&chrom, values)?;
                continue;
            }

            return Err(handler.error(&self.path, number, "has an unrecognized statement"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::drive;
    use crate::serialize::MemorySerializer;
    use std::io::Cursor;

    fn parse_dump(dump: &str) -> Result<MemorySerializer> {
        let mut parser = TrackStoreParser {
            path: PathBuf::from("store.sql"),
            input: Some(LineReader::from_reader(Cursor::new(dump.to_string()))),
        };
        let mut serializer = MemorySerializer::new();
        drive(&mut parser, &mut serializer)?;
        Ok(serializer)
    }

    #[test]
    fn test_split_tuple_respects_quotes() {
        let tokens = split_tuple("'chr1',100,'a, b','it''s'").unwrap();
        assert_eq!(tokens, vec!["'chr1'", "100", "'a, b'", "'it''s'"]);
    }

    #[test]
    fn test_split_tuple_unterminated_quote() {
        assert!(split_tuple("'chr1").is_none());
    }

    #[test]
    fn test_unquote_unescapes() {
        assert_eq!(unquote("'it''s'").unwrap(), "it's");
        assert_eq!(unquote("100"), None);
    }

    #[test]
    fn test_reads_a_full_track() {
        let dump = "\
-- track 1: test.bed
CREATE TABLE 'attributes_1' ('key' text, 'value' text);
INSERT INTO 'attributes_1' VALUES ('name','My track');
CREATE TABLE 'features_1' ('chrom' text, 'start' integer, 'end' integer, 'score' real);
INSERT INTO 'features_1' VALUES ('chr1',100,200,0.5);
INSERT INTO 'features_1' VALUES ('chr2',300,400,NULL);
";
        let serializer = parse_dump(dump).unwrap();
        let tracks = serializer.into_tracks();
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.name.as_deref(), Some("test.bed"));
        assert_eq!(
            track.attributes,
            vec![("name".to_string(), "My track".to_string())]
        );
        assert_eq!(track.fields, vec!["start", "end", "score"]);
        assert_eq!(track.features.len(), 2);
        assert_eq!(track.features[0].chrom, "chr1");
        assert_eq!(
            track.features[0].values,
            vec![Value::Int(100), Value::Int(200), Value::Float(0.5)]
        );
        assert_eq!(track.features[1].values[2], Value::Null);
    }

    #[test]
    fn test_text_column_recovers_integers() {
        // A frame column typed text (first feature had NULL) still
        // yields Int for later numeric rows
        let dump = "\
CREATE TABLE 'features_1' ('chrom' text, 'frame' text);
INSERT INTO 'features_1' VALUES ('chr1',NULL);
INSERT INTO 'features_1' VALUES ('chr1',2);
";
        let serializer = parse_dump(dump).unwrap();
        let tracks = serializer.into_tracks();
        assert_eq!(tracks[0].features[0].values, vec![Value::Null]);
        assert_eq!(tracks[0].features[1].values, vec![Value::Int(2)]);
    }

    #[test]
    fn test_track_without_name_comment() {
        let dump = "\
CREATE TABLE 'features_1' ('chrom' text, 'start' integer);
INSERT INTO 'features_1' VALUES ('chr1',5);
";
        let serializer = parse_dump(dump).unwrap();
        assert_eq!(serializer.into_tracks()[0].name, None);
    }

    #[test]
    fn test_bad_statement_is_fatal() {
        let err = parse_dump("DROP TABLE 'features_1';\n").unwrap_err();
        assert!(matches!(err, TrackError::LineFormat { line: 1, .. }));
    }

    #[test]
    fn test_insert_before_create_is_fatal() {
        let dump = "INSERT INTO 'features_1' VALUES ('chr1',5);\n";
        let err = parse_dump(dump).unwrap_err();
        assert!(matches!(err, TrackError::LineFormat { .. }));
    }

    #[test]
    fn test_wrong_arity_is_fatal() {
        let dump = "\
CREATE TABLE 'features_1' ('chrom' text, 'start' integer);
INSERT INTO 'features_1' VALUES ('chr1',5,6);
";
        let err = parse_dump(dump).unwrap_err();
        assert!(matches!(err, TrackError::LineFormat { line: 2, .. }));
    }

    #[test]
    fn test_mistyped_column_is_fatal() {
        // An unquoted non-number in an integer column (quoted text
        // would parse as Str by shape)
        let dump = "\
CREATE TABLE 'features_1' ('chrom' text, 'start' integer);
INSERT INTO 'features_1' VALUES ('chr1',oops);
";
        let err = parse_dump(dump).unwrap_err();
        assert!(matches!(err, TrackError::LineFormat { line: 2, .. }));
    }
}
