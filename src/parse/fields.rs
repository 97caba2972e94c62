//! Shared field tokenization for track grammars.
//!
//! Both `track ` header lines and GTF attribute columns use shell-style
//! quoting: whitespace-separated tokens where single or double quotes
//! group text (including further whitespace) into one token. These
//! helpers implement that splitting plus the `key=value` header
//! convention built on top of it.
//!
//! # Examples
//!
//! ```
//! use trackio::parse::fields::{shell_split, parse_header_attributes};
//!
//! let tokens = shell_split(r#"gene_id "g1"; transcript_id "t1";"#).unwrap();
//! assert_eq!(tokens, vec!["gene_id", "g1;", "transcript_id", "t1;"]);
//!
//! let attrs = parse_header_attributes(r#"name="My track" color=0,60,120"#).unwrap();
//! assert_eq!(attrs[0], ("name".to_string(), "My track".to_string()));
//! ```

/// Splits a line into shell-style tokens.
///
/// Quotes group text into a single token and are stripped; quoted and
/// unquoted runs can be adjacent (`foo"bar baz"` is one token).
/// Returns `None` on an unterminated quote; callers turn that into
/// the appropriate line error.
pub fn shell_split(input: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    in_token = true;
                } else if c.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(c);
                    in_token = true;
                }
            }
        }
    }
    if quote.is_some() {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}

/// Parses the remainder of a `track ` header line into ordered
/// `key=value` pairs.
///
/// A token that does not split on `=` makes the whole header invalid;
/// `None` is returned and the caller reports the header error.
pub fn parse_header_attributes(rest: &str) -> Option<Vec<(String, String)>> {
    let tokens = shell_split(rest)?;
    let mut attrs = Vec::with_capacity(tokens.len());
    for token in tokens {
        let (key, value) = token.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        attrs.push((key.to_string(), value.to_string()));
    }
    Some(attrs)
}
