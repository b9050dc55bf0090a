//! Line encodings.
//!
//! All encodings receive the same fully resolved field list; they differ
//! only in the bytes they produce.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::context::Field;

/// How a logger encodes its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `key=value` pairs separated by spaces.
    #[default]
    Logfmt,
    /// One JSON object per line, string values.
    Json,
    /// Discards everything.
    Nop,
}

impl Format {
    /// Encodes one line including the trailing newline, or `None` for
    /// [`Format::Nop`].
    pub fn render(&self, fields: &[Field]) -> Option<String> {
        match self {
            Format::Logfmt => Some(logfmt(fields)),
            Format::Json => Some(json(fields)),
            Format::Nop => None,
        }
    }
}

fn logfmt(fields: &[Field]) -> String {
    let mut out = String::with_capacity(fields.len() * 16);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_key(&mut out, &field.key);
        out.push('=');
        write_value(&mut out, &field.value);
    }
    out.push('\n');
    out
}

fn is_special(c: char) -> bool {
    c.is_whitespace() || c.is_control() || c == '=' || c == '"'
}

fn write_key(out: &mut String, key: &str) {
    if key.is_empty() {
        out.push('_');
        return;
    }
    out.extend(key.chars().map(|c| if is_special(c) { '_' } else { c }));
}

fn write_value(out: &mut String, value: &str) {
    if !value.is_empty() && !value.chars().any(is_special) {
        out.push_str(value);
        return;
    }
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn json(fields: &[Field]) -> String {
    let object: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|f| (f.key.clone(), serde_json::Value::String(f.value.clone())))
        .collect();
    let mut line = serde_json::Value::Object(object).to_string();
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<Field> {
        pairs.iter().map(|(k, v)| Field::new(*k, *v)).collect()
    }

    #[test]
    fn test_logfmt_plain() {
        let line = Format::Logfmt.render(&fields(&[("level", "info"), ("msg", "hi")]));
        assert_eq!(line.as_deref(), Some("level=info msg=hi\n"));
    }

    #[test]
    fn test_logfmt_quotes_whitespace_and_escapes() {
        let line = Format::Logfmt
            .render(&fields(&[("msg", "message error"), ("q", "say \"hi\""), ("e", "")]))
            .unwrap();
        assert_eq!(line, "msg=\"message error\" q=\"say \\\"hi\\\"\" e=\"\"\n");
    }

    #[test]
    fn test_logfmt_keeps_missing_marker_bare() {
        let line = Format::Logfmt.render(&fields(&[("three", "(MISSING)")])).unwrap();
        assert_eq!(line, "three=(MISSING)\n");
    }

    #[test]
    fn test_logfmt_sanitizes_keys() {
        let line = Format::Logfmt.render(&fields(&[("a key", "v"), ("", "w")])).unwrap();
        assert_eq!(line, "a_key=v _=w\n");
    }

    #[test]
    fn test_logfmt_multiline_value_stays_on_one_line() {
        let line = Format::Logfmt.render(&fields(&[("msg", "a\nb")])).unwrap();
        assert_eq!(line, "msg=\"a\\nb\"\n");
    }

    #[test]
    fn test_json_line() {
        let line = Format::Json
            .render(&fields(&[("level", "error"), ("msg", "a b")]))
            .unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["msg"], "a b");
    }

    #[test]
    fn test_nop_renders_nothing() {
        assert!(Format::Nop.render(&fields(&[("msg", "x")])).is_none());
    }
}
