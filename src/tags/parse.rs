//! Comment tag tokenizer.
//!
//! A comment line introduces a tag when its first non-whitespace token is
//! `+name` or `+name(arg1, arg2)=payload`. The payload is everything after
//! the first `=`, kept raw; individual tags decide whether it is text, a
//! quoted string, or a JSON object.

use serde::de::DeserializeOwned;

/// One tag occurrence found in a comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    /// Tag name without the leading `+`, e.g. `k8s:minimum`.
    pub name: String,
    /// Positional arguments from `name(arg1, arg2)` syntax.
    pub args: Vec<String>,
    /// Raw payload after `=`, when present.
    pub payload: Option<String>,
    /// Byte range of the line within the joined comment block.
    pub span: (usize, usize),
}

/// A line that looked like a machine tag but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTagLine {
    pub line: String,
    pub reason: String,
    pub span: (usize, usize),
}

/// A payload interpreted the way probe-style tags accept it: nothing, a
/// string, or a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum MixedPayload<T> {
    None,
    Text(String),
    Object(T),
}

impl TagMatch {
    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// The payload, required to be present.
    pub fn require_payload(&self) -> Result<&str, String> {
        self.payload_str()
            .ok_or_else(|| format!("tag {:?} requires a payload", self.name))
    }

    /// The payload parsed as a (decimal) integer.
    pub fn payload_as_i64(&self) -> Result<i64, String> {
        let raw = self.require_payload()?;
        raw.trim()
            .parse::<i64>()
            .map_err(|e| format!("failed to parse payload as int: {e}"))
    }

    /// The payload as `<none>`, a quoted or bare string, or a JSON object.
    pub fn mixed_payload<T: DeserializeOwned>(&self) -> Result<MixedPayload<T>, String> {
        let Some(raw) = self.payload_str() else {
            return Ok(MixedPayload::None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(MixedPayload::None);
        }
        if trimmed.starts_with('{') {
            return serde_json::from_str::<T>(trimmed)
                .map(MixedPayload::Object)
                .map_err(|e| format!("error parsing JSON value: {e} ({trimmed:?})"));
        }
        if trimmed.starts_with('"') {
            return serde_json::from_str::<String>(trimmed)
                .map(MixedPayload::Text)
                .map_err(|e| format!("error parsing quoted value: {e} ({trimmed:?})"));
        }
        Ok(MixedPayload::Text(trimmed.to_string()))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.')
}

/// Scans a comment block for tag lines.
///
/// Lines whose first token does not start with `+` are prose and are
/// skipped. A `+`-line that cannot be parsed is reported as malformed only
/// when its name carries the machine prefix `k8s:`; anything else is
/// treated as prose too.
pub fn scan_comments(comments: &[String]) -> Result<Vec<TagMatch>, MalformedTagLine> {
    let mut found = Vec::new();
    let mut offset = 0usize;
    for line in comments {
        let span = (offset, offset + line.len());
        offset += line.len() + 1;

        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix('+') else {
            continue;
        };
        match scan_line(rest, span) {
            Ok(Some(tag)) => found.push(tag),
            Ok(None) => continue,
            Err(reason) => {
                return Err(MalformedTagLine {
                    line: line.clone(),
                    reason,
                    span,
                })
            }
        }
    }
    Ok(found)
}

// Parses the portion after '+'. Ok(None) means "not a machine tag".
fn scan_line(rest: &str, span: (usize, usize)) -> Result<Option<TagMatch>, String> {
    let name_end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return Ok(None);
    }
    let is_machine = name.starts_with("k8s:");
    let mut cursor = &rest[name_end..];

    let mut args = Vec::new();
    if let Some(after_paren) = cursor.strip_prefix('(') {
        let Some(close) = after_paren.find(')') else {
            return if is_machine {
                Err("unterminated argument list".to_string())
            } else {
                Ok(None)
            };
        };
        let arg_text = &after_paren[..close];
        args = arg_text
            .split(',')
            .map(|a| a.trim().trim_matches('"').to_string())
            .filter(|a| !a.is_empty())
            .collect();
        cursor = &after_paren[close + 1..];
    }

    let payload = if let Some(p) = cursor.strip_prefix('=') {
        Some(p.trim_end().to_string())
    } else if cursor.trim().is_empty() {
        None
    } else {
        // Junk between the name and end of line: prose, unless this
        // claimed to be a machine tag.
        return if is_machine {
            Err(format!("unexpected trailing text {:?}", cursor.trim()))
        } else {
            Ok(None)
        };
    };

    Ok(Some(TagMatch {
        name: name.to_string(),
        args,
        payload,
        span,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_one(line: &str) -> TagMatch {
        let found = scan_comments(&[line.to_string()]).expect("scan succeeds");
        assert_eq!(found.len(), 1, "expected one tag in {line:?}");
        found.into_iter().next().unwrap()
    }

    #[test]
    fn bare_tag() {
        let tag = scan_one("+k8s:required");
        assert_eq!(tag.name, "k8s:required");
        assert!(tag.args.is_empty());
        assert_eq!(tag.payload, None);
    }

    #[test]
    fn tag_with_payload() {
        let tag = scan_one("+k8s:minimum=1");
        assert_eq!(tag.name, "k8s:minimum");
        assert_eq!(tag.payload.as_deref(), Some("1"));
        assert_eq!(tag.payload_as_i64().unwrap(), 1);
    }

    #[test]
    fn tag_with_args_and_payload() {
        let tag = scan_one("+k8s:subfield(spec)=+k8s:required");
        assert_eq!(tag.name, "k8s:subfield");
        assert_eq!(tag.args, vec!["spec"]);
        assert_eq!(tag.payload.as_deref(), Some("+k8s:required"));
    }

    #[test]
    fn embedded_tag_payload_survives_verbatim() {
        let tag = scan_one("+k8s:eachVal=+k8s:minimum=1");
        assert_eq!(tag.payload.as_deref(), Some("+k8s:minimum=1"));
    }

    #[test]
    fn prose_lines_are_skipped() {
        let comments = vec![
            "Widget is a widget.".to_string(),
            "+ loosely formatted prose".to_string(),
            "+k8s:required".to_string(),
        ];
        let found = scan_comments(&comments).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "k8s:required");
    }

    #[test]
    fn malformed_machine_tag_is_an_error() {
        let err = scan_comments(&["+k8s:subfield(spec".to_string()]).unwrap_err();
        assert!(err.reason.contains("unterminated"));
    }

    #[test]
    fn mixed_payload_variants() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct P {
            msg: String,
        }
        let none = scan_one("+k8s:validateTrue");
        assert!(matches!(none.mixed_payload::<P>().unwrap(), MixedPayload::None));

        let quoted = scan_one(r#"+k8s:validateTrue="hello""#);
        assert_eq!(
            quoted.mixed_payload::<P>().unwrap(),
            MixedPayload::Text("hello".to_string())
        );

        let obj = scan_one(r#"+k8s:validateTrue={"msg":"hi"}"#);
        assert_eq!(
            obj.mixed_payload::<P>().unwrap(),
            MixedPayload::Object(P { msg: "hi".to_string() })
        );
    }
}
