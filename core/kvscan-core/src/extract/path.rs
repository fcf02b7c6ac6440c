//! Attribute path parsing and navigation.
//!
//! Grammar:
//!
//! ```text
//! __key            whole key
//! __key.a[0].b     nested path into the key
//! this             whole value
//! this.a           nested path into the value
//! a.b[2].c         nested path into the value
//! ```

use crate::error::{ScanError, ScanResult};
use crate::value::Value;
use smallvec::SmallVec;

const KEY_ROOT: &str = "__key";
const VALUE_ROOT: &str = "this";

/// Which half of the record a path starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Key,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// A resolved field path, ready to be applied to any record of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    path: String,
    target: Target,
    segments: SmallVec<[Segment; 4]>,
    ignore_case: bool,
}

impl Accessor {
    /// Parse an already-normalized path.
    pub fn parse(path: &str) -> ScanResult<Self> {
        let (target, rest) = split_root(path);
        let segments = match rest {
            Some(rest) => parse_segments(path, rest)?,
            None => SmallVec::new(),
        };
        Ok(Self {
            path: path.to_string(),
            target,
            segments,
            ignore_case: false,
        })
    }

    /// Match attribute names without regard to case.
    pub fn ignoring_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk the path. Anything that does not resolve yields `Value::Null`.
    pub fn extract(&self, key: &Value, value: &Value) -> Value {
        let mut current = match self.target {
            Target::Key => key,
            Target::Value => value,
        };
        for segment in &self.segments {
            let next = match segment {
                Segment::Field(name) if self.ignore_case => current.field_ignore_case(name),
                Segment::Field(name) => current.field(name),
                Segment::Index(i) => current.element(*i),
            };
            match next {
                Some(v) => current = v,
                None => return Value::Null,
            }
        }
        current.clone()
    }
}

/// Split off the root marker. `None` for the remainder means the whole root.
fn split_root(path: &str) -> (Target, Option<&str>) {
    for (root, target) in [(KEY_ROOT, Target::Key), (VALUE_ROOT, Target::Value)] {
        if let Some(rest) = path.strip_prefix(root) {
            if rest.is_empty() {
                return (target, None);
            }
            if let Some(nested) = rest.strip_prefix('.') {
                return (target, Some(nested));
            }
            if rest.starts_with('[') {
                return (target, Some(rest));
            }
        }
    }
    (Target::Value, Some(path))
}

#[derive(Clone, Copy)]
enum Expect {
    Start,
    Ident,
    InIdent,
    Separator,
}

fn parse_segments(path: &str, rest: &str) -> ScanResult<SmallVec<[Segment; 4]>> {
    let mut segments = SmallVec::new();
    let mut ident = String::new();
    let mut state = Expect::Start;
    let mut chars = rest.chars();

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (Expect::Start | Expect::Ident, '.') => {
                return Err(ScanError::extraction(path, "empty segment"));
            }
            (Expect::Ident, '[') => {
                return Err(ScanError::extraction(path, "empty segment"));
            }
            (_, ']') => {
                return Err(ScanError::extraction(path, "unbalanced ']'"));
            }
            (Expect::InIdent, '.') => {
                segments.push(Segment::Field(std::mem::take(&mut ident)));
                Expect::Ident
            }
            (Expect::Separator, '.') => Expect::Ident,
            (Expect::InIdent, '[') | (Expect::Start | Expect::Separator, '[') => {
                if !ident.is_empty() {
                    segments.push(Segment::Field(std::mem::take(&mut ident)));
                }
                segments.push(Segment::Index(parse_index(path, &mut chars)?));
                Expect::Separator
            }
            (Expect::Separator, _) => {
                return Err(ScanError::extraction(
                    path,
                    format!("unexpected '{c}' after index"),
                ));
            }
            (_, c) => {
                ident.push(c);
                Expect::InIdent
            }
        };
    }

    match state {
        Expect::Start | Expect::Ident => Err(ScanError::extraction(path, "empty segment")),
        Expect::InIdent => {
            segments.push(Segment::Field(ident));
            Ok(segments)
        }
        Expect::Separator => Ok(segments),
    }
}

fn parse_index(path: &str, chars: &mut std::str::Chars<'_>) -> ScanResult<usize> {
    let mut digits = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            return digits
                .trim()
                .parse::<usize>()
                .map_err(|_| ScanError::extraction(path, format!("invalid index '{digits}'")));
        }
        digits.push(c);
    }
    Err(ScanError::extraction(path, "unbalanced '['"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn roots() {
        let key = Accessor::parse("__key").unwrap();
        assert_eq!(key.target(), Target::Key);
        assert!(key.segments().is_empty());

        let this = Accessor::parse("this").unwrap();
        assert_eq!(this.target(), Target::Value);
        assert!(this.segments().is_empty());
    }

    #[test]
    fn nested_paths() {
        let a = Accessor::parse("__key.id").unwrap();
        assert_eq!(a.target(), Target::Key);
        assert_eq!(a.segments(), &[field("id")]);

        let a = Accessor::parse("address.lines[1].text").unwrap();
        assert_eq!(a.target(), Target::Value);
        assert_eq!(
            a.segments(),
            &[field("address"), field("lines"), Segment::Index(1), field("text")]
        );

        let a = Accessor::parse("this[0][2]").unwrap();
        assert_eq!(a.segments(), &[Segment::Index(0), Segment::Index(2)]);
    }

    #[test]
    fn root_lookalikes_are_value_fields() {
        let a = Accessor::parse("__keys").unwrap();
        assert_eq!(a.target(), Target::Value);
        assert_eq!(a.segments(), &[field("__keys")]);

        let a = Accessor::parse("thistle").unwrap();
        assert_eq!(a.segments(), &[field("thistle")]);
    }

    #[test]
    fn malformed_paths() {
        for bad in ["a..b", "a.", ".a", "a[1", "a]", "a[x]", "a[0]b", "", "__key.", "a.[0]"] {
            let err = Accessor::parse(bad).unwrap_err();
            assert!(
                matches!(err, ScanError::Extraction { .. }),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn extract_walks_and_defaults_to_null() {
        let key = Value::object([("id", Value::from(7))]);
        let value = Value::object([(
            "address",
            Value::object([("lines", Value::List(vec!["x".into(), "y".into()]))]),
        )]);

        let id = Accessor::parse("__key.id").unwrap();
        assert_eq!(id.extract(&key, &value), Value::from(7));

        let line = Accessor::parse("address.lines[1]").unwrap();
        assert_eq!(line.extract(&key, &value), Value::from("y"));

        let missing = Accessor::parse("address.lines[5]").unwrap();
        assert_eq!(missing.extract(&key, &value), Value::Null);

        let through_scalar = Accessor::parse("__key.id.deeper").unwrap();
        assert_eq!(through_scalar.extract(&key, &value), Value::Null);
    }

    #[test]
    fn case_folded_accessor_reaches_mixed_case_attributes() {
        let value = Value::object([("homeAddress", Value::object([("zipCode", Value::from("75001"))]))]);
        let exact = Accessor::parse("homeaddress.zipcode").unwrap();
        assert_eq!(exact.extract(&Value::Null, &value), Value::Null);

        let folded = exact.ignoring_case(true);
        assert_eq!(folded.extract(&Value::Null, &value), Value::from("75001"));
    }
}
