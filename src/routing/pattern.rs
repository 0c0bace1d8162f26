//! Path pattern compilation and matching
//!
//! A pattern is compiled once from a template such as
//! `/bookmarks/{id:int}/edit` into a list of segment matchers. Matching is
//! anchored: the request path must have exactly as many segments as the
//! pattern and every segment must match.

use crate::error::RouteError;
use serde::Serialize;

/// Type a capture is coerced to before the handler sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParamKind {
    Int,
    Str,
}

impl ParamKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Str => "string",
        }
    }
}

/// One compiled path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Capture { name: String, kind: ParamKind },
}

/// Raw, not yet coerced capture from a structural match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCapture<'a> {
    pub name: &'a str,
    pub kind: ParamKind,
    pub value: &'a str,
}

/// Compiled path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a template.
    ///
    /// Captures are written `{name}` or `{name:str}` for strings and
    /// `{name:int}` for unsigned integers. `/` alone is the root.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for raw in rest.split('/') {
                if raw.is_empty() {
                    return Err(invalid("empty segment"));
                }
                let segment = parse_segment(raw).map_err(invalid)?;
                if let Segment::Capture { name, .. } = &segment {
                    let duplicate = segments.iter().any(|s| {
                        matches!(s, Segment::Capture { name: existing, .. } if existing == name)
                    });
                    if duplicate {
                        return Err(invalid(&format!("duplicate capture '{name}'")));
                    }
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Kinds of the captures, left to right
    pub fn signature(&self) -> Vec<ParamKind> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Capture { kind, .. } => Some(*kind),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Structural full-path match. Capture values are returned unconverted.
    pub fn matches<'a>(&'a self, path: &'a str) -> Option<Vec<RawCapture<'a>>> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(text) => {
                    if text != part {
                        return None;
                    }
                }
                Segment::Capture { name, kind } => {
                    if part.is_empty() {
                        return None;
                    }
                    captures.push(RawCapture {
                        name,
                        kind: *kind,
                        value: part,
                    });
                }
            }
        }
        Some(captures)
    }
}

fn parse_segment(raw: &str) -> Result<Segment, &'static str> {
    let Some(inner) = raw.strip_prefix('{') else {
        if raw.contains(['{', '}']) {
            return Err("braces are only allowed around a whole segment");
        }
        return Ok(Segment::Literal(raw.to_string()));
    };
    let inner = inner
        .strip_suffix('}')
        .ok_or("unterminated capture")?;

    let (name, kind) = match inner.split_once(':') {
        Some((name, "int")) => (name, ParamKind::Int),
        Some((name, "str")) => (name, ParamKind::Str),
        Some(_) => return Err("unknown capture type, expected 'int' or 'str'"),
        None => (inner, ParamKind::Str),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("capture names must be non-empty [A-Za-z0-9_]");
    }

    Ok(Segment::Capture {
        name: name.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let p = Pattern::parse("/").unwrap();
        assert!(p.segments().is_empty());
        assert!(p.matches("/").is_some());
        assert!(p.matches("/bookmarks").is_none());
    }

    #[test]
    fn test_parse_segments() {
        let p = Pattern::parse("/bookmarks/{id:int}/edit").unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Literal("bookmarks".into()),
                Segment::Capture {
                    name: "id".into(),
                    kind: ParamKind::Int
                },
                Segment::Literal("edit".into()),
            ]
        );
        assert_eq!(p.signature(), vec![ParamKind::Int]);
    }

    #[test]
    fn test_default_capture_is_string() {
        let p = Pattern::parse("/uploads/{name}").unwrap();
        assert_eq!(p.signature(), vec![ParamKind::Str]);
    }

    #[test]
    fn test_parse_rejects_bad_templates() {
        assert!(Pattern::parse("bookmarks").is_err());
        assert!(Pattern::parse("/bookmarks/").is_err());
        assert!(Pattern::parse("//x").is_err());
        assert!(Pattern::parse("/items/{id:float}").is_err());
        assert!(Pattern::parse("/items/{id").is_err());
        assert!(Pattern::parse("/items/x{id}").is_err());
        assert!(Pattern::parse("/items/{}").is_err());
        assert!(Pattern::parse("/{a}/{a}").is_err());
    }

    #[test]
    fn test_match_is_anchored() {
        let p = Pattern::parse("/bookmarks").unwrap();
        assert!(p.matches("/bookmarks").is_some());
        assert!(p.matches("/bookmarks/").is_none());
        assert!(p.matches("/bookmarks/1").is_none());
        assert!(p.matches("/api/bookmarks").is_none());
        assert!(p.matches("bookmarks").is_none());
    }

    #[test]
    fn test_match_captures_in_order() {
        let p = Pattern::parse("/users/{user:int}/posts/{post:int}").unwrap();
        let captures = p.matches("/users/7/posts/42").unwrap();
        let values: Vec<&str> = captures.iter().map(|c| c.value).collect();
        assert_eq!(values, vec!["7", "42"]);
        assert_eq!(captures[0].name, "user");
    }

    #[test]
    fn test_int_capture_matches_structurally() {
        // Coercion happens later, so a non-numeric segment still matches here
        let p = Pattern::parse("/items/{id:int}").unwrap();
        let captures = p.matches("/items/abc").unwrap();
        assert_eq!(captures[0].value, "abc");
        assert!(p.matches("/items/").is_none());
    }
}
