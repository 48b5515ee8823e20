//! URI template compilation and matching.
//!
//! A template is a path made of literal text and placeholders:
//!
//! - `{name}` matches one non-empty segment (anything but `/`)
//! - `{name<regex>}` matches a segment constrained by `regex`
//! - `{name+}` matches the rest of the path, slashes included
//! - `{name*}` is like `{name+}` but may also match nothing
//! - a trailing `*` turns the route into a sub-route. It matches any text
//!   after the prefix, so `/foo/*` matches `/foo/bar/baz` and `/foo*`
//!   matches `/foo`, `/foobar` and `/foo/bar`
//!
//! `{name+}` and `{name*}` must be the last segment of the template.
//!
//! Matching is a full match: `/foo` does not match `/foo/`. Captured values
//! are returned exactly as they appear in the request path, still
//! percent-encoded.
//!
//! ```
//! use waypoint_core::PathPattern;
//!
//! let pattern = PathPattern::compile("/foo/{id}/{email}").unwrap();
//! let params = pattern.captures("/foo/1234/foo@aol.com").unwrap();
//! assert_eq!(params["id"], "1234");
//! assert_eq!(params["email"], "foo@aol.com");
//! ```

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// How much of the path a placeholder may capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSpan {
    /// One non-empty segment
    Segment,
    /// The rest of the path, at least one character
    Greedy,
    /// The rest of the path, possibly empty
    Any,
}

/// One piece of a compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text matched verbatim
    Literal(String),
    /// A named placeholder
    Param {
        name: String,
        regex: Option<String>,
        span: ParamSpan,
    },
    /// Trailing `*` of a sub-route
    Wildcard,
}

impl Segment {
    /// The placeholder as written in the template
    pub fn template_text(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::Param {
                name,
                regex: Some(regex),
                ..
            } => format!("{{{}<{}>}}", name, regex),
            Segment::Param {
                name,
                span: ParamSpan::Greedy,
                ..
            } => format!("{{{}+}}", name),
            Segment::Param {
                name,
                span: ParamSpan::Any,
                ..
            } => format!("{{{}*}}", name),
            Segment::Param { name, .. } => format!("{{{}}}", name),
            Segment::Wildcard => "*".to_string(),
        }
    }
}

/// A compiled URI template
#[derive(Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    names: Vec<String>,
    regex: Regex,
}

impl PathPattern {
    /// Compile a template. Fails on malformed placeholders, duplicate names,
    /// invalid constraint regexes, or a `+`/`*` parameter that is not last.
    pub fn compile(template: &str) -> Result<Self> {
        let segments = parse_template(template)?;

        let mut names: Vec<String> = Vec::new();
        let mut expression = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => expression.push_str(&regex::escape(text)),
                Segment::Param { name, regex, span } => {
                    if names.contains(name) {
                        return Err(Error::InvalidRoute(format!(
                            "duplicate parameter '{}' in '{}'",
                            name, template
                        )));
                    }
                    let group = format!("p{}", names.len());
                    names.push(name.clone());
                    let body = match (regex, span) {
                        (Some(regex), _) => format!("(?:{})", regex),
                        (None, ParamSpan::Greedy) => ".+".to_string(),
                        (None, ParamSpan::Any) => ".*".to_string(),
                        (None, ParamSpan::Segment) => "[^/]+".to_string(),
                    };
                    expression.push_str(&format!("(?P<{}>{})", group, body));
                }
                Segment::Wildcard => expression.push_str(".*"),
            }
        }
        expression.push('$');

        let regex = Regex::new(&expression).map_err(|e| {
            Error::InvalidRoute(format!("invalid pattern '{}': {}", template, e))
        })?;

        Ok(Self {
            raw: template.to_string(),
            segments,
            names,
            regex,
        })
    }

    /// The template as declared
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declaration order
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a path and return the encoded captures, or `None` on no match.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let mut params = HashMap::with_capacity(self.names.len());
        for (index, name) in self.names.iter().enumerate() {
            if let Some(m) = caps.name(&format!("p{}", index)) {
                params.insert(name.clone(), m.as_str().to_string());
            }
        }
        Some(params)
    }

    /// The template with parameter names erased. Two templates with the same
    /// signature match exactly the same paths. Constraints spelling out a
    /// plain placeholder (`[^/]+`, `.+`, `.*`) are written as that placeholder.
    pub fn signature(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Param {
                    regex: Some(regex), ..
                } => match regex.as_str() {
                    "[^/]+" => "{}".to_string(),
                    ".+" => "{+}".to_string(),
                    ".*" => "{*}".to_string(),
                    _ => format!("{{<{}>}}", regex),
                },
                Segment::Param {
                    span: ParamSpan::Greedy, ..
                } => "{+}".to_string(),
                Segment::Param { span: ParamSpan::Any, .. } => "{*}".to_string(),
                Segment::Param { .. } => "{}".to_string(),
                Segment::Wildcard => "*".to_string(),
            })
            .collect()
    }

    /// Ends with a `*` wildcard
    pub fn is_sub_route(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// Has no placeholder and no wildcard
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("raw", &self.raw)
            .field("names", &self.names)
            .finish()
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let invalid = |reason: &str| Error::InvalidRoute(format!("{} in '{}'", reason, template));

    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        rest = &rest[open + 1..];

        let name_end = rest
            .find(['<', '+', '*', '}'])
            .ok_or_else(|| invalid("unterminated placeholder"))?;
        let name = rest[..name_end].trim();
        if name.is_empty() {
            return Err(invalid("empty parameter name"));
        }
        if name.contains(['/', '{']) {
            return Err(invalid("malformed parameter name"));
        }
        let name = name.to_string();

        let after_name = &rest[name_end..];
        if let Some(constraint) = after_name.strip_prefix('<') {
            let close = constraint
                .find(">}")
                .ok_or_else(|| invalid("unterminated constraint"))?;
            segments.push(Segment::Param {
                name,
                regex: Some(constraint[..close].to_string()),
                span: ParamSpan::Segment,
            });
            rest = &constraint[close + 2..];
        } else if let Some((span, after)) = after_name
            .strip_prefix("+}")
            .map(|after| (ParamSpan::Greedy, after))
            .or_else(|| after_name.strip_prefix("*}").map(|after| (ParamSpan::Any, after)))
        {
            if !after.is_empty() {
                return Err(invalid("multi-segment parameter must be last"));
            }
            segments.push(Segment::Param {
                name,
                regex: None,
                span,
            });
            rest = after;
        } else if let Some(after) = after_name.strip_prefix('}') {
            segments.push(Segment::Param {
                name,
                regex: None,
                span: ParamSpan::Segment,
            });
            rest = after;
        } else {
            return Err(invalid("unterminated placeholder"));
        }
    }

    if let Some(prefix) = rest.strip_suffix('*') {
        if !prefix.is_empty() {
            segments.push(Segment::Literal(prefix.to_string()));
        }
        segments.push(Segment::Wildcard);
    } else if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(segments)
}
