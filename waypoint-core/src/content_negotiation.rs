//! Media types and `Accept` header handling.
//!
//! These are the primitives used by the route table when it narrows a set of
//! matching routes by their `accepts`/`produces` declarations, and by
//! [`Route::invoke`](crate::Route::invoke) when it picks a response
//! `Content-Type` among several produced types.
//!
//! # Examples
//!
//! ```
//! use waypoint_core::content_negotiation::{Accept, MediaType, negotiate_media_type};
//!
//! let accept = Accept::parse("application/xml;q=0.5, application/json");
//! let available = vec![MediaType::xml(), MediaType::json()];
//! let best = negotiate_media_type(&accept, &available);
//! assert_eq!(best, Some(&MediaType::json()));
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Media Types
// ============================================================================

/// Represents a media type (MIME type) with optional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// The type (e.g., "application", "text", "image")
    pub type_: String,
    /// The subtype (e.g., "json", "html", "png")
    pub subtype: String,
    /// Optional parameters (e.g., charset=utf-8)
    pub params: HashMap<String, String>,
}

impl MediaType {
    /// Create a new media type.
    pub fn new(type_: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            subtype: subtype.into(),
            params: HashMap::new(),
        }
    }

    /// Create `application/json` media type.
    pub fn json() -> Self {
        Self::new("application", "json")
    }

    /// Create `application/xml` media type.
    pub fn xml() -> Self {
        Self::new("application", "xml")
    }

    /// Create `text/plain` media type.
    pub fn plain_text() -> Self {
        Self::new("text", "plain")
    }

    /// Create `text/html` media type.
    pub fn html() -> Self {
        Self::new("text", "html")
    }

    /// Create `application/x-www-form-urlencoded` media type.
    pub fn form_urlencoded() -> Self {
        Self::new("application", "x-www-form-urlencoded")
    }

    /// Create `application/octet-stream` media type.
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Create `*/*` wildcard media type.
    pub fn any() -> Self {
        Self::new("*", "*")
    }

    /// Parse a media type from a string (without quality value).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut parts = s.split(';');

        let type_subtype = parts.next()?.trim();
        let (type_, subtype) = type_subtype.split_once('/')?;
        let type_ = type_.trim().to_lowercase();
        let subtype = subtype.trim().to_lowercase();
        if type_.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut params = HashMap::new();
        for param in parts {
            let param = param.trim();
            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                // Skip quality parameter
                if key != "q" {
                    params.insert(key, value);
                }
            }
        }

        Some(Self {
            type_,
            subtype,
            params,
        })
    }

    /// Check if this media type matches another (considering wildcards on either side).
    pub fn matches(&self, other: &MediaType) -> bool {
        let type_matches = self.type_ == "*" || other.type_ == "*" || self.type_ == other.type_;
        let subtype_matches =
            self.subtype == "*" || other.subtype == "*" || self.subtype == other.subtype;
        type_matches && subtype_matches
    }

    /// Type and subtype are equal, parameters ignored.
    pub fn same_mime_type(&self, other: &MediaType) -> bool {
        self.type_ == other.type_ && self.subtype == other.subtype
    }

    /// Check if this is a wildcard type (`*/*`).
    pub fn is_any(&self) -> bool {
        self.type_ == "*" && self.subtype == "*"
    }

    /// Check if the subtype is a wildcard (`something/*`).
    pub fn is_subtype_wildcard(&self) -> bool {
        self.subtype == "*"
    }

    /// Either part is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.type_ == "*" || self.subtype == "*"
    }

    /// Structured-syntax JSON types (`application/json`, `application/problem+json`, ...).
    pub fn is_json(&self) -> bool {
        self.subtype == "json" || self.subtype.ends_with("+json")
    }

    /// Get the full MIME type string.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Get the full MIME type string with parameters.
    pub fn to_header_value(&self) -> String {
        let mut result = self.mime_type();
        for (key, value) in &self.params {
            result.push_str(&format!("; {}={}", key, value));
        }
        result
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_header_value())
    }
}

// ============================================================================
// Accept Header
// ============================================================================

/// Represents a parsed `Accept` header with quality values.
#[derive(Debug, Clone, Default)]
pub struct Accept {
    /// Media types with their quality values, sorted by preference.
    pub media_types: Vec<(MediaType, f32)>,
}

impl Accept {
    /// An Accept header that accepts anything.
    pub fn any() -> Self {
        Self {
            media_types: vec![(MediaType::any(), 1.0)],
        }
    }

    /// Parse an Accept header string.
    ///
    /// ```
    /// use waypoint_core::content_negotiation::Accept;
    ///
    /// let accept = Accept::parse("application/json, text/html;q=0.9, */*;q=0.1");
    /// assert_eq!(accept.media_types.len(), 3);
    /// ```
    pub fn parse(header: &str) -> Self {
        let mut media_types: Vec<(MediaType, f32)> = header
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }

                let (media_part, quality) = Self::extract_quality(part);

                MediaType::parse(media_part).map(|mt| (mt, quality))
            })
            .collect();

        // Sort by quality (highest first), then by specificity
        media_types.sort_by(|a, b| {
            match b.1.partial_cmp(&a.1) {
                Some(Ordering::Equal) | None => {}
                Some(ord) => return ord,
            }

            let a_specificity = Self::specificity(&a.0);
            let b_specificity = Self::specificity(&b.0);
            b_specificity.cmp(&a_specificity)
        });

        Self { media_types }
    }

    fn extract_quality(s: &str) -> (&str, f32) {
        if let Some(q_pos) = s.to_lowercase().find(";q=") {
            let media_part = &s[..q_pos];
            let q_part = &s[q_pos + 3..];

            let quality = q_part
                .split(';')
                .next()
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);

            (media_part, quality)
        } else {
            (s, 1.0)
        }
    }

    fn specificity(mt: &MediaType) -> u8 {
        let mut score = 0u8;
        if mt.type_ != "*" {
            score += 2;
        }
        if mt.subtype != "*" {
            score += 1;
        }
        score
    }

    /// Check if a media type is acceptable.
    pub fn accepts(&self, media_type: &MediaType) -> bool {
        self.quality_for(media_type) > 0.0
    }

    /// Get the quality value for a specific media type.
    pub fn quality_for(&self, media_type: &MediaType) -> f32 {
        for (mt, quality) in &self.media_types {
            if mt.matches(media_type) {
                return *quality;
            }
        }
        0.0
    }

    /// Get the preferred media type from this Accept header.
    pub fn preferred(&self) -> Option<&MediaType> {
        self.media_types.first().map(|(mt, _)| mt)
    }
}

/// Negotiate the best media type from available options.
///
/// Returns the media type from `available` that best matches the client's
/// preferences in `accept`. Ties keep the earlier entry of `available`.
pub fn negotiate_media_type<'a>(
    accept: &Accept,
    available: &'a [MediaType],
) -> Option<&'a MediaType> {
    let mut best: Option<(&'a MediaType, f32, u8)> = None;

    for available_mt in available {
        let quality = accept.quality_for(available_mt);
        if quality > 0.0 {
            let specificity = Accept::specificity(available_mt);
            match &best {
                None => best = Some((available_mt, quality, specificity)),
                Some((_, best_q, best_s)) => {
                    if quality > *best_q || (quality == *best_q && specificity > *best_s) {
                        best = Some((available_mt, quality, specificity));
                    }
                }
            }
        }
    }

    best.map(|(mt, _, _)| mt)
}

/// Whether two declared media type lists overlap. An empty list means
/// "anything" and overlaps with every list.
pub fn media_types_overlap(left: &[MediaType], right: &[MediaType]) -> bool {
    if left.is_empty() || right.is_empty() {
        return true;
    }
    left.iter().any(|l| right.iter().any(|r| l.matches(r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_type() {
        let mt = MediaType::parse("Text/HTML; charset=UTF-8").unwrap();
        assert_eq!(mt.type_, "text");
        assert_eq!(mt.subtype, "html");
        assert_eq!(mt.params.get("charset"), Some(&"UTF-8".to_string()));
        assert!(MediaType::parse("nonsense").is_none());
        assert!(MediaType::parse("text/").is_none());
    }

    #[test]
    fn test_wildcard_matching() {
        let text_any = MediaType::parse("text/*").unwrap();
        assert!(text_any.matches(&MediaType::plain_text()));
        assert!(MediaType::plain_text().matches(&text_any));
        assert!(!text_any.matches(&MediaType::json()));
        assert!(MediaType::any().matches(&MediaType::json()));
        assert!(text_any.is_wildcard());
        assert!(!MediaType::json().is_wildcard());
    }

    #[test]
    fn test_accept_ordering() {
        let accept = Accept::parse("text/*;q=0.5, text/html, */*;q=0.1");
        assert_eq!(accept.preferred(), Some(&MediaType::html()));
        assert_eq!(accept.quality_for(&MediaType::plain_text()), 0.5);
        assert_eq!(accept.quality_for(&MediaType::json()), 0.1);
    }

    #[test]
    fn test_zero_quality_is_not_accepted() {
        let accept = Accept::parse("application/json, application/xml;q=0");
        assert!(accept.accepts(&MediaType::json()));
        assert!(!accept.accepts(&MediaType::xml()));
    }

    #[test]
    fn test_negotiate() {
        let accept = Accept::parse("application/xml;q=0.8, application/json");
        let available = vec![MediaType::xml(), MediaType::json()];
        assert_eq!(
            negotiate_media_type(&accept, &available),
            Some(&MediaType::json())
        );

        let accept = Accept::parse("image/png");
        assert_eq!(negotiate_media_type(&accept, &available), None);
    }

    #[test]
    fn test_overlap() {
        let json = vec![MediaType::json()];
        let xml = vec![MediaType::xml()];
        let anything = vec![];
        let app_any = vec![MediaType::parse("application/*").unwrap()];
        assert!(media_types_overlap(&json, &anything));
        assert!(!media_types_overlap(&json, &xml));
        assert!(media_types_overlap(&json, &app_any));
    }
}
