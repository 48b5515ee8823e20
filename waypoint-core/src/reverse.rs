// Reverse routing: building a URL from a template and argument pairs

use crate::path_pattern::{ParamSpan, PathPattern, Segment};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped in a path segment value. RFC 3986 sub-delimiters,
/// `:` and `@` are legal inside a segment and stay as they are.
const PATH_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// `{name+}` and `{name*}` span segments, so `/` is kept.
const GREEDY_VALUE: &AsciiSet = &PATH_VALUE.remove(b'/');

/// Substitute path placeholders and append the remaining pairs as a query.
///
/// Placeholders without a value are emitted as written in the template.
/// When a placeholder name is supplied more than once, the first value is
/// used and the others are dropped. Query pairs keep their order.
pub fn compute_url(pattern: &PathPattern, pairs: &[(&str, &str)]) -> String {
    let mut url = String::with_capacity(pattern.raw().len());

    for segment in pattern.segments() {
        match segment {
            Segment::Param { name, span, .. } => {
                match pairs.iter().find(|(key, _)| key == name) {
                    Some((_, value)) => {
                        let set = match span {
                            ParamSpan::Segment => PATH_VALUE,
                            ParamSpan::Greedy | ParamSpan::Any => GREEDY_VALUE,
                        };
                        url.extend(utf8_percent_encode(value, set));
                    }
                    None => url.push_str(&segment.template_text()),
                }
            }
            other => url.push_str(&other.template_text()),
        }
    }

    let names = pattern.parameter_names();
    let query: Vec<String> = pairs
        .iter()
        .filter(|(key, _)| !names.iter().any(|name| name == key))
        .map(|(key, value)| format!("{}={}", encode_query(key), encode_query(value)))
        .collect();

    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.join("&"));
    }
    url
}

fn encode_query(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}
