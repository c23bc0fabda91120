//! Attribute-level HTML rewriting.
//!
//! Elements are discovered with `scraper`, but the DOM it builds cannot be
//! serialized back without reformatting the whole page. Instead, values are
//! spliced into the original markup: only the quoted attribute value changes,
//! everything else is copied byte for byte.

use std::collections::HashMap;
use std::ops::Range;

struct Attribute {
    name: Range<usize>,
    /// Whole value token, quotes included.
    token: Range<usize>,
    /// Value without quotes.
    inner: Range<usize>,
}

/// Replace the value of `attr` on every `<tag>` start tag whose decoded value
/// is a key of `replacements`.
pub(crate) fn replace_attribute_values(
    html: &str,
    tag: &str,
    attr: &str,
    replacements: &HashMap<String, String>,
) -> String {
    if replacements.is_empty() {
        return html.to_string();
    }

    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        let after = start + 1;

        if html[after..].starts_with("!--") {
            pos = html[after..]
                .find("-->")
                .map(|end| after + end + 3)
                .unwrap_or(html.len());
            continue;
        }

        let name_len = bytes[after..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if name_len == 0 {
            pos = after;
            continue;
        }
        let name = &html[after..after + name_len];

        let Some((attributes, tag_end)) = parse_attributes(bytes, after + name_len) else {
            break;
        };

        if name.eq_ignore_ascii_case(tag) {
            for attribute in attributes {
                if !html[attribute.name.clone()].eq_ignore_ascii_case(attr) {
                    continue;
                }
                let current = html_escape::decode_html_entities(&html[attribute.inner.clone()]);
                if let Some(new_value) = replacements.get(current.as_ref()) {
                    out.push_str(&html[copied..attribute.token.start]);
                    out.push('"');
                    out.push_str(&escape_attribute(new_value));
                    out.push('"');
                    copied = attribute.token.end;
                }
            }
        }

        pos = tag_end + 1;

        // Raw text elements: their content is not markup.
        if name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style") {
            let closing = format!("</{}", name.to_ascii_lowercase());
            pos = find_ignore_case(html, pos, &closing).unwrap_or(html.len());
        }
    }

    out.push_str(&html[copied..]);
    out
}

/// Tokenize the attributes of a start tag beginning at `pos` (just after the
/// tag name). Returns the attributes and the index of the closing `>`.
fn parse_attributes(bytes: &[u8], mut pos: usize) -> Option<(Vec<Attribute>, usize)> {
    let len = bytes.len();
    let mut attributes = Vec::new();

    loop {
        while pos < len && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/') {
            pos += 1;
        }
        if pos >= len {
            return None;
        }
        if bytes[pos] == b'>' {
            return Some((attributes, pos));
        }

        let name_start = pos;
        while pos < len
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'>' | b'/')
        {
            pos += 1;
        }
        let name = name_start..pos;

        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len || bytes[pos] != b'=' {
            continue;
        }
        pos += 1;
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            return None;
        }

        let token_start = pos;
        let (inner, token_end) = if matches!(bytes[pos], b'"' | b'\'') {
            let quote = bytes[pos];
            let inner_start = pos + 1;
            let inner_end = inner_start + bytes[inner_start..].iter().position(|&b| b == quote)?;
            (inner_start..inner_end, inner_end + 1)
        } else {
            while pos < len && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                pos += 1;
            }
            (token_start..pos, pos)
        };
        pos = token_end;

        attributes.push(Attribute {
            name,
            token: token_start..token_end,
            inner,
        });
    }
}

fn find_ignore_case(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack.as_bytes()[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| from + offset)
}

fn escape_attribute(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}
