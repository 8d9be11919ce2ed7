//! Start-tag attribute scanner
//!
//! Locates attributes on HTML start tags without building a document tree.
//! The scanner understands just enough markup to avoid false matches:
//! comments, doctype and processing instructions are skipped, end tags are
//! ignored, and the text content of `<script>`, `<style>`, `<title>` and
//! `<textarea>` elements is never searched. Attribute values may be single-quoted, double-quoted, unquoted
//! or absent.

use std::borrow::Cow;
use std::ops::Range;

/// Elements whose content is raw text (or escapable raw text) and must not be
/// tokenized
const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "title", "textarea"];

/// How an attribute value is delimited in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// `name='value'`
    Single,
    /// `name="value"`
    Double,
    /// `name=value` or a valueless `name`
    None,
}

impl Quote {
    /// Delimiter character, if any
    pub const fn as_char(self) -> Option<char> {
        match self {
            Self::Single => Some('\''),
            Self::Double => Some('"'),
            Self::None => None,
        }
    }
}

/// An attribute occurrence found on a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased name of the element carrying the attribute
    pub tag: String,
    /// Decoded value, `None` for a valueless attribute
    pub value: Option<String>,
    /// Byte range of the raw value including its quotes.
    ///
    /// For a valueless attribute this is an empty range right after the
    /// attribute name.
    pub value_span: Range<usize>,
    /// Delimiter used by the raw value
    pub quote: Quote,
}

/// Find every occurrence of attribute `name` on the start tags of `html`.
///
/// Names are compared ASCII case-insensitively, as HTML does. Results are in
/// document order.
pub fn find_attributes(html: &str, name: &str) -> Vec<Attribute> {
    let bytes = html.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'<') {
        let start = pos + offset;
        let rest = &html[start..];

        if rest.starts_with("<!--") {
            pos = find_from(html, start + 4, "-->").map_or(html.len(), |end| end + 3);
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") || rest.starts_with("</") {
            pos = find_from(html, start + 1, ">").map_or(html.len(), |end| end + 1);
            continue;
        }

        if !bytes.get(start + 1).is_some_and(u8::is_ascii_alphabetic) {
            pos = start + 1;
            continue;
        }

        let tag = scan_start_tag(html, start + 1, name, &mut found);
        pos = tag.end;

        if !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            pos = skip_raw_text(html, pos, &tag.name);
        }
    }

    found
}

/// Decode the HTML character references that can appear in attribute values.
///
/// Unknown or malformed references are left as written.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let reference = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));

        match reference {
            Some((c, semi)) => {
                decoded.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    Cow::Owned(decoded)
}

/// Encode `value` so it can sit between `quote` delimiters.
///
/// Unquoted output is not supported; callers pick a quote first.
pub fn encode_attribute_value(value: &str, quote: Quote) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => encoded.push_str("&amp;"),
            '\'' if quote == Quote::Single => encoded.push_str("&#39;"),
            '"' if quote == Quote::Double => encoded.push_str("&quot;"),
            _ => encoded.push(c),
        }
    }
    encoded
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

struct StartTag {
    name: String,
    end: usize,
    self_closing: bool,
}

fn scan_start_tag(html: &str, mut i: usize, target: &str, found: &mut Vec<Attribute>) -> StartTag {
    let bytes = html.as_bytes();
    let name_start = i;
    while i < bytes.len() && !is_tag_delimiter(bytes[i]) {
        i += 1;
    }
    let tag_name = html[name_start..i].to_ascii_lowercase();
    let mut self_closing = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        match bytes.get(i) {
            None => break,
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') => {
                i += 1;
                self_closing = bytes.get(i) == Some(&b'>');
                continue;
            }
            Some(_) => {}
        }
        self_closing = false;

        let attr_start = i;
        while i < bytes.len() && !is_tag_delimiter(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        if i == attr_start {
            // Stray '=' where a name was expected
            i += 1;
            continue;
        }
        let attr_name = &html[attr_start..i];
        let name_end = i;

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let (value, value_span, quote) = if bytes.get(j) == Some(&b'=') {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let (raw, span, quote) = scan_value(html, j);
            i = span.end;
            (Some(decode_entities(raw).into_owned()), span, quote)
        } else {
            (None, name_end..name_end, Quote::None)
        };

        if attr_name.eq_ignore_ascii_case(target) {
            found.push(Attribute {
                tag: tag_name.clone(),
                value,
                value_span,
                quote,
            });
        }
    }

    StartTag {
        name: tag_name,
        end: i,
        self_closing,
    }
}

/// Scan an attribute value starting at `i`, returning the raw text between
/// delimiters, the span including delimiters, and the quote style.
fn scan_value(html: &str, i: usize) -> (&str, Range<usize>, Quote) {
    let bytes = html.as_bytes();
    let quote = match bytes.get(i) {
        Some(b'\'') => Quote::Single,
        Some(b'"') => Quote::Double,
        _ => Quote::None,
    };

    match quote.as_char() {
        Some(delimiter) => {
            let body_start = i + 1;
            match html[body_start..].find(delimiter) {
                Some(len) => (
                    &html[body_start..body_start + len],
                    i..body_start + len + 1,
                    quote,
                ),
                None => (&html[body_start..], i..html.len(), quote),
            }
        }
        None => {
            let mut end = i;
            while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                end += 1;
            }
            (&html[i..end], i..end, quote)
        }
    }
}

fn skip_raw_text(html: &str, pos: usize, tag: &str) -> usize {
    let closing = format!("</{tag}");
    html[pos..]
        .to_ascii_lowercase()
        .find(&closing)
        .map_or(html.len(), |offset| pos + offset)
}

fn find_from(html: &str, from: usize, needle: &str) -> Option<usize> {
    html.get(from..)?.find(needle).map(|offset| from + offset)
}

const fn is_tag_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}
