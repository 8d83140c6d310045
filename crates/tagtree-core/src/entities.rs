//! Entity decoding for leaf text and string attribute values.
//!
//! Exactly five escapes are recognized:
//! `&amp;` `&apos;` `&quot;` `&lt;` `&gt;`. Anything else starting with `&`
//! is copied through unchanged.

use memchr::memchr;

use crate::error::ParseError;
use crate::scan::copy_span;
use crate::span::Span;

const ENTITIES: [(&[u8], char); 5] = [
    (b"&amp;", '&'),
    (b"&apos;", '\''),
    (b"&quot;", '"'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
];

/// Match a recognized entity at the start of `rest`.
///
/// Returns the decoded character and the length of the escape.
#[inline]
fn match_entity(rest: &[u8]) -> Option<(char, usize)> {
    ENTITIES
        .iter()
        .filter(|(escape, _)| rest.starts_with(escape))
        .max_by_key(|(escape, _)| escape.len())
        .map(|&(escape, ch)| (ch, escape.len()))
}

/// Decode `text` (located at `span` in the source) into an owned string.
///
/// The result is never longer than the input.
pub fn decode(text: &str, span: Span) -> Result<String, ParseError> {
    let bytes = text.as_bytes();

    // Fast path: nothing to decode
    let Some(first) = memchr(b'&', bytes) else {
        return copy_span(text, span);
    };

    let mut out = String::new();
    out.try_reserve_exact(text.len())
        .map_err(|_| ParseError::allocation_failure(span))?;

    let mut copied = 0;
    let mut pos = first;
    loop {
        match match_entity(&bytes[pos..]) {
            Some((ch, len)) => {
                out.push_str(&text[copied..pos]);
                out.push(ch);
                pos += len;
                copied = pos;
            }
            None => pos += 1,
        }

        match memchr(b'&', &bytes[pos..]) {
            Some(next) => pos += next,
            None => break,
        }
    }
    out.push_str(&text[copied..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(text: &str) -> String {
        decode(text, Span::new(0, text.len())).unwrap()
    }

    #[test]
    fn decodes_all_five() {
        assert_eq!(decode_str("&amp;&apos;&quot;&lt;&gt;"), "&'\"<>");
    }

    #[test]
    fn plain_text_is_copied() {
        assert_eq!(decode_str("hello world"), "hello world");
        assert_eq!(decode_str(""), "");
    }

    #[test]
    fn mixed_text() {
        assert_eq!(decode_str("1 &lt; 2 &amp;&amp; 2 &gt; 0"), "1 < 2 && 2 > 0");
    }

    #[test]
    fn unknown_and_bare_ampersands_are_kept() {
        assert_eq!(decode_str("a & b"), "a & b");
        assert_eq!(decode_str("&nbsp;&#65;"), "&nbsp;&#65;");
        assert_eq!(decode_str("&amp"), "&amp");
        assert_eq!(decode_str("&&lt;"), "&<");
        assert_eq!(decode_str("trailing &"), "trailing &");
    }

    #[test]
    fn decoded_entity_is_not_decoded_again() {
        assert_eq!(decode_str("&amp;lt;"), "&lt;");
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(decode_str("caf\u{e9} &amp; cr\u{e8}me"), "caf\u{e9} & cr\u{e8}me");
    }
}
