//! Scanner primitives: character classes, span comparison, value recognition.

use crate::error::ParseError;
use crate::span::Span;

/// How attribute values are classified into numbers and booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueInference {
    /// A number needs at least one digit; booleans must be exactly
    /// `true` or `false`.
    #[default]
    Strict,
    /// Permissive checks kept for older documents:
    /// `""`, `"-"` and `"."` are numbers (value 0), and any prefix of
    /// `true`/`false` is a boolean.
    Legacy,
}

/// ASCII whitespace.
#[inline(always)]
pub fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace()
}

/// Byte allowed in an attribute name.
#[inline(always)]
pub fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte that terminates a tag name.
#[inline(always)]
pub fn is_tag_name_end(b: u8) -> bool {
    b == b'>' || b == b'/' || is_space(b)
}

/// Check whether `span` looks like `-?[0-9]*\.?[0-9]*`.
///
/// At most one `.` is allowed. Under [`ValueInference::Strict`] at least one
/// digit is required; [`ValueInference::Legacy`] accepts spans with no digits.
pub fn is_decimal_number(span: &[u8], inference: ValueInference) -> bool {
    let digits = span.strip_prefix(b"-").unwrap_or(span);

    let mut used_dot = false;
    let mut any_digit = false;
    for &b in digits {
        match b {
            b'0'..=b'9' => any_digit = true,
            b'.' if !used_dot => used_dot = true,
            _ => return false,
        }
    }

    match inference {
        ValueInference::Strict => any_digit,
        ValueInference::Legacy => true,
    }
}

/// Compare `span` with `literal` position by position.
///
/// Only the positions of `span` are checked, so a span that is a prefix of
/// `literal` compares equal. Use [`span_equals_exact`] when lengths matter.
#[inline]
pub fn span_equals(span: &[u8], literal: &str) -> bool {
    let literal = literal.as_bytes();
    span.len() <= literal.len() && span.iter().zip(literal).all(|(a, b)| a == b)
}

/// Length-checked [`span_equals`].
#[inline]
pub fn span_equals_exact(span: &[u8], literal: &str) -> bool {
    span.len() == literal.len() && span_equals(span, literal)
}

/// Convert a span that passed [`is_decimal_number`] to a number.
///
/// Spans without digits (accepted only by legacy inference) convert to `0`.
pub fn span_to_number(span: &str) -> f64 {
    span.parse::<f64>().unwrap_or(0.0)
}

/// Recognize `true` / `false` under the given inference rule.
pub fn span_to_bool(span: &[u8], inference: ValueInference) -> Option<bool> {
    let equals = match inference {
        ValueInference::Strict => span_equals_exact,
        ValueInference::Legacy => span_equals,
    };
    if equals(span, "true") {
        Some(true)
    } else if equals(span, "false") {
        Some(false)
    } else {
        None
    }
}

/// Copy `text` into a freshly allocated `String`.
///
/// Allocation failure is reported as `AllocationFailure` at `span` instead of
/// aborting the process.
pub fn copy_span(text: &str, span: Span) -> Result<String, ParseError> {
    let mut owned = String::new();
    owned
        .try_reserve_exact(text.len())
        .map_err(|_| ParseError::allocation_failure(span))?;
    owned.push_str(text);
    Ok(owned)
}
