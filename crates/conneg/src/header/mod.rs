//! Typed models of the weighted request headers used during negotiation.
//!
//! This module parses the raw text of `Accept`, `Accept-Language`, `Accept-Charset` and
//! `If-None-Match` into values that can be compared and ordered:
//!
//! - [`ContentType`]: a `type/subtype` pair with its parameters
//! - [`MediaRanges`]: the `Accept` header, ordered by quality then specificity
//! - [`PrecedenceValues`]: `Accept-Language` / `Accept-Charset`, ordered by quality
//! - [`ETags`]: the entity tags of `If-None-Match` / `If-Match`
//!
//! Parsing is lenient. Malformed qualities default to `1.0`, out of range qualities are
//! clamped and empty list elements are skipped, so parsing never fails.

mod content_type;
mod etag;
mod media_range;
mod precedence;

pub use content_type::ContentType;
pub use etag::ETag;
pub use etag::ETags;
pub use media_range::MediaRange;
pub use media_range::MediaRanges;
pub use precedence::PrecedenceValue;
pub use precedence::PrecedenceValues;

/// The wildcard token used for types, subtypes, languages and charsets.
pub const WILDCARD: &str = "*";

/// Parses the text of a `q=` parameter.
///
/// Unparsable text yields `1.0` and numeric values are clamped to `[0, 1]`.
pub(crate) fn parse_quality(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(q) if q.is_nan() => 1.0,
        Ok(q) => q.clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Splits a comma separated header into trimmed, non-empty elements.
pub(crate) fn split_list(header: &str) -> impl Iterator<Item = &str> {
    header.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Splits one `key=value` parameter, lowercasing both sides and removing quotes.
pub(crate) fn split_param(param: &str) -> Option<(String, String)> {
    let param = param.trim();
    if param.is_empty() {
        return None;
    }

    let (key, value) = param.split_once('=').unwrap_or((param, ""));
    let key = key.trim().to_ascii_lowercase();
    if key.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"').to_ascii_lowercase();
    Some((key, value))
}

/// Formats a quality the way it appears in a header, e.g. `0.8`.
pub(crate) fn format_quality(quality: f64) -> String {
    let text = format!("{quality:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() { "0".to_owned() } else { text.to_owned() }
}
