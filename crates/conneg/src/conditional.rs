//! Conditional GET support (RFC 7232).
//!
//! Before a body is rendered the supplier is asked for its [`Metadata`] without being
//! required to build the value. An `ETag` or `Last-Modified` validator found that way is
//! written to the response, and a matching `If-None-Match` or `If-Modified-Since`
//! short-circuits rendering with `304 Not Modified`.

use crate::data::{Content, Data, Metadata};
use crate::error::RenderError;
use crate::header::ETags;
use crate::request::RequestHeaders;
use http::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue, Method};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, warn};

/// Outcome of the conditional request step.
#[derive(Debug)]
pub(crate) enum Prepared {
    /// The client's copy is current; answer `304` without a body.
    NotModified,
    /// Render the body, starting with the item fetched while looking for validators.
    Render(Option<Content>),
}

/// Fetches validators from `data`, writes them to `headers` and evaluates the request
/// preconditions.
///
/// The supplier is called at most twice for a lazy value: once for metadata only, and
/// once more when the value itself is needed.
pub(crate) fn prepare(
    data: &mut Data,
    template: &str,
    language: &str,
    req: &dyn RequestHeaders,
    headers: &mut HeaderMap,
) -> Result<Prepared, RenderError> {
    let mut fetch = |data_required: bool| {
        data.content(template, language, data_required).map_err(|e| {
            error!(cause = %e, template, language, "content supplier failed");
            RenderError::supplier(e)
        })
    };

    let mut content = fetch(false)?;
    let mut fetched_value = false;

    if content.value.is_none() && content.metadata.is_none() {
        let full = fetch(true)?;
        fetched_value = true;
        content = Content { metadata: content.metadata.or(full.metadata), ..full };
    }

    let validators = matches!(*req.method(), Method::GET | Method::HEAD);
    if let Some(metadata) = content.metadata.as_ref().filter(|_| validators) {
        if not_modified(metadata, req, headers) {
            debug!(template, language, "representation not modified");
            return Ok(Prepared::NotModified);
        }
    }

    if content.value.is_none() && !fetched_value && !content.more {
        let full = fetch(true)?;
        content.value = full.value;
        content.more = full.more;
    }

    // a fetched item, even an absent one, must not be requested from the supplier again
    Ok(Prepared::Render((fetched_value || content.value.is_some()).then_some(content)))
}

/// Writes the validator of `metadata` and reports whether the client's copy is current.
///
/// An entity tag takes precedence: `Last-Modified` is only used when there is no hash.
fn not_modified(metadata: &Metadata, req: &dyn RequestHeaders, headers: &mut HeaderMap) -> bool {
    if !metadata.hash.is_empty() {
        let etag = format!("\"{}\"", metadata.hash);
        match HeaderValue::from_str(&etag) {
            Ok(value) => {
                headers.insert(ETAG, value);
            }
            Err(e) => warn!(etag, cause = %e, "skipping invalid etag"),
        }

        return req
            .header(&IF_NONE_MATCH)
            .is_some_and(|if_none_match| ETags::parse(&if_none_match).weakly_matches(&metadata.hash));
    }

    let Some(last_modified) = metadata.last_modified.filter(|&time| time > UNIX_EPOCH) else {
        return false;
    };
    let last_modified = truncate_to_seconds(last_modified);
    if let Ok(value) = HeaderValue::from_str(&httpdate::fmt_http_date(last_modified)) {
        headers.insert(LAST_MODIFIED, value);
    }

    match req.header(&IF_MODIFIED_SINCE).map(|since| httpdate::parse_http_date(&since)) {
        Some(Ok(since)) => last_modified <= since,
        Some(Err(e)) => {
            debug!(cause = %e, "ignoring unparsable If-Modified-Since");
            false
        }
        None => false,
    }
}

/// HTTP dates have a resolution of one second.
fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs()),
        Err(_) => time,
    }
}
