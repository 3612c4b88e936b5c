//! The rendering pipeline: response headers and format specific processors.
//!
//! Rendering a [`Match`] happens in two steps:
//!
//! 1. [`Match::apply_headers`] writes `Content-Type` (with a charset for textual types),
//!    `Content-Language` and `Vary`, and reports whether the body must be transcoded.
//! 2. A [`Processor`] pulls the content through a [`ContentStream`] and encodes it.
//!
//! Processors provided here:
//! - [`Json`]: a single value, or a sequence framed as a JSON array
//! - [`Xml`]: a single element, or a sequence wrapped in a root element
//! - [`Csv`]: one or more rows per item
//! - [`Text`]: text and bytes, concatenated
//! - [`Binary`]: bytes, readers and writer callbacks copied through unmodified
//!
//! Textual processors guarantee the body ends with exactly one trailing newline.

mod binary;
mod csv;
mod json;
mod text;
mod writer;
mod xml;

pub use binary::Binary;
pub use self::csv::Csv;
pub use json::Json;
pub use text::Text;
pub use writer::NewlineWriter;
pub use writer::TranscodingWriter;
pub use xml::Xml;

use crate::data::ContentStream;
use crate::error::RenderError;
use crate::header::{ContentType, WILDCARD};
use crate::offer::Match;
use crate::request::RequestHeaders;
use encoding_rs::Encoding;
use http::header::{CONTENT_LANGUAGE, CONTENT_TYPE, VARY};
use http::{HeaderMap, HeaderValue};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// Encodes negotiated content into a response body.
///
/// Implementations must be shareable between requests; all per-request state lives in
/// the [`ContentStream`].
pub trait Processor: Send + Sync + fmt::Debug {
    /// Whether this processor can render `media_type` (a resolved `type/subtype`) in
    /// `language`.
    fn can_process(&self, media_type: &str, language: &str) -> bool;

    /// Writes the content of `stream` to `w`.
    fn process(
        &self,
        w: &mut dyn Write,
        req: &dyn RequestHeaders,
        stream: &mut ContentStream<'_>,
        template: &str,
        language: &str,
    ) -> Result<(), RenderError>;
}

type ProcessFn =
    dyn Fn(&mut dyn Write, &dyn RequestHeaders, &mut ContentStream<'_>, &str, &str) -> Result<(), RenderError> + Send + Sync;

/// A processor built from a closure, e.g. to plug in a template engine.
pub struct FnProcessor {
    pattern: ContentType,
    f: Box<ProcessFn>,
}

/// Creates a processor for content types matching `pattern` (wildcards allowed).
///
/// # Example
/// ```
/// use micro_conneg::render::processor_fn;
/// use std::io::Write;
///
/// let html = processor_fn("text/html", |w, _req, stream, template, _language| {
///     while let Some(item) = stream.next_item()? {
///         writeln!(w, "<p>{template}: {item:?}</p>")?;
///     }
///     Ok(())
/// });
/// ```
pub fn processor_fn<F>(pattern: &str, f: F) -> FnProcessor
where
    F: Fn(&mut dyn Write, &dyn RequestHeaders, &mut ContentStream<'_>, &str, &str) -> Result<(), RenderError>
        + Send
        + Sync
        + 'static,
{
    FnProcessor { pattern: ContentType::parse(pattern), f: Box::new(f) }
}

impl Processor for FnProcessor {
    fn can_process(&self, media_type: &str, _language: &str) -> bool {
        self.pattern.equals_or_wildcard(&ContentType::parse(media_type))
    }

    fn process(
        &self,
        w: &mut dyn Write,
        req: &dyn RequestHeaders,
        stream: &mut ContentStream<'_>,
        template: &str,
        language: &str,
    ) -> Result<(), RenderError> {
        (self.f)(w, req, stream, template, language)
    }
}

impl fmt::Debug for FnProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcessor").field("pattern", &self.pattern.to_string()).finish_non_exhaustive()
    }
}

/// JSON, XML, CSV, text and binary, in that order of preference.
pub fn default_processors() -> Vec<Arc<dyn Processor>> {
    vec![Arc::new(Json::new()), Arc::new(Xml::new()), Arc::new(Csv::new()), Arc::new(Text), Arc::new(Binary::new())]
}

/// Looks up a non UTF-8 output encoding for `charset`.
///
/// Empty, `*`, UTF-8 and unknown names all mean UTF-8 and return `None`.
fn transcoding_for(charset: &str) -> Option<&'static Encoding> {
    if charset.is_empty() || charset == WILDCARD {
        return None;
    }
    match Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => {
            let output = encoding.output_encoding();
            (output != encoding_rs::UTF_8).then_some(output)
        }
        None => {
            debug!(charset, "unsupported charset, falling back to utf-8");
            None
        }
    }
}

impl Match {
    /// Sets `Content-Type`, `Content-Language` and `Vary` for this match.
    ///
    /// Returns the encoding the body has to be transcoded to, if any.
    pub fn apply_headers(&self, headers: &mut HeaderMap) -> Option<&'static Encoding> {
        let mut content_type = self.content_type.essence();
        for (key, value) in self.content_type.params() {
            if key != "charset" {
                content_type.push_str(&format!(";{key}={value}"));
            }
        }

        let transcoding = self.content_type.is_textual().then(|| transcoding_for(&self.charset)).flatten();
        if self.content_type.is_textual() {
            let charset = transcoding.map_or_else(|| "utf-8".to_owned(), |encoding| encoding.name().to_ascii_lowercase());
            content_type.push_str(";charset=");
            content_type.push_str(&charset);
        }
        insert(headers, CONTENT_TYPE, &content_type);

        if !self.language.is_empty() && self.language != WILDCARD {
            insert(headers, CONTENT_LANGUAGE, &self.language);
        }

        if !self.vary.is_empty() {
            let vary = self.vary.iter().map(http::HeaderName::as_str).collect::<Vec<_>>().join(", ");
            insert(headers, VARY, &vary);
        }

        transcoding
    }
}

fn insert(headers: &mut HeaderMap, name: http::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => warn!(header = %name, value, cause = %e, "skipping invalid response header"),
    }
}

/// Runs `processor` over `stream`, transcoding the output when required.
pub(crate) fn write_body(
    processor: &dyn Processor,
    w: &mut dyn Write,
    req: &dyn RequestHeaders,
    stream: &mut ContentStream<'_>,
    template: &str,
    language: &str,
    transcoding: Option<&'static Encoding>,
) -> Result<(), RenderError> {
    match transcoding {
        Some(encoding) => {
            let mut transcoder = TranscodingWriter::new(w, encoding);
            processor.process(&mut transcoder, req, stream, template, language)?;
            transcoder.finish()?;
            Ok(())
        }
        None => processor.process(w, req, stream, template, language),
    }
}

/// Panics for a value shape a processor cannot encode: a misconfiguration, not a
/// runtime condition.
pub(crate) fn unsupported(processor: &str, value: &crate::data::Value) -> ! {
    panic!("{processor} processor cannot render {} content", value.kind_name())
}
