//! Content suppliers: where the body of a representation comes from.
//!
//! A [`Data`] produces the value of an offer in one of three ways:
//!
//! - a fixed value, already computed
//! - a lazily computed single value
//! - a lazily computed sequence, pulled one item at a time
//!
//! Every supplier is queried through the same [`Data::content`] call. The rendering
//! pipeline first calls it with `data_required = false`, giving the supplier a chance
//! to return cheap [`Metadata`] (an ETag seed or a modification time) so a conditional
//! request can be answered with `304 Not Modified` before the expensive value is built.

mod stream;
mod value;

pub use stream::ContentStream;
pub use value::Value;

use crate::error::BoxError;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::time::SystemTime;

/// Validators of a representation, used to answer conditional requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Seed of the `ETag` header. Empty means no entity tag.
    pub hash: String,
    /// Source of the `Last-Modified` header.
    pub last_modified: Option<SystemTime>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn with_last_modified(mut self, last_modified: SystemTime) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty() && self.last_modified.is_none()
    }
}

/// The answer to one [`Data::content`] call.
#[derive(Debug, Default)]
pub struct Content {
    /// The produced item, absent when nothing was produced.
    pub value: Option<Value>,
    pub metadata: Option<Metadata>,
    /// Set by sequences while further items follow.
    pub more: bool,
}

impl Content {
    pub fn new(value: Option<Value>, metadata: Option<Metadata>, more: bool) -> Self {
        Self { value, metadata, more }
    }
}

type LazyFn = Box<dyn FnMut(&str, &str, bool) -> Result<(Option<Value>, Option<Metadata>), BoxError> + Send>;
type SequenceFn = Box<dyn FnMut(&str, &str) -> Result<(Option<Value>, bool), BoxError> + Send>;

/// The content supplier bound to an offer for one language.
///
/// A `Data` is owned by a single request/response cycle.
pub struct Data {
    kind: Kind,
    metadata: Option<Metadata>,
    headers: HeaderMap,
}

enum Kind {
    Empty,
    Fixed(Option<Value>),
    Lazy(LazyFn),
    Sequence(SequenceFn),
}

impl Data {
    /// The empty marker: declares a language without binding a value to it.
    pub fn empty() -> Self {
        Self::from_kind(Kind::Empty)
    }

    /// A value that has already been computed.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::from_kind(Kind::Fixed(Some(value.into())))
    }

    /// A single value computed on demand.
    ///
    /// The function receives the template name, the negotiated language and whether the
    /// value itself is required. When `data_required` is false it may return only
    /// metadata; it will be called again with `true` if the body has to be rendered.
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnMut(&str, &str, bool) -> Result<(Option<Value>, Option<Metadata>), BoxError> + Send + 'static,
    {
        Self::from_kind(Kind::Lazy(Box::new(f)))
    }

    /// A sequence pulled one item per call.
    ///
    /// The function receives the template name and the negotiated language and returns
    /// the next item plus whether more items follow. Returning no item ends the sequence.
    pub fn sequence<F>(f: F) -> Self
    where
        F: FnMut(&str, &str) -> Result<(Option<Value>, bool), BoxError> + Send + 'static,
    {
        Self::from_kind(Kind::Sequence(Box::new(f)))
    }

    fn from_kind(kind: Kind) -> Self {
        Self { kind, metadata: None, headers: HeaderMap::new() }
    }

    /// Attaches metadata that is returned from every call, including the cheap first one.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Adds a response header written alongside this content.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Extra response headers supplied with the content.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::Empty)
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, Kind::Sequence(_))
    }

    /// Produces content for `template` in `language`.
    ///
    /// Metadata attached with [`Data::with_metadata`] takes precedence over metadata
    /// returned by a lazy function. A fixed value is handed out only once.
    pub fn content(&mut self, template: &str, language: &str, data_required: bool) -> Result<Content, BoxError> {
        match &mut self.kind {
            Kind::Empty => Ok(Content::new(None, self.metadata.clone(), false)),
            Kind::Fixed(value) => Ok(Content::new(value.take(), self.metadata.clone(), false)),
            Kind::Lazy(f) => {
                let (value, metadata) = f(template, language, data_required)?;
                Ok(Content::new(value, self.metadata.clone().or(metadata), false))
            }
            Kind::Sequence(_) if !data_required => Ok(Content::new(None, self.metadata.clone(), true)),
            Kind::Sequence(f) => {
                let (value, more) = f(template, language)?;
                Ok(Content::new(value, self.metadata.clone(), more))
            }
        }
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Empty => "Empty",
            Kind::Fixed(_) => "Fixed",
            Kind::Lazy(_) => "Lazy",
            Kind::Sequence(_) => "Sequence",
        };
        f.debug_struct("Data")
            .field("kind", &kind)
            .field("metadata", &self.metadata)
            .field("headers", &self.headers)
            .finish()
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Self::value(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Self::value(value)
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        Self::value(value)
    }
}

impl From<bytes::Bytes> for Data {
    fn from(value: bytes::Bytes) -> Self {
        Self::value(value)
    }
}

impl From<Option<Data>> for Data {
    fn from(data: Option<Data>) -> Self {
        data.unwrap_or_default()
    }
}
