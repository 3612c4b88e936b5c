//! Choosing the representation to send, and sending it.
//!
//! [`best_match`] is the pure negotiation algorithm: it pairs the client's accepted
//! media ranges and languages with the server's [`Offer`]s in three passes.
//!
//! 1. Exclusion: offers whose type the client refused with `q=0` are dropped.
//! 2. Exact: types must be equal with no wildcard on either side.
//! 3. Near: wildcards on either side match. When no accepted language fits, the offer
//!    is still served in its first language the client did not refuse.
//!
//! [`Negotiator`] wraps the algorithm with the request plumbing (`Accept`,
//! `Accept-Language`, `Accept-Charset`, ajax detection) and the rendering pipeline.

use crate::conditional::{self, Prepared};
use crate::data::ContentStream;
use crate::error::RenderError;
use crate::header::{ContentType, MediaRanges, PrecedenceValues, WILDCARD};
use crate::offer::{Match, Offer};
use crate::render::{self, Processor};
use crate::request::{RequestHeaders, ResponseSink};
use http::header::{ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, StatusCode};
use once_cell::sync::Lazy;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Set by browsers' `XMLHttpRequest` and most ajax libraries.
pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

static DEFAULT_PROCESSORS: Lazy<Vec<Arc<dyn Processor>>> = Lazy::new(render::default_processors);

/// Writes the response sent when no offer is acceptable.
pub type NotAcceptableHandler = Arc<dyn Fn(&mut dyn ResponseSink, &dyn RequestHeaders) + Send + Sync>;

/// The default not-acceptable response: `406` with a short plain text body.
pub fn not_acceptable(sink: &mut dyn ResponseSink, _req: &dyn RequestHeaders) {
    sink.set_status(StatusCode::NOT_ACCEPTABLE);
    sink.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=utf-8"));
    if let Err(e) = sink.body().write_all(b"Not Acceptable\n") {
        warn!(cause = %e, "failed to write not acceptable response");
    }
}

/// Negotiates and renders responses.
///
/// A negotiator holds configuration only and can be shared between requests.
#[derive(Clone)]
pub struct Negotiator {
    processors: Vec<Arc<dyn Processor>>,
    not_acceptable: NotAcceptableHandler,
    fallback_type: ContentType,
}

impl Negotiator {
    pub fn builder() -> NegotiatorBuilder {
        NegotiatorBuilder::new()
    }

    /// Picks the offer that best satisfies `req`, or `None` when nothing is acceptable.
    pub fn negotiate(&self, req: &dyn RequestHeaders, mut offers: Vec<Offer>) -> Option<Match> {
        let accepted = req.header(&ACCEPT).map(|h| MediaRanges::parse(&h)).unwrap_or_default().with_default();
        let languages =
            req.header(&ACCEPT_LANGUAGE).map(|h| PrecedenceValues::parse(&h)).unwrap_or_default().with_default();

        if req.header(&X_REQUESTED_WITH).is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest")) {
            offers.retain(|offer| {
                let content_type = offer.content_type();
                content_type.main_type() == "application" && content_type.subtype() == "json"
            });
        }

        let mut m = best_match(&accepted, &languages, offers, &self.fallback_type)?;

        if let Some(header) = req.header(&ACCEPT_CHARSET) {
            let charsets = PrecedenceValues::parse(&header);
            m.charset = charsets.iter().find(|c| c.quality() > 0.0).map(|c| c.value().to_owned()).unwrap_or_default();
            m.vary.push(ACCEPT_CHARSET);
        }

        debug!(
            content_type = %m.content_type,
            language = %m.language,
            charset = %m.charset,
            "negotiated representation"
        );
        Some(m)
    }

    /// Negotiates `offers` and renders the winner to `sink` with `status`.
    ///
    /// When nothing is acceptable the not-acceptable handler writes the response instead.
    pub fn render(
        &self,
        sink: &mut dyn ResponseSink,
        req: &dyn RequestHeaders,
        status: StatusCode,
        offers: Vec<Offer>,
    ) -> Result<(), RenderError> {
        match self.negotiate(req, offers) {
            Some(m) => self.render_match(sink, req, status, m),
            None => {
                debug!("no acceptable representation");
                (self.not_acceptable)(sink, req);
                Ok(())
            }
        }
    }

    /// Renders an already negotiated match.
    ///
    /// Headers are written first, then the conditional request step may answer `304`;
    /// otherwise `status` is set and the body is streamed through the processor.
    ///
    /// # Panics
    /// When the match has no processor and none of the registered ones can render its
    /// content type.
    pub fn render_match(
        &self,
        sink: &mut dyn ResponseSink,
        req: &dyn RequestHeaders,
        status: StatusCode,
        m: Match,
    ) -> Result<(), RenderError> {
        let transcoding = m.apply_headers(sink.headers_mut());
        let Match { content_type, language, mut data, template, processor, .. } = m;

        let headers = sink.headers_mut();
        for (name, value) in data.headers() {
            headers.append(name, value.clone());
        }

        let pending = match conditional::prepare(&mut data, &template, &language, req, sink.headers_mut())? {
            Prepared::NotModified => {
                sink.set_status(StatusCode::NOT_MODIFIED);
                return Ok(());
            }
            Prepared::Render(pending) => pending,
        };
        sink.set_status(status);

        if !data.is_sequence() && pending.as_ref().is_none_or(|content| content.value.is_none()) {
            debug!(content_type = %content_type, "no content to render");
            return Ok(());
        }

        let processor = processor.or_else(|| self.processor_for(&content_type, &language)).unwrap_or_else(|| {
            panic!("no processor can render {content_type}");
        });

        let mut stream = ContentStream::with_pending(&mut data, &template, &language, pending);
        render::write_body(processor.as_ref(), sink.body(), req, &mut stream, &template, &language, transcoding)
            .inspect_err(|e| error!(cause = %e, content_type = %content_type, "failed to render body"))
    }

    fn processor_for(&self, content_type: &ContentType, language: &str) -> Option<Arc<dyn Processor>> {
        let media_type = content_type.essence();
        self.processors.iter().find(|processor| processor.can_process(&media_type, language)).cloned()
    }

    pub fn fallback_type(&self) -> &ContentType {
        &self.fallback_type
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Negotiator")
            .field("processors", &self.processors)
            .field("fallback_type", &self.fallback_type.to_string())
            .finish_non_exhaustive()
    }
}

pub struct NegotiatorBuilder {
    processors: Vec<Arc<dyn Processor>>,
    not_acceptable: NotAcceptableHandler,
    fallback_type: ContentType,
}

impl NegotiatorBuilder {
    fn new() -> Self {
        Self {
            processors: vec![],
            not_acceptable: Arc::new(not_acceptable),
            fallback_type: ContentType::new("application", "octet-stream"),
        }
    }

    /// Registers a processor. Earlier registrations take precedence.
    pub fn processor<P: Processor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Registers the JSON, XML, CSV, text and binary processors after the current ones.
    pub fn with_default_processors(mut self) -> Self {
        self.processors.extend(DEFAULT_PROCESSORS.iter().cloned());
        self
    }

    pub fn not_acceptable<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut dyn ResponseSink, &dyn RequestHeaders) + Send + Sync + 'static,
    {
        self.not_acceptable = Arc::new(handler);
        self
    }

    /// The type sent when a wildcard is still unresolved after negotiation.
    pub fn fallback_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.fallback_type = content_type.into();
        self
    }

    /// Builds the negotiator; without any registered processor the defaults are used.
    pub fn build(self) -> Negotiator {
        let processors = if self.processors.is_empty() { DEFAULT_PROCESSORS.clone() } else { self.processors };
        Negotiator { processors, not_acceptable: self.not_acceptable, fallback_type: self.fallback_type }
    }
}

impl fmt::Debug for NegotiatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiatorBuilder").field("processors", &self.processors).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Exact,
    Near,
    // near type match, served in a language the client did not ask for
    Fallback,
}

struct Candidate {
    offer: usize,
    content_type: ContentType,
    offered_language: String,
    language: String,
}

/// Runs the negotiation passes over `offers`.
///
/// `accepted` and `languages` must already be in precedence order, as produced by
/// [`MediaRanges::parse`] and [`PrecedenceValues::parse`].
pub fn best_match(
    accepted: &MediaRanges,
    languages: &PrecedenceValues,
    mut offers: Vec<Offer>,
    fallback: &ContentType,
) -> Option<Match> {
    offers.retain(|offer| {
        let refused = is_type_refused(accepted, offer.content_type());
        if refused {
            trace!(content_type = %offer.content_type(), "offer excluded");
        }
        !refused
    });

    let candidate = [Pass::Exact, Pass::Near, Pass::Fallback].into_iter().find_map(|pass| {
        let found = find(accepted, languages, &offers, pass, fallback);
        trace!(?pass, found = found.is_some(), "negotiation pass");
        found
    })?;

    let offer = offers.swap_remove(candidate.offer);
    // the language depends on Accept-Language only if there was a choice or a stated preference
    let language_negotiated =
        offer.declared_languages().nth(1).is_some() || languages.iter().any(|language| !language.is_wildcard());
    let mut m = offer.into_match(candidate.content_type, &candidate.offered_language, candidate.language);

    m.vary.push(ACCEPT);
    if !m.language.is_empty() && language_negotiated {
        m.vary.push(ACCEPT_LANGUAGE);
    }
    Some(m)
}

fn find(
    accepted: &MediaRanges,
    languages: &PrecedenceValues,
    offers: &[Offer],
    pass: Pass,
    fallback: &ContentType,
) -> Option<Candidate> {
    for (index, offer) in offers.iter().enumerate() {
        for range in accepted.iter().filter(|range| range.quality() > 0.0) {
            let type_matches = match pass {
                Pass::Exact => offer.content_type().equals_exactly(range.content_type()),
                Pass::Near | Pass::Fallback => offer.content_type().equals_or_wildcard(range.content_type()),
            };
            if !type_matches {
                continue;
            }
            let content_type = offer.resolve_type(range.content_type(), fallback);
            if is_type_refused(accepted, &content_type) {
                trace!(%content_type, "resolved type refused");
                continue;
            }

            let language = match pass {
                Pass::Exact | Pass::Near => match_language(languages, offer),
                Pass::Fallback => offer
                    .declared_languages()
                    .find(|offered| !is_refused(languages, offered))
                    .map(|offered| (offered.to_owned(), resolve_language(offered, WILDCARD))),
            };
            if let Some((offered_language, language)) = language {
                return Some(Candidate { offer: index, content_type, offered_language, language });
            }
        }
    }
    None
}

fn is_type_refused(accepted: &MediaRanges, content_type: &ContentType) -> bool {
    accepted.iter().any(|range| range.quality() <= 0.0 && content_type.equals_exactly(range.content_type()))
}

fn match_language(languages: &PrecedenceValues, offer: &Offer) -> Option<(String, String)> {
    languages.iter().filter(|accepted| accepted.quality() > 0.0).find_map(|accepted| {
        offer
            .declared_languages()
            .find(|offered| language_matches(accepted.value(), offered) && !is_refused(languages, offered))
            .map(|offered| (offered.to_owned(), resolve_language(offered, accepted.value())))
    })
}

/// Either side is `*`, the tags are equal, or `accepted` is a subtag of `offered`
/// (`en-GB` is served by `en`).
fn language_matches(accepted: &str, offered: &str) -> bool {
    accepted == WILDCARD || offered == WILDCARD || accepted.eq_ignore_ascii_case(offered) || is_subtag(accepted, offered)
}

fn is_subtag(tag: &str, parent: &str) -> bool {
    tag.as_bytes().get(parent.len()) == Some(&b'-') && tag.get(..parent.len()).is_some_and(|p| p.eq_ignore_ascii_case(parent))
}

/// A wildcard offer takes the client's language; a wildcard on both sides means none.
fn resolve_language(offered: &str, accepted: &str) -> String {
    match (offered, accepted) {
        (WILDCARD, WILDCARD) => String::new(),
        (WILDCARD, accepted) => accepted.to_owned(),
        (offered, _) => offered.to_owned(),
    }
}

/// `q=0` on the tag or a parent refuses it. `*;q=0` refuses whatever is not
/// explicitly accepted.
fn is_refused(languages: &PrecedenceValues, offered: &str) -> bool {
    let mut wildcard_refused = false;
    let mut explicitly_accepted = false;
    for language in languages.iter() {
        let refused = language.quality() <= 0.0;
        if language.is_wildcard() {
            wildcard_refused |= refused;
        } else if refused {
            if language.value().eq_ignore_ascii_case(offered) || is_subtag(offered, language.value()) {
                return true;
            }
        } else if language_matches(language.value(), offered) {
            explicitly_accepted = true;
        }
    }
    wildcard_refused && !explicitly_accepted
}
