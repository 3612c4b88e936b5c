//! Candidate representations and the resolved outcome of negotiation.
//!
//! An [`Offer`] describes something the server is able to send: a content type (which
//! may contain wildcards), the languages it is available in, the [`Data`] bound to each
//! language and optionally the [`Processor`] that renders it. Negotiation turns one
//! offer into a [`Match`], in which every wildcard has been resolved.

use crate::data::Data;
use crate::header::{ContentType, WILDCARD};
use crate::render::Processor;
use http::HeaderName;
use std::sync::Arc;
use tracing::warn;

/// A candidate representation.
///
/// Offers are built by value: every builder method consumes the offer and returns the
/// modified one.
#[derive(Debug)]
pub struct Offer {
    content_type: ContentType,
    // declared language and the index of its data in `data`
    languages: Vec<(String, usize)>,
    data: Vec<Data>,
    template: String,
    processor: Option<Arc<dyn Processor>>,
}

impl Offer {
    /// Creates an offer available in any language (`*`) with no data yet.
    pub fn new(content_type: impl Into<ContentType>) -> Self {
        Self {
            content_type: content_type.into(),
            languages: vec![(WILDCARD.to_owned(), 0)],
            data: vec![Data::empty()],
            template: String::new(),
            processor: None,
        }
    }

    /// Binds `data` to each of `languages`; no languages means the wildcard `*`.
    ///
    /// Passing [`Data::empty()`] still declares the languages, so they take part in
    /// language negotiation before any value exists. Declaring a concrete language drops
    /// the wildcard; `*` can only ever be the sole language of an offer.
    pub fn with(mut self, data: impl Into<Data>, languages: &[&str]) -> Self {
        let index = self.data.len();
        self.data.push(data.into());

        if languages.is_empty() {
            self.declare(WILDCARD, index);
        }
        for language in languages {
            self.declare(language.trim(), index);
        }
        self
    }

    /// Declares languages without binding a value to them.
    pub fn languages(self, languages: &[&str]) -> Self {
        self.with(Data::empty(), languages)
    }

    fn declare(&mut self, language: &str, index: usize) {
        if language == WILDCARD {
            if self.languages.iter().any(|(declared, _)| declared != WILDCARD) {
                warn!(content_type = %self.content_type, "ignoring wildcard language on an offer with concrete languages");
                return;
            }
        } else {
            self.languages.retain(|(declared, _)| declared != WILDCARD);
        }

        match self.languages.iter_mut().find(|(declared, _)| declared.eq_ignore_ascii_case(language)) {
            Some(entry) => entry.1 = index,
            None => self.languages.push((language.to_owned(), index)),
        }
    }

    /// Names the template handed to the supplier and the processor.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Renders this offer with `processor` instead of picking one from the negotiator.
    pub fn processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// The declared languages, in declaration order.
    pub fn declared_languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|(language, _)| language.as_str())
    }

    pub fn template_name(&self) -> &str {
        &self.template
    }

    /// Resolves the offered content type against an accepted media range.
    ///
    /// Wildcards on the offer take the client's value. A `text/*` left over becomes
    /// `text/plain`; any other leftover wildcard becomes `fallback`.
    pub fn resolve_type(&self, accepted: &ContentType, fallback: &ContentType) -> ContentType {
        let offered = &self.content_type;
        let main_type = if offered.is_main_type_wildcard() { accepted.main_type() } else { offered.main_type() };
        let subtype = if offered.is_subtype_wildcard() { accepted.subtype() } else { offered.subtype() };

        match (main_type, subtype) {
            (WILDCARD, _) => fallback.clone(),
            ("text", WILDCARD) => ContentType::new("text", "plain"),
            (_, WILDCARD) => fallback.clone(),
            _ => ContentType::new(main_type, subtype).with_params(offered.params()),
        }
    }

    /// Consumes the offer, keeping the data bound to `offered_language`.
    pub(crate) fn into_match(mut self, content_type: ContentType, offered_language: &str, language: String) -> Match {
        let data = self
            .languages
            .iter()
            .find(|(declared, _)| declared == offered_language)
            .map(|&(_, index)| std::mem::take(&mut self.data[index]))
            .unwrap_or_default();

        Match {
            content_type,
            language,
            charset: String::new(),
            vary: vec![],
            data,
            template: self.template,
            processor: self.processor,
        }
    }
}

/// The single offer chosen by negotiation, with no wildcard left.
///
/// A match is created for one request and consumed by rendering.
#[derive(Debug)]
pub struct Match {
    pub(crate) content_type: ContentType,
    pub(crate) language: String,
    pub(crate) charset: String,
    pub(crate) vary: Vec<HeaderName>,
    pub(crate) data: Data,
    pub(crate) template: String,
    pub(crate) processor: Option<Arc<dyn Processor>>,
}

impl Match {
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// The negotiated language, empty when no concrete language applies.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The charset from `Accept-Charset`, empty when the header was absent.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Request headers that influenced the decision, for the `Vary` header.
    pub fn vary(&self) -> &[HeaderName] {
        &self.vary
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Data {
        &mut self.data
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn processor(&self) -> Option<&Arc<dyn Processor>> {
        self.processor.as_ref()
    }
}
