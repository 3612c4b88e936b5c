use super::{Content, Data, Value};
use crate::error::RenderError;
use tracing::error;

/// Pull-based view of a [`Data`] used by processors while writing a body.
///
/// An item already fetched by the conditional request step is yielded first; after that
/// every [`next_item`](ContentStream::next_item) call asks the supplier for data.
#[derive(Debug)]
pub struct ContentStream<'a> {
    data: &'a mut Data,
    template: &'a str,
    language: &'a str,
    pending: Option<Content>,
    done: bool,
}

impl<'a> ContentStream<'a> {
    pub fn new(data: &'a mut Data, template: &'a str, language: &'a str) -> Self {
        Self::with_pending(data, template, language, None)
    }

    pub(crate) fn with_pending(data: &'a mut Data, template: &'a str, language: &'a str, pending: Option<Content>) -> Self {
        let done = data.is_empty() && pending.is_none();
        Self { data, template, language, pending, done }
    }

    /// Whether the content is a sequence that needs framing.
    pub fn is_sequence(&self) -> bool {
        self.data.is_sequence()
    }

    /// Returns the next item, or `None` once the content is exhausted.
    ///
    /// A single value yields one item. A sequence yields items until the supplier
    /// clears its `more` flag or returns no item.
    pub fn next_item(&mut self) -> Result<Option<Value>, RenderError> {
        if self.done {
            return Ok(None);
        }

        let (template, language) = (self.template, self.language);
        let content = match self.pending.take() {
            Some(content) => content,
            None => self.data.content(template, language, true).map_err(|e| {
                error!(cause = %e, template, language, "content supplier failed");
                RenderError::supplier(e)
            })?,
        };

        if !content.more || content.value.is_none() || !self.data.is_sequence() {
            self.done = true;
        }
        Ok(content.value)
    }
}
