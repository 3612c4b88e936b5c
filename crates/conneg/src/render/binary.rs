use super::{Processor, unsupported};
use crate::data::{ContentStream, Value};
use crate::error::RenderError;
use crate::header::ContentType;
use crate::request::RequestHeaders;
use std::io::{self, Write};

/// Copies bytes, readers and writer callbacks through unmodified.
///
/// No trailing newline is added.
#[derive(Debug, Clone)]
pub struct Binary {
    content_types: Vec<ContentType>,
}

impl Binary {
    /// Accepts `application/octet-stream`.
    pub fn new() -> Self {
        Self { content_types: vec![ContentType::new("application", "octet-stream")] }
    }

    /// Also accepts `content_type`, which may contain wildcards such as `image/*`.
    pub fn with_content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.content_types.push(content_type.into());
        self
    }
}

impl Default for Binary {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Binary {
    fn can_process(&self, media_type: &str, _language: &str) -> bool {
        let media_type = ContentType::parse(media_type);
        self.content_types.iter().any(|accepted| accepted.equals_or_wildcard(&media_type))
    }

    fn process(
        &self,
        w: &mut dyn Write,
        _req: &dyn RequestHeaders,
        stream: &mut ContentStream<'_>,
        _template: &str,
        _language: &str,
    ) -> Result<(), RenderError> {
        while let Some(item) = stream.next_item()? {
            match item {
                Value::Bytes(bytes) => w.write_all(&bytes)?,
                Value::Reader(mut reader) => {
                    io::copy(&mut reader, w)?;
                }
                Value::Writer(f) => f(&mut *w)?,
                other => unsupported("binary", &other),
            }
        }
        w.flush()?;
        Ok(())
    }
}
