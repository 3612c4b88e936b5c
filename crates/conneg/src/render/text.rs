use super::{NewlineWriter, Processor, unsupported};
use crate::data::{ContentStream, Value};
use crate::error::RenderError;
use crate::request::RequestHeaders;
use serde_json::Value as Model;
use std::io::{self, Write};

/// Renders any `text/*` type by concatenating the items.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Processor for Text {
    fn can_process(&self, media_type: &str, _language: &str) -> bool {
        media_type.starts_with("text/")
    }

    fn process(
        &self,
        w: &mut dyn Write,
        _req: &dyn RequestHeaders,
        stream: &mut ContentStream<'_>,
        _template: &str,
        _language: &str,
    ) -> Result<(), RenderError> {
        let mut out = NewlineWriter::new(w);
        while let Some(item) = stream.next_item()? {
            match item {
                Value::Text(text) => out.write_all(text.as_bytes())?,
                Value::Bytes(bytes) => out.write_all(&bytes)?,
                Value::Model(Model::String(s)) => out.write_all(s.as_bytes())?,
                Value::Model(Model::Null) => {}
                Value::Model(scalar @ (Model::Bool(_) | Model::Number(_))) => write!(out, "{scalar}")?,
                Value::Reader(mut reader) => {
                    io::copy(&mut reader, &mut out)?;
                }
                Value::Writer(f) => f(&mut out)?,
                other @ Value::Model(_) => unsupported("text", &other),
            }
        }
        out.finish()?;
        Ok(())
    }
}
