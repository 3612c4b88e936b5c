use super::{NewlineWriter, Processor, unsupported};
use crate::data::{ContentStream, Value};
use crate::error::RenderError;
use crate::request::RequestHeaders;
use quick_xml::se::Serializer;
use serde::Serialize;
use std::io::Write;

/// Renders `application/xml`, `text/xml` and any `+xml` type.
///
/// Every item becomes one `item` element; a sequence is wrapped in a `root` element.
#[derive(Debug, Clone)]
pub struct Xml {
    root: String,
    item: String,
    indent: Option<usize>,
}

impl Xml {
    pub fn new() -> Self {
        Self { root: "items".to_owned(), item: "item".to_owned(), indent: None }
    }

    /// Element wrapping the items of a sequence.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Element holding a single item.
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = item.into();
        self
    }

    /// Indents nested elements by `spaces`.
    pub fn with_indent(mut self, spaces: usize) -> Self {
        self.indent = Some(spaces);
        self
    }

    fn to_element(&self, value: Value) -> Result<String, RenderError> {
        match value {
            Value::Model(model) => self.serialize(&model),
            Value::Text(text) => self.serialize(&text),
            other => unsupported("xml", &other),
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, RenderError> {
        let mut element = String::new();
        let mut ser = Serializer::with_root(&mut element, Some(self.item.as_str())).map_err(RenderError::encode)?;
        if let Some(spaces) = self.indent {
            ser.indent(' ', spaces);
        }
        value.serialize(ser).map_err(RenderError::encode)?;
        Ok(element)
    }
}

impl Default for Xml {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Xml {
    fn can_process(&self, media_type: &str, _language: &str) -> bool {
        matches!(media_type, "application/xml" | "text/xml") || media_type.ends_with("+xml")
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

        if stream.is_sequence() {
            write!(out, "<{}>", self.root)?;
            while let Some(item) = stream.next_item()? {
                if self.indent.is_some() {
                    out.write_all(b"\n")?;
                }
                out.write_all(self.to_element(item)?.as_bytes())?;
            }
            if self.indent.is_some() {
                out.write_all(b"\n")?;
            }
            write!(out, "</{}>", self.root)?;
        } else {
            let Some(item) = stream.next_item()? else {
                return Ok(());
            };
            out.write_all(self.to_element(item)?.as_bytes())?;
        }

        out.finish()?;
        Ok(())
    }
}
