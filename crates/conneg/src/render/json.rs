use super::{NewlineWriter, Processor, unsupported};
use crate::data::{ContentStream, Value};
use crate::error::RenderError;
use crate::request::RequestHeaders;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::Write;

/// Renders `application/json` and any `+json` type.
///
/// A sequence is written as one JSON array; text items become JSON strings.
#[derive(Debug, Clone, Default)]
pub struct Json {
    indent: Option<String>,
}

impl Json {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty prints with `indent` as the indentation unit.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    fn write_value<W: Write>(&self, w: W, value: Value) -> Result<(), RenderError> {
        match value {
            Value::Model(model) => self.serialize(w, &model),
            Value::Text(text) => self.serialize(w, &text),
            other => unsupported("json", &other),
        }
    }

    fn serialize<W: Write, T: Serialize + ?Sized>(&self, w: W, value: &T) -> Result<(), RenderError> {
        match &self.indent {
            Some(indent) => {
                let mut ser = serde_json::Serializer::with_formatter(w, PrettyFormatter::with_indent(indent.as_bytes()));
                value.serialize(&mut ser)?;
            }
            None => serde_json::to_writer(w, value)?,
        }
        Ok(())
    }
}

impl Processor for Json {
    fn can_process(&self, media_type: &str, _language: &str) -> bool {
        media_type == "application/json" || media_type.ends_with("+json")
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
            out.write_all(b"[")?;
            let mut first = true;
            while let Some(item) = stream.next_item()? {
                if !first {
                    out.write_all(b",")?;
                }
                first = false;
                self.write_value(&mut out, item)?;
            }
            out.write_all(b"]")?;
        } else {
            let Some(item) = stream.next_item()? else {
                return Ok(());
            };
            self.write_value(&mut out, item)?;
        }

        out.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Data;
    use http::Request;
    use serde_json::json;

    fn render(json: &Json, mut data: Data) -> String {
        let req = Request::new(());
        let mut stream = ContentStream::new(&mut data, "", "");
        let mut out = Vec::new();
        json.process(&mut out, &req, &mut stream, "", "").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_can_process() {
        let json = Json::new();
        assert!(json.can_process("application/json", ""));
        assert!(json.can_process("application/problem+json", "en"));
        assert!(!json.can_process("application/xml", ""));
    }

    #[test]
    fn test_single_model() {
        let out = render(&Json::new(), Data::value(json!({"name": "tom", "age": 7})));
        assert_eq!(out, "{\"name\":\"tom\",\"age\":7}\n");
    }

    #[test]
    fn test_text_is_a_json_string() {
        assert_eq!(render(&Json::new(), Data::value("say \"hi\"")), "\"say \\\"hi\\\"\"\n");
    }

    #[test]
    fn test_sequence_is_an_array() {
        let mut n = 0;
        let data = Data::sequence(move |_, _| {
            n += 1;
            Ok((Some(Value::from(json!({"n": n}))), n < 3))
        });
        assert_eq!(render(&Json::new(), data), "[{\"n\":1},{\"n\":2},{\"n\":3}]\n");
    }

    #[test]
    fn test_empty_sequence() {
        let data = Data::sequence(|_, _| Ok((None, false)));
        assert_eq!(render(&Json::new(), data), "[]\n");
    }

    #[test]
    fn test_indent() {
        let out = render(&Json::new().with_indent("  "), Data::value(json!({"a": [1]})));
        assert_eq!(out, "{\n  \"a\": [\n    1\n  ]\n}\n");
    }

    #[test]
    #[should_panic(expected = "json processor cannot render bytes content")]
    fn test_bytes_are_unsupported() {
        render(&Json::new(), Data::from(bytes::Bytes::from_static(b"raw")));
    }
}
