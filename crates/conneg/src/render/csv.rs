use super::{NewlineWriter, Processor, unsupported};
use crate::data::{ContentStream, Value};
use crate::error::RenderError;
use crate::request::RequestHeaders;
use serde_json::Value as Model;
use std::io::Write;

/// Renders `text/csv`.
///
/// Each item is written as one or more rows, depending on its shape:
/// - a scalar or text: one single-field row
/// - an array of scalars, or an object: one row
/// - an array of arrays or objects: one row per element
#[derive(Debug, Clone)]
pub struct Csv {
    delimiter: u8,
}

/// The encodable shapes of one CSV item.
#[derive(Debug, PartialEq)]
enum Shape {
    Scalar(String),
    Row(Vec<String>),
    Rows(Vec<Vec<String>>),
}

impl Shape {
    fn of(model: &Model) -> Self {
        match model {
            Model::Array(items) if items.iter().all(|item| item.is_array() || item.is_object()) => {
                Shape::Rows(items.iter().map(row).collect())
            }
            Model::Array(_) | Model::Object(_) => Shape::Row(row(model)),
            Model::Null => Shape::Rows(vec![]),
            scalar => Shape::Scalar(field(scalar)),
        }
    }
}

fn row(model: &Model) -> Vec<String> {
    match model {
        Model::Array(items) => items.iter().map(field).collect(),
        Model::Object(fields) => fields.values().map(field).collect(),
        scalar => vec![field(scalar)],
    }
}

fn field(model: &Model) -> String {
    match model {
        Model::String(s) => s.clone(),
        Model::Null => String::new(),
        Model::Bool(b) => b.to_string(),
        Model::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

impl Csv {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for Csv {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Csv {
    fn can_process(&self, media_type: &str, _language: &str) -> bool {
        media_type == "text/csv"
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
        {
            let mut writer = ::csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .flexible(true)
                .terminator(::csv::Terminator::Any(b'\n'))
                .from_writer(&mut out);

            while let Some(item) = stream.next_item()? {
                let shape = match item {
                    Value::Model(model) => Shape::of(&model),
                    Value::Text(text) => Shape::Scalar(text),
                    other => unsupported("csv", &other),
                };
                match shape {
                    Shape::Scalar(value) => writer.write_record([value])?,
                    Shape::Row(fields) => writer.write_record(&fields)?,
                    Shape::Rows(rows) => {
                        for fields in &rows {
                            writer.write_record(fields)?;
                        }
                    }
                }
            }
            writer.flush()?;
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

    fn render(csv: &Csv, mut data: Data) -> String {
        let req = Request::new(());
        let mut stream = ContentStream::new(&mut data, "", "");
        let mut out = Vec::new();
        csv.process(&mut out, &req, &mut stream, "", "").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Shape::of(&json!(42)), Shape::Scalar("42".to_owned()));
        assert_eq!(Shape::of(&json!(["a", 1, null])), Shape::Row(vec!["a".into(), "1".into(), String::new()]));
        assert_eq!(Shape::of(&json!({"x": true, "y": "z"})), Shape::Row(vec!["true".into(), "z".into()]));
        assert_eq!(
            Shape::of(&json!([["a", "b"], {"c": 1}])),
            Shape::Rows(vec![vec!["a".into(), "b".into()], vec!["1".into()]])
        );
        assert_eq!(Shape::of(&json!([])), Shape::Rows(vec![]));
        assert_eq!(Shape::of(&json!(null)), Shape::Rows(vec![]));
    }

    #[test]
    fn test_nested_field_is_compact_json() {
        assert_eq!(Shape::of(&json!([{"a": [1, 2]}])), Shape::Rows(vec![vec!["[1,2]".into()]]));
    }

    #[test]
    fn test_rows() {
        let out = render(&Csv::new(), Data::value(json!([["name", "age"], ["tom", 7], ["ann, jr", 9]])));
        assert_eq!(out, "name,age\ntom,7\n\"ann, jr\",9\n");
    }

    #[test]
    fn test_sequence_of_records() {
        let mut n = 0;
        let data = Data::sequence(move |_, _| {
            n += 1;
            Ok((Some(Value::from(json!({"id": n, "even": n % 2 == 0}))), n < 2))
        });
        assert_eq!(render(&Csv::new().with_delimiter(b';'), data), "1;false\n2;true\n");
    }

    #[test]
    fn test_empty_output_still_ends_with_newline() {
        let data = Data::sequence(|_, _| Ok((None, false)));
        assert_eq!(render(&Csv::new(), data), "\n");
        assert_eq!(render(&Csv::new(), Data::value(json!(null))), "\n");
    }

    #[test]
    fn test_text_scalar() {
        assert_eq!(render(&Csv::new(), Data::value("hello")), "hello\n");
    }

    #[test]
    #[should_panic(expected = "csv processor cannot render bytes content")]
    fn test_bytes_are_unsupported() {
        render(&Csv::new(), Data::value(vec![1u8, 2, 3]));
    }
}
