use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Write};

type WriteFn = Box<dyn FnOnce(&mut dyn Write) -> io::Result<()> + Send>;

/// One item of content handed to a processor.
///
/// Each processor accepts a subset of these shapes. Handing a processor a shape it
/// cannot encode is a programming error and panics.
pub enum Value {
    /// Text, or the rendering of any `Display` type.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// A structured model for the JSON, XML and CSV processors.
    Model(serde_json::Value),
    /// A readable stream copied through unmodified.
    Reader(Box<dyn Read + Send>),
    /// A callback that writes its own bytes.
    Writer(WriteFn),
}

impl Value {
    /// Captures any serializable value as a structured model.
    pub fn model<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::Model)
    }

    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Value::Text(value.to_string())
    }

    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Value::Reader(Box::new(reader))
    }

    pub fn writer<F>(f: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
    {
        Value::Writer(Box::new(f))
    }

    /// Short name of the shape, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Model(_) => "model",
            Value::Reader(_) => "reader",
            Value::Writer(_) => "writer",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Value::Model(model) => f.debug_tuple("Model").field(model).finish(),
            Value::Reader(_) => f.write_str("Reader(..)"),
            Value::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for Value {
    fn from(value: &'static [u8]) -> Self {
        Value::Bytes(Bytes::from_static(value))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Model(value)
    }
}
