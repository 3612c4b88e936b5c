use super::{WILDCARD, format_quality, parse_quality, split_list, split_param};
use std::fmt;
use std::ops::Deref;

/// A weighted token from `Accept-Language` or `Accept-Charset`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceValue {
    value: String,
    quality: f64,
}

impl PrecedenceValue {
    pub fn new(value: impl AsRef<str>, quality: f64) -> Self {
        Self { value: value.as_ref().trim().to_ascii_lowercase(), quality: quality.clamp(0.0, 1.0) }
    }

    fn parse(text: &str) -> Self {
        let mut parts = text.split(';');
        let value = parts.next().unwrap_or_default();
        let quality = parts
            .filter_map(split_param)
            .find(|(key, _)| key == "q")
            .map_or(1.0, |(_, q)| parse_quality(&q));
        Self::new(value, quality)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn is_wildcard(&self) -> bool {
        self.value == WILDCARD
    }
}

impl fmt::Display for PrecedenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)?;
        if self.quality < 1.0 {
            write!(f, ";q={}", format_quality(self.quality))?;
        }
        Ok(())
    }
}

/// A parsed `Accept-Language` or `Accept-Charset` header, highest quality first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrecedenceValues(Vec<PrecedenceValue>);

impl PrecedenceValues {
    /// Parses and sorts a header by descending quality.
    ///
    /// Values of equal quality keep their listed order; the first listed wins ties
    /// all the way through negotiation.
    pub fn parse(header: &str) -> Self {
        let mut values: Vec<PrecedenceValue> = split_list(header).map(PrecedenceValue::parse).collect();
        values.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(std::cmp::Ordering::Equal));
        Self(values)
    }

    /// Replaces an empty list with `*`, accepting any value.
    pub fn with_default(self) -> Self {
        if self.0.is_empty() { Self(vec![PrecedenceValue::new(WILDCARD, 1.0)]) } else { self }
    }

    pub fn into_inner(self) -> Vec<PrecedenceValue> {
        self.0
    }
}

impl Deref for PrecedenceValues {
    type Target = [PrecedenceValue];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<PrecedenceValue>> for PrecedenceValues {
    fn from(values: Vec<PrecedenceValue>) -> Self {
        Self(values)
    }
}

impl<'a> IntoIterator for &'a PrecedenceValues {
    type Item = &'a PrecedenceValue;
    type IntoIter = std::slice::Iter<'a, PrecedenceValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PrecedenceValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}
