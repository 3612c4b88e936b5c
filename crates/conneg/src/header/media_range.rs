use super::{ContentType, format_quality, parse_quality, split_list, split_param};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// One element of an `Accept` header.
///
/// Parameters before the first `q=` belong to the content type; parameters after it
/// are accept-extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    content_type: ContentType,
    quality: f64,
    extensions: Vec<(String, String)>,
}

impl MediaRange {
    pub fn new(content_type: ContentType, quality: f64) -> Self {
        Self { content_type, quality: quality.clamp(0.0, 1.0), extensions: vec![] }
    }

    /// Parses a single `type/subtype;params;q=x;extensions` element.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(';');
        let mut content_type = ContentType::parse_essence(parts.next().unwrap_or_default());

        let mut quality = 1.0;
        let mut params = vec![];
        let mut extensions = vec![];
        let mut seen_quality = false;

        for (key, value) in parts.filter_map(split_param) {
            if seen_quality {
                extensions.push((key, value));
            } else if key == "q" {
                quality = parse_quality(&value);
                seen_quality = true;
            } else {
                params.push((key, value));
            }
        }

        content_type = content_type.with_params(&params);
        Self { content_type, quality, extensions }
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn extensions(&self) -> &[(String, String)] {
        &self.extensions
    }

    /// Orders by quality, then by specificity: no type wildcard beats a type wildcard,
    /// no subtype wildcard beats a subtype wildcard, and more parameters beat fewer.
    ///
    /// `Greater` means `self` takes precedence over `other`.
    pub fn precedence_cmp(&self, other: &MediaRange) -> Ordering {
        self.quality
            .partial_cmp(&other.quality)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.specificity().cmp(&other.specificity()))
    }

    fn specificity(&self) -> (bool, bool, usize) {
        let ct = &self.content_type;
        (!ct.is_main_type_wildcard(), !ct.is_subtype_wildcard(), ct.params().len())
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content_type)?;
        if self.quality < 1.0 || !self.extensions.is_empty() {
            write!(f, ";q={}", format_quality(self.quality))?;
        }
        for (key, value) in &self.extensions {
            write!(f, ";{key}={value}")?;
        }
        Ok(())
    }
}

/// A parsed `Accept` header, highest precedence first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaRanges(Vec<MediaRange>);

impl MediaRanges {
    /// Parses and sorts an `Accept` header.
    ///
    /// The sort is stable, so ranges of equal precedence keep the order in which the
    /// client listed them.
    pub fn parse(header: &str) -> Self {
        let mut ranges: Vec<MediaRange> = split_list(header).map(MediaRange::parse).collect();
        ranges.sort_by(|a, b| b.precedence_cmp(a));
        Self(ranges)
    }

    /// Replaces an empty list with `*/*`: a missing `Accept` header accepts anything.
    pub fn with_default(self) -> Self {
        if self.0.is_empty() { Self(vec![MediaRange::new(ContentType::wildcard(), 1.0)]) } else { self }
    }

    pub fn into_inner(self) -> Vec<MediaRange> {
        self.0
    }
}

impl Deref for MediaRanges {
    type Target = [MediaRange];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<MediaRange>> for MediaRanges {
    fn from(ranges: Vec<MediaRange>) -> Self {
        Self(ranges)
    }
}

impl<'a> IntoIterator for &'a MediaRanges {
    type Item = &'a MediaRange;
    type IntoIter = std::slice::Iter<'a, MediaRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for MediaRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}
