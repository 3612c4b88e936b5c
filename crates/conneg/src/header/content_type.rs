use super::{WILDCARD, split_param};
use std::fmt;

/// A `type/subtype` pair with its ordered parameters, e.g. `text/html;level=1`.
///
/// Both halves may be the wildcard `*`. Everything is lowercased on construction so
/// comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    main_type: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    pub fn new(main_type: impl AsRef<str>, subtype: impl AsRef<str>) -> Self {
        Self {
            main_type: main_type.as_ref().trim().to_ascii_lowercase(),
            subtype: subtype.as_ref().trim().to_ascii_lowercase(),
            params: vec![],
        }
    }

    /// `*/*`, matching any content type.
    pub fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Parses `type/subtype;key=value;...`.
    ///
    /// A bare `*` is read as `*/*` and a missing subtype as `*`. Any `q` parameter is
    /// kept as a plain parameter; use [`MediaRange`](super::MediaRange) for `Accept`
    /// entries.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(';');
        let mut content_type = Self::parse_essence(parts.next().unwrap_or_default());
        content_type.params = parts.filter_map(split_param).collect();
        content_type
    }

    pub(crate) fn parse_essence(essence: &str) -> Self {
        match essence.trim().split_once('/') {
            Some((main_type, subtype)) if !subtype.trim().is_empty() => Self::new(main_type, subtype),
            Some((main_type, _)) => Self::new(main_type, WILDCARD),
            None if essence.trim().is_empty() => Self::wildcard(),
            None => Self::new(essence, WILDCARD),
        }
    }

    /// Appends a parameter, returning the modified content type.
    pub fn with_param(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.params.push((key.as_ref().to_ascii_lowercase(), value.as_ref().to_ascii_lowercase()));
        self
    }

    pub(crate) fn with_params(mut self, params: &[(String, String)]) -> Self {
        self.params = params.to_vec();
        self
    }

    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.subtype)
    }

    pub fn is_main_type_wildcard(&self) -> bool {
        self.main_type == WILDCARD
    }

    pub fn is_subtype_wildcard(&self) -> bool {
        self.subtype == WILDCARD
    }

    /// True when neither half is a wildcard.
    pub fn is_concrete(&self) -> bool {
        !self.is_main_type_wildcard() && !self.is_subtype_wildcard()
    }

    /// Equal type and subtype, with no wildcard on either side. Parameters are ignored.
    pub fn equals_exactly(&self, other: &ContentType) -> bool {
        self.is_concrete() && self.main_type == other.main_type && self.subtype == other.subtype
    }

    /// Equal type and subtype where a wildcard on either side matches anything.
    pub fn equals_or_wildcard(&self, other: &ContentType) -> bool {
        fn half(a: &str, b: &str) -> bool {
            a == b || a == WILDCARD || b == WILDCARD
        }
        half(&self.main_type, &other.main_type) && half(&self.subtype, &other.subtype)
    }

    /// Whether the type carries text and therefore a `charset` parameter.
    ///
    /// That is any `text/*`, `application/json`, `application/xml`, or any type whose
    /// subtype has a `+json` or `+xml` suffix (e.g. `image/svg+xml`).
    pub fn is_textual(&self) -> bool {
        self.main_type == "text"
            || (self.main_type == "application" && matches!(self.subtype.as_str(), "json" | "xml"))
            || self.subtype.ends_with("+json")
            || self.subtype.ends_with("+xml")
    }

    /// Converts into a [`mime::Mime`], if the text is a valid media type.
    pub fn to_mime(&self) -> Option<mime::Mime> {
        self.to_string().parse().ok()
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::wildcard()
    }
}

impl From<&str> for ContentType {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<&mime::Mime> for ContentType {
    fn from(mime: &mime::Mime) -> Self {
        Self::parse(mime.as_ref())
    }
}

impl From<mime::Mime> for ContentType {
    fn from(mime: mime::Mime) -> Self {
        Self::from(&mime)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.subtype)?;
        for (key, value) in &self.params {
            write!(f, ";{key}={value}")?;
        }
        Ok(())
    }
}
