use super::{WILDCARD, split_list};
use std::fmt;
use std::ops::Deref;

/// An entity tag as found in `ETag`, `If-Match` and `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETag {
    hash: String,
    weak: bool,
}

impl ETag {
    pub fn strong(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), weak: false }
    }

    pub fn weak(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), weak: true }
    }

    /// The `*` tag that matches any current representation.
    pub fn wildcard() -> Self {
        Self::strong(WILDCARD)
    }

    fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.strip_prefix("W/") {
            Some(rest) => Self::weak(rest.trim().trim_matches('"')),
            None => Self::strong(text.trim_matches('"')),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn is_wildcard(&self) -> bool {
        self.hash == WILDCARD
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard() {
            f.write_str(WILDCARD)
        } else if self.weak {
            write!(f, "W/\"{}\"", self.hash)
        } else {
            write!(f, "\"{}\"", self.hash)
        }
    }
}

/// The list of entity tags of a conditional request header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ETags(Vec<ETag>);

impl ETags {
    /// Parses an `If-None-Match` / `If-Match` header. A lone `*` yields the single
    /// wildcard tag.
    pub fn parse(header: &str) -> Self {
        if header.trim() == WILDCARD {
            return Self(vec![ETag::wildcard()]);
        }
        Self(split_list(header).map(ETag::parse).filter(|tag| !tag.hash.is_empty()).collect())
    }

    /// Weak comparison (RFC 7232 §2.3.2): the weak flag is ignored.
    pub fn weakly_matches(&self, hash: &str) -> bool {
        self.0.iter().any(|tag| tag.is_wildcard() || tag.hash == hash)
    }

    /// Strong comparison against a strong validator: weak tags never match.
    pub fn strongly_matches(&self, hash: &str) -> bool {
        self.0.iter().any(|tag| tag.is_wildcard() || (!tag.weak && tag.hash == hash))
    }
}

impl Deref for ETags {
    type Target = [ETag];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
