use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Separator between the kind name and its version.
pub const VERSION_SEPARATOR: char = '/';

/// Version reported for kinds that carry no explicit version.
pub const DEFAULT_VERSION: &str = "v1";

/// A parsed `kind[/version]` string.
///
/// The combined string (see [`TypeName::as_str`]) is the key every registry
/// uses for lookups. Splitting happens on the *last* separator, so a name may
/// itself contain slashes (`acme.org/blob/v2` has name `acme.org/blob`). A
/// separator with nothing on one side does not split: `/v1` and `demo/` are
/// unversioned names.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    full: String,
    split: Option<usize>,
}

impl TypeName {
    /// Build a type name from a name and an optional version.
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Result<Self, TypeError> {
        let name = name.into();
        match version {
            Some(v) if !v.is_empty() => Self::parse(&format!("{name}{VERSION_SEPARATOR}{v}")),
            _ => Self::parse(&name),
        }
    }

    /// Parse a combined `kind[/version]` string. Any non-empty string is a
    /// valid kind.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::EmptyKind);
        }
        let split = s
            .rfind(VERSION_SEPARATOR)
            .filter(|&i| i > 0 && i + 1 < s.len());
        Ok(Self {
            full: s.to_string(),
            split,
        })
    }

    /// The combined string, exactly as parsed.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The kind name without its version.
    pub fn name(&self) -> &str {
        match self.split {
            Some(i) => &self.full[..i],
            None => &self.full,
        }
    }

    /// The explicit version, if any.
    pub fn version(&self) -> Option<&str> {
        self.split.map(|i| &self.full[i + 1..])
    }

    /// The version, falling back to [`DEFAULT_VERSION`].
    pub fn version_or_default(&self) -> &str {
        self.version().unwrap_or(DEFAULT_VERSION)
    }

    /// Returns `true` if the kind carries an explicit version.
    pub fn is_versioned(&self) -> bool {
        self.split.is_some()
    }
}

impl FromStr for TypeName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.full)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl Serialize for TypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
