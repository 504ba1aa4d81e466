//! Path model: storage locations, normalized roots and root-relative identifiers
//!
//! Locations are plain strings with `/` as the separator so that the same
//! engine can run against any storage backend. Roots always end with a
//! separator, which makes `root + relative_id` an exact reconstruction of the
//! entry's location.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};

/// Separator used in every location and relative identifier
pub const SEPARATOR: char = '/';

/// A location understood by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Create a location, normalizing platform separators
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        if cfg!(windows) {
            Self(location.replace('\\', "/"))
        } else {
            Self(location)
        }
    }

    /// Create a location from a filesystem path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(path.as_ref().to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The location as a filesystem path
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    /// Whether the location names a directory explicitly (trailing separator)
    pub fn has_trailing_separator(&self) -> bool {
        self.0.ends_with(SEPARATOR)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for Location {
    fn from(value: &Path) -> Self {
        Self::from_path(value)
    }
}

impl From<PathBuf> for Location {
    fn from(value: PathBuf) -> Self {
        Self::from_path(value)
    }
}

impl From<&PathBuf> for Location {
    fn from(value: &PathBuf) -> Self {
        Self::from_path(value)
    }
}

/// Base location of a directory tree, always terminated by a separator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Location", into = "Location")]
pub struct Root(Location);

impl Root {
    /// Normalize a location into a root by appending a trailing separator.
    ///
    /// An empty location denotes the current directory.
    pub fn new(location: impl Into<Location>) -> Self {
        let location = location.into();
        let mut raw = location.0;
        if raw.is_empty() {
            raw.push('.');
        }
        if !raw.ends_with(SEPARATOR) {
            raw.push(SEPARATOR);
        }
        Self(Location(raw))
    }

    pub fn location(&self) -> &Location {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Location of the entry identified by `id` beneath this root
    pub fn resolve(&self, id: &RelativeId) -> Location {
        Location(format!("{}{}", self.0 .0, id.0))
    }

    /// Identifier of `location` relative to this root
    pub fn relativize(&self, location: &Location) -> Result<RelativeId> {
        let rest = location.as_str().strip_prefix(self.as_str()).ok_or_else(|| {
            MirrorError::path_error(
                location.as_str(),
                format!("location is not beneath root '{}'", self),
            )
        })?;

        RelativeId::new(rest.trim_matches(SEPARATOR)).map_err(|_| {
            MirrorError::path_error(location.as_str(), format!("location is the root '{}' itself", self))
        })
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Location> for Root {
    fn from(value: Location) -> Self {
        Self::new(value)
    }
}

impl From<Root> for Location {
    fn from(value: Root) -> Self {
        value.0
    }
}

impl From<&str> for Root {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Root {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for Root {
    fn from(value: &Path) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for Root {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

impl From<&PathBuf> for Root {
    fn from(value: &PathBuf) -> Self {
        Self::new(value)
    }
}

impl From<&Root> for Root {
    fn from(value: &Root) -> Self {
        value.clone()
    }
}

/// Identifier of an entry relative to the root of its tree.
///
/// Never empty, never starts or ends with a separator. Ordering is
/// lexicographic, so a directory always sorts before anything beneath it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativeId(String);

impl RelativeId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.starts_with(SEPARATOR) || id.ends_with(SEPARATOR) {
            return Err(MirrorError::path_error(id, "invalid relative identifier"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier of the containing directory, `None` at the top level
    pub fn parent(&self) -> Option<RelativeId> {
        self.0
            .rfind(SEPARATOR)
            .map(|index| RelativeId(self.0[..index].to_string()))
    }

    /// Whether this entry lies strictly beneath the directory `ancestor`
    pub fn is_descendant_of(&self, ancestor: &RelativeId) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0[ancestor.0.len()..].starts_with(SEPARATOR)
    }
}

impl fmt::Display for RelativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RelativeId {
    type Error = MirrorError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RelativeId {
    type Error = MirrorError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RelativeId> for String {
    fn from(value: RelativeId) -> Self {
        value.0
    }
}
