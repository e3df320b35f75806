//! DataPath parsing and formatting.
//!
//! Grammar (simple, plugin-agnostic):
//!   segment.segment.segment
//! - '.' separates segments; at least one segment is required
//! - Segments must be non-empty and free of whitespace
//!   Examples:
//!   "weather.current.temperature"
//!   "game.player.health"
//!
//! DataPath is intentionally simple and string-based; the data-model host
//! resolves it into a concrete typed value at evaluation time.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// Construct a DataPath from segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a path string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("empty data path".to_string());
        }
        let segments: Vec<&str> = s.split('.').collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err("invalid data path: empty segment".to_string());
        }
        if segments
            .iter()
            .any(|seg| seg.chars().any(char::is_whitespace))
        {
            return Err("invalid data path: segment contains whitespace".to_string());
        }
        Ok(DataPath {
            segments: segments.into_iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Iterate over path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.as_str())
    }

    /// First segment, conventionally the owning plugin/module name.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for DataPath {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataPath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for DataPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D>(deserializer: D) -> Result<DataPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DataPath::parse(&s).map_err(de::Error::custom)
    }
}
