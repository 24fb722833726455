//! Ontology link parsing.
//!
//! An ontology link is a `-` delimited list of segments. Most segments are
//! plain JSON-LD keys, but two small commands are embedded in the syntax:
//!
//! * `type|<T>` asserts that the current node carries `@type` `T`.
//! * `rev|<key>` descends into `@reverse.<key>`.

use std::fmt;

use thiserror::Error;

/// Separator between segments of an ontology link.
pub const LINK_SEPARATOR: char = '-';

const TYPE_COMMAND: &str = "type|";
const REVERSE_COMMAND: &str = "rev";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("unknown command '{command}' in segment '{segment}'")]
    UnknownCommand { command: String, segment: String },
}

/// A single decoded path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Descend into (or create) a child key.
    Key(String),
    /// Merge a type into the current node. An empty name is a no-op.
    AssertType(String),
    /// Descend into `@reverse`, then into the given key.
    Reverse(String),
}

impl Segment {
    /// The child key this segment moves into, if it moves at all.
    pub fn key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) | Segment::Reverse(key) => Some(key),
            Segment::AssertType(_) => None,
        }
    }

    /// Name used as the `@type` of a quantity built from this segment.
    pub fn type_name(&self) -> &str {
        match self {
            Segment::Key(name) | Segment::AssertType(name) | Segment::Reverse(name) => name,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::AssertType(name) => write!(f, "{TYPE_COMMAND}{name}"),
            Segment::Reverse(key) => write!(f, "{REVERSE_COMMAND}|{key}"),
        }
    }
}

/// Classify one segment of an ontology link.
pub fn parse_segment(segment: &str) -> Result<Segment, PathError> {
    let Some((command, rest)) = segment.split_once('|') else {
        return Ok(Segment::Key(segment.to_string()));
    };

    // `type|` may appear anywhere in the segment; only the text after the
    // first separator is the type name.
    if segment.contains(TYPE_COMMAND) {
        return Ok(Segment::AssertType(rest.to_string()));
    }

    if command == REVERSE_COMMAND {
        Ok(Segment::Reverse(rest.to_string()))
    } else {
        Err(PathError::UnknownCommand {
            command: command.to_string(),
            segment: segment.to_string(),
        })
    }
}

/// Split an ontology link into parsed segments.
pub fn parse_path(link: &str) -> Result<Vec<Segment>, PathError> {
    link.split(LINK_SEPARATOR).map(parse_segment).collect()
}

/// Render parsed segments back into link syntax, for diagnostics.
pub fn display_path(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::to_string)
        .collect::<Vec<_>>()
        .join(&LINK_SEPARATOR.to_string())
}
