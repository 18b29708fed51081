use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Unique identifier for a course.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(String);

impl CourseId {
    /// Creates a new `CourseId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a video within a course.
///
/// The remote API is inconsistent about whether video identifiers are JSON
/// strings or numbers; both deserialize to the decimal string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VideoId(String);

impl VideoId {
    /// Creates a new `VideoId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a quiz question.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a new `QuestionId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

impl fmt::Debug for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VideoId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CourseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for VideoId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VideoIdVisitor;

        impl Visitor<'_> for VideoIdVisitor {
            type Value = VideoId;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a string or integer video identifier")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<VideoId, E> {
                Ok(VideoId::new(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<VideoId, E> {
                Ok(VideoId::new(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<VideoId, E> {
                Ok(VideoId::new(value.to_string()))
            }
        }

        deserializer.deserialize_any(VideoIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_id_display() {
        let id = CourseId::new("fr-b2");
        assert_eq!(id.to_string(), "fr-b2");
    }

    #[test]
    fn video_id_deserializes_from_string() {
        let id: VideoId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id, VideoId::new("42"));
    }

    #[test]
    fn video_id_deserializes_from_number() {
        let id: VideoId = serde_json::from_str("42").unwrap();
        assert_eq!(id, VideoId::new("42"));
    }

    #[test]
    fn numeric_and_string_forms_collapse() {
        let a: VideoId = serde_json::from_str("7").unwrap();
        let b: VideoId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
    }
}
