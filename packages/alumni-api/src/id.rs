//! Typed opaque identifiers.
//!
//! `Id<T>` wraps the server's identifier string and carries a marker type so a
//! `PostId` cannot be passed where a `UserId` was expected. The portal API is
//! not consistent about id encoding, so deserialization accepts both JSON
//! strings and integers and normalizes them to their decimal string form.
//!
//! ```rust
//! use alumni_api::{PostId, UserId};
//!
//! let post = PostId::new("42");
//! let author = UserId::new("42");
//!
//! assert_eq!(post.as_str(), author.as_str());
//! // let wrong: UserId = post; // compile error
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker for post identifiers.
pub struct PostMarker;
/// Marker for user identifiers.
pub struct UserMarker;
/// Marker for university identifiers.
pub struct UniversityMarker;
/// Marker for sponsored-content identifiers.
pub struct AdMarker;

pub type PostId = Id<PostMarker>;
pub type UserId = Id<UserMarker>;
pub type UniversityId = Id<UniversityMarker>;
pub type AdId = Id<AdMarker>;

/// An opaque server identifier tagged with the entity it belongs to.
#[repr(transparent)]
pub struct Id<T>(String, PhantomData<fn() -> T>);

// ============================================================================
// Core implementations
// ============================================================================

impl<T> Id<T> {
    /// Creates an id from anything string-like.
    #[inline]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into(), PhantomData)
    }

    /// Returns the raw identifier.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns the raw identifier.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

// ============================================================================
// Standard trait implementations
// ============================================================================

impl<T> Clone for Id<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = std::any::type_name::<T>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        f.debug_tuple(&format!("Id<{}>", short)).field(&self.0).finish()
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T> PartialEq for Id<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Id<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> AsRef<str> for Id<T> {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<T> From<&str> for Id<T> {
    #[inline]
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<T> From<String> for Id<T> {
    #[inline]
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl<T> From<u64> for Id<T> {
    #[inline]
    fn from(raw: u64) -> Self {
        Self::new(raw.to_string())
    }
}

// ============================================================================
// Serde support
// ============================================================================

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct IdVisitor<T>(PhantomData<fn() -> T>);

impl<'de, T> Visitor<'de> for IdVisitor<T> {
    type Value = Id<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Id::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Id::new(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Id::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Id::new(v.to_string()))
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor(PhantomData))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deserialize_accepts_integer_and_string() {
        let from_int: PostId = serde_json::from_str("17").unwrap();
        let from_str: PostId = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "17");
    }

    #[test]
    fn test_serializes_as_string() {
        let id = PostId::from(5u64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5\"");
    }

    #[test]
    fn test_hash_and_eq_follow_raw_value() {
        let mut set = HashSet::new();
        set.insert(PostId::new("a"));
        set.insert(PostId::new("a"));
        set.insert(PostId::new("b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_debug_includes_marker_name() {
        let id = UserId::new("u1");
        assert_eq!(format!("{:?}", id), "Id<UserMarker>(\"u1\")");
    }
}
