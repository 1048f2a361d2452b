//! Page identifiers and page records.

use crate::error::{PermalinkError, PermalinkResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// The full page row, passed through untouched to the rewrite service.
pub type PagePayload = serde_json::Map<String, Value>;

/// Primary key of a content page.
///
/// Always positive: page `0` never exists and never becomes a redirect target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(NonZeroU64);

impl PageId {
    /// Creates a page id, returning `None` for zero.
    #[must_use]
    pub const fn new(id: u64) -> Option<Self> {
        match NonZeroU64::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageId {
    type Err = PermalinkError;

    /// Parses a run of ASCII digits. Leading zeros are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PermalinkError::InvalidPageId(s.to_string()));
        }
        s.parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| PermalinkError::InvalidPageId(s.to_string()))
    }
}

/// A page row that is known to exist.
///
/// The resolver only needs to know that the record exists; the payload is
/// opaque and handed to the rewrite service as-is. A few accessors exist for
/// collaborators that build speaking URLs from page data.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    uid: PageId,
    payload: PagePayload,
}

impl PageRecord {
    /// Creates a record with only the `uid` field.
    #[must_use]
    pub fn new(uid: PageId) -> Self {
        let mut payload = PagePayload::new();
        payload.insert("uid".to_string(), Value::from(uid.get()));
        Self { uid, payload }
    }

    /// Builds a record from a raw row, reading the `uid` column.
    ///
    /// # Example
    ///
    /// ```
    /// use permalink_core::PageRecord;
    /// use serde_json::json;
    ///
    /// let row = json!({"uid": 7, "pid": 1, "title": "About"});
    /// let record = PageRecord::from_row(row.as_object().unwrap().clone()).unwrap();
    /// assert_eq!(record.uid().get(), 7);
    /// assert_eq!(record.title(), Some("About"));
    /// ```
    pub fn from_row(payload: PagePayload) -> PermalinkResult<Self> {
        let uid = payload
            .get("uid")
            .and_then(Value::as_u64)
            .and_then(PageId::new)
            .ok_or_else(|| {
                PermalinkError::InvalidPageId(
                    payload
                        .get("uid")
                        .map_or_else(|| "<missing>".to_string(), ToString::to_string),
                )
            })?;
        Ok(Self { uid, payload })
    }

    /// Adds or replaces a payload field.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Returns the primary key.
    #[must_use]
    pub const fn uid(&self) -> PageId {
        self.uid
    }

    /// Returns the opaque payload.
    #[must_use]
    pub fn payload(&self) -> &PagePayload {
        &self.payload
    }

    /// Returns a payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Returns the page title, if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(Value::as_str)
    }

    /// Returns the parent page id (`pid` column), if non-zero.
    #[must_use]
    pub fn parent_id(&self) -> Option<PageId> {
        self.field("pid").and_then(Value::as_u64).and_then(PageId::new)
    }

    /// Returns true if the page is flagged as a site root.
    #[must_use]
    pub fn is_site_root(&self) -> bool {
        match self.field("is_siteroot") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n != 0),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> PagePayload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_page_id_rejects_zero() {
        assert!(PageId::new(0).is_none());
        assert_eq!(PageId::new(5).map(PageId::get), Some(5));
    }

    #[test]
    fn test_page_id_from_str() {
        assert_eq!("123".parse::<PageId>().unwrap().get(), 123);
        assert_eq!("0123".parse::<PageId>().unwrap().get(), 123);
        assert!("0".parse::<PageId>().is_err());
        assert!("".parse::<PageId>().is_err());
        assert!("12a".parse::<PageId>().is_err());
        assert!("+12".parse::<PageId>().is_err());
        assert!("99999999999999999999999".parse::<PageId>().is_err());
    }

    #[test]
    fn test_record_from_row() {
        let record = PageRecord::from_row(row(json!({"uid": 123, "pid": 1, "title": "Some page"})))
            .unwrap();
        assert_eq!(record.uid().get(), 123);
        assert_eq!(record.parent_id().map(PageId::get), Some(1));
        assert_eq!(record.title(), Some("Some page"));
        assert_eq!(record.payload().len(), 3);
    }

    #[test]
    fn test_record_from_row_without_uid() {
        let err = PageRecord::from_row(row(json!({"title": "orphan"}))).unwrap_err();
        assert!(matches!(err, PermalinkError::InvalidPageId(_)));
    }

    #[test]
    fn test_record_root_parent() {
        let record = PageRecord::from_row(row(json!({"uid": 1, "pid": 0}))).unwrap();
        assert!(record.parent_id().is_none());
    }

    #[test]
    fn test_site_root_flag() {
        let id = PageId::new(1).unwrap();
        assert!(!PageRecord::new(id).is_site_root());
        assert!(PageRecord::new(id).with_field("is_siteroot", 1).is_site_root());
        assert!(PageRecord::new(id).with_field("is_siteroot", true).is_site_root());
        assert!(!PageRecord::new(id).with_field("is_siteroot", 0).is_site_root());
    }
}
