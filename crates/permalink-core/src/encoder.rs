//! Arguments handed to the rewrite service.

use crate::page::{PageId, PageRecord};

/// Rendering flags the rewrite service needs to encode a page URL.
///
/// These are passed explicitly instead of being set on a shared frontend
/// object before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEnvironment {
    /// The page being encoded, treated as the active page.
    pub active_page: PageId,
    /// URL rewriting is switched on for this encoding pass.
    pub rewrite_enabled: bool,
    /// Absolute prefix for generated links (`scheme + host + "/"`).
    pub abs_ref_prefix: String,
}

/// One "ensure cached" request for the rewrite service.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderRequest {
    /// Page type number. Always `None`: default routing behavior.
    pub type_num: Option<u32>,
    /// Absolute self URL (`...?id=<page>`).
    pub url: String,
    /// Same as `url`; the service reads both.
    pub total_url: String,
    /// The page row, passed through untouched.
    pub page: PageRecord,
    /// Current script name, trimmed of `/`.
    pub script: Option<String>,
    /// Explicit rendering flags.
    pub environment: RenderEnvironment,
}

impl EncoderRequest {
    /// Returns the page id being encoded.
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.environment.active_page
    }
}
