//! Canonical URL derivation.
//!
//! Builds the absolute self URL of a page, asks the rewrite service to make
//! sure a speaking URL is cached for it, then reads that speaking URL back
//! from the rewrite cache.

use crate::context::RequestContext;
use crate::encoder::{EncoderRequest, RenderEnvironment};
use crate::error::PermalinkResult;
use crate::page::{PageId, PageRecord};
use crate::store::{PageStore, RewriteCache, RewriteService};

/// Builds `scheme + host + "/" + script + "?id=" + id`.
///
/// A missing script name contributes an empty string, as does a missing host.
///
/// # Example
///
/// ```
/// use permalink_core::{self_url, PageId, RequestContext};
///
/// let ctx = RequestContext::new("/page/123/")
///     .with_secure_flag("on")
///     .with_host("www.test.com")
///     .with_script_name("test.php");
/// let id = PageId::new(123).unwrap();
/// assert_eq!(self_url(id, &ctx), "https://www.test.com/test.php?id=123");
/// ```
#[must_use]
pub fn self_url(id: PageId, ctx: &RequestContext) -> String {
    format!(
        "{}{}/{}?id={}",
        ctx.scheme().prefix(),
        ctx.host(),
        ctx.script_name().unwrap_or_default(),
        id
    )
}

/// Looks up the page and, if it exists, builds the encoder request for it.
///
/// Returns `Ok(None)` when the page does not exist.
pub fn prepare_encoder_request(
    id: PageId,
    ctx: &RequestContext,
    pages: &dyn PageStore,
) -> PermalinkResult<Option<EncoderRequest>> {
    let Some(page) = pages.find_page(id)? else {
        return Ok(None);
    };
    Ok(Some(encoder_request(id, page, ctx)))
}

fn encoder_request(id: PageId, page: PageRecord, ctx: &RequestContext) -> EncoderRequest {
    let target = self_url(id, ctx);
    EncoderRequest {
        type_num: None,
        url: target.clone(),
        total_url: target,
        page,
        script: ctx.script_name(),
        environment: RenderEnvironment {
            active_page: id,
            rewrite_enabled: true,
            abs_ref_prefix: ctx.base_url(),
        },
    }
}

/// Runs the rewrite service for a prepared request and reads the speaking
/// path back from the cache.
///
/// Returns `Ok(None)` when the cache has no entry or an empty speaking path.
pub fn derive_pretty_path(
    request: &EncoderRequest,
    service: &dyn RewriteService,
    cache: &dyn RewriteCache,
) -> PermalinkResult<Option<String>> {
    service.ensure_cached(request)?;

    let entry = cache.find_by_page_id(request.page_id())?;
    Ok(entry
        .map(|entry| entry.speaking_url)
        .filter(|path| !path.is_empty()))
}
