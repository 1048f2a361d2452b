//! Redirect target construction.

use crate::context::RequestContext;

/// Builds the absolute redirect target for a speaking path.
///
/// All leading and trailing `/` are stripped; a non-empty path gets exactly
/// one trailing `/`. A missing or empty path points at the site root.
///
/// # Example
///
/// ```
/// use permalink_core::{redirect_url, RequestContext};
///
/// let ctx = RequestContext::new("/").with_secure_flag("on").with_host("www.test.com");
/// assert_eq!(redirect_url(Some("/hello"), &ctx), "https://www.test.com/hello/");
/// assert_eq!(redirect_url(None, &ctx), "https://www.test.com/");
/// ```
#[must_use]
pub fn redirect_url(pretty_path: Option<&str>, ctx: &RequestContext) -> String {
    let path = pretty_path.unwrap_or_default().trim_matches('/');
    let trailing_slash = if path.is_empty() { "" } else { "/" };
    format!("{}{}{}", ctx.base_url(), path, trailing_slash)
}
