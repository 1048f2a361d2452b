//! Per-request environment.
//!
//! [`RequestContext`] replaces ambient server globals (secure flag, host
//! header, script name). It is built fresh for every request and never
//! cached, since host and scheme vary per request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only secure-transport flag value that selects `https://`.
pub const SECURE_FLAG_ON: &str = "on";

/// URL scheme of the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Derives the scheme from a secure-transport flag.
    ///
    /// Only the exact value `"on"` means HTTPS. `"off"`, any other string
    /// and an absent flag all mean HTTP.
    ///
    /// # Example
    ///
    /// ```
    /// use permalink_core::Scheme;
    ///
    /// assert_eq!(Scheme::from_secure_flag(Some("on")), Scheme::Https);
    /// assert_eq!(Scheme::from_secure_flag(Some("ON")), Scheme::Http);
    /// assert_eq!(Scheme::from_secure_flag(None), Scheme::Http);
    /// ```
    #[must_use]
    pub fn from_secure_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(SECURE_FLAG_ON) => Self::Https,
            _ => Self::Http,
        }
    }

    /// Returns the scheme prefix including `://`.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Http => "http://",
            Self::Https => "https://",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Immutable environment of one inbound request.
///
/// # Example
///
/// ```
/// use permalink_core::{RequestContext, Scheme};
///
/// let ctx = RequestContext::new("/page/42/")
///     .with_secure_flag("on")
///     .with_host("www.test.com")
///     .with_script_name("/index.php");
///
/// assert_eq!(ctx.scheme(), Scheme::Https);
/// assert_eq!(ctx.base_url(), "https://www.test.com/");
/// assert_eq!(ctx.script_name().as_deref(), Some("index.php"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    secure_flag: Option<String>,
    host: Option<String>,
    script_name: Option<String>,
    path: String,
}

impl RequestContext {
    /// Creates a context for the given raw request path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the secure-transport flag (`"on"` for TLS).
    #[must_use]
    pub fn with_secure_flag(mut self, flag: impl Into<String>) -> Self {
        self.secure_flag = Some(flag.into());
        self
    }

    /// Sets the host taken from the request's host header.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the current script path (e.g. `/index.php`).
    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = Some(script_name.into());
        self
    }

    /// Returns the raw request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw secure-transport flag, if any.
    #[must_use]
    pub fn secure_flag(&self) -> Option<&str> {
        self.secure_flag.as_deref()
    }

    /// Returns the request scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        Scheme::from_secure_flag(self.secure_flag())
    }

    /// Returns the host, or an empty string when no host is known.
    ///
    /// An empty host yields degenerate URLs such as `https:///index.php?id=1`
    /// rather than an error.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or_default()
    }

    /// Returns true if a host was supplied.
    #[must_use]
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Returns the script path with leading and trailing `/` removed.
    ///
    /// Returns `None` when no script path was supplied.
    #[must_use]
    pub fn script_name(&self) -> Option<String> {
        self.script_name
            .as_deref()
            .map(|name| name.trim_matches('/').to_string())
    }

    /// Returns `scheme + host + "/"`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}{}/", self.scheme().prefix(), self.host())
    }
}
