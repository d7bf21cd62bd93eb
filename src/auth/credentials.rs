use serde::{Deserialize, Serialize};

/// The access/refresh token pair for the single signed-in account.
///
/// Empty strings are indistinguishable from absent tokens: both accessors
/// return `None` for them, so an empty value can never reach a header.
///
/// # Example
/// ```
/// use fortuna_auth::auth::Credentials;
///
/// let creds = Credentials::new("access", Some("refresh"));
/// assert_eq!(creds.access_token(), Some("access"));
///
/// let blank = Credentials::new("", None::<String>);
/// assert_eq!(blank.access_token(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<impl Into<String>>) -> Self {
        Self {
            access_token: non_empty(Some(access_token.into())),
            refresh_token: non_empty(refresh_token.map(Into::into)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Replace the access token, keeping the refresh token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = non_empty(Some(token.into()));
        self
    }

    /// Replace the refresh token, keeping the access token.
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = non_empty(Some(token.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.access_token().is_none() && self.refresh_token().is_none()
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
