use strum::Display;

use crate::config::ClientConfig;

/// Whether a request goes through bearer handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RouteDecision {
    Exempt,
    RequiresAuth,
}

/// Decides which outbound paths skip authentication handling.
///
/// Matching is by substring containment, so host, prefix and query variations
/// of an exempt endpoint are all recognized. Unknown paths require auth.
///
/// # Example
/// ```
/// use fortuna_auth::auth::{RouteClassifier, RouteDecision};
///
/// let routes = RouteClassifier::new(["auth/refresh", "upload-url"]);
/// assert!(routes.is_exempt("/api/user/auth/refresh/"));
/// assert_eq!(routes.classify("/api/user/profile/"), RouteDecision::RequiresAuth);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    patterns: Vec<String>,
}

impl RouteClassifier {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            // An empty pattern would be contained in every path.
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.exempt_routes.iter().cloned())
    }

    pub fn classify(&self, path: &str) -> RouteDecision {
        if self.patterns.iter().any(|p| path.contains(p.as_str())) {
            RouteDecision::Exempt
        } else {
            RouteDecision::RequiresAuth
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.classify(path) == RouteDecision::Exempt
    }
}
