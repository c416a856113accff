//! Bypass tokens
//!
//! A bypass token is a cookie that, when present in the browser's cookie jar
//! at navigation time, stops the storefront from rendering one of its
//! interstitial popups. Tokens are seeded by the bootstrap step before the
//! first navigation and live as long as the browser context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cookie name that suppresses the age-verification gate
pub const AGE_VERIFICATION_COOKIE: &str = "an_age_verification";

/// Cookie name that suppresses the MailChimp newsletter popup
pub const MAILCHIMP_CLOSED_COOKIE: &str = "MCPopupClosed";

/// A named cookie key/value pair that suppresses an interstitial
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BypassToken {
    pub name: String,
    pub value: String,
}

impl BypassToken {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `an_age_verification=1`
    pub fn age_verification() -> Self {
        Self::new(AGE_VERIFICATION_COOKIE, "1")
    }

    /// `MCPopupClosed=yes`
    pub fn mailchimp_closed() -> Self {
        Self::new(MAILCHIMP_CLOSED_COOKIE, "yes")
    }

    /// Build the cookie to seed for a given domain
    pub fn to_cookie(&self, domain: &str) -> SeedCookie {
        SeedCookie {
            name: self.name.clone(),
            value: self.value.clone(),
            domain: domain.to_string(),
            path: "/".to_string(),
        }
    }
}

impl fmt::Display for BypassToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Cookie as handed to the browser context's cookie jar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Ordered, de-duplicated set of bypass tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BypassSet {
    tokens: Vec<BypassToken>,
}

impl BypassSet {
    /// Empty set: every interstitial is allowed to render
    pub fn none() -> Self {
        Self::default()
    }

    /// Both known tokens, as used by the standard test bootstrap
    pub fn all_known() -> Self {
        Self::none()
            .with(BypassToken::age_verification())
            .with(BypassToken::mailchimp_closed())
    }

    /// Add a token, replacing any token with the same name
    pub fn with(mut self, token: BypassToken) -> Self {
        self.insert(token);
        self
    }

    pub fn insert(&mut self, token: BypassToken) {
        match self.tokens.iter_mut().find(|t| t.name == token.name) {
            Some(existing) => *existing = token,
            None => self.tokens.push(token),
        }
    }

    /// True when a token with the same name and value is present
    pub fn contains(&self, token: &BypassToken) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BypassToken> {
        self.tokens.iter()
    }

    pub fn to_cookies(&self, domain: &str) -> Vec<SeedCookie> {
        self.tokens.iter().map(|t| t.to_cookie(domain)).collect()
    }
}

impl FromIterator<BypassToken> for BypassSet {
    fn from_iter<I: IntoIterator<Item = BypassToken>>(iter: I) -> Self {
        let mut set = Self::none();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tokens() {
        assert_eq!(BypassToken::age_verification().to_string(), "an_age_verification=1");
        assert_eq!(BypassToken::mailchimp_closed().to_string(), "MCPopupClosed=yes");
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let set = BypassSet::none()
            .with(BypassToken::new("MCPopupClosed", "no"))
            .with(BypassToken::mailchimp_closed());

        assert_eq!(set.len(), 1);
        assert!(set.contains(&BypassToken::mailchimp_closed()));
        assert!(!set.contains(&BypassToken::new("MCPopupClosed", "no")));
    }

    #[test]
    fn test_contains_requires_matching_value() {
        let set = BypassSet::none().with(BypassToken::new(AGE_VERIFICATION_COOKIE, "0"));
        assert!(!set.contains(&BypassToken::age_verification()));
    }

    #[test]
    fn test_to_cookies_uses_root_path() {
        let cookies = BypassSet::all_known().to_cookies("vapeinitaly.com");

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, AGE_VERIFICATION_COOKIE);
        assert!(cookies.iter().all(|c| c.domain == "vapeinitaly.com" && c.path == "/"));
    }
}
