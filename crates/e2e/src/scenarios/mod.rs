//! Scenario catalogue
//!
//! Every storefront check is a `Scenario`: static metadata plus an async
//! function that drives a `Storefront`. The runner picks scenarios from
//! `catalogue()` through a `ScenarioFilter`.

mod checkout;
mod login;
mod navigation;
mod sanity;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use storefront_common::{BypassSet, BypassToken};

use crate::error::{E2eError, E2eResult};
use crate::storefront::Storefront;

pub type ScenarioFuture<'a> = BoxFuture<'a, E2eResult<()>>;

/// Scenario body
pub type ScenarioFn = for<'a> fn(&'a Storefront) -> ScenarioFuture<'a>;

/// Top-level campaign a scenario belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    Sanity,
    Functional,
    Regression,
}

impl Suite {
    pub const ALL: [Suite; 3] = [Suite::Sanity, Suite::Functional, Suite::Regression];

    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Sanity => "sanity",
            Suite::Functional => "functional",
            Suite::Regression => "regression",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suite {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suite::ALL
            .into_iter()
            .find(|suite| suite.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| E2eError::ScenarioNotFound(format!("unknown suite '{}'", s)))
    }
}

/// Bypass cookies to seed before the first navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seed {
    None,
    AgeVerification,
    MailChimpClosed,
    All,
}

impl Seed {
    pub fn bypass_set(self) -> BypassSet {
        match self {
            Seed::None => BypassSet::none(),
            Seed::AgeVerification => BypassSet::none().with(BypassToken::age_verification()),
            Seed::MailChimpClosed => BypassSet::none().with(BypassToken::mailchimp_closed()),
            Seed::All => BypassSet::all_known(),
        }
    }
}

/// How the page is prepared before the scenario body runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bootstrap {
    /// Seed the given cookies and load the homepage; popups are left alone
    Fresh(Seed),
    /// Seed every token, load the homepage and resolve all interstitials
    ClearPage,
}

impl Bootstrap {
    pub async fn prepare(self, site: &Storefront) -> E2eResult<()> {
        match self {
            Bootstrap::Fresh(seed) => {
                site.seed_bypass_cookies(&seed.bypass_set()).await?;
                site.go_to_homepage().await
            }
            Bootstrap::ClearPage => site.setup_test().await.map(|_| ()),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Scenario {
    /// Test identifier, unique within its group
    pub id: &'static str,
    pub title: &'static str,
    /// Feature area, e.g. `age-verification`
    pub group: &'static str,
    pub suite: Suite,
    pub tags: &'static [&'static str],
    pub bootstrap: Bootstrap,
    pub run: ScenarioFn,
}

impl Scenario {
    /// Catalogue-wide unique key
    pub fn key(&self) -> String {
        format!("{}/{}", self.group, self.id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("suite", &self.suite)
            .field("tags", &self.tags)
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}

/// Every registered scenario, in campaign order
pub fn catalogue() -> Vec<Scenario> {
    let mut all = Vec::new();
    all.extend(sanity::scenarios());
    all.extend(login::scenarios());
    all.extend(navigation::scenarios());
    all.extend(checkout::scenarios());
    all
}

/// Selection criteria; empty fields match everything
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    pub suite: Option<Suite>,
    pub tags: Vec<String>,
    /// Identifiers or `group/id` keys
    pub ids: Vec<String>,
}

impl ScenarioFilter {
    pub fn matches(&self, scenario: &Scenario) -> bool {
        if let Some(suite) = self.suite {
            if scenario.suite != suite {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| scenario.has_tag(t)) {
            return false;
        }
        self.ids.is_empty()
            || self
                .ids
                .iter()
                .any(|id| id == scenario.id || *id == scenario.key())
    }

    /// Apply the filter to the catalogue; every requested id must exist
    pub fn select(&self) -> E2eResult<Vec<Scenario>> {
        let all = catalogue();
        for id in &self.ids {
            if !all.iter().any(|s| id == s.id || *id == s.key()) {
                return Err(E2eError::ScenarioNotFound(id.clone()));
            }
        }
        Ok(all.into_iter().filter(|s| self.matches(s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn count(suite: Suite, group: &str) -> usize {
        catalogue()
            .iter()
            .filter(|s| s.suite == suite && s.group == group)
            .count()
    }

    #[test]
    fn test_catalogue_shape() {
        assert_eq!(count(Suite::Sanity, "age-verification"), 4);
        assert_eq!(count(Suite::Sanity, "cookie-consent"), 4);
        assert_eq!(count(Suite::Sanity, "mailchimp"), 1);
        assert_eq!(count(Suite::Functional, "login"), 7);
        assert_eq!(count(Suite::Functional, "logout"), 3);
        assert_eq!(count(Suite::Regression, "navigation"), 10);
        assert_eq!(count(Suite::Regression, "checkout"), 3);
        assert_eq!(catalogue().len(), 32);
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = catalogue().iter().map(Scenario::key).collect();
        assert_eq!(keys.len(), catalogue().len());
    }

    #[test]
    fn test_functional_and_regression_start_clear() {
        for scenario in catalogue() {
            if scenario.suite != Suite::Sanity {
                assert_eq!(scenario.bootstrap, Bootstrap::ClearPage, "{}", scenario.key());
            }
        }
    }

    #[test]
    fn test_filter_by_suite_and_tag() {
        let filter = ScenarioFilter {
            suite: Some(Suite::Sanity),
            tags: vec!["popup".to_string()],
            ids: Vec::new(),
        };
        let selected = filter.select().unwrap();
        assert_eq!(selected.len(), 9);
        assert!(selected.iter().all(|s| s.suite == Suite::Sanity));
    }

    #[test]
    fn test_filter_by_id_matches_every_group() {
        let filter = ScenarioFilter {
            ids: vec!["mailChimpPopup".to_string()],
            ..Default::default()
        };
        let groups: Vec<&str> = filter.select().unwrap().iter().map(|s| s.group).collect();
        assert_eq!(groups, vec!["cookie-consent", "mailchimp"]);

        let filter = ScenarioFilter {
            ids: vec!["mailchimp/mailChimpPopup".to_string()],
            ..Default::default()
        };
        assert_eq!(filter.select().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let filter = ScenarioFilter {
            ids: vec!["doesNotExist".to_string()],
            ..Default::default()
        };
        assert!(matches!(filter.select(), Err(E2eError::ScenarioNotFound(_))));
    }

    #[test]
    fn test_suite_from_str() {
        assert_eq!("Regression".parse::<Suite>().unwrap(), Suite::Regression);
        assert!("smoke".parse::<Suite>().is_err());
    }
}
