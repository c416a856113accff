//! Element locators
//!
//! A `Locator` is a plain value: an ordered chain of selection steps that the
//! driver resolves against the live page on every use. Locators never hold a
//! reference to a DOM node, so they stay valid across navigations.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text matcher used for accessible names and `has_text` filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextMatch {
    /// Case-insensitive substring, whitespace-normalised
    Literal { value: String },
    /// Regular expression in JavaScript syntax
    Pattern { source: String, flags: String },
}

impl TextMatch {
    pub fn literal(value: impl Into<String>) -> Self {
        TextMatch::Literal { value: value.into() }
    }

    /// Case-insensitive regular expression
    pub fn regex_i(source: impl Into<String>) -> Self {
        TextMatch::Pattern {
            source: source.into(),
            flags: "i".to_string(),
        }
    }

    pub fn regex(source: impl Into<String>) -> Self {
        TextMatch::Pattern {
            source: source.into(),
            flags: String::new(),
        }
    }

    /// Evaluate the matcher on the Rust side
    ///
    /// Literals are case-sensitive substrings unless `exact`, like
    /// `toContainText`. Only the subset of JavaScript regex syntax shared with the `regex`
    /// crate is supported; an uncompilable pattern never matches.
    pub fn matches(&self, text: &str, exact: bool) -> bool {
        let normalized = normalize_whitespace(text);
        match self {
            TextMatch::Literal { value } => {
                let value = normalize_whitespace(value);
                if exact {
                    normalized == value
                } else {
                    normalized.contains(&value)
                }
            }
            TextMatch::Pattern { source, flags } => RegexBuilder::new(source)
                .case_insensitive(flags.contains('i'))
                .build()
                .map(|re| re.is_match(&normalized))
                .unwrap_or(false),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(value: &str) -> Self {
        TextMatch::literal(value)
    }
}

impl From<String> for TextMatch {
    fn from(value: String) -> Self {
        TextMatch::literal(value)
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatch::Literal { value } => write!(f, "{:?}", value),
            TextMatch::Pattern { source, flags } => write!(f, "/{}/{}", source, flags),
        }
    }
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One step of a locator chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocatorStep {
    /// Element whose text contains (or equals, when exact) the given text
    Text { text: TextMatch, exact: bool },

    /// ARIA role with an optional accessible-name matcher
    Role {
        role: String,
        name: Option<TextMatch>,
        exact: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u32>,
    },

    /// CSS selector
    Css { selector: String },

    /// Input by placeholder
    Placeholder { text: TextMatch },

    /// Keep only matches containing the given text
    Filter { has_text: TextMatch },

    /// Pick one match; negative counts from the end
    Nth { index: i32 },

    /// Descend into the matched iframe's document
    ContentFrame,

    /// Union with another locator evaluated from the same root
    Or { other: Locator },
}

/// Chain of selection steps resolved by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    steps: Vec<LocatorStep>,
}

impl Locator {
    fn start(step: LocatorStep) -> Self {
        Self { steps: vec![step] }
    }

    fn then(mut self, step: LocatorStep) -> Self {
        self.steps.push(step);
        self
    }

    /// `page.getByText(text)`
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::start(LocatorStep::Text {
            text: text.into(),
            exact: false,
        })
    }

    /// `page.getByRole(role)` without a name filter
    pub fn role(role: impl Into<String>) -> Self {
        Self::start(LocatorStep::Role {
            role: role.into(),
            name: None,
            exact: false,
            level: None,
        })
    }

    /// `page.getByRole(role, { name })`
    pub fn role_named(role: impl Into<String>, name: impl Into<TextMatch>) -> Self {
        Self::start(LocatorStep::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
            level: None,
        })
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::start(LocatorStep::Css {
            selector: selector.into(),
        })
    }

    pub fn placeholder(text: impl Into<TextMatch>) -> Self {
        Self::start(LocatorStep::Placeholder { text: text.into() })
    }

    /// Require exact text or name matching on the last step
    pub fn exact(mut self) -> Self {
        match self.steps.last_mut() {
            Some(LocatorStep::Text { exact, .. }) | Some(LocatorStep::Role { exact, .. }) => {
                *exact = true;
            }
            _ => {}
        }
        self
    }

    /// Heading level filter on the last role step
    pub fn level(mut self, heading_level: u32) -> Self {
        if let Some(LocatorStep::Role { level, .. }) = self.steps.last_mut() {
            *level = Some(heading_level);
        }
        self
    }

    /// Descendant CSS selector
    pub fn locator(self, selector: impl Into<String>) -> Self {
        self.then(LocatorStep::Css {
            selector: selector.into(),
        })
    }

    /// Descendant with an ARIA role
    pub fn get_by_role(self, role: impl Into<String>, name: Option<TextMatch>) -> Self {
        self.then(LocatorStep::Role {
            role: role.into(),
            name,
            exact: false,
            level: None,
        })
    }

    pub fn filter_text(self, has_text: impl Into<TextMatch>) -> Self {
        self.then(LocatorStep::Filter {
            has_text: has_text.into(),
        })
    }

    pub fn nth(self, index: i32) -> Self {
        self.then(LocatorStep::Nth { index })
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn content_frame(self) -> Self {
        self.then(LocatorStep::ContentFrame)
    }

    pub fn or(self, other: Locator) -> Self {
        self.then(LocatorStep::Or { other })
    }

    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            match step {
                LocatorStep::Text { text, exact } => {
                    write!(f, "text({}{})", text, if *exact { ", exact" } else { "" })?
                }
                LocatorStep::Role { role, name, .. } => match name {
                    Some(name) => write!(f, "role({}, {})", role, name)?,
                    None => write!(f, "role({})", role)?,
                },
                LocatorStep::Css { selector } => write!(f, "css({})", selector)?,
                LocatorStep::Placeholder { text } => write!(f, "placeholder({})", text)?,
                LocatorStep::Filter { has_text } => write!(f, "has_text({})", has_text)?,
                LocatorStep::Nth { index } => write!(f, "nth({})", index)?,
                LocatorStep::ContentFrame => f.write_str("content_frame")?,
                LocatorStep::Or { other } => write!(f, "or({})", other)?,
            }
        }
        Ok(())
    }
}
