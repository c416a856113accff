//! Auto-retrying assertions
//!
//! Every assertion re-queries the page until it holds or its deadline passes.

use regex::Regex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::aria;
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, TextMatch};
use crate::page::BrowserPage;

/// Default timeout for assertions (5 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
enum Check {
    Visible,
    ContainText(TextMatch),
    Attribute { name: String, value: String },
    Disabled,
    Count(usize),
    AriaSnapshot(String),
}

impl Check {
    fn describe(&self) -> String {
        match self {
            Check::Visible => "be visible".to_string(),
            Check::ContainText(text) => format!("contain text {}", text),
            Check::Attribute { name, value } => format!("have {}={:?}", name, value),
            Check::Disabled => "be disabled".to_string(),
            Check::Count(n) => format!("have count {}", n),
            Check::AriaSnapshot(_) => "match the ARIA snapshot template".to_string(),
        }
    }
}

/// Assertion on a located element
pub struct Expect<'a> {
    page: &'a dyn BrowserPage,
    locator: Locator,
    timeout: Duration,
    poll_interval: Duration,
    negate: bool,
}

pub fn expect(page: &dyn BrowserPage, locator: Locator) -> Expect<'_> {
    Expect {
        page,
        locator,
        timeout: DEFAULT_TIMEOUT,
        poll_interval: DEFAULT_POLL_INTERVAL,
        negate: false,
    }
}

impl<'a> Expect<'a> {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Invert the next assertion
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub async fn to_be_visible(self) -> E2eResult<()> {
        self.run(Check::Visible).await
    }

    pub async fn to_be_hidden(self) -> E2eResult<()> {
        self.not().run(Check::Visible).await
    }

    pub async fn to_contain_text(self, text: impl Into<TextMatch>) -> E2eResult<()> {
        self.run(Check::ContainText(text.into())).await
    }

    pub async fn to_have_attribute(self, name: &str, value: &str) -> E2eResult<()> {
        self.run(Check::Attribute {
            name: name.to_string(),
            value: value.to_string(),
        })
        .await
    }

    pub async fn to_be_disabled(self) -> E2eResult<()> {
        self.run(Check::Disabled).await
    }

    pub async fn to_have_count(self, count: usize) -> E2eResult<()> {
        self.run(Check::Count(count)).await
    }

    pub async fn to_match_aria_snapshot(self, template: &str) -> E2eResult<()> {
        // Reject malformed templates up front instead of timing out on them
        aria::parse(template)?;
        self.run(Check::AriaSnapshot(template.to_string())).await
    }

    /// Evaluate a check once: (holds, description of what was observed)
    async fn probe(&self, check: &Check) -> E2eResult<(bool, String)> {
        match check {
            Check::Visible => {
                let visible = self.page.is_visible(&self.locator).await?;
                Ok((visible, if visible { "visible" } else { "hidden" }.to_string()))
            }
            Check::ContainText(expected) => {
                let text = self.page.text_content(&self.locator).await?;
                let holds = text
                    .as_deref()
                    .map(|t| expected.matches(t, false))
                    .unwrap_or(false);
                Ok((holds, format!("{:?}", text)))
            }
            Check::Attribute { name, value } => {
                let actual = self.page.attribute(&self.locator, name).await?;
                Ok((actual.as_deref() == Some(value.as_str()), format!("{:?}", actual)))
            }
            Check::Disabled => {
                let enabled = self.page.is_enabled(&self.locator).await?;
                Ok((!enabled, if enabled { "enabled" } else { "disabled" }.to_string()))
            }
            Check::Count(expected) => {
                let count = self.page.count(&self.locator).await?;
                Ok((count == *expected, format!("count {}", count)))
            }
            Check::AriaSnapshot(template) => {
                let snapshot = match self.page.aria_snapshot(&self.locator).await {
                    Ok(snapshot) => snapshot,
                    Err(e) if e.is_timeout() => return Ok((false, "no element".to_string())),
                    Err(e) => return Err(e),
                };
                let holds = aria::matches_template(&snapshot, template)?;
                Ok((holds, snapshot))
            }
        }
    }

    async fn run(self, check: Check) -> E2eResult<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let (holds, observed) = self.probe(&check).await?;
            if holds != self.negate {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "expected {} to {}{} within {:?}; observed {}",
                    self.locator,
                    if self.negate { "not " } else { "" },
                    check.describe(),
                    self.timeout,
                    observed
                )));
            }
            trace!("Retrying assertion on {}", self.locator);
            sleep(self.poll_interval).await;
        }
    }
}

/// Wait until the page URL matches `pattern`
pub async fn expect_url(page: &dyn BrowserPage, pattern: &Regex, timeout: Duration) -> E2eResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let url = page.url().await?;
        if pattern.is_match(&url) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(E2eError::AssertionFailed(format!(
                "expected URL to match {} within {:?}; observed {}",
                pattern, timeout, url
            )));
        }
        sleep(DEFAULT_POLL_INTERVAL).await;
    }
}

/// Plain value assertion with the same error shape as element assertions
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}
