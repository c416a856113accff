//! Playwright browser automation
//!
//! Playwright runs inside a Node.js bridge process. The bridge owns one
//! browser, one context and one page; Rust sends one JSON command per line on
//! stdin and reads one JSON response per line on stdout.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use storefront_common::{BrowserEngine, HarnessConfig};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{BrowserLauncher, BrowserPage, Cookie, Viewport, WaitState};

/// Node.js side of the bridge
const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const { chromium, firefox, webkit } = require(require.resolve('playwright', { paths: [process.cwd()] }));

const opts = JSON.parse(process.argv[2]);

function text(m) {
  if (!m) return undefined;
  return m.type === 'pattern' ? new RegExp(m.source, m.flags) : m.value;
}

function resolve(page, steps) {
  let target = page;
  for (const step of steps) {
    switch (step.kind) {
      case 'text': target = target.getByText(text(step.text), { exact: step.exact }); break;
      case 'role': {
        const options = { exact: step.exact };
        if (step.name) options.name = text(step.name);
        if (step.level) options.level = step.level;
        target = target.getByRole(step.role, options);
        break;
      }
      case 'css': target = target.locator(step.selector); break;
      case 'placeholder': target = target.getByPlaceholder(text(step.text)); break;
      case 'filter': target = target.filter({ hasText: text(step.has_text) }); break;
      case 'nth': target = target.nth(step.index); break;
      case 'content_frame': target = target.contentFrame(); break;
      case 'or': target = target.or(resolve(page, step.other)); break;
      default: throw new Error('unknown locator step: ' + step.kind);
    }
  }
  return target;
}

function reply(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

(async () => {
  const engines = { chromium, firefox, webkit };
  const browser = await engines[opts.browser].launch({ headless: opts.headless });
  const context = await browser.newContext({ viewport: opts.viewport });
  context.setDefaultTimeout(opts.action_timeout_ms);
  context.setDefaultNavigationTimeout(opts.navigation_timeout_ms);
  const page = await context.newPage();

  const loc = (cmd) => resolve(page, cmd.locator);

  async function handle(cmd) {
    switch (cmd.op) {
      case 'add_cookies': await context.addCookies(cmd.cookies); return null;
      case 'goto': await page.goto(cmd.url); return null;
      case 'reload': await page.reload(); return null;
      case 'url': return page.url();
      case 'is_visible': return await loc(cmd).isVisible();
      case 'wait_for': await loc(cmd).waitFor({ state: cmd.state, timeout: cmd.timeout_ms }); return null;
      case 'click': await loc(cmd).click(); return null;
      case 'fill': await loc(cmd).fill(cmd.value); return null;
      case 'press': await loc(cmd).press(cmd.key); return null;
      case 'hover': await loc(cmd).hover(); return null;
      case 'mouse_move': await page.mouse.move(cmd.x, cmd.y); return null;
      case 'attribute': return await loc(cmd).getAttribute(cmd.name);
      case 'is_enabled': return await loc(cmd).isEnabled();
      case 'text_content': {
        const target = loc(cmd);
        if (await target.count() === 0) return null;
        return await target.first().textContent();
      }
      case 'count': return await loc(cmd).count();
      case 'evaluate': {
        const fn = (0, eval)('(' + cmd.function + ')');
        return cmd.locator ? await loc(cmd).evaluate(fn) : await page.evaluate(fn);
      }
      case 'aria_snapshot': return await loc(cmd).ariaSnapshot();
      case 'set_viewport': await page.setViewportSize({ width: cmd.width, height: cmd.height }); return null;
      case 'screenshot': await page.screenshot({ path: cmd.path, fullPage: cmd.full_page }); return null;
      case 'close': await context.close(); await browser.close(); return null;
      default: throw new Error('unknown op: ' + cmd.op);
    }
  }

  reply({ ready: true });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let cmd;
    try {
      cmd = JSON.parse(line);
    } catch (error) {
      reply({ id: 0, ok: false, error: 'malformed command: ' + error.message });
      continue;
    }
    try {
      const value = await handle(cmd);
      reply({ id: cmd.id, ok: true, value: value === undefined ? null : value });
    } catch (error) {
      reply({ id: cmd.id, ok: false, error: error.message, timeout: error.name === 'TimeoutError' });
    }
    if (cmd.op === 'close') break;
  }
  process.exit(0);
})().catch((error) => {
  reply({ ready: false, error: error.message });
  process.exit(1);
});
"#;

/// Launch options handed to the bridge as its first argument
#[derive(Debug, Clone, Serialize)]
struct LaunchOptions {
    browser: &'static str,
    headless: bool,
    viewport: Viewport,
    action_timeout_ms: u64,
    navigation_timeout_ms: u64,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: BrowserEngine,
    pub headless: bool,
    pub viewport: Viewport,
    pub node_binary: String,
    pub driver_dir: Option<PathBuf>,
    pub action_timeout: Duration,
    pub navigation_timeout: Duration,
}

impl PlaywrightConfig {
    pub fn from_harness(config: &HarnessConfig) -> Self {
        Self {
            browser: config.browser.engine,
            headless: config.browser.headless,
            viewport: Viewport {
                width: config.browser.viewport_width,
                height: config.browser.viewport_height,
            },
            node_binary: config.browser.node_binary.clone(),
            driver_dir: config.browser.driver_dir.clone(),
            action_timeout: config.timeouts.action(),
            navigation_timeout: config.timeouts.navigation(),
        }
    }
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self::from_harness(&HarnessConfig::default())
    }
}

/// Command sent to the bridge
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum DriverCommand<'a> {
    AddCookies { cookies: &'a [Cookie] },
    Goto { url: &'a str },
    Reload,
    Url,
    IsVisible { locator: &'a Locator },
    WaitFor { locator: &'a Locator, state: &'static str, timeout_ms: u64 },
    Click { locator: &'a Locator },
    Fill { locator: &'a Locator, value: &'a str },
    Press { locator: &'a Locator, key: &'a str },
    Hover { locator: &'a Locator },
    MouseMove { x: f64, y: f64 },
    Attribute { locator: &'a Locator, name: &'a str },
    IsEnabled { locator: &'a Locator },
    TextContent { locator: &'a Locator },
    Count { locator: &'a Locator },
    Evaluate { locator: Option<&'a Locator>, function: &'a str },
    AriaSnapshot { locator: &'a Locator },
    SetViewport { width: u32, height: u32 },
    Screenshot { path: String, full_page: bool },
    Close,
}

#[derive(Debug, Serialize)]
struct DriverRequest<'a> {
    id: u64,
    #[serde(flatten)]
    command: DriverCommand<'a>,
}

#[derive(Debug, Deserialize)]
struct DriverResponse {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

#[derive(Debug, Deserialize)]
struct ReadyMessage {
    ready: bool,
    #[serde(default)]
    error: Option<String>,
}

struct DriverIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Playwright browser handle: one bridge process, one page
pub struct PlaywrightHandle {
    io: Mutex<DriverIo>,
    child: Mutex<Child>,
    next_id: AtomicU64,

    /// Keeps the bridge script alive for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightHandle {
    /// Spawn the bridge and wait for its browser to be ready
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        let working_dir = config
            .driver_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        Self::check_playwright_installed(&config.node_binary, &working_dir).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let options = LaunchOptions {
            browser: config.browser.as_str(),
            headless: config.headless,
            viewport: config.viewport,
            action_timeout_ms: config.action_timeout.as_millis() as u64,
            navigation_timeout_ms: config.navigation_timeout.as_millis() as u64,
        };

        info!(
            "Launching {} (headless: {}) via Playwright bridge",
            config.browser, config.headless
        );

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .arg(serde_json::to_string(&options)?)
            .current_dir(&working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::DriverStartup(format!("Failed to spawn {}: {}", config.node_binary, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::DriverStartup("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::DriverStartup("bridge stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge] {}", line);
                }
            });
        }

        let mut stdout = BufReader::new(stdout);

        // Browser launch can be slow on a cold cache
        let mut line = String::new();
        let read = tokio::time::timeout(config.navigation_timeout, stdout.read_line(&mut line))
            .await
            .map_err(|_| E2eError::DriverStartup("browser did not become ready".to_string()))??;
        if read == 0 {
            return Err(E2eError::DriverStartup(
                "bridge exited before becoming ready".to_string(),
            ));
        }
        trace!("Bridge greeting: {}", line.trim());

        let ready: ReadyMessage = serde_json::from_str(&line)
            .map_err(|e| E2eError::DriverStartup(format!("Invalid greeting: {}", e)))?;
        if !ready.ready {
            return Err(E2eError::DriverStartup(
                ready.error.unwrap_or_else(|| "unknown launch failure".to_string()),
            ));
        }

        Ok(Self {
            io: Mutex::new(DriverIo { stdin, stdout }),
            child: Mutex::new(child),
            next_id: AtomicU64::new(1),
            _script_dir: script_dir,
        })
    }

    /// Check that `playwright` resolves from the driver directory
    async fn check_playwright_installed(node: &str, dir: &Path) -> E2eResult<()> {
        let status = Command::new(node)
            .args(["-e", "require.resolve('playwright', { paths: [process.cwd()] })"])
            .current_dir(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Send one command and decode its value
    async fn request<T: DeserializeOwned>(&self, command: DriverCommand<'_>) -> E2eResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = DriverRequest { id, command };
        let line = serde_json::to_string(&request)?;
        trace!("Bridge command: {}", line);

        let mut io = self.io.lock().await;
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.write_all(b"\n").await?;
        io.stdin.flush().await?;

        loop {
            let mut buf = String::new();
            if io.stdout.read_line(&mut buf).await? == 0 {
                return Err(E2eError::DriverClosed);
            }
            trace!("Bridge response: {}", buf.trim());

            let response: DriverResponse = serde_json::from_str(&buf)
                .map_err(|e| E2eError::Driver(format!("Invalid response: {}", e)))?;

            if response.id != id {
                warn!("Discarding stale bridge response {}", response.id);
                continue;
            }

            if !response.ok {
                let message = response.error.unwrap_or_else(|| "unknown error".to_string());
                return Err(if response.timeout {
                    E2eError::Timeout(message)
                } else {
                    E2eError::Driver(message)
                });
            }

            return Ok(serde_json::from_value(response.value)?);
        }
    }

    async fn request_void(&self, command: DriverCommand<'_>) -> E2eResult<()> {
        let _: serde_json::Value = self.request(command).await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for PlaywrightHandle {
    async fn add_cookies(&self, cookies: &[Cookie]) -> E2eResult<()> {
        self.request_void(DriverCommand::AddCookies { cookies }).await
    }

    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.request_void(DriverCommand::Goto { url }).await
    }

    async fn reload(&self) -> E2eResult<()> {
        self.request_void(DriverCommand::Reload).await
    }

    async fn url(&self) -> E2eResult<String> {
        self.request(DriverCommand::Url).await
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        self.request(DriverCommand::IsVisible { locator }).await
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.request_void(DriverCommand::WaitFor {
            locator,
            state: state.as_str(),
            timeout_ms: timeout.as_millis() as u64,
        })
        .await
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        debug!("Clicking {}", locator);
        self.request_void(DriverCommand::Click { locator }).await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.request_void(DriverCommand::Fill { locator, value }).await
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.request_void(DriverCommand::Press { locator, key }).await
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.request_void(DriverCommand::Hover { locator }).await
    }

    async fn mouse_move(&self, x: f64, y: f64) -> E2eResult<()> {
        self.request_void(DriverCommand::MouseMove { x, y }).await
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        self.request(DriverCommand::Attribute { locator, name }).await
    }

    async fn is_enabled(&self, locator: &Locator) -> E2eResult<bool> {
        self.request(DriverCommand::IsEnabled { locator }).await
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        self.request(DriverCommand::TextContent { locator }).await
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.request(DriverCommand::Count { locator }).await
    }

    async fn evaluate(&self, target: Option<&Locator>, function: &str) -> E2eResult<serde_json::Value> {
        self.request(DriverCommand::Evaluate {
            locator: target,
            function,
        })
        .await
    }

    async fn aria_snapshot(&self, locator: &Locator) -> E2eResult<String> {
        self.request(DriverCommand::AriaSnapshot { locator }).await
    }

    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()> {
        self.request_void(DriverCommand::SetViewport {
            width: viewport.width,
            height: viewport.height,
        })
        .await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.request_void(DriverCommand::Screenshot {
            path: path.to_string_lossy().to_string(),
            full_page,
        })
        .await
    }

    async fn close(&self) -> E2eResult<()> {
        let result = self.request_void(DriverCommand::Close).await;
        let mut child = self.child.lock().await;
        match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                warn!("Bridge did not exit after close; killing it");
                let _ = child.kill().await;
            }
        }
        result
    }
}

/// Launches one bridge process (and browser context) per page
pub struct PlaywrightLauncher {
    config: PlaywrightConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    async fn launch(&self) -> E2eResult<Arc<dyn BrowserPage>> {
        let handle = PlaywrightHandle::launch(self.config.clone()).await?;
        Ok(Arc::new(handle))
    }
}
