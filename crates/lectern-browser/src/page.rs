use crate::Error;
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::layout::Point;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use lectern_core::page::{BoundingBox, LessonPage, Locator, Probe};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

type CoreResult<T> = lectern_core::Result<T>;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Attribute used to hand role/text matches from page scripts to CSS lookups
const REF_ATTR: &str = "data-lectern-ref";

/// [`LessonPage`] backed by a chromiumoxide page
///
/// Bounded lookups poll the DOM until the deadline. Role and text locators
/// are resolved by a page script that tags matches, so every locator kind
/// ends up as a CSS query.
pub struct CdpPage {
    page: Page,
    next_ref: AtomicU64,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            next_ref: AtomicU64::new(1),
        }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// CSS selector matching `locator`
    async fn selector_for(&self, locator: &Locator) -> CoreResult<String> {
        let script = match locator {
            Locator::Css(selector) => return Ok(selector.clone()),
            Locator::Role { role, name } => role_script(role, name.as_str(), &self.tag()),
            Locator::Text(text) => text_script(text, &self.tag()),
        };
        let token = self.page.evaluate(script).await.map_err(Error::from)?;
        let token: String = token
            .into_value()
            .map_err(|e| Error::Cdp(format!("unexpected tag script result: {}", e)))?;
        Ok(format!(r#"[{}="{}"]"#, REF_ATTR, token))
    }

    fn tag(&self) -> String {
        format!("r{}", self.next_ref.fetch_add(1, Ordering::Relaxed))
    }

    async fn resolve(&self, locator: &Locator) -> CoreResult<Vec<Element>> {
        let selector = self.selector_for(locator).await?;
        let elements = self
            .page
            .find_elements(selector.as_str())
            .await
            .map_err(Error::from)?;
        Ok(elements)
    }

    /// First match, polling until `timeout`
    async fn first_within(&self, locator: &Locator, timeout: Duration) -> CoreResult<Option<Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.resolve(locator).await?.into_iter().next() {
                return Ok(Some(element));
            }
            if Instant::now() >= deadline {
                tracing::debug!("{} not found within {}ms", locator, timeout.as_millis());
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> CoreResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(Error::from)?
            .unwrap_or_default())
    }
}

#[async_trait]
impl LessonPage for CdpPage {
    async fn goto(&self, url: &str) -> CoreResult<()> {
        tracing::debug!("goto {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| lectern_core::Error::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_load(&self, timeout: Duration) -> CoreResult<()> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(lectern_core::Error::Navigation(e.to_string())),
            Err(_) => Err(lectern_core::Error::Navigation(format!(
                "page did not finish loading within {}ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> CoreResult<()> {
        let glob = glob::Pattern::new(pattern)
            .map_err(|e| lectern_core::Error::Config(format!("url pattern '{}': {}", pattern, e)))?;
        let deadline = Instant::now() + timeout;
        loop {
            let url = self.current_url().await?;
            if glob.matches(&url) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(lectern_core::Error::Navigation(format!(
                    "url {} did not match {} within {}ms",
                    url,
                    pattern,
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn count(&self, locator: &Locator) -> CoreResult<usize> {
        Ok(self.resolve(locator).await?.len())
    }

    async fn inner_text(&self, locator: &Locator, timeout: Duration) -> CoreResult<Probe<String>> {
        let Some(element) = self.first_within(locator, timeout).await? else {
            return Ok(Probe::Timeout);
        };
        let text = element.inner_text().await.map_err(Error::from)?;
        Ok(match text {
            Some(text) => Probe::Found(text),
            None => Probe::NotFound,
        })
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> CoreResult<Probe<()>> {
        let Some(element) = self.first_within(locator, timeout).await? else {
            return Ok(Probe::Timeout);
        };
        element.scroll_into_view().await.map_err(Error::from)?;
        element.click().await.map_err(Error::from)?;
        Ok(Probe::Found(()))
    }

    async fn fill(&self, locator: &Locator, value: &str, timeout: Duration) -> CoreResult<Probe<()>> {
        let Some(element) = self.first_within(locator, timeout).await? else {
            return Ok(Probe::Timeout);
        };
        element.click().await.map_err(Error::from)?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(Error::from)?;
        element.type_str(value).await.map_err(Error::from)?;
        Ok(Probe::Found(()))
    }

    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> CoreResult<Probe<()>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.resolve(locator).await?.into_iter().next() {
                if let Ok(bbox) = element.bounding_box().await {
                    if bbox.width > 0.0 && bbox.height > 0.0 {
                        return Ok(Probe::Found(()));
                    }
                }
            }
            if Instant::now() >= deadline {
                return Ok(Probe::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn bounding_box(&self, locator: &Locator) -> CoreResult<Option<BoundingBox>> {
        let Some(element) = self.resolve(locator).await?.into_iter().next() else {
            return Ok(None);
        };
        match element.bounding_box().await {
            Ok(bbox) => Ok(Some(BoundingBox {
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
            })),
            Err(e) => {
                tracing::debug!("No bounding box for {}: {}", locator, e);
                Ok(None)
            }
        }
    }

    async fn mouse_click(&self, x: f64, y: f64) -> CoreResult<()> {
        self.page
            .click(Point { x, y })
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn press_key(&self, locator: &Locator, key: &str) -> CoreResult<bool> {
        let Some(element) = self.resolve(locator).await?.into_iter().next() else {
            return Ok(false);
        };
        if let Err(e) = element.focus().await {
            tracing::debug!("Could not focus {}: {}", locator, e);
            return Ok(false);
        }
        element
            .press_key(key_name(key))
            .await
            .map_err(Error::from)?;
        Ok(true)
    }

    async fn hrefs(&self, locator: &Locator, limit: usize) -> CoreResult<Vec<String>> {
        let selector = self.selector_for(locator).await?;
        let script = format!(
            "Array.from(document.querySelectorAll({})).slice(0, {}).map(e => e.href).filter(Boolean)",
            js_string(&selector),
            limit
        );
        let result = self.page.evaluate(script).await.map_err(Error::from)?;
        let hrefs: Vec<String> = result
            .into_value()
            .map_err(|e| Error::Cdp(format!("unexpected href list: {}", e)))?;
        Ok(hrefs)
    }

    async fn screenshot(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .map_err(Error::from)?;
        tracing::info!("Screenshot saved to {}", path.display());
        Ok(())
    }
}

/// CDP key names differ from the DOM `code` names the profile uses
fn key_name(key: &str) -> &str {
    match key {
        "Space" => " ",
        other => other,
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Tags elements with `role` whose accessible name matches `pattern`
///
/// The pattern runs as a JavaScript regex with the `i` flag.
fn role_script(role: &str, pattern: &str, tag: &str) -> String {
    format!(
        r#"(() => {{
    const role = {role};
    const re = new RegExp({pattern}, 'i');
    const tag = {tag};
    const implicit = {{
        button: 'button, input[type="button"], input[type="submit"]',
        link: 'a[href]',
        textbox: 'input:not([type]), input[type="text"], input[type="email"], textarea',
    }};
    document.querySelectorAll('[{attr}]').forEach(e => e.removeAttribute('{attr}'));
    const selector = `[role="${{role}}"]` + (implicit[role] ? ', ' + implicit[role] : '');
    for (const el of document.querySelectorAll(selector)) {{
        const name = (el.getAttribute('aria-label') || el.innerText || el.value || '').trim();
        if (re.test(name)) el.setAttribute('{attr}', tag);
    }}
    return tag;
}})()"#,
        role = js_string(role),
        pattern = js_string(pattern),
        tag = js_string(tag),
        attr = REF_ATTR,
    )
}

/// Tags the innermost elements whose visible text contains `text`
fn text_script(text: &str, tag: &str) -> String {
    format!(
        r#"(() => {{
    const needle = {text};
    const tag = {tag};
    document.querySelectorAll('[{attr}]').forEach(e => e.removeAttribute('{attr}'));
    for (const el of document.body ? document.body.querySelectorAll('*') : []) {{
        const own = el.innerText || '';
        if (!own.includes(needle)) continue;
        const deeper = Array.from(el.children).some(c => (c.innerText || '').includes(needle));
        if (!deeper) el.setAttribute('{attr}', tag);
    }}
    return tag;
}})()"#,
        text = js_string(text),
        tag = js_string(tag),
        attr = REF_ATTR,
    )
}
