use crate::{CdpPage, Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;

const VIEWPORT_WIDTH: u32 = 1366;
const VIEWPORT_HEIGHT: u32 = 768;

/// Starts Chrome under CDP control with a fixed desktop viewport
pub struct BrowserLauncher {
    chrome_path: PathBuf,
    profile_path: PathBuf,
    headless: bool,
}

impl BrowserLauncher {
    pub fn new(chrome_path: PathBuf, profile_path: PathBuf) -> Self {
        Self {
            chrome_path,
            profile_path,
            headless: true,
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Launch Chrome and open a blank page
    pub async fn launch(&self) -> Result<BrowserSession> {
        tracing::info!(
            "Launching Chrome {} ({})",
            self.chrome_path.display(),
            if self.headless { "headless" } else { "headed" }
        );

        let (browser, mut handler) = Browser::launch(self.build_config()?).await?;

        // The handler drives the CDP connection; commands stall without it
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        tracing::info!("Chrome ready");

        Ok(BrowserSession {
            browser,
            handler_task,
            page: CdpPage::new(page),
        })
    }

    fn build_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .user_data_dir(&self.profile_path)
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .viewport(Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                ..Viewport::default()
            })
            .args(self.build_args());

        if !self.headless {
            builder = builder.with_head();
        }

        builder.build().map_err(Error::Launch)
    }

    /// Extra Chrome flags on top of chromiumoxide's defaults
    fn build_args(&self) -> Vec<String> {
        vec![
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            // Lesson videos must start without a user gesture
            "--autoplay-policy=no-user-gesture-required".to_string(),
            "--mute-audio".to_string(),
        ]
    }
}

/// A running browser together with the page lessons are played on
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: CdpPage,
}

impl BrowserSession {
    pub fn page(&self) -> &CdpPage {
        &self.page
    }

    pub async fn close(mut self) -> Result<()> {
        tracing::debug!("Closing Chrome");
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        closed?;
        Ok(())
    }
}
