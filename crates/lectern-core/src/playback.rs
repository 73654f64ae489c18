use crate::page::{LessonPage, Locator, Probe};
use crate::{PortalProfile, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which strategy got the video going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStrategy {
    Overlay,
    EmbeddedClick,
    EmbeddedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Started(PlaybackStrategy),
    /// Neither an overlay nor an embedded player exists on the page
    NotAttempted,
    Failed,
}

/// Advisory result of one play attempt; the walker waits regardless
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackAttemptResult {
    pub outcome: PlaybackOutcome,
    /// Screenshot captured when the attempt failed
    pub screenshot: Option<PathBuf>,
}

impl PlaybackAttemptResult {
    pub fn is_started(&self) -> bool {
        matches!(self.outcome, PlaybackOutcome::Started(_))
    }
}

impl fmt::Display for PlaybackAttemptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            PlaybackOutcome::Started(PlaybackStrategy::Overlay) => write!(f, "started via play overlay"),
            PlaybackOutcome::Started(PlaybackStrategy::EmbeddedClick) => {
                write!(f, "started by clicking the embedded player")
            }
            PlaybackOutcome::Started(PlaybackStrategy::EmbeddedKey) => {
                write!(f, "started with a key press on the embedded player")
            }
            PlaybackOutcome::NotAttempted => write!(f, "no player found"),
            PlaybackOutcome::Failed => match &self.screenshot {
                Some(path) => write!(f, "failed (screenshot: {})", path.display()),
                None => write!(f, "failed"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayClick {
    Absent,
    Clicked,
    /// Present (or unknown) but the click did not land
    Missed,
}

/// Tries to start lesson video playback, overlay first, then the embedded player
pub struct PlaybackTrigger {
    overlay: Locator,
    embedded: Locator,
    play_key: String,
    overlay_click: Duration,
    embedded_visible: Duration,
    double_click_gap: Duration,
    screenshot_dir: PathBuf,
}

impl PlaybackTrigger {
    pub fn new(profile: &PortalProfile, screenshot_dir: PathBuf) -> Self {
        Self {
            overlay: profile.selectors.play_overlay.clone(),
            embedded: profile.selectors.embedded_player.clone(),
            play_key: profile.play_key.clone(),
            overlay_click: profile.timeouts.overlay_click(),
            embedded_visible: profile.timeouts.embedded_visible(),
            double_click_gap: profile.timeouts.double_click_gap(),
            screenshot_dir,
        }
    }

    /// Upper bound on time spent inside [`try_start`](Self::try_start),
    /// excluding protocol latency
    pub fn max_blocking(&self) -> Duration {
        self.overlay_click + self.embedded_visible + self.double_click_gap
    }

    pub async fn try_start(&self, page: &dyn LessonPage, step: u32) -> PlaybackAttemptResult {
        let outcome = match self.attempt(page).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Play attempt on step {} failed: {}", step, e);
                PlaybackOutcome::Failed
            }
        };

        let screenshot = if outcome == PlaybackOutcome::Failed {
            self.capture(page, step).await
        } else {
            None
        };

        PlaybackAttemptResult {
            outcome,
            screenshot,
        }
    }

    async fn attempt(&self, page: &dyn LessonPage) -> Result<PlaybackOutcome> {
        let overlay = self.click_overlay(page).await;
        if overlay == OverlayClick::Clicked {
            return Ok(PlaybackOutcome::Started(PlaybackStrategy::Overlay));
        }

        if page.count(&self.embedded).await? == 0 {
            tracing::debug!("No embedded player on page");
            return Ok(match overlay {
                OverlayClick::Absent => PlaybackOutcome::NotAttempted,
                _ => PlaybackOutcome::Failed,
            });
        }

        if page
            .wait_visible(&self.embedded, self.embedded_visible)
            .await?
            .is_found()
        {
            if let Some(bbox) = page.bounding_box(&self.embedded).await? {
                if !bbox.is_empty() {
                    let (x, y) = bbox.center();
                    tracing::debug!("Clicking embedded player at ({}, {})", x, y);
                    // Some players only start on the second click
                    page.mouse_click(x, y).await?;
                    tokio::time::sleep(self.double_click_gap).await;
                    page.mouse_click(x, y).await?;
                    return Ok(PlaybackOutcome::Started(PlaybackStrategy::EmbeddedClick));
                }
            }
            tracing::debug!("Embedded player has no usable bounding box");
        } else {
            tracing::debug!(
                "Embedded player not visible after {}ms",
                self.embedded_visible.as_millis()
            );
        }

        if page.press_key(&self.embedded, &self.play_key).await? {
            tokio::time::sleep(self.double_click_gap).await;
            return Ok(PlaybackOutcome::Started(PlaybackStrategy::EmbeddedKey));
        }

        Ok(PlaybackOutcome::Failed)
    }

    /// Overlay failures of any kind fall through to the next strategy
    async fn click_overlay(&self, page: &dyn LessonPage) -> OverlayClick {
        match page.count(&self.overlay).await {
            Ok(0) => OverlayClick::Absent,
            Ok(_) => match page.click(&self.overlay, self.overlay_click).await {
                Ok(Probe::Found(())) => OverlayClick::Clicked,
                Ok(probe) => {
                    tracing::debug!("Play overlay click gave {:?}", probe);
                    OverlayClick::Missed
                }
                Err(e) => {
                    tracing::debug!("Play overlay click failed: {}", e);
                    OverlayClick::Missed
                }
            },
            Err(e) => {
                tracing::debug!("Play overlay lookup failed: {}", e);
                OverlayClick::Missed
            }
        }
    }

    async fn capture(&self, page: &dyn LessonPage, step: u32) -> Option<PathBuf> {
        let path = self
            .screenshot_dir
            .join(format!("play-failure-step-{}.png", step));
        match page.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!("Could not capture screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}
