use crate::page::{LessonPage, Locator, Probe};
use crate::playback::{PlaybackAttemptResult, PlaybackTrigger};
use crate::reporter::{Group, Reporter};
use crate::{CourseLink, DurationParser, DurationSpec, Error, PortalProfile, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Phases of one lesson page, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    Navigated,
    TimeProbed,
    PlaybackAttempted,
    Waiting,
    AdvanceChecked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Continue,
    Terminal,
}

/// What happened on a single lesson page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPageState {
    /// 1-based, restarts for every course
    pub step: u32,
    pub duration: DurationSpec,
    pub playback: PlaybackAttemptResult,
    pub advance_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub link: CourseLink,
    /// Every page visited in order; only the last lacks an advance control
    pub lessons: Vec<LessonPageState>,
}

impl CourseSummary {
    pub fn pages(&self) -> u32 {
        self.lessons.len() as u32
    }

    /// Pages where playback could not be confirmed
    pub fn unconfirmed_playback(&self) -> u32 {
        self.lessons
            .iter()
            .filter(|lesson| !lesson.playback.is_started())
            .count() as u32
    }
}

/// Walks one course page by page until no advance control remains
pub struct LessonWalker {
    parser: DurationParser,
    trigger: PlaybackTrigger,
    duration_label: Locator,
    context_labels: Vec<Locator>,
    advance: Vec<Locator>,
    duration_probe: Duration,
    context_probe: Duration,
    settle: Duration,
    advance_click: Duration,
    advance_load: Duration,
    cancel: CancellationToken,
}

impl LessonWalker {
    pub fn new(profile: &PortalProfile, screenshot_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            parser: DurationParser::new(profile.duration),
            trigger: PlaybackTrigger::new(profile, screenshot_dir),
            duration_label: profile.selectors.duration_label.clone(),
            context_labels: profile.selectors.context_labels.clone(),
            advance: profile.selectors.advance.clone(),
            duration_probe: profile.timeouts.duration_probe(),
            context_probe: profile.timeouts.context_probe(),
            settle: profile.timeouts.settle(),
            advance_click: profile.timeouts.advance_click(),
            advance_load: profile.timeouts.advance_load(),
            cancel,
        }
    }

    /// Open `link` and play every lesson page of the course
    ///
    /// Navigation failures, a failed post-advance load and cancellation
    /// are returned as errors. Everything else degrades to a default and
    /// is reported as a warning.
    pub async fn run(
        &self,
        page: &dyn LessonPage,
        link: &CourseLink,
        reporter: &dyn Reporter,
    ) -> Result<CourseSummary> {
        let _course = Group::open(reporter, &format!("Course: {}", link));
        reporter.notice(&format!("Opening course: {}", link));
        page.goto(link.as_str()).await?;
        tracing::debug!("Walker state {:?}", WalkerState::Navigated);

        let mut lessons = Vec::new();
        let mut step: u32 = 1;

        loop {
            let _lesson = Group::open(reporter, &format!("Lesson page {}", step));

            let mut state = self.visit(page, step, reporter).await?;
            let advance = self.find_advance(page).await;
            state.advance_present = advance.is_some();
            tracing::debug!("Walker state {:?}: {:?}", WalkerState::AdvanceChecked, state);
            lessons.push(state);

            let transition = match advance {
                Some(locator) => {
                    self.advance(page, locator, reporter).await?;
                    Transition::Continue
                }
                None => {
                    reporter.notice("No advance control, course complete");
                    Transition::Terminal
                }
            };
            if transition == Transition::Terminal {
                break;
            }
            step += 1;
        }

        tracing::info!("Finished {} after {} page(s)", link, lessons.len());

        Ok(CourseSummary {
            link: link.clone(),
            lessons,
        })
    }

    /// Probe, play and wait on the current page
    async fn visit(
        &self,
        page: &dyn LessonPage,
        step: u32,
        reporter: &dyn Reporter,
    ) -> Result<LessonPageState> {
        self.log_context(page, reporter).await;

        let duration = self.probe_duration(page, reporter).await;
        tracing::debug!("Walker state {:?}: {}", WalkerState::TimeProbed, duration);

        let playback = self.trigger.try_start(page, step).await;
        tracing::debug!("Walker state {:?}: {}", WalkerState::PlaybackAttempted, playback);
        if playback.is_started() {
            reporter.notice(&format!("Playback {}", playback));
        } else {
            reporter.warn(&format!(
                "Playback {}; waiting anyway without confirmation",
                playback
            ));
        }

        tracing::debug!("Walker state {:?}", WalkerState::Waiting);
        wait_or_cancel(self.settle, &self.cancel).await?;
        reporter.notice(&format!("Waiting {}s", duration.secs()));
        wait_or_cancel(duration.as_duration(), &self.cancel).await?;

        Ok(LessonPageState {
            step,
            duration,
            playback,
            // Set by the caller after the advance check
            advance_present: false,
        })
    }

    async fn probe_duration(&self, page: &dyn LessonPage, reporter: &dyn Reporter) -> DurationSpec {
        match page.inner_text(&self.duration_label, self.duration_probe).await {
            Ok(Probe::Found(text)) => {
                let text = text.trim();
                let spec = self.parser.parse(text);
                if spec.is_fallback() {
                    reporter.warn(&format!(
                        "Unrecognized lesson length '{}', using fallback of {}s",
                        text,
                        spec.secs()
                    ));
                } else {
                    reporter.notice(&format!(
                        "Lesson length: {} (+{}s buffer) => {}s",
                        text,
                        self.parser.policy().buffer_secs,
                        spec.secs()
                    ));
                }
                spec
            }
            Ok(probe) => {
                let spec = self.parser.fallback();
                tracing::debug!("Duration label probe: {:?}", probe);
                reporter.warn(&format!(
                    "Lesson length not found, using fallback of {}s",
                    spec.secs()
                ));
                spec
            }
            Err(e) => {
                let spec = self.parser.fallback();
                reporter.warn(&format!(
                    "Could not read lesson length ({}), using fallback of {}s",
                    e,
                    spec.secs()
                ));
                spec
            }
        }
    }

    async fn log_context(&self, page: &dyn LessonPage, reporter: &dyn Reporter) {
        for label in &self.context_labels {
            if !matches!(page.count(label).await, Ok(n) if n > 0) {
                continue;
            }
            if let Ok(Probe::Found(text)) = page.inner_text(label, self.context_probe).await {
                let text = text.trim();
                if !text.is_empty() {
                    reporter.notice(text);
                }
            }
        }
    }

    async fn find_advance(&self, page: &dyn LessonPage) -> Option<&Locator> {
        for locator in &self.advance {
            match page.count(locator).await {
                Ok(0) => {}
                Ok(_) => return Some(locator),
                Err(e) => tracing::warn!("Advance lookup for {} failed: {}", locator, e),
            }
        }
        None
    }

    /// Click the advance control and wait for the next page to load
    async fn advance(&self, page: &dyn LessonPage, locator: &Locator, reporter: &dyn Reporter) -> Result<()> {
        reporter.notice("Advancing to the next lesson page");
        match page.click(locator, self.advance_click).await? {
            Probe::Found(()) => {}
            probe => {
                return Err(Error::Navigation(format!(
                    "advance control {} could not be clicked ({:?})",
                    locator, probe
                )));
            }
        }
        page.wait_for_load(self.advance_load).await
    }
}

/// Sleep for `duration` unless `cancel` fires first
pub async fn wait_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = cancel.cancelled() => Err(Error::Cancelled),
    }
}
