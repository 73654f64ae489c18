//! Scripted in-memory page used by the engine tests

use crate::page::{BoundingBox, LessonPage, Locator, Probe};
use crate::reporter::Reporter;
use crate::{Error, PortalProfile, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Label {
    Text(String),
    Missing,
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay {
    Absent,
    Clickable,
    Stuck,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Embedded {
    Absent,
    Visible(BoundingBox),
    /// Visible but reports no geometry
    NoBox,
    /// Never becomes visible; focusable for key presses
    Hidden,
    /// Any interaction fails at the protocol level
    Broken,
}

/// Ways the step from one lesson page to the next can break
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceFault {
    /// Counting the advance control errors at the protocol level
    LookupFails,
    /// The control is listed but clicking it times out
    ClickTimesOut,
    /// The click lands but the next page never loads
    LoadFails,
}

#[derive(Debug, Clone)]
pub struct FakeLesson {
    pub duration: Label,
    pub context: Option<String>,
    pub overlay: Overlay,
    pub embedded: Embedded,
    pub has_advance: bool,
    pub advance_fault: Option<AdvanceFault>,
}

impl FakeLesson {
    pub fn new(duration: &str) -> Self {
        Self {
            duration: Label::Text(duration.to_string()),
            context: None,
            overlay: Overlay::Clickable,
            embedded: Embedded::Absent,
            has_advance: true,
            advance_fault: None,
        }
    }

    pub fn last(mut self) -> Self {
        self.has_advance = false;
        self
    }

    pub fn duration(mut self, label: Label) -> Self {
        self.duration = label;
        self
    }

    pub fn overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn embedded(mut self, embedded: Embedded) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn advance_fault(mut self, fault: AdvanceFault) -> Self {
        self.advance_fault = Some(fault);
        self
    }

    pub fn context(mut self, text: &str) -> Self {
        self.context = Some(text.to_string());
        self
    }
}

/// Sign-in and course-list behaviour of the fake portal
#[derive(Debug, Clone)]
pub struct FakePortal {
    pub stay_signed_in_prompt: bool,
    pub reaches_home: bool,
    pub course_hrefs: Vec<String>,
}

impl Default for FakePortal {
    fn default() -> Self {
        Self {
            stay_signed_in_prompt: false,
            reaches_home: true,
            course_hrefs: vec![
                "https://portal.test/course/a".to_string(),
                "https://portal.test/course/b".to_string(),
                "https://portal.test/course/c".to_string(),
            ],
        }
    }
}

#[derive(Default)]
struct State {
    course: Option<String>,
    lesson: usize,
    url: String,
    events: Vec<String>,
    pending_advance: bool,
}

pub struct FakePage {
    profile: PortalProfile,
    courses: HashMap<String, Vec<FakeLesson>>,
    portal: FakePortal,
    failing_gotos: Vec<String>,
    state: Mutex<State>,
}

impl FakePage {
    pub fn new(profile: &PortalProfile) -> Self {
        Self {
            profile: profile.clone(),
            courses: HashMap::new(),
            portal: FakePortal::default(),
            failing_gotos: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_course(mut self, url: &str, lessons: Vec<FakeLesson>) -> Self {
        self.courses.insert(url.to_string(), lessons);
        self
    }

    pub fn with_portal(mut self, portal: FakePortal) -> Self {
        self.portal = portal;
        self
    }

    pub fn failing_goto(mut self, url: &str) -> Self {
        self.failing_gotos.push(url.to_string());
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn count_events(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn record(&self, event: String) {
        self.state.lock().unwrap().events.push(event);
    }

    fn current_lesson(&self) -> Option<FakeLesson> {
        let state = self.state.lock().unwrap();
        let course = state.course.as_ref()?;
        self.courses.get(course)?.get(state.lesson).cloned()
    }

    fn is(&self, locator: &Locator, expected: &Locator) -> bool {
        locator.to_string() == expected.to_string()
    }

    fn is_advance(&self, locator: &Locator) -> bool {
        self.profile
            .selectors
            .advance
            .iter()
            .any(|candidate| self.is(locator, candidate))
    }

    fn present(&self, locator: &Locator) -> usize {
        let selectors = &self.profile.selectors;
        let lesson = self.current_lesson();
        let url = self.state.lock().unwrap().url.clone();
        let on_portal = url == self.profile.login_url || url == self.profile.home_url;

        if let Some(lesson) = lesson.filter(|_| !on_portal) {
            if self.is(locator, &selectors.duration_label) {
                return matches!(lesson.duration, Label::Text(_)) as usize;
            }
            if self.is(locator, &selectors.play_overlay) {
                return (lesson.overlay != Overlay::Absent) as usize;
            }
            if self.is(locator, &selectors.embedded_player) {
                return (lesson.embedded != Embedded::Absent) as usize;
            }
            if self.is_advance(locator) {
                return lesson.has_advance as usize;
            }
            if selectors
                .context_labels
                .iter()
                .any(|label| self.is(locator, label))
            {
                return lesson.context.is_some() as usize;
            }
            return 0;
        }

        if self.is(locator, &selectors.stay_signed_in) {
            return self.portal.stay_signed_in_prompt as usize;
        }
        if self.is(locator, &selectors.course_links) {
            return self.portal.course_hrefs.len();
        }
        let portal_controls = [
            &selectors.sign_in,
            &selectors.email_input,
            &selectors.password_input,
            &selectors.submit,
            &selectors.see_courses,
        ];
        portal_controls
            .iter()
            .any(|control| self.is(locator, control)) as usize
    }

    fn embedded_broken(&self, locator: &Locator) -> bool {
        self.is(locator, &self.profile.selectors.embedded_player)
            && self
                .current_lesson()
                .map(|lesson| lesson.embedded == Embedded::Broken)
                .unwrap_or(false)
    }

    fn advance_fault(&self, locator: &Locator) -> Option<AdvanceFault> {
        if !self.is_advance(locator) {
            return None;
        }
        self.current_lesson().and_then(|lesson| lesson.advance_fault)
    }

    async fn time_out(&self, timeout: Duration) {
        tokio::time::sleep(timeout).await;
    }
}

#[async_trait]
impl LessonPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        if self.failing_gotos.iter().any(|failing| failing == url) {
            return Err(Error::Navigation(format!("net::ERR_CONNECTION_REFUSED at {}", url)));
        }
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        if self.courses.contains_key(url) {
            state.course = Some(url.to_string());
            state.lesson = 0;
        }
        Ok(())
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        self.record("wait_for_load".to_string());
        let mut state = self.state.lock().unwrap();
        if state.pending_advance {
            state.pending_advance = false;
            state.lesson += 1;
            Ok(())
        } else {
            Err(Error::Navigation(format!(
                "no navigation within {}ms",
                timeout.as_millis()
            )))
        }
    }

    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> Result<()> {
        self.record(format!("wait_for_url {}", pattern));
        if self.portal.reaches_home {
            self.state.lock().unwrap().url = self.profile.home_url.clone();
            Ok(())
        } else {
            self.time_out(timeout).await;
            Err(Error::Navigation(format!("url never matched {}", pattern)))
        }
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        if self.embedded_broken(locator) {
            return Ok(1);
        }
        if self.advance_fault(locator) == Some(AdvanceFault::LookupFails) {
            return Err(Error::Browser("Execution context was destroyed".to_string()));
        }
        Ok(self.present(locator))
    }

    async fn inner_text(&self, locator: &Locator, timeout: Duration) -> Result<Probe<String>> {
        let lesson = self.current_lesson();
        if self.is(locator, &self.profile.selectors.duration_label) {
            return match lesson.map(|l| l.duration) {
                Some(Label::Text(text)) => Ok(Probe::Found(text)),
                Some(Label::Broken) => Err(Error::Browser("Target closed".to_string())),
                Some(Label::Missing) | None => {
                    self.time_out(timeout).await;
                    Ok(Probe::Timeout)
                }
            };
        }
        match lesson.and_then(|l| l.context) {
            Some(text) if self.present(locator) > 0 => Ok(Probe::Found(text)),
            _ => {
                self.time_out(timeout).await;
                Ok(Probe::Timeout)
            }
        }
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<Probe<()>> {
        if self.present(locator) == 0 {
            self.time_out(timeout).await;
            return Ok(Probe::Timeout);
        }
        if self.is(locator, &self.profile.selectors.play_overlay)
            && self.current_lesson().map(|l| l.overlay) == Some(Overlay::Stuck)
        {
            self.time_out(timeout).await;
            return Ok(Probe::Timeout);
        }
        let fault = self.advance_fault(locator);
        if fault == Some(AdvanceFault::ClickTimesOut) {
            self.time_out(timeout).await;
            return Ok(Probe::Timeout);
        }
        self.record(format!("click {}", locator));
        if self.is_advance(locator) && fault != Some(AdvanceFault::LoadFails) {
            self.state.lock().unwrap().pending_advance = true;
        }
        Ok(Probe::Found(()))
    }

    async fn fill(&self, locator: &Locator, value: &str, timeout: Duration) -> Result<Probe<()>> {
        if self.present(locator) == 0 {
            self.time_out(timeout).await;
            return Ok(Probe::Timeout);
        }
        self.record(format!("fill {} len={}", locator, value.len()));
        Ok(Probe::Found(()))
    }

    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<Probe<()>> {
        if self.embedded_broken(locator) {
            return Err(Error::Browser("Execution context was destroyed".to_string()));
        }
        let visible = self.is(locator, &self.profile.selectors.embedded_player)
            && matches!(
                self.current_lesson().map(|l| l.embedded),
                Some(Embedded::Visible(_)) | Some(Embedded::NoBox)
            );
        if visible {
            Ok(Probe::Found(()))
        } else {
            self.time_out(timeout).await;
            Ok(Probe::Timeout)
        }
    }

    async fn bounding_box(&self, locator: &Locator) -> Result<Option<BoundingBox>> {
        if !self.is(locator, &self.profile.selectors.embedded_player) {
            return Ok(None);
        }
        Ok(match self.current_lesson().map(|l| l.embedded) {
            Some(Embedded::Visible(bbox)) => Some(bbox),
            _ => None,
        })
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()> {
        self.record(format!("mouse_click {},{}", x, y));
        Ok(())
    }

    async fn press_key(&self, locator: &Locator, key: &str) -> Result<bool> {
        let focusable = self.is(locator, &self.profile.selectors.embedded_player)
            && matches!(
                self.current_lesson().map(|l| l.embedded),
                Some(Embedded::NoBox) | Some(Embedded::Hidden)
            );
        if focusable {
            self.record(format!("press_key {}", key));
        }
        Ok(focusable)
    }

    async fn hrefs(&self, locator: &Locator, limit: usize) -> Result<Vec<String>> {
        if !self.is(locator, &self.profile.selectors.course_links) {
            return Ok(Vec::new());
        }
        Ok(self.portal.course_hrefs.iter().take(limit).cloned().collect())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot {}", path.display()));
        Ok(())
    }
}

/// Reporter that keeps every line for assertions
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Reporter for RecordingReporter {
    fn group_start(&self, title: &str) {
        self.push(format!("group {}", title));
    }

    fn group_end(&self) {
        self.push("endgroup".to_string());
    }

    fn notice(&self, msg: &str) {
        self.push(format!("notice {}", msg));
    }

    fn warn(&self, msg: &str) {
        self.push(format!("warn {}", msg));
    }

    fn fail(&self, msg: &str) {
        self.push(format!("fail {}", msg));
    }
}

/// Default profile with the settle pause removed so waits equal durations
pub fn test_profile() -> PortalProfile {
    let mut profile = PortalProfile::default();
    profile.timeouts.settle_ms = 0;
    profile
}
