use crate::{DurationPolicy, Error, Locator, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything portal-specific: URLs, selectors, timing constants
///
/// Defaults target PUCRS Campus Digital. Any subset of fields can be
/// overridden from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalProfile {
    pub login_url: String,
    pub home_url: String,
    /// Glob the URL must match once sign-in completes
    pub home_url_pattern: String,
    pub selectors: Selectors,
    pub timeouts: Timeouts,
    pub duration: DurationPolicy,
    /// Courses taken from the top of the course list
    pub course_count: usize,
    /// Key sent to the embedded player when it cannot be clicked
    pub play_key: String,
}

impl Default for PortalProfile {
    fn default() -> Self {
        Self {
            login_url: "https://campusdigital.pucrs.br/login".to_string(),
            home_url: "https://campusdigital.pucrs.br/home".to_string(),
            home_url_pattern: "**/home".to_string(),
            selectors: Selectors::default(),
            timeouts: Timeouts::default(),
            duration: DurationPolicy::default(),
            course_count: 2,
            play_key: "Space".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub sign_in: Locator,
    pub email_input: Locator,
    pub password_input: Locator,
    pub submit: Locator,
    /// Only present when the identity provider asks to stay signed in
    pub stay_signed_in: Locator,
    pub see_courses: Locator,
    pub course_links: Locator,
    pub duration_label: Locator,
    /// Extra lesson labels echoed to the log, never required
    pub context_labels: Vec<Locator>,
    pub play_overlay: Locator,
    pub embedded_player: Locator,
    /// Tried in order; the first locator with a match is clicked
    pub advance: Vec<Locator>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            sign_in: Locator::role("button", "^\\s*Entrar\\s*$"),
            email_input: Locator::css(r#"input[type="email"]"#),
            password_input: Locator::css(r#"input[name="passwd"]"#),
            submit: Locator::css(r#"input[type="submit"]"#),
            stay_signed_in: Locator::css("#KmsiCheckboxField"),
            see_courses: Locator::css(r#"button[data-cy="buttonSeeDisciplines"]"#),
            course_links: Locator::css(
                "a.MuiTypography-root.MuiLink-root.MuiLink-underlineHover.MuiTypography-colorPrimary",
            ),
            duration_label: Locator::css(r#"p[data-cy="timePartLesson"]"#),
            context_labels: vec![
                Locator::css("div.infoCard"),
                Locator::css(r#"div[data-cy="partLesson"]"#),
            ],
            play_overlay: Locator::css(r#"button[data-play-button="true"]"#),
            embedded_player: Locator::css(r#"iframe[src*="player.vimeo.com"]"#),
            advance: vec![
                Locator::role("button", r"Avan\w*çar"),
                Locator::text("Avançar"),
            ],
        }
    }
}

/// Bounds for individual interaction steps, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub duration_probe_ms: u64,
    pub context_probe_ms: u64,
    pub overlay_click_ms: u64,
    pub embedded_visible_ms: u64,
    pub double_click_gap_ms: u64,
    /// Pause after the play attempt, before the lesson wait starts
    pub settle_ms: u64,
    pub advance_click_ms: u64,
    pub advance_load_ms: u64,
    pub sign_in_field_ms: u64,
    pub stay_signed_in_ms: u64,
    pub home_url_ms: u64,
    pub course_list_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            duration_probe_ms: 5_000,
            context_probe_ms: 2_000,
            overlay_click_ms: 3_000,
            embedded_visible_ms: 10_000,
            double_click_gap_ms: 500,
            settle_ms: 1_500,
            advance_click_ms: 10_000,
            advance_load_ms: 60_000,
            sign_in_field_ms: 45_000,
            stay_signed_in_ms: 15_000,
            home_url_ms: 60_000,
            course_list_ms: 60_000,
        }
    }
}

impl Timeouts {
    pub fn duration_probe(&self) -> Duration {
        Duration::from_millis(self.duration_probe_ms)
    }

    pub fn context_probe(&self) -> Duration {
        Duration::from_millis(self.context_probe_ms)
    }

    pub fn overlay_click(&self) -> Duration {
        Duration::from_millis(self.overlay_click_ms)
    }

    pub fn embedded_visible(&self) -> Duration {
        Duration::from_millis(self.embedded_visible_ms)
    }

    pub fn double_click_gap(&self) -> Duration {
        Duration::from_millis(self.double_click_gap_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn advance_click(&self) -> Duration {
        Duration::from_millis(self.advance_click_ms)
    }

    pub fn advance_load(&self) -> Duration {
        Duration::from_millis(self.advance_load_ms)
    }

    pub fn sign_in_field(&self) -> Duration {
        Duration::from_millis(self.sign_in_field_ms)
    }

    pub fn stay_signed_in(&self) -> Duration {
        Duration::from_millis(self.stay_signed_in_ms)
    }

    pub fn home_url(&self) -> Duration {
        Duration::from_millis(self.home_url_ms)
    }

    pub fn course_list(&self) -> Duration {
        Duration::from_millis(self.course_list_ms)
    }
}

impl PortalProfile {
    /// Load a profile from JSON; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading portal profile from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let profile: PortalProfile = serde_json::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.course_count == 0 {
            return Err(Error::Config("course_count must be at least 1".to_string()));
        }
        if self.selectors.advance.is_empty() {
            return Err(Error::Config(
                "selectors.advance needs at least one locator".to_string(),
            ));
        }
        for (field, value) in [("login_url", &self.login_url), ("home_url", &self.home_url)] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{} '{}': {}", field, value, e)))?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_profile_is_valid() {
        let profile = PortalProfile::default();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.course_count, 2);
        assert_eq!(profile.duration.buffer_secs, 60);
        assert_eq!(profile.duration.fallback_secs, 300);
        assert_eq!(profile.timeouts.overlay_click(), Duration::from_secs(3));
        assert_eq!(profile.timeouts.advance_click(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"duration": {{"buffer_secs": 30}}, "timeouts": {{"settle_ms": 0}}}}"#
        )
        .unwrap();

        let profile = PortalProfile::from_file(file.path()).unwrap();
        assert_eq!(profile.duration.buffer_secs, 30);
        assert_eq!(profile.duration.fallback_secs, 300);
        assert_eq!(profile.timeouts.settle_ms, 0);
        assert_eq!(profile.timeouts.duration_probe_ms, 5_000);
        assert_eq!(profile.login_url, "https://campusdigital.pucrs.br/login");
    }

    #[test]
    fn test_json_round_trip() {
        let json = PortalProfile::default().to_json().unwrap();
        let profile: PortalProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile.selectors.advance.len(), 2);
        assert_eq!(profile.home_url_pattern, "**/home");
    }

    #[test]
    fn test_rejects_zero_courses() {
        let profile = PortalProfile {
            course_count: 0,
            ..PortalProfile::default()
        };
        assert!(matches!(profile.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"login_url": "not a url"}}"#).unwrap();

        let err = PortalProfile::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("login_url"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PortalProfile::from_file(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
