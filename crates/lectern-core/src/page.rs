use crate::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// How an element is located on the page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum Locator {
    /// CSS selector, first match in document order
    Css(String),
    /// ARIA role whose accessible name matches `name` (case-insensitive)
    Role {
        role: String,
        #[serde(with = "regex_serde")]
        name: Regex,
    },
    /// Element whose visible text contains the given string
    Text(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// Role locator; `name` is a regex matched case-insensitively.
    ///
    /// Panics on an invalid pattern, so only use it with literals.
    pub fn role(role: impl Into<String>, name: &str) -> Self {
        Locator::Role {
            role: role.into(),
            name: regex_serde::case_insensitive(name).expect("invalid role name pattern"),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css={}", selector),
            Locator::Role { role, name } => write!(f, "role={}[name=/{}/i]", role, name.as_str()),
            Locator::Text(text) => write!(f, "text={}", text),
        }
    }
}

/// Outcome of a bounded DOM lookup
///
/// Lookups that may legitimately come up empty return this instead of an
/// error, leaving the caller to pick the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Found(T),
    NotFound,
    Timeout,
}

impl<T> Probe<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Probe::Found(value) => Some(value),
            Probe::NotFound | Probe::Timeout => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Found(value) => Probe::Found(f(value)),
            Probe::NotFound => Probe::NotFound,
            Probe::Timeout => Probe::Timeout,
        }
    }
}

/// Element rectangle in CSS pixels, relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Capabilities the walker and portal flows need from a live browser page
///
/// One handle is shared by every component and used by one logical thread
/// of control at a time. Navigation methods fail hard; lookup methods report
/// absence through [`Probe`] and reserve `Err` for a broken page handle.
#[async_trait]
pub trait LessonPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait for the navigation triggered by the last interaction to settle
    async fn wait_for_load(&self, timeout: Duration) -> Result<()>;

    /// Wait until the current URL matches a glob such as `**/home`
    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> Result<()>;

    async fn count(&self, locator: &Locator) -> Result<usize>;

    async fn inner_text(&self, locator: &Locator, timeout: Duration) -> Result<Probe<String>>;

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<Probe<()>>;

    async fn fill(&self, locator: &Locator, value: &str, timeout: Duration) -> Result<Probe<()>>;

    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<Probe<()>>;

    async fn bounding_box(&self, locator: &Locator) -> Result<Option<BoundingBox>>;

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()>;

    /// Focus the element and press `key`; `false` if it cannot take focus
    async fn press_key(&self, locator: &Locator, key: &str) -> Result<bool>;

    /// `href` of up to `limit` matching anchors, in document order
    async fn hrefs(&self, locator: &Locator, limit: usize) -> Result<Vec<String>>;

    async fn screenshot(&self, path: &Path) -> Result<()>;
}

mod regex_serde {
    use regex::{Regex, RegexBuilder};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(pattern).case_insensitive(true).build()
    }

    pub fn serialize<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(regex.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        case_insensitive(&pattern).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_locator_is_case_insensitive() {
        let locator = Locator::role("button", r"Avan\w*çar");
        match locator {
            Locator::Role { name, .. } => {
                assert!(name.is_match("AVANÇAR"));
                assert!(name.is_match("Avançar para próxima"));
                assert!(!name.is_match("Voltar"));
            }
            other => panic!("unexpected locator {:?}", other),
        }
    }

    #[test]
    fn test_locator_json_round_trip_keeps_case_insensitivity() {
        let json = r#"{"by":"role","value":{"role":"button","name":"next"}}"#;
        let locator: Locator = serde_json::from_str(json).unwrap();
        match &locator {
            Locator::Role { role, name } => {
                assert_eq!(role, "button");
                assert!(name.is_match("NEXT lesson"));
            }
            other => panic!("unexpected locator {:?}", other),
        }

        let css: Locator = serde_json::from_str(r#"{"by":"css","value":"p.time"}"#).unwrap();
        assert_eq!(css.to_string(), "css=p.time");
    }

    #[test]
    fn test_invalid_role_pattern_is_rejected() {
        let json = r#"{"by":"role","value":{"role":"button","name":"("}}"#;
        assert!(serde_json::from_str::<Locator>(json).is_err());
    }

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(bbox.center(), (60.0, 45.0));
        assert!(!bbox.is_empty());
    }

    #[test]
    fn test_probe_helpers() {
        assert_eq!(Probe::Found(2).map(|n| n * 2), Probe::Found(4));
        assert_eq!(Probe::<u8>::Timeout.found(), None);
        assert!(!Probe::<()>::NotFound.is_found());
    }
}
