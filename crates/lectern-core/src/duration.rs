use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

lazy_static! {
    // ASCII digits only; `\d` would also match digits `u64::from_str` rejects
    static ref CLOCK_PATTERN: Regex = Regex::new(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?$").unwrap();
    static ref HOURS_PATTERN: Regex = Regex::new(r"([0-9]+)\s*h").unwrap();
    static ref MINUTES_PATTERN: Regex = Regex::new(r"([0-9]+)\s*m").unwrap();
    static ref SECONDS_PATTERN: Regex = Regex::new(r"([0-9]+)\s*s").unwrap();
}

/// Tunable constants applied on top of the scraped lesson length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationPolicy {
    /// Added to every successfully parsed duration
    pub buffer_secs: u64,
    /// Used as-is when nothing could be parsed
    pub fallback_secs: u64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            buffer_secs: 60,
            fallback_secs: 5 * 60,
        }
    }
}

/// Where a [`DurationSpec`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationSource {
    /// Parsed from the label; the buffer is already included
    Parsed,
    /// Label unreadable or unrecognized
    Fallback,
}

/// How long to stay on one lesson page, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSpec {
    secs: u64,
    source: DurationSource,
}

impl DurationSpec {
    pub fn parsed(secs: u64) -> Self {
        Self {
            secs,
            source: DurationSource::Parsed,
        }
    }

    pub fn fallback(secs: u64) -> Self {
        Self {
            secs,
            source: DurationSource::Fallback,
        }
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }

    pub fn source(&self) -> DurationSource {
        self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DurationSource::Fallback
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            DurationSource::Parsed => write!(f, "{}s", self.secs),
            DurationSource::Fallback => write!(f, "{}s (fallback)", self.secs),
        }
    }
}

/// Turns a free-form lesson length label into a wait time
///
/// Recognized forms, first match wins:
/// - clock style `M:SS` / `H:MM:SS` (leading component of 1-2 digits)
/// - any combination of `<n>h`, `<n>m`, `<n>s`
///
/// Recognized labels get the policy buffer added; anything else yields the
/// fallback unchanged. Parsing never fails.
#[derive(Debug, Clone, Default)]
pub struct DurationParser {
    policy: DurationPolicy,
}

impl DurationParser {
    pub fn new(policy: DurationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DurationPolicy {
        self.policy
    }

    pub fn parse(&self, text: &str) -> DurationSpec {
        match Self::base_seconds(text) {
            Some(base) => DurationSpec::parsed(base.saturating_add(self.policy.buffer_secs)),
            None => self.fallback(),
        }
    }

    pub fn fallback(&self) -> DurationSpec {
        DurationSpec::fallback(self.policy.fallback_secs)
    }

    /// Seconds described by `text` before any buffer, or `None` if no
    /// temporal component is recognized
    pub fn base_seconds(text: &str) -> Option<u64> {
        let normalized = text.trim().to_lowercase();

        if let Some(caps) = CLOCK_PATTERN.captures(&normalized) {
            let first: u64 = caps[1].parse().ok()?;
            let second: u64 = caps[2].parse().ok()?;
            return Some(match caps.get(3) {
                Some(third) => {
                    let third: u64 = third.as_str().parse().ok()?;
                    first * 3600 + second * 60 + third
                }
                None => first * 60 + second,
            });
        }

        let hours = component(&HOURS_PATTERN, &normalized);
        let minutes = component(&MINUTES_PATTERN, &normalized);
        let seconds = component(&SECONDS_PATTERN, &normalized);

        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            return None;
        }

        Some(
            hours
                .unwrap_or(0)
                .saturating_mul(3600)
                .saturating_add(minutes.unwrap_or(0).saturating_mul(60))
                .saturating_add(seconds.unwrap_or(0)),
        )
    }
}

/// First number tagged by `pattern`; numbers too large for u64 are ignored
fn component(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|caps| caps[1].parse::<u64>().ok())
}
