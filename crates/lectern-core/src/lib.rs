pub mod duration;
pub mod error;
pub mod page;
pub mod playback;
pub mod portal;
pub mod profile;
pub mod reporter;
pub mod runner;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

pub use duration::{DurationParser, DurationPolicy, DurationSpec};
pub use error::{Error, Result};
pub use page::{BoundingBox, LessonPage, Locator, Probe};
pub use playback::{PlaybackAttemptResult, PlaybackOutcome, PlaybackTrigger};
pub use portal::{Authenticator, CourseCatalog, CourseLink, Credentials};
pub use profile::PortalProfile;
pub use reporter::{Group, Reporter};
pub use runner::{CourseRunner, RunSummary};
pub use walker::{CourseSummary, LessonPageState, LessonWalker};
