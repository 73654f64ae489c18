use crate::page::LessonPage;
use crate::reporter::Reporter;
use crate::walker::{CourseSummary, LessonWalker};
use crate::{Authenticator, CourseCatalog, Credentials, PortalProfile, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub courses: Vec<CourseSummary>,
}

impl RunSummary {
    pub fn total_pages(&self) -> u32 {
        self.courses.iter().map(|c| c.pages()).sum()
    }
}

/// Signs in once, then walks each course from the top of the course list
///
/// The list is read again before every course after the first, since the
/// portal page state changes while a course is played.
pub struct CourseRunner {
    profile: PortalProfile,
    walker: LessonWalker,
}

impl CourseRunner {
    pub fn new(profile: PortalProfile, screenshot_dir: PathBuf, cancel: CancellationToken) -> Self {
        let walker = LessonWalker::new(&profile, screenshot_dir, cancel);
        Self { profile, walker }
    }

    pub async fn run(
        &self,
        page: &dyn LessonPage,
        credentials: &Credentials,
        reporter: &dyn Reporter,
    ) -> Result<RunSummary> {
        Authenticator::new(&self.profile)
            .sign_in(page, credentials, reporter)
            .await?;

        let catalog = CourseCatalog::new(&self.profile);
        let mut summary = RunSummary::default();

        for index in 0..self.profile.course_count {
            let links = if index == 0 {
                catalog.discover(page, reporter).await?
            } else {
                catalog.rediscover(page, reporter).await?
            };

            let Some(link) = links.get(index) else {
                reporter.warn(&format!(
                    "Only {} course(s) listed, skipping course {}",
                    links.len(),
                    index + 1
                ));
                break;
            };

            let course = self.walker.run(page, link, reporter).await?;
            reporter.notice(&format!(
                "Course {} finished after {} page(s)",
                index + 1,
                course.pages()
            ));
            summary.courses.push(course);
        }

        reporter.notice(&format!(
            "All lessons processed: {} course(s), {} page(s)",
            summary.courses.len(),
            summary.total_pages()
        ));
        Ok(summary)
    }
}
