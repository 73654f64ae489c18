use crate::page::{LessonPage, Locator, Probe};
use crate::reporter::{Group, Reporter};
use crate::{Error, PortalProfile, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Absolute URL of a course entry page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLink(Url);

impl CourseLink {
    pub fn parse(href: &str) -> Result<Self> {
        Url::parse(href.trim())
            .map(CourseLink)
            .map_err(|e| Error::InvalidCourseLink(href.to_string(), e))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CourseLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Portal account; both parts are required
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_parts(email: Option<String>, password: Option<String>) -> Result<Self> {
        let email = email.filter(|v| !v.trim().is_empty());
        let password = password.filter(|v| !v.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => Ok(Self { email, password }),
            (None, Some(_)) => Err(Error::MissingCredentials("EMAIL".to_string())),
            (Some(_), None) => Err(Error::MissingCredentials("PASSWORD".to_string())),
            (None, None) => Err(Error::MissingCredentials("EMAIL and PASSWORD".to_string())),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signs in through the portal's identity provider
pub struct Authenticator<'a> {
    profile: &'a PortalProfile,
}

impl<'a> Authenticator<'a> {
    pub fn new(profile: &'a PortalProfile) -> Self {
        Self { profile }
    }

    pub async fn sign_in(
        &self,
        page: &dyn LessonPage,
        credentials: &Credentials,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        let selectors = &self.profile.selectors;
        let timeouts = &self.profile.timeouts;

        let _group = Group::open(reporter, "Sign in");
        reporter.notice("Opening login page");
        page.goto(&self.profile.login_url).await?;

        reporter.notice("Clicking sign-in");
        require(page.click(&selectors.sign_in, timeouts.sign_in_field()).await?, &selectors.sign_in)?;

        reporter.notice("Filling email");
        require(
            page.fill(&selectors.email_input, &credentials.email, timeouts.sign_in_field())
                .await?,
            &selectors.email_input,
        )?;
        require(page.click(&selectors.submit, timeouts.sign_in_field()).await?, &selectors.submit)?;

        reporter.notice("Filling password");
        require(
            page.fill(&selectors.password_input, &credentials.password, timeouts.sign_in_field())
                .await?,
            &selectors.password_input,
        )?;
        require(page.click(&selectors.submit, timeouts.sign_in_field()).await?, &selectors.submit)?;

        self.confirm_stay_signed_in(page, reporter).await?;

        reporter.notice("Waiting for the portal home page");
        page.wait_for_url(&self.profile.home_url_pattern, timeouts.home_url())
            .await?;
        Ok(())
    }

    /// The "stay signed in?" prompt is optional; absence is fine
    async fn confirm_stay_signed_in(&self, page: &dyn LessonPage, reporter: &dyn Reporter) -> Result<()> {
        let selectors = &self.profile.selectors;
        let timeout = self.profile.timeouts.stay_signed_in();

        if wait_present(page, &selectors.stay_signed_in, timeout).await? {
            reporter.notice("Confirming stay signed in");
            require(page.click(&selectors.submit, timeout).await?, &selectors.submit)?;
        } else {
            reporter.warn("Stay-signed-in prompt did not appear (ok)");
        }
        Ok(())
    }
}

/// Reads course links from the portal home page
pub struct CourseCatalog<'a> {
    profile: &'a PortalProfile,
}

impl<'a> CourseCatalog<'a> {
    pub fn new(profile: &'a PortalProfile) -> Self {
        Self { profile }
    }

    /// Open the course list and return the first `course_count` links in
    /// document order
    pub async fn discover(&self, page: &dyn LessonPage, reporter: &dyn Reporter) -> Result<Vec<CourseLink>> {
        let selectors = &self.profile.selectors;
        let timeouts = &self.profile.timeouts;

        let _group = Group::open(reporter, "Course list");
        reporter.notice("Opening course list");
        require(
            page.click(&selectors.see_courses, timeouts.course_list()).await?,
            &selectors.see_courses,
        )?;

        if !wait_present(page, &selectors.course_links, timeouts.course_list()).await? {
            return Err(Error::NoCourses);
        }

        let hrefs = page
            .hrefs(&selectors.course_links, self.profile.course_count)
            .await?;
        let links = hrefs
            .iter()
            .map(|href| CourseLink::parse(href))
            .collect::<Result<Vec<_>>>()?;
        if links.is_empty() {
            return Err(Error::NoCourses);
        }

        reporter.notice(&format!(
            "Courses found: {}",
            links
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        Ok(links)
    }

    /// Go back to the home page and read the list again
    pub async fn rediscover(&self, page: &dyn LessonPage, reporter: &dyn Reporter) -> Result<Vec<CourseLink>> {
        reporter.notice("Returning to the course list");
        page.goto(&self.profile.home_url).await?;
        self.discover(page, reporter).await
    }
}

/// Required portal controls turn a lookup miss into a navigation error
fn require(probe: Probe<()>, locator: &Locator) -> Result<()> {
    match probe {
        Probe::Found(()) => Ok(()),
        Probe::NotFound => Err(Error::Navigation(format!("{} not found", locator))),
        Probe::Timeout => Err(Error::Navigation(format!("timed out waiting for {}", locator))),
    }
}

/// Poll `count` until the element shows up or the bound expires
async fn wait_present(page: &dyn LessonPage, locator: &Locator, timeout: Duration) -> Result<bool> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if page.count(locator).await? > 0 {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
