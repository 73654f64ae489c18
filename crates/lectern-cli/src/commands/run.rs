use super::load_profile;
use crate::ReportStyle;
use anyhow::{Result, anyhow, bail};
use lectern_browser::{BrowserLauncher, ChromeFinder, ProfileManager};
use lectern_core::{CourseRunner, Credentials, Group, PortalProfile, Reporter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct RunOptions {
    pub email: Option<String>,
    pub password: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub headed: bool,
    pub profile: Option<String>,
    pub config: Option<PathBuf>,
    pub buffer_secs: Option<u64>,
    pub fallback_secs: Option<u64>,
    pub screenshot_dir: PathBuf,
    pub style: ReportStyle,
}

pub fn execute(options: RunOptions) -> Result<()> {
    let reporter = options.style.reporter();

    let result = run(options, reporter.as_ref());
    if let Err(e) = &result {
        reporter.fail(&format!("Automation failed: {:#}", e));
    }
    result
}

fn run(options: RunOptions, reporter: &dyn Reporter) -> Result<()> {
    // Credentials are checked before anything is launched
    let credentials = Credentials::from_parts(options.email, options.password)?;

    let mut profile = load_profile(options.config.as_deref())?;
    apply_overrides(&mut profile, options.buffer_secs, options.fallback_secs);
    profile.validate()?;

    let screenshot_dir = timestamped(&options.screenshot_dir);

    // One page drives everything in order; no worker threads needed
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let cancel = CancellationToken::new();

    let result = runtime.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping the run");
                interrupt.cancel();
            }
        });

        let browser_group = Group::open(reporter, "Browser");
        let chrome_binary = ChromeFinder::new(options.chrome_path).find()?;
        reporter.notice(&format!("Found Chrome at: {}", chrome_binary.display()));

        let profile_manager = match options.profile {
            Some(name) => {
                let path = named_profile_dir(&name)?;
                reporter.notice(&format!("Using profile: {}", path.display()));
                ProfileManager::persistent(path)?
            }
            None => {
                reporter.notice("Using a temporary browser profile");
                ProfileManager::temporary()?
            }
        };

        let session = BrowserLauncher::new(chrome_binary, profile_manager.path().to_path_buf())
            .headless(!options.headed)
            .launch()
            .await?;
        drop(browser_group);

        let runner = CourseRunner::new(profile, screenshot_dir, cancel.clone());
        let outcome = runner.run(session.page(), &credentials, reporter).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Chrome did not close cleanly: {}", e);
        }

        let summary = outcome?;
        tracing::info!(
            "Run finished: {} course(s), {} page(s)",
            summary.courses.len(),
            summary.total_pages()
        );
        Ok::<_, anyhow::Error>(())
    });

    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

fn apply_overrides(profile: &mut PortalProfile, buffer_secs: Option<u64>, fallback_secs: Option<u64>) {
    if let Some(secs) = buffer_secs {
        profile.duration.buffer_secs = secs;
    }
    if let Some(secs) = fallback_secs {
        profile.duration.fallback_secs = secs;
    }
}

/// Each run gets its own screenshot folder
fn timestamped(dir: &Path) -> PathBuf {
    dir.join(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string())
}

/// `~/.lectern/profiles/<name>`
fn named_profile_dir(name: &str) -> Result<PathBuf> {
    validate_profile_name(name)?;
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".lectern")
        .join("profiles")
        .join(name))
}

fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Profile name cannot be empty");
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!("Invalid profile name '{}': use a plain directory name", name);
    }
    Ok(())
}
