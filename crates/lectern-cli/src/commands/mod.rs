pub mod completion;
pub mod parse_duration;
pub mod run;
pub mod show_config;

use anyhow::{Context, Result};
use lectern_core::PortalProfile;
use std::path::Path;

/// Defaults, or the defaults merged with a JSON file
pub fn load_profile(config: Option<&Path>) -> Result<PortalProfile> {
    match config {
        Some(path) => PortalProfile::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PortalProfile::default()),
    }
}
