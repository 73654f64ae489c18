use super::load_profile;
use anyhow::Result;
use std::path::Path;

pub fn execute(config: Option<&Path>) -> Result<()> {
    let profile = load_profile(config)?;
    println!("{}", profile.to_json()?);
    Ok(())
}
