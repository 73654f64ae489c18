use super::load_profile;
use anyhow::Result;
use lectern_core::DurationParser;
use std::path::Path;

pub fn execute(text: &str, config: Option<&Path>) -> Result<()> {
    let parser = DurationParser::new(load_profile(config)?.duration);
    let spec = parser.parse(text);

    match DurationParser::base_seconds(text) {
        Some(base) => println!(
            "{}s ({}s lesson + {}s buffer)",
            spec.secs(),
            base,
            parser.policy().buffer_secs
        ),
        None => println!("{}s (fallback, label not recognized)", spec.secs()),
    }

    Ok(())
}
