// Chrome-backed page driver for the lesson engine

mod chrome_finder;
mod error;
mod launcher;
mod page;
mod profile;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use launcher::{BrowserLauncher, BrowserSession};
pub use page::CdpPage;
pub use profile::ProfileManager;
