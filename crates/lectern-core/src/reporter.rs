use std::io::Write;
use std::sync::Mutex;

/// Structured, user-facing progress log
///
/// Purely observational: nothing in the engine branches on it. Each message
/// is mirrored into `tracing` by the implementations in this crate.
pub trait Reporter: Send + Sync {
    fn group_start(&self, title: &str);
    fn group_end(&self);
    fn notice(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn fail(&self, msg: &str);
}

/// Open group that is closed when dropped, so early returns leave the
/// output balanced
pub struct Group<'a> {
    reporter: &'a dyn Reporter,
}

impl<'a> Group<'a> {
    pub fn open(reporter: &'a dyn Reporter, title: &str) -> Self {
        reporter.group_start(title);
        Self { reporter }
    }
}

impl Drop for Group<'_> {
    fn drop(&mut self) {
        self.reporter.group_end();
    }
}

/// Emits GitHub Actions workflow commands (`::group::`, `::notice` ...)
pub struct WorkflowReporter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl WorkflowReporter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn emit(&self, line: String) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

impl Reporter for WorkflowReporter {
    fn group_start(&self, title: &str) {
        tracing::debug!(target: "lectern::report", "group start: {}", title);
        self.emit(format!("::group::{}", escape_data(title)));
    }

    fn group_end(&self) {
        self.emit("::endgroup::".to_string());
    }

    fn notice(&self, msg: &str) {
        tracing::info!(target: "lectern::report", "{}", msg);
        self.emit(format!("::notice title=Info::{}", escape_data(msg)));
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "lectern::report", "{}", msg);
        self.emit(format!("::warning title=Warning::{}", escape_data(msg)));
    }

    fn fail(&self, msg: &str) {
        tracing::error!(target: "lectern::report", "{}", msg);
        self.emit(format!("::error title=Error::{}", escape_data(msg)));
    }
}

/// Workflow command data must not contain raw `%`, CR or LF
fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
