use console::style;
use lectern_core::reporter::Reporter;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Human-oriented reporter: groups become indented sections
#[derive(Default)]
pub struct PrettyReporter {
    depth: AtomicUsize,
}

impl PrettyReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth.load(Ordering::Relaxed))
    }
}

impl Reporter for PrettyReporter {
    fn group_start(&self, title: &str) {
        println!("{}📂 {}", self.indent(), style(title).bold());
        self.depth.fetch_add(1, Ordering::Relaxed);
    }

    fn group_end(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1));
    }

    fn notice(&self, msg: &str) {
        tracing::info!(target: "lectern::report", "{}", msg);
        println!("{}✅ {}", self.indent(), msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "lectern::report", "{}", msg);
        println!("{}⚠️  {}", self.indent(), style(msg).yellow());
    }

    fn fail(&self, msg: &str) {
        tracing::error!(target: "lectern::report", "{}", msg);
        eprintln!("{}❌ {}", self.indent(), style(msg).red());
    }
}
