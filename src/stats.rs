use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Processing state shared between the workers and the shutdown path.
///
/// `is_active` doubles as the cooperative shutdown signal; every worker
/// checks it once per iteration. The counters are written only by the
/// filter worker.
#[derive(Debug, Default)]
pub struct FilterStats {
    pub is_active: AtomicBool,
    pub ticks: AtomicU64,
    pub frames_published: AtomicU64,
    pub skipped_empty: AtomicU64,
    pub skipped_contended: AtomicU64,
    pub decode_failures: AtomicU64,
}

impl FilterStats {
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn shutdown(&self) {
        self.is_active.store(false, Ordering::Relaxed);
    }

    pub fn active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }

    pub fn to_summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ticks": self.ticks.load(Ordering::Relaxed),
            "frames_published": self.frames_published.load(Ordering::Relaxed),
            "skipped_empty": self.skipped_empty.load(Ordering::Relaxed),
            "skipped_contended": self.skipped_contended.load(Ordering::Relaxed),
            "decode_failures": self.decode_failures.load(Ordering::Relaxed),
        })
    }
}
