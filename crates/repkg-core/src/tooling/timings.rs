use std::sync::OnceLock;
use std::time::Instant;

fn timings_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("REPKG_TIMINGS")
            .ok()
            .is_some_and(|raw| crate::config::settings::is_truthy(&raw))
    })
}

/// Logs how long a step took when `REPKG_TIMINGS` is set.
pub(crate) struct TimingGuard {
    label: &'static str,
    start: Instant,
}

impl TimingGuard {
    pub(crate) fn new(label: &'static str) -> Option<Self> {
        if timings_enabled() {
            Some(Self {
                label,
                start: Instant::now(),
            })
        } else {
            None
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::info!(
            repkg_timing = self.label,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "timing"
        );
    }
}
