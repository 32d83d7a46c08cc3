//! Terminal progress for the sync phases.
//!
//! Fetching shows a spinner, writing shows a bar. With `--log-only` both are
//! hidden and the write phase emits periodic `info` lines instead, which reads
//! better in `tail -f` and in service logs.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";
const SPINNER_TEMPLATE: &str = "{msg} {spinner} [{elapsed_precise}]";

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

/// Set log-only mode globally (from `--log-only` in main)
pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Seconds below a minute, minutes above.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

fn styled(pb: ProgressBar, template: &str, msg: &str) -> ProgressBar {
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Bar for the write phase, one tick per song.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    styled(ProgressBar::new(len), BAR_TEMPLATE, msg)
}

/// Spinner for the catalog fetch, whose size is unknown until it returns.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = styled(ProgressBar::new_spinner(), SPINNER_TEMPLATE, msg);
    if !is_log_only() {
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb
}

/// In log-only mode, log every `interval` items and at the end.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if !is_log_only() || total == 0 {
        return;
    }
    if current % interval == 0 || current == total {
        let pct = 100.0 * current as f64 / total as f64;
        info!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}
