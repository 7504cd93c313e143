//! Integration Test: Dwell Confinement
//!
//! **Policy**: Playback timing is simulated through the `Clock` trait. Only
//! `huddle/core/src/clock.rs` may suspend on a timer; every other production
//! file must call `Clock::dwell` so tests can swap in an instant clock.
//!
//! Thread sleeps are forbidden everywhere, since they block the runtime.

use architectural_enforcement::{
    fail_with, production_sources, read_production_lines, relative, workspace_root, Violation,
};

/// The one file allowed to touch the tokio timer
const CLOCK_FILE: &str = "huddle/core/src/clock.rs";

#[test]
fn test_timers_only_in_clock() {
    let root = workspace_root();
    let mut violations = Vec::new();

    for path in production_sources(&root) {
        let rel = relative(&root, &path);
        let in_clock = rel.ends_with(CLOCK_FILE);

        for (idx, line) in read_production_lines(&path).iter().enumerate() {
            let reason = if line.contains("thread::sleep") {
                Some("Thread sleep blocks the runtime")
            } else if !in_clock && (line.contains("::sleep(") || line.contains("sleep_until(")) {
                Some("Timer outside the playback clock")
            } else {
                None
            };

            if let Some(reason) = reason {
                violations.push(Violation {
                    path: rel.clone(),
                    line: idx + 1,
                    reason: reason.to_string(),
                    text: line.trim().to_string(),
                });
            }
        }
    }

    fail_with("Timed waits found outside the playback clock!", &violations);
}

#[test]
fn test_clock_file_exists() {
    // Guards against the policy silently passing after a move
    assert!(workspace_root().join(CLOCK_FILE).exists());
}
