//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async functions in production code MUST NOT use blocking I/O.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::io` and async `reqwest`
//! inside `async fn`. Plain functions (config loading before the runtime does
//! any work) may use `std::fs`.

use architectural_enforcement::{
    enclosing_fn, fail_with, production_sources, read_production_lines, relative,
    workspace_root, FnKind, Violation,
};

/// Forbidden pattern and why
const RULES: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let root = workspace_root();
    let mut violations = Vec::new();

    for path in production_sources(&root) {
        let rel = relative(&root, &path);
        let lines = read_production_lines(&path);

        for (idx, line) in lines.iter().enumerate() {
            let in_async = enclosing_fn(&lines, idx) == Some(FnKind::Async);

            for (pattern, reason) in RULES {
                if !line.contains(pattern) {
                    continue;
                }
                // The blocking client is never acceptable
                if *pattern == "reqwest::blocking" || in_async {
                    violations.push(Violation {
                        path: rel.clone(),
                        line: idx + 1,
                        reason: (*reason).to_string(),
                        text: line.trim().to_string(),
                    });
                }
            }
        }
    }

    fail_with("Blocking I/O found in async production code!", &violations);
}

#[test]
fn test_sources_are_found() {
    let sources = production_sources(&workspace_root());
    assert!(
        sources.iter().any(|p| p.ends_with("huddle/core/src/huddle.rs")),
        "scan found no production sources: {sources:?}"
    );
}
