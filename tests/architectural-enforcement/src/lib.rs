//! Architectural Enforcement Integration Tests
//!
//! Shared scanning helpers for the tests in `tests/`, which enforce:
//! - Timed waits only go through the playback clock
//! - No blocking I/O inside async functions
//!
//! Scans are line-based. Everything from a file's first `#[cfg(test)]` on is
//! treated as test code and skipped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Crates whose `src/` trees are production code
pub const PRODUCTION_CRATES: &[&str] = &["huddle/core", "huddle/cli"];

/// A rule broken on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File, relative to the workspace root
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What was found
    pub reason: String,
    /// The offending line, trimmed
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.reason,
            self.text
        )
    }
}

/// Kind of function a line sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    /// `fn`
    Sync,
    /// `async fn`
    Async,
}

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `.rs` file under the production crates' `src/` directories
pub fn production_sources(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = PRODUCTION_CRATES
        .iter()
        .map(|krate| root.join(krate).join("src"))
        .filter(|dir| dir.exists())
        .flat_map(|dir| {
            walkdir::WalkDir::new(dir)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
                .map(walkdir::DirEntry::into_path)
        })
        .collect();
    files.sort();
    files
}

/// Read a file and return its production lines
pub fn read_production_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => production_lines(&content),
        Err(_) => Vec::new(),
    }
}

/// Lines before the first test module, with `//` comments removed
///
/// Indices are preserved, so `index + 1` is the line number.
pub fn production_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .take_while(|line| line.trim() != "#[cfg(test)]")
        .map(|line| strip_comment(line).to_string())
        .collect()
}

fn strip_comment(line: &str) -> &str {
    // Keep URLs in string literals intact
    let mut search = 0;
    while let Some(found) = line[search..].find("//") {
        let at = search + found;
        if at > 0 && line[..at].ends_with(':') {
            search = at + 2;
            continue;
        }
        return &line[..at];
    }
    line
}

/// Parse a function signature line
pub fn fn_signature(line: &str) -> Option<FnKind> {
    let mut rest = line.trim_start();
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    if let Some(stripped) = rest.strip_prefix("async ") {
        return stripped.starts_with("fn ").then_some(FnKind::Async);
    }
    rest.starts_with("fn ").then_some(FnKind::Sync)
}

/// The function enclosing line `index`, judged by the nearest signature above
pub fn enclosing_fn(lines: &[String], index: usize) -> Option<FnKind> {
    lines[..=index.min(lines.len().saturating_sub(1))]
        .iter()
        .rev()
        .find_map(|line| fn_signature(line))
}

/// Path relative to `root`, for reporting
pub fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Print violations and fail
pub fn fail_with(title: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s). Fix these before merging!", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(code: &[&str]) -> Vec<String> {
        code.iter().map(|l| (*l).to_string()).collect()
    }

    #[test]
    fn test_signatures() {
        assert_eq!(fn_signature("pub async fn submit(&self)"), Some(FnKind::Async));
        assert_eq!(fn_signature("    async fn dwell(&self)"), Some(FnKind::Async));
        assert_eq!(fn_signature("pub(crate) fn into_message(self)"), Some(FnKind::Sync));
        assert_eq!(fn_signature("fn main() {"), Some(FnKind::Sync));
        assert_eq!(fn_signature("let f = async move {"), None);
        assert_eq!(fn_signature("// fn commented"), None);
    }

    #[test]
    fn test_enclosing_fn() {
        let code = lines(&[
            "pub fn load() {",
            "    std::fs::read_to_string(path)",
            "}",
            "pub async fn run() {",
            "    tokio::spawn(async move {",
            "        std::fs::read(path)",
            "    });",
            "}",
        ]);
        assert_eq!(enclosing_fn(&code, 1), Some(FnKind::Sync));
        assert_eq!(enclosing_fn(&code, 5), Some(FnKind::Async));
    }

    #[test]
    fn test_test_modules_are_skipped() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        assert_eq!(production_lines(content), vec!["fn a() {}".to_string()]);
    }

    #[test]
    fn test_comments_stripped_but_urls_kept() {
        assert_eq!(strip_comment("let x = 1; // sleep(1)"), "let x = 1; ");
        assert_eq!(
            strip_comment("const URL: &str = \"http://localhost:5000\";"),
            "const URL: &str = \"http://localhost:5000\";"
        );
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
