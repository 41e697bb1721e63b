//! Architectural Enforcement
//!
//! Source scanners backing the workspace rules checked in `tests/`:
//! - No sleep() calls in production code (the companion frame loop and
//!   retry backoff are the only exceptions)
//! - No `.unwrap()` / `.expect(` in production code outside
//!   `#[cfg(test)]` modules
//!
//! Scanning is line based. Comments are stripped by cutting each line at
//! the first `//`, which can hide code after a URL literal but never
//! reports a false positive from prose.

#![allow(dead_code)]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One offending source line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// File containing the call
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Trimmed source line
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Which sleep uses a directory may contain
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepPolicy {
    /// Sleep near frame/FPS code in the companion app loop
    pub allow_frame_limiting: bool,
    /// Sleep computed from an exponential backoff
    pub allow_backoff: bool,
    /// Sleep inside `#[test]` functions
    pub allow_tests: bool,
}

/// Production source directories, relative to the workspace root
pub const PRODUCTION_SOURCES: &[&str] = &["animator/core/src", "relay/daemon/src", "companion/src"];

/// Workspace root, resolved from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn rust_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

// =============================================================================
// Sleep prohibition
// =============================================================================

/// Scan every `.rs` file under `dir` for sleep calls
#[must_use]
pub fn scan_sleep(dir: &Path, policy: &SleepPolicy) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        if let Ok(content) = fs::read_to_string(&path) {
            violations.extend(scan_sleep_source(&path, &content, policy));
        }
    }
    violations
}

/// Scan one file's contents for sleep calls
#[must_use]
pub fn scan_sleep_source(path: &Path, content: &str, policy: &SleepPolicy) -> Vec<Violation> {
    let lines: Vec<&str> = content.lines().collect();
    let mut violations = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let code = code_part(line);
        if !(code.contains("::sleep(") || code.contains(".sleep(")) {
            continue;
        }

        if policy.allow_tests && is_in_test_function(&lines, idx) {
            continue;
        }
        if policy.allow_frame_limiting
            && path.ends_with("companion/src/app.rs")
            && is_frame_limiting_context(&lines, idx)
        {
            continue;
        }
        if policy.allow_backoff && is_backoff_context(&lines, idx) {
            continue;
        }
        if is_interval_pattern(&lines, idx) {
            continue;
        }

        violations.push(Violation {
            path: path.to_path_buf(),
            line: idx + 1,
            text: line.trim().to_string(),
        });
    }

    violations
}

/// Whether the line sits in a `#[test]` / `#[tokio::test]` function
#[must_use]
pub fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    for line in lines[..current_idx].iter().rev() {
        let line = line.trim();

        if line.starts_with("fn ") && !line.contains("test") {
            return false;
        }
        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }
        if line.starts_with("mod ") || line.starts_with("impl ") {
            return false;
        }
    }
    false
}

/// Whether frame/FPS handling appears near the line
#[must_use]
pub fn is_frame_limiting_context(lines: &[&str], current_idx: usize) -> bool {
    let range = current_idx.saturating_sub(10)..(current_idx + 5).min(lines.len());
    lines[range].iter().any(|line| {
        let line = line.to_lowercase();
        line.contains("frame") || line.contains("fps") || line.contains("tick_rate")
    })
}

/// Whether the line is part of an exponential backoff in retry logic
#[must_use]
pub fn is_backoff_context(lines: &[&str], current_idx: usize) -> bool {
    let range = current_idx.saturating_sub(15)..(current_idx + 5).min(lines.len());

    let mut has_backoff_calc = false;
    let mut has_retry_context = false;
    for line in &lines[range] {
        let line = line.to_lowercase();
        if line.contains("<<") || line.contains("pow") || line.contains("* 2") {
            has_backoff_calc = true;
        }
        if line.contains("retry") || line.contains("backoff") || line.contains("attempt") {
            has_retry_context = true;
        }
    }

    has_backoff_calc && has_retry_context
}

/// Whether a `tokio::time::interval` tick drives the surrounding loop
#[must_use]
pub fn is_interval_pattern(lines: &[&str], current_idx: usize) -> bool {
    let back = current_idx.saturating_sub(20)..current_idx;
    let forward = current_idx..(current_idx + 5).min(lines.len());

    lines[back]
        .iter()
        .any(|line| line.contains("interval.tick()") || line.contains("tokio::time::interval"))
        || lines[forward].iter().any(|line| line.contains("interval.tick()"))
}

// =============================================================================
// Panic prohibition
// =============================================================================

/// Scan every `.rs` file under `dir` for `.unwrap()` / `.expect(`
///
/// Everything from the first `#[cfg(test)]` line onward is exempt.
#[must_use]
pub fn scan_panics(dir: &Path) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        if let Ok(content) = fs::read_to_string(&path) {
            violations.extend(scan_panics_source(&path, &content));
        }
    }
    violations
}

/// Scan one file's contents for `.unwrap()` / `.expect(`
#[must_use]
pub fn scan_panics_source(path: &Path, content: &str) -> Vec<Violation> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter(|(_, line)| {
            let code = code_part(line);
            code.contains(".unwrap()") || code.contains(".expect(")
        })
        .map(|(idx, line)| Violation {
            path: path.to_path_buf(),
            line: idx + 1,
            text: line.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_outside_test_is_reported() {
        let code = "fn bad() {\n    tokio::time::sleep(Duration::from_millis(10)).await;\n}\n";
        let violations = scan_sleep_source(Path::new("x.rs"), code, &SleepPolicy::default());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
    }

    #[test]
    fn test_sleep_in_comment_ignored() {
        let code = "fn ok() {\n    // std::thread::sleep(d) would be wrong here\n}\n";
        assert!(scan_sleep_source(Path::new("x.rs"), code, &SleepPolicy::default()).is_empty());
    }

    #[test]
    fn test_test_function_detection() {
        let lines = [
            "#[tokio::test]",
            "async fn test_waits() {",
            "    tokio::time::sleep(d).await;",
            "}",
        ];
        assert!(is_in_test_function(&lines, 2));

        let lines = ["fn helper() {", "    std::thread::sleep(d);", "}"];
        assert!(!is_in_test_function(&lines, 1));
    }

    #[test]
    fn test_backoff_detection() {
        let lines = [
            "fn reconnect() {",
            "    let delay = base_delay * (1 << attempt);",
            "    tokio::time::sleep(Duration::from_millis(delay)).await;",
            "}",
        ];
        assert!(is_backoff_context(&lines, 2));
    }

    #[test]
    fn test_frame_limiting_only_in_companion_loop() {
        let code = "fn run() {\n    let frame_duration = Duration::from_millis(16);\n    tokio::time::sleep(frame_duration).await;\n}\n";
        let policy = SleepPolicy {
            allow_frame_limiting: true,
            ..SleepPolicy::default()
        };

        assert!(scan_sleep_source(Path::new("companion/src/app.rs"), code, &policy).is_empty());
        assert_eq!(
            scan_sleep_source(Path::new("relay/daemon/src/server.rs"), code, &policy).len(),
            1
        );
    }

    #[test]
    fn test_unwrap_before_test_module_reported() {
        let code = "fn f(x: Option<u8>) -> u8 {\n    x.unwrap()\n}\n\n#[cfg(test)]\nmod tests {\n    fn g() { Some(1).unwrap(); }\n}\n";
        let violations = scan_panics_source(Path::new("lib.rs"), code);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
        assert_eq!(violations[0].to_string(), "lib.rs:2 - x.unwrap()");
    }

    #[test]
    fn test_unwrap_or_variants_allowed() {
        let code = "fn f(x: Option<u8>) -> u8 {\n    x.unwrap_or(0).max(x.unwrap_or_default())\n}\n";
        assert!(scan_panics_source(Path::new("lib.rs"), code).is_empty());
    }
}
