//! Workspace-wide source rules
//!
//! - No sleep in production code: wait on I/O, channels or
//!   `tokio::time::interval` instead.
//! - No `.unwrap()` / `.expect(` in production code; propagate errors.

use architectural_enforcement::{
    scan_panics, scan_sleep, workspace_root, SleepPolicy, Violation, PRODUCTION_SOURCES,
};

fn report(kind: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n{kind} found in production code:\n");
    for violation in violations {
        eprintln!("  {violation}");
    }
    panic!("\nFound {} {kind} violation(s).", violations.len());
}

#[test]
fn test_production_sources_exist() {
    let root = workspace_root();
    for dir in PRODUCTION_SOURCES {
        assert!(root.join(dir).is_dir(), "missing source directory {dir}");
    }
}

#[test]
fn test_no_sleep_in_production_code() {
    let root = workspace_root();
    let mut violations = Vec::new();

    for dir in PRODUCTION_SOURCES {
        let policy = SleepPolicy {
            allow_frame_limiting: *dir == "companion/src",
            allow_backoff: *dir != "animator/core/src",
            allow_tests: false,
        };
        violations.extend(scan_sleep(&root.join(dir), &policy));
    }

    report("sleep calls", &violations);
}

#[test]
fn test_no_unwrap_in_production_code() {
    let root = workspace_root();
    let violations: Vec<Violation> = PRODUCTION_SOURCES
        .iter()
        .flat_map(|dir| scan_panics(&root.join(dir)))
        .collect();

    report("unwrap/expect calls", &violations);
}
